//! The node types from which expressions are composed.
//!
//! Each node is either a *terminal* (a leaf with no inputs) or a *function* whose inputs are
//! stored within the expression graph. See the `expr` module for how nodes are connected.

use rand::Rng;
use std::fmt;

/// The greatest number of inputs any node may have.
pub const MAX_ARITY: usize = 2;

/// The number of decimal places used when a constant is rendered as text.
pub const CONSTANT_PRECISION: usize = 9;

/// The coordinate pair at which an expression is evaluated.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// A node/expression type that can be evaluated to a single value.
pub trait Evaluate<E> {
    /// The type of the value produced by the node type.
    type Value;
    /// Evaluate this node in terms of the given inputs to produce the given value.
    fn evaluate(&self, inputs: &[Self::Value], env: &E) -> Self::Value;
}

/// Node types that know their number of inputs / arguments.
pub trait Arity {
    /// The number of arguments to the node.
    ///
    /// Function nodes will return 1 or more. Terminal nodes will return 0.
    fn arity(&self) -> usize;
}

/// Function types that may be generated for use within an expression.
pub trait Function: Arity {
    /// Generate an instance of this Function type.
    fn generate<R>(rng: &mut R) -> Self
    where
        R: Rng;
}

/// Terminal types that may be generated for use within an expression.
pub trait Terminal {
    /// Generate an instance of this Terminal type.
    fn generate<R>(rng: &mut R) -> Self
    where
        R: Rng;
}

/// A single node within an image expression.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Node {
    /// The horizontal coordinate.
    X,
    /// The vertical coordinate.
    Y,
    /// A fixed value. Prefer `Node::constant` which keeps the value exactly representable as
    /// text.
    Constant(f32),
    Sin,
    Cos,
    Atan,
    Plus,
    Minus,
    Mult,
    Div,
    /// `atan2(first, second)`, where the first input plays the role of `y`.
    Atan2,
}

/// Every function node, in the order they are drawn from.
pub const FUNCTIONS: [Node; 8] = [
    Node::Plus,
    Node::Minus,
    Node::Mult,
    Node::Div,
    Node::Sin,
    Node::Cos,
    Node::Atan,
    Node::Atan2,
];

/// The number of distinct terminal kinds (`X`, `Y` and `Constant`).
pub const TERMINAL_KINDS: usize = 3;

impl Node {
    /// A constant node.
    ///
    /// The value is snapped to the nearest `f32` of its fixed-point text rendering so that
    /// writing the node out and reading it back in always produces the same bits.
    pub fn constant(value: f32) -> Self {
        let text = format!("{:.*}", CONSTANT_PRECISION, value);
        Node::Constant(text.parse().unwrap_or(value))
    }

    /// Generate either a function or a terminal, weighted by the number of kinds of each.
    pub fn generate<R>(rng: &mut R) -> Self
    where
        R: Rng,
    {
        if rng.gen_range(0..FUNCTIONS.len() + TERMINAL_KINDS) < FUNCTIONS.len() {
            <Node as Function>::generate(rng)
        } else {
            <Node as Terminal>::generate(rng)
        }
    }

    /// The identifier used for this node within the text form.
    pub fn name(&self) -> &'static str {
        match *self {
            Node::X => "X",
            Node::Y => "Y",
            Node::Constant(_) => "Constant",
            Node::Sin => "Sin",
            Node::Cos => "Cos",
            Node::Atan => "Atan",
            Node::Plus => "Plus",
            Node::Minus => "Minus",
            Node::Mult => "Mult",
            Node::Div => "Div",
            Node::Atan2 => "Atan2",
        }
    }

    /// Look up the node for the given identifier.
    ///
    /// Constants have no identifier and are never returned.
    pub fn from_name(name: &str) -> Option<Self> {
        let node = match name {
            "X" => Node::X,
            "Y" => Node::Y,
            "Sin" => Node::Sin,
            "Cos" => Node::Cos,
            "Atan" => Node::Atan,
            "Plus" => Node::Plus,
            "Minus" => Node::Minus,
            "Mult" => Node::Mult,
            "Div" => Node::Div,
            "Atan2" => Node::Atan2,
            _ => return None,
        };
        Some(node)
    }

    /// Whether or not the node is a terminal.
    pub fn is_terminal(&self) -> bool {
        self.arity() == 0
    }
}

impl Arity for Node {
    fn arity(&self) -> usize {
        match *self {
            Node::X | Node::Y | Node::Constant(_) => 0,
            Node::Sin | Node::Cos | Node::Atan => 1,
            Node::Plus | Node::Minus | Node::Mult | Node::Div | Node::Atan2 => 2,
        }
    }
}

impl Function for Node {
    fn generate<R>(rng: &mut R) -> Self
    where
        R: Rng,
    {
        FUNCTIONS[rng.gen_range(0..FUNCTIONS.len())]
    }
}

impl Terminal for Node {
    fn generate<R>(rng: &mut R) -> Self
    where
        R: Rng,
    {
        match rng.gen_range(0..TERMINAL_KINDS) {
            0 => Node::X,
            1 => Node::Y,
            2 => Node::constant(rng.gen_range(-1.0..1.0)),
            _ => unreachable!(),
        }
    }
}

impl Evaluate<Point> for Node {
    type Value = f32;
    fn evaluate(&self, inputs: &[f32], p: &Point) -> f32 {
        match *self {
            Node::X => p.x,
            Node::Y => p.y,
            Node::Constant(value) => value,
            Node::Sin => (inputs[0] as f64).sin() as f32,
            Node::Cos => (inputs[0] as f64).cos() as f32,
            Node::Atan => (inputs[0] as f64).atan() as f32,
            Node::Plus => inputs[0] + inputs[1],
            Node::Minus => inputs[0] - inputs[1],
            Node::Mult => inputs[0] * inputs[1],
            Node::Div => inputs[0] / inputs[1],
            Node::Atan2 => (inputs[0] as f64).atan2(inputs[1] as f64) as f32,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Node::Constant(value) => write!(f, "{:.*}", CONSTANT_PRECISION, value),
            ref node => f.write_str(node.name()),
        }
    }
}
