//! Items related to expressions.
//!
//! An expression is a tree of `Node`s stored within a stable directed graph. Each edge runs
//! from an input node to the node that consumes it and carries the index of the input slot it
//! fills, so the parent of a node is its single `Outgoing` neighbour and its inputs are its
//! `Incoming` neighbours.
//!
//! Nodes are referred to from outside of the tree by `NodeIndex` handles. A handle remains valid
//! until its node is removed, which makes it possible to refer to any node (including the root)
//! while the rest of the tree is edited around it. The graph reuses the storage of removed
//! nodes, so every handle also carries the generation of the storage it points at and a handle
//! to a removed node never resolves to whichever node later takes its place.

use crate::error::{Error, Result};
use crate::gp::node::{Arity, Evaluate, Node, Point, Terminal, MAX_ARITY};
use fnv::FnvHashSet;
use log::trace;
use petgraph::stable_graph::{EdgeIndex, StableDiGraph};
use petgraph::visit::{Dfs, EdgeRef, Reversed};
use petgraph::{Incoming, Outgoing};
use rand::Rng;
use std::fmt;
use std::mem;

/// The graph type in which expression nodes are stored.
pub type Graph = StableDiGraph<Node, Slot, u32>;

/// The raw index of a node within the expression graph.
pub type GraphIndex = petgraph::stable_graph::NodeIndex<u32>;

/// The index of an input slot on its consuming node.
pub type Slot = usize;

/// A handle to a node within an `Expr`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeIndex {
    index: GraphIndex,
    generation: u32,
}

/// A complete expression tree.
///
/// Every slot of every node within the tree is filled.
#[derive(Clone, Debug)]
pub struct Expr {
    graph: Graph,
    root: GraphIndex,
    // The number of times each storage index has been vacated.
    generations: Vec<u32>,
}

impl Expr {
    /// Construct a tree with the given node at its root, taking ownership of the given inputs.
    pub fn new(node: Node, inputs: Vec<Expr>) -> Result<Self> {
        if inputs.len() != node.arity() {
            return Err(Error::ArityMismatch {
                node: node.name(),
                expected: node.arity(),
                found: inputs.len(),
            });
        }
        let mut graph = Graph::default();
        let root = graph.add_node(node);
        for (slot, input) in inputs.into_iter().enumerate() {
            let input_root = copy_subtree(&input.graph, input.root, &mut graph);
            graph.add_edge(input_root, root, slot);
        }
        Ok(Self::wrap(graph, root))
    }

    /// A tree consisting of a single terminal.
    pub fn leaf(node: Node) -> Result<Self> {
        Self::new(node, vec![])
    }

    /// Wrap a graph that is already known to hold a complete tree rooted at `root`.
    pub(crate) fn from_graph(graph: Graph, root: GraphIndex) -> Self {
        let expr = Self::wrap(graph, root);
        debug_assert!(expr.is_complete(), "incomplete tree:\n{:#?}", expr);
        expr
    }

    fn wrap(graph: Graph, root: GraphIndex) -> Self {
        Expr {
            graph,
            root,
            generations: vec![],
        }
    }

    /// The index of the root node.
    pub fn root(&self) -> NodeIndex {
        self.handle(self.root)
    }

    /// The node at the given index.
    ///
    /// Panics if the index does not refer to a node within this tree.
    pub fn node(&self, ix: NodeIndex) -> Node {
        self.graph[self.resolve(ix)]
    }

    /// Whether or not the given index refers to a node within this tree.
    pub fn contains(&self, ix: NodeIndex) -> bool {
        self.graph.contains_node(ix.index) && self.generation(ix.index) == ix.generation
    }

    /// The node filling the given input slot of the node at `ix`.
    pub fn child(&self, ix: NodeIndex, slot: Slot) -> Option<NodeIndex> {
        let ix = self.resolve(ix);
        slots(&self.graph, ix)
            .get(slot)
            .and_then(|&s| s)
            .map(|c| self.handle(c))
    }

    /// The inputs of the node at `ix` in slot order.
    pub fn children(&self, ix: NodeIndex) -> Vec<NodeIndex> {
        let ix = self.resolve(ix);
        slots(&self.graph, ix)
            .iter()
            .filter_map(|&s| s)
            .map(|c| self.handle(c))
            .collect()
    }

    /// The node consuming `ix` along with the slot it occupies, or `None` for the root.
    pub fn parent(&self, ix: NodeIndex) -> Option<(NodeIndex, Slot)> {
        parent(&self.graph, self.resolve(ix)).map(|(p, slot)| (self.handle(p), slot))
    }

    /// Evaluate the expression at the given coordinates.
    pub fn eval(&self, x: f32, y: f32) -> f32 {
        self.eval_at(self.root, &Point { x, y })
    }

    /// Evaluate the subtree rooted at `ix`.
    pub fn eval_node(&self, ix: NodeIndex, p: &Point) -> f32 {
        self.eval_at(self.resolve(ix), p)
    }

    fn eval_at(&self, ix: GraphIndex, p: &Point) -> f32 {
        let node = &self.graph[ix];
        let arity = node.arity();
        let slots = slots(&self.graph, ix);
        let mut inputs = [0.0; MAX_ARITY];
        for (slot, input) in inputs[..arity].iter_mut().enumerate() {
            let child = slots[slot]
                .unwrap_or_else(|| panic!("`{}` has no input in slot {}", node.name(), slot));
            *input = self.eval_at(child, p);
        }
        node.evaluate(&inputs[..arity], p)
    }

    /// The total number of nodes within the tree, functions and terminals alike.
    pub fn count_nodes(&self) -> usize {
        self.graph.node_count()
    }

    /// The number of nodes within the subtree rooted at `ix`.
    pub fn count_subtree(&self, ix: NodeIndex) -> usize {
        subtree(&self.graph, self.resolve(ix)).len()
    }

    /// All node indices in depth-first pre-order, visiting inputs in slot order.
    pub fn preorder(&self) -> Vec<NodeIndex> {
        let mut order = Vec::with_capacity(self.graph.node_count());
        let mut stack = vec![self.root];
        while let Some(a) = stack.pop() {
            order.push(self.handle(a));
            stack.extend(slots(&self.graph, a).iter().rev().filter_map(|&s| s));
        }
        order
    }

    /// The node with the given 1-based rank within the pre-order numbering of the tree.
    ///
    /// Panics if `n` is `0` or greater than the number of nodes.
    pub fn nth_node(&self, n: usize) -> NodeIndex {
        let mut count = 0;
        let mut stack = vec![self.root];
        while let Some(a) = stack.pop() {
            count += 1;
            if count == n {
                return self.handle(a);
            }
            stack.extend(slots(&self.graph, a).iter().rev().filter_map(|&s| s));
        }
        panic!("node {} does not exist in a tree of {} nodes", n, count);
    }

    /// Select a node with uniform probability over every node in the tree.
    pub fn pick_uniform_random_node<R>(&self, rng: &mut R) -> NodeIndex
    where
        R: Rng,
    {
        let n = rng.gen_range(1..=self.count_nodes());
        self.nth_node(n)
    }

    /// Whether or not every slot of every node in the graph is filled.
    pub fn is_complete(&self) -> bool {
        self.graph.node_indices().all(|ix| {
            let arity = self.graph[ix].arity();
            let inputs = self.graph.edges_directed(ix, Incoming).count();
            inputs == arity && slots(&self.graph, ix)[..arity].iter().all(Option::is_some)
        })
    }

    /// Clone the subtree whose root is at the given node into a new, independent tree.
    pub fn clone_subtree(&self, subtree_root: NodeIndex) -> Expr {
        let mut graph = Graph::with_capacity(0, 0);
        let root = copy_subtree(&self.graph, self.resolve(subtree_root), &mut graph);
        Self::wrap(graph, root)
    }

    /// A structurally identical tree that shares nothing with this one.
    pub fn deep_copy(&self) -> Expr {
        self.clone_subtree(self.root())
    }

    /// Replace the node at `target` along with its inputs by the given tree.
    ///
    /// Returns the index of the replacement's root within this tree, which is the new root when
    /// `target` was the root. `target` and every index within its subtree are no longer valid
    /// afterwards.
    pub fn replace_node(&mut self, target: NodeIndex, replacement: Expr) -> NodeIndex {
        let target = self.resolve(target);
        let new = copy_subtree(&replacement.graph, replacement.root, &mut self.graph);
        let consumer = parent(&self.graph, target);
        self.remove_subtree(target);
        match consumer {
            Some((parent, slot)) => {
                self.graph.add_edge(new, parent, slot);
                trace!("spliced `{}` into slot {} of `{}`", replacement, slot, self.graph[parent]);
            }
            None => {
                assert_eq!(target, self.root, "detached node {:?}", target);
                self.root = new;
                trace!("replaced the root with `{}`", replacement);
            }
        }
        self.handle(new)
    }

    /// Replace the node at `target` with a freshly generated node.
    ///
    /// Inputs of the old node are moved to the new node for every slot the two share. Inputs
    /// beyond the new node's arity are discarded and any further slots are filled with new
    /// terminals. Returns the index of the new node, which is the new root when `target` was
    /// the root. `target` is no longer valid afterwards.
    pub fn mutate<R>(&mut self, rng: &mut R, target: NodeIndex) -> NodeIndex
    where
        R: Rng,
    {
        let target = self.resolve(target);
        let old = self.graph[target];
        let node = Node::generate(rng);
        let new = self.graph.add_node(node);

        // Move the shared inputs across and drop the rest.
        let inputs = self
            .graph
            .edges_directed(target, Incoming)
            .map(|e| (e.id(), e.source(), *e.weight()))
            .collect::<Vec<(EdgeIndex<u32>, GraphIndex, Slot)>>();
        for (e, input, slot) in inputs {
            self.graph.remove_edge(e);
            if slot < node.arity() {
                self.graph.add_edge(input, new, slot);
            } else {
                self.remove_subtree(input);
            }
        }

        // Fill the remaining slots.
        for slot in old.arity()..node.arity() {
            let leaf = self.graph.add_node(<Node as Terminal>::generate(rng));
            self.graph.add_edge(leaf, new, slot);
        }

        // Take the old node's place within its parent.
        if let Some((parent, slot)) = parent(&self.graph, target) {
            self.graph.add_edge(new, parent, slot);
        }
        self.remove_subtree(target);
        if target == self.root {
            self.root = new;
        }

        trace!("mutated `{}` into `{}`", old, node);
        self.handle(new)
    }

    fn generation(&self, ix: GraphIndex) -> u32 {
        self.generations.get(ix.index()).cloned().unwrap_or(0)
    }

    fn handle(&self, ix: GraphIndex) -> NodeIndex {
        NodeIndex {
            index: ix,
            generation: self.generation(ix),
        }
    }

    // The graph index behind `ix`. Panics if the handle does not refer to a node in this tree.
    fn resolve(&self, ix: NodeIndex) -> GraphIndex {
        if !self.contains(ix) {
            panic!("no node at {:?} in `{}`", ix, self);
        }
        ix.index
    }

    // Remove the node at `ix` along with all of its inputs, invalidating their handles.
    fn remove_subtree(&mut self, ix: GraphIndex) {
        let disclude = subtree(&self.graph, ix);
        self.graph.retain_nodes(|_, nx| !disclude.contains(&nx));
        for nx in disclude {
            let i = nx.index();
            if self.generations.len() <= i {
                self.generations.resize(i + 1, 0);
            }
            self.generations[i] += 1;
        }
    }

    fn fmt_node(&self, ix: GraphIndex, f: &mut fmt::Formatter) -> fmt::Result {
        let node = &self.graph[ix];
        write!(f, "{}", node)?;
        if node.is_terminal() {
            return Ok(());
        }
        let slots = slots(&self.graph, ix);
        f.write_str("(")?;
        for slot in 0..node.arity() {
            if slot > 0 {
                f.write_str(", ")?;
            }
            let child = slots[slot]
                .unwrap_or_else(|| panic!("`{}` has no input in slot {}", node.name(), slot));
            self.fmt_node(child, f)?;
        }
        f.write_str(")")
    }
}

/// Produce a child by splicing a random subtree of `b` into a copy of `a` at a random node.
pub fn crossover<R>(rng: &mut R, a: &Expr, b: &Expr) -> Expr
where
    R: Rng,
{
    let mut child = a.deep_copy();
    let target = child.pick_uniform_random_node(rng);
    let donor = b.pick_uniform_random_node(rng);
    let subtree = b.clone_subtree(donor);
    child.replace_node(target, subtree);
    child
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_node(self.root, f)
    }
}

/// The inputs of the node at `ix` indexed by slot.
pub(crate) fn slots(graph: &Graph, ix: GraphIndex) -> [Option<GraphIndex>; MAX_ARITY] {
    let mut slots = [None; MAX_ARITY];
    for e in graph.edges_directed(ix, Incoming) {
        slots[*e.weight()] = Some(e.source());
    }
    slots
}

/// The consumer of the node at `ix` along with the slot it fills.
pub(crate) fn parent(graph: &Graph, ix: GraphIndex) -> Option<(GraphIndex, Slot)> {
    graph
        .edges_directed(ix, Outgoing)
        .next()
        .map(|e| (e.target(), *e.weight()))
}

// Collect the node at `ix` and everything feeding into it.
fn subtree(graph: &Graph, ix: GraphIndex) -> FnvHashSet<GraphIndex> {
    let mut nodes = FnvHashSet::default();
    let inputs = Reversed(graph);
    let mut dfs = Dfs::new(inputs, ix);
    while let Some(n) = dfs.next(inputs) {
        nodes.insert(n);
    }
    nodes
}

// Copy the subtree rooted at `src_root` into `dst`, returning the index of the copied root. The
// copied root is left without a consumer.
fn copy_subtree(src: &Graph, src_root: GraphIndex, dst: &mut Graph) -> GraphIndex {
    let dst_root = dst.add_node(src[src_root]);
    let mut curr = vec![(src_root, dst_root)];
    let mut next = vec![];
    while !curr.is_empty() {
        for (a_src, a_dst) in curr.drain(..) {
            for e in src.edges_directed(a_src, Incoming) {
                let b_dst = dst.add_node(src[e.source()]);
                dst.add_edge(b_dst, a_dst, *e.weight());
                next.push((e.source(), b_dst));
            }
        }
        mem::swap(&mut curr, &mut next);
    }
    dst_root
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn leaf(node: Node) -> Expr {
        Expr::leaf(node).unwrap()
    }

    fn op(node: Node, inputs: Vec<Expr>) -> Expr {
        Expr::new(node, inputs).unwrap()
    }

    // Plus(Sin(X), Cos(Y))
    fn sample() -> Expr {
        op(
            Node::Plus,
            vec![op(Node::Sin, vec![leaf(Node::X)]), op(Node::Cos, vec![leaf(Node::Y)])],
        )
    }

    #[test]
    fn text_form() {
        assert_eq!(sample().to_string(), "Plus(Sin(X), Cos(Y))");
        let e = op(Node::Atan2, vec![leaf(Node::constant(-0.5)), leaf(Node::X)]);
        assert_eq!(e.to_string(), "Atan2(-0.500000000, X)");
    }

    #[test]
    fn eval_sample() {
        let e = sample();
        assert_eq!(e.eval(0.0, 0.0), 1.0);
        let v = e.eval(std::f32::consts::FRAC_PI_2, 0.0);
        assert!((v - 2.0).abs() < 1e-6);
    }

    #[test]
    fn eval_division_by_zero() {
        let e = op(Node::Div, vec![leaf(Node::constant(1.0)), leaf(Node::constant(0.0))]);
        assert_eq!(e.eval(0.0, 0.0), std::f32::INFINITY);
    }

    #[test]
    fn arity_mismatch() {
        let err = Expr::new(Node::Sin, vec![]).unwrap_err();
        assert_eq!(
            err,
            Error::ArityMismatch {
                node: "Sin",
                expected: 1,
                found: 0
            }
        );
        assert!(Expr::leaf(Node::Plus).is_err());
    }

    #[test]
    fn structure_queries() {
        let e = sample();
        let root = e.root();
        assert_eq!(e.parent(root), None);
        let sin = e.child(root, 0).unwrap();
        let cos = e.child(root, 1).unwrap();
        assert_eq!(e.node(sin), Node::Sin);
        assert_eq!(e.node(cos), Node::Cos);
        assert_eq!(e.parent(cos), Some((root, 1)));
        assert_eq!(e.children(root), vec![sin, cos]);
        assert_eq!(e.child(root, 2), None);
        assert!(e.is_complete());
    }

    #[test]
    fn count_and_preorder() {
        let e = sample();
        assert_eq!(e.count_nodes(), 5);
        assert_eq!(leaf(Node::X).count_nodes(), 1);
        let names = e.preorder().iter().map(|&ix| e.node(ix).name()).collect::<Vec<_>>();
        assert_eq!(names, vec!["Plus", "Sin", "X", "Cos", "Y"]);
        for (i, &ix) in e.preorder().iter().enumerate() {
            assert_eq!(e.nth_node(i + 1), ix);
        }
        assert_eq!(e.count_subtree(e.child(e.root(), 1).unwrap()), 2);
    }

    #[test]
    #[should_panic(expected = "does not exist")]
    fn nth_node_out_of_range() {
        sample().nth_node(6);
    }

    #[test]
    fn uniform_selection() {
        let e = op(
            Node::Plus,
            vec![
                op(Node::Sin, vec![leaf(Node::X)]),
                op(Node::Mult, vec![leaf(Node::Y), leaf(Node::constant(0.5))]),
            ],
        );
        let order = e.preorder();
        let n = order.len();
        let trials = 60_000;
        let mut rng = StdRng::seed_from_u64(0);
        let mut counts = vec![0usize; n];
        for _ in 0..trials {
            let ix = e.pick_uniform_random_node(&mut rng);
            let rank = order.iter().position(|&o| o == ix).unwrap();
            counts[rank] += 1;
        }
        let expected = trials / n;
        for count in counts {
            assert!((count as isize - expected as isize).abs() < 600, "{}", count);
        }
    }

    #[test]
    fn deep_copy_is_independent() {
        let e = sample();
        let mut copy = e.deep_copy();
        assert_eq!(copy.to_string(), e.to_string());
        let mut rng = StdRng::seed_from_u64(3);
        let root = copy.root();
        copy.mutate(&mut rng, root);
        assert_eq!(e.to_string(), "Plus(Sin(X), Cos(Y))");
        assert!(e.is_complete() && copy.is_complete());
    }

    #[test]
    fn clone_subtree_detaches() {
        let e = sample();
        let cos = e.child(e.root(), 1).unwrap();
        let sub = e.clone_subtree(cos);
        assert_eq!(sub.to_string(), "Cos(Y)");
        assert_eq!(sub.parent(sub.root()), None);
        assert_eq!(sub.count_nodes(), 2);
    }


    #[test]
    fn replace_inner_node() {
        let mut e = sample();
        let sin = e.child(e.root(), 0).unwrap();
        let x = e.child(sin, 0).unwrap();
        let replacement = op(Node::Minus, vec![leaf(Node::Y), leaf(Node::X)]);
        let new = e.replace_node(sin, replacement);
        assert_eq!(e.to_string(), "Plus(Minus(Y, X), Cos(Y))");
        assert_eq!(e.parent(new), Some((e.root(), 0)));
        assert!(!e.contains(sin));
        assert!(!e.contains(x));
        assert_eq!(e.count_nodes(), 6);
        assert!(e.is_complete());
    }

    #[test]
    fn removed_indices_stay_invalid() {
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..200 {
            let mut e = sample();
            let mut removed = vec![];

            // A splice, a mutation and a second splice, each free to reuse vacated storage.
            let cos = e.child(e.root(), 1).unwrap();
            removed.push(cos);
            removed.extend(e.children(cos));
            e.replace_node(cos, op(Node::Atan, vec![leaf(Node::Y)]));
            let target = e.pick_uniform_random_node(&mut rng);
            e.mutate(&mut rng, target);
            removed.push(target);
            let target = e.pick_uniform_random_node(&mut rng);
            e.replace_node(target, op(Node::Sin, vec![leaf(Node::constant(0.25))]));
            removed.push(target);

            for ix in removed {
                assert!(!e.contains(ix), "{:?} in `{}`", ix, e);
            }
            assert!(e.is_complete());
            for ix in e.preorder() {
                assert!(e.contains(ix));
            }
        }
    }

    #[test]
    #[should_panic(expected = "no node at")]
    fn mutate_removed_index_panics() {
        let mut rng = StdRng::seed_from_u64(14);
        let mut e = sample();
        let sin = e.child(e.root(), 0).unwrap();
        e.replace_node(sin, op(Node::Cos, vec![leaf(Node::X)]));
        let x = e.preorder()[2];
        e.mutate(&mut rng, x);
        e.mutate(&mut rng, sin);
    }

    #[test]
    #[should_panic(expected = "no node at")]
    fn replaced_root_is_invalid() {
        let mut rng = StdRng::seed_from_u64(15);
        let mut e = sample();
        let root = e.root();
        let new = e.mutate(&mut rng, root);
        assert_eq!(e.root(), new);
        e.replace_node(new, leaf(Node::X));
        e.node(root);
    }

    #[test]
    fn replace_root_yields_replacement() {
        let mut copy = sample().deep_copy();
        let r = op(Node::Atan, vec![leaf(Node::X)]);
        let root = copy.root();
        let new = copy.replace_node(root, r.clone());
        assert_eq!(copy.root(), new);
        assert_eq!(copy.parent(new), None);
        assert!(!copy.contains(root));
        assert_eq!(copy.to_string(), r.to_string());
        assert_eq!(copy.count_nodes(), r.count_nodes());
        assert!(copy.is_complete());
    }

    #[test]
    fn mutate_preserves_completeness() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let mut e = sample();
            let target = e.pick_uniform_random_node(&mut rng);
            let was_root = target == e.root();
            let before = e.count_nodes();
            let input_text = (0..MAX_ARITY)
                .map(|slot| {
                    e.child(target, slot)
                        .map(|ix| (e.clone_subtree(ix).to_string(), e.count_subtree(ix)))
                })
                .collect::<Vec<_>>();

            let new = e.mutate(&mut rng, target);
            let node = e.node(new);
            assert!(e.is_complete());
            assert!(!e.contains(target));
            if was_root {
                assert_eq!(e.root(), new);
            }

            // Shared inputs are moved, the rest are dropped or filled with terminals.
            let mut expected = before;
            for slot in 0..MAX_ARITY {
                match (&input_text[slot], slot < node.arity()) {
                    (Some((text, _)), true) => {
                        let child = e.child(new, slot).unwrap();
                        assert_eq!(&e.clone_subtree(child).to_string(), text);
                    }
                    (Some((_, size)), false) => expected -= *size,
                    (None, true) => {
                        expected += 1;
                        assert!(e.node(e.child(new, slot).unwrap()).is_terminal());
                    }
                    (None, false) => (),
                }
            }
            assert_eq!(e.count_nodes(), expected);
        }
    }

    #[test]
    fn mutate_leaf_changes_count_by_arity() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let mut e = sample();
            let x = e.preorder()[2];
            let before = e.count_nodes() as isize;
            let new = e.mutate(&mut rng, x);
            let grown = e.count_nodes() as isize - before;
            assert_eq!(grown, e.node(new).arity() as isize);
        }
    }

    #[test]
    fn crossover_is_complete() {
        let mut rng = StdRng::seed_from_u64(9);
        let a = sample();
        let b = op(Node::Div, vec![leaf(Node::X), op(Node::Atan, vec![leaf(Node::Y)])]);
        for _ in 0..200 {
            let child = crossover(&mut rng, &a, &b);
            assert!(child.is_complete());
            assert_eq!(child.parent(child.root()), None);
        }
        assert_eq!(a.to_string(), "Plus(Sin(X), Cos(Y))");
    }
}
