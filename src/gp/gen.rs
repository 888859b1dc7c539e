//! Functions for growing random expression trees.
//!
//! Growth happens on a `Sapling`: a tree that may still have empty input slots. A sapling only
//! becomes an `Expr` once every slot is filled, so incomplete trees never escape this module.

use crate::gp::expr::{self, Expr, Graph, GraphIndex, Slot};
use crate::gp::node::{Arity, Function, Node, Terminal};
use log::debug;
use rand::Rng;

/// A tree under construction.
#[derive(Clone, Debug)]
pub struct Sapling {
    graph: Graph,
    root: GraphIndex,
}

impl Sapling {
    /// Begin a new tree with the given node at its root and all of its slots empty.
    pub fn new(root: Node) -> Self {
        let mut graph = Graph::default();
        let root = graph.add_node(root);
        Sapling { graph, root }
    }

    /// The number of nodes grown so far.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Attach `node` to an empty slot found by walking down from the root.
    ///
    /// At each step a slot of the current node is chosen uniformly. If it is empty the node is
    /// attached there, otherwise the walk continues from the occupant. Slots close to the root
    /// are therefore favoured over a uniform choice among all empty slots.
    ///
    /// Returns `None` without attaching anything if the walk arrives at a terminal.
    pub fn graft_into_random_slot<R>(&mut self, rng: &mut R, node: Node) -> Option<GraphIndex>
    where
        R: Rng,
    {
        let mut current = self.root;
        loop {
            let arity = self.graph[current].arity();
            if arity == 0 {
                return None;
            }
            let slot = rng.gen_range(0..arity);
            match expr::slots(&self.graph, current)[slot] {
                Some(occupant) => current = occupant,
                None => return Some(self.attach(node, current, slot)),
            }
        }
    }

    /// Attach `leaf` to the first empty slot found by a depth-first, left-to-right search.
    ///
    /// Returns `false` if the tree is already complete.
    pub fn fill_first_empty_slot(&mut self, leaf: Node) -> bool {
        match first_empty_slot(&self.graph, self.root) {
            Some((parent, slot)) => {
                self.attach(leaf, parent, slot);
                true
            }
            None => false,
        }
    }

    /// Whether or not every slot has been filled.
    pub fn is_complete(&self) -> bool {
        first_empty_slot(&self.graph, self.root).is_none()
    }

    /// Fill every remaining slot with random terminals, producing a complete tree.
    pub fn finish<R>(mut self, rng: &mut R) -> Expr
    where
        R: Rng,
    {
        loop {
            let leaf = <Node as Terminal>::generate(rng);
            if !self.fill_first_empty_slot(leaf) {
                break;
            }
        }
        Expr::from_graph(self.graph, self.root)
    }

    fn attach(&mut self, node: Node, parent: GraphIndex, slot: Slot) -> GraphIndex {
        let nx = self.graph.add_node(node);
        self.graph.add_edge(nx, parent, slot);
        nx
    }
}

fn first_empty_slot(graph: &Graph, ix: GraphIndex) -> Option<(GraphIndex, Slot)> {
    let slots = expr::slots(graph, ix);
    for slot in 0..graph[ix].arity() {
        match slots[slot] {
            None => return Some((ix, slot)),
            Some(child) => {
                if let Some(found) = first_empty_slot(graph, child) {
                    return Some(found);
                }
            }
        }
    }
    None
}

/// Grow a random tree containing exactly `budget` function nodes.
///
/// The tree begins as a single function to which `budget - 1` further functions are grafted,
/// after which every empty slot is filled with a terminal. A `budget` of `0` produces no tree.
pub fn grow_tree<R>(rng: &mut R, budget: usize) -> Option<Expr>
where
    R: Rng,
{
    if budget == 0 {
        return None;
    }
    let mut sapling = Sapling::new(<Node as Function>::generate(rng));
    for _ in 1..budget {
        let node = <Node as Function>::generate(rng);
        let grafted = sapling.graft_into_random_slot(rng, node);
        debug_assert!(grafted.is_some(), "functions always leave an empty slot");
    }
    let expr = sapling.finish(rng);
    debug!("grew {} nodes from a budget of {}", expr.count_nodes(), budget);
    Some(expr)
}
