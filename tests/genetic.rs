//! Genetic operators keep every tree complete.

use rand::rngs::StdRng;
use rand::SeedableRng;
use texgen::gp::expr::crossover;
use texgen::gp::gen::grow_tree;
use texgen::gp::node::Arity;
use texgen::Expr;

fn assert_arity(expr: &Expr) {
    assert!(expr.is_complete());
    for ix in expr.preorder() {
        assert_eq!(expr.children(ix).len(), expr.node(ix).arity());
    }
    assert_eq!(expr.preorder().len(), expr.count_nodes());
}

#[test]
fn mutation_sequences_stay_complete() {
    let mut rng = StdRng::seed_from_u64(17);
    for budget in 1..30 {
        let mut expr = grow_tree(&mut rng, budget).unwrap();
        for _ in 0..20 {
            let target = expr.pick_uniform_random_node(&mut rng);
            let was_root = target == expr.root();
            let new = expr.mutate(&mut rng, target);
            if was_root {
                assert_eq!(expr.root(), new);
            }
            assert_arity(&expr);
        }
    }
}

#[test]
fn crossover_children_stay_complete() {
    let mut rng = StdRng::seed_from_u64(18);
    let parents = (1..10)
        .map(|budget| grow_tree(&mut rng, budget).unwrap())
        .collect::<Vec<_>>();
    for a in &parents {
        for b in &parents {
            let child = crossover(&mut rng, a, b);
            assert_arity(&child);
            assert_eq!(child.parent(child.root()), None);
        }
    }
}

#[test]
fn replacing_the_root_of_a_copy_yields_the_replacement() {
    let mut rng = StdRng::seed_from_u64(19);
    let a = grow_tree(&mut rng, 8).unwrap();
    let b = grow_tree(&mut rng, 8).unwrap();
    let donor = b.pick_uniform_random_node(&mut rng);
    let replacement = b.clone_subtree(donor);
    let text = replacement.to_string();

    let mut copy = a.deep_copy();
    let root = copy.root();
    copy.replace_node(root, replacement);
    assert_eq!(copy.to_string(), text);
    assert_arity(&copy);
}

#[test]
fn seeded_growth_is_reproducible() {
    let grow = |seed| {
        let mut rng = StdRng::seed_from_u64(seed);
        (1..20)
            .map(|budget| grow_tree(&mut rng, budget).unwrap().to_string())
            .collect::<Vec<_>>()
    };
    assert_eq!(grow(5), grow(5));
    assert_ne!(grow(5), grow(6));
}
