//! Common items related to Genetic Programming.
//!
//! Expressions are trees of nodes with some level of arity - aka the number of inputs. The
//! terminals are the `X` and `Y` coordinates along with random constants, the functions are
//! basic arithmetic along with `Sin`, `Cos`, `Atan` and `Atan2`.
//!
//! - `node`: the node kinds, their arity and evaluation.
//! - `expr`: complete trees along with mutation and crossover.
//! - `gen`: growing random trees.
//! - `grammar`: reading trees back from text.

pub mod expr;
pub mod gen;
pub mod grammar;
pub mod node;
