//! Evolving images from small symbolic expressions.
//!
//! Every pixel of a texture is produced by evaluating an expression tree over the pixel's
//! coordinates, one tree per colour channel. Trees are grown at random and then evolved via
//! subtree crossover and point mutation, with the viewer selecting which textures survive.
//!
//! - `gp` holds the expression engine: nodes, trees, growth, genetic operators and the text
//!   grammar used to store trees.
//! - `texture` bundles three channel trees into an individual.
//! - `ga` breeds populations of textures and samples them in parallel.

pub mod config;
pub mod error;
pub mod ga;
pub mod gp;
pub mod texture;

pub use crate::config::{Canvas, Config};
pub use crate::error::{Error, LexError, ParseError, Result};
pub use crate::gp::expr::{Expr, NodeIndex};
pub use crate::gp::node::Node;
pub use crate::texture::Texture;
