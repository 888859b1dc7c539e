//! Reading expressions back from their text form.
//!
//! The text form is fully parenthesised prefix notation, exactly as produced by the `Display`
//! implementations of `Expr` and `Texture`:
//!
//! ```text
//! Plus(Sin(X), Mult(Y, -0.250000000))
//! EquationImage(X, Cos(Y), 0.500000000)
//! ```

pub mod lexer;
pub mod parser;
pub mod token;

pub use self::lexer::{lex, Lexer};
pub use self::parser::Parser;
pub use self::token::{Span, Token, TokenKind};

use crate::error::{Error, Result};
use crate::gp::expr::Expr;
use crate::texture::Texture;
use std::str::FromStr;

/// Read an expression from its text form.
pub fn parse(text: &str) -> Result<Expr> {
    let tokens = lex(text)?;
    let expr = Parser::new(tokens).parse_expr()?;
    Ok(expr)
}

/// Read a texture from its `EquationImage(..)` text form.
pub fn parse_texture(text: &str) -> Result<Texture> {
    let tokens = lex(text)?;
    let texture = Parser::new(tokens).parse_texture()?;
    Ok(texture)
}

impl FromStr for Expr {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        parse(s)
    }
}

impl FromStr for Texture {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        parse_texture(s)
    }
}
