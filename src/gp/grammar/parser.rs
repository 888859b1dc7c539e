use crate::error::ParseError;
use crate::gp::expr::{Expr, Graph, GraphIndex};
use crate::gp::grammar::token::{Token, TokenKind};
use crate::gp::node::{Arity, Node};
use crate::texture::Texture;

pub type ParseResult<T> = Result<T, ParseError>;

/// The identifier opening the text form of a `Texture`.
pub const TEXTURE_IDENTIFIER: &str = "EquationImage";

/// The deepest nesting of nodes the parser accepts before giving up.
pub const MAX_DEPTH: usize = 1024;

/// Recursive-descent parser over the prefix text form.
///
/// Parentheses only separate tokens: they are consumed wherever they appear and are never
/// checked for balance. Each identifier is followed by exactly as many inputs as its arity,
/// and tokens after the last input of the root are ignored. Trees nested deeper than
/// `MAX_DEPTH` are rejected rather than exhausting the stack.
pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    index: usize,
}

impl<'a> Parser<'a> {
    /// `tokens` must end with an `Eof` token, as produced by `lex`.
    pub fn new(tokens: Vec<Token<'a>>) -> Self {
        debug_assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
        Self { tokens, index: 0 }
    }

    pub fn parse_expr(&mut self) -> ParseResult<Expr> {
        let mut graph = Graph::default();
        let root = self.parse_node(&mut graph, 1)?;
        Ok(Expr::from_graph(graph, root))
    }

    /// Parse `EquationImage(<r>, <g>, <b>)`.
    pub fn parse_texture(&mut self) -> ParseResult<Texture> {
        let token = self.next_significant();
        match token.kind {
            TokenKind::Identifier if token.text == TEXTURE_IDENTIFIER => (),
            TokenKind::Eof => {
                return Err(ParseError::UnexpectedEnd {
                    position: token.span.start,
                })
            }
            _ => {
                return Err(ParseError::ExpectedTexture {
                    found: token.text.to_string(),
                    position: token.span.start,
                })
            }
        }
        let r = self.parse_expr()?;
        let g = self.parse_expr()?;
        let b = self.parse_expr()?;
        Ok(Texture::new(r, g, b))
    }

    fn parse_node(&mut self, graph: &mut Graph, depth: usize) -> ParseResult<GraphIndex> {
        let token = self.next_significant();
        if depth > MAX_DEPTH && token.kind != TokenKind::Eof {
            return Err(ParseError::TooDeep {
                limit: MAX_DEPTH,
                position: token.span.start,
            });
        }
        match token.kind {
            TokenKind::Eof => Err(ParseError::UnexpectedEnd {
                position: token.span.start,
            }),
            TokenKind::Number => {
                let value = token
                    .text
                    .parse::<f32>()
                    .map_err(|_| ParseError::InvalidNumber {
                        literal: token.text.to_string(),
                        position: token.span.start,
                    })?;
                Ok(graph.add_node(Node::Constant(value)))
            }
            TokenKind::Identifier => {
                let node =
                    Node::from_name(token.text).ok_or_else(|| ParseError::UnknownIdentifier {
                        name: token.text.to_string(),
                        position: token.span.start,
                    })?;
                let nx = graph.add_node(node);
                for slot in 0..node.arity() {
                    let input = self.parse_node(graph, depth + 1)?;
                    graph.add_edge(input, nx, slot);
                }
                Ok(nx)
            }
            TokenKind::OpenParen | TokenKind::CloseParen => {
                unreachable!("parentheses are skipped")
            }
        }
    }

    // The next token that is not a parenthesis. Keeps returning `Eof` once it is reached.
    fn next_significant(&mut self) -> Token<'a> {
        loop {
            let token = self.tokens[self.index];
            if token.kind != TokenKind::Eof {
                self.index += 1;
            }
            match token.kind {
                TokenKind::OpenParen | TokenKind::CloseParen => continue,
                _ => return token,
            }
        }
    }
}
