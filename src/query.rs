//! Filter expressions typed by the user.
//!
//! A filter is a sequence of terms joined implicitly with AND:
//! - `word` matches records whose default text contains `word`
//! - `field:word`, `field=word`, `field<>word` compare one named value
//! - `field>10`, `field>=10`, `field<10`, `field<=10` compare numerically
//! - `-term` negates, `a | b` ORs, `( ... )` groups
//! - `"quoted text"` keeps spaces and operator characters literal
//!
//! Compilation never fails: malformed input yields whatever tree could be
//! built before the input ran out.

pub mod eval;
pub mod lexer;
pub mod parser;

pub use lexer::{Lexer, Token};
pub use parser::{Parser, QueryNode, RelOp};

use tracing::debug;

use crate::record::Record;

/// A compiled filter, reused for every record until the text changes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    text: String,
    root: Option<QueryNode>,
}

impl Query {
    pub fn compile(text: &str) -> Self {
        let root = Parser::new(text).parse();
        debug!(filter = text, empty = root.is_none(), "compiled filter");
        Self { text: text.to_string(), root }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn root(&self) -> Option<&QueryNode> {
        self.root.as_ref()
    }

    /// An empty query matches everything
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.root.as_ref().map_or(true, |node| node.evaluate(record))
    }
}
