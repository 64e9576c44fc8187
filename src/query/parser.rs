use std::fmt;

use super::lexer::{Lexer, Token};

/// How a field-scoped term compares its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Contains,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl RelOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            RelOp::Contains => ":",
            RelOp::Eq => "=",
            RelOp::Ne => "<>",
            RelOp::Gt => ">",
            RelOp::Ge => ">=",
            RelOp::Lt => "<",
            RelOp::Le => "<=",
        }
    }
}

/// Candidate operators in tie-break order: on equal start index the earlier
/// entry wins, so `<=` beats `<` and `>=` beats `>`.
const OPERATORS: [RelOp; 7] = [
    RelOp::Contains,
    RelOp::Ge,
    RelOp::Le,
    RelOp::Ne,
    RelOp::Gt,
    RelOp::Lt,
    RelOp::Eq,
];

/// Compiled filter tree
#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    Term {
        field: Option<String>,
        op: RelOp,
        /// Lower-cased value to look for
        text: String,
    },
    And(Box<QueryNode>, Box<QueryNode>),
    Or(Box<QueryNode>, Box<QueryNode>),
    Not(Box<QueryNode>),
}

impl QueryNode {
    /// Field-less containment term
    pub fn text(text: &str) -> Self {
        QueryNode::Term { field: None, op: RelOp::Contains, text: text.to_lowercase() }
    }

    pub fn field(field: &str, op: RelOp, text: &str) -> Self {
        QueryNode::Term { field: Some(field.to_string()), op, text: text.to_lowercase() }
    }

    pub fn and(left: QueryNode, right: QueryNode) -> Self {
        QueryNode::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: QueryNode, right: QueryNode) -> Self {
        QueryNode::Or(Box::new(left), Box::new(right))
    }

    pub fn not(child: QueryNode) -> Self {
        QueryNode::Not(Box::new(child))
    }

    /// Build a term from a raw word, splitting off a field name when the
    /// unquoted part holds a relational operator
    pub fn from_word(word: &str, quoted_from: Option<usize>) -> Self {
        let searchable = &word[..quoted_from.unwrap_or(word.len())];

        let mut best: Option<(usize, RelOp)> = None;
        for op in OPERATORS {
            if let Some(pos) = searchable.find(op.symbol()) {
                if best.map_or(true, |(best_pos, _)| pos < best_pos) {
                    best = Some((pos, op));
                }
            }
        }

        match best {
            Some((pos, op)) if is_field_name(&word[..pos]) => {
                QueryNode::field(&word[..pos], op, &word[pos + op.symbol().len()..])
            }
            _ => QueryNode::text(word),
        }
    }
}

fn is_field_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryNode::Term { field: None, text, .. } => write!(f, "{:?}", text),
            QueryNode::Term { field: Some(field), op, text } => {
                write!(f, "{}{}{:?}", field, op.symbol(), text)
            }
            QueryNode::And(l, r) => write!(f, "({} AND {})", l, r),
            QueryNode::Or(l, r) => write!(f, "({} OR {})", l, r),
            QueryNode::Not(m) => write!(f, "NOT {}", m),
        }
    }
}

/// Recursive descent over the token stream with one token of lookahead.
///
/// `expression(true)` keeps consuming implicitly ANDed terms until `)` or
/// end of input; `expression(false)` returns as soon as it has one node,
/// which is what `-` and `|` use to capture exactly the next term.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { lexer: Lexer::new(input) }
    }

    /// Parse the whole input; `None` means "match everything"
    pub fn parse(mut self) -> Option<QueryNode> {
        self.expression(true)
    }

    fn expression(&mut self, greedy: bool) -> Option<QueryNode> {
        let mut node: Option<QueryNode> = None;

        loop {
            node = match self.lexer.next_token() {
                None | Some(Token::RParen) => return node,
                Some(Token::Not) => {
                    let negated = self.expression(false).map(QueryNode::not);
                    join(node, negated, QueryNode::and)
                }
                Some(Token::LParen) => {
                    let group = self.expression(true);
                    join(node, group, QueryNode::and)
                }
                Some(Token::Or) => {
                    // a trailing `|` adds nothing
                    let alternative = self.expression(false);
                    join(node, alternative, QueryNode::or)
                }
                Some(Token::Word { text, quoted_from }) => {
                    let term = QueryNode::from_word(&text, quoted_from);
                    join(node, Some(term), QueryNode::and)
                }
            };

            if !greedy && node.is_some() {
                return node;
            }
        }
    }
}

fn join(
    left: Option<QueryNode>,
    right: Option<QueryNode>,
    combine: fn(QueryNode, QueryNode) -> QueryNode,
) -> Option<QueryNode> {
    match (left, right) {
        (Some(l), Some(r)) => Some(combine(l, r)),
        (l, r) => l.or(r),
    }
}
