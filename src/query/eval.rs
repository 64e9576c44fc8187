use std::sync::OnceLock;

use regex::Regex;

use super::parser::{QueryNode, RelOp};
use crate::record::Record;

impl QueryNode {
    /// Evaluate against one record. Both sides of AND/OR are always
    /// evaluated.
    pub fn evaluate(&self, record: &Record) -> bool {
        match self {
            QueryNode::Term { field: None, text, .. } => record.search_text().contains(text.as_str()),
            QueryNode::Term { field: Some(field), op, text } => match record.field_value(field) {
                Some(value) => compare(*op, value, text),
                None => false,
            },
            QueryNode::And(l, r) => {
                let left = l.evaluate(record);
                let right = r.evaluate(record);
                left && right
            }
            QueryNode::Or(l, r) => {
                let left = l.evaluate(record);
                let right = r.evaluate(record);
                left || right
            }
            QueryNode::Not(m) => !m.evaluate(record),
        }
    }
}

/// `text` is already lower-cased by the compiler
pub fn compare(op: RelOp, value: &str, text: &str) -> bool {
    match op {
        RelOp::Contains => value.to_lowercase().contains(text),
        RelOp::Eq => value.to_lowercase() == text,
        RelOp::Ne => value.to_lowercase() != text,
        RelOp::Gt | RelOp::Ge | RelOp::Lt | RelOp::Le => {
            let (Some(lhs), Some(rhs)) = (parse_int(value), parse_int(text)) else {
                return false;
            };
            match op {
                RelOp::Gt => lhs > rhs,
                RelOp::Ge => lhs >= rhs,
                RelOp::Lt => lhs < rhs,
                _ => lhs <= rhs,
            }
        }
    }
}

/// Leading integer of a string: optional whitespace and sign, then digits.
/// Anything after the digits is ignored, so `"150 MB"` reads as 150. The
/// value is held as `f64`, so digit runs past the `i64` range still compare
/// by magnitude, with precision lost beyond 2^53.
pub fn parse_int(s: &str) -> Option<f64> {
    static LEADING_INT: OnceLock<Regex> = OnceLock::new();
    let re = LEADING_INT.get_or_init(|| Regex::new(r"^\s*([+-]?\d+)").expect("valid pattern"));
    re.captures(s)?.get(1)?.as_str().parse().ok()
}
