//! Index-aligned synchronisation of a rendered list with a freshly built one.
//!
//! The new rows are always built from scratch. Instead of swapping them in
//! wholesale, the old list is walked in lockstep with the new one and only
//! the cells whose serialized form differs are replaced. Everything else
//! keeps its identity, which a front end can rely on to preserve focus,
//! hover and in-flight pointer state.

use std::rc::Rc;

use crate::record::RecordId;

/// Anything that can be compared by a deterministic serialization
pub trait VisualNode {
    fn serialize(&self) -> String;
}

/// What happened at one index of a reconciled list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Replace(usize),
    Append(usize),
    Remove(usize),
}

/// Bring `old` in line with `new`, replacing only mismatching entries
pub fn reconcile_list<T: VisualNode>(old: &mut Vec<Rc<T>>, new: Vec<Rc<T>>) -> Vec<Mutation> {
    let mut mutations = Vec::new();
    let new_len = new.len();

    for (i, node) in new.into_iter().enumerate() {
        if i < old.len() {
            if old[i].serialize() != node.serialize() {
                old[i] = node;
                mutations.push(Mutation::Replace(i));
            }
        } else {
            old.push(node);
            mutations.push(Mutation::Append(i));
        }
    }

    while old.len() > new_len {
        old.pop();
        mutations.push(Mutation::Remove(old.len()));
    }

    mutations
}

/// One rendered cell
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VisualCell {
    pub content: String,
    pub classes: Vec<String>,
}

impl VisualCell {
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into(), classes: Vec::new() }
    }

    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

impl VisualNode for VisualCell {
    fn serialize(&self) -> String {
        format!("{}|{}", self.classes.join(" "), self.content)
    }
}

/// Identity and classes of a rendered row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMeta {
    pub id: RecordId,
    pub classes: Vec<String>,
}

impl RowMeta {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

#[derive(Debug, Clone)]
pub struct VisualRow {
    pub meta: RowMeta,
    pub cells: Vec<Rc<VisualCell>>,
}

impl VisualRow {
    pub fn new(id: RecordId, classes: Vec<String>, cells: Vec<VisualCell>) -> Self {
        Self {
            meta: RowMeta { id, classes },
            cells: cells.into_iter().map(Rc::new).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowMutation {
    /// Row metadata changed (it is reassigned regardless)
    Meta { row: usize },
    Cell { row: usize, cell: Mutation },
    AppendRow(usize),
    RemoveRow(usize),
}

/// Walk old and new rows by index: update metadata, diff cells, append new
/// rows and drop surplus rows from the tail
pub fn reconcile_rows(old: &mut Vec<VisualRow>, new: Vec<VisualRow>) -> Vec<RowMutation> {
    let mut mutations = Vec::new();
    let new_len = new.len();

    for (i, row) in new.into_iter().enumerate() {
        if let Some(old_row) = old.get_mut(i) {
            if old_row.meta != row.meta {
                mutations.push(RowMutation::Meta { row: i });
            }
            old_row.meta = row.meta;
            for cell in reconcile_list(&mut old_row.cells, row.cells) {
                mutations.push(RowMutation::Cell { row: i, cell });
            }
        } else {
            old.push(row);
            mutations.push(RowMutation::AppendRow(i));
        }
    }

    while old.len() > new_len {
        old.pop();
        mutations.push(RowMutation::RemoveRow(old.len()));
    }

    mutations
}
