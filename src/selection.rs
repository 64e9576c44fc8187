use std::collections::HashSet;

use crate::record::RecordId;

/// Tri-state of the "check all" header box over the filtered list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderCheck {
    Unchecked,
    Partial,
    Checked,
}

/// Checked record ids, independent of paging and filtering.
///
/// Ids not present in the current content are tolerated but not counted;
/// `validate` drops them.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    checked: HashSet<RecordId>,
    known: HashSet<RecordId>,
    count: usize,
    last_clicked: Option<RecordId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_checked(&self, id: &RecordId) -> bool {
        self.checked.contains(id)
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn ids(&self) -> &HashSet<RecordId> {
        &self.checked
    }

    pub fn last_clicked(&self) -> Option<&RecordId> {
        self.last_clicked.as_ref()
    }

    /// Check or uncheck one id
    pub fn set(&mut self, id: &RecordId, checked: bool) {
        let changed = if checked {
            self.checked.insert(id.clone())
        } else {
            self.checked.remove(id)
        };

        if changed && self.known.contains(id) {
            if checked {
                self.count += 1;
            } else {
                self.count -= 1;
            }
        }
    }

    /// Flip one id, returning its new state
    pub fn toggle(&mut self, id: &RecordId) -> bool {
        let checked = !self.is_checked(id);
        self.set(id, checked);
        checked
    }

    /// Set every id between `from` and `to` (inclusive, either order) in
    /// `filtered` order. Returns false, changing nothing, when either end is
    /// not in `filtered`.
    pub fn set_range(&mut self, from: &RecordId, to: &RecordId, checked: bool, filtered: &[RecordId]) -> bool {
        let (Some(a), Some(b)) = (
            filtered.iter().position(|id| id == from),
            filtered.iter().position(|id| id == to),
        ) else {
            return false;
        };

        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        for id in &filtered[start..=end] {
            self.set(id, checked);
        }
        true
    }

    /// Apply to every filtered id; rows hidden by the filter keep their state
    pub fn check_all<'a>(&mut self, checked: bool, filtered: impl IntoIterator<Item = &'a RecordId>) {
        for id in filtered {
            self.set(id, checked);
        }
    }

    /// Drop ids not in `current` and recount
    pub fn validate<'a>(&mut self, current: impl IntoIterator<Item = &'a RecordId>) {
        self.known = current.into_iter().cloned().collect();
        let known = &self.known;
        self.checked.retain(|id| known.contains(id));
        self.count = self.checked.len();

        if self.last_clicked.as_ref().is_some_and(|id| !known.contains(id)) {
            self.last_clicked = None;
        }
    }

    pub fn header_state<'a>(&self, filtered: impl IntoIterator<Item = &'a RecordId>) -> HeaderCheck {
        let mut any_checked = false;
        let mut any_unchecked = false;
        for id in filtered {
            if self.is_checked(id) {
                any_checked = true;
            } else {
                any_unchecked = true;
            }
        }

        match (any_checked, any_unchecked) {
            (true, true) => HeaderCheck::Partial,
            (true, false) => HeaderCheck::Checked,
            _ => HeaderCheck::Unchecked,
        }
    }

    /// Click on a row's check box. With `shift` and a remembered previous
    /// click, the range between the two rows takes the opposite of the
    /// clicked row's current state.
    pub fn click(&mut self, id: &RecordId, shift: bool, filtered: &[RecordId]) {
        let mut toggle = true;

        if shift {
            if let Some(last) = self.last_clicked.clone() {
                let checked = self.is_checked(id);
                toggle = !self.set_range(id, &last, !checked, filtered);
            }
        }

        if toggle {
            self.toggle(id);
        }
        self.last_clicked = Some(id.clone());
    }

    /// Click on the header box: check all filtered rows when none is
    /// checked, otherwise uncheck them all
    pub fn header_click(&mut self, filtered: &[RecordId]) {
        let any_checked = filtered.iter().any(|id| self.is_checked(id));
        self.last_clicked = None;
        self.check_all(!any_checked, filtered);
    }
}
