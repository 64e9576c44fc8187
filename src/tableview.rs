use std::ops::Range;

use fasttable::drag::{RowBox, Viewport};
use fasttable::record::RecordId;

/// Width of the check box column, including its spacing
pub const CHECK_WIDTH: u16 = 4;

/// Cursor and viewport over the rows of the current page
#[derive(Debug, Clone)]
pub struct TableView {
    /// Index into the page's rows
    pub cursor_row: usize,

    /// First visible page row
    pub viewport_row: usize,
    /// Rows that fit on screen (set during render)
    pub viewport_height: usize,

    /// Screen position of the first body row (set during render)
    pub body_top: u16,
    pub body_left: u16,
}

impl TableView {
    pub fn new() -> Self {
        Self {
            cursor_row: 0,
            viewport_row: 0,
            viewport_height: 20,
            body_top: 0,
            body_left: 0,
        }
    }

    /// Keep the cursor on the page after it shrank or changed
    pub fn clamp_cursor(&mut self, page_len: usize) {
        self.cursor_row = self.cursor_row.min(page_len.saturating_sub(1));
        self.viewport_row = self.viewport_row.min(page_len.saturating_sub(self.viewport_height));
        self.scroll_to_cursor();
    }

    /// Ensure viewport contains the cursor
    pub fn scroll_to_cursor(&mut self) {
        if self.cursor_row < self.viewport_row {
            self.viewport_row = self.cursor_row;
        } else if self.cursor_row >= self.viewport_row + self.viewport_height.max(1) {
            self.viewport_row = self.cursor_row + 1 - self.viewport_height.max(1);
        }
    }

    pub fn move_up(&mut self) {
        if self.cursor_row > 0 {
            self.cursor_row -= 1;
            self.scroll_to_cursor();
        }
    }

    pub fn move_down(&mut self, page_len: usize) {
        if self.cursor_row + 1 < page_len {
            self.cursor_row += 1;
            self.scroll_to_cursor();
        }
    }

    pub fn move_to_top(&mut self) {
        self.cursor_row = 0;
        self.viewport_row = 0;
    }

    /// Shift the viewport by `step` rows without moving the cursor
    pub fn scroll_by(&mut self, step: i32, page_len: usize) {
        let max_start = page_len.saturating_sub(self.viewport_height);
        let start = self.viewport_row as i64 + step as i64;
        self.viewport_row = start.clamp(0, max_start as i64) as usize;
    }

    pub fn visible_rows(&self, page_len: usize) -> Range<usize> {
        let start = self.viewport_row.min(page_len);
        start..(start + self.viewport_height).min(page_len)
    }

    /// Page row under a screen line
    pub fn row_at(&self, line: u16, page_len: usize) -> Option<usize> {
        let offset = line.checked_sub(self.body_top)? as usize;
        let row = self.viewport_row + offset;
        self.visible_rows(page_len).contains(&row).then_some(row)
    }

    pub fn is_check_column(&self, column: u16) -> bool {
        column >= self.body_left && column < self.body_left + CHECK_WIDTH
    }

    /// Screen boxes of the visible rows, one line each
    pub fn row_boxes(&self, page_ids: &[RecordId]) -> Vec<RowBox> {
        self.visible_rows(page_ids.len())
            .map(|row| RowBox {
                id: page_ids[row].clone(),
                top: self.body_top as i32 + (row - self.viewport_row) as i32,
                height: 1,
            })
            .collect()
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            top: self.body_top as i32,
            height: self.viewport_height as i32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(height: usize) -> TableView {
        TableView {
            viewport_height: height,
            body_top: 3,
            body_left: 1,
            ..TableView::new()
        }
    }

    fn ids(n: i64) -> Vec<RecordId> {
        (1..=n).map(RecordId::Int).collect()
    }

    #[test]
    fn test_cursor_scrolls_viewport() {
        let mut v = view(3);
        for _ in 0..4 {
            v.move_down(10);
        }
        assert_eq!(v.cursor_row, 4);
        assert_eq!(v.viewport_row, 2);

        v.move_to_top();
        assert_eq!((v.cursor_row, v.viewport_row), (0, 0));
        v.move_up();
        assert_eq!(v.cursor_row, 0);
    }

    #[test]
    fn test_cursor_stops_at_page_end() {
        let mut v = view(5);
        for _ in 0..10 {
            v.move_down(3);
        }
        assert_eq!(v.cursor_row, 2);
    }

    #[test]
    fn test_clamp_after_page_shrinks() {
        let mut v = view(3);
        v.cursor_row = 8;
        v.viewport_row = 6;
        v.clamp_cursor(4);
        assert_eq!(v.cursor_row, 3);
        assert_eq!(v.viewport_row, 1);

        v.clamp_cursor(0);
        assert_eq!((v.cursor_row, v.viewport_row), (0, 0));
    }

    #[test]
    fn test_scroll_by_stays_in_bounds() {
        let mut v = view(3);
        v.scroll_by(1, 10);
        assert_eq!(v.viewport_row, 1);
        v.scroll_by(-5, 10);
        assert_eq!(v.viewport_row, 0);
        v.scroll_by(20, 10);
        assert_eq!(v.viewport_row, 7);
        v.scroll_by(1, 2);
        assert_eq!(v.viewport_row, 0);
    }

    #[test]
    fn test_row_hit_testing() {
        let mut v = view(3);
        v.viewport_row = 2;
        assert_eq!(v.row_at(2, 10), None);
        assert_eq!(v.row_at(3, 10), Some(2));
        assert_eq!(v.row_at(5, 10), Some(4));
        assert_eq!(v.row_at(6, 10), None);
        assert_eq!(v.row_at(4, 3), None);

        assert!(v.is_check_column(1));
        assert!(v.is_check_column(4));
        assert!(!v.is_check_column(5));
        assert!(!v.is_check_column(0));
    }

    #[test]
    fn test_row_boxes_cover_visible_rows() {
        let mut v = view(2);
        v.viewport_row = 1;
        let boxes = v.row_boxes(&ids(5));
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0], RowBox { id: RecordId::Int(2), top: 3, height: 1 });
        assert_eq!(boxes[1].top, 4);
        assert_eq!(v.viewport(), Viewport { top: 3, height: 2 });
    }
}
