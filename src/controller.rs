use std::collections::HashSet;
use std::ops::Range;
use std::rc::Rc;
use std::time::Instant;

use serde::Deserialize;
use tracing::{debug, trace};

use crate::drag::{apply_move, DragController, DragEvent, DragState, DragTuning, MoveInfo, RowBox, Viewport};
use crate::pager::{page_range, pager_items, paginate, PageInfo, PagerItem};
use crate::query::Query;
use crate::reconcile::{reconcile_list, reconcile_rows, Mutation, RowMutation, VisualCell, VisualRow};
use crate::record::{Record, RecordId};
use crate::selection::{HeaderCheck, SelectionSet};

/// Class put on rendered rows whose record is checked
pub const CHECKED_CLASS: &str = "checked";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    pub page_size: usize,
    pub max_visible_page_links: usize,
    pub show_page_dots: bool,
    /// A click anywhere on a row toggles its check box
    pub row_select_anywhere: bool,
    /// Info line shown when there is no content at all
    pub info_empty: String,
    pub drag: DragTuning,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            page_size: 10,
            max_visible_page_links: 5,
            show_page_dots: true,
            row_select_anywhere: false,
            info_empty: "No records".to_string(),
            drag: DragTuning::default(),
        }
    }
}

/// Summary handed to `on_rows_updated` after every refresh
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowsStats {
    pub total: usize,
    pub filtered: usize,
    pub page_rows: usize,
    pub cur_page: usize,
    pub page_count: usize,
    pub checked: usize,
    pub page_checked: usize,
    pub info: String,
}

type FillFields = Box<dyn FnMut(&Record) -> Vec<String>>;
type RenderCell = Box<dyn FnMut(&mut VisualCell, usize, &Record)>;
type FilterApplied = Box<dyn FnMut(&str)>;
type Notify = Box<dyn FnMut()>;
type RowsUpdated = Box<dyn FnMut(&RowsStats)>;
type DragEnd = Box<dyn FnMut(Option<&MoveInfo>)>;

/// Hooks into the owning page. Callbacks are owned by the controller and
/// cannot reach back into it, so a refresh can never re-enter itself.
#[derive(Default)]
pub struct TableCallbacks {
    fill_fields: Option<FillFields>,
    render_cell: Option<RenderCell>,
    filter_applied: Option<FilterApplied>,
    filter_cleared: Option<Notify>,
    rows_updated: Option<RowsUpdated>,
    drag_start: Option<Notify>,
    drag_end: Option<DragEnd>,
    drag_cancelled: Option<Notify>,
}

impl TableCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render a record's cells; called once per record until its fields are
    /// invalidated
    pub fn on_fill_fields(mut self, f: impl FnMut(&Record) -> Vec<String> + 'static) -> Self {
        self.fill_fields = Some(Box::new(f));
        self
    }

    pub fn on_render_cell(mut self, f: impl FnMut(&mut VisualCell, usize, &Record) + 'static) -> Self {
        self.render_cell = Some(Box::new(f));
        self
    }

    pub fn on_filter_applied(mut self, f: impl FnMut(&str) + 'static) -> Self {
        self.filter_applied = Some(Box::new(f));
        self
    }

    pub fn on_filter_cleared(mut self, f: impl FnMut() + 'static) -> Self {
        self.filter_cleared = Some(Box::new(f));
        self
    }

    pub fn on_rows_updated(mut self, f: impl FnMut(&RowsStats) + 'static) -> Self {
        self.rows_updated = Some(Box::new(f));
        self
    }

    pub fn on_drag_start(mut self, f: impl FnMut() + 'static) -> Self {
        self.drag_start = Some(Box::new(f));
        self
    }

    /// Fired once per drop; `None` when the drop did not move anything
    pub fn on_drag_end(mut self, f: impl FnMut(Option<&MoveInfo>) + 'static) -> Self {
        self.drag_end = Some(Box::new(f));
        self
    }

    /// Fired when Escape or a second pointer aborts a drag
    pub fn on_drag_cancelled(mut self, f: impl FnMut() + 'static) -> Self {
        self.drag_cancelled = Some(Box::new(f));
        self
    }
}

/// Owns the content list and keeps the rendered page, pager and selection
/// in step with it
pub struct TableController {
    options: TableOptions,
    callbacks: TableCallbacks,

    content: Vec<Record>,
    /// Content that arrived mid-drag, applied when the drag ends
    pending: Option<Vec<Record>>,

    query: Query,
    external_filter: Option<Box<dyn Fn(&Record) -> bool>>,
    /// Indices into `content`
    filtered: Vec<usize>,

    cur_page: usize,
    page: PageInfo,
    page_range: Range<usize>,

    selection: SelectionSet,

    rows: Vec<VisualRow>,
    pager: Vec<Rc<PagerItem>>,
    row_mutations: Vec<RowMutation>,
    pager_mutations: Vec<Mutation>,
    stats: RowsStats,

    drag: DragController,
}

impl TableController {
    pub fn new(options: TableOptions, callbacks: TableCallbacks) -> Self {
        let drag = DragController::new(options.drag);
        Self {
            options,
            callbacks,
            content: Vec::new(),
            pending: None,
            query: Query::default(),
            external_filter: None,
            filtered: Vec::new(),
            cur_page: 1,
            page: PageInfo::default(),
            page_range: 0..0,
            selection: SelectionSet::new(),
            rows: Vec::new(),
            pager: Vec::new(),
            row_mutations: Vec::new(),
            pager_mutations: Vec::new(),
            stats: RowsStats::default(),
            drag,
        }
    }

    // === Accessors ===

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    pub fn content(&self) -> &[Record] {
        &self.content
    }

    pub fn filtered_content(&self) -> impl Iterator<Item = &Record> {
        self.filtered.iter().map(|&i| &self.content[i])
    }

    pub fn filtered_ids(&self) -> Vec<RecordId> {
        self.filtered_content().map(|r| r.id.clone()).collect()
    }

    pub fn page_content(&self) -> impl Iterator<Item = &Record> {
        self.filtered[self.page_range.clone()].iter().map(|&i| &self.content[i])
    }

    pub fn page_ids(&self) -> Vec<RecordId> {
        self.page_content().map(|r| r.id.clone()).collect()
    }

    /// Rendered rows of the current page
    pub fn rows(&self) -> &[VisualRow] {
        &self.rows
    }

    pub fn pager(&self) -> &[Rc<PagerItem>] {
        &self.pager
    }

    /// Mutations applied to the rendered rows by the last refresh
    pub fn row_mutations(&self) -> &[RowMutation] {
        &self.row_mutations
    }

    pub fn pager_mutations(&self) -> &[Mutation] {
        &self.pager_mutations
    }

    pub fn page_info(&self) -> PageInfo {
        self.page
    }

    pub fn cur_page(&self) -> usize {
        self.cur_page
    }

    pub fn stats(&self) -> &RowsStats {
        &self.stats
    }

    pub fn filter_text(&self) -> &str {
        self.query.text()
    }

    pub fn is_filtered(&self) -> bool {
        !self.query.is_empty() || self.external_filter.is_some()
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn checked_rows(&self) -> &HashSet<RecordId> {
        self.selection.ids()
    }

    pub fn checked_count(&self) -> usize {
        self.selection.count()
    }

    pub fn page_checked_count(&self) -> usize {
        self.page_content()
            .filter(|r| self.selection.is_checked(&r.id))
            .count()
    }

    pub fn header_check(&self) -> HeaderCheck {
        self.selection.header_state(self.filtered_content().map(|r| &r.id))
    }

    pub fn drag_state(&self) -> &DragState {
        self.drag.state()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn has_pending_update(&self) -> bool {
        self.pending.is_some()
    }

    /// Page ids in the order a drop right now would produce
    pub fn drag_preview(&self) -> Option<Vec<RecordId>> {
        self.drag.preview(&self.page_ids())
    }

    // === Content and refresh ===

    /// Replace the content list. Deferred while a drag is in progress.
    pub fn update(&mut self, records: Vec<Record>) {
        if self.drag.is_dragging() {
            debug!(records = records.len(), "deferring content update until drag ends");
            self.pending = Some(records);
            return;
        }
        self.content = records;
        self.refresh();
    }

    /// Recompute filter, selection, pager, info and rendered rows
    pub fn refresh(&mut self) {
        self.refilter();
        self.selection.validate(self.content.iter().map(|r| &r.id));
        self.update_pager();
        self.update_table();
        self.update_stats();

        trace!(
            total = self.stats.total,
            filtered = self.stats.filtered,
            page = self.stats.cur_page,
            row_mutations = self.row_mutations.len(),
            pager_mutations = self.pager_mutations.len(),
            "refreshed"
        );

        if let Some(notify) = self.callbacks.rows_updated.as_mut() {
            notify(&self.stats);
        }
    }

    fn refilter(&mut self) {
        let query = &self.query;
        let external = &self.external_filter;
        self.filtered = self
            .content
            .iter()
            .enumerate()
            .filter(|(_, r)| query.matches(r) && external.as_ref().map_or(true, |f| f(r)))
            .map(|(i, _)| i)
            .collect();
    }

    fn update_pager(&mut self) {
        let total = self.filtered.len();
        self.page = paginate(total, self.options.page_size, self.cur_page, self.options.max_visible_page_links);
        self.cur_page = self.page.cur_page;
        self.page_range = page_range(total, self.options.page_size, self.cur_page);

        let items = pager_items(&self.page, self.options.show_page_dots)
            .into_iter()
            .map(Rc::new)
            .collect();
        self.pager_mutations = reconcile_list(&mut self.pager, items);
    }

    fn update_table(&mut self) {
        let rows = self.build_rows();
        self.row_mutations = reconcile_rows(&mut self.rows, rows);
    }

    /// Build the current page from scratch, filling record fields on first use
    fn build_rows(&mut self) -> Vec<VisualRow> {
        let TableController { content, filtered, page_range, selection, callbacks, .. } = self;
        let mut rows = Vec::with_capacity(page_range.len());

        for &idx in &filtered[page_range.clone()] {
            if content[idx].fields().is_none() {
                let fields = match callbacks.fill_fields.as_mut() {
                    Some(fill) => fill(&content[idx]),
                    None => Vec::new(),
                };
                content[idx].set_fields(fields);
            }

            let record = &content[idx];
            let classes = if selection.is_checked(&record.id) {
                vec![CHECKED_CLASS.to_string()]
            } else {
                Vec::new()
            };

            let mut cells = Vec::new();
            for (j, text) in record.fields().unwrap_or(&[]).iter().enumerate() {
                let mut cell = VisualCell::new(text.as_str());
                if let Some(render) = callbacks.render_cell.as_mut() {
                    render(&mut cell, j, record);
                }
                cells.push(cell);
            }

            rows.push(VisualRow::new(record.id.clone(), classes, cells));
        }

        rows
    }

    fn update_stats(&mut self) {
        let total = self.content.len();
        let filtered = self.filtered.len();
        let page_rows = self.page_range.len();

        let info = if total == 0 {
            self.options.info_empty.clone()
        } else if self.cur_page == 0 {
            format!("No matching records found (total {})", total)
        } else {
            let first = self.page_range.start + 1;
            let last = first + page_rows - 1;
            let mut info = format!("Showing records {}-{} from {}", first, last, filtered);
            if self.is_filtered() {
                info.push_str(&format!(" filtered (total {})", total));
            }
            info
        };

        self.stats = RowsStats {
            total,
            filtered,
            page_rows,
            cur_page: self.cur_page,
            page_count: self.page.page_count,
            checked: self.selection.count(),
            page_checked: self.page_checked_count(),
            info,
        };
    }

    /// Forget a record's rendered cells so the next refresh fills them again
    pub fn invalidate_fields(&mut self, id: &RecordId) {
        if let Some(record) = self.content.iter_mut().find(|r| &r.id == id) {
            record.invalidate_fields();
            self.refresh();
        }
    }

    // === Filtering and paging ===

    /// Compile `text` and go back to the first page
    pub fn apply_filter(&mut self, text: &str) {
        self.query = Query::compile(text);
        self.cur_page = 1;
        self.refresh();

        if self.query.is_empty() {
            if let Some(notify) = self.callbacks.filter_cleared.as_mut() {
                notify();
            }
        } else if let Some(notify) = self.callbacks.filter_applied.as_mut() {
            notify(text);
        }
    }

    /// Drop the filter text, keeping the current page where possible
    pub fn clear_filter(&mut self) {
        self.query = Query::default();
        self.refresh();
        if let Some(notify) = self.callbacks.filter_cleared.as_mut() {
            notify();
        }
    }

    /// Extra predicate combined with the filter text
    pub fn set_external_filter(&mut self, filter: impl Fn(&Record) -> bool + 'static) {
        self.external_filter = Some(Box::new(filter));
        self.refresh();
    }

    pub fn clear_external_filter(&mut self) {
        self.external_filter = None;
        self.refresh();
    }

    pub fn set_page_size(&mut self, page_size: usize, max_links: Option<usize>, show_dots: Option<bool>) {
        self.options.page_size = page_size.max(1);
        self.cur_page = 1;
        if let Some(max_links) = max_links {
            self.options.max_visible_page_links = max_links;
        }
        if let Some(show_dots) = show_dots {
            self.options.show_page_dots = show_dots;
        }
        self.refresh();
    }

    pub fn set_cur_page(&mut self, page: usize) {
        self.cur_page = page;
        self.refresh();
    }

    /// Activate a pager entry; disabled entries and dots do nothing
    pub fn pager_click(&mut self, item: &PagerItem) -> bool {
        let page = match item {
            PagerItem::Prev { disabled: false } => self.cur_page.saturating_sub(1),
            PagerItem::Next { disabled: false } => self.cur_page + 1,
            PagerItem::Page { number, .. } => *number,
            _ => return false,
        };
        self.set_cur_page(page);
        true
    }

    /// Keyboard shortcuts: `Left`/`Right` step a page, `Shift+Left` and
    /// `Shift+Right` jump to the first and last page, `Escape` aborts a drag
    pub fn process_shortcut(&mut self, key: &str) -> bool {
        match key {
            "Left" => self.set_cur_page(self.cur_page.saturating_sub(1).max(1)),
            "Right" => self.set_cur_page(self.cur_page + 1),
            "Shift+Left" => self.set_cur_page(1),
            "Shift+Right" => self.set_cur_page(self.page.page_count),
            "Escape" => return self.cancel_drag(),
            _ => return false,
        }
        true
    }

    // === Selection ===

    pub fn check_row(&mut self, id: &RecordId, checked: bool) {
        self.selection.set(id, checked);
        self.refresh();
    }

    /// Click on a row's check box, `shift` extending from the last click
    pub fn item_check_click(&mut self, id: &RecordId, shift: bool) {
        let filtered = self.filtered_ids();
        self.selection.click(id, shift, &filtered);
        self.refresh();
    }

    /// Click on the header check box
    pub fn title_check_click(&mut self) {
        let filtered = self.filtered_ids();
        self.selection.header_click(&filtered);
        self.refresh();
    }

    pub fn check_all(&mut self, checked: bool) {
        let filtered = self.filtered_ids();
        self.selection.check_all(checked, &filtered);
        self.refresh();
    }

    // === Drag and drop ===

    /// Only rows on the current page can start a drag
    pub fn pointer_down(&mut self, pointer: u32, row: Option<&RecordId>, y: i32) {
        let row = row.filter(|id| self.page_content().any(|r| &r.id == *id)).cloned();
        if self.drag.pointer_down(pointer, row, y) == DragEvent::Cancelled {
            self.finish_cancelled();
        }
    }

    pub fn pointer_move(&mut self, pointer: u32, y: i32, rows: &[RowBox]) {
        let order: Vec<RecordId> = if self.drag.is_armed() {
            self.content.iter().map(|r| r.id.clone()).collect()
        } else {
            Vec::new()
        };

        if let DragEvent::Started { .. } = self.drag.pointer_move(pointer, y, rows, &self.selection, &order) {
            if let Some(notify) = self.callbacks.drag_start.as_mut() {
                notify();
            }
        }
    }

    /// Returns the row that was clicked when the pointer went up without
    /// dragging
    pub fn pointer_up(&mut self, pointer: u32, shift: bool) -> Option<RecordId> {
        match self.drag.pointer_up(pointer) {
            DragEvent::Released { row } => {
                if self.options.row_select_anywhere {
                    self.item_check_click(&row, shift);
                }
                Some(row)
            }
            DragEvent::Dropped(info) => {
                self.finish_drop(info);
                None
            }
            _ => None,
        }
    }

    /// Abort a drag in progress; false when there was none
    pub fn cancel_drag(&mut self) -> bool {
        match self.drag.cancel() {
            DragEvent::Cancelled => {
                self.finish_cancelled();
                true
            }
            _ => false,
        }
    }

    /// Auto-scroll step for the front end's timer
    pub fn auto_scroll_tick(&mut self, now: Instant, viewport: Viewport) -> Option<i32> {
        self.drag.tick(now, viewport)
    }

    /// Rows scrolled under a still pointer
    pub fn retarget_drag(&mut self, rows: &[RowBox]) {
        self.drag.retarget(rows);
    }

    fn finish_drop(&mut self, info: Option<MoveInfo>) {
        if let Some(pending) = self.pending.take() {
            self.content = pending;
        }

        let info = info.filter(|info| apply_move(&mut self.content, info, |r| &r.id));
        debug!(moved = info.as_ref().map_or(0, |i| i.ids.len()), "drop applied");

        if let Some(notify) = self.callbacks.drag_end.as_mut() {
            notify(info.as_ref());
        }
        self.refresh();
    }

    fn finish_cancelled(&mut self) {
        if let Some(notify) = self.callbacks.drag_cancelled.as_mut() {
            notify();
        }
        if let Some(pending) = self.pending.take() {
            self.content = pending;
        }
        self.refresh();
    }
}

#[cfg(test)]
mod test;
