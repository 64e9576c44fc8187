use std::cell::{Cell, RefCell};
use std::io;
use std::rc::Rc;
use std::time::{Duration, Instant, SystemTime};

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use tracing::{debug, error, info, trace, warn};

use fasttable::controller::{TableCallbacks, TableController};
use fasttable::record::Record;

use crate::config::AppConfig;
use crate::fileio::{FileIO, LoadResult};
use crate::input::{is_shift, shortcut_name, KeyResult};
use crate::mode::filter::FilterInput;
use crate::mode::Mode;
use crate::tableview::TableView;
use crate::ui;

/// Pointer id used for the mouse; terminals only report one
const MOUSE_POINTER: u32 = 0;

pub struct App {
    pub controller: TableController,
    pub view: TableView,
    pub mode: Mode,
    pub filter: FilterInput,
    /// Column names, shared with the fill callback so a reload can change them
    pub headers: Rc<RefCell<Vec<String>>>,
    pub file_io: FileIO,
    pub config: AppConfig,
    pub message: Option<String>,
    pub should_quit: bool,
    watch: bool,
    last_modified: Option<SystemTime>,
    last_check: Instant,
    pager_area: Rect,
    /// Messages raised from controller callbacks
    notices: Rc<RefCell<Vec<String>>>,
    /// Set by `on_rows_updated`, cleared once the mutations are logged
    refreshed: Rc<Cell<bool>>,
}

impl App {
    pub fn new(config: AppConfig, file_io: FileIO, load: LoadResult, watch: bool) -> Self {
        let headers = Rc::new(RefCell::new(load.headers));
        let notices = Rc::new(RefCell::new(Vec::new()));
        let refreshed = Rc::new(Cell::new(false));

        let callbacks = table_callbacks(headers.clone(), notices.clone(), refreshed.clone());
        let mut controller = TableController::new(config.table.clone(), callbacks);
        controller.update(load.records);

        let last_modified = file_io.modified().ok();
        let message = (!load.warnings.is_empty()).then(|| load.warnings.join("; "));

        Self {
            controller,
            view: TableView::new(),
            mode: Mode::Normal,
            filter: FilterInput::new(),
            headers,
            file_io,
            config,
            message,
            should_quit: false,
            watch,
            last_modified,
            last_check: Instant::now(),
            pager_area: Rect::default(),
            notices,
            refreshed,
        }
    }

    pub fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
        while !self.should_quit {
            terminal.draw(|f| {
                self.sync_layout(f.size());
                ui::render(f, self)
            })?;

            if poll(Duration::from_millis(16))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.message = None;
                        self.handle_key(key);
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }

            self.tick(Instant::now());
        }
        Ok(())
    }

    /// Record where the table and pager landed so mouse events can be mapped
    fn sync_layout(&mut self, size: Rect) {
        let [table, pager, _, _] = ui::layout(size);
        self.pager_area = pager;
        // border and header line above the first row
        self.view.body_top = table.y + 2;
        self.view.body_left = table.x + 1;
        self.view.viewport_height = table.height.saturating_sub(3).max(1) as usize;
        self.view.clamp_cursor(self.page_len());
    }

    fn page_len(&self) -> usize {
        self.controller.rows().len()
    }

    /// Timers: typing pause, drag auto-scroll, file watching
    fn tick(&mut self, now: Instant) {
        if self.mode == Mode::Filter {
            if let Some(text) = self.filter.poll(now) {
                self.controller.apply_filter(&text);
                self.view.move_to_top();
            }
        }

        if let Some(step) = self.controller.auto_scroll_tick(now, self.view.viewport()) {
            let page_ids = self.controller.page_ids();
            self.view.scroll_by(step, page_ids.len());
            // no mouse event arrives while the pointer rests at the edge
            self.controller.retarget_drag(&self.view.row_boxes(&page_ids));
        }

        let interval = Duration::from_secs(self.config.refresh_secs.max(1));
        if self.watch && now.duration_since(self.last_check) >= interval {
            self.last_check = now;
            self.reload_if_changed();
        }

        if let Some(notice) = self.notices.borrow_mut().drain(..).last() {
            self.message = Some(notice);
        }

        if self.refreshed.replace(false) {
            trace!(
                rows = ?self.controller.row_mutations(),
                pager = ?self.controller.pager_mutations(),
                "reconciled"
            );
        }
    }

    fn reload_if_changed(&mut self) {
        let modified = match self.file_io.modified() {
            Ok(modified) => modified,
            Err(e) => {
                warn!(error = %e, file = %self.file_io.file_name(), "cannot stat watched file");
                return;
            }
        };
        if self.last_modified == Some(modified) {
            return;
        }
        self.last_modified = Some(modified);

        match self.file_io.load(&self.config) {
            Ok(load) => {
                info!(records = load.records.len(), "reloaded file");
                let count = load.records.len();
                *self.headers.borrow_mut() = load.headers;
                self.controller.update(load.records);
                self.message = Some(if self.controller.has_pending_update() {
                    "File changed; reload applies when the drag ends".to_string()
                } else {
                    format!("Reloaded {} records", count)
                });
            }
            Err(e) => {
                error!(error = %e, "reload failed");
                self.message = Some(format!("Reload failed: {}", e));
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Filter => self.handle_filter_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        if let Some(name) = shortcut_name(key) {
            if self.controller.process_shortcut(name) && name != "Escape" {
                self.view.move_to_top();
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => self.should_quit = true,
            KeyCode::Char('/') => {
                self.mode = Mode::Filter;
                self.filter.start(self.controller.filter_text());
            }
            KeyCode::Up | KeyCode::Char('k') => self.view.move_up(),
            KeyCode::Down | KeyCode::Char('j') => {
                let page_len = self.page_len();
                self.view.move_down(page_len);
            }
            KeyCode::Char(' ') => {
                let page_ids = self.controller.page_ids();
                if let Some(id) = page_ids.get(self.view.cursor_row) {
                    self.controller.item_check_click(id, is_shift(key));
                }
            }
            KeyCode::Char('a') => self.controller.title_check_click(),
            _ => {}
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent) {
        match self.filter.handle_key(key, Instant::now()) {
            KeyResult::Continue => {}
            KeyResult::Apply(text) => {
                self.controller.apply_filter(&text);
                self.mode = Mode::Normal;
                self.view.move_to_top();
            }
            KeyResult::Cancel => {
                self.controller.clear_filter();
                self.mode = Mode::Normal;
                self.view.move_to_top();
            }
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let shift = mouse.modifiers.contains(KeyModifiers::SHIFT);
        let page_ids = self.controller.page_ids();

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if mouse.row == self.pager_area.y {
                    self.click_pager(mouse.column);
                    return;
                }

                let check_column = self.view.is_check_column(mouse.column);
                if check_column && mouse.row + 1 == self.view.body_top {
                    self.controller.title_check_click();
                    return;
                }

                let row = self.view.row_at(mouse.row, page_ids.len());
                if let Some(row) = row {
                    self.view.cursor_row = row;
                    if check_column {
                        self.controller.item_check_click(&page_ids[row], shift);
                        return;
                    }
                }
                self.controller
                    .pointer_down(MOUSE_POINTER, row.map(|r| &page_ids[r]), mouse.row as i32);
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let rows = self.view.row_boxes(&page_ids);
                self.controller.pointer_move(MOUSE_POINTER, mouse.row as i32, &rows);
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(id) = self.controller.pointer_up(MOUSE_POINTER, shift) {
                    debug!(%id, "row clicked");
                }
            }
            MouseEventKind::Down(_) => {
                // any other button joining in aborts the gesture
                self.controller.pointer_down(MOUSE_POINTER + 1, None, mouse.row as i32);
            }
            MouseEventKind::ScrollDown => self.view.scroll_by(1, page_ids.len()),
            MouseEventKind::ScrollUp => self.view.scroll_by(-1, page_ids.len()),
            _ => {}
        }
    }

    fn click_pager(&mut self, column: u16) {
        let Some(index) = ui::pager_item_at(self.controller.pager(), self.pager_area, column) else {
            return;
        };
        let item = self.controller.pager()[index].clone();
        if self.controller.pager_click(&item) {
            self.view.move_to_top();
        }
    }
}

fn table_callbacks(
    headers: Rc<RefCell<Vec<String>>>,
    notices: Rc<RefCell<Vec<String>>>,
    refreshed: Rc<Cell<bool>>,
) -> TableCallbacks {
    let end_notices = notices.clone();

    TableCallbacks::new()
        .on_fill_fields(move |record: &Record| {
            headers
                .borrow()
                .iter()
                .map(|name| record.field_value(name).unwrap_or("").to_string())
                .collect()
        })
        .on_render_cell(|cell, _, _| {
            if !cell.content.is_empty() && cell.content.parse::<f64>().is_ok() {
                cell.add_class(ui::NUMERIC_CLASS);
            }
        })
        .on_filter_applied(|text| info!(filter = text, "filter applied"))
        .on_filter_cleared(|| info!("filter cleared"))
        .on_rows_updated(move |stats| {
            refreshed.set(true);
            debug!(
                total = stats.total,
                filtered = stats.filtered,
                page = stats.cur_page,
                checked = stats.checked,
                "rows updated"
            );
        })
        .on_drag_start(|| debug!("drag started"))
        .on_drag_end(move |info| {
            let notice = match info {
                Some(info) => format!("Moved {} row(s) {:?} {}", info.ids.len(), info.placement, info.anchor),
                None => "Nothing moved".to_string(),
            };
            end_notices.borrow_mut().push(notice);
        })
        .on_drag_cancelled(move || notices.borrow_mut().push("Drag cancelled".to_string()))
}
