use super::*;

use std::cell::{Cell, RefCell};

type Log = Rc<RefCell<Vec<String>>>;

fn people(n: i64) -> Vec<Record> {
    (1..=n).map(person).collect()
}

fn person(i: i64) -> Record {
    Record::with_values(i, [("name", format!("person{}", i)), ("age", i.to_string())], &["name"])
}

fn fill(record: &Record) -> Vec<String> {
    vec![
        record.field_value("name").unwrap_or("").to_string(),
        record.field_value("age").unwrap_or("").to_string(),
    ]
}

fn id(n: i64) -> RecordId {
    RecordId::Int(n)
}

fn joined(ids: impl IntoIterator<Item = RecordId>) -> String {
    ids.into_iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",")
}

fn order(ctl: &TableController) -> String {
    joined(ctl.content().iter().map(|r| r.id.clone()))
}

fn logging_callbacks(log: &Log) -> TableCallbacks {
    let applied = log.clone();
    let cleared = log.clone();
    let start = log.clone();
    let end = log.clone();
    let cancelled = log.clone();

    TableCallbacks::new()
        .on_fill_fields(fill)
        .on_filter_applied(move |text| applied.borrow_mut().push(format!("applied:{}", text)))
        .on_filter_cleared(move || cleared.borrow_mut().push("cleared".to_string()))
        .on_drag_start(move || start.borrow_mut().push("start".to_string()))
        .on_drag_end(move |info| {
            let entry = match info {
                Some(info) => format!("end:{}", joined(info.ids.clone())),
                None => "end:none".to_string(),
            };
            end.borrow_mut().push(entry);
        })
        .on_drag_cancelled(move || cancelled.borrow_mut().push("cancelled".to_string()))
}

fn controller(page_size: usize) -> (TableController, Log) {
    let log = Log::default();
    let options = TableOptions { page_size, ..TableOptions::default() };
    (TableController::new(options, logging_callbacks(&log)), log)
}

/// Rows two units tall, so row `i` has its midpoint at `2 * i + 1`
fn boxes(ctl: &TableController) -> Vec<RowBox> {
    ctl.page_ids()
        .into_iter()
        .enumerate()
        .map(|(i, id)| RowBox { id, top: 2 * i as i32, height: 2 })
        .collect()
}

fn start_drag(ctl: &mut TableController, row: i64, y: i32) {
    let origin = 2 * (row as i32 - 1) + 1;
    ctl.pointer_down(0, Some(&id(row)), origin);
    let rows = boxes(ctl);
    ctl.pointer_move(0, y, &rows);
}

#[test]
fn test_pages_and_info() {
    let (mut ctl, _) = controller(10);
    ctl.update(people(25));

    let stats = ctl.stats().clone();
    assert_eq!(stats.total, 25);
    assert_eq!(stats.filtered, 25);
    assert_eq!(stats.page_rows, 10);
    assert_eq!(stats.cur_page, 1);
    assert_eq!(stats.page_count, 3);
    assert_eq!(stats.info, "Showing records 1-10 from 25");
    assert_eq!(ctl.rows()[0].cells[0].content, "person1");

    ctl.set_cur_page(3);
    assert_eq!(ctl.rows().len(), 5);
    assert_eq!(ctl.stats().info, "Showing records 21-25 from 25");

    ctl.set_cur_page(9);
    assert_eq!(ctl.cur_page(), 3);
}

#[test]
fn test_filter_resets_page_and_reports_total() {
    let (mut ctl, log) = controller(10);
    ctl.update(people(25));
    ctl.set_cur_page(2);

    ctl.apply_filter("age>20");
    assert_eq!(ctl.cur_page(), 1);
    assert_eq!(ctl.stats().filtered, 5);
    assert_eq!(ctl.stats().info, "Showing records 1-5 from 5 filtered (total 25)");
    assert_eq!(ctl.filter_text(), "age>20");
    assert_eq!(log.borrow().as_slice(), ["applied:age>20"]);
}

#[test]
fn test_filter_without_matches() {
    let (mut ctl, log) = controller(10);
    ctl.update(people(25));

    ctl.apply_filter("nobody");
    assert_eq!(ctl.cur_page(), 0);
    assert!(ctl.rows().is_empty());
    assert_eq!(ctl.stats().info, "No matching records found (total 25)");

    ctl.clear_filter();
    assert_eq!(ctl.cur_page(), 1);
    assert_eq!(ctl.rows().len(), 10);
    assert_eq!(log.borrow().last().map(String::as_str), Some("cleared"));
}

#[test]
fn test_clear_filter_keeps_current_page() {
    let (mut ctl, _log) = controller(10);
    ctl.update(people(25));

    ctl.apply_filter("person");
    ctl.set_cur_page(2);
    ctl.clear_filter();
    assert_eq!(ctl.cur_page(), 2);

    ctl.apply_filter("person");
    assert_eq!(ctl.cur_page(), 1);
}

#[test]
fn test_blank_filter_counts_as_clear() {
    let (mut ctl, log) = controller(10);
    ctl.update(people(5));
    ctl.apply_filter("   ");
    assert!(!ctl.is_filtered());
    assert_eq!(log.borrow().as_slice(), ["cleared"]);
}

#[test]
fn test_empty_content_info() {
    let options = TableOptions { info_empty: "Nothing here".to_string(), ..TableOptions::default() };
    let mut ctl = TableController::new(options, TableCallbacks::new());
    ctl.update(Vec::new());
    assert_eq!(ctl.stats().info, "Nothing here");
    assert_eq!(ctl.cur_page(), 0);
    assert_eq!(
        ctl.pager().iter().map(|item| item.label()).collect::<Vec<_>>(),
        vec!["← Prev", "Next →"]
    );
}

#[test]
fn test_fields_filled_once_until_invalidated() {
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let callbacks = TableCallbacks::new().on_fill_fields(move |record| {
        counter.set(counter.get() + 1);
        fill(record)
    });
    let mut ctl = TableController::new(TableOptions::default(), callbacks);

    ctl.update(people(25));
    assert_eq!(calls.get(), 10);
    ctl.refresh();
    assert_eq!(calls.get(), 10);
    ctl.set_cur_page(2);
    assert_eq!(calls.get(), 20);
    ctl.set_cur_page(1);
    assert_eq!(calls.get(), 20);

    ctl.invalidate_fields(&id(1));
    assert_eq!(calls.get(), 21);
    ctl.invalidate_fields(&id(999));
    assert_eq!(calls.get(), 21);
}

#[test]
fn test_prefilled_fields_skip_callback() {
    let mut ctl = TableController::new(
        TableOptions::default(),
        TableCallbacks::new().on_fill_fields(|_| panic!("fields were already set")),
    );
    ctl.update(vec![Record::text(1, "x").with_visual_fields(vec!["x".to_string()])]);
    assert_eq!(ctl.rows()[0].cells[0].content, "x");
}

#[test]
fn test_update_replaces_only_changed_cells() {
    let (mut ctl, _) = controller(10);
    ctl.update(people(3));
    let first_row: Vec<Rc<VisualCell>> = ctl.rows()[0].cells.clone();
    let untouched = ctl.rows()[1].cells[1].clone();

    let mut next = people(3);
    next[1] = Record::with_values(2, [("name", "changed"), ("age", "2")], &["name"]);
    ctl.update(next);

    assert_eq!(ctl.row_mutations(), [RowMutation::Cell { row: 1, cell: Mutation::Replace(0) }]);
    assert_eq!(ctl.rows()[1].cells[0].content, "changed");
    assert!(first_row.iter().zip(&ctl.rows()[0].cells).all(|(a, b)| Rc::ptr_eq(a, b)));
    assert!(Rc::ptr_eq(&untouched, &ctl.rows()[1].cells[1]));
}

#[test]
fn test_render_cell_callback_sets_classes() {
    let callbacks = TableCallbacks::new().on_fill_fields(fill).on_render_cell(|cell, column, record| {
        if column == 1 && record.field_value("age") == Some("2") {
            cell.add_class("highlight");
        }
    });
    let mut ctl = TableController::new(TableOptions::default(), callbacks);
    ctl.update(people(3));

    assert!(ctl.rows()[1].cells[1].has_class("highlight"));
    assert!(!ctl.rows()[0].cells[1].has_class("highlight"));
    assert!(!ctl.rows()[1].cells[0].has_class("highlight"));
}

#[test]
fn test_rows_updated_reports_stats() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let callbacks = TableCallbacks::new().on_rows_updated(move |stats| sink.borrow_mut().push(stats.info.clone()));
    let mut ctl = TableController::new(TableOptions { page_size: 2, ..TableOptions::default() }, callbacks);

    ctl.update(people(3));
    ctl.set_cur_page(2);
    assert_eq!(
        seen.borrow().as_slice(),
        ["Showing records 1-2 from 3", "Showing records 3-3 from 3"]
    );
}

#[test]
fn test_checked_class_and_selection_survive_refresh() {
    let (mut ctl, _) = controller(10);
    ctl.update(people(5));
    ctl.check_row(&id(2), true);
    assert!(ctl.rows()[1].meta.has_class(CHECKED_CLASS));
    assert!(!ctl.rows()[0].meta.has_class(CHECKED_CLASS));

    let mut reversed = people(5);
    reversed.reverse();
    ctl.update(reversed);
    assert_eq!(ctl.checked_count(), 1);
    assert!(ctl.rows()[3].meta.has_class(CHECKED_CLASS));

    ctl.update(people(5).into_iter().filter(|r| r.id != id(2)).collect());
    assert_eq!(ctl.checked_count(), 0);
    assert!(ctl.checked_rows().is_empty());
}

#[test]
fn test_shift_click_follows_filtered_order() {
    let (mut ctl, _) = controller(10);
    ctl.update(people(6));
    ctl.apply_filter("age>=3");

    ctl.item_check_click(&id(3), false);
    ctl.item_check_click(&id(6), true);
    assert_eq!(ctl.checked_count(), 4);
    assert_eq!(ctl.header_check(), HeaderCheck::Checked);

    ctl.clear_filter();
    assert_eq!(ctl.header_check(), HeaderCheck::Partial);

    ctl.apply_filter("age>=3");
    ctl.title_check_click();
    assert_eq!(ctl.checked_count(), 0);
    assert_eq!(ctl.header_check(), HeaderCheck::Unchecked);
}

#[test]
fn test_title_check_only_touches_filtered() {
    let (mut ctl, _) = controller(10);
    ctl.update(people(6));
    ctl.apply_filter("age<3");
    ctl.title_check_click();
    assert_eq!(ctl.checked_count(), 2);
    assert!(ctl.selection().is_checked(&id(1)));
    assert!(!ctl.selection().is_checked(&id(3)));
}

#[test]
fn test_page_checked_count() {
    let (mut ctl, _) = controller(10);
    ctl.update(people(25));
    ctl.check_row(&id(1), true);
    ctl.check_row(&id(15), true);
    assert_eq!(ctl.checked_count(), 2);
    assert_eq!(ctl.page_checked_count(), 1);
    assert_eq!(ctl.stats().page_checked, 1);
    assert_eq!(ctl.stats().checked, 2);
}

#[test]
fn test_external_filter_combines_with_text() {
    let (mut ctl, _) = controller(10);
    ctl.update(people(6));
    ctl.set_external_filter(|r| matches!(r.id, RecordId::Int(n) if n % 2 == 0));
    assert_eq!(joined(ctl.filtered_ids()), "2,4,6");
    assert_eq!(ctl.stats().info, "Showing records 1-3 from 3 filtered (total 6)");

    ctl.apply_filter("age>2");
    assert_eq!(joined(ctl.filtered_ids()), "4,6");

    ctl.clear_external_filter();
    assert_eq!(joined(ctl.filtered_ids()), "3,4,5,6");
}

#[test]
fn test_shortcuts_move_between_pages() {
    let (mut ctl, _) = controller(10);
    ctl.update(people(35));

    assert!(ctl.process_shortcut("Right"));
    assert_eq!(ctl.cur_page(), 2);
    ctl.process_shortcut("Shift+Right");
    assert_eq!(ctl.cur_page(), 4);
    ctl.process_shortcut("Right");
    assert_eq!(ctl.cur_page(), 4);
    ctl.process_shortcut("Left");
    assert_eq!(ctl.cur_page(), 3);
    ctl.process_shortcut("Shift+Left");
    assert_eq!(ctl.cur_page(), 1);
    ctl.process_shortcut("Left");
    assert_eq!(ctl.cur_page(), 1);

    assert!(!ctl.process_shortcut("x"));
    assert!(!ctl.process_shortcut("Escape"));
}

#[test]
fn test_pager_click() {
    let (mut ctl, _) = controller(10);
    ctl.update(people(200));

    let prev = ctl.pager()[0].clone();
    assert!(!ctl.pager_click(&prev));

    let next = ctl.pager().last().cloned().unwrap();
    assert!(ctl.pager_click(&next));
    assert_eq!(ctl.cur_page(), 2);

    let last = ctl
        .pager()
        .iter()
        .find(|item| ***item == PagerItem::Page { number: 20, active: false })
        .cloned()
        .unwrap();
    assert!(ctl.pager_click(&last));
    assert_eq!(ctl.cur_page(), 20);
    assert!(!ctl.pager_click(&PagerItem::Dots));
}

#[test]
fn test_pager_reconciled_by_index() {
    let (mut ctl, _) = controller(10);
    ctl.update(people(30));
    let last_link = ctl.pager()[3].clone();

    ctl.set_cur_page(2);
    assert_eq!(
        ctl.pager_mutations(),
        [Mutation::Replace(0), Mutation::Replace(1), Mutation::Replace(2)]
    );
    assert!(Rc::ptr_eq(&last_link, &ctl.pager()[3]));
}

#[test]
fn test_set_page_size_resets_page() {
    let (mut ctl, _) = controller(10);
    ctl.update(people(25));
    ctl.set_cur_page(3);

    ctl.set_page_size(5, Some(3), Some(false));
    assert_eq!(ctl.cur_page(), 1);
    assert_eq!(ctl.page_info().page_count, 5);
    assert_eq!(
        ctl.pager().iter().map(|item| item.label()).collect::<Vec<_>>(),
        vec!["← Prev", "1", "2", "3", "5", "Next →"]
    );
}

#[test]
fn test_drag_reorders_content() {
    let (mut ctl, log) = controller(10);
    ctl.update(people(5));

    start_drag(&mut ctl, 1, 5);
    assert!(ctl.is_dragging());
    assert_eq!(ctl.drag_preview().map(joined).as_deref(), Some("2,3,1,4,5"));

    assert_eq!(ctl.pointer_up(0, false), None);
    assert!(!ctl.is_dragging());
    assert_eq!(order(&ctl), "2,3,1,4,5");
    assert_eq!(ctl.rows()[2].meta.id, id(1));
    assert_eq!(log.borrow().as_slice(), ["start", "end:1"]);
}

#[test]
fn test_drag_moves_checked_rows_together() {
    let (mut ctl, log) = controller(10);
    ctl.update(people(5));
    ctl.check_row(&id(1), true);
    ctl.check_row(&id(3), true);

    start_drag(&mut ctl, 3, 9);
    ctl.pointer_up(0, false);

    assert_eq!(order(&ctl), "2,4,5,1,3");
    assert_eq!(log.borrow().last().map(String::as_str), Some("end:1,3"));
    assert_eq!(ctl.checked_count(), 2);
}

#[test]
fn test_escape_cancels_drag_without_reorder() {
    let (mut ctl, log) = controller(10);
    ctl.update(people(5));

    start_drag(&mut ctl, 1, 5);
    assert!(ctl.process_shortcut("Escape"));
    assert_eq!(ctl.drag_state(), &DragState::Idle);
    assert_eq!(ctl.pointer_up(0, false), None);

    assert_eq!(order(&ctl), "1,2,3,4,5");
    assert_eq!(log.borrow().as_slice(), ["start", "cancelled"]);
}

#[test]
fn test_second_pointer_cancels_drag() {
    let (mut ctl, log) = controller(10);
    ctl.update(people(5));

    start_drag(&mut ctl, 2, 9);
    ctl.pointer_down(1, Some(&id(4)), 7);
    assert!(!ctl.is_dragging());
    assert_eq!(order(&ctl), "1,2,3,4,5");
    assert_eq!(log.borrow().last().map(String::as_str), Some("cancelled"));
}

#[test]
fn test_drop_on_own_row_reports_no_move() {
    let (mut ctl, log) = controller(10);
    ctl.update(people(5));

    start_drag(&mut ctl, 2, 9);
    let rows = boxes(&ctl);
    ctl.pointer_move(0, 3, &rows);
    ctl.pointer_up(0, false);

    assert_eq!(order(&ctl), "1,2,3,4,5");
    assert_eq!(log.borrow().as_slice(), ["start", "end:none"]);
}

#[test]
fn test_update_during_drag_is_deferred() {
    let (mut ctl, _) = controller(10);
    ctl.update(people(5));

    start_drag(&mut ctl, 1, 5);
    ctl.update(people(3));
    assert!(ctl.has_pending_update());
    assert_eq!(order(&ctl), "1,2,3,4,5");

    ctl.pointer_up(0, false);
    assert!(!ctl.has_pending_update());
    assert_eq!(order(&ctl), "2,3,1");
}

#[test]
fn test_deferred_update_applied_on_cancel() {
    let (mut ctl, _) = controller(10);
    ctl.update(people(5));

    start_drag(&mut ctl, 1, 5);
    ctl.update(people(2));
    ctl.cancel_drag();
    assert_eq!(order(&ctl), "1,2");
}

#[test]
fn test_click_without_drag_selects_when_enabled() {
    let options = TableOptions { row_select_anywhere: true, ..TableOptions::default() };
    let mut ctl = TableController::new(options, TableCallbacks::new().on_fill_fields(fill));
    ctl.update(people(3));

    ctl.pointer_down(0, Some(&id(2)), 3);
    assert_eq!(ctl.pointer_up(0, false), Some(id(2)));
    assert!(ctl.selection().is_checked(&id(2)));

    let (mut plain, _) = controller(10);
    plain.update(people(3));
    plain.pointer_down(0, Some(&id(2)), 3);
    assert_eq!(plain.pointer_up(0, false), Some(id(2)));
    assert_eq!(plain.checked_count(), 0);
}

#[test]
fn test_pointer_down_outside_page_is_ignored() {
    let (mut ctl, _) = controller(2);
    ctl.update(people(5));
    ctl.pointer_down(0, Some(&id(5)), 0);
    assert_eq!(ctl.drag_state(), &DragState::Idle);
    ctl.pointer_down(0, None, 0);
    assert_eq!(ctl.drag_state(), &DragState::Idle);
}

#[test]
fn test_auto_scroll_only_while_dragging() {
    let (mut ctl, _) = controller(10);
    ctl.update(people(5));
    let viewport = Viewport { top: 0, height: 10 };
    let now = Instant::now();
    assert_eq!(ctl.auto_scroll_tick(now, viewport), None);

    start_drag(&mut ctl, 2, 9);
    assert_eq!(ctl.auto_scroll_tick(now, viewport), Some(1));
}
