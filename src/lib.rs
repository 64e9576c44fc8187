//! Paged, filterable, checkable and reorderable views over a list of records.
//!
//! [`controller::TableController`] owns the content and drives the other
//! modules: [`query`] compiles the filter text, [`pager`] slices the
//! filtered list, [`reconcile`] keeps the rendered page in step with as few
//! replacements as possible, [`selection`] tracks checked rows across pages,
//! and [`drag`] turns pointer events into row moves.

pub mod controller;
pub mod drag;
pub mod pager;
pub mod query;
pub mod reconcile;
pub mod record;
pub mod selection;
