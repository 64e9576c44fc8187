//! Pointer-driven row reordering.
//!
//! `Idle -> Armed` on pointer down over a row, `Armed -> Dragging` once the
//! pointer has travelled `threshold` units, and back to `Idle` on pointer
//! up, Escape, or a second pointer going down. Coordinates are whatever the
//! front end uses for rows (pixels, terminal lines); only their ordering and
//! distances matter.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, trace};

use crate::record::RecordId;
use crate::selection::SelectionSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DragTuning {
    /// Distance the pointer must travel before a drag starts
    pub threshold: i32,
    /// Distance from the viewport edge that triggers auto-scroll
    pub scroll_margin: i32,
    /// Scroll amount per auto-scroll tick
    pub scroll_step: i32,
    pub scroll_interval_ms: u64,
}

impl Default for DragTuning {
    fn default() -> Self {
        Self {
            threshold: 1,
            scroll_margin: 1,
            scroll_step: 1,
            scroll_interval_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Before,
    After,
}

/// Result of a completed drag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveInfo {
    /// Moving ids in their original order
    pub ids: Vec<RecordId>,
    pub anchor: RecordId,
    pub placement: Placement,
}

/// Position of a rendered row, in pointer coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowBox {
    pub id: RecordId,
    pub top: i32,
    pub height: i32,
}

impl RowBox {
    pub fn midpoint(&self) -> i32 {
        self.top + self.height / 2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub top: i32,
    pub height: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveDrag {
    pub moving: Vec<RecordId>,
    pub target: Option<(RecordId, Placement)>,
    pub pointer: u32,
    pub pointer_y: i32,
    last_scroll: Option<Instant>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragState {
    Idle,
    Armed { row: RecordId, pointer: u32, origin: i32 },
    Dragging(ActiveDrag),
}

/// What a pointer or key event did to the gesture
#[derive(Debug, Clone, PartialEq)]
pub enum DragEvent {
    /// Event had no effect
    Ignored,
    Armed,
    Started { moving: Vec<RecordId> },
    Moved { target: Option<(RecordId, Placement)> },
    /// Pointer released without ever crossing the threshold
    Released { row: RecordId },
    /// Drop; `None` when the drop point resolves to no usable target
    Dropped(Option<MoveInfo>),
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct DragController {
    state: DragState,
    tuning: DragTuning,
}

impl DragController {
    pub fn new(tuning: DragTuning) -> Self {
        Self { state: DragState::Idle, tuning }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn tuning(&self) -> DragTuning {
        self.tuning
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, DragState::Armed { .. })
    }

    pub fn active(&self) -> Option<&ActiveDrag> {
        match &self.state {
            DragState::Dragging(drag) => Some(drag),
            _ => None,
        }
    }

    /// A pointer went down over `row` (or over nothing). Any pointer going
    /// down while a gesture is in progress cancels it.
    pub fn pointer_down(&mut self, pointer: u32, row: Option<RecordId>, y: i32) -> DragEvent {
        if self.state != DragState::Idle {
            return self.cancel();
        }
        let Some(row) = row else {
            return DragEvent::Ignored;
        };

        trace!(%row, y, "drag armed");
        self.state = DragState::Armed { row, pointer, origin: y };
        DragEvent::Armed
    }

    /// Track the pointer. `order` is the full content order, used to sort a
    /// multi-row selection when the drag starts.
    pub fn pointer_move(
        &mut self,
        pointer: u32,
        y: i32,
        rows: &[RowBox],
        selection: &SelectionSet,
        order: &[RecordId],
    ) -> DragEvent {
        match &mut self.state {
            DragState::Armed { row, pointer: armed, origin } if *armed == pointer => {
                if (y - *origin).abs() < self.tuning.threshold {
                    return DragEvent::Ignored;
                }

                let moving: Vec<RecordId> = if selection.is_checked(row) {
                    order.iter().filter(|id| selection.is_checked(id)).cloned().collect()
                } else {
                    vec![row.clone()]
                };
                let target = drop_target(rows, &moving, y);
                debug!(rows = moving.len(), "drag started");

                self.state = DragState::Dragging(ActiveDrag {
                    moving: moving.clone(),
                    target,
                    pointer,
                    pointer_y: y,
                    last_scroll: None,
                });
                DragEvent::Started { moving }
            }
            DragState::Dragging(drag) if drag.pointer == pointer => {
                drag.pointer_y = y;
                drag.target = drop_target(rows, &drag.moving, y);
                DragEvent::Moved { target: drag.target.clone() }
            }
            _ => DragEvent::Ignored,
        }
    }

    pub fn pointer_up(&mut self, pointer: u32) -> DragEvent {
        match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Armed { row, pointer: armed, .. } if armed == pointer => DragEvent::Released { row },
            DragState::Dragging(drag) if drag.pointer == pointer => {
                let info = drag.target.map(|(anchor, placement)| MoveInfo {
                    ids: drag.moving,
                    anchor,
                    placement,
                });
                debug!(moved = info.is_some(), "drag dropped");
                DragEvent::Dropped(info)
            }
            other => {
                self.state = other;
                DragEvent::Ignored
            }
        }
    }

    /// Escape or multi-touch. Only an active drag reports `Cancelled`; an
    /// armed gesture is dropped silently.
    pub fn cancel(&mut self) -> DragEvent {
        match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Dragging(_) => {
                debug!("drag cancelled");
                DragEvent::Cancelled
            }
            _ => DragEvent::Ignored,
        }
    }

    /// Scroll delta wanted while the pointer sits near the viewport edge
    pub fn scroll_direction(&self, viewport: Viewport) -> Option<i32> {
        let drag = self.active()?;
        if drag.pointer_y < viewport.top + self.tuning.scroll_margin {
            Some(-self.tuning.scroll_step)
        } else if drag.pointer_y >= viewport.top + viewport.height - self.tuning.scroll_margin {
            Some(self.tuning.scroll_step)
        } else {
            None
        }
    }

    /// Timer hook for auto-scroll: yields a step at most once per
    /// `scroll_interval_ms` while the pointer stays in the margin
    pub fn tick(&mut self, now: Instant, viewport: Viewport) -> Option<i32> {
        let step = self.scroll_direction(viewport);
        let interval = Duration::from_millis(self.tuning.scroll_interval_ms);
        let DragState::Dragging(drag) = &mut self.state else {
            return None;
        };

        let Some(step) = step else {
            drag.last_scroll = None;
            return None;
        };

        if drag.last_scroll.is_some_and(|last| now.duration_since(last) < interval) {
            return None;
        }
        drag.last_scroll = Some(now);
        Some(step)
    }

    /// Resolve the target again at the last pointer position, for when the
    /// rows moved under a pointer that did not
    pub fn retarget(&mut self, rows: &[RowBox]) -> Option<(RecordId, Placement)> {
        let DragState::Dragging(drag) = &mut self.state else {
            return None;
        };
        drag.target = drop_target(rows, &drag.moving, drag.pointer_y);
        trace!(target = ?drag.target, "drag retargeted");
        drag.target.clone()
    }

    /// Page order as it would look if the drag were dropped now
    pub fn preview(&self, page: &[RecordId]) -> Option<Vec<RecordId>> {
        let drag = self.active()?;
        let mut ids = page.to_vec();
        if let Some((anchor, placement)) = &drag.target {
            let info = MoveInfo {
                ids: drag.moving.clone(),
                anchor: anchor.clone(),
                placement: *placement,
            };
            apply_move(&mut ids, &info, |id| id);
        }
        Some(ids)
    }
}

/// Nearest row midpoint wins; the pointer's side of that midpoint picks
/// before or after. Landing on a moving row yields no target.
pub fn drop_target(rows: &[RowBox], moving: &[RecordId], y: i32) -> Option<(RecordId, Placement)> {
    let nearest = rows.iter().min_by_key(|row| (y - row.midpoint()).abs())?;
    if moving.contains(&nearest.id) {
        return None;
    }
    let placement = if y < nearest.midpoint() {
        Placement::Before
    } else {
        Placement::After
    };
    Some((nearest.id.clone(), placement))
}

/// Move the items named in `info` next to the anchor, keeping their
/// relative order. Returns whether the order changed.
pub fn apply_move<T>(items: &mut Vec<T>, info: &MoveInfo, id_of: impl Fn(&T) -> &RecordId) -> bool {
    let moving: HashSet<&RecordId> = info.ids.iter().collect();
    if moving.contains(&info.anchor) || !items.iter().any(|item| id_of(item) == &info.anchor) {
        return false;
    }

    let before: Vec<RecordId> = items.iter().map(|item| id_of(item).clone()).collect();
    let (moved, mut rest): (Vec<T>, Vec<T>) = items.drain(..).partition(|item| moving.contains(id_of(item)));

    let anchor_at = rest
        .iter()
        .position(|item| id_of(item) == &info.anchor)
        .unwrap_or(rest.len());
    let insert_at = match info.placement {
        Placement::Before => anchor_at,
        Placement::After => (anchor_at + 1).min(rest.len()),
    };
    rest.splice(insert_at..insert_at, moved);
    *items = rest;

    items.iter().map(|item| id_of(item)).ne(before.iter())
}
