// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Pointer interaction state machine.
//!
//! The canvas reports raw pointer events, already hit-tested against the
//! label nodes; the controller turns them into store mutations:
//!
//! - press on empty canvas clears the selection
//! - press and release on a label without moving selects it
//! - press, drag and release on a label commits the final position once
//!
//! Dragging leaves the selection alone. While a drag is in progress the
//! live position is exposed through [`InteractionController::drag_preview`]
//! for rendering only.

use crate::models::label::{LabelId, LabelPatch, Point};
use crate::models::store::LabelStore;

/// Pointer event in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Primary button pressed; `target` is the topmost label under the pointer.
    Down { target: Option<LabelId>, pos: Point },
    Move { pos: Point },
    Up { pos: Point },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Idle,
    /// Button held on a label, not yet moved past the drag threshold.
    Pressed {
        id: LabelId,
        press: Point,
        origin: Point,
    },
    Dragging {
        id: LabelId,
        press: Point,
        origin: Point,
        current: Point,
    },
}

/// What a single event did to the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    None,
    Selected(LabelId),
    Deselected,
    DragStarted(LabelId),
    Moved { id: LabelId, to: Point },
}

#[derive(Debug, Clone)]
pub struct InteractionController {
    state: State,
    drag_threshold: f32,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(3.0)
    }
}

impl InteractionController {
    pub fn new(drag_threshold: f32) -> Self {
        Self {
            state: State::Idle,
            drag_threshold: drag_threshold.max(0.0),
        }
    }

    #[cfg(test)]
    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    pub fn dragging(&self) -> Option<LabelId> {
        match self.state {
            State::Dragging { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Live position of the label being dragged.
    pub fn drag_preview(&self) -> Option<(LabelId, Point)> {
        match self.state {
            State::Dragging { id, current, .. } => Some((id, current)),
            _ => None,
        }
    }

    /// Abandon any gesture in progress without committing it.
    pub fn reset(&mut self) {
        self.state = State::Idle;
    }

    pub fn handle(&mut self, event: PointerEvent, store: &mut LabelStore) -> Outcome {
        match (self.state, event) {
            (State::Idle, PointerEvent::Down { target: None, .. }) => {
                store.select(None);
                Outcome::Deselected
            }
            (State::Idle, PointerEvent::Down { target: Some(id), pos }) => {
                match store.label(id) {
                    Some(label) => {
                        self.state = State::Pressed {
                            id,
                            press: pos,
                            origin: label.position(),
                        };
                        Outcome::None
                    }
                    None => {
                        // Stale hit test: the label is gone.
                        store.select(None);
                        Outcome::Deselected
                    }
                }
            }
            (State::Pressed { id, press, origin }, PointerEvent::Move { pos }) => {
                let dx = pos.x - press.x;
                let dy = pos.y - press.y;
                if dx.hypot(dy) <= self.drag_threshold {
                    return Outcome::None;
                }
                self.state = State::Dragging {
                    id,
                    press,
                    origin,
                    current: offset(origin, press, pos),
                };
                log::debug!("Started dragging {}", id);
                Outcome::DragStarted(id)
            }
            (State::Pressed { id, .. }, PointerEvent::Up { .. }) => {
                self.state = State::Idle;
                if store.label(id).is_some() {
                    store.select(Some(id));
                    Outcome::Selected(id)
                } else {
                    store.select(None);
                    Outcome::Deselected
                }
            }
            (
                State::Dragging {
                    id, press, origin, ..
                },
                PointerEvent::Move { pos },
            ) => {
                self.state = State::Dragging {
                    id,
                    press,
                    origin,
                    current: offset(origin, press, pos),
                };
                Outcome::None
            }
            (State::Dragging { id, press, origin, .. }, PointerEvent::Up { pos }) => {
                self.state = State::Idle;
                let to = offset(origin, press, pos);
                if store.update_label(id, &LabelPatch::position(to)) {
                    log::debug!("Moved {} to ({:.1}, {:.1})", id, to.x, to.y);
                    Outcome::Moved { id, to }
                } else {
                    Outcome::None
                }
            }
            // A press without a matching release (e.g. released outside the
            // window) restarts the gesture from the new press.
            (State::Pressed { .. } | State::Dragging { .. }, PointerEvent::Down { .. }) => {
                self.state = State::Idle;
                self.handle(event, store)
            }
            (State::Idle, PointerEvent::Move { .. } | PointerEvent::Up { .. }) => Outcome::None,
        }
    }
}

fn offset(origin: Point, press: Point, pos: Point) -> Point {
    Point::new(origin.x + (pos.x - press.x), origin.y + (pos.y - press.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    fn down(target: Option<LabelId>, x: f32, y: f32) -> PointerEvent {
        PointerEvent::Down {
            target,
            pos: p(x, y),
        }
    }

    fn moved(x: f32, y: f32) -> PointerEvent {
        PointerEvent::Move { pos: p(x, y) }
    }

    fn up(x: f32, y: f32) -> PointerEvent {
        PointerEvent::Up { pos: p(x, y) }
    }

    #[test]
    fn test_click_on_label_selects() {
        let mut store = LabelStore::default();
        let id = store.add_label();
        let mut controller = InteractionController::default();

        controller.handle(down(Some(id), 205.0, 210.0), &mut store);
        let outcome = controller.handle(up(205.0, 210.0), &mut store);

        assert_eq!(outcome, Outcome::Selected(id));
        assert_eq!(store.snapshot().selected, Some(id));
        assert!(controller.is_idle());
    }

    #[test]
    fn test_press_on_empty_area_clears_selection() {
        let mut store = LabelStore::default();
        let id = store.add_label();
        store.select(Some(id));
        let mut controller = InteractionController::default();

        let outcome = controller.handle(down(None, 5.0, 5.0), &mut store);
        controller.handle(up(5.0, 5.0), &mut store);

        assert_eq!(outcome, Outcome::Deselected);
        assert_eq!(store.snapshot().selected, None);
    }

    #[test]
    fn test_click_on_label_does_not_clear_selection_first() {
        let mut store = LabelStore::default();
        let id = store.add_label();
        store.select(Some(id));
        let mut controller = InteractionController::default();

        controller.handle(down(Some(id), 201.0, 201.0), &mut store);
        assert_eq!(store.snapshot().selected, Some(id));
        controller.handle(up(201.0, 201.0), &mut store);
        assert_eq!(store.snapshot().selected, Some(id));
    }

    #[test]
    fn test_drag_commits_single_update_on_release() {
        let mut store = LabelStore::default();
        let id = store.add_label();
        let mut controller = InteractionController::default();
        let revision = store.revision();

        controller.handle(down(Some(id), 210.0, 215.0), &mut store);
        for step in 1..=10 {
            let t = step as f32 / 10.0;
            let pos = p(210.0 + 150.0 * t, 215.0 - 80.0 * t);
            controller.handle(PointerEvent::Move { pos }, &mut store);
        }
        assert_eq!(store.revision(), revision);
        assert_eq!(controller.drag_preview(), Some((id, p(350.0, 120.0))));
        assert_eq!(store.label(id).unwrap().position(), p(200.0, 200.0));

        let outcome = controller.handle(up(360.0, 135.0), &mut store);
        assert_eq!(outcome, Outcome::Moved { id, to: p(350.0, 120.0) });
        assert_eq!(store.revision(), revision + 1);
        assert_eq!(store.label(id).unwrap().position(), p(350.0, 120.0));
        assert_eq!(controller.drag_preview(), None);
    }

    #[test]
    fn test_drag_does_not_change_selection() {
        let mut store = LabelStore::default();
        let a = store.add_label();
        let b = store.add_label();
        store.select(Some(a));
        let mut controller = InteractionController::default();

        controller.handle(down(Some(b), 200.0, 200.0), &mut store);
        controller.handle(moved(260.0, 200.0), &mut store);
        controller.handle(up(260.0, 200.0), &mut store);

        assert_eq!(store.snapshot().selected, Some(a));
        assert_eq!(store.label(b).unwrap().position(), p(260.0, 200.0));
    }

    #[test]
    fn test_jitter_below_threshold_is_still_a_click() {
        let mut store = LabelStore::default();
        let id = store.add_label();
        let mut controller = InteractionController::new(3.0);

        controller.handle(down(Some(id), 200.0, 200.0), &mut store);
        controller.handle(moved(201.0, 201.0), &mut store);
        let outcome = controller.handle(up(201.0, 201.0), &mut store);

        assert_eq!(outcome, Outcome::Selected(id));
        assert_eq!(store.label(id).unwrap().position(), p(200.0, 200.0));
    }

    #[test]
    fn test_label_removed_mid_drag() {
        let mut store = LabelStore::default();
        let id = store.add_label();
        let mut controller = InteractionController::default();

        controller.handle(down(Some(id), 200.0, 200.0), &mut store);
        controller.handle(moved(300.0, 300.0), &mut store);
        store.remove_label(id);
        let revision = store.revision();

        let outcome = controller.handle(up(300.0, 300.0), &mut store);
        assert_eq!(outcome, Outcome::None);
        assert_eq!(store.revision(), revision);
        assert!(controller.is_idle());
    }

    #[test]
    fn test_press_on_unknown_label_clears_selection() {
        let mut store = LabelStore::default();
        let id = store.add_label();
        store.select(Some(id));
        store.remove_label(id);
        let mut controller = InteractionController::default();

        let outcome = controller.handle(down(Some(id), 0.0, 0.0), &mut store);
        assert_eq!(outcome, Outcome::Deselected);
        assert!(controller.is_idle());
    }

    #[test]
    fn test_stray_events_in_idle_are_ignored() {
        let mut store = LabelStore::default();
        store.add_label();
        let mut controller = InteractionController::default();
        let revision = store.revision();

        assert_eq!(controller.handle(moved(1.0, 1.0), &mut store), Outcome::None);
        assert_eq!(controller.handle(up(1.0, 1.0), &mut store), Outcome::None);
        assert_eq!(store.revision(), revision);
    }
}
