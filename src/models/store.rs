// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Label store.
//!
//! The store owns the ordered label collection, the background reference and
//! the current selection. Every mutation is total: addressing an unknown
//! label is a silent no-op. Labels are held behind `Arc` so an update only
//! replaces the label it touches; snapshots share the untouched ones.

use super::label::{Label, LabelId, LabelPatch, Point, Rgba};
use crate::io::replace::ReplacementMap;
use crate::io::sources::ObjectUrl;
use std::sync::Arc;

/// Defaults applied to newly created labels.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelDefaults {
    pub position: Point,
    pub font_size: f32,
    pub fill: Rgba,
}

impl Default for LabelDefaults {
    fn default() -> Self {
        Self {
            position: Point::new(200.0, 200.0),
            font_size: 24.0,
            fill: Rgba::rgb(0xe6, 0x00, 0x45),
        }
    }
}

/// Immutable view of store state at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSnapshot {
    pub background: Option<ObjectUrl>,
    pub labels: Vec<Arc<Label>>,
    pub selected: Option<LabelId>,
}

impl SceneSnapshot {
    pub fn label(&self, id: LabelId) -> Option<&Label> {
        self.labels.iter().find(|l| l.id == id).map(|l| l.as_ref())
    }

    pub fn selected_label(&self) -> Option<&Label> {
        self.selected.and_then(|id| self.label(id))
    }
}

/// Authoritative annotation state for one editor session.
#[derive(Debug)]
pub struct LabelStore {
    defaults: LabelDefaults,
    background: Option<ObjectUrl>,
    labels: Vec<Arc<Label>>,
    selected: Option<LabelId>,
    next_id: u64,
    revision: u64,
}

impl Default for LabelStore {
    fn default() -> Self {
        Self::new(LabelDefaults::default())
    }
}

impl LabelStore {
    pub fn new(defaults: LabelDefaults) -> Self {
        Self {
            defaults,
            background: None,
            labels: Vec::new(),
            selected: None,
            next_id: 1,
            revision: 0,
        }
    }

    /// Number of effective mutations applied so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn background(&self) -> Option<&ObjectUrl> {
        self.background.as_ref()
    }

    /// Replace the background reference, returning the one it displaced so
    /// the caller can release it once the surface stops drawing it.
    pub fn set_background(&mut self, src: ObjectUrl) -> Option<ObjectUrl> {
        self.revision += 1;
        self.background.replace(src)
    }

    pub fn remove_background(&mut self) -> Option<ObjectUrl> {
        let previous = self.background.take();
        if previous.is_some() {
            self.revision += 1;
        }
        previous
    }

    /// Append a label with default text `label<N>` where N is the current
    /// count plus one. The label is not selected.
    pub fn add_label(&mut self) -> LabelId {
        let id = LabelId::from_raw(self.next_id);
        self.next_id += 1;

        let label = Label {
            id,
            text: format!("label{}", self.labels.len() + 1),
            x: self.defaults.position.x,
            y: self.defaults.position.y,
            font_size: self.defaults.font_size,
            fill: self.defaults.fill,
        };
        self.labels.push(Arc::new(label));
        self.revision += 1;
        id
    }

    /// Merge `patch` into the label with `id`. Returns whether anything changed.
    pub fn update_label(&mut self, id: LabelId, patch: &LabelPatch) -> bool {
        if patch.is_empty() {
            return false;
        }
        let Some(slot) = self.labels.iter_mut().find(|l| l.id == id) else {
            return false;
        };

        let updated = slot.patched(patch);
        if updated == **slot {
            return false;
        }
        *slot = Arc::new(updated);
        self.revision += 1;
        true
    }

    /// Delete a label. Clears the selection when it pointed at the label.
    pub fn remove_label(&mut self, id: LabelId) -> bool {
        let before = self.labels.len();
        self.labels.retain(|l| l.id != id);
        if self.labels.len() == before {
            return false;
        }
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.revision += 1;
        true
    }

    /// Rewrite label text through `map`, keyed by each label's current text.
    /// Returns the number of labels rewritten.
    pub fn bulk_replace(&mut self, map: &ReplacementMap) -> usize {
        if map.is_empty() || self.labels.is_empty() {
            return 0;
        }
        let (labels, replaced) = crate::io::replace::rewrite_labels(&self.labels, map);
        if replaced > 0 {
            self.labels = labels;
            self.revision += 1;
        }
        replaced
    }

    /// Set the selection without validating the id.
    pub fn select(&mut self, id: Option<LabelId>) {
        if self.selected != id {
            self.selected = id;
            self.revision += 1;
        }
    }

    pub fn label(&self, id: LabelId) -> Option<&Label> {
        self.labels.iter().find(|l| l.id == id).map(|l| l.as_ref())
    }

    /// Current state; a selection that no longer resolves reads as none.
    pub fn snapshot(&self) -> SceneSnapshot {
        let selected = self
            .selected
            .filter(|id| self.labels.iter().any(|l| l.id == *id));
        SceneSnapshot {
            background: self.background.clone(),
            labels: self.labels.clone(),
            selected,
        }
    }
}
