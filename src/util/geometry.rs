// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides conversions between screen coordinates and scene
//! coordinates (the canvas origin is the scene origin, one unit per point)
//! and the z-order aware hit test used by the canvas.

use crate::models::label::{LabelId, Point};

/// Axis-aligned bounds in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    pub fn from_origin_size(origin: Point, width: f32, height: f32) -> Self {
        Self {
            min: origin,
            max: Point::new(origin.x + width, origin.y + height),
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Convert a screen position to scene coordinates.
pub fn screen_to_scene(canvas_origin: Point, screen: Point) -> Point {
    Point::new(screen.x - canvas_origin.x, screen.y - canvas_origin.y)
}

/// Convert a scene position to screen coordinates.
pub fn scene_to_screen(canvas_origin: Point, scene: Point) -> Point {
    Point::new(scene.x + canvas_origin.x, scene.y + canvas_origin.y)
}

/// Whole-pixel surface size for a laid-out canvas.
pub fn surface_size(width: f32, height: f32) -> (u32, u32) {
    let clamp = |v: f32| if v.is_finite() && v > 0.0 { v.floor() as u32 } else { 0 };
    (clamp(width), clamp(height))
}

/// Topmost label under `pos`. `hits` is in paint order, so later entries win.
pub fn topmost_hit(hits: &[(LabelId, Bounds)], pos: Point) -> Option<LabelId> {
    hits.iter()
        .rev()
        .find(|(_, bounds)| bounds.contains(pos))
        .map(|(id, _)| *id)
}
