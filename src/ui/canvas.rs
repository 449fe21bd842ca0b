// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas for the scene.
//!
//! This module paints the render surface (background image and labels),
//! hit-tests the pointer against the labels and reports raw pointer events
//! for the interaction controller.

use crate::models::label::{LabelId, Point};
use crate::render::stage::Stage;
use crate::ui::interaction::PointerEvent;
use crate::util::geometry::{self, Bounds};

/// Everything the canvas reports back for one frame.
pub struct CanvasOutput {
    pub events: Vec<PointerEvent>,
    pub surface_size: (u32, u32),
    /// The empty drop target was clicked.
    pub open_picker: bool,
}

/// Display the canvas and collect pointer input.
pub fn show(
    ui: &mut egui::Ui,
    stage: &Stage,
    texture: Option<&egui::TextureHandle>,
    selected: Option<LabelId>,
    hovering_files: bool,
) -> CanvasOutput {
    let available = ui.available_size();
    let (response, painter) = ui.allocate_painter(available, egui::Sense::click_and_drag());
    let rect = response.rect;
    let origin = Point::new(rect.min.x, rect.min.y);

    painter.rect_filled(rect, 0.0, egui::Color32::WHITE);

    // Background at natural size from the origin
    if let (Some(node), Some(texture)) = (&stage.background, texture) {
        let size = node
            .size()
            .map(|(w, h)| egui::vec2(w as f32, h as f32))
            .unwrap_or_else(|| texture.size_vec2());
        painter.image(
            texture.id(),
            egui::Rect::from_min_size(rect.min, size),
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );
    } else if stage.background.is_none() {
        draw_drop_hint(&painter, rect);
    }

    // Labels in paint order
    let mut hits: Vec<(LabelId, Bounds)> = Vec::with_capacity(stage.texts.len());
    for text in &stage.texts {
        let fill = text.fill;
        let color = egui::Color32::from_rgba_unmultiplied(fill.r, fill.g, fill.b, fill.a);
        let font = egui::FontId::proportional(text.font_size);

        // One galley per line, spaced like the exports
        let mut text_rect = egui::Rect::NOTHING;
        for (line, top) in text.lines() {
            let galley = painter.layout_no_wrap(line.to_string(), font.clone(), color);
            let screen = geometry::scene_to_screen(origin, Point::new(text.x, top));
            let line_rect =
                egui::Rect::from_min_size(egui::pos2(screen.x, screen.y), galley.size());
            painter.galley(line_rect.min, galley, color);
            text_rect = text_rect.union(line_rect);
        }

        if selected == Some(text.id) {
            painter.rect_stroke(
                text_rect.expand(3.0),
                2.0,
                egui::Stroke::new(1.5, egui::Color32::from_rgb(59, 130, 246)),
            );
        }
        let anchor = Point::new(text.x, text.y);
        let bounds = Bounds::from_origin_size(anchor, text_rect.width(), text_rect.height());
        hits.push((text.id, bounds));
    }

    if hovering_files {
        painter.rect_filled(rect, 0.0, egui::Color32::from_rgba_unmultiplied(15, 23, 42, 102));
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            "Drop image here…",
            egui::FontId::proportional(24.0),
            egui::Color32::WHITE,
        );
    }

    // Pointer input
    let mut events = Vec::new();
    let mut open_picker = false;
    let (pressed, released, down, delta, pointer) = ui.input(|i| {
        (
            i.pointer.primary_pressed(),
            i.pointer.primary_released(),
            i.pointer.primary_down(),
            i.pointer.delta(),
            i.pointer.interact_pos(),
        )
    });

    if let Some(pointer) = pointer {
        let scene = geometry::screen_to_scene(origin, Point::new(pointer.x, pointer.y));
        let hovered_label = geometry::topmost_hit(&hits, scene);

        if pressed && response.hovered() {
            events.push(PointerEvent::Down {
                target: hovered_label,
                pos: scene,
            });
        } else if down && delta != egui::Vec2::ZERO {
            events.push(PointerEvent::Move { pos: scene });
        }
        if released {
            events.push(PointerEvent::Up { pos: scene });
        }

        if response.hovered() && hovered_label.is_some() {
            let icon = if down {
                egui::CursorIcon::Grabbing
            } else {
                egui::CursorIcon::Grab
            };
            ui.ctx().set_cursor_icon(icon);
        }

        if response.clicked() && hovered_label.is_none() && stage.background.is_none() {
            open_picker = true;
        }
    }

    CanvasOutput {
        events,
        surface_size: geometry::surface_size(rect.width(), rect.height()),
        open_picker,
    }
}

/// Empty-state drop target shown when there is no background.
fn draw_drop_hint(painter: &egui::Painter, rect: egui::Rect) {
    let inner = rect.shrink(16.0);
    painter.rect_filled(inner, 8.0, egui::Color32::from_rgb(248, 250, 252));
    painter.rect_stroke(
        inner,
        8.0,
        egui::Stroke::new(2.0, egui::Color32::from_rgb(203, 213, 225)),
    );

    let hint_color = egui::Color32::from_rgb(100, 116, 139);
    painter.text(
        inner.center() - egui::vec2(0.0, 12.0),
        egui::Align2::CENTER_CENTER,
        "Click or drag & drop to add image",
        egui::FontId::proportional(18.0),
        hint_color,
    );
    painter.text(
        inner.center() + egui::vec2(0.0, 14.0),
        egui::Align2::CENTER_CENTER,
        "Supports: JPG, PNG, GIF, WebP",
        egui::FontId::proportional(14.0),
        hint_color.gamma_multiply(0.7),
    );
}
