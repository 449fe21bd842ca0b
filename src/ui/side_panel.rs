// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Label side panel.
//!
//! This module provides the panel for managing labels: the label list with
//! inline renaming, the editor for the selected label, the bulk replace box
//! and the export buttons. It only reports what the user asked for; the app
//! applies the actions to the session.

use crate::export::ExportKind;
use crate::io::replace::ReplaceError;
use crate::models::label::{LabelId, LabelPatch};
use crate::models::store::SceneSnapshot;

/// Action requested from the side panel.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelAction {
    None,
    AddLabel,
    Select(LabelId),
    Update(LabelId, LabelPatch),
    Delete(LabelId),
    BulkReplace(String),
    Export(ExportKind),
}

/// Widget state that lives across frames.
#[derive(Debug, Default)]
pub struct PanelState {
    editing: Option<LabelId>,
    edit_text: String,
    focus_edit: bool,
    bulk_input: String,
    bulk_feedback: Option<(String, bool)>,
}

impl PanelState {
    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    fn start_edit(&mut self, id: LabelId, text: &str) {
        self.editing = Some(id);
        self.edit_text = text.to_string();
        self.focus_edit = true;
    }

    fn cancel_edit(&mut self) {
        self.editing = None;
        self.edit_text.clear();
    }

    /// Finish the inline edit. Whitespace-only input is ignored and keeps
    /// the editor open.
    fn commit_edit(&mut self) -> Option<(LabelId, String)> {
        let id = self.editing?;
        let text = self.edit_text.trim();
        if text.is_empty() {
            return None;
        }
        let text = text.to_string();
        self.cancel_edit();
        Some((id, text))
    }

    /// Drop the inline editor if its label no longer exists.
    fn forget_missing(&mut self, snapshot: &SceneSnapshot) {
        if let Some(id) = self.editing {
            if snapshot.label(id).is_none() {
                self.cancel_edit();
            }
        }
    }

    pub fn set_bulk_result(&mut self, result: &Result<usize, ReplaceError>) {
        self.bulk_feedback = Some(match result {
            Ok(count) => (format!("Replaced {} label(s)", count), false),
            Err(e) => (e.to_string(), true),
        });
    }
}

/// Display the side panel.
pub fn show(
    ui: &mut egui::Ui,
    state: &mut PanelState,
    snapshot: &SceneSnapshot,
    font_size_range: [f32; 2],
    export_pending: Option<ExportKind>,
) -> PanelAction {
    let mut action = PanelAction::None;
    state.forget_missing(snapshot);

    ui.heading("Labels");
    ui.separator();

    if ui.button("➕ Add Label").clicked() {
        action = PanelAction::AddLabel;
    }
    ui.add_space(4.0);

    egui::ScrollArea::vertical()
        .id_source("label_list")
        .max_height(260.0)
        .show(ui, |ui| {
            if snapshot.labels.is_empty() {
                ui.label(egui::RichText::new("No labels yet").weak());
            }

            for label in &snapshot.labels {
                let is_selected = snapshot.selected == Some(label.id);

                if state.editing == Some(label.id) {
                    ui.horizontal(|ui| {
                        let response = ui.add(
                            egui::TextEdit::singleline(&mut state.edit_text).desired_width(150.0),
                        );
                        if state.focus_edit {
                            response.request_focus();
                            state.focus_edit = false;
                        }
                        let enter =
                            response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                        let escape = ui.input(|i| i.key_pressed(egui::Key::Escape));

                        if ui.button("Save").clicked() || enter {
                            if let Some((id, text)) = state.commit_edit() {
                                action = PanelAction::Update(id, LabelPatch::text(text));
                            }
                        } else if ui.button("Cancel").clicked() || escape {
                            state.cancel_edit();
                        }
                    });
                } else {
                    ui.horizontal(|ui| {
                        ui.vertical(|ui| {
                            if ui.selectable_label(is_selected, label.display_name()).clicked() {
                                action = PanelAction::Select(label.id);
                            }
                            ui.label(
                                egui::RichText::new(format!("Font size: {}px", label.font_size))
                                    .small()
                                    .weak(),
                            );
                        });

                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.small_button("🗑").on_hover_text("Delete").clicked() {
                                action = PanelAction::Delete(label.id);
                            }
                            if ui.small_button("✏").on_hover_text("Edit").clicked() {
                                state.start_edit(label.id, &label.text);
                            }
                        });
                    });
                }
                ui.add_space(2.0);
            }
        });

    ui.separator();

    // Selected label editor
    if let Some(label) = snapshot.selected_label() {
        ui.label(egui::RichText::new("Selected label").strong());

        let mut text = label.text.clone();
        ui.horizontal(|ui| {
            ui.label("Text:");
            if ui.text_edit_singleline(&mut text).changed() {
                action = PanelAction::Update(label.id, LabelPatch::text(text.clone()));
            }
        });

        let [min, max] = font_size_range;
        let mut size = label.font_size.clamp(min, max);
        let slider = egui::Slider::new(&mut size, min..=max)
            .integer()
            .suffix("px")
            .text("Font size");
        if ui.add(slider).changed() {
            action = PanelAction::Update(label.id, LabelPatch::font_size(size));
        }

        ui.label(
            egui::RichText::new(format!("Position: ({:.0}, {:.0})", label.x, label.y)).weak(),
        );
        ui.separator();
    }

    // Bulk replace
    ui.label(egui::RichText::new("Bulk replace").strong());
    ui.add(
        egui::TextEdit::multiline(&mut state.bulk_input)
            .code_editor()
            .desired_rows(4)
            .desired_width(f32::INFINITY)
            .hint_text("{\"label1\": \"Entrance\"}"),
    );
    ui.horizontal(|ui| {
        if ui.button("Apply").clicked() {
            action = PanelAction::BulkReplace(state.bulk_input.clone());
        }
        if let Some((message, is_error)) = &state.bulk_feedback {
            let color = if *is_error {
                ui.visuals().error_fg_color
            } else {
                ui.visuals().weak_text_color()
            };
            ui.label(egui::RichText::new(message).color(color));
        }
    });

    ui.separator();

    // Export
    ui.label(egui::RichText::new("Export").strong());
    ui.horizontal(|ui| {
        let idle = export_pending.is_none();
        if ui.add_enabled(idle, egui::Button::new("Export PNG")).clicked() {
            action = PanelAction::Export(ExportKind::Png);
        }
        if ui.add_enabled(idle, egui::Button::new("Export SVG")).clicked() {
            action = PanelAction::Export(ExportKind::Svg);
        }
        if let Some(kind) = export_pending {
            ui.spinner();
            ui.label(format!("Exporting {}…", kind.extension().to_uppercase()));
        }
    });

    action
}
