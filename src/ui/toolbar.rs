// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar with the background image controls.

/// Action requested from the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    None,
    OpenImage,
    RemoveImage,
}

/// Display the toolbar.
pub fn show(ui: &mut egui::Ui, has_background: bool, loading: bool) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        if ui
            .add_enabled(!loading, egui::Button::new("🖼 Open Image…"))
            .clicked()
        {
            action = ToolbarAction::OpenImage;
        }
        if ui
            .add_enabled(has_background && !loading, egui::Button::new("✖ Remove Image"))
            .clicked()
        {
            action = ToolbarAction::RemoveImage;
        }

        ui.separator();

        let hint = if has_background {
            "Click a label to select it, drag to move it"
        } else {
            "Drop an image on the canvas or use Open Image"
        };
        ui.label(egui::RichText::new(hint).italics().weak());
    });

    action
}
