// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! The app owns one editor session for the lifetime of the window and wires
//! the panels, the canvas and the file intake to it. Everything that
//! mutates annotation state goes through the session.

use crate::config::EditorConfig;
use crate::export::{ExportArtifact, ExportKind};
use crate::io::media::{self, LoadedImage};
use crate::io::save;
use crate::session::EditorSession;
use crate::ui::{canvas, side_panel, toolbar};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::time::Duration;

/// Message shown in the status bar.
struct Status {
    message: String,
    is_error: bool,
}

/// Main application state.
pub struct LabelpadApp {
    session: EditorSession,

    panel: side_panel::PanelState,

    /// Texture for the current background, keyed by its source URL
    background_texture: Option<(String, egui::TextureHandle)>,

    /// Receiver for background image loading
    image_loader: Option<Receiver<Result<LoadedImage, String>>>,

    /// Loading state message
    loading_message: Option<String>,

    status: Option<Status>,
}

impl LabelpadApp {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            session: EditorSession::new(config),
            panel: side_panel::PanelState::default(),
            background_texture: None,
            image_loader: None,
            loading_message: None,
            status: None,
        }
    }

    fn report(&mut self, message: impl Into<String>) {
        self.status = Some(Status {
            message: message.into(),
            is_error: false,
        });
    }

    fn report_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::error!("{}", message);
        self.status = Some(Status {
            message,
            is_error: true,
        });
    }

    /// Open the native picker and load the chosen image.
    fn pick_image(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", media::SUPPORTED_EXTENSIONS)
            .pick_file()
        {
            self.load_image_file(path);
        }
    }

    /// Load an image file on a worker thread.
    fn load_image_file(&mut self, path: PathBuf) {
        if !media::is_supported_path(&path) {
            self.report_error(format!(
                "Unsupported file type: {} (expected JPG, PNG, GIF or WebP)",
                path.display()
            ));
            return;
        }

        let (sender, receiver) = channel();
        self.image_loader = Some(receiver);
        self.loading_message = Some("Loading image...".to_string());

        std::thread::spawn(move || {
            let result =
                media::load_image(&path).map_err(|e| format!("Failed to load image: {:#}", e));
            let _ = sender.send(result);
        });
    }

    /// Load dropped bytes on a worker thread (platforms without file paths).
    fn load_image_bytes(&mut self, name: String, bytes: Arc<[u8]>) {
        let (sender, receiver) = channel();
        self.image_loader = Some(receiver);
        self.loading_message = Some("Loading image...".to_string());

        std::thread::spawn(move || {
            let result = media::load_image_bytes(name, bytes)
                .map_err(|e| format!("Failed to load image: {:#}", e));
            let _ = sender.send(result);
        });
    }

    fn poll_image_loader(&mut self, ctx: &egui::Context) {
        let Some(ref receiver) = self.image_loader else {
            return;
        };
        let Ok(result) = receiver.try_recv() else {
            return;
        };
        self.image_loader = None;
        self.loading_message = None;

        match result {
            Ok(loaded) => {
                let url = self.session.set_background(&loaded);
                let rgba = &loaded.image.rgba;
                let size = [rgba.width() as usize, rgba.height() as usize];
                let color_image = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
                let texture =
                    ctx.load_texture("background_image", color_image, egui::TextureOptions::LINEAR);
                self.background_texture = Some((url.as_str().to_string(), texture));
                self.report(format!("Loaded {}", loaded.name));
            }
            Err(e) => self.report_error(e),
        }
    }

    /// Take the first dropped file, if any.
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.first().cloned());
        let Some(file) = dropped else {
            return;
        };

        if let Some(path) = file.path {
            self.load_image_file(path);
        } else if let Some(bytes) = file.bytes {
            let name = file.name;
            if media::is_supported_path(std::path::Path::new(&name)) {
                self.load_image_bytes(name, bytes);
            } else {
                self.report_error(format!("Unsupported file type: {}", name));
            }
        }
    }

    /// Drop the texture once its background is no longer on the surface.
    fn sync_background_texture(&mut self) {
        let current = self.session.stage().background.as_ref().map(|node| node.src.as_str());
        let stale = match (&self.background_texture, current) {
            (Some((src, _)), Some(current)) => src != current,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if stale {
            self.background_texture = None;
        }
    }

    fn remove_image(&mut self) {
        self.session.remove_background();
        self.background_texture = None;
        self.report("Background removed");
    }

    fn start_export(&mut self, kind: ExportKind) {
        match self.session.begin_export(kind) {
            Ok(()) => self.report(format!("Exporting {}...", kind.extension().to_uppercase())),
            Err(e) => self.report_error(format!("Export failed: {}", e)),
        }
    }

    fn poll_export(&mut self, ctx: &egui::Context) {
        if self.session.export_pending().is_some() {
            ctx.request_repaint_after(Duration::from_millis(50));
        }
        match self.session.poll_export() {
            Some(Ok(artifact)) => self.save_export(artifact),
            Some(Err(e)) => self.report_error(format!("Export failed: {}", e)),
            None => {}
        }
    }

    /// Hand a finished export to the native save dialog.
    fn save_export(&mut self, artifact: ExportArtifact) {
        let filter = match artifact.kind {
            ExportKind::Png => "PNG image",
            ExportKind::Svg => "SVG image",
        };
        let Some(path) = rfd::FileDialog::new()
            .add_filter(filter, &[artifact.kind.extension()])
            .set_file_name(&artifact.file_name)
            .save_file()
        else {
            log::info!("Save of {} cancelled", artifact.file_name);
            self.status = None;
            return;
        };

        match save::save_artifact(&artifact, &path) {
            Ok(saved) => self.report(format!("Saved {}", saved.display())),
            Err(e) => self.report_error(format!("Failed to save export: {:#}", e)),
        }
    }

    fn apply_panel_action(&mut self, action: side_panel::PanelAction) {
        use side_panel::PanelAction;

        match action {
            PanelAction::AddLabel => {
                self.session.add_label();
            }
            PanelAction::Select(id) => self.session.select(Some(id)),
            PanelAction::Update(id, patch) => {
                self.session.update_label(id, &patch);
            }
            PanelAction::Delete(id) => {
                self.session.remove_label(id);
            }
            PanelAction::BulkReplace(input) => {
                let result = self.session.bulk_replace(&input);
                if let Err(ref e) = result {
                    log::warn!("Bulk replace rejected: {}", e);
                }
                self.panel.set_bulk_result(&result);
            }
            PanelAction::Export(kind) => self.start_export(kind),
            PanelAction::None => {}
        }
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context, was_editing: bool) {
        if !was_editing && ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.session.select(None);
        }

        // Only when no text field is focused, so typing never deletes labels
        if !ctx.wants_keyboard_input()
            && ctx.input(|i| {
                i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace)
            })
        {
            if let Some(id) = self.session.snapshot().selected {
                self.session.remove_label(id);
            }
        }
    }
}

impl eframe::App for LabelpadApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_image_loader(ctx);
        self.poll_export(ctx);
        self.handle_dropped_files(ctx);
        self.sync_background_texture();

        // Request repaint if still loading (to update spinner)
        if self.loading_message.is_some() {
            ctx.request_repaint();
        }

        let has_background = self.session.store().background().is_some();
        let loading = self.loading_message.is_some();

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.add_enabled(!loading, egui::Button::new("Open Image...")).clicked() {
                        ui.close_menu();
                        self.pick_image();
                    }
                    if ui
                        .add_enabled(has_background, egui::Button::new("Remove Image"))
                        .clicked()
                    {
                        ui.close_menu();
                        self.remove_image();
                    }
                    ui.separator();
                    let idle = self.session.export_pending().is_none();
                    if ui.add_enabled(idle, egui::Button::new("Export PNG...")).clicked() {
                        ui.close_menu();
                        self.start_export(ExportKind::Png);
                    }
                    if ui.add_enabled(idle, egui::Button::new("Export SVG...")).clicked() {
                        ui.close_menu();
                        self.start_export(ExportKind::Svg);
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Edit", |ui| {
                    if ui.button("Add Label").clicked() {
                        self.session.add_label();
                        ui.close_menu();
                    }

                    let selected = self.session.snapshot().selected;
                    if ui
                        .add_enabled(selected.is_some(), egui::Button::new("Delete Selected"))
                        .clicked()
                    {
                        if let Some(id) = selected {
                            self.session.remove_label(id);
                        }
                        ui.close_menu();
                    }
                    if ui
                        .add_enabled(selected.is_some(), egui::Button::new("Deselect"))
                        .clicked()
                    {
                        self.session.select(None);
                        ui.close_menu();
                    }
                });
            });
        });

        // Toolbar
        let toolbar_action = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| toolbar::show(ui, has_background, loading))
            .inner;
        match toolbar_action {
            toolbar::ToolbarAction::OpenImage => self.pick_image(),
            toolbar::ToolbarAction::RemoveImage => self.remove_image(),
            toolbar::ToolbarAction::None => {}
        }

        // Status bar
        let label_summary = if self.session.store().is_empty() {
            "No labels".to_string()
        } else {
            format!("{} label(s)", self.session.store().len())
        };
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(label_summary);
                if let Some(ref status) = self.status {
                    ui.separator();
                    let color = if status.is_error {
                        ui.visuals().error_fg_color
                    } else {
                        ui.visuals().text_color()
                    };
                    ui.label(egui::RichText::new(&status.message).color(color));
                }
            });
        });

        // Label panel (right side)
        let was_editing = self.panel.is_editing();
        let snapshot = self.session.snapshot();
        let font_size_range = self.session.config().labels.font_size_range;
        let export_pending = self.session.export_pending();
        let panel_action = egui::SidePanel::right("labels")
            .exact_width(self.session.config().window.side_panel_width)
            .resizable(false)
            .show(ctx, |ui| {
                side_panel::show(ui, &mut self.panel, &snapshot, font_size_range, export_pending)
            })
            .inner;
        self.apply_panel_action(panel_action);

        self.handle_keyboard(ctx, was_editing);

        // Main canvas (center)
        let hovering_files = ctx.input(|i| !i.raw.hovered_files.is_empty());
        let canvas_output = egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                if let Some(ref message) = self.loading_message {
                    ui.centered_and_justified(|ui| {
                        ui.vertical_centered(|ui| {
                            ui.add_space(20.0);
                            ui.spinner();
                            ui.add_space(10.0);
                            ui.label(
                                egui::RichText::new(message)
                                    .size(16.0)
                                    .color(egui::Color32::from_gray(200)),
                            );
                        });
                    });
                    None
                } else {
                    let selected = self.session.snapshot().selected;
                    Some(canvas::show(
                        ui,
                        self.session.stage(),
                        self.background_texture.as_ref().map(|(_, texture)| texture),
                        selected,
                        hovering_files,
                    ))
                }
            })
            .inner;

        if let Some(output) = canvas_output {
            let (width, height) = output.surface_size;
            self.session.resize_surface(width, height);
            for event in output.events {
                self.session.handle_pointer(event);
            }
            if output.open_picker {
                self.pick_image();
            }
        }
    }
}
