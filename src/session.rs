// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editor session.
//!
//! One `EditorSession` exists per open editor window. It owns the label
//! store, the background sources, the render surface, the pointer
//! controller and the export machinery, and keeps the surface in sync with
//! the store after every mutation.

use crate::config::EditorConfig;
use crate::export::raster::Rasterizer;
use crate::export::vector::{self, InlineRequest};
use crate::export::{ExportArtifact, ExportError, ExportKind, ExportScheduler, JobOutput};
use crate::io::media::LoadedImage;
use crate::io::replace::{ReplaceError, ReplacementMap};
use crate::io::sources::{ObjectUrl, SourceRegistry};
use crate::models::label::{LabelId, LabelPatch};
use crate::models::store::{LabelStore, SceneSnapshot};
use crate::render::stage::Stage;
use crate::render::svg::SvgWriter;
use crate::ui::interaction::{InteractionController, Outcome, PointerEvent};
use std::sync::Arc;

pub struct EditorSession {
    config: EditorConfig,
    store: LabelStore,
    sources: SourceRegistry,
    stage: Stage,
    controller: InteractionController,
    exports: ExportScheduler,
    rasterizer: Rasterizer,
    writer: SvgWriter,
}

impl EditorSession {
    /// Start a session whose raster export uses the system fonts.
    pub fn new(config: EditorConfig) -> Self {
        let writer = SvgWriter::new(config.export.font_family.clone());
        let rasterizer = Rasterizer::with_system_fonts(writer.clone());
        Self::with_rasterizer(config, rasterizer)
    }

    pub fn with_rasterizer(config: EditorConfig, rasterizer: Rasterizer) -> Self {
        let writer = SvgWriter::new(config.export.font_family.clone());
        Self {
            store: LabelStore::new(config.label_defaults()),
            sources: SourceRegistry::new(),
            stage: Stage::new(),
            controller: InteractionController::new(config.interaction.drag_threshold),
            exports: ExportScheduler::new(),
            rasterizer,
            writer,
            config,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        self.store.snapshot()
    }

    pub fn store(&self) -> &LabelStore {
        &self.store
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    #[cfg(test)]
    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    #[cfg(test)]
    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    fn refresh_stage(&mut self) {
        let snapshot = self.store.snapshot();
        self.stage.sync(&snapshot, self.controller.drag_preview());
    }

    /// Match the surface to the laid-out canvas size.
    pub fn resize_surface(&mut self, width: u32, height: u32) {
        if self.stage.size() != (width, height) {
            log::debug!("Render surface resized to {}x{}", width, height);
            self.stage.resize(width, height);
        }
    }

    /// Make a loaded image the background, releasing the one it replaces.
    pub fn set_background(&mut self, loaded: &LoadedImage) -> ObjectUrl {
        let url = self.sources.create(Arc::clone(&loaded.bytes), loaded.mime);
        let previous = self.store.set_background(url.clone());
        self.refresh_stage();
        self.stage.attach_image(url.as_str(), Arc::clone(&loaded.image));
        if let Some(previous) = previous {
            self.sources.revoke(&previous);
        }
        log::debug!("{} live background source(s)", self.sources.live_count());
        log::info!(
            "Background set to {} ({}x{})",
            loaded.name,
            loaded.image.width(),
            loaded.image.height()
        );
        url
    }

    pub fn remove_background(&mut self) {
        if let Some(previous) = self.store.remove_background() {
            self.refresh_stage();
            self.sources.revoke(&previous);
            log::info!("Background removed");
        }
    }

    /// Add a label. The new label is not selected.
    pub fn add_label(&mut self) -> LabelId {
        let id = self.store.add_label();
        self.refresh_stage();
        log::info!("Added {}, total: {}", id, self.store.len());
        id
    }

    pub fn update_label(&mut self, id: LabelId, patch: &LabelPatch) -> bool {
        let changed = self.store.update_label(id, patch);
        if changed {
            self.refresh_stage();
        }
        changed
    }

    pub fn remove_label(&mut self, id: LabelId) -> bool {
        let removed = self.store.remove_label(id);
        if removed {
            if self.controller.dragging() == Some(id) {
                self.controller.reset();
            }
            self.refresh_stage();
            log::info!("Deleted {}, total: {}", id, self.store.len());
        }
        removed
    }

    pub fn select(&mut self, id: Option<LabelId>) {
        self.store.select(id);
    }

    /// Validate `input` as a replacement mapping and apply it in one pass.
    /// Malformed input leaves the store untouched.
    pub fn bulk_replace(&mut self, input: &str) -> Result<usize, ReplaceError> {
        let map = ReplacementMap::parse(input)?;
        let replaced = self.store.bulk_replace(&map);
        if replaced > 0 {
            self.refresh_stage();
        }
        log::info!("Bulk replace: {} mapping(s), {} label(s) rewritten", map.len(), replaced);
        Ok(replaced)
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> Outcome {
        let revision = self.store.revision();
        let was_dragging = self.controller.dragging().is_some();
        let outcome = self.controller.handle(event, &mut self.store);
        if was_dragging || self.controller.dragging().is_some() || self.store.revision() != revision
        {
            self.refresh_stage();
        }
        outcome
    }

    fn artifact(&self, kind: ExportKind, bytes: Vec<u8>) -> ExportArtifact {
        let file_name = match kind {
            ExportKind::Png => self.config.export.png_file_name.clone(),
            ExportKind::Svg => self.config.export.svg_file_name.clone(),
        };
        ExportArtifact {
            kind,
            file_name,
            bytes,
        }
    }

    fn decode_background(&mut self) -> Result<(), ExportError> {
        self.stage
            .ensure_decoded(&self.sources)
            .map_err(|e| ExportError::Decode(format!("{e:#}")))
    }

    /// Start an export on a worker thread. Poll with [`poll_export`](Self::poll_export).
    pub fn begin_export(&mut self, kind: ExportKind) -> Result<(), ExportError> {
        if !self.stage.is_ready() {
            return Err(ExportError::SurfaceUnavailable);
        }
        self.exports.begin(kind)?;
        if let Err(e) = self.decode_background() {
            self.exports.end();
            return Err(e);
        }

        match kind {
            ExportKind::Png => {
                let stage = self.stage.clone();
                let rasterizer = self.rasterizer.clone();
                let ratio = self.config.export.pixel_ratio;
                self.exports
                    .spawn(move || rasterizer.encode_png(&stage, ratio).map(JobOutput::Raster));
            }
            ExportKind::Svg => {
                let request = InlineRequest::capture(&self.stage, &self.sources);
                self.exports.spawn(move || {
                    request
                        .map(InlineRequest::run)
                        .transpose()
                        .map(JobOutput::Vector)
                });
            }
        }
        log::info!("Started {:?} export", kind);
        Ok(())
    }

    pub fn export_pending(&self) -> Option<ExportKind> {
        self.exports.in_flight()
    }

    /// Collect a finished background export, if any.
    pub fn poll_export(&mut self) -> Option<Result<ExportArtifact, ExportError>> {
        let (kind, result) = self.exports.poll()?;
        Some(self.finish_export(kind, result))
    }

    /// Block until the pending background export finishes.
    #[cfg(test)]
    pub fn wait_export(&mut self) -> Option<Result<ExportArtifact, ExportError>> {
        let (kind, result) = self.exports.wait()?;
        Some(self.finish_export(kind, result))
    }

    fn finish_export(
        &mut self,
        kind: ExportKind,
        result: Result<JobOutput, ExportError>,
    ) -> Result<ExportArtifact, ExportError> {
        let result = match result {
            Ok(JobOutput::Raster(png)) => Ok(self.artifact(kind, png)),
            Ok(JobOutput::Vector(inline)) => {
                vector::serialize_with_inline(&mut self.stage, inline.as_ref(), &self.writer)
                    .map(|svg| self.artifact(kind, svg.into_bytes()))
            }
            Err(e) => Err(e),
        };
        log_export_result(kind, &result);
        result
    }

    /// Release every background reference. Safe to call more than once.
    pub fn close(&mut self) {
        let released = self.sources.revoke_all();
        if released > 0 {
            log::info!("Session closed, released {} background source(s)", released);
        }
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        self.close();
    }
}

fn log_export_result(kind: ExportKind, result: &Result<ExportArtifact, ExportError>) {
    match result {
        Ok(artifact) => log::info!(
            "{:?} export produced {} ({} bytes)",
            kind,
            artifact.file_name,
            artifact.bytes.len()
        ),
        Err(e) => log::error!("{:?} export failed: {}", kind, e),
    }
}
