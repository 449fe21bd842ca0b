// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! LabelPad - image label editor
//!
//! A cross-platform desktop application for placing text labels on a
//! background image and exporting the result as PNG or SVG.

mod app;
mod config;
mod export;
mod io;
mod models;
mod render;
mod session;
mod ui;
mod util;

use anyhow::{Context, Result};
use app::LabelpadApp;
use config::EditorConfig;

fn main() -> Result<()> {
    // Initialize logging, `info` unless RUST_LOG says otherwise
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = EditorConfig::load().context("Failed to load configuration")?;

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window.width, config.window.height])
            .with_min_inner_size([800.0, 600.0])
            .with_drag_and_drop(true)
            .with_title("LabelPad"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "LabelPad",
        options,
        Box::new(|_cc| Ok(Box::new(LabelpadApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
