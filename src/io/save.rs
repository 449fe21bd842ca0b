// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Writing export artifacts to disk.

use crate::export::{ExportArtifact, ExportKind};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Append the artifact's extension when the chosen path has none.
pub fn with_default_extension(path: &Path, kind: ExportKind) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(kind.extension())
    }
}

/// Write an artifact to `path`.
///
/// The bytes go to a sibling temporary file first and are renamed into
/// place, so a failed write never leaves a truncated file behind.
pub fn save_artifact(artifact: &ExportArtifact, path: &Path) -> Result<PathBuf> {
    let path = with_default_extension(path, artifact.kind);
    let file_name = path
        .file_name()
        .with_context(|| format!("'{}' is not a file path", path.display()))?;

    let mut temp_name = std::ffi::OsString::from(".");
    temp_name.push(file_name);
    temp_name.push(".part");
    let temp_path = path.with_file_name(temp_name);

    std::fs::write(&temp_path, &artifact.bytes)
        .with_context(|| format!("write '{}'", temp_path.display()))?;
    if let Err(e) = std::fs::rename(&temp_path, &path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e).with_context(|| format!("move export into '{}'", path.display()));
    }

    log::info!(
        "Saved {} ({} bytes) to {}",
        artifact.kind.mime(),
        artifact.bytes.len(),
        path.display()
    );
    Ok(path)
}
