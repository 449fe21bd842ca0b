// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Scene export.
//!
//! Two independent exports read the render surface: a PNG raster at a fixed
//! pixel ratio and a self-contained SVG document. Neither touches the label
//! store. At most one export runs at a time; background jobs run on a worker
//! thread and are polled from the UI loop.

pub mod raster;
pub mod vector;

use std::sync::mpsc::{Receiver, TryRecvError};
use thiserror::Error;

/// Failure of a single export request. None of these are fatal to the editor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("render surface unavailable")]
    SurfaceUnavailable,

    #[error("another export is already in progress")]
    Busy,

    #[error("failed to decode background image: {0}")]
    Decode(String),

    #[error("failed to encode image: {0}")]
    Encode(String),

    #[error("failed to serialize scene: {0}")]
    Serialize(String),

    #[error("background changed while the export was pending")]
    Stale,

    #[error("export worker stopped before producing a result")]
    WorkerLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Png,
    Svg,
}

impl ExportKind {
    pub fn mime(self) -> &'static str {
        match self {
            ExportKind::Png => "image/png",
            ExportKind::Svg => "image/svg+xml",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportKind::Png => "png",
            ExportKind::Svg => "svg",
        }
    }
}

/// Encoded export ready for the save step.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub kind: ExportKind,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Output of a background export worker.
#[derive(Debug)]
pub enum JobOutput {
    Raster(Vec<u8>),
    Vector(Option<vector::InlineBackground>),
}

type JobResult = Result<JobOutput, ExportError>;

/// Admits one export at a time.
#[derive(Debug, Default)]
pub struct ExportScheduler {
    in_flight: Option<ExportKind>,
    pending: Option<Receiver<JobResult>>,
}

impl ExportScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> Option<ExportKind> {
        self.in_flight
    }

    /// Claim the export slot.
    pub fn begin(&mut self, kind: ExportKind) -> Result<(), ExportError> {
        if let Some(active) = self.in_flight {
            log::warn!("Rejected {:?} export while {:?} export is pending", kind, active);
            return Err(ExportError::Busy);
        }
        self.in_flight = Some(kind);
        Ok(())
    }

    /// Release the slot claimed by [`begin`](Self::begin).
    pub fn end(&mut self) {
        self.in_flight = None;
        self.pending = None;
    }

    /// Run `job` on a worker thread. The slot must already be claimed.
    pub fn spawn<F>(&mut self, job: F)
    where
        F: FnOnce() -> JobResult + Send + 'static,
    {
        let (sender, receiver) = std::sync::mpsc::channel();
        self.pending = Some(receiver);
        std::thread::spawn(move || {
            let _ = sender.send(job());
        });
    }

    /// Non-blocking check for a finished background job.
    pub fn poll(&mut self) -> Option<(ExportKind, JobResult)> {
        let kind = self.in_flight?;
        let receiver = self.pending.as_ref()?;
        let result = match receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(ExportError::WorkerLost),
        };
        self.end();
        Some((kind, result))
    }

    /// Block until the background job finishes.
    #[cfg(test)]
    pub fn wait(&mut self) -> Option<(ExportKind, JobResult)> {
        let kind = self.in_flight?;
        let receiver = self.pending.as_ref()?;
        let result = receiver.recv().unwrap_or(Err(ExportError::WorkerLost));
        self.end();
        Some((kind, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_request_is_rejected() {
        let mut scheduler = ExportScheduler::new();
        scheduler.begin(ExportKind::Svg).unwrap();
        assert_eq!(scheduler.begin(ExportKind::Png), Err(ExportError::Busy));
        assert_eq!(scheduler.begin(ExportKind::Svg), Err(ExportError::Busy));
        scheduler.end();
        assert!(scheduler.begin(ExportKind::Png).is_ok());
    }

    #[test]
    fn test_background_job_releases_slot() {
        let mut scheduler = ExportScheduler::new();
        scheduler.begin(ExportKind::Png).unwrap();
        scheduler.spawn(|| Ok(JobOutput::Raster(vec![1, 2, 3])));

        let (kind, result) = scheduler.wait().unwrap();
        assert_eq!(kind, ExportKind::Png);
        assert!(matches!(result, Ok(JobOutput::Raster(bytes)) if bytes == vec![1, 2, 3]));
        assert_eq!(scheduler.in_flight(), None);
        assert!(scheduler.poll().is_none());
    }

    #[test]
    fn test_panicking_worker_is_reported() {
        let mut scheduler = ExportScheduler::new();
        scheduler.begin(ExportKind::Svg).unwrap();
        scheduler.spawn(|| panic!("worker failure"));

        let (_, result) = scheduler.wait().unwrap();
        assert!(matches!(result, Err(ExportError::WorkerLost)));
        assert!(scheduler.begin(ExportKind::Svg).is_ok());
    }

    #[test]
    fn test_kind_metadata() {
        assert_eq!(ExportKind::Png.mime(), "image/png");
        assert_eq!(ExportKind::Svg.extension(), "svg");
    }
}
