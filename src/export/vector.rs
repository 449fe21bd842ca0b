// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Vector export.
//!
//! A session-scoped background URL means nothing outside the editor, so the
//! background is decoded, re-encoded as an inline PNG data URL and swapped
//! onto the background node for the duration of serialization. The original
//! source is put back when the swap guard drops, whether serialization
//! succeeded, failed or panicked.

use super::ExportError;
use crate::io::media::{self, DecodedImage};
use crate::io::sources::SourceRegistry;
use crate::render::stage::Stage;
use crate::render::svg::VectorSerializer;
use std::ops::Deref;
use std::sync::Arc;

/// Self-contained replacement for a background source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineBackground {
    pub original_src: String,
    pub data_url: String,
}

/// Everything needed to build an [`InlineBackground`] off the UI thread.
#[derive(Debug, Clone)]
pub struct InlineRequest {
    original_src: String,
    image: Option<Arc<DecodedImage>>,
    bytes: Option<Arc<[u8]>>,
}

impl InlineRequest {
    /// Capture the background of `stage`. `None` when there is none.
    pub fn capture(stage: &Stage, sources: &SourceRegistry) -> Option<Self> {
        let node = stage.background.as_ref()?;
        Some(Self {
            original_src: node.src.clone(),
            image: node.image.clone(),
            bytes: sources
                .resolve_str(&node.src)
                .map(|entry| Arc::clone(&entry.bytes)),
        })
    }

    /// Decode fully and re-encode as a PNG data URL.
    pub fn run(self) -> Result<InlineBackground, ExportError> {
        let image = match (self.image, self.bytes) {
            (Some(image), _) => image,
            (None, Some(bytes)) => Arc::new(
                media::decode_image(&bytes).map_err(|e| ExportError::Decode(format!("{e:#}")))?,
            ),
            (None, None) => {
                return Err(ExportError::Decode(format!(
                    "background source {} is no longer available",
                    self.original_src
                )))
            }
        };
        let data_url =
            media::png_data_url(&image).map_err(|e| ExportError::Encode(format!("{e:#}")))?;
        Ok(InlineBackground {
            original_src: self.original_src,
            data_url,
        })
    }
}

/// Background source substitution that is undone on drop.
struct SourceSwap<'a> {
    stage: &'a mut Stage,
    original: Option<String>,
}

impl<'a> SourceSwap<'a> {
    fn new(stage: &'a mut Stage, replacement: &str) -> Self {
        let original = stage
            .background
            .as_mut()
            .map(|node| std::mem::replace(&mut node.src, replacement.to_string()));
        Self { stage, original }
    }
}

impl Deref for SourceSwap<'_> {
    type Target = Stage;

    fn deref(&self) -> &Stage {
        self.stage
    }
}

impl Drop for SourceSwap<'_> {
    fn drop(&mut self) {
        if let (Some(node), Some(original)) = (self.stage.background.as_mut(), self.original.take())
        {
            node.src = original;
        }
    }
}

/// Serialize `stage`, substituting `inline` for the background source.
///
/// `inline` must have been prepared from the background currently on the
/// stage; a mismatch means the background changed in between.
pub fn serialize_with_inline(
    stage: &mut Stage,
    inline: Option<&InlineBackground>,
    serializer: &dyn VectorSerializer,
) -> Result<String, ExportError> {
    if !stage.is_ready() {
        return Err(ExportError::SurfaceUnavailable);
    }

    let background_src = stage.background.as_ref().map(|node| node.src.clone());
    let svg = match (background_src, inline) {
        (None, None) => serializer.serialize(stage)?,
        (Some(src), Some(inline)) if src == inline.original_src => {
            let swapped = SourceSwap::new(stage, &inline.data_url);
            serializer.serialize(&swapped)?
        }
        _ => return Err(ExportError::Stale),
    };

    if svg.trim().is_empty() {
        return Err(ExportError::Serialize("serializer produced no output".to_string()));
    }
    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::store::LabelStore;
    use crate::render::svg::SvgWriter;
    use std::cell::RefCell;

    /// Run the whole vector path inline, without the worker thread.
    fn export_svg(
        stage: &mut Stage,
        sources: &SourceRegistry,
        serializer: &dyn VectorSerializer,
    ) -> Result<String, ExportError> {
        if !stage.is_ready() {
            return Err(ExportError::SurfaceUnavailable);
        }
        stage
            .ensure_decoded(sources)
            .map_err(|e| ExportError::Decode(format!("{e:#}")))?;
        let inline = InlineRequest::capture(stage, sources)
            .map(InlineRequest::run)
            .transpose()?;
        serialize_with_inline(stage, inline.as_ref(), serializer)
    }

    /// Records the background source it saw, then fails.
    struct FailingSerializer {
        seen: RefCell<Option<String>>,
    }

    impl VectorSerializer for FailingSerializer {
        fn serialize(&self, stage: &Stage) -> Result<String, ExportError> {
            *self.seen.borrow_mut() = stage.background.as_ref().map(|n| n.src.clone());
            Err(ExportError::Serialize("simulated encoder failure".to_string()))
        }
    }

    struct PanickingSerializer;

    impl VectorSerializer for PanickingSerializer {
        fn serialize(&self, _stage: &Stage) -> Result<String, ExportError> {
            panic!("serializer blew up");
        }
    }

    struct EmptySerializer;

    impl VectorSerializer for EmptySerializer {
        fn serialize(&self, _stage: &Stage) -> Result<String, ExportError> {
            Ok(String::new())
        }
    }

    fn scene_with_background() -> (Stage, SourceRegistry, String) {
        let mut sources = SourceRegistry::new();
        let url = sources.create(
            Arc::from(media::test_png(8, 6, [0, 128, 255, 255])),
            "image/png",
        );
        let mut store = LabelStore::default();
        store.set_background(url.clone());
        store.add_label();

        let mut stage = Stage::new();
        stage.resize(320, 240);
        stage.sync(&store.snapshot(), None);
        (stage, sources, url.to_string())
    }

    #[test]
    fn test_background_is_embedded_and_restored() {
        let (mut stage, sources, url) = scene_with_background();

        let svg = export_svg(&mut stage, &sources, &SvgWriter::default()).unwrap();
        assert!(svg.contains(r#"href="data:image/png;base64,"#));
        assert!(!svg.contains("blob:"));
        assert!(svg.contains(">label1</text>"));
        assert!(svg.contains(r#"<image x="0" y="0" width="8" height="6""#));
        assert_eq!(stage.background.as_ref().unwrap().src, url);
    }

    #[test]
    fn test_source_restored_after_serializer_failure() {
        let (mut stage, sources, url) = scene_with_background();
        let serializer = FailingSerializer {
            seen: RefCell::new(None),
        };

        let result = export_svg(&mut stage, &sources, &serializer);
        assert!(matches!(result, Err(ExportError::Serialize(_))));

        let seen = serializer.seen.borrow().clone().unwrap();
        assert!(seen.starts_with("data:image/png;base64,"));
        assert_eq!(stage.background.as_ref().unwrap().src, url);
    }

    #[test]
    fn test_source_restored_after_serializer_panic() {
        let (mut stage, sources, url) = scene_with_background();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            export_svg(&mut stage, &sources, &PanickingSerializer)
        }));
        assert!(outcome.is_err());
        assert_eq!(stage.background.as_ref().unwrap().src, url);
    }

    #[test]
    fn test_empty_output_is_rejected() {
        let (mut stage, sources, _) = scene_with_background();
        assert!(matches!(
            export_svg(&mut stage, &sources, &EmptySerializer),
            Err(ExportError::Serialize(_))
        ));
    }

    #[test]
    fn test_labels_only_without_background() {
        let mut store = LabelStore::default();
        store.add_label();
        let mut stage = Stage::new();
        stage.resize(100, 100);
        stage.sync(&store.snapshot(), None);

        let svg = export_svg(&mut stage, &SourceRegistry::new(), &SvgWriter::default()).unwrap();
        assert!(!svg.contains("<image"));
        assert!(svg.contains("label1"));
    }

    #[test]
    fn test_unready_surface() {
        let (mut stage, sources, _) = scene_with_background();
        stage.resize(0, 0);
        assert_eq!(
            export_svg(&mut stage, &sources, &SvgWriter::default()),
            Err(ExportError::SurfaceUnavailable)
        );
    }

    #[test]
    fn test_corrupt_background_reports_decode_error() {
        let mut sources = SourceRegistry::new();
        let url = sources.create(Arc::from(b"not an image".to_vec()), "image/png");
        let mut store = LabelStore::default();
        store.set_background(url.clone());
        let mut stage = Stage::new();
        stage.resize(10, 10);
        stage.sync(&store.snapshot(), None);

        let result = export_svg(&mut stage, &sources, &SvgWriter::default());
        assert!(matches!(result, Err(ExportError::Decode(_))));
        assert_eq!(stage.background.as_ref().unwrap().src, url.as_str());
    }

    #[test]
    fn test_mismatched_inline_is_stale() {
        let (mut stage, _, _) = scene_with_background();
        let inline = InlineBackground {
            original_src: "blob:labelpad/999".to_string(),
            data_url: "data:image/png;base64,AAAA".to_string(),
        };
        assert_eq!(
            serialize_with_inline(&mut stage, Some(&inline), &SvgWriter::default()),
            Err(ExportError::Stale)
        );
        assert_eq!(
            serialize_with_inline(&mut stage, None, &SvgWriter::default()),
            Err(ExportError::Stale)
        );
    }
}
