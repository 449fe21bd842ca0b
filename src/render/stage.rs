// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The render surface.
//!
//! A `Stage` mirrors the store snapshot into drawable nodes: an optional
//! background image drawn at its natural size from the origin, followed by
//! text nodes in paint order. The canvas draws from it and both exports read
//! from it.

use crate::io::media::{self, DecodedImage};
use crate::io::sources::SourceRegistry;
use crate::models::label::{LabelId, Point, Rgba};
use crate::models::store::SceneSnapshot;
use std::sync::Arc;

/// Background image node.
#[derive(Debug, Clone)]
pub struct ImageNode {
    /// Source the node draws from. Exports may swap this temporarily.
    pub src: String,
    /// Decoded pixels, filled in lazily.
    pub image: Option<Arc<DecodedImage>>,
}

impl ImageNode {
    pub fn size(&self) -> Option<(u32, u32)> {
        self.image.as_ref().map(|i| (i.width(), i.height()))
    }
}

/// Line spacing as a multiple of the font size.
pub const LINE_HEIGHT: f32 = 1.2;

/// Text node for one label.
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub id: LabelId,
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    pub fill: Rgba,
}

impl TextNode {
    /// The text split on newlines, each line paired with its top edge.
    pub fn lines(&self) -> impl Iterator<Item = (&str, f32)> + '_ {
        let step = self.font_size * LINE_HEIGHT;
        self.text.split('\n').enumerate().map(move |(i, line)| {
            let line = line.strip_suffix('\r').unwrap_or(line);
            (line, self.y + i as f32 * step)
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Stage {
    width: u32,
    height: u32,
    pub background: Option<ImageNode>,
    pub texts: Vec<TextNode>,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// A surface with either dimension zero has not been laid out yet.
    pub fn is_ready(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Rebuild the nodes from `snapshot`. `preview` overrides the position
    /// of one label while it is being dragged.
    pub fn sync(&mut self, snapshot: &SceneSnapshot, preview: Option<(LabelId, Point)>) {
        match snapshot.background {
            Some(ref url) => {
                let unchanged = self
                    .background
                    .as_ref()
                    .is_some_and(|node| node.src == url.as_str());
                if !unchanged {
                    self.background = Some(ImageNode {
                        src: url.as_str().to_string(),
                        image: None,
                    });
                }
            }
            None => self.background = None,
        }

        self.texts = snapshot
            .labels
            .iter()
            .map(|label| {
                let pos = match preview {
                    Some((id, pos)) if id == label.id => pos,
                    _ => label.position(),
                };
                TextNode {
                    id: label.id,
                    text: label.text.clone(),
                    x: pos.x,
                    y: pos.y,
                    font_size: label.font_size,
                    fill: label.fill,
                }
            })
            .collect();
    }

    /// Attach already-decoded pixels to the background node, if it still
    /// draws from `src`.
    pub fn attach_image(&mut self, src: &str, image: Arc<DecodedImage>) -> bool {
        match self.background {
            Some(ref mut node) if node.src == src => {
                node.image = Some(image);
                true
            }
            _ => false,
        }
    }

    /// Decode the background from the registry if no pixels are attached.
    pub fn ensure_decoded(&mut self, sources: &SourceRegistry) -> anyhow::Result<()> {
        let Some(ref mut node) = self.background else {
            return Ok(());
        };
        if node.image.is_some() {
            return Ok(());
        }
        let entry = sources
            .resolve_str(&node.src)
            .ok_or_else(|| anyhow::anyhow!("background source {} was revoked", node.src))?;
        log::debug!("Decoding {} background from {}", entry.mime, node.src);
        node.image = Some(Arc::new(media::decode_image(&entry.bytes)?));
        Ok(())
    }

    #[cfg(test)]
    pub fn text(&self, id: LabelId) -> Option<&TextNode> {
        self.texts.iter().find(|t| t.id == id)
    }
}
