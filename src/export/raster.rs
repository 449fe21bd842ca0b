// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Raster export.
//!
//! The background is composited straight from its decoded pixels. Labels
//! are written as an SVG layer and rendered through `usvg`/`resvg` so text
//! shaping matches the vector export.

use super::ExportError;
use crate::io::media;
use crate::render::stage::Stage;
use crate::render::svg::{Layers, SvgWriter};
use image::RgbaImage;
use resvg::tiny_skia::{FilterQuality, IntSize, Pixmap, PixmapPaint, Transform};
use std::sync::Arc;
use usvg::fontdb;

/// Largest edge of an exported raster, in pixels.
const MAX_DIM: u32 = 16_384;

/// Renders the surface to pixels. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    fontdb: Arc<fontdb::Database>,
    writer: SvgWriter,
}

impl Rasterizer {
    /// Rasterizer backed by the fonts installed on this machine.
    pub fn with_system_fonts(writer: SvgWriter) -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();

        let has_sans = db
            .query(&fontdb::Query {
                families: &[fontdb::Family::SansSerif],
                ..Default::default()
            })
            .is_some();
        if !has_sans {
            let fallback = db
                .faces()
                .next()
                .and_then(|face| face.families.first())
                .map(|(name, _)| name.clone());
            if let Some(name) = fallback {
                log::info!("No default sans-serif font, falling back to '{}'", name);
                db.set_sans_serif_family(name);
            }
        }
        log::info!("Loaded {} font faces for export", db.len());

        Self::with_fontdb(Arc::new(db), writer)
    }

    pub fn with_fontdb(fontdb: Arc<fontdb::Database>, writer: SvgWriter) -> Self {
        Self { fontdb, writer }
    }

    /// Render the stage at `pixel_ratio` device pixels per scene unit.
    pub fn render(&self, stage: &Stage, pixel_ratio: f32) -> Result<RgbaImage, ExportError> {
        if !stage.is_ready() {
            return Err(ExportError::SurfaceUnavailable);
        }
        let ratio = if pixel_ratio.is_finite() {
            pixel_ratio.max(1.0)
        } else {
            1.0
        };

        let (width, height) = stage.size();
        let out_w = ((width as f32) * ratio).round() as u32;
        let out_h = ((height as f32) * ratio).round() as u32;
        if out_w > MAX_DIM || out_h > MAX_DIM {
            return Err(ExportError::Encode(format!(
                "raster size too large: {out_w}x{out_h} (max {MAX_DIM}x{MAX_DIM})"
            )));
        }
        let mut pixmap = Pixmap::new(out_w, out_h).ok_or_else(|| {
            ExportError::Encode(format!("failed to allocate {out_w}x{out_h} pixmap"))
        })?;
        let scale = Transform::from_scale(ratio, ratio);

        if let Some(ref node) = stage.background {
            let image = node
                .image
                .as_ref()
                .ok_or_else(|| ExportError::Decode("background has not been decoded".to_string()))?;
            let size = IntSize::from_wh(image.width(), image.height())
                .ok_or_else(|| ExportError::Decode("background has zero size".to_string()))?;
            let background = Pixmap::from_vec(media::premultiplied_rgba(image), size)
                .ok_or_else(|| {
                    ExportError::Decode("background pixel buffer is invalid".to_string())
                })?;
            let paint = PixmapPaint {
                quality: FilterQuality::Bicubic,
                ..Default::default()
            };
            pixmap.draw_pixmap(0, 0, background.as_ref(), &paint, scale, None);
        }

        if !stage.texts.is_empty() {
            let svg = self.writer.write_document(stage, Layers::LabelsOnly)?;
            let opts = usvg::Options {
                fontdb: Arc::clone(&self.fontdb),
                ..Default::default()
            };
            let tree = usvg::Tree::from_str(&svg, &opts)
                .map_err(|e| ExportError::Serialize(format!("label layer: {e}")))?;
            resvg::render(&tree, scale, &mut pixmap.as_mut());
        }

        let mut rgba = Vec::with_capacity((out_w * out_h * 4) as usize);
        for px in pixmap.pixels() {
            let c = px.demultiply();
            rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        RgbaImage::from_raw(out_w, out_h, rgba)
            .ok_or_else(|| ExportError::Encode("pixel buffer size mismatch".to_string()))
    }

    /// Render and encode as PNG.
    pub fn encode_png(&self, stage: &Stage, pixel_ratio: f32) -> Result<Vec<u8>, ExportError> {
        let pixels = self.render(stage, pixel_ratio)?;
        let png = media::encode_png(&pixels).map_err(|e| ExportError::Encode(format!("{e:#}")))?;
        if png.is_empty() {
            return Err(ExportError::Encode("encoder produced no bytes".to_string()));
        }
        Ok(png)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::media::{decode_image, test_png};
    use crate::models::store::LabelStore;
    use crate::render::stage::ImageNode;

    fn rasterizer() -> Rasterizer {
        Rasterizer::with_fontdb(Arc::new(fontdb::Database::new()), SvgWriter::default())
    }

    #[test]
    fn test_zero_sized_surface_fails() {
        let stage = Stage::new();
        assert_eq!(
            rasterizer().encode_png(&stage, 2.0),
            Err(ExportError::SurfaceUnavailable)
        );
    }

    #[test]
    fn test_output_is_scaled_by_pixel_ratio() {
        let mut stage = Stage::new();
        stage.resize(40, 30);
        let mut store = LabelStore::default();
        store.add_label();
        stage.sync(&store.snapshot(), None);

        let png = rasterizer().encode_png(&stage, 2.0).unwrap();
        let decoded = decode_image(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (80, 60));
    }

    #[test]
    fn test_pixel_ratio_below_one_is_clamped() {
        let mut stage = Stage::new();
        stage.resize(10, 10);
        let pixels = rasterizer().render(&stage, 0.25).unwrap();
        assert_eq!(pixels.dimensions(), (10, 10));
    }

    #[test]
    fn test_background_is_composited_at_natural_size() {
        let mut stage = Stage::new();
        stage.resize(8, 8);
        let image = decode_image(&test_png(4, 4, [255, 0, 0, 255])).unwrap();
        stage.background = Some(ImageNode {
            src: "blob:labelpad/1".to_string(),
            image: Some(Arc::new(image)),
        });

        let pixels = rasterizer().render(&stage, 2.0).unwrap();
        assert_eq!(pixels.dimensions(), (16, 16));
        let px = pixels.get_pixel(2, 2).0;
        assert!(px[0] >= 253 && px[1] <= 2 && px[2] <= 2 && px[3] >= 253, "pixel {px:?}");
        // Outside the 4x4 image (8x8 after scaling) the surface is transparent.
        assert_eq!(pixels.get_pixel(14, 14).0[3], 0);
    }

    #[test]
    fn test_undecoded_background_fails() {
        let mut stage = Stage::new();
        stage.resize(8, 8);
        stage.background = Some(ImageNode {
            src: "blob:labelpad/1".to_string(),
            image: None,
        });
        assert!(matches!(
            rasterizer().render(&stage, 1.0),
            Err(ExportError::Decode(_))
        ));
    }

    #[test]
    fn test_oversized_output_is_rejected() {
        let mut stage = Stage::new();
        stage.resize(10_000, 10);
        assert!(matches!(
            rasterizer().render(&stage, 2.0),
            Err(ExportError::Encode(_))
        ));
    }
}
