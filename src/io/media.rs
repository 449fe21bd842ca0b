// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Background image loading and re-encoding.
//!
//! This module handles reading image files handed in by the file intake,
//! decoding them to RGBA, and producing the self-contained PNG data URLs
//! embedded by the vector export.

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

/// File extensions accepted by the file intake.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// A fully decoded background image.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub rgba: RgbaImage,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.rgba.width()
    }

    pub fn height(&self) -> u32 {
        self.rgba.height()
    }
}

/// Image bytes plus their decoded form, ready to become a background.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub name: String,
    pub bytes: Arc<[u8]>,
    pub mime: &'static str,
    pub image: Arc<DecodedImage>,
}

/// Check the extension of a candidate file against the accepted formats.
pub fn is_supported_path(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn mime_for(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Gif => Some("image/gif"),
        ImageFormat::WebP => Some("image/webp"),
        _ => None,
    }
}

/// Sniff the format of `bytes`, rejecting anything outside the accepted set.
pub fn sniff_mime(bytes: &[u8]) -> Result<&'static str> {
    let format = image::guess_format(bytes).context("unrecognized image data")?;
    mime_for(format).ok_or_else(|| anyhow!("unsupported image format: {:?}", format))
}

/// Decode image bytes into RGBA8.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage> {
    let format = image::guess_format(bytes).context("unrecognized image data")?;
    let dyn_img =
        image::load_from_memory_with_format(bytes, format).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        bail!("image has zero size");
    }
    Ok(DecodedImage { rgba })
}

/// Decode bytes already in memory (e.g. from a drop event).
pub fn load_image_bytes(name: impl Into<String>, bytes: Arc<[u8]>) -> Result<LoadedImage> {
    let name = name.into();
    let mime = sniff_mime(&bytes).with_context(|| format!("reading '{name}'"))?;
    let image = decode_image(&bytes).with_context(|| format!("decoding '{name}'"))?;
    Ok(LoadedImage {
        name,
        bytes,
        mime,
        image: Arc::new(image),
    })
}

/// Read and decode an image file.
pub fn load_image(path: &Path) -> Result<LoadedImage> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("read image bytes from '{}'", path.display()))?;
    load_image_bytes(path.display().to_string(), Arc::from(bytes))
}

/// Encode RGBA pixels as PNG.
pub fn encode_png(rgba: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    rgba.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}

/// Re-encode an image as a self-contained `data:image/png;base64,...` URL.
pub fn png_data_url(image: &DecodedImage) -> Result<String> {
    let png = encode_png(&image.rgba)?;
    Ok(format!(
        "data:image/png;base64,{}",
        BASE64_STANDARD.encode(png)
    ))
}

/// RGBA8 with color channels multiplied by alpha, as raster targets expect.
pub fn premultiplied_rgba(image: &DecodedImage) -> Vec<u8> {
    let mut rgba = image.rgba.as_raw().clone();
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
    rgba
}

#[cfg(test)]
pub(crate) fn test_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    encode_png(&img).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_png_dimensions() {
        let bytes = test_png(3, 2, [10, 20, 30, 255]);
        let decoded = decode_image(&bytes).unwrap();
        assert_eq!(decoded.width(), 3);
        assert_eq!(decoded.height(), 2);
        assert_eq!(decoded.rgba.get_pixel(2, 1).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_image(b"definitely not an image").is_err());
        assert!(load_image_bytes("junk.png", Arc::from(b"junk".to_vec())).is_err());
    }

    #[test]
    fn test_sniffed_mime() {
        let bytes = test_png(1, 1, [0, 0, 0, 255]);
        assert_eq!(sniff_mime(&bytes).unwrap(), "image/png");
        let loaded = load_image_bytes("a.png", Arc::from(bytes)).unwrap();
        assert_eq!(loaded.mime, "image/png");
    }

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_path(Path::new("photo.JPG")));
        assert!(is_supported_path(Path::new("a/b/c.webp")));
        assert!(!is_supported_path(Path::new("notes.txt")));
        assert!(!is_supported_path(Path::new("no_extension")));
    }

    #[test]
    fn test_data_url_roundtrips_pixels() {
        let decoded = decode_image(&test_png(2, 2, [200, 100, 50, 255])).unwrap();
        let url = png_data_url(&decoded).unwrap();
        let payload = url.strip_prefix("data:image/png;base64,").unwrap();
        let png = BASE64_STANDARD.decode(payload).unwrap();
        assert_eq!(decode_image(&png).unwrap(), decoded);
    }

    #[test]
    fn test_premultiply() {
        let decoded = DecodedImage {
            rgba: RgbaImage::from_raw(2, 1, vec![100, 50, 200, 128, 9, 9, 9, 0]).unwrap(),
        };
        assert_eq!(
            premultiplied_rgba(&decoded),
            vec![
                ((100u16 * 128 + 127) / 255) as u8,
                ((50u16 * 128 + 127) / 255) as u8,
                ((200u16 * 128 + 127) / 255) as u8,
                128,
                0,
                0,
                0,
                0
            ]
        );
    }
}
