// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! SVG serialization of the render surface.

use super::stage::{Stage, TextNode};
use crate::export::ExportError;
use std::fmt::Write as _;

pub const DEFAULT_FONT_FAMILY: &str = "Arial, Helvetica, sans-serif";

/// Turns a render surface into a vector document.
pub trait VectorSerializer {
    fn serialize(&self, stage: &Stage) -> Result<String, ExportError>;
}

/// Which stage layers end up in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layers {
    All,
    LabelsOnly,
}

/// Default SVG writer. Text is anchored at its top-left corner to match
/// the on-screen canvas.
#[derive(Debug, Clone)]
pub struct SvgWriter {
    pub font_family: String,
}

impl Default for SvgWriter {
    fn default() -> Self {
        Self {
            font_family: DEFAULT_FONT_FAMILY.to_string(),
        }
    }
}

impl SvgWriter {
    pub fn new(font_family: impl Into<String>) -> Self {
        Self {
            font_family: font_family.into(),
        }
    }

    pub fn write_document(&self, stage: &Stage, layers: Layers) -> Result<String, ExportError> {
        let (width, height) = stage.size();
        let mut out = String::new();
        self.write_into(&mut out, stage, width, height, layers)
            .map_err(|e| ExportError::Serialize(e.to_string()))?;
        Ok(out)
    }

    fn write_into(
        &self,
        out: &mut String,
        stage: &Stage,
        width: u32,
        height: u32,
        layers: Layers,
    ) -> std::fmt::Result {
        writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = width,
            h = height
        )?;

        if layers == Layers::All {
            if let Some(ref node) = stage.background {
                let (iw, ih) = node.size().unwrap_or((width, height));
                let href = escape_xml(&node.src);
                writeln!(
                    out,
                    r#"  <image x="0" y="0" width="{iw}" height="{ih}" href="{href}" xlink:href="{href}" preserveAspectRatio="none"/>"#
                )?;
            }
        }

        for text in &stage.texts {
            self.write_text(out, text)?;
        }

        writeln!(out, "</svg>")
    }

    fn write_text(&self, out: &mut String, text: &TextNode) -> std::fmt::Result {
        let fill = text.fill;
        write!(
            out,
            r#"  <text x="{}" y="{}" font-family="{}" font-size="{}" fill="{}""#,
            fmt_num(text.x),
            fmt_num(text.y),
            escape_xml(&self.font_family),
            fmt_num(text.font_size),
            format_args!("#{:02x}{:02x}{:02x}", fill.r, fill.g, fill.b),
        )?;
        if fill.a != 255 {
            write!(out, r#" fill-opacity="{:.3}""#, fill.a as f32 / 255.0)?;
        }
        write!(out, r#" dominant-baseline="text-before-edge" xml:space="preserve">"#)?;
        if text.text.contains('\n') {
            let x = fmt_num(text.x);
            for (line, top) in text.lines() {
                write!(
                    out,
                    r#"<tspan x="{}" y="{}">{}</tspan>"#,
                    x,
                    fmt_num(top),
                    escape_xml(line)
                )?;
            }
        } else {
            out.push_str(&escape_xml(&text.text));
        }
        writeln!(out, "</text>")
    }
}

impl VectorSerializer for SvgWriter {
    fn serialize(&self, stage: &Stage) -> Result<String, ExportError> {
        self.write_document(stage, Layers::All)
    }
}

fn fmt_num(v: f32) -> String {
    if v.fract() == 0.0 && v.abs() < 1e9 {
        format!("{}", v as i64)
    } else {
        format!("{:.2}", v)
    }
}

/// Escape markup characters. Characters XML 1.0 does not allow at all
/// become U+FFFD.
pub fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ if is_xml_char(ch) => out.push(ch),
            _ => out.push(char::REPLACEMENT_CHARACTER),
        }
    }
    out
}

fn is_xml_char(ch: char) -> bool {
    matches!(
        ch,
        '\t' | '\n'
            | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::label::{LabelId, Rgba};
    use crate::render::stage::ImageNode;

    fn stage_with_text(text: &str) -> Stage {
        let mut stage = Stage::new();
        stage.resize(300, 200);
        stage.texts.push(TextNode {
            id: LabelId::from_raw(1),
            text: text.to_string(),
            x: 12.5,
            y: 40.0,
            font_size: 24.0,
            fill: Rgba::rgb(0xe6, 0x00, 0x45),
        });
        stage
    }

    #[test]
    fn test_writes_text_nodes() {
        let svg = SvgWriter::default().serialize(&stage_with_text("hello")).unwrap();
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains(r#"width="300" height="200" viewBox="0 0 300 200""#));
        assert!(svg.contains(r#"x="12.50" y="40""#));
        assert!(svg.contains(r##"fill="#e60045""##));
        assert!(svg.contains(">hello</text>"));
        assert!(!svg.contains("<image"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_escapes_markup_in_text() {
        let svg = SvgWriter::default()
            .serialize(&stage_with_text("a < b & \"c\""))
            .unwrap();
        assert!(svg.contains("a &lt; b &amp; &quot;c&quot;"));
        assert!(usvg::Tree::from_str(&svg, &usvg::Options::default()).is_ok());
    }

    #[test]
    fn test_characters_outside_xml_are_replaced() {
        assert_eq!(escape_xml("a\u{1}b\u{0}c\u{FFFF}"), "a\u{FFFD}b\u{FFFD}c\u{FFFD}");
        assert_eq!(escape_xml("tab\there\r\n"), "tab\there\r\n");

        let svg = SvgWriter::default()
            .serialize(&stage_with_text("gate\u{1}\u{1b}[0m"))
            .unwrap();
        assert!(!svg.contains('\u{1}'));
        assert!(!svg.contains('\u{1b}'));
        assert!(usvg::Tree::from_str(&svg, &usvg::Options::default()).is_ok());
    }

    #[test]
    fn test_multiline_text_writes_one_tspan_per_line() {
        let svg = SvgWriter::default()
            .serialize(&stage_with_text("Gate\nNorth"))
            .unwrap();
        assert!(svg.contains(concat!(
            r#"<tspan x="12.50" y="40">Gate</tspan>"#,
            r#"<tspan x="12.50" y="68.80">North</tspan></text>"#
        )));
        assert!(usvg::Tree::from_str(&svg, &usvg::Options::default()).is_ok());

        // Single-line text stays a bare text node
        let single = SvgWriter::default().serialize(&stage_with_text("Gate")).unwrap();
        assert!(!single.contains("<tspan"));
    }

    #[test]
    fn test_background_layer_selection() {
        let mut stage = stage_with_text("x");
        stage.background = Some(ImageNode {
            src: "data:image/png;base64,AAAA".to_string(),
            image: None,
        });

        let writer = SvgWriter::default();
        let all = writer.write_document(&stage, Layers::All).unwrap();
        assert!(all.contains(r#"href="data:image/png;base64,AAAA""#));
        assert!(all.find("<image").unwrap() < all.find("<text").unwrap());

        let labels = writer.write_document(&stage, Layers::LabelsOnly).unwrap();
        assert!(!labels.contains("<image"));
    }
}
