// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Bulk text replacement.
//!
//! A replacement mapping arrives as untyped JSON text from the side panel.
//! It is validated into a [`ReplacementMap`] here, before it can reach the
//! store, so a malformed payload never causes a partial rewrite.

use crate::models::label::Label;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Rejected bulk-replace input.
#[derive(Debug, Error)]
pub enum ReplaceError {
    #[error("replacement mapping is empty")]
    Empty,

    #[error("replacement mapping must be a JSON object of strings: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Validated text-to-text mapping, keyed by exact label text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementMap {
    entries: HashMap<String, String>,
}

impl ReplacementMap {
    /// Parse a JSON object whose values are all strings.
    pub fn parse(input: &str) -> Result<Self, ReplaceError> {
        if input.trim().is_empty() {
            return Err(ReplaceError::Empty);
        }
        let entries: HashMap<String, String> = serde_json::from_str(input)?;
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, text: &str) -> Option<&str> {
        self.entries.get(text).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ReplacementMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Rewrite every label whose current text is a key in `map`.
///
/// Lookups always use the text a label had before the pass, so replacements
/// never chain. Untouched labels keep their allocation. Returns the new
/// collection and the number of labels rewritten.
pub fn rewrite_labels(labels: &[Arc<Label>], map: &ReplacementMap) -> (Vec<Arc<Label>>, usize) {
    let mut replaced = 0;
    let rewritten = labels
        .iter()
        .map(|label| match map.get(&label.text) {
            Some(text) if text != label.text => {
                replaced += 1;
                let mut updated = Label::clone(label);
                updated.text = text.to_string();
                Arc::new(updated)
            }
            _ => Arc::clone(label),
        })
        .collect();
    (rewritten, replaced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::label::{LabelId, Rgba};

    fn label(id: u64, text: &str) -> Arc<Label> {
        Arc::new(Label {
            id: LabelId::from_raw(id),
            text: text.to_string(),
            x: 0.0,
            y: 0.0,
            font_size: 24.0,
            fill: Rgba::rgb(0, 0, 0),
        })
    }

    fn texts(labels: &[Arc<Label>]) -> Vec<&str> {
        labels.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_exact_match_only() {
        let labels = vec![label(1, "label1"), label(2, "other"), label(3, "label10")];
        let map: ReplacementMap = [("label1", "α")].into_iter().collect();

        let (out, count) = rewrite_labels(&labels, &map);
        assert_eq!(texts(&out), vec!["α", "other", "label10"]);
        assert_eq!(count, 1);
        assert!(Arc::ptr_eq(&labels[1], &out[1]));

        let (again, count) = rewrite_labels(&out, &map);
        assert_eq!(texts(&again), vec!["α", "other", "label10"]);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_replacements_do_not_chain() {
        let labels = vec![label(1, "a"), label(2, "b")];
        let map: ReplacementMap = [("a", "b"), ("b", "c")].into_iter().collect();

        let (out, count) = rewrite_labels(&labels, &map);
        assert_eq!(texts(&out), vec!["b", "c"]);
        assert_eq!(count, 2);
    }

    #[test]
    fn test_parse_valid_mapping() {
        let map = ReplacementMap::parse(r#"{"label1": "Entrance", "label2": ""}"#).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("label1"), Some("Entrance"));
        assert_eq!(map.get("label2"), Some(""));
        assert_eq!(map.get("label3"), None);
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        assert!(matches!(ReplacementMap::parse(""), Err(ReplaceError::Empty)));
        assert!(matches!(ReplacementMap::parse("   "), Err(ReplaceError::Empty)));
        assert!(matches!(
            ReplacementMap::parse("{not json"),
            Err(ReplaceError::Malformed(_))
        ));
        assert!(matches!(
            ReplacementMap::parse(r#"["label1", "x"]"#),
            Err(ReplaceError::Malformed(_))
        ));
        assert!(matches!(
            ReplacementMap::parse(r#"{"label1": 5}"#),
            Err(ReplaceError::Malformed(_))
        ));
    }

    #[test]
    fn test_error_message_is_user_facing() {
        let err = ReplacementMap::parse("{").unwrap_err();
        assert!(err.to_string().starts_with("replacement mapping must be a JSON object"));
    }
}
