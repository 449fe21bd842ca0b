// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Session-scoped image sources.
//!
//! Background images are addressed by transient object URLs that only mean
//! something inside the running session. The registry owns the bytes behind
//! each URL until it is revoked.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

const SCHEME_PREFIX: &str = "blob:labelpad/";

/// Transient reference to user-supplied image bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn for_tests(url: &str) -> Self {
        Self(url.to_string())
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bytes held behind an object URL.
#[derive(Debug, Clone)]
pub struct SourceEntry {
    pub bytes: Arc<[u8]>,
    pub mime: &'static str,
}

/// Issues, resolves and revokes object URLs.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    entries: HashMap<ObjectUrl, SourceEntry>,
    issued: u64,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bytes under a fresh URL. URLs are never reused.
    pub fn create(&mut self, bytes: Arc<[u8]>, mime: &'static str) -> ObjectUrl {
        self.issued += 1;
        let url = ObjectUrl(format!("{SCHEME_PREFIX}{}", self.issued));
        log::debug!("Created {} ({} bytes, {})", url, bytes.len(), mime);
        self.entries.insert(url.clone(), SourceEntry { bytes, mime });
        url
    }

    #[cfg(test)]
    pub fn resolve(&self, url: &ObjectUrl) -> Option<&SourceEntry> {
        self.entries.get(url)
    }

    /// Look up by raw string, as stored on a render node.
    pub fn resolve_str(&self, url: &str) -> Option<&SourceEntry> {
        self.entries.get(&ObjectUrl(url.to_string()))
    }

    /// Release the bytes behind `url`. Revoking twice is harmless.
    pub fn revoke(&mut self, url: &ObjectUrl) -> bool {
        let removed = self.entries.remove(url).is_some();
        if removed {
            log::debug!("Revoked {}", url);
        }
        removed
    }

    pub fn revoke_all(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    pub fn live_count(&self) -> usize {
        self.entries.len()
    }
}
