//! Resource identity derivation.
//!
//! An embedded resource is known by a normalized path such as `/image3.jpg`.
//! The path comes from whichever metadata hint the document parser had at
//! hand, so a later lookup with the same hints lands on the same entry.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Scheme prefix some parsers put in front of embedded paths.
pub const EMBEDDED_SCHEME: &str = "embedded:";

/// Prefix of identities synthesized for resources without any hint.
pub const SYNTHETIC_PREFIX: &str = "/__unknown_";

/// Normalized path identifying one embedded resource within one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceIdentity(String);

impl ResourceIdentity {
    /// Normalize a raw path hint.
    ///
    /// Strips a leading `embedded:` scheme and forces a leading `/`.
    pub fn normalize(raw: &str) -> Self {
        let trimmed = raw.trim();
        let path = trimmed.strip_prefix(EMBEDDED_SCHEME).unwrap_or(trimmed);
        if path.starts_with('/') {
            Self(path.to_string())
        } else {
            Self(format!("/{}", path))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this identity was synthesized rather than derived from a hint.
    pub fn is_synthetic(&self) -> bool {
        self.0.starts_with(SYNTHETIC_PREFIX)
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Metadata hints available when a resource is discovered, in preference order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceHints {
    /// Final resolved embedded path (e.g. `embedded:/word/media/image1.png`)
    pub final_path: Option<String>,
    /// Raw embedded path as recorded by the container
    pub embedded_path: Option<String>,
    /// Generic resource or file name
    pub resource_name: Option<String>,
}

impl ResourceHints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn final_path(mut self, path: impl Into<String>) -> Self {
        self.final_path = Some(path.into());
        self
    }

    pub fn embedded_path(mut self, path: impl Into<String>) -> Self {
        self.embedded_path = Some(path.into());
        self
    }

    pub fn resource_name(mut self, name: impl Into<String>) -> Self {
        self.resource_name = Some(name.into());
        self
    }

    /// First hint that is present and not blank.
    pub fn preferred(&self) -> Option<&str> {
        [&self.final_path, &self.embedded_path, &self.resource_name]
            .into_iter()
            .filter_map(|hint| hint.as_deref())
            .find(|hint| !hint.trim().is_empty())
    }
}

/// Derives identities for one document session.
///
/// Hinted resources always resolve to the same identity. Unhinted ones get
/// a fresh synthetic identity from a per-session counter, so they are never
/// dropped and never collide with each other.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    next_synthetic: AtomicU64,
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, hints: &ResourceHints) -> ResourceIdentity {
        match hints.preferred() {
            Some(hint) => ResourceIdentity::normalize(hint),
            None => {
                let n = self.next_synthetic.fetch_add(1, Ordering::Relaxed);
                ResourceIdentity(format!("{}{}", SYNTHETIC_PREFIX, n))
            }
        }
    }
}
