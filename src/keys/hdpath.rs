//! BIP-32/BIP-44 derivation path parsing and sibling iteration.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// First hardened child index.
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// One `/`-separated component of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathComponent {
    pub index: u32,
    pub hardened: bool,
}

/// A parsed derivation path such as `m/44'/118'/0'/0/0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HdPath {
    components: Vec<PathComponent>,
}

impl HdPath {
    pub fn components(&self) -> &[PathComponent] {
        &self.components
    }

    /// Copy of this path with one more component appended.
    pub fn child(&self, index: u32, hardened: bool) -> Result<Self> {
        if index >= HARDENED_OFFSET {
            return Err(Error::validation("path", format!("child index {} out of range", index)));
        }
        let mut components = self.components.clone();
        components.push(PathComponent { index, hardened });
        Ok(Self { components })
    }

    /// Convert into the `bip32` crate's path type.
    pub fn to_derivation_path(&self) -> Result<bip32::DerivationPath> {
        self.to_string()
            .parse()
            .map_err(|e| Error::Derivation(format!("path '{}' rejected: {}", self, e)))
    }
}

impl FromStr for HdPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.trim().split('/');
        if parts.next() != Some("m") {
            return Err(Error::validation("path", format!("'{}' must start with 'm/'", s)));
        }

        let mut components = Vec::new();
        for part in parts {
            let (digits, hardened) = match part.strip_suffix('\'').or_else(|| part.strip_suffix('h')) {
                Some(d) => (d, true),
                None => (part, false),
            };
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(Error::validation("path", format!("'{}' has malformed component '{}'", s, part)));
            }
            let index: u32 = digits
                .parse()
                .map_err(|_| Error::validation("path", format!("'{}' component '{}' overflows", s, part)))?;
            if index >= HARDENED_OFFSET {
                return Err(Error::validation(
                    "path",
                    format!("'{}' component '{}' exceeds 2^31-1", s, part),
                ));
            }
            components.push(PathComponent { index, hardened });
        }

        if components.is_empty() {
            return Err(Error::validation("path", format!("'{}' has no components", s)));
        }
        Ok(Self { components })
    }
}

impl fmt::Display for HdPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for c in &self.components {
            write!(f, "/{}", c.index)?;
            if c.hardened {
                write!(f, "'")?;
            }
        }
        Ok(())
    }
}

/// Yields `base`, then `base` with its last component incremented by one,
/// then by two, and so on until the index space is exhausted.
#[derive(Debug, Clone)]
pub struct HdPathIterator {
    base: HdPath,
    next: Option<u32>,
}

impl HdPathIterator {
    /// Parse `path` and start iterating from it.
    pub fn new(path: &str) -> Result<Self> {
        let base: HdPath = path.parse()?;
        Ok(Self::from_path(base))
    }

    pub fn from_path(base: HdPath) -> Self {
        let next = base.components.last().map(|c| c.index);
        Self { base, next }
    }
}

impl Iterator for HdPathIterator {
    type Item = HdPath;

    fn next(&mut self) -> Option<HdPath> {
        let index = self.next?;
        let mut path = self.base.clone();
        if let Some(last) = path.components.last_mut() {
            last.index = index;
        }
        self.next = index.checked_add(1).filter(|i| *i < HARDENED_OFFSET);
        Some(path)
    }
}
