//! Host-side lookup table of discovered natives.
//!
//! Maps base names to what the export table said about them. The table is a
//! cache owned by the host: it has no invalidation policy and is rebuilt
//! whenever the host re-enumerates its exports.

use std::collections::btree_map::{BTreeMap, Entry};

use amx_sig::Signature;
use log::{debug, warn};
use thiserror::Error;

use crate::decoder::decode;
use crate::error::{Mismatch, ParseError};
use crate::validate::compare;

/// One registered export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeEntry {
    /// Export carrying a decoded signature.
    Mangled { export: String, signature: Signature },
    /// Plain export with no `@`; nothing can be checked about it.
    Unmangled { export: String },
}

impl NativeEntry {
    pub fn export(&self) -> &str {
        match self {
            NativeEntry::Mangled { export, .. } | NativeEntry::Unmangled { export } => export,
        }
    }

    pub fn signature(&self) -> Option<&Signature> {
        match self {
            NativeEntry::Mangled { signature, .. } => Some(signature),
            NativeEntry::Unmangled { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("export '{export}' cannot be decoded: {source}")]
    Undecodable {
        export: String,
        #[source]
        source: ParseError,
    },

    #[error("'{base_name}' is already registered as '{existing}'; cannot add '{incoming}'")]
    Conflict {
        base_name: String,
        existing: String,
        incoming: String,
    },

    #[error("no native named '{0}'")]
    NotFound(String),

    #[error("'{export}' does not match the expected signature: {source}")]
    Mismatch {
        export: String,
        #[source]
        source: Mismatch,
    },
}

/// Registry mapping base name → export.
#[derive(Debug, Default)]
pub struct NativeTable {
    natives: BTreeMap<String, NativeEntry>,
}

impl NativeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an export name as found in the host's export table.
    ///
    /// Names without `@` are kept as unmangled entries. Registering the same
    /// export twice is a no-op; a different export for an already-registered
    /// base name is a conflict.
    pub fn register(&mut self, export: &str) -> Result<&NativeEntry, TableError> {
        if !export.contains('@') {
            return self.register_unmangled(export);
        }
        let signature = decode(export).map_err(|source| TableError::Undecodable {
            export: export.to_string(),
            source,
        })?;
        let base_name = signature.base_name().to_string();
        self.insert(
            base_name,
            NativeEntry::Mangled {
                export: export.to_string(),
                signature,
            },
        )
    }

    /// Register a plain export that carries no signature.
    pub fn register_unmangled(&mut self, name: &str) -> Result<&NativeEntry, TableError> {
        self.insert(
            name.to_string(),
            NativeEntry::Unmangled {
                export: name.to_string(),
            },
        )
    }

    fn insert(&mut self, base_name: String, entry: NativeEntry) -> Result<&NativeEntry, TableError> {
        match self.natives.entry(base_name) {
            Entry::Occupied(slot) => {
                if slot.get().export() == entry.export() {
                    let existing: &NativeEntry = slot.into_mut();
                    return Ok(existing);
                }
                Err(TableError::Conflict {
                    base_name: slot.key().clone(),
                    existing: slot.get().export().to_string(),
                    incoming: entry.export().to_string(),
                })
            }
            Entry::Vacant(slot) => {
                debug!("registered native '{}' from '{}'", slot.key(), entry.export());
                let inserted: &NativeEntry = slot.insert(entry);
                Ok(inserted)
            }
        }
    }

    /// Look up a native by base name.
    pub fn lookup(&self, base_name: &str) -> Option<&NativeEntry> {
        self.natives.get(base_name)
    }

    /// Find the export for `expected` and check it.
    ///
    /// Unmangled exports resolve with a warning since there is no signature
    /// to check them against.
    pub fn resolve(&self, expected: &Signature) -> Result<&NativeEntry, TableError> {
        let entry = self
            .lookup(expected.base_name())
            .ok_or_else(|| TableError::NotFound(expected.base_name().to_string()))?;
        match entry {
            NativeEntry::Unmangled { export } => {
                warn!("native '{export}' is not mangled; binding without a signature check");
            }
            NativeEntry::Mangled { export, signature } => {
                compare(expected, signature).map_err(|source| TableError::Mismatch {
                    export: export.clone(),
                    source,
                })?;
            }
        }
        Ok(entry)
    }

    pub fn len(&self) -> usize {
        self.natives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.natives.is_empty()
    }

    /// Entries in base-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &NativeEntry)> {
        self.natives.iter().map(|(name, entry)| (name.as_str(), entry))
    }
}
