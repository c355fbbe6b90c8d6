//! Header resolution: normalization, remapping and key interning.
//!
//! The header decides which row positions are emitted and under which key.
//! It is resolved once per session, either from the first logical record of
//! the input or from caller-supplied keys.

use crate::config::Config;
use crate::error::{CsvError, Result};
use crate::value::Key;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Resolved header for one parse session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    /// Emitted keys, unique, in header order.
    keys: Vec<Key>,
    /// For every input position, the index into `keys` it feeds, if any.
    slots: Vec<Option<usize>>,
    /// Field count of the header line read from the input.
    file_width: Option<usize>,
}

impl Header {
    /// Resolve the header from the file header fields (if one was read) and
    /// the configuration.
    ///
    /// Caller-supplied keys win over the file header and are used verbatim,
    /// but must match its width. Remapping only applies to file headers.
    pub fn resolve(config: &Config, file_fields: Option<Vec<String>>) -> Result<Self> {
        let user = config.user_headers.as_ref().filter(|h| !h.is_empty());
        if file_fields.is_none() && user.is_none() && !config.parse_to_arrays {
            return Err(CsvError::IncorrectOption(
                "headers_in_file is disabled, so user headers or array parsing are required"
                    .to_string(),
            ));
        }

        let file_width = file_fields.as_ref().map(Vec::len);
        let names: Vec<Option<String>> = match user {
            Some(user) => {
                if let Some(in_file) = file_width {
                    if in_file != user.len() {
                        tracing::warn!(
                            provided = user.len(),
                            in_file,
                            "user-provided headers do not match the file header"
                        );
                        return Err(CsvError::HeaderSizeMismatch {
                            provided: user.len(),
                            in_file,
                        });
                    }
                }
                user.iter().cloned().map(Some).collect()
            }
            None => remap_keys(file_fields.unwrap_or_default(), config),
        };

        let as_text = config.keys_as_text();
        let mut interned: FxHashMap<String, usize> = FxHashMap::default();
        let mut keys = Vec::with_capacity(names.len());
        let slots = names
            .into_iter()
            .map(|name| {
                let name = name.filter(|n| !n.is_empty())?;
                if let Some(&idx) = interned.get(&name) {
                    return Some(idx);
                }
                let idx = keys.len();
                keys.push(if as_text {
                    Key::Text(name.clone())
                } else {
                    Key::Symbol(Arc::from(name.as_str()))
                });
                interned.insert(name, idx);
                Some(idx)
            })
            .collect();

        Ok(Self {
            keys,
            slots,
            file_width,
        })
    }

    /// Emitted keys in header order.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Target key index for an input position.
    #[inline]
    pub fn slot(&self, position: usize) -> Option<usize> {
        self.slots.get(position).copied().flatten()
    }

    /// Number of input positions the header covers.
    pub fn width(&self) -> usize {
        self.slots.len()
    }

    pub fn file_width(&self) -> Option<usize> {
        self.file_width
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Normalize raw header fields split from the header line.
///
/// Quote characters are removed, whitespace trimmed when enabled, runs of
/// whitespace or hyphens collapsed to `_` and case lowered when enabled. The
/// last two steps are skipped when original headers are kept.
pub fn normalize_fields(fields: Vec<String>, config: &Config) -> Vec<String> {
    let quote = config.quote as char;
    fields
        .into_iter()
        .map(|field| {
            let mut field: String = field.chars().filter(|&c| c != quote).collect();
            if config.strip_whitespace {
                field = field.trim().to_string();
            }
            if !config.keep_original_headers {
                field = collapse_separators(&field);
                if config.downcase_header {
                    field = field.to_lowercase();
                }
            }
            field
        })
        .collect()
}

/// Replace every run of whitespace, and every run of hyphens, with `_`.
pub fn collapse_separators(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut run: Option<bool> = None;
    for c in s.chars() {
        let class = if c.is_whitespace() {
            Some(true)
        } else if c == '-' {
            Some(false)
        } else {
            None
        };
        match class {
            Some(kind) if run == Some(kind) => {}
            Some(_) => out.push('_'),
            None => out.push(c),
        }
        run = class;
    }
    out
}

/// Apply the key mapping table. `None` marks a removed position.
fn remap_keys(names: Vec<String>, config: &Config) -> Vec<Option<String>> {
    let Some(mapping) = config.key_mapping.as_ref().filter(|m| !m.is_empty()) else {
        return names.into_iter().map(Some).collect();
    };
    names
        .into_iter()
        .map(|name| match mapping.get(&name) {
            Some(Some(target)) if !target.is_empty() => Some(target.clone()),
            Some(_) => None,
            None if config.remove_unmapped_keys => None,
            None => Some(name),
        })
        .collect()
}
