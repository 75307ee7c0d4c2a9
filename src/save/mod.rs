//! Save documents and their text encoding.
//!
//! A save is a JSON document (see [`SaveSimulation`]). On disk or in a share
//! link it is either plain pretty-printed JSON or the compact JSON compressed
//! with lz-string into URI-safe text. Loading accepts both: text that does
//! not start with `{` is taken to be compressed.
//!
//! # Example
//!
//! ```text
//! {
//!   "version": 1,
//!   "worldWidth": 1000.0,
//!   "worldHeight": 1000.0,
//!   "circuits": {
//!     "1": { "x": 40.0, "y": 40.0, "type": "switch", "toggle": true },
//!     "2": { "x": 120.0, "y": 40.0, "type": "led", "color": "red" }
//!   },
//!   "connections": [[1, "Q", 2, "I"]]
//! }
//! ```

mod format;

pub use format::{SaveCircuit, SaveConnection, SaveSimulation};
pub(crate) use format::{from_fields, from_state, to_fields};

use std::path::Path;

use crate::error::{Result, SimError};

/// Newest save format version this build reads and the one it writes.
pub const SAVE_VERSION: u32 = 1;

/// How a save is written.
#[derive(Debug, Clone, Copy)]
pub struct SaveOptions {
    /// Include runtime state (latched values, tick counter)
    pub include_state: bool,
    /// Try lz-string compression
    pub compress: bool,
    /// Keep the compressed form even when it is larger
    pub force_compression: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            include_state: false,
            compress: true,
            force_compression: false,
        }
    }
}

impl SaveOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(mut self, include_state: bool) -> Self {
        self.include_state = include_state;
        self
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn with_forced_compression(mut self, force: bool) -> Self {
        self.force_compression = force;
        self
    }
}

/// Encode a save document as text.
///
/// Compressed output is used only if it is no longer than the compact JSON,
/// unless compression is forced.
pub fn serialize_save(save: &SaveSimulation, options: &SaveOptions) -> Result<String> {
    if !options.compress {
        return Ok(serde_json::to_string_pretty(save)?);
    }

    let json = serde_json::to_string(save)?;
    let compressed = lz_str::compress_to_encoded_uri_component(json.as_str());
    log::debug!(
        "Save compressed to {}% ({} -> {} chars)",
        compression_ratio(json.len(), compressed.len()),
        json.len(),
        compressed.len()
    );
    if options.force_compression || compressed.len() <= json.len() {
        Ok(compressed)
    } else {
        Ok(json)
    }
}

/// Decode save text, compressed or plain.
pub fn deserialize_save(text: &str) -> Result<SaveSimulation> {
    let text = text.trim();
    if text.starts_with('{') {
        return Ok(serde_json::from_str(text)?);
    }
    let wide = lz_str::decompress_from_encoded_uri_component(text).ok_or(SimError::Decompression)?;
    let json = String::from_utf16(&wide).map_err(|_| SimError::Decompression)?;
    Ok(serde_json::from_str(&json)?)
}

/// Percent of compressed size versus raw size.
fn compression_ratio(raw: usize, compressed: usize) -> usize {
    if raw == 0 {
        return 100;
    }
    (compressed * 100 + raw / 2) / raw
}

/// Read and decode a save file.
pub fn read_file(path: &Path) -> Result<SaveSimulation> {
    let text = std::fs::read_to_string(path).map_err(|e| SimError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    deserialize_save(&text)
}

/// Encode and write a save file.
pub fn write_file(path: &Path, save: &SaveSimulation, options: &SaveOptions) -> Result<()> {
    let text = serialize_save(save, options)?;
    std::fs::write(path, text).map_err(|e| SimError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}
