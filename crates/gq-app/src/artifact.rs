use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageFormat;

/// Opaque image payload returned by the backend. Cheap to clone.
#[derive(Clone, PartialEq, Eq)]
pub struct Artifact {
    bytes: Arc<[u8]>,
}

impl Artifact {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes: bytes.into() }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Sniffed from the magic bytes; `None` when the payload is not a known image
    pub fn format(&self) -> Option<ImageFormat> {
        image::guess_format(&self.bytes).ok()
    }

    pub fn extension(&self) -> &'static str {
        self.format()
            .and_then(|format| format.extensions_str().first().copied())
            .unwrap_or("png")
    }

    pub fn save(&self, dir: &Path, file_stem: &str) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{file_stem}.{}", self.extension()));
        std::fs::write(&path, &*self.bytes)?;
        Ok(path)
    }
}

impl std::fmt::Debug for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Artifact")
            .field("len", &self.bytes.len())
            .field("format", &self.format())
            .finish()
    }
}

/// File stem used when downloading a result: `{seed}-{prompt}`
pub fn export_file_stem(seed: i64, prompt: &str) -> String {
    let prompt: String = prompt
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{seed}-{}", prompt.trim())
}
