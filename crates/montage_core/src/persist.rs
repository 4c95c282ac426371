use crate::error::Result;
use crate::types::Timeline;
use std::path::{Path, PathBuf};

/// File extension for persisted edit sessions.
pub const SESSION_EXTENSION: &str = "montage";

impl Timeline {
    /// Save the timeline to a file as pretty-printed JSON.
    /// Automatically appends the `.montage` extension if not present.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = ensure_extension(path.as_ref());
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a timeline from a JSON session file.
    ///
    /// Unknown fields are ignored for forward compatibility; the structural
    /// invariants are re-validated during deserialization.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Timeline> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let timeline: Timeline = serde_json::from_str(&data)?;
        Ok(timeline)
    }
}

fn ensure_extension(path: &Path) -> PathBuf {
    if path.extension().and_then(|e| e.to_str()) == Some(SESSION_EXTENSION) {
        path.to_path_buf()
    } else {
        let mut p = path.to_path_buf();
        let mut name = p.file_name().unwrap_or_default().to_os_string();
        name.push(".");
        name.push(SESSION_EXTENSION);
        p.set_file_name(name);
        p
    }
}
