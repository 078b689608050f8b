//! File-backed persona store: one pretty-printed JSON document on disk.
//!
//! Storage location defaults to `chat-backend/persona_data.json` relative to
//! the working directory.
//!
//! Reads never fail on content: a missing file, invalid JSON, or a JSON
//! value that is not an object all yield the default persona. Writes go
//! through a temporary file and a rename so a crash can not leave a
//! half-written document behind.
//!
//! Read-merge-write cycles are serialized by a single writer lock, so two
//! concurrent updates can not lose each other's fields.

use folio_core::error::PersonaError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::document::Persona;

pub struct PersonaStore {
    path: PathBuf,
    writer: Mutex<()>,
}

impl PersonaStore {
    /// Create a store for the document at `path`. Nothing is touched on disk
    /// until the first read or write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current persona, falling back to defaults when the file is
    /// absent or unusable. Only genuine I/O failures are errors.
    pub async fn read(&self) -> Result<Persona, PersonaError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Persona file not found, using defaults");
                return Ok(Persona::default());
            }
            Err(e) => {
                return Err(PersonaError::Storage(format!(
                    "Failed to read persona file {}: {e}",
                    self.path.display()
                )));
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(value) => Ok(Persona::from_value(value).unwrap_or_else(|| {
                warn!(path = %self.path.display(), "Persona file is not a JSON object, using defaults");
                Persona::default()
            })),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Persona file is corrupted, using defaults");
                Ok(Persona::default())
            }
        }
    }

    /// Replace the stored persona.
    pub async fn write(&self, persona: &Persona) -> Result<(), PersonaError> {
        let _guard = self.writer.lock().await;
        self.flush(persona).await
    }

    /// Create the file with default values if it does not exist yet.
    /// Returns `true` when a file was created.
    pub async fn ensure_exists(&self) -> Result<bool, PersonaError> {
        let _guard = self.writer.lock().await;
        let exists = tokio::fs::try_exists(&self.path).await.map_err(|e| {
            PersonaError::Storage(format!(
                "Failed to check persona file {}: {e}",
                self.path.display()
            ))
        })?;
        if exists {
            return Ok(false);
        }
        self.flush(&Persona::default()).await?;
        info!(path = %self.path.display(), "Created persona file with default values");
        Ok(true)
    }

    /// Deep-merge `suggestion` into the stored persona and persist the
    /// result. The whole read-merge-write cycle holds the writer lock.
    pub async fn apply_update(&self, suggestion: Map<String, Value>) -> Result<Persona, PersonaError> {
        let _guard = self.writer.lock().await;
        let mut persona = self.read().await?;
        persona.merge(suggestion);
        self.flush(&persona).await?;
        info!(
            path = %self.path.display(),
            fields = persona.fields().len(),
            "Persona updated"
        );
        Ok(persona)
    }

    /// Serialize with 4-space indentation and atomically swap the file in.
    /// Callers must hold the writer lock.
    async fn flush(&self, persona: &Persona) -> Result<(), PersonaError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                PersonaError::Storage(format!("Failed to create persona directory: {e}"))
            })?;
        }

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        persona.serialize(&mut ser).map_err(|e| {
            PersonaError::Storage(format!("Failed to serialize persona: {e}"))
        })?;

        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, &buf).await.map_err(|e| {
            PersonaError::Storage(format!("Failed to write persona file: {e}"))
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            PersonaError::Storage(format!("Failed to replace persona file: {e}"))
        })?;

        debug!(path = %self.path.display(), bytes = buf.len(), "Persona flushed");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "persona".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
