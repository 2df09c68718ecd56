use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{DocumentError, Result};
use crate::manager::PathManager;
use crate::path::Path;

use super::template::TemplateRegistry;

/// Newest document layout this crate reads and writes.
pub const DOCUMENT_VERSION: u32 = 1;

fn current_version() -> u32 {
    DOCUMENT_VERSION
}

/// Descriptive header of a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageMetadata {
    pub name: String,
    #[serde(default = "current_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl StageMetadata {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: DOCUMENT_VERSION,
            author: None,
            description: None,
        }
    }
}

/// A scrolling backdrop layer. Carried through untouched for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundLayer {
    pub image: String,
    /// Scroll speed relative to stage progress.
    #[serde(default = "default_scroll_factor")]
    pub scroll_factor: f64,
    #[serde(default)]
    pub depth: i32,
}

fn default_scroll_factor() -> f64 {
    1.0
}

/// Persisted form of a stage: metadata, backdrop layers and paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDocument {
    pub metadata: StageMetadata,
    #[serde(default)]
    pub background_layers: Vec<BackgroundLayer>,
    #[serde(default)]
    pub paths: Vec<Path>,
}

impl StageDocument {
    #[must_use]
    pub fn new(metadata: StageMetadata) -> Self {
        Self {
            metadata,
            background_layers: Vec::new(),
            paths: Vec::new(),
        }
    }

    /// Snapshot of a manager's paths under the given header.
    #[must_use]
    pub fn from_manager(
        metadata: StageMetadata,
        background_layers: Vec<BackgroundLayer>,
        manager: &PathManager,
    ) -> Self {
        Self {
            metadata,
            background_layers,
            paths: manager.to_paths(),
        }
    }

    /// Encodes the document as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> std::result::Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decodes a document, rejecting versions newer than [`DOCUMENT_VERSION`].
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the version is unsupported.
    pub fn from_json(json: &str) -> std::result::Result<Self, DocumentError> {
        let doc: Self = serde_json::from_str(json)?;
        if doc.metadata.version > DOCUMENT_VERSION {
            return Err(DocumentError::UnsupportedVersion {
                found: doc.metadata.version,
                supported: DOCUMENT_VERSION,
            });
        }
        Ok(doc)
    }

    /// Decodes and validates a document against `registry`.
    ///
    /// Nothing is returned unless every creation node names a registered
    /// template. Inverted activation windows are reported but kept as authored.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails or a template is unknown.
    pub fn load(json: &str, registry: &TemplateRegistry) -> Result<Self> {
        let doc = Self::from_json(json)?;
        doc.validate(registry)?;
        debug!(
            stage = %doc.metadata.name,
            paths = doc.paths.len(),
            layers = doc.background_layers.len(),
            "stage document loaded"
        );
        Ok(doc)
    }

    /// Checks templates and reports inverted activation windows.
    ///
    /// # Errors
    ///
    /// Returns an error if a creation node names an unknown template.
    pub fn validate(&self, registry: &TemplateRegistry) -> Result<()> {
        registry.validate(&self.paths)?;
        for path in self.paths.iter().filter(|p| p.has_inverted_window()) {
            warn!(
                path = %path.name,
                activation = path.activation_progress,
                deactivation = path.deactivation_progress,
                "activation window is inverted; path will never activate"
            );
        }
        Ok(())
    }

    /// Moves the paths into a fresh manager, returning it with the remaining parts.
    #[must_use]
    pub fn into_manager(self) -> (StageMetadata, Vec<BackgroundLayer>, PathManager) {
        (
            self.metadata,
            self.background_layers,
            PathManager::from_paths(self.paths),
        )
    }
}
