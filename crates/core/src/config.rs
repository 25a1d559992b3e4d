//! Runtime configuration shared by every document a script creates.

use crate::DocumentError;
use ets_types::ScaledPoint;
use serde::Deserialize;
use std::path::Path;

/// Settings threaded from the runner into each [`crate::Document`].
///
/// Every field has a default, so an empty JSON object is a valid
/// configuration. Distances are literals such as `"210mm"` or whole
/// numbers of scaled points.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct EtsConfig {
    pub page_width: ScaledPoint,
    pub page_height: ScaledPoint,
    pub title: Option<String>,
    pub creator: Option<String>,
    /// Applied to pattern files loaded without explicit values.
    pub left_hyphenmin: usize,
    pub right_hyphenmin: usize,
    /// Whether face sources that are not files are looked up as installed
    /// font families.
    pub system_fonts: bool,
}

impl Default for EtsConfig {
    fn default() -> Self {
        Self {
            page_width: ScaledPoint::from_pt(595.2756),
            page_height: ScaledPoint::from_pt(841.8898),
            title: None,
            creator: Some(concat!("ets ", env!("CARGO_PKG_VERSION")).to_string()),
            left_hyphenmin: 2,
            right_hyphenmin: 3,
            system_fonts: true,
        }
    }
}

impl EtsConfig {
    pub fn from_json(text: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| DocumentError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config = Self::from_json(&text)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}
