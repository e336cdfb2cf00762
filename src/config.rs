//! Analysis configuration.

use crate::error::{AdvisorError, Result};
use serde::{Deserialize, Serialize};

/// Storage area written into generated index definitions.
pub const DEFAULT_STORAGE_AREA: &str = "Schema Area";

/// INDEX-NUM written into generated index definitions.
pub const DEFAULT_INDEX_NUM: u32 = 99;

/// Field budget of a generated index before logical fields are dropped.
pub const DEFAULT_MAX_INDEX_FIELDS: usize = 7;

/// Settings for one analysis run.
///
/// # Example
///
/// ```ignore
/// let config = AdvisorConfig {
///     seed: Some(42),
///     ..AdvisorConfig::default()
/// };
/// config.validate()?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Suffixes of Progress sources analyzed directly
    pub source_suffixes: Vec<String>,
    /// Suffix of containers whose source entries are expanded
    pub container_suffix: String,
    /// Suffixes of data-dictionary exports
    pub schema_suffixes: Vec<String>,
    /// Maximum number of fields in a suggested index
    pub max_index_fields: usize,
    /// AREA of suggested indexes
    pub storage_area: String,
    /// INDEX-NUM of suggested indexes
    pub index_num: u32,
    /// Seed for generated index names; random when absent
    pub seed: Option<u64>,
    /// Replace invalid UTF-8 instead of failing the run
    pub lossy_utf8: bool,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            source_suffixes: vec![".p".into(), ".w".into(), ".i".into(), ".cls".into()],
            container_suffix: ".zip".into(),
            schema_suffixes: vec![".df".into(), ".txt".into()],
            max_index_fields: DEFAULT_MAX_INDEX_FIELDS,
            storage_area: DEFAULT_STORAGE_AREA.into(),
            index_num: DEFAULT_INDEX_NUM,
            seed: None,
            lossy_utf8: false,
        }
    }
}

impl AdvisorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_index_fields == 0 {
            return Err(AdvisorError::Config(
                "max_index_fields must be at least 1".to_string(),
            ));
        }
        if self.storage_area.contains('"') {
            return Err(AdvisorError::Config(format!(
                "storage area {:?} cannot contain quotes",
                self.storage_area
            )));
        }
        if self.source_suffixes.is_empty() {
            return Err(AdvisorError::Config(
                "at least one source suffix is required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_source_file(&self, name: &str) -> bool {
        has_any_suffix(name, &self.source_suffixes)
    }

    pub fn is_container_file(&self, name: &str) -> bool {
        has_suffix(name, &self.container_suffix)
    }

    pub fn is_schema_file(&self, name: &str) -> bool {
        has_any_suffix(name, &self.schema_suffixes)
    }
}

fn has_suffix(name: &str, suffix: &str) -> bool {
    name.to_ascii_lowercase()
        .ends_with(&suffix.to_ascii_lowercase())
}

fn has_any_suffix(name: &str, suffixes: &[String]) -> bool {
    suffixes.iter().any(|s| has_suffix(name, s))
}
