//! Loads named text blobs from disk.
//!
//! Program inputs are Progress sources or `.zip` containers of sources.
//! Directly named sources are loaded first, in input order, followed by the
//! source entries of each container. Blobs are read one at a time and the
//! first failure aborts the load.

use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A named piece of input text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlob {
    pub name: String,
    pub text: String,
}

impl TextBlob {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Load every analyzable program blob from `paths`.
///
/// Paths that are neither sources nor containers are skipped with a
/// diagnostic.
pub async fn load_program_blobs(paths: &[PathBuf], config: &AdvisorConfig) -> Result<Vec<TextBlob>> {
    let mut blobs = Vec::new();

    for path in paths {
        let name = display_name(path);
        if config.is_container_file(&name) {
            continue;
        }
        if !config.is_source_file(&name) {
            info!("ignoring (not a Progress source): {}", name);
            continue;
        }

        info!("reading file: {}", name);
        let bytes = read_bytes(path).await?;
        blobs.push(TextBlob::new(&name, decode(&name, bytes, config.lossy_utf8)?));
    }

    for path in paths {
        let name = display_name(path);
        if !config.is_container_file(&name) {
            continue;
        }

        info!("opening container: {}", name);
        let bytes = read_bytes(path).await?;
        blobs.extend(expand_container(&name, bytes, config)?);
    }

    Ok(blobs)
}

/// Load every schema blob in `paths`, in order
pub async fn load_schema_blobs(paths: &[PathBuf], config: &AdvisorConfig) -> Result<Vec<TextBlob>> {
    let mut blobs = Vec::with_capacity(paths.len());

    for path in paths {
        let name = display_name(path);
        info!("reading schema: {}", name);
        let bytes = read_bytes(path).await?;
        blobs.push(TextBlob::new(&name, decode(&name, bytes, config.lossy_utf8)?));
    }

    Ok(blobs)
}

/// Source entries of a `.zip` container, in archive order.
///
/// Directories and entries without a source suffix are skipped.
#[cfg(feature = "zip-archives")]
pub fn expand_container(name: &str, bytes: Vec<u8>, config: &AdvisorConfig) -> Result<Vec<TextBlob>> {
    use std::io::{Cursor, Read};

    let archive_error = |e: &dyn std::fmt::Display| AdvisorError::Archive {
        name: name.to_string(),
        message: e.to_string(),
    };

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| archive_error(&e))?;
    let mut blobs = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| archive_error(&e))?;
        if entry.is_dir() || !config.is_source_file(entry.name()) {
            continue;
        }

        let entry_name = entry.name().to_string();
        debug!("reading {} inside {}", entry_name, name);

        let mut content = Vec::new();
        entry
            .read_to_end(&mut content)
            .map_err(|e| archive_error(&e))?;
        blobs.push(TextBlob::new(
            &entry_name,
            decode(&entry_name, content, config.lossy_utf8)?,
        ));
    }

    info!("expanded {}: {} source file(s)", name, blobs.len());
    Ok(blobs)
}

#[cfg(not(feature = "zip-archives"))]
pub fn expand_container(name: &str, _bytes: Vec<u8>, _config: &AdvisorConfig) -> Result<Vec<TextBlob>> {
    info!("ignoring container {} (built without zip-archives)", name);
    Ok(Vec::new())
}

async fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| AdvisorError::io(path, e))
}

fn decode(name: &str, bytes: Vec<u8>, lossy: bool) -> Result<String> {
    if lossy {
        return Ok(String::from_utf8_lossy(&bytes).into_owned());
    }
    String::from_utf8(bytes).map_err(|_| AdvisorError::Decode {
        name: name.to_string(),
    })
}

fn display_name(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
