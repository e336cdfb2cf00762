// Input path collection - expands directories and glob patterns

use abl_index_advisor::AdvisorError;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directories never descended into
const SKIPPED_DIRS: [&str; 4] = ["target", "node_modules", ".git", "dist"];

/// Expand command-line inputs into file paths.
///
/// Directories are walked recursively and keep only files for which
/// `accept` returns true. Glob patterns are expanded the same way.
/// Explicitly named files are always kept; the loader decides what to do
/// with unsupported ones.
pub fn collect_paths<F>(inputs: &[String], accept: F) -> Result<Vec<PathBuf>, AdvisorError>
where
    F: Fn(&str) -> bool,
{
    let mut paths = Vec::new();

    for input in inputs {
        if is_glob(input) {
            let entries =
                glob::glob(input).map_err(|e| AdvisorError::InvalidPattern(format!("{}: {}", input, e)))?;
            for entry in entries {
                let path = entry.map_err(|e| {
                    let path = e.path().to_path_buf();
                    AdvisorError::Io {
                        path,
                        source: e.into_error(),
                    }
                })?;
                if path.is_dir() {
                    walk_directory(&path, &accept, &mut paths)?;
                } else if accept(&path.to_string_lossy()) {
                    paths.push(path);
                }
            }
            continue;
        }

        let path = PathBuf::from(input);
        if path.is_dir() {
            walk_directory(&path, &accept, &mut paths)?;
        } else {
            paths.push(path);
        }
    }

    Ok(paths)
}

fn walk_directory<F>(dir: &Path, accept: &F, paths: &mut Vec<PathBuf>) -> Result<(), AdvisorError>
where
    F: Fn(&str) -> bool,
{
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            e.depth() == 0 || !e.file_type().is_dir() || !SKIPPED_DIRS.iter().any(|d| *d == name)
        });

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory loop detected"));
            AdvisorError::Io { path, source }
        })?;

        if entry.file_type().is_file() && accept(&entry.path().to_string_lossy()) {
            paths.push(entry.into_path());
        }
    }

    Ok(())
}

fn is_glob(input: &str) -> bool {
    input.contains(['*', '?', '['])
}
