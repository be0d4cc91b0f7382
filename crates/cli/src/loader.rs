//! Specification document loading.
//!
//! Accepts file paths and directories. A directory contributes its `.json`
//! entries in name order (non-recursive). A document that fails to read,
//! parse, or normalize is reported to stderr and skipped -- one bad spec
//! never takes down the rest.

use std::fs;
use std::path::{Path, PathBuf};

use mimus_core::{normalize, MockSpec, SpecError};

/// A normalized specification plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedSpec {
    /// File stem, used in logs and the admin listing.
    pub name: String,
    pub path: PathBuf,
    pub spec: MockSpec,
}

/// Load one specification file.
pub fn load_file(path: &Path) -> Result<LoadedSpec, SpecError> {
    let text = fs::read_to_string(path).map_err(|e| SpecError::Document {
        message: format!("cannot read {}: {}", path.display(), e),
    })?;
    let spec = normalize::from_str(&text)?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed")
        .to_string();
    Ok(LoadedSpec {
        name,
        path: path.to_path_buf(),
        spec,
    })
}

/// Load every document reachable from `paths`, skipping failures.
pub fn load_paths(paths: &[PathBuf]) -> Vec<LoadedSpec> {
    let mut specs = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = match fs::read_dir(path) {
                Ok(iter) => iter
                    .filter_map(|e| e.ok())
                    .map(|e| e.path())
                    .filter(|p| p.extension().and_then(|x| x.to_str()) == Some("json"))
                    .collect(),
                Err(e) => {
                    eprintln!("warning: cannot scan {}: {}", path.display(), e);
                    continue;
                }
            };
            entries.sort();
            for entry in entries {
                push_or_report(&mut specs, &entry);
            }
        } else {
            push_or_report(&mut specs, path);
        }
    }
    specs
}

fn push_or_report(specs: &mut Vec<LoadedSpec>, path: &Path) {
    match load_file(path) {
        Ok(loaded) => {
            eprintln!(
                "Loaded spec: {} ({} {})",
                loaded.name,
                loaded.spec.request.method.as_str(),
                loaded.spec.request.route
            );
            specs.push(loaded);
        }
        Err(e) => eprintln!("warning: skipping {}: {}", path.display(), e),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
