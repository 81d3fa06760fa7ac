//! Input path expansion and the per-run file ceiling.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use globset::GlobBuilder;

/// Expand directories to their direct children matching `pattern`.
///
/// Files are kept as given. Children of one directory are sorted by name;
/// the overall order follows `inputs`.
pub fn expand_inputs(inputs: &[PathBuf], pattern: &str) -> Result<Vec<PathBuf>> {
    let matcher = GlobBuilder::new(pattern)
        .case_insensitive(true)
        .literal_separator(true)
        .build()
        .with_context(|| format!("Invalid input pattern {pattern:?}"))?
        .compile_matcher();

    let mut l_paths = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            l_paths.push(input.clone());
            continue;
        }

        let mut l_children = Vec::new();
        let read_dir = fs::read_dir(input)
            .with_context(|| format!("Failed to list directory {}", input.display()))?;
        for entry in read_dir {
            let entry =
                entry.with_context(|| format!("Failed to list directory {}", input.display()))?;
            let path = entry.path();
            if path.is_file() && matcher.is_match(entry.file_name()) {
                l_children.push(path);
            }
        }
        l_children.sort();
        l_paths.extend(l_children);
    }
    Ok(l_paths)
}

/// Keep the first `n_max` paths; returns the kept paths and the dropped count.
pub fn truncate_inputs(mut paths: Vec<PathBuf>, n_max: usize) -> (Vec<PathBuf>, usize) {
    let n_dropped = paths.len().saturating_sub(n_max);
    paths.truncate(n_max);
    (paths, n_dropped)
}
