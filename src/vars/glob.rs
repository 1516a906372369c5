// src/vars/glob.rs

use std::path::Path;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::fs::{relative_str, FileSystem};

/// Directories never descended into while collecting files.
const SKIPPED_DIRS: &[&str] = &[".git"];

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Collect all files under `root` matching `patterns` and none of `exclude`.
///
/// Returned paths are relative to `root`, use forward slashes and are sorted.
pub fn collect_matching_files(
    fs: &dyn FileSystem,
    root: &Path,
    patterns: &[String],
    exclude: &[String],
) -> Result<Vec<String>> {
    let include_set = build_globset(patterns)?;
    let exclude_set = if exclude.is_empty() {
        None
    } else {
        Some(build_globset(exclude)?)
    };

    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                let skipped = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| SKIPPED_DIRS.contains(&n));
                if !skipped {
                    stack.push(path);
                }
            } else if fs.is_file(&path) {
                let Some(rel) = relative_str(root, &path) else {
                    continue;
                };
                let excluded = exclude_set.as_ref().is_some_and(|set| set.is_match(&rel));
                if include_set.is_match(&rel) && !excluded {
                    files.push(rel);
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn collects_sorted_relative_matches() {
        let fs = MockFileSystem::new();
        fs.add_file("./src/pkg/b.py", "");
        fs.add_file("./src/pkg/a.py", "");
        fs.add_file("./src/pkg/a_tmp.py", "");
        fs.add_file("./src/README.md", "");
        fs.add_file("./.git/hooks/x.py", "");

        let files = collect_matching_files(
            &fs,
            Path::new("."),
            &["**/*.py".to_string()],
            &["**/*_tmp.py".to_string()],
        )
        .unwrap();

        assert_eq!(files, vec!["src/pkg/a.py", "src/pkg/b.py"]);
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let fs = MockFileSystem::new();
        let err = collect_matching_files(&fs, Path::new("."), &["src/[".to_string()], &[]);
        assert!(err.is_err());
    }
}
