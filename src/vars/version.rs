// src/vars/version.rs

//! Turn `git describe --tags` output into a packaging-compatible version.

use std::sync::LazyLock;

use regex::Regex;

/// Version used when no tag metadata is available.
pub const DEFAULT_VERSION: &str = "0.0.0";

static DESCRIBE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v(\d+\.\d+\.\d+)-(\d+)-g([0-9a-fA-F]+)$").expect("valid describe regex")
});

/// Derive a version string from a tag description.
///
/// - `None` or blank → [`DEFAULT_VERSION`]
/// - `v1.2.3-4-gabcdef` → `1.2.3.post4+gabcdef`
/// - anything else is returned unchanged (trimmed)
pub fn derive_version(tag: Option<&str>) -> String {
    let tag = match tag.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return DEFAULT_VERSION.to_string(),
    };

    match DESCRIBE_PATTERN.captures(tag) {
        Some(caps) => format!("{}.post{}+g{}", &caps[1], &caps[2], &caps[3]),
        None => tag.to_string(),
    }
}
