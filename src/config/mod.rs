mod builtin;

pub use builtin::{builtin_names, builtin_rubric, BUILTIN_RUBRICS};

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::scoring::{validate_rubric, Rubric};

/// Rubric used when none is given on the command line.
pub const DEFAULT_RUBRIC: &str = "vehicle";

/// Directory names never treated as submissions.
pub const DEFAULT_EXCLUDES: &[&str] = &["GradingSystem"];

/// Get the config directory path (~/.config/rubricon/)
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("rubricon"))
}

/// Directory searched for user rubrics (~/.config/rubricon/rubrics/)
pub fn get_rubric_dir() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("rubrics"))
}

/// Parse and validate a rubric from YAML text.
///
/// Validation errors are joined into one message so the caller sees all of them.
pub fn parse_rubric(yaml: &str, origin: &str) -> Result<Rubric> {
    let rubric: Rubric = serde_saphyr::from_str(yaml)
        .with_context(|| format!("Failed to parse rubric: invalid YAML in {}", origin))?;

    if let Err(errors) = validate_rubric(&rubric) {
        anyhow::bail!(
            "Rubric {} is invalid:\n  - {}",
            origin,
            errors.join("\n  - ")
        );
    }

    Ok(rubric)
}

/// Load a rubric from a YAML file
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read
/// - The YAML cannot be parsed
/// - The rubric fails validation
pub fn load_rubric_file(path: &Path) -> Result<Rubric> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read rubric file at {}", path.display()))?;
    parse_rubric(&content, &path.display().to_string())
}

/// Resolve a rubric by name or path.
///
/// Tried in order: built-in name, existing file path, then
/// `~/.config/rubricon/rubrics/<name>.yaml`.
pub fn load_rubric(spec: &str) -> Result<Rubric> {
    if let Some(rubric) = builtin_rubric(spec) {
        return rubric;
    }

    let path = Path::new(spec);
    if path.is_file() {
        return load_rubric_file(path);
    }

    if let Some(dir) = get_rubric_dir() {
        let candidate = dir.join(format!("{}.yaml", spec));
        if candidate.is_file() {
            return load_rubric_file(&candidate);
        }
    }

    anyhow::bail!(
        "Unknown rubric '{}'. Built-in rubrics: {}. Or pass a path to a rubric YAML file.",
        spec,
        builtin_names().join(", ")
    )
}
