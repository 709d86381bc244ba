use anyhow::Result;

use super::parse_rubric;
use crate::scoring::Rubric;

/// Rubrics shipped with the binary, as (name, YAML source).
pub const BUILTIN_RUBRICS: &[(&str, &str)] = &[
    ("player", include_str!("../../rubrics/player.yaml")),
    ("vehicle", include_str!("../../rubrics/vehicle.yaml")),
];

pub fn builtin_names() -> Vec<&'static str> {
    BUILTIN_RUBRICS.iter().map(|(name, _)| *name).collect()
}

/// Parse a built-in rubric by name. `None` if no built-in has that name.
pub fn builtin_rubric(name: &str) -> Option<Result<Rubric>> {
    BUILTIN_RUBRICS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(n, yaml)| parse_rubric(yaml, &format!("built-in '{}'", n)))
}
