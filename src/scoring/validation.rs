use std::collections::HashSet;

use super::config::{BonusCondition, Probe, Rubric};
use super::predicate::{Pattern, Predicate};

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Validate a rubric before grading with it.
/// Returns all validation errors at once (not just the first).
pub fn validate_rubric(rubric: &Rubric) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if rubric.name.trim().is_empty() {
        errors.push("name: must not be empty".to_string());
    }

    // Artifacts
    let mut keys = HashSet::new();
    for (i, artifact) in rubric.artifacts.iter().enumerate() {
        if !keys.insert(artifact.key.as_str()) {
            errors.push(format!("artifacts[{}].key: duplicate key '{}'", i, artifact.key));
        }
        if artifact.files.is_empty() {
            errors.push(format!("artifacts[{}].files: at least one filename required", i));
        }
        if let Some(ref decl) = artifact.declaration {
            check_pattern(&format!("artifacts[{}].declaration", i), decl, &mut errors);
        }
    }

    if let Some(ref entry) = rubric.layout.entry {
        if !keys.contains(entry.as_str()) {
            errors.push(format!("layout.entry: unknown artifact '{}'", entry));
        }
    }
    if rubric.layout.max_depth == 0 {
        errors.push("layout.max_depth: must be at least 1".to_string());
    }

    // Categories
    if rubric.categories.is_empty() {
        errors.push("categories: at least one category required".to_string());
    }
    let total_weight = rubric.total_weight();
    // Negated so that NaN fails too
    if !((total_weight - 100.0).abs() <= WEIGHT_TOLERANCE) {
        errors.push(format!("categories: weights sum to {}, expected 100", total_weight));
    }

    let mut names = HashSet::new();
    for (ci, category) in rubric.categories.iter().enumerate() {
        let at = format!("categories[{}]", ci);
        if !names.insert(category.name.as_str()) {
            errors.push(format!("{}.name: duplicate category '{}'", at, category.name));
        }
        check_amount(&format!("{}.weight", at), category.weight, &mut errors);
        if category.probes.is_empty() {
            errors.push(format!("{}.probes: at least one probe required", at));
        } else if category.internal_max() <= 0.0 {
            errors.push(format!("{}: probes can award no points", at));
        }
        for (pi, probe) in category.probes.iter().enumerate() {
            validate_probe(&format!("{}.probes[{}]", at, pi), probe, &keys, &mut errors);
        }
    }

    // Bonus
    if let Some(ref bonus) = rubric.bonus {
        check_amount("bonus.points", bonus.points, &mut errors);
        if bonus.required == 0 || bonus.required > bonus.conditions.len() {
            errors.push(format!(
                "bonus.required: must be between 1 and {}",
                bonus.conditions.len()
            ));
        }
        for (i, condition) in bonus.conditions.iter().enumerate() {
            let at = format!("bonus.conditions[{}]", i);
            match condition {
                BonusCondition::Category { name, .. } => {
                    if rubric.category(name).is_none() {
                        errors.push(format!("{}: unknown category '{}'", at, name));
                    }
                }
                BonusCondition::Check { target, when } => {
                    check_targets(&at, target, &keys, &mut errors);
                    check_predicate(&at, when, &keys, &mut errors);
                }
            }
        }
    }

    if let Some(cap) = rubric.cap {
        if !cap.is_finite() || cap <= 0.0 {
            errors.push("cap: must be a positive number".to_string());
        }
    }

    if let Some(ref encouragement) = rubric.encouragement {
        // RangeInclusive::contains is false for NaN
        if !(0.0..=100.0).contains(&encouragement.threshold) {
            errors.push("encouragement.threshold: must be within 0-100".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_probe(at: &str, probe: &Probe, keys: &HashSet<&str>, errors: &mut Vec<String>) {
    check_targets(at, &probe.target, keys, errors);

    match (&probe.checklist, probe.tiers.is_empty()) {
        (Some(_), false) => errors.push(format!("{}: use either tiers or checklist, not both", at)),
        (None, true) => errors.push(format!("{}: tiers or checklist required", at)),
        _ => {}
    }

    for (i, tier) in probe.tiers.iter().enumerate() {
        check_amount(&format!("{}.tiers[{}].points", at, i), tier.points, errors);
        if i > 0 && tier.points > probe.tiers[i - 1].points {
            errors.push(format!(
                "{}.tiers[{}]: awards more than the tier before it; order tiers from most to least credit",
                at, i
            ));
        }
        if let Some(ref when) = tier.when {
            check_predicate(&format!("{}.tiers[{}].when", at, i), when, keys, errors);
        }
    }

    if let Some(ref checklist) = probe.checklist {
        if checklist.items.is_empty() {
            errors.push(format!("{}.checklist.items: at least one item required", at));
        }
        check_amount(&format!("{}.checklist.points", at), checklist.points, errors);
        for (i, item) in checklist.items.iter().enumerate() {
            check_predicate(&format!("{}.checklist.items[{}]", at, i), item, keys, errors);
        }
    }

    if let Some(max) = probe.max {
        let best = probe.max_points();
        if !((max - best).abs() <= WEIGHT_TOLERANCE) {
            errors.push(format!(
                "{}.max: declared {} but best tier awards {}",
                at, max, best
            ));
        }
    }

    for (i, advice) in probe.advice.iter().enumerate() {
        check_predicate(&format!("{}.advice[{}].when", at, i), &advice.when, keys, errors);
    }

    if let Some(ref tally) = probe.tally {
        check_pattern(&format!("{}.tally", at), tally, errors);
    }
}

/// Weights and points must be finite and non-negative.
fn check_amount(at: &str, value: f64, errors: &mut Vec<String>) {
    if !value.is_finite() {
        errors.push(format!("{}: must be a finite number", at));
    } else if value < 0.0 {
        errors.push(format!("{}: must be non-negative", at));
    }
}

fn check_targets(at: &str, target: &[String], keys: &HashSet<&str>, errors: &mut Vec<String>) {
    for key in target {
        if !keys.contains(key.as_str()) {
            errors.push(format!("{}.target: unknown artifact '{}'", at, key));
        }
    }
}

fn check_predicate(at: &str, pred: &Predicate, keys: &HashSet<&str>, errors: &mut Vec<String>) {
    for pattern in pred.patterns() {
        check_pattern(at, pattern, errors);
    }
    for key in pred.artifact_refs() {
        if !keys.contains(key) {
            errors.push(format!("{}: unknown artifact '{}'", at, key));
        }
    }
}

fn check_pattern(at: &str, pattern: &Pattern, errors: &mut Vec<String>) {
    if let Err(e) = pattern.compile() {
        errors.push(format!("{}: invalid pattern '{}' - {}", at, pattern.source(), e));
    }
}
