use super::config::{Bonus, BonusCondition, Category, Probe, Rubric, Tier};
use super::predicate::Scope;
use super::result::{CategoryScore, GradeResult, ScoreEntry, Status};
use crate::content::ContentStore;
use crate::locate::Binding;

/// Values substituted into remark templates.
#[derive(Debug, Default)]
struct RemarkVars {
    probe: Option<String>,
    count: Option<usize>,
    found: Option<usize>,
    total: Option<usize>,
    namespace: Option<String>,
    file: Option<String>,
}

impl RemarkVars {
    fn render(&self, template: &str) -> String {
        let mut out = template.to_string();
        let mut put = |key: &str, value: Option<String>| {
            let needle = format!("{{{}}}", key);
            if out.contains(&needle) {
                out = out.replace(&needle, value.as_deref().unwrap_or("-"));
            }
        };
        put("probe", self.probe.clone());
        put("count", self.count.map(|n| n.to_string()));
        put("found", self.found.map(|n| n.to_string()));
        put("total", self.total.map(|n| n.to_string()));
        put("namespace", self.namespace.clone());
        put("file", self.file.clone());
        out
    }
}

fn status_for(points: f64, max: f64, coaching: bool) -> Status {
    if max > 0.0 && points >= max {
        Status::Full
    } else if points > 0.0 {
        Status::Partial
    } else if coaching {
        Status::Coaching
    } else {
        Status::Missing
    }
}

/// Remark for a probe whose tiers all failed and that names no fallback.
const UNSATISFIED_REMARK: &str = "{probe}: not satisfied";

/// Outcome of one probe before it is attached to a category.
struct ProbeOutcome {
    points: f64,
    max: f64,
    remark: String,
    status: Status,
    advice: Vec<String>,
}

fn evaluate_probe(probe: &Probe, store: &ContentStore) -> ProbeOutcome {
    let text = store.joined(&probe.target);
    let scope = Scope::new(store, &text);
    let max = probe.max_points();

    let mut vars = RemarkVars {
        probe: Some(probe.name.clone()),
        count: probe.tally.as_ref().map(|p| p.count(&text)),
        namespace: store.layout().namespace_name(),
        file: probe.target.first().and_then(|k| store.file_name(k)),
        ..RemarkVars::default()
    };

    let (points, template, coaching) = if let Some(ref checklist) = probe.checklist {
        let total = checklist.items.len();
        let found = checklist.items.iter().filter(|p| p.eval(scope)).count();
        vars.found = Some(found);
        vars.total = Some(total);
        let points = if total == 0 {
            0.0
        } else {
            found as f64 / total as f64 * checklist.points
        };
        let template = if found == total {
            &checklist.complete
        } else {
            &checklist.incomplete
        };
        (points, template.as_str(), false)
    } else {
        match first_matching_tier(&probe.tiers, scope) {
            Some(tier) => (tier.points, tier.remark.as_str(), tier.coaching),
            // No catch-all tier: still report the miss
            None => (0.0, UNSATISFIED_REMARK, false),
        }
    };

    let points = points.clamp(0.0, max);
    let advice = probe
        .advice
        .iter()
        .filter(|a| a.when.eval(scope))
        .map(|a| vars.render(&a.remark))
        .collect();

    let mut remark = vars.render(template);
    if remark.is_empty() {
        remark = vars.render(UNSATISFIED_REMARK);
    }

    ProbeOutcome {
        points,
        max,
        remark,
        status: status_for(points, max, coaching),
        advice,
    }
}

/// Tiers are tried top-down; the first whose predicate holds wins.
fn first_matching_tier<'t>(tiers: &'t [Tier], scope: Scope<'_>) -> Option<&'t Tier> {
    tiers
        .iter()
        .find(|t| t.when.as_ref().map_or(true, |p| p.eval(scope)))
}

fn score_category(category: &Category, store: &ContentStore, entries: &mut Vec<ScoreEntry>) -> CategoryScore {
    let mut raw = 0.0;

    for probe in &category.probes {
        let outcome = evaluate_probe(probe, store);
        raw += outcome.points;

        entries.push(ScoreEntry {
            category: Some(category.name.clone()),
            probe: probe.name.clone(),
            remark: outcome.remark,
            points: outcome.points,
            max: outcome.max,
            status: outcome.status,
        });
        for remark in outcome.advice {
            entries.push(ScoreEntry::note(Some(category.name.as_str()), &probe.name, remark));
        }
    }

    let max = category.internal_max();
    let raw = raw.clamp(0.0, max);
    let contribution = if max > 0.0 {
        raw / max * category.weight
    } else {
        0.0
    };

    CategoryScore {
        name: category.name.clone(),
        raw,
        max,
        weight: category.weight,
        contribution,
    }
}

fn bonus_conditions_met(bonus: &Bonus, categories: &[CategoryScore], store: &ContentStore) -> usize {
    bonus
        .conditions
        .iter()
        .filter(|condition| match condition {
            BonusCondition::Category { name, above } => categories
                .iter()
                .any(|c| &c.name == name && c.raw > *above),
            BonusCondition::Check { target, when } => {
                let text = store.joined(target);
                when.eval(Scope::new(store, &text))
            }
        })
        .count()
}

/// Grade one submission's content against a rubric.
///
/// Never fails: absent artifacts simply match nothing.
pub fn score(rubric: &Rubric, store: &ContentStore, submission: &str) -> GradeResult {
    let mut entries = Vec::new();

    for artifact in store.artifacts() {
        if let Binding::Merged { .. } = artifact.binding {
            if let Some(note) = rubric
                .artifact(&artifact.key)
                .and_then(|spec| spec.merged_note.clone())
            {
                entries.push(ScoreEntry::note(None, &artifact.key, note));
            }
        }
    }

    let categories: Vec<CategoryScore> = rubric
        .categories
        .iter()
        .map(|category| score_category(category, store, &mut entries))
        .collect();

    let weighted: f64 = categories.iter().map(|c| c.contribution).sum();
    let mut total = weighted;

    if let Some(ref bonus) = rubric.bonus {
        if bonus_conditions_met(bonus, &categories, store) >= bonus.required {
            total += bonus.points;
            if let Some(cap) = rubric.cap {
                total = total.min(cap);
            }
            let awarded = (total - weighted).max(0.0);
            // Nothing left under the cap: no bonus line
            if awarded > 0.0 {
                entries.push(ScoreEntry {
                    category: None,
                    probe: "bonus".to_string(),
                    remark: bonus.remark.clone(),
                    points: awarded,
                    max: bonus.points,
                    status: Status::Bonus,
                });
            }
        }
    }

    if let Some(cap) = rubric.cap {
        total = total.min(cap);
    }

    GradeResult {
        submission: submission.to_string(),
        bonus: (total - weighted).max(0.0),
        total,
        categories,
        entries,
    }
}
