use serde::{Deserialize, Serialize};

use super::predicate::{Pattern, Predicate};

/// A complete grading rubric.
///
/// Rubrics are plain data: a grading variant is a new YAML document, not new
/// code. Categories and probes are evaluated in declaration order.
///
/// Example YAML:
/// ```yaml
/// name: shapes
/// layout:
///   source_dirs: [src]
///   entry: main
/// artifacts:
///   - key: main
///     files: [Main.java]
/// categories:
///   - name: Main
///     weight: 100
///     probes:
///       - name: instantiation
///         target: [main]
///         tiers:
///           - when: { matches: 'new\s+Circle' }
///             points: 5
///             remark: "Main: Circle instantiated"
///           - remark: "Main: no Circle instantiated"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Rubric {
    /// Short identifier used on the command line
    pub name: String,

    /// Human-readable title shown by `rubricon rubrics`
    #[serde(default)]
    pub title: Option<String>,

    /// Where sources are expected to live
    #[serde(default)]
    pub layout: Layout,

    /// Required source units, in resolution order
    pub artifacts: Vec<ArtifactSpec>,

    /// Weighted rubric dimensions, in report order
    pub categories: Vec<Category>,

    /// Encouragement bonus added after aggregation
    #[serde(default)]
    pub bonus: Option<Bonus>,

    /// Upper bound for the final total once bonuses are applied
    #[serde(default)]
    pub cap: Option<f64>,

    /// Line printed under the total when it reaches a threshold
    #[serde(default)]
    pub encouragement: Option<Encouragement>,
}

impl Rubric {
    /// Look up an artifact declaration by key.
    pub fn artifact(&self, key: &str) -> Option<&ArtifactSpec> {
        self.artifacts.iter().find(|a| a.key == key)
    }

    /// Look up a category by name.
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn total_weight(&self) -> f64 {
        self.categories.iter().map(|c| c.weight).sum()
    }
}

/// Directory conventions for a submission.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Layout {
    /// Accepted names for the source directory (matched case-insensitively)
    #[serde(default = "default_source_dirs")]
    pub source_dirs: Vec<String>,

    /// Accepted names for the namespace/package directory, e.g. `Model`
    #[serde(default)]
    pub namespace_dirs: Vec<String>,

    /// Source file extensions, used to recognise a single loose submission
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Artifact whose file may contain every other declaration
    #[serde(default)]
    pub entry: Option<String>,

    /// Depth bound for recursive searches
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            source_dirs: default_source_dirs(),
            namespace_dirs: Vec::new(),
            extensions: default_extensions(),
            entry: None,
            max_depth: default_max_depth(),
        }
    }
}

fn default_source_dirs() -> Vec<String> {
    vec!["src".to_string()]
}

fn default_extensions() -> Vec<String> {
    vec!["java".to_string()]
}

fn default_max_depth() -> usize {
    16
}

/// A required source unit and the filenames it may appear under.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ArtifactSpec {
    /// Logical name used by probes
    pub key: String,

    /// Accepted filenames, most preferred first (synonyms, translations, typos)
    pub files: Vec<String>,

    /// Conventionally lives in the namespace directory
    #[serde(default)]
    pub namespaced: bool,

    /// Declaration searched for inside the entry file when no file is found
    #[serde(default)]
    pub declaration: Option<Pattern>,

    /// Note reported when the artifact is found inside the entry file
    #[serde(default)]
    pub merged_note: Option<String>,
}

/// A weighted group of probes.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Category {
    pub name: String,

    /// Points out of 100 this category contributes
    pub weight: f64,

    pub probes: Vec<Probe>,
}

impl Category {
    /// Sum of probe maxima.
    pub fn internal_max(&self) -> f64 {
        self.probes.iter().map(Probe::max_points).sum()
    }
}

/// A single pattern-based check.
///
/// A probe either walks `tiers` top-down (first match wins) or awards
/// proportional credit through a `checklist`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Probe {
    pub name: String,

    /// Artifacts whose content is inspected, concatenated in order
    #[serde(default)]
    pub target: Vec<String>,

    /// Declared maximum; must agree with the best tier when given
    #[serde(default)]
    pub max: Option<f64>,

    #[serde(default)]
    pub tiers: Vec<Tier>,

    #[serde(default)]
    pub checklist: Option<Checklist>,

    /// Zero-point coaching remarks emitted after the outcome
    #[serde(default)]
    pub advice: Vec<Advice>,

    /// Pattern whose match count fills `{count}` in remarks
    #[serde(default)]
    pub tally: Option<Pattern>,
}

impl Probe {
    /// Best-case points for this probe.
    pub fn max_points(&self) -> f64 {
        if let Some(ref checklist) = self.checklist {
            return checklist.points;
        }
        self.tiers
            .iter()
            .map(|t| t.points)
            .fold(0.0, f64::max)
    }
}

/// One (predicate, points, remark) option of a probe.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Tier {
    /// Absent means the tier always matches
    #[serde(default)]
    pub when: Option<Predicate>,

    #[serde(default)]
    pub points: f64,

    pub remark: String,

    /// Render a zero-point outcome as a coaching note rather than a miss
    #[serde(default)]
    pub coaching: bool,
}

/// Proportional credit: `found / total * points`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Checklist {
    pub items: Vec<Predicate>,
    pub points: f64,
    /// Remark when every item is found
    pub complete: String,
    /// Remark otherwise; may use `{found}` and `{total}`
    pub incomplete: String,
}

/// Reporting-only remark.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Advice {
    pub when: Predicate,
    pub remark: String,
}

/// Fixed bonus granted when enough conditions hold.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Bonus {
    pub points: f64,
    /// How many conditions must hold
    pub required: usize,
    pub conditions: Vec<BonusCondition>,
    pub remark: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum BonusCondition {
    /// Raw category score strictly above a floor
    Category { name: String, above: f64 },
    /// A predicate over target content
    Check {
        #[serde(default)]
        target: Vec<String>,
        when: Predicate,
    },
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Encouragement {
    pub threshold: f64,
    pub message: String,
}
