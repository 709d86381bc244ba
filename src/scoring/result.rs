use serde::Serialize;

/// How a report line is marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Full,
    Partial,
    /// Zero-point advice, or an informational note
    Coaching,
    Missing,
    Bonus,
}

/// One remark with the points it earned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreEntry {
    /// `None` for notes that belong to no category
    pub category: Option<String>,
    pub probe: String,
    pub remark: String,
    pub points: f64,
    pub max: f64,
    pub status: Status,
}

impl ScoreEntry {
    /// A remark that carries no points.
    pub fn note(category: Option<&str>, probe: &str, remark: String) -> Self {
        Self {
            category: category.map(str::to_string),
            probe: probe.to_string(),
            remark,
            points: 0.0,
            max: 0.0,
            status: Status::Coaching,
        }
    }
}

/// Per-category aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryScore {
    pub name: String,
    pub raw: f64,
    pub max: f64,
    pub weight: f64,
    /// `raw / max * weight`
    pub contribution: f64,
}

/// The graded outcome of one submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeResult {
    pub submission: String,
    pub total: f64,
    pub categories: Vec<CategoryScore>,
    pub entries: Vec<ScoreEntry>,
    /// Bonus actually added (after any cap)
    pub bonus: f64,
}

impl GradeResult {
    /// Total rounded the way reports show it.
    pub fn rounded_total(&self) -> f64 {
        (self.total * 100.0).round() / 100.0
    }

    pub fn count(&self, status: Status) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }
}
