use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop a submission (or a whole run) from being graded.
///
/// Missing or unreadable artifacts are not errors; they score as absent.
#[derive(Debug, Error)]
pub enum GradeError {
    #[error("path does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("failed to list submissions in {}: {source}", path.display())]
    ListSubmissions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GradeError {
    /// Short form for the summary table.
    pub fn summary(&self) -> &'static str {
        match self {
            GradeError::RootNotFound(_) => "submission root not found",
            GradeError::NotADirectory(_) => "submission root is not a directory",
            GradeError::ListSubmissions { .. } => "could not list submissions",
        }
    }
}
