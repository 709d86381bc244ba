use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::locate::{Binding, Resolution, SubmissionLayout};

/// Read a file as text, best effort.
///
/// Invalid UTF-8 is replaced; any IO error yields an empty string.
pub fn load(path: &Path) -> String {
    match fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Could not read artifact");
            String::new()
        }
    }
}

/// A resolved artifact with its text.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub key: String,
    pub binding: Binding,
    pub text: String,
}

/// Read-only text of every artifact of one submission.
#[derive(Debug, Clone)]
pub struct ContentStore {
    layout: SubmissionLayout,
    artifacts: Vec<Artifact>,
}

impl ContentStore {
    /// Load the content of every binding in `resolution`.
    pub fn load(resolution: Resolution) -> Self {
        let artifacts = resolution
            .bindings
            .into_iter()
            .map(|(key, binding)| {
                let text = binding.source_path().map(load).unwrap_or_default();
                Artifact { key, binding, text }
            })
            .collect();

        Self {
            layout: resolution.layout,
            artifacts,
        }
    }

    /// A store not backed by the filesystem.
    pub fn detached(artifacts: Vec<Artifact>) -> Self {
        Self {
            layout: SubmissionLayout {
                root: PathBuf::new(),
                source_dir: PathBuf::new(),
                namespace_dir: None,
            },
            artifacts,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_layout(mut self, layout: SubmissionLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn layout(&self) -> &SubmissionLayout {
        &self.layout
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    fn get(&self, key: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.key == key)
    }

    /// Text of an artifact; empty when absent, unreadable or unknown.
    pub fn text(&self, key: &str) -> &str {
        self.get(key).map_or("", |a| a.text.as_str())
    }

    pub fn binding(&self, key: &str) -> Option<&Binding> {
        self.get(key).map(|a| &a.binding)
    }

    /// File name of the artifact's own file.
    pub fn file_name(&self, key: &str) -> Option<String> {
        self.binding(key)?
            .path()?
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    }

    /// Content of several artifacts joined by newlines, in the given order.
    pub fn joined(&self, keys: &[String]) -> Cow<'_, str> {
        match keys {
            [] => Cow::Borrowed(""),
            [only] => Cow::Borrowed(self.text(only)),
            _ => Cow::Owned(
                keys.iter()
                    .map(|k| self.text(k))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
        }
    }
}
