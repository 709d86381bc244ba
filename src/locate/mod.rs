//! Artifact resolution.
//!
//! Each rubric artifact is bound to a file by an ordered chain of strategies;
//! the first one that succeeds wins and exhaustion yields [`Binding::Absent`].

pub mod search;

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::content;
use crate::error::GradeError;
use crate::scoring::{ArtifactSpec, Rubric};
use search::{find_child, find_recursive, Kind};

/// Where an artifact's content comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Binding {
    /// Its own file
    File(PathBuf),
    /// Declared inside another artifact's file
    Merged { host: String, path: PathBuf },
    Absent,
}

impl Binding {
    /// The artifact's own file, if it has one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Binding::File(p) => Some(p),
            _ => None,
        }
    }

    /// The file content is read from.
    pub fn source_path(&self) -> Option<&Path> {
        match self {
            Binding::File(p) | Binding::Merged { path: p, .. } => Some(p),
            Binding::Absent => None,
        }
    }
}

/// Directories resolved for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionLayout {
    pub root: PathBuf,
    /// Effective source directory (the root itself when none was found)
    pub source_dir: PathBuf,
    pub namespace_dir: Option<PathBuf>,
}

impl SubmissionLayout {
    pub fn namespace_name(&self) -> Option<String> {
        self.namespace_dir
            .as_ref()
            .and_then(|d| d.file_name())
            .map(|n| n.to_string_lossy().into_owned())
    }
}

/// Outcome of resolving every artifact of a rubric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub layout: SubmissionLayout,
    /// One binding per rubric artifact, in rubric order
    pub bindings: Vec<(String, Binding)>,
}

impl Resolution {
    pub fn binding(&self, key: &str) -> Option<&Binding> {
        self.bindings.iter().find(|(k, _)| k == key).map(|(_, b)| b)
    }
}

/// Resolve every artifact of `rubric` under `root`.
///
/// Read-only. Fails only when `root` does not exist or is not a directory.
pub fn resolve(root: &Path, rubric: &Rubric) -> Result<Resolution, GradeError> {
    if !root.exists() {
        return Err(GradeError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(GradeError::NotADirectory(root.to_path_buf()));
    }

    let layout = &rubric.layout;
    let source_dir = locate_source_dir(root, &layout.source_dirs, layout.max_depth);
    let namespace_dir = locate_namespace_dir(&source_dir, rubric);
    debug!(
        root = %root.display(),
        source_dir = %source_dir.display(),
        namespace_dir = ?namespace_dir,
        "Resolved submission layout"
    );

    let submission = SubmissionLayout {
        root: root.to_path_buf(),
        source_dir,
        namespace_dir,
    };

    let mut bindings: Vec<(String, Binding)> = rubric
        .artifacts
        .iter()
        .map(|spec| {
            let binding = match locate_file(&submission, spec, layout.max_depth) {
                Some(path) => Binding::File(path),
                None => Binding::Absent,
            };
            (spec.key.clone(), binding)
        })
        .collect();

    if let Some(ref entry) = layout.entry {
        bind_merged(rubric, entry, &mut bindings);
    }

    for (key, binding) in &bindings {
        debug!(artifact = %key, binding = ?binding, "Resolved artifact");
    }

    Ok(Resolution {
        layout: submission,
        bindings,
    })
}

fn locate_source_dir(root: &Path, names: &[String], max_depth: usize) -> PathBuf {
    find_child(root, names, Kind::Dir)
        .or_else(|| find_recursive(root, names, Kind::Dir, max_depth))
        .unwrap_or_else(|| root.to_path_buf())
}

/// Conventional namespace directory, else the directory holding the first
/// namespaced artifact found.
fn locate_namespace_dir(source_dir: &Path, rubric: &Rubric) -> Option<PathBuf> {
    let layout = &rubric.layout;
    if let Some(dir) = find_child(source_dir, &layout.namespace_dirs, Kind::Dir) {
        return Some(dir);
    }

    rubric
        .artifacts
        .iter()
        .filter(|a| a.namespaced)
        .find_map(|a| find_recursive(source_dir, &a.files, Kind::File, layout.max_depth))
        .and_then(|file| file.parent().map(Path::to_path_buf))
}

fn locate_file(layout: &SubmissionLayout, spec: &ArtifactSpec, max_depth: usize) -> Option<PathBuf> {
    let source = layout.source_dir.as_path();
    let namespace = layout.namespace_dir.as_deref();

    let dirs: Vec<&Path> = if spec.namespaced {
        namespace.into_iter().chain([source]).collect()
    } else {
        [source].into_iter().chain(namespace).collect()
    };

    for name in &spec.files {
        let single = std::slice::from_ref(name);
        if let Some(found) = dirs.iter().find_map(|d| find_child(d, single, Kind::File)) {
            return Some(found);
        }
    }

    find_recursive(source, &spec.files, Kind::File, max_depth)
        .or_else(|| find_recursive(&layout.root, &spec.files, Kind::File, max_depth))
}

/// Bind still-absent artifacts whose declaration appears in the entry file.
fn bind_merged(rubric: &Rubric, entry: &str, bindings: &mut [(String, Binding)]) {
    let Some(entry_path) = bindings
        .iter()
        .find(|(k, _)| k == entry)
        .and_then(|(_, b)| b.path())
        .map(Path::to_path_buf)
    else {
        return;
    };

    let entry_text = content::load(&entry_path);
    if entry_text.is_empty() {
        return;
    }

    for (key, binding) in bindings.iter_mut() {
        if *binding != Binding::Absent || key == entry {
            continue;
        }
        let declared = rubric
            .artifact(key)
            .and_then(|spec| spec.declaration.as_ref())
            .is_some_and(|decl| decl.is_match(&entry_text));
        if declared {
            debug!(artifact = %key, host = %entry, "Artifact declared inside entry file");
            *binding = Binding::Merged {
                host: entry.to_string(),
                path: entry_path.clone(),
            };
        }
    }
}
