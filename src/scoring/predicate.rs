use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::content::ContentStore;
use crate::locate::Binding;

/// A regular expression as written in a rubric.
///
/// Case-insensitive unless `case_sensitive` is set. Compiled on first use and
/// cached, so a rubric can be shared read-only across submissions.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(from = "PatternSpec", into = "PatternSpec")]
pub struct Pattern {
    source: String,
    case_sensitive: bool,
    compiled: OnceLock<Option<Regex>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
enum PatternSpec {
    Plain(String),
    Detailed {
        pattern: String,
        #[serde(default)]
        case_sensitive: bool,
    },
}

impl From<PatternSpec> for Pattern {
    fn from(spec: PatternSpec) -> Self {
        match spec {
            PatternSpec::Plain(source) => Pattern::new(source),
            PatternSpec::Detailed {
                pattern,
                case_sensitive,
            } => Pattern::new(pattern).case_sensitive(case_sensitive),
        }
    }
}

impl From<Pattern> for PatternSpec {
    fn from(pattern: Pattern) -> Self {
        if pattern.case_sensitive {
            PatternSpec::Detailed {
                pattern: pattern.source,
                case_sensitive: true,
            }
        } else {
            PatternSpec::Plain(pattern.source)
        }
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.case_sensitive == other.case_sensitive
    }
}

impl Pattern {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            case_sensitive: false,
            compiled: OnceLock::new(),
        }
    }

    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self.compiled = OnceLock::new();
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Compile without caching. Used by validation to report the error.
    pub fn compile(&self) -> Result<Regex, regex::Error> {
        RegexBuilder::new(&self.source)
            .case_insensitive(!self.case_sensitive)
            .build()
    }

    /// Cached regex; `None` (after one warning) if the pattern does not compile.
    pub fn regex(&self) -> Option<&Regex> {
        self.compiled
            .get_or_init(|| match self.compile() {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(pattern = %self.source, error = %e, "Failed to compile rubric pattern");
                    None
                }
            })
            .as_ref()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex().is_some_and(|re| re.is_match(text))
    }

    pub fn count(&self, text: &str) -> usize {
        self.regex().map_or(0, |re| re.find_iter(text).count())
    }
}

/// A test over submission content.
///
/// Content predicates look at the probe's target text; artifact predicates
/// (`resolved`, `merged`, `present`, `file_name`) look at the resolution.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Case-sensitive substring
    Contains(String),
    /// Any of several terms, case-insensitive substring
    AnyOf(Vec<String>),
    Matches(Pattern),
    Count { pattern: Pattern, at_least: usize },
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
    Not(Box<Predicate>),
    AtLeast { n: usize, of: Vec<Predicate> },
    /// Evaluate `check` against one artifact's own content
    Within { artifact: String, check: Box<Predicate> },
    Resolved(String),
    Merged(String),
    Present(String),
    NamespaceFound(bool),
    FileName { artifact: String, pattern: Pattern },
}

/// What a predicate is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub store: &'a ContentStore,
    pub text: &'a str,
}

impl<'a> Scope<'a> {
    pub fn new(store: &'a ContentStore, text: &'a str) -> Self {
        Self { store, text }
    }
}

impl Predicate {
    pub fn eval(&self, scope: Scope<'_>) -> bool {
        match self {
            Predicate::Contains(needle) => scope.text.contains(needle.as_str()),
            Predicate::AnyOf(terms) => {
                let haystack = scope.text.to_lowercase();
                terms
                    .iter()
                    .any(|t| haystack.contains(&t.to_lowercase()))
            }
            Predicate::Matches(pattern) => pattern.is_match(scope.text),
            Predicate::Count { pattern, at_least } => pattern.count(scope.text) >= *at_least,
            Predicate::All(preds) => preds.iter().all(|p| p.eval(scope)),
            Predicate::Any(preds) => preds.iter().any(|p| p.eval(scope)),
            Predicate::Not(pred) => !pred.eval(scope),
            Predicate::AtLeast { n, of } => of.iter().filter(|p| p.eval(scope)).count() >= *n,
            Predicate::Within { artifact, check } => {
                let text = scope.store.text(artifact);
                check.eval(Scope::new(scope.store, text))
            }
            Predicate::Resolved(key) => {
                matches!(scope.store.binding(key), Some(Binding::File(_)))
            }
            Predicate::Merged(key) => {
                matches!(scope.store.binding(key), Some(Binding::Merged { .. }))
            }
            Predicate::Present(key) => !scope.store.text(key).is_empty(),
            Predicate::NamespaceFound(expected) => {
                scope.store.layout().namespace_dir.is_some() == *expected
            }
            Predicate::FileName { artifact, pattern } => scope
                .store
                .file_name(artifact)
                .is_some_and(|name| pattern.is_match(&name)),
        }
    }

    /// Every pattern in this predicate, depth-first.
    pub fn patterns(&self) -> Vec<&Pattern> {
        let mut out = Vec::new();
        self.collect_patterns(&mut out);
        out
    }

    fn collect_patterns<'p>(&'p self, out: &mut Vec<&'p Pattern>) {
        match self {
            Predicate::Matches(p) | Predicate::Count { pattern: p, .. } => out.push(p),
            Predicate::FileName { pattern, .. } => out.push(pattern),
            Predicate::All(preds) | Predicate::Any(preds) | Predicate::AtLeast { of: preds, .. } => {
                for p in preds {
                    p.collect_patterns(out);
                }
            }
            Predicate::Not(p) | Predicate::Within { check: p, .. } => p.collect_patterns(out),
            _ => {}
        }
    }

    /// Artifact keys this predicate names explicitly.
    pub fn artifact_refs(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_refs(&mut out);
        out
    }

    fn collect_refs<'p>(&'p self, out: &mut Vec<&'p str>) {
        match self {
            Predicate::Resolved(k) | Predicate::Merged(k) | Predicate::Present(k) => out.push(k),
            Predicate::FileName { artifact, .. } => out.push(artifact),
            Predicate::Within { artifact, check } => {
                out.push(artifact);
                check.collect_refs(out);
            }
            Predicate::All(preds) | Predicate::Any(preds) | Predicate::AtLeast { of: preds, .. } => {
                for p in preds {
                    p.collect_refs(out);
                }
            }
            Predicate::Not(p) => p.collect_refs(out),
            _ => {}
        }
    }
}
