//! Eval reference classification.
//!
//! The operator passes one string. It is a local script, a pre-built package
//! reference known to the evaluation framework (`inspect_evals/gpqa_diamond`),
//! or a Space that hosts an eval script.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::path::PathBuf;
use url::Url;

use crate::errors::{EvalJobsError, EvalJobsResult};
use crate::hosting::{is_valid_segment, RepoId};

/// A resolved eval reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvalSource {
    /// Script on the local filesystem, uploaded before submission
    Local {
        /// Path to the script as resolved against the working directory
        path: PathBuf,
        /// File name component, used for titles
        file_name: String,
    },
    /// Pre-built eval available on the execution environment
    Package {
        /// `namespace/name` reference handed to the evaluation framework
        id: String,
    },
    /// Eval script hosted in a Space, fetched by the remote job
    Hosted {
        /// Source Space
        space: RepoId,
    },
}

impl EvalSource {
    /// Short kind label for logs and tables
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Local { .. } => "local",
            Self::Package { .. } => "package",
            Self::Hosted { .. } => "hosted",
        }
    }

    /// Human-readable eval name, used for card titles
    pub fn eval_name(&self) -> String {
        match self {
            Self::Local { path, file_name } => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| file_name.clone()),
            Self::Package { id } => id
                .split_once('/')
                .map(|(_, task)| task.to_string())
                .unwrap_or_else(|| id.clone()),
            Self::Hosted { space } => space.name().to_string(),
        }
    }

    /// Whether the job hands the reference straight to the framework
    pub fn is_package(&self) -> bool {
        matches!(self, Self::Package { .. })
    }
}

impl Display for EvalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { path, .. } => write!(f, "{}", path.display()),
            Self::Package { id } => write!(f, "{}", id),
            Self::Hosted { space } => write!(f, "spaces/{}", space),
        }
    }
}

/// Classifies eval references relative to a working directory
#[derive(Debug, Clone)]
pub struct Resolver {
    base_dir: PathBuf,
}

impl Resolver {
    /// Resolver rooted at `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Resolver rooted at the process working directory
    pub fn from_current_dir() -> EvalJobsResult<Self> {
        let dir = std::env::current_dir().map_err(|e| {
            EvalJobsError::InvalidRequest(format!("cannot read working directory: {}", e))
        })?;
        Ok(Self::new(dir))
    }

    /// Classify `input` into exactly one [`EvalSource`]
    pub fn resolve(&self, input: &str) -> EvalJobsResult<EvalSource> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(EvalJobsError::invalid_reference(input, "reference is empty"));
        }

        let candidate = self.base_dir.join(trimmed);
        if candidate.is_file() {
            let file_name = candidate
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| trimmed.to_string());
            return Ok(EvalSource::Local {
                path: candidate,
                file_name,
            });
        }
        if candidate.is_dir() {
            return Err(EvalJobsError::invalid_reference(
                input,
                "is a directory, expected an eval script",
            ));
        }

        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return parse_space_url(trimmed).map(|space| EvalSource::Hosted { space });
        }

        if let Some(rest) = trimmed.strip_prefix("spaces/") {
            return parse_identifier(rest.trim_end_matches('/'))
                .map(|space| EvalSource::Hosted { space })
                .ok_or_else(|| {
                    EvalJobsError::invalid_reference(input, "expected spaces/<namespace>/<name>")
                });
        }

        if !looks_like_path(trimmed) && parse_identifier(trimmed).is_some() {
            return Ok(EvalSource::Package {
                id: trimmed.to_string(),
            });
        }

        let reason = if looks_like_path(trimmed) {
            "file not found"
        } else {
            "not a local file, a Space URL, or a namespace/name package reference"
        };
        Err(EvalJobsError::invalid_reference(input, reason))
    }
}

fn looks_like_path(input: &str) -> bool {
    input.ends_with(".py")
        || input.starts_with('.')
        || input.starts_with('/')
        || input.starts_with('~')
        || input.contains('\\')
        || input.matches('/').count() > 1
}

fn parse_identifier(input: &str) -> Option<RepoId> {
    let (namespace, name) = input.split_once('/')?;
    if name.contains('/') || !is_valid_segment(namespace) || !is_valid_segment(name) {
        return None;
    }
    RepoId::new(namespace, name).ok()
}

fn parse_space_url(input: &str) -> EvalJobsResult<RepoId> {
    let url = Url::parse(input)
        .map_err(|e| EvalJobsError::invalid_reference(input, format!("malformed URL: {}", e)))?;
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    match segments.as_slice() {
        ["spaces", namespace, name, ..] => RepoId::new(*namespace, *name)
            .map_err(|_| EvalJobsError::invalid_reference(input, "malformed Space id in URL")),
        _ => Err(EvalJobsError::invalid_reference(
            input,
            "only Space URLs (<host>/spaces/<namespace>/<name>) are supported",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::fs;

    fn resolver() -> (tempfile::TempDir, Resolver) {
        let dir = tempfile::tempdir().unwrap();
        let resolver = Resolver::new(dir.path());
        (dir, resolver)
    }

    #[test]
    fn test_local_script() {
        let (dir, resolver) = resolver();
        fs::write(dir.path().join("my_eval.py"), "print('hi')").unwrap();

        let source = resolver.resolve("my_eval.py").unwrap();
        match &source {
            EvalSource::Local { path, file_name } => {
                assert_eq!(file_name, "my_eval.py");
                assert!(path.ends_with("my_eval.py"));
            }
            other => panic!("unexpected source {:?}", other),
        }
        assert_eq!(source.eval_name(), "my_eval");
        assert_eq!(source.kind(), "local");
    }

    #[test]
    fn test_local_file_shadows_package_shape() {
        let (dir, resolver) = resolver();
        fs::create_dir(dir.path().join("evals")).unwrap();
        fs::write(dir.path().join("evals/gpqa"), "task").unwrap();

        let source = resolver.resolve("evals/gpqa").unwrap();
        assert_eq!(source.kind(), "local");
    }

    #[test]
    fn test_directory_rejected() {
        let (dir, resolver) = resolver();
        fs::create_dir(dir.path().join("evals")).unwrap();
        let err = resolver.resolve("evals").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_REFERENCE");
    }

    #[test]
    fn test_package_reference() {
        let (_dir, resolver) = resolver();
        let source = resolver.resolve("inspect_evals/gpqa_diamond").unwrap();
        assert_eq!(
            source,
            EvalSource::Package {
                id: "inspect_evals/gpqa_diamond".into()
            }
        );
        assert_eq!(source.eval_name(), "gpqa_diamond");
    }

    #[test]
    fn test_space_url() {
        let (_dir, resolver) = resolver();
        let source = resolver
            .resolve("https://huggingface.co/spaces/alice/midicaps/")
            .unwrap();
        assert_eq!(
            source,
            EvalSource::Hosted {
                space: RepoId::new("alice", "midicaps").unwrap()
            }
        );
    }

    #[test]
    fn test_space_prefix() {
        let (_dir, resolver) = resolver();
        let source = resolver.resolve("spaces/alice/midicaps").unwrap();
        assert_eq!(source.kind(), "hosted");
        assert_eq!(source.to_string(), "spaces/alice/midicaps");
    }

    #[test]
    fn test_non_space_url_rejected() {
        let (_dir, resolver) = resolver();
        let err = resolver
            .resolve("https://example.com/evals/eval.py")
            .unwrap_err();
        assert!(matches!(err, EvalJobsError::InvalidReference { .. }));
    }

    #[test]
    fn test_unrecognized_shapes() {
        let (_dir, resolver) = resolver();
        for input in ["", "   ", "gpqa", "missing.py", "./eval.py", "a/b/c", "spaces/alice"] {
            assert!(
                matches!(resolver.resolve(input), Err(EvalJobsError::InvalidReference { .. })),
                "expected {:?} to be rejected",
                input
            );
        }
    }

    proptest! {
        #[test]
        fn prop_existing_scripts_are_local(stem in "[a-z][a-z0-9_]{0,20}") {
            let (dir, resolver) = resolver();
            let file = format!("{}.py", stem);
            fs::write(dir.path().join(&file), "pass").unwrap();
            let source = resolver.resolve(&file).unwrap();
            prop_assert_eq!(source.kind(), "local");
        }

        #[test]
        fn prop_missing_paths_are_invalid(
            parts in proptest::collection::vec("[a-z][a-z0-9_]{0,10}", 1..4),
        ) {
            let (_dir, resolver) = resolver();
            let input = format!("{}.py", parts.join("/"));
            let is_invalid = matches!(
                resolver.resolve(&input),
                Err(EvalJobsError::InvalidReference { .. })
            );
            prop_assert!(is_invalid);
        }

        #[test]
        fn prop_namespaced_ids_are_packages(
            namespace in "[a-z][a-z0-9_-]{0,15}",
            name in "[a-z][a-z0-9_-]{0,15}",
        ) {
            prop_assume!(namespace != "spaces");
            let (_dir, resolver) = resolver();
            let input = format!("{}/{}", namespace, name);
            let source = resolver.resolve(&input).unwrap();
            prop_assert_eq!(source, EvalSource::Package { id: input });
        }
    }
}
