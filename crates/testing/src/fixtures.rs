//! Test fixtures.

use crate::builders::InspectLogBuilder;
use evaljobs_application::services::Invocation;
use evaljobs_domain::RepoId;
use std::path::{Path, PathBuf};

/// Token handed to pipelines under test
pub const TEST_TOKEN: &str = "hf_test_token";

/// Account owning [`TEST_TOKEN`]
pub const TEST_ACCOUNT: &str = "alice";

/// Package reference used by most tests
pub const TEST_PACKAGE: &str = "inspect_evals/gpqa_diamond";

/// Minimal eval script
pub const TEST_SCRIPT: &str = r#"from inspect_ai import Task, task
from inspect_ai.dataset import Sample
from inspect_ai.scorer import match
from inspect_ai.solver import generate


@task
def arithmetic():
    return Task(
        dataset=[Sample(input="What is 2+2?", target="4")],
        solver=generate(),
        scorer=match(),
    )
"#;

/// Invocation of [`TEST_PACKAGE`] against one model
pub fn create_test_invocation(name: &str) -> Invocation {
    Invocation::new(TEST_PACKAGE, "openai/gpt-4o", name)
}

/// Repo id `alice/<name>`
pub fn create_test_repo(name: &str) -> RepoId {
    RepoId::new(TEST_ACCOUNT, name).unwrap_or_else(|e| panic!("invalid test repo {}: {}", name, e))
}

/// Write [`TEST_SCRIPT`] as `dir/<file_name>`
pub fn write_test_script(dir: &Path, file_name: &str) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, TEST_SCRIPT)
        .unwrap_or_else(|e| panic!("cannot write {}: {}", path.display(), e));
    path
}

/// Successful inspect log with two scored samples
pub fn create_test_log(model: &str) -> Vec<u8> {
    InspectLogBuilder::new("gpqa_diamond", model)
        .with_metric("choice", "accuracy", 0.5)
        .with_metric("choice", "stderr", 0.5)
        .with_sample(1, "Which gas is most abundant in air?", "A", "choice", "C")
        .with_sample(2, "What is the boiling point of water?", "B", "choice", "I")
        .build()
}

/// Log of a run that crashed after the first sample
pub fn create_partial_log(model: &str) -> Vec<u8> {
    InspectLogBuilder::new("gpqa_diamond", model)
        .with_status("error")
        .with_sample(1, "Which gas is most abundant in air?", "A", "choice", "C")
        .build()
}
