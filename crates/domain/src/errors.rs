//! Error types for evaljobs.
//!
//! Every failure an invocation can hit maps onto one variant of
//! [`EvalJobsError`]. Remote messages are carried verbatim so the operator sees
//! exactly what the hub or the job service reported.

/// Result alias used across the domain and application crates
pub type EvalJobsResult<T> = Result<T, EvalJobsError>;

/// Top-level error taxonomy
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalJobsError {
    /// The eval reference could not be classified or points at nothing
    #[error("Invalid eval reference '{reference}': {reason}")]
    InvalidReference {
        /// The string supplied by the operator
        reference: String,
        /// Why it was rejected
        reason: String,
    },

    /// A request parameter failed local validation
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No access token available
    #[error("{0} environment variable not set")]
    MissingCredentials(String),

    /// Hosting API failure while preparing the location or uploading artifacts
    #[error("Failed to publish to {target}: {message}")]
    PublishError {
        /// Repository or file the operation targeted
        target: String,
        /// Underlying remote message
        message: String,
    },

    /// The job API rejected the submission
    #[error("Job submission rejected: {0}")]
    SubmissionError(String),

    /// The evaluation errored, was cancelled or timed out on the remote side
    #[error("Remote job {job_id} ended with {stage}: {message} ({published} artifact(s) published)")]
    RemoteJobFailure {
        /// Remote job identifier
        job_id: String,
        /// Terminal stage reported by the job service
        stage: String,
        /// Remote message, if any
        message: String,
        /// Number of partial artifacts that were still published
        published: usize,
    },

    /// Result retrieval or result publication failed
    #[error("Failed to collect results for job {job_id}: {message}")]
    CollectionError {
        /// Remote job identifier
        job_id: String,
        /// Underlying message
        message: String,
    },
}

impl EvalJobsError {
    /// Create an invalid reference error
    pub fn invalid_reference(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    /// Create a publish error
    pub fn publish(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PublishError {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create a collection error
    pub fn collection(job_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CollectionError {
            job_id: job_id.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code, used in JSON output
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidReference { .. } => "INVALID_REFERENCE",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::MissingCredentials(_) => "MISSING_CREDENTIALS",
            Self::PublishError { .. } => "PUBLISH_ERROR",
            Self::SubmissionError(_) => "SUBMISSION_ERROR",
            Self::RemoteJobFailure { .. } => "REMOTE_JOB_FAILURE",
            Self::CollectionError { .. } => "COLLECTION_ERROR",
        }
    }

    /// Whether the failure happened before anything was sent to a remote service
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::InvalidReference { .. } | Self::InvalidRequest(_) | Self::MissingCredentials(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            EvalJobsError::invalid_reference("x", "nope").error_code(),
            "INVALID_REFERENCE"
        );
        assert_eq!(
            EvalJobsError::SubmissionError("quota".into()).error_code(),
            "SUBMISSION_ERROR"
        );
    }

    #[test]
    fn test_local_errors() {
        assert!(EvalJobsError::MissingCredentials("HF_TOKEN".into()).is_local());
        assert!(EvalJobsError::InvalidRequest("empty model".into()).is_local());
        assert!(!EvalJobsError::publish("datasets/a/b", "401").is_local());
    }

    #[test]
    fn test_remote_failure_message() {
        let err = EvalJobsError::RemoteJobFailure {
            job_id: "abc".into(),
            stage: "ERROR".into(),
            message: "CUDA out of memory".into(),
            published: 2,
        };
        let text = err.to_string();
        assert!(text.contains("abc"));
        assert!(text.contains("CUDA out of memory"));
        assert!(text.contains("2 artifact(s)"));
    }
}
