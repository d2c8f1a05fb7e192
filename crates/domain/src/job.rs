//! Job request value types.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{EvalJobsError, EvalJobsResult};
use crate::eval_source::EvalSource;
use crate::hosting::HostingLocation;

/// Default flavor when `--flavor` is omitted
pub const DEFAULT_FLAVOR: HardwareFlavor = HardwareFlavor::CpuBasic;

/// Default job timeout as typed on the command line
pub const DEFAULT_TIMEOUT: &str = "30m";

macro_rules! flavors {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Remote compute tier requested for a job
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum HardwareFlavor {
            $(
                #[doc = $name]
                #[serde(rename = $name)]
                $variant,
            )+
        }

        impl HardwareFlavor {
            /// Every flavor the job service accepts
            pub const ALL: &'static [HardwareFlavor] = &[$(HardwareFlavor::$variant),+];

            /// Wire name of the flavor
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(HardwareFlavor::$variant => $name,)+
                }
            }
        }

        impl FromStr for HardwareFlavor {
            type Err = EvalJobsError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($name => Ok(HardwareFlavor::$variant),)+
                    other => Err(EvalJobsError::InvalidRequest(format!(
                        "unknown hardware flavor '{}', expected one of: {}",
                        other,
                        HardwareFlavor::ALL
                            .iter()
                            .map(|f| f.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ))),
                }
            }
        }
    };
}

flavors! {
    CpuBasic => "cpu-basic",
    CpuUpgrade => "cpu-upgrade",
    CpuXl => "cpu-xl",
    T4Small => "t4-small",
    T4Medium => "t4-medium",
    L4x1 => "l4x1",
    L4x4 => "l4x4",
    A10gSmall => "a10g-small",
    A10gLarge => "a10g-large",
    A10gLargex2 => "a10g-largex2",
    A10gLargex4 => "a10g-largex4",
    A100Large => "a100-large",
    H100 => "h100",
    H100x8 => "h100x8",
}

impl HardwareFlavor {
    /// Whether the tier has a GPU attached
    pub fn has_gpu(&self) -> bool {
        !self.as_str().starts_with("cpu-")
    }
}

impl Default for HardwareFlavor {
    fn default() -> Self {
        DEFAULT_FLAVOR
    }
}

impl Display for HardwareFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job timeout, keeping the text the operator typed for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobTimeout {
    raw: String,
    duration: Duration,
}

impl JobTimeout {
    /// Parsed duration
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Whole seconds, as sent to the job service
    pub fn as_secs(&self) -> u64 {
        self.duration.as_secs()
    }

    /// Whether this is the default `30m`
    pub fn is_default(&self) -> bool {
        self.duration == Duration::from_secs(30 * 60)
    }
}

impl Default for JobTimeout {
    fn default() -> Self {
        Self {
            raw: DEFAULT_TIMEOUT.to_string(),
            duration: Duration::from_secs(30 * 60),
        }
    }
}

impl FromStr for JobTimeout {
    type Err = EvalJobsError;

    /// Accepts `90s`, `30m`, `2h`, `1h 30m` or a bare number of seconds
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let duration = match raw.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => humantime::parse_duration(raw).map_err(|e| {
                EvalJobsError::InvalidRequest(format!("invalid timeout '{}': {}", raw, e))
            })?,
        };
        if duration.as_secs() == 0 {
            return Err(EvalJobsError::InvalidRequest(format!(
                "timeout '{}' must be at least one second",
                raw
            )));
        }
        Ok(Self {
            raw: raw.to_string(),
            duration,
        })
    }
}

impl Display for JobTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Non-empty list of model identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelList(Vec<String>);

impl ModelList {
    /// Parse a comma-separated `--model` value
    pub fn parse(value: &str) -> EvalJobsResult<Self> {
        if value.trim().is_empty() {
            return Err(EvalJobsError::InvalidRequest(
                "--model must name at least one model".to_string(),
            ));
        }
        let models: Vec<String> = value.split(',').map(|m| m.trim().to_string()).collect();
        if models.iter().any(|m| m.is_empty()) {
            return Err(EvalJobsError::InvalidRequest(format!(
                "--model '{}' contains an empty model identifier",
                value
            )));
        }
        Ok(Self(models))
    }

    /// Individual identifiers
    pub fn models(&self) -> &[String] {
        &self.0
    }

    /// Number of models
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// More than one model
    pub fn is_set(&self) -> bool {
        self.0.len() > 1
    }

    /// Comma-separated form understood by the evaluation framework
    pub fn as_arg(&self) -> String {
        self.0.join(",")
    }

    /// One single-model list per identifier
    pub fn split(&self) -> Vec<ModelList> {
        self.0.iter().map(|m| ModelList(vec![m.clone()])).collect()
    }
}

impl Display for ModelList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_arg())
    }
}

impl TryFrom<String> for ModelList {
    type Error = EvalJobsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ModelList> for String {
    fn from(list: ModelList) -> Self {
        list.as_arg()
    }
}

/// How several `--model` values are turned into jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MultiModelPolicy {
    /// One job; the framework runs the models as an eval set
    #[default]
    EvalSet,
    /// One independent job per model
    PerModel,
}

impl FromStr for MultiModelPolicy {
    type Err = EvalJobsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "eval-set" | "eval_set" | "set" => Ok(Self::EvalSet),
            "per-model" | "per_model" | "parallel" => Ok(Self::PerModel),
            other => Err(EvalJobsError::InvalidRequest(format!(
                "unknown multi-model policy '{}', expected eval-set or per-model",
                other
            ))),
        }
    }
}

impl Display for MultiModelPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EvalSet => write!(f, "eval-set"),
            Self::PerModel => write!(f, "per-model"),
        }
    }
}

/// Everything needed to submit one invocation's jobs
#[derive(Debug, Clone)]
pub struct JobRequest {
    /// Resolved eval reference
    pub source: EvalSource,
    /// Model identifier(s)
    pub models: ModelList,
    /// Where scripts, logs and exports go
    pub location: HostingLocation,
    /// Compute tier
    pub flavor: HardwareFlavor,
    /// Remote timeout
    pub timeout: JobTimeout,
    /// Optional cap on evaluated samples
    pub limit: Option<u32>,
    /// Extra arguments passed through to the evaluation framework
    pub extra_args: Vec<String>,
    /// Multi-model submission policy
    pub policy: MultiModelPolicy,
}

impl JobRequest {
    /// Build a request with default flavor, timeout and policy
    pub fn new(source: EvalSource, models: ModelList, location: HostingLocation) -> Self {
        Self {
            source,
            models,
            location,
            flavor: HardwareFlavor::default(),
            timeout: JobTimeout::default(),
            limit: None,
            extra_args: Vec::new(),
            policy: MultiModelPolicy::default(),
        }
    }

    /// Set the hardware flavor
    pub fn with_flavor(mut self, flavor: HardwareFlavor) -> Self {
        self.flavor = flavor;
        self
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: JobTimeout) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the sample limit
    pub fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    /// Set pass-through arguments
    pub fn with_extra_args(mut self, extra_args: Vec<String>) -> Self {
        self.extra_args = extra_args;
        self
    }

    /// Set the multi-model policy
    pub fn with_policy(mut self, policy: MultiModelPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Local validation performed before any remote call
    pub fn validate(&self) -> EvalJobsResult<()> {
        if self.limit == Some(0) {
            return Err(EvalJobsError::InvalidRequest(
                "--limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Model lists to submit, one entry per job
    pub fn job_batches(&self) -> Vec<ModelList> {
        match self.policy {
            MultiModelPolicy::EvalSet => vec![self.models.clone()],
            MultiModelPolicy::PerModel => self.models.split(),
        }
    }
}

/// Lifecycle stage reported by the job service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStage {
    /// Accepted, not yet running
    Pending,
    /// Running
    Running,
    /// Finished successfully
    Completed,
    /// Failed
    Error,
    /// Cancelled by the owner
    Canceled,
    /// Removed before completion
    Deleted,
    /// Local wait deadline elapsed; never sent by the service
    #[serde(skip)]
    TimedOut,
    /// Anything newer than this client knows about
    #[serde(other)]
    Unknown,
}

impl JobStage {
    /// No further transitions expected
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Error | Self::Canceled | Self::Deleted | Self::TimedOut
        )
    }

    /// Finished successfully
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Error => "ERROR",
            Self::Canceled => "CANCELED",
            Self::Deleted => "DELETED",
            Self::TimedOut => "TIMED_OUT",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(models: &str) -> JobRequest {
        JobRequest::new(
            EvalSource::Package {
                id: "inspect_evals/gpqa_diamond".into(),
            },
            ModelList::parse(models).unwrap(),
            HostingLocation::new("alice", "gpqa").unwrap(),
        )
    }

    #[test]
    fn test_flavor_round_trip_names() {
        for flavor in HardwareFlavor::ALL {
            assert_eq!(flavor.as_str().parse::<HardwareFlavor>().unwrap(), *flavor);
        }
        assert_eq!(HardwareFlavor::ALL.len(), 14);
        assert!(!HardwareFlavor::CpuBasic.has_gpu());
        assert!(HardwareFlavor::A10gLarge.has_gpu());
    }

    #[test]
    fn test_unknown_flavor() {
        let err = "tpu-v5".parse::<HardwareFlavor>().unwrap_err();
        assert!(err.to_string().contains("cpu-basic"));
    }

    #[test]
    fn test_flavor_serde_uses_wire_names() {
        let json = serde_json::to_string(&HardwareFlavor::A10gLargex2).unwrap();
        assert_eq!(json, "\"a10g-largex2\"");
    }

    #[test]
    fn test_timeout_parsing() {
        assert_eq!("30m".parse::<JobTimeout>().unwrap().as_secs(), 1800);
        assert_eq!("2h".parse::<JobTimeout>().unwrap().as_secs(), 7200);
        assert_eq!("90s".parse::<JobTimeout>().unwrap().as_secs(), 90);
        assert_eq!("45".parse::<JobTimeout>().unwrap().as_secs(), 45);
        assert!("0".parse::<JobTimeout>().is_err());
        assert!("soon".parse::<JobTimeout>().is_err());
        assert!(JobTimeout::default().is_default());
        assert_eq!("1h".parse::<JobTimeout>().unwrap().to_string(), "1h");
    }

    #[test]
    fn test_model_list() {
        let list = ModelList::parse("openai/gpt-4o, hf/meta-llama/Llama-3.1-8B").unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.is_set());
        assert_eq!(list.as_arg(), "openai/gpt-4o,hf/meta-llama/Llama-3.1-8B");
        assert_eq!(list.split().len(), 2);
    }

    #[test]
    fn test_empty_model_rejected() {
        assert!(ModelList::parse("").is_err());
        assert!(ModelList::parse("   ").is_err());
        assert!(ModelList::parse("a,,b").is_err());
        assert!(ModelList::parse("a,").is_err());
    }

    #[test]
    fn test_job_batches() {
        let req = request("m1,m2,m3");
        assert_eq!(req.job_batches().len(), 1);
        let req = req.with_policy(MultiModelPolicy::PerModel);
        let batches = req.job_batches();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[1].as_arg(), "m2");
    }

    #[test]
    fn test_zero_limit_rejected() {
        assert!(request("m").with_limit(Some(0)).validate().is_err());
        assert!(request("m").with_limit(Some(10)).validate().is_ok());
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("per-model".parse::<MultiModelPolicy>().unwrap(), MultiModelPolicy::PerModel);
        assert_eq!("eval-set".parse::<MultiModelPolicy>().unwrap(), MultiModelPolicy::EvalSet);
        assert!("both".parse::<MultiModelPolicy>().is_err());
    }

    #[test]
    fn test_job_stage_wire_format() {
        let stage: JobStage = serde_json::from_str("\"COMPLETED\"").unwrap();
        assert!(stage.is_success());
        let stage: JobStage = serde_json::from_str("\"SCHEDULING\"").unwrap();
        assert_eq!(stage, JobStage::Unknown);
        assert!(!stage.is_terminal());
        assert!(JobStage::TimedOut.is_terminal());
    }
}
