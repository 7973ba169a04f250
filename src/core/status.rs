use serde::{Serialize, Serializer};
use std::fmt;

/// Opaque identifier of a long-running remote operation: a classifier ARN or
/// a batch job id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationHandle(String);

impl OperationHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for OperationHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Categorises a status reported by the service.
///
/// A failure state is still terminal: polling ends normally and the caller
/// decides what to do with it.
pub trait OperationStatus: fmt::Display {
    fn is_terminal(&self) -> bool;

    fn is_failure(&self) -> bool;

    fn is_success(&self) -> bool {
        self.is_terminal() && !self.is_failure()
    }
}

/// Lifecycle of a custom document classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierStatus {
    Submitted,
    Training,
    Deleting,
    StopRequested,
    Stopped,
    InError,
    Trained,
    Unknown(String),
}

impl ClassifierStatus {
    pub fn from_service(value: &str) -> Self {
        match value {
            "SUBMITTED" => Self::Submitted,
            "TRAINING" => Self::Training,
            "DELETING" => Self::Deleting,
            "STOP_REQUESTED" => Self::StopRequested,
            "STOPPED" => Self::Stopped,
            "IN_ERROR" => Self::InError,
            "TRAINED" => Self::Trained,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Submitted => "SUBMITTED",
            Self::Training => "TRAINING",
            Self::Deleting => "DELETING",
            Self::StopRequested => "STOP_REQUESTED",
            Self::Stopped => "STOPPED",
            Self::InError => "IN_ERROR",
            Self::Trained => "TRAINED",
            Self::Unknown(other) => other.as_str(),
        }
    }
}

impl OperationStatus for ClassifierStatus {
    fn is_terminal(&self) -> bool {
        matches!(self, Self::Trained | Self::InError | Self::Stopped)
    }

    fn is_failure(&self) -> bool {
        matches!(self, Self::InError | Self::Stopped)
    }
}

/// Lifecycle of a batch classification job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Submitted,
    InProgress,
    StopRequested,
    Stopped,
    Failed,
    Completed,
    Unknown(String),
}

impl JobStatus {
    pub fn from_service(value: &str) -> Self {
        match value {
            "SUBMITTED" => Self::Submitted,
            "IN_PROGRESS" => Self::InProgress,
            "STOP_REQUESTED" => Self::StopRequested,
            "STOPPED" => Self::Stopped,
            "FAILED" => Self::Failed,
            "COMPLETED" => Self::Completed,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Submitted => "SUBMITTED",
            Self::InProgress => "IN_PROGRESS",
            Self::StopRequested => "STOP_REQUESTED",
            Self::Stopped => "STOPPED",
            Self::Failed => "FAILED",
            Self::Completed => "COMPLETED",
            Self::Unknown(other) => other.as_str(),
        }
    }
}

impl OperationStatus for JobStatus {
    fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Stopped)
    }

    fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Stopped)
    }
}

macro_rules! service_string {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.serialize_str(self.as_str())
                }
            }
        )*
    };
}

service_string!(ClassifierStatus, JobStatus);
