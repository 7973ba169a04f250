use crate::core::status::{ClassifierStatus, JobStatus, OperationStatus};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

#[cfg(test)]
use mockall::automock;

#[derive(Debug, Clone)]
pub struct ClassifierRequest {
    pub name: String,
    pub language_code: String,
    pub role_arn: String,
    pub training_data_uri: String,
}

/// How documents are laid out in the batch job's input files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFormat {
    #[default]
    OneDocPerLine,
    OneDocPerFile,
}

#[derive(Debug, Clone)]
pub struct ClassificationJobRequest {
    pub job_name: String,
    pub role_arn: String,
    pub classifier_arn: String,
    pub input_uri: String,
    pub input_format: InputFormat,
    pub output_uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationMetrics {
    pub accuracy: Option<f64>,
    pub f1_score: Option<f64>,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassifierMetadata {
    pub number_of_labels: Option<i32>,
    pub number_of_trained_documents: Option<i32>,
    pub number_of_test_documents: Option<i32>,
    pub evaluation_metrics: Option<EvaluationMetrics>,
}

/// Snapshot of a classifier as returned by a describe call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifierDescription {
    pub arn: String,
    pub status: ClassifierStatus,
    pub message: Option<String>,
    pub training_started_at: Option<DateTime<Utc>>,
    pub training_ended_at: Option<DateTime<Utc>>,
    pub metadata: Option<ClassifierMetadata>,
}

impl ClassifierDescription {
    pub fn new(arn: impl Into<String>, status: ClassifierStatus) -> Self {
        Self {
            arn: arn.into(),
            status,
            message: None,
            training_started_at: None,
            training_ended_at: None,
            metadata: None,
        }
    }
}

/// Snapshot of a batch classification job as returned by a describe call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationJobDescription {
    pub job_id: String,
    pub job_name: Option<String>,
    pub status: JobStatus,
    pub message: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub output_uri: Option<String>,
}

impl ClassificationJobDescription {
    pub fn new(job_id: impl Into<String>, status: JobStatus) -> Self {
        Self {
            job_id: job_id.into(),
            job_name: None,
            status,
            message: None,
            submitted_at: None,
            ended_at: None,
            output_uri: None,
        }
    }
}

macro_rules! status_of {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    fmt::Display::fmt(&self.status, f)
                }
            }

            impl OperationStatus for $ty {
                fn is_terminal(&self) -> bool {
                    self.status.is_terminal()
                }

                fn is_failure(&self) -> bool {
                    self.status.is_failure()
                }
            }
        )*
    };
}

status_of!(ClassifierDescription, ClassificationJobDescription);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentResult {
    pub sentiment: String,
    pub positive: Option<f32>,
    pub negative: Option<f32>,
    pub neutral: Option<f32>,
    pub mixed: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedEntity {
    pub text: String,
    pub entity_type: String,
    pub score: Option<f32>,
}

/// The subset of the Comprehend API this tool drives.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ComprehendApi: Send + Sync {
    /// Starts training and returns the new classifier's ARN.
    async fn create_document_classifier(&self, request: &ClassifierRequest) -> Result<String>;

    async fn describe_document_classifier(&self, classifier_arn: &str) -> Result<ClassifierDescription>;

    /// Starts a batch job and returns its id.
    async fn start_classification_job(&self, request: &ClassificationJobRequest) -> Result<String>;

    async fn describe_classification_job(&self, job_id: &str) -> Result<ClassificationJobDescription>;

    async fn detect_sentiment(&self, language_code: &str, text: &str) -> Result<SentimentResult>;

    async fn detect_entities(&self, language_code: &str, text: &str) -> Result<Vec<DetectedEntity>>;
}
