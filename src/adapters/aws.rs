use super::service::{
    ClassificationJobDescription, ClassificationJobRequest, ClassifierDescription, ClassifierMetadata,
    ClassifierRequest, ComprehendApi, DetectedEntity, EvaluationMetrics, InputFormat, SentimentResult,
};
use super::settings::AwsSettings;
use crate::core::status::{ClassifierStatus, JobStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_comprehend::config::Region;
use aws_sdk_comprehend::primitives::DateTime as AwsDateTime;
use aws_sdk_comprehend::types::{
    self as model, DocumentClassifierInputDataConfig, InputDataConfig, LanguageCode, OutputDataConfig,
};
use aws_sdk_comprehend::Client;
use chrono::{DateTime, Utc};
use log::{debug, info};

pub struct AwsComprehend {
    client: Client,
}

impl AwsComprehend {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from the default credential chain, narrowed by the
    /// profile and region in `settings` when they are set.
    pub async fn from_settings(settings: &AwsSettings) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile) = &settings.profile {
            info!("Using AWS profile: {}", profile);
            loader = loader.profile_name(profile);
        }
        if let Some(region) = &settings.region {
            info!("Using AWS region: {}", region);
            loader = loader.region(Region::new(region.clone()));
        }
        let config = loader.load().await;
        Self::new(Client::new(&config))
    }
}

fn to_utc(time: Option<&AwsDateTime>) -> Option<DateTime<Utc>> {
    time.and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()))
}

fn to_input_format(format: InputFormat) -> model::InputFormat {
    match format {
        InputFormat::OneDocPerLine => model::InputFormat::OneDocPerLine,
        InputFormat::OneDocPerFile => model::InputFormat::OneDocPerFile,
    }
}

fn to_metadata(meta: &model::ClassifierMetadata) -> ClassifierMetadata {
    ClassifierMetadata {
        number_of_labels: meta.number_of_labels(),
        number_of_trained_documents: meta.number_of_trained_documents(),
        number_of_test_documents: meta.number_of_test_documents(),
        evaluation_metrics: meta.evaluation_metrics().map(|m| EvaluationMetrics {
            accuracy: m.accuracy(),
            f1_score: m.f1_score(),
            precision: m.precision(),
            recall: m.recall(),
        }),
    }
}

#[async_trait]
impl ComprehendApi for AwsComprehend {
    async fn create_document_classifier(&self, request: &ClassifierRequest) -> Result<String> {
        let response = self
            .client
            .create_document_classifier()
            .document_classifier_name(&request.name)
            .language_code(LanguageCode::from(request.language_code.as_str()))
            .data_access_role_arn(&request.role_arn)
            .input_data_config(
                DocumentClassifierInputDataConfig::builder()
                    .s3_uri(&request.training_data_uri)
                    .build(),
            )
            .send()
            .await
            .context("CreateDocumentClassifier request failed")?;

        debug!("Response: {:?}", response);
        response
            .document_classifier_arn()
            .map(str::to_string)
            .context("CreateDocumentClassifier response has no classifier ARN")
    }

    async fn describe_document_classifier(&self, classifier_arn: &str) -> Result<ClassifierDescription> {
        let response = self
            .client
            .describe_document_classifier()
            .document_classifier_arn(classifier_arn)
            .send()
            .await
            .with_context(|| format!("DescribeDocumentClassifier request failed for {}", classifier_arn))?;

        let props = response
            .document_classifier_properties()
            .context("DescribeDocumentClassifier response has no classifier properties")?;
        let status = props
            .status()
            .map(|s| ClassifierStatus::from_service(s.as_str()))
            .context("Classifier properties have no status")?;

        Ok(ClassifierDescription {
            arn: props.document_classifier_arn().unwrap_or(classifier_arn).to_string(),
            status,
            message: props.message().map(str::to_string),
            training_started_at: to_utc(props.training_start_time()),
            training_ended_at: to_utc(props.training_end_time()),
            metadata: props.classifier_metadata().map(to_metadata),
        })
    }

    async fn start_classification_job(&self, request: &ClassificationJobRequest) -> Result<String> {
        let input = InputDataConfig::builder()
            .s3_uri(&request.input_uri)
            .input_format(to_input_format(request.input_format))
            .build()
            .context("Invalid classification job input configuration")?;
        let output = OutputDataConfig::builder()
            .s3_uri(&request.output_uri)
            .build()
            .context("Invalid classification job output configuration")?;

        let response = self
            .client
            .start_document_classification_job()
            .job_name(&request.job_name)
            .data_access_role_arn(&request.role_arn)
            .document_classifier_arn(&request.classifier_arn)
            .input_data_config(input)
            .output_data_config(output)
            .send()
            .await
            .context("StartDocumentClassificationJob request failed")?;

        debug!("Response: {:?}", response);
        response
            .job_id()
            .map(str::to_string)
            .context("StartDocumentClassificationJob response has no job id")
    }

    async fn describe_classification_job(&self, job_id: &str) -> Result<ClassificationJobDescription> {
        let response = self
            .client
            .describe_document_classification_job()
            .job_id(job_id)
            .send()
            .await
            .with_context(|| format!("DescribeDocumentClassificationJob request failed for {}", job_id))?;

        let props = response
            .document_classification_job_properties()
            .context("DescribeDocumentClassificationJob response has no job properties")?;
        let status = props
            .job_status()
            .map(|s| JobStatus::from_service(s.as_str()))
            .context("Job properties have no status")?;

        Ok(ClassificationJobDescription {
            job_id: props.job_id().unwrap_or(job_id).to_string(),
            job_name: props.job_name().map(str::to_string),
            status,
            message: props.message().map(str::to_string),
            submitted_at: to_utc(props.submit_time()),
            ended_at: to_utc(props.end_time()),
            output_uri: props.output_data_config().map(|c| c.s3_uri().to_string()),
        })
    }

    async fn detect_sentiment(&self, language_code: &str, text: &str) -> Result<SentimentResult> {
        let response = self
            .client
            .detect_sentiment()
            .language_code(LanguageCode::from(language_code))
            .text(text)
            .send()
            .await
            .context("DetectSentiment request failed")?;

        let score = response.sentiment_score();
        Ok(SentimentResult {
            sentiment: response
                .sentiment()
                .map(|s| s.as_str().to_string())
                .context("DetectSentiment response has no sentiment")?,
            positive: score.and_then(|s| s.positive()),
            negative: score.and_then(|s| s.negative()),
            neutral: score.and_then(|s| s.neutral()),
            mixed: score.and_then(|s| s.mixed()),
        })
    }

    async fn detect_entities(&self, language_code: &str, text: &str) -> Result<Vec<DetectedEntity>> {
        let response = self
            .client
            .detect_entities()
            .language_code(LanguageCode::from(language_code))
            .text(text)
            .send()
            .await
            .context("DetectEntities request failed")?;

        Ok(response
            .entities()
            .iter()
            .map(|entity| DetectedEntity {
                text: entity.text().unwrap_or_default().to_string(),
                entity_type: entity.r#type().map(|t| t.as_str().to_string()).unwrap_or_default(),
                score: entity.score(),
            })
            .collect())
    }
}
