use crate::adapters::output::{job_report_lines, print_lines};
use crate::adapters::service::{ClassificationJobDescription, ClassificationJobRequest, ComprehendApi};
use crate::core::pipeline::OperationKind;
use crate::core::status::OperationHandle;
use anyhow::Result;
use async_trait::async_trait;
use log::info;

/// Runs a trained classifier over a bulk unlabeled dataset.
pub struct ClassifyDocuments<'a, A: ComprehendApi> {
    api: &'a A,
    request: ClassificationJobRequest,
}

impl<'a, A: ComprehendApi> ClassifyDocuments<'a, A> {
    pub fn new(api: &'a A, request: ClassificationJobRequest) -> Self {
        Self { api, request }
    }
}

#[async_trait]
impl<A: ComprehendApi> OperationKind for ClassifyDocuments<'_, A> {
    type Outcome = ClassificationJobDescription;

    fn label(&self) -> &'static str {
        "classification job"
    }

    async fn submit(&self) -> Result<OperationHandle> {
        let request = &self.request;
        println!(
            "Starting a new job with job name: [{}], service role: [{}], classifier: [{}], test data: [{}], and output location: [{}]",
            request.job_name, request.role_arn, request.classifier_arn, request.input_uri, request.output_uri
        );
        info!("Starting classification job {} ({:?})", request.job_name, request.input_format);
        let job_id = self.api.start_classification_job(request).await?;
        Ok(OperationHandle::new(job_id))
    }

    async fn fetch(&self, handle: &OperationHandle) -> Result<ClassificationJobDescription> {
        self.api.describe_classification_job(handle.as_str()).await
    }

    fn report(&self, _handle: &OperationHandle, outcome: &ClassificationJobDescription) {
        print_lines(&job_report_lines(outcome));
    }
}
