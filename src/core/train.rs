use crate::adapters::output::{classifier_report_lines, print_lines};
use crate::adapters::service::{ClassifierDescription, ClassifierRequest, ComprehendApi};
use crate::core::pipeline::OperationKind;
use crate::core::status::OperationHandle;
use anyhow::Result;
use async_trait::async_trait;
use log::info;

/// Trains a custom document classifier from labeled data.
pub struct TrainClassifier<'a, A: ComprehendApi> {
    api: &'a A,
    request: ClassifierRequest,
}

impl<'a, A: ComprehendApi> TrainClassifier<'a, A> {
    pub fn new(api: &'a A, request: ClassifierRequest) -> Self {
        Self { api, request }
    }
}

#[async_trait]
impl<A: ComprehendApi> OperationKind for TrainClassifier<'_, A> {
    type Outcome = ClassifierDescription;

    fn label(&self) -> &'static str {
        "classifier training"
    }

    async fn submit(&self) -> Result<OperationHandle> {
        let request = &self.request;
        println!(
            "Creating a Custom Classifier with job name: [{}], service role: [{}], and training file: [{}]",
            request.name, request.role_arn, request.training_data_uri
        );
        info!("Creating classifier {} ({})", request.name, request.language_code);
        let arn = self.api.create_document_classifier(request).await?;
        Ok(OperationHandle::new(arn))
    }

    async fn fetch(&self, handle: &OperationHandle) -> Result<ClassifierDescription> {
        self.api.describe_document_classifier(handle.as_str()).await
    }

    fn report(&self, _handle: &OperationHandle, outcome: &ClassifierDescription) {
        print_lines(&classifier_report_lines(outcome));
    }
}
