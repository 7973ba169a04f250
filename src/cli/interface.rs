use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::adapters::aws::AwsComprehend;
use crate::adapters::output::*;
use crate::adapters::service::*;
use crate::adapters::settings::*;
use crate::core::classify::ClassifyDocuments;
use crate::core::pipeline::{Completed, Pipeline};
use crate::core::poller::{LogObserver, PollObserver, Poller};
use crate::core::status::OperationStatus;
use crate::core::train::TrainClassifier;
use crate::utils::lib::*;

pub async fn run_cli_interface() -> Result<()> {
    let args = Args::parse();
    let settings = load_settings(args.config.as_deref())?;

    let cancellation = CancellationToken::new();
    cancel_on_ctrl_c(cancellation.clone());
    let interval_ms = args.interval_ms.or(settings.comprehend.poll_interval_ms);
    let mut poller = Poller::new().with_cancellation(cancellation.clone());
    if let Some(ms) = interval_ms {
        poller = poller.with_interval(Duration::from_millis(ms));
    }

    let journal = match args.report.clone().or_else(|| settings.comprehend.report_path.clone()) {
        Some(path) => Some(ReportJournal::open(&get_report_file_path(path)?)?),
        None => None,
    };

    let api = AwsComprehend::from_settings(&settings.aws).await;
    let session = Session {
        api: &api,
        settings: &settings,
        poller: &poller,
        journal: journal.as_ref(),
        role_arn: args.role_arn,
        spinner: !args.quiet && std::io::stderr().is_terminal(),
    };

    // Submissions and one-off calls are not polled, so the whole command races
    // the token as well.
    tokio::select! {
        biased;
        result = session.execute(args.command) => result?,
        _ = cancellation.cancelled() => anyhow::bail!("Interrupted before the command finished"),
    }
    println!("Done!");
    Ok(())
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::load(path, true),
        None => Settings::load(&PathBuf::from(DEFAULT_SETTINGS_FILE), false),
    }
    .context("Failed to load settings")
}

/// The first Ctrl-C cancels `token`; a second one exits immediately.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("Interrupted, cancelling the running command (Ctrl-C again to exit)");
        token.cancel();
        if tokio::signal::ctrl_c().await.is_ok() {
            error!("Interrupted again, exiting");
            std::process::exit(130);
        }
    });
}

/// Everything a command needs: the service, resolved settings and the
/// shared poller.
pub struct Session<'a, A: ComprehendApi> {
    pub api: &'a A,
    pub settings: &'a Settings,
    pub poller: &'a Poller,
    pub journal: Option<&'a ReportJournal>,
    pub role_arn: Option<String>,
    pub spinner: bool,
}

impl<A: ComprehendApi> Session<'_, A> {
    pub async fn execute(&self, command: Command) -> Result<()> {
        match command {
            Command::Train(args) => {
                self.train(args).await?;
            }
            Command::Classify(args) => {
                let classifier_arn = require(
                    args.classifier_arn,
                    &self.settings.comprehend.classifier_arn,
                    "classifier-arn",
                    "ClassifierArn",
                )?;
                self.classify(classifier_arn, args.job).await?;
            }
            Command::Run { train, job } => {
                let trained = self.train(train).await?;
                if trained.outcome.is_success() {
                    self.classify(trained.handle.to_string(), job).await?;
                } else {
                    warn!("Classifier {} ended in {}, skipping the batch job", trained.handle, trained.outcome);
                }
            }
            Command::DetectSentiment(args) => {
                let result = self
                    .api
                    .detect_sentiment(&self.language(args.language), &args.text)
                    .await
                    .context("Failed to detect sentiment")?;
                print_lines(&sentiment_report_lines(&result));
            }
            Command::DetectEntities(args) => {
                let entities = self
                    .api
                    .detect_entities(&self.language(args.language), &args.text)
                    .await
                    .context("Failed to detect entities")?;
                print_lines(&entity_report_lines(&entities));
            }
        }
        Ok(())
    }

    async fn train(&self, args: TrainArgs) -> Result<Completed<ClassifierDescription>> {
        let request = self.classifier_request(args)?;
        println!("{}", request.name);
        let kind = TrainClassifier::new(self.api, request);
        let mut observer = self.observer("Training")?;
        Pipeline::new(self.poller)
            .with_journal(self.journal)
            .run(&kind, observer.as_mut())
            .await
    }

    async fn classify(&self, classifier_arn: String, args: JobArgs) -> Result<Completed<ClassificationJobDescription>> {
        let request = self.job_request(classifier_arn, args)?;
        println!("{}", request.job_name);
        let kind = ClassifyDocuments::new(self.api, request);
        let mut observer = self.observer("Classifying")?;
        Pipeline::new(self.poller)
            .with_journal(self.journal)
            .run(&kind, observer.as_mut())
            .await
    }

    fn role_arn(&self) -> Result<String> {
        require(self.role_arn.clone(), &self.settings.comprehend.service_role_arn, "role-arn", "ServiceRoleArn")
    }

    fn language(&self, cli: Option<String>) -> String {
        cli.or_else(|| self.settings.comprehend.language_code.clone())
            .unwrap_or_else(|| DEFAULT_LANGUAGE_CODE.to_string())
    }

    pub fn classifier_request(&self, args: TrainArgs) -> Result<ClassifierRequest> {
        Ok(ClassifierRequest {
            name: args.name.unwrap_or_else(new_classifier_name),
            language_code: self.language(args.language),
            role_arn: self.role_arn()?,
            training_data_uri: require(
                args.training_data,
                &self.settings.comprehend.training_data_uri,
                "training-data",
                "TrainingDataUri",
            )?,
        })
    }

    pub fn job_request(&self, classifier_arn: String, args: JobArgs) -> Result<ClassificationJobRequest> {
        Ok(ClassificationJobRequest {
            job_name: args.job_name.unwrap_or_else(new_job_name),
            role_arn: self.role_arn()?,
            classifier_arn,
            input_uri: require(args.input, &self.settings.comprehend.test_data_uri, "input", "TestDataUri")?,
            input_format: args.input_format.into(),
            output_uri: require(args.output, &self.settings.comprehend.output_uri, "output", "OutputUri")?,
        })
    }

    fn observer(&self, label: &'static str) -> Result<Box<dyn PollObserver>> {
        if self.spinner {
            return Ok(Box::new(SpinnerObserver::new(label)?));
        }
        info!("{} with progress logged every {:?}", label, self.poller.interval());
        Ok(Box::new(LogObserver))
    }
}
