use crate::adapters::service::InputFormat;
use crate::core::poller::PollObserver;
use crate::core::status::OperationHandle;
use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::fs::create_dir_all;
use std::io;
use std::path::PathBuf;
use tokio::time::Duration;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Settings file; defaults to ./appsettings.json when present
    #[clap(long, value_parser, global = true)]
    pub config: Option<PathBuf>,

    /// IAM role Comprehend assumes to read and write the S3 data
    #[clap(long, global = true)]
    pub role_arn: Option<String>,

    /// Milliseconds between status checks
    #[clap(long, global = true)]
    pub interval_ms: Option<u64>,

    /// Append a JSON line per finished operation to this file or directory
    #[clap(long, value_parser, global = true)]
    pub report: Option<PathBuf>,

    /// Log progress instead of drawing a spinner
    #[clap(long, global = true)]
    pub quiet: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Train a custom classifier from labeled data
    Train(TrainArgs),
    /// Run a batch classification job with an existing classifier
    Classify(ClassifyArgs),
    /// Train a classifier, then classify unlabeled data with it
    Run {
        #[clap(flatten)]
        train: TrainArgs,
        #[clap(flatten)]
        job: JobArgs,
    },
    /// Detect the sentiment of a piece of text
    DetectSentiment(DetectArgs),
    /// Detect named entities in a piece of text
    DetectEntities(DetectArgs),
}

#[derive(ClapArgs, Debug, Default)]
pub struct TrainArgs {
    /// Classifier name; a random one is generated when omitted
    #[clap(long)]
    pub name: Option<String>,

    #[clap(long)]
    pub language: Option<String>,

    /// S3 URI of the labeled training CSV
    #[clap(long)]
    pub training_data: Option<String>,
}

#[derive(ClapArgs, Debug, Default)]
pub struct JobArgs {
    /// Job name; a random one is generated when omitted
    #[clap(long)]
    pub job_name: Option<String>,

    /// S3 URI of the unlabeled input data
    #[clap(long)]
    pub input: Option<String>,

    #[clap(long, value_enum, default_value_t = InputFormatArg::OneDocPerLine)]
    pub input_format: InputFormatArg,

    /// S3 URI the job writes its results to
    #[clap(long)]
    pub output: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFormatArg {
    #[default]
    OneDocPerLine,
    OneDocPerFile,
}

impl From<InputFormatArg> for InputFormat {
    fn from(arg: InputFormatArg) -> Self {
        match arg {
            InputFormatArg::OneDocPerLine => InputFormat::OneDocPerLine,
            InputFormatArg::OneDocPerFile => InputFormat::OneDocPerFile,
        }
    }
}

#[derive(ClapArgs, Debug, Default)]
pub struct ClassifyArgs {
    #[clap(long)]
    pub classifier_arn: Option<String>,

    #[clap(flatten)]
    pub job: JobArgs,
}

#[derive(ClapArgs, Debug)]
pub struct DetectArgs {
    pub text: String,

    #[clap(long)]
    pub language: Option<String>,
}

/// Dash-less UUID, the same scheme classifiers trained by the earlier
/// tooling were named with.
pub fn new_classifier_name() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn new_job_name() -> String {
    Uuid::new_v4().to_string()
}

/// Resolves `--report`. A directory, existing or not, gets a timestamp-based
/// file name; anything with an extension is used as the file itself.
pub fn get_report_file_path(report_arg: PathBuf) -> Result<PathBuf> {
    let trailing_separator = report_arg
        .to_string_lossy()
        .chars()
        .last()
        .is_some_and(std::path::is_separator);

    if report_arg.is_dir() || trailing_separator || report_arg.extension().is_none() {
        create_dir_all(&report_arg)
            .with_context(|| format!("Failed to create report directory: {:?}", report_arg))?;
        Ok(report_arg.join(Local::now().format("%Y%m%d_%H%M%S.jsonl").to_string()))
    } else {
        Ok(report_arg)
    }
}

pub fn spinner_style() -> Result<ProgressStyle, io::Error> {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

/// Shows the latest status of a poll loop on a terminal spinner.
///
/// The bar is only drawn from the first status on, so the lines printed
/// while submitting do not interleave with it.
pub struct SpinnerObserver {
    label: &'static str,
    style: ProgressStyle,
    bar: Option<ProgressBar>,
}

impl SpinnerObserver {
    pub fn new(label: &'static str) -> Result<Self> {
        let style = spinner_style().context("Failed to create spinner style")?;
        Ok(Self { label, style, bar: None })
    }

    fn bar(&mut self) -> &ProgressBar {
        let style = &self.style;
        self.bar.get_or_insert_with(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(style.clone());
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        })
    }
}

impl PollObserver for SpinnerObserver {
    fn on_status(&mut self, handle: &OperationHandle, attempt: u32, status: &dyn fmt::Display) {
        let message = format!("{} {}: {} (check {})", self.label, handle, status, attempt);
        self.bar().set_message(message);
    }

    fn on_finish(&mut self, _handle: &OperationHandle, _attempts: u32) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl Drop for SpinnerObserver {
    fn drop(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.abandon();
        }
    }
}
