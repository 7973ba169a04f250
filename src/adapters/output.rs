use crate::adapters::service::{ClassificationJobDescription, ClassifierDescription, DetectedEntity, SentimentResult};
use crate::core::status::{OperationHandle, OperationStatus};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Display;
use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

fn show<T: Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

pub fn classifier_report_lines(desc: &ClassifierDescription) -> Vec<String> {
    if desc.is_failure() {
        return vec![format!("Error: [{}]", show(desc.message.as_deref()))];
    }
    if !desc.is_success() {
        return vec![format!("Status: [{}]", desc.status)];
    }

    let meta = desc.metadata.clone().unwrap_or_default();
    let metrics = meta.evaluation_metrics.clone().unwrap_or_default();
    vec![
        format!("Custom Classification Arn (use this Arn with the classify command): [{}]", desc.arn),
        format!("Status: [{}], Message: [{}]", desc.status, show(desc.message.as_deref())),
        format!(
            "Started at: [{}], completed at: [{}]",
            show(desc.training_started_at),
            show(desc.training_ended_at)
        ),
        format!(
            "NumberOfLabels: [{}], NumberOfTestDocuments: [{}], NumberOfTrainedDocuments: [{}]",
            show(meta.number_of_labels),
            show(meta.number_of_test_documents),
            show(meta.number_of_trained_documents)
        ),
        format!(
            "Accuracy: [{}], F1Score: [{}], Precision: [{}], Recall: [{}]",
            show(metrics.accuracy),
            show(metrics.f1_score),
            show(metrics.precision),
            show(metrics.recall)
        ),
    ]
}

pub fn job_report_lines(desc: &ClassificationJobDescription) -> Vec<String> {
    if desc.is_failure() {
        return vec![format!("Error: [{}]", show(desc.message.as_deref()))];
    }
    if !desc.is_success() {
        return vec![format!("Status: [{}]", desc.status)];
    }

    vec![
        format!(
            "Job Id: [{}], Name: [{}], Status: [{}], Message: [{}]",
            desc.job_id,
            show(desc.job_name.as_deref()),
            desc.status,
            show(desc.message.as_deref())
        ),
        format!("Started at: [{}], completed at: [{}]", show(desc.submitted_at), show(desc.ended_at)),
        format!("Output located at: [{}]", show(desc.output_uri.as_deref())),
    ]
}

pub fn sentiment_report_lines(result: &SentimentResult) -> Vec<String> {
    vec![
        format!("Sentiment: [{}]", result.sentiment),
        format!(
            "Positive: [{}], Negative: [{}], Neutral: [{}], Mixed: [{}]",
            show(result.positive),
            show(result.negative),
            show(result.neutral),
            show(result.mixed)
        ),
    ]
}

pub fn entity_report_lines(entities: &[DetectedEntity]) -> Vec<String> {
    if entities.is_empty() {
        return vec!["No entities detected".to_string()];
    }
    entities
        .iter()
        .map(|e| format!("[{}] {} ({})", e.entity_type, e.text, show(e.score)))
        .collect()
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

#[derive(Serialize)]
struct JournalEntry<'a, T> {
    recorded_at: DateTime<Utc>,
    kind: &'a str,
    handle: &'a OperationHandle,
    outcome: &'a T,
}

/// Appends one JSON line per finished operation.
pub struct ReportJournal {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl ReportJournal {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_dir_all(parent)
                .with_context(|| format!("Failed to create report directory: {:?}", parent))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open report file: {:?}", path))?;
        Ok(Self { path: path.to_path_buf(), writer: Mutex::new(BufWriter::new(file)) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn record<T: Serialize>(&self, kind: &str, handle: &OperationHandle, outcome: &T) -> Result<()> {
        let entry = JournalEntry { recorded_at: Utc::now(), kind, handle, outcome };
        let json = serde_json::to_string(&entry)
            .context("Failed to serialize report entry")?;

        let mut writer = self.writer.lock().await;
        writeln!(writer, "{}", json)
            .context("Failed to write report entry")?;
        writer.flush().context("Failed to flush report file")?;
        Ok(())
    }
}
