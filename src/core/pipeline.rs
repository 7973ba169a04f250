use crate::adapters::output::ReportJournal;
use crate::core::poller::{PollObserver, Poller};
use crate::core::status::{OperationHandle, OperationStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{info, warn};
use serde::Serialize;

/// One kind of long-running remote operation: how to start it, how to read
/// its current state, and how to present the final state.
#[async_trait]
pub trait OperationKind: Send + Sync {
    type Outcome: OperationStatus + Serialize + Send;

    fn label(&self) -> &'static str;

    async fn submit(&self) -> Result<OperationHandle>;

    async fn fetch(&self, handle: &OperationHandle) -> Result<Self::Outcome>;

    fn report(&self, handle: &OperationHandle, outcome: &Self::Outcome);
}

#[derive(Debug)]
pub struct Completed<T> {
    pub handle: OperationHandle,
    pub outcome: T,
}

/// Submit, poll to a terminal state, report.
pub struct Pipeline<'a> {
    poller: &'a Poller,
    journal: Option<&'a ReportJournal>,
}

impl<'a> Pipeline<'a> {
    pub fn new(poller: &'a Poller) -> Self {
        Self { poller, journal: None }
    }

    pub fn with_journal(mut self, journal: Option<&'a ReportJournal>) -> Self {
        self.journal = journal;
        self
    }

    pub async fn run<K: OperationKind>(
        &self,
        kind: &K,
        observer: &mut dyn PollObserver,
    ) -> Result<Completed<K::Outcome>> {
        let handle = kind
            .submit()
            .await
            .with_context(|| format!("Failed to submit {}", kind.label()))?;
        info!("Submitted {}: {}", kind.label(), handle);
        println!("{}", handle);

        let outcome = self
            .poller
            .wait_for_completion(&handle, |h| async move { kind.fetch(&h).await }, observer)
            .await
            .with_context(|| format!("Failed while waiting for {} {}", kind.label(), handle))?;

        if outcome.is_failure() {
            warn!("{} {} finished in state {}", kind.label(), handle, outcome);
        } else {
            info!("{} {} finished in state {}", kind.label(), handle, outcome);
        }
        kind.report(&handle, &outcome);

        if let Some(journal) = self.journal {
            journal
                .record(kind.label(), &handle, &outcome)
                .await
                .with_context(|| format!("Failed to record report in {:?}", journal.path()))?;
        }

        Ok(Completed { handle, outcome })
    }
}
