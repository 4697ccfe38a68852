use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

use crate::harvest::types::{RecipientRow, ResponseRow};

use super::HarvestStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    EnsureTables,
    LoadResponses(usize),
    LoadRecipients(usize),
    DeleteStale,
    GenderTable,
    AggregateTable,
}

/// In-memory store double. Records every call in order and accumulates the
/// loaded rows so tests can assert on both the call sequence and the
/// persisted data.
pub struct RecordingStore {
    completed_rids: HashSet<i64>,
    completed_surveys: HashSet<i64>,
    response_success: bool,
    fail_responses: bool,
    fail_recipients: bool,
    calls: Mutex<Vec<StoreCall>>,
    responses: Mutex<Vec<ResponseRow>>,
    recipients: Mutex<Vec<RecipientRow>>,
}

impl RecordingStore {
    pub fn new(completed_rids: HashSet<i64>, completed_surveys: HashSet<i64>) -> Self {
        Self {
            completed_rids,
            completed_surveys,
            response_success: true,
            fail_responses: false,
            fail_recipients: false,
            calls: Mutex::new(Vec::new()),
            responses: Mutex::new(Vec::new()),
            recipients: Mutex::new(Vec::new()),
        }
    }

    /// Make `load_responses` report the given non-error success signal.
    pub fn response_success(mut self, success: bool) -> Self {
        self.response_success = success;
        self
    }

    /// Make `load_responses` error outright.
    pub fn fail_responses(mut self) -> Self {
        self.fail_responses = true;
        self
    }

    /// Make `load_recipients` error outright.
    pub fn fail_recipients(mut self) -> Self {
        self.fail_recipients = true;
        self
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn response_rows(&self) -> Vec<ResponseRow> {
        self.responses.lock().unwrap().clone()
    }

    pub fn recipient_rows(&self) -> Vec<RecipientRow> {
        self.recipients.lock().unwrap().clone()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl HarvestStore for RecordingStore {
    async fn ensure_tables(&self) -> Result<()> {
        self.record(StoreCall::EnsureTables);
        Ok(())
    }

    async fn completed_rids(&self) -> Result<HashSet<i64>> {
        Ok(self.completed_rids.clone())
    }

    async fn completed_surveys(&self) -> Result<HashSet<i64>> {
        Ok(self.completed_surveys.clone())
    }

    async fn load_responses(&self, rows: &[ResponseRow]) -> Result<bool> {
        self.record(StoreCall::LoadResponses(rows.len()));
        if self.fail_responses {
            bail!("simulated response load error");
        }
        if self.response_success {
            self.responses.lock().unwrap().extend_from_slice(rows);
        }
        Ok(self.response_success)
    }

    async fn load_recipients(&self, rows: &[RecipientRow]) -> Result<()> {
        self.record(StoreCall::LoadRecipients(rows.len()));
        if self.fail_recipients {
            bail!("simulated recipient load error");
        }
        self.recipients.lock().unwrap().extend_from_slice(rows);
        Ok(())
    }

    async fn delete_stale_participant_details(&self) -> Result<u64> {
        self.record(StoreCall::DeleteStale);
        Ok(0)
    }

    async fn rebuild_gender_table(&self) -> Result<()> {
        self.record(StoreCall::GenderTable);
        Ok(())
    }

    async fn rebuild_aggregate_table(&self) -> Result<()> {
        self.record(StoreCall::AggregateTable);
        Ok(())
    }
}
