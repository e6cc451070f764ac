//! Log record operations on top of a [`LogStore`].

use std::sync::Arc;

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::log_record::{LogRecord, LogRecordPayload};
use crate::services::log_filter::LogFilter;
use crate::storage::LogStore;

const NOT_FOUND: &str = "Log record not found";

/// Parse a record identifier from a path segment.
///
/// Anything that is not a UUID cannot name a record, so it is reported as
/// not found rather than as a bad request.
pub fn parse_record_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::NotFound(NOT_FOUND.to_string()))
}

/// Log record service
pub struct LogRecordService {
    store: Arc<dyn LogStore>,
}

impl LogRecordService {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self { store }
    }

    /// Records matching the given query parameters.
    pub async fn list<I, K, V>(&self, params: I) -> Result<Vec<LogRecord>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let filter = LogFilter::from_params(params)?;
        self.query(&filter).await
    }

    pub async fn query(&self, filter: &LogFilter) -> Result<Vec<LogRecord>> {
        let records = self.store.query(filter).await?;
        tracing::debug!(
            predicates = filter.predicates().len(),
            matched = records.len(),
            "Log records queried"
        );
        Ok(records)
    }

    pub async fn create(&self, payload: LogRecordPayload) -> Result<LogRecord> {
        let record = self.store.insert(payload.validate()?).await?;
        tracing::debug!(id = %record.id, level = %record.level, "Log record created");
        Ok(record)
    }

    pub async fn get(&self, id: &str) -> Result<LogRecord> {
        let id = parse_record_id(id)?;
        self.store
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))
    }

    /// Full update: every field must be supplied.
    pub async fn replace(&self, id: &str, payload: LogRecordPayload) -> Result<LogRecord> {
        let id = parse_record_id(id)?;
        if self.store.get(id).await?.is_none() {
            return Err(AppError::NotFound(NOT_FOUND.to_string()));
        }
        self.write(id, payload).await
    }

    /// Partial update: absent fields keep their stored values.
    pub async fn patch(&self, id: &str, payload: LogRecordPayload) -> Result<LogRecord> {
        let existing = self.get(id).await?;
        self.write(existing.id, payload.merged_over(&existing)).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let id = parse_record_id(id)?;
        if !self.store.delete(id).await? {
            return Err(AppError::NotFound(NOT_FOUND.to_string()));
        }
        tracing::debug!(id = %id, "Log record deleted");
        Ok(())
    }

    async fn write(&self, id: Uuid, payload: LogRecordPayload) -> Result<LogRecord> {
        let record = payload.validate()?;
        let updated = self
            .store
            .update(id, record)
            .await?
            .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;
        tracing::debug!(id = %id, "Log record updated");
        Ok(updated)
    }
}
