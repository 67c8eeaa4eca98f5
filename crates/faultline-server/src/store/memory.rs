//! In-memory audit store for testing and degraded startup.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use faultline_core::{AuditId, ErrorRecord, NewErrorRecord};

use crate::error::{AuditError, AuditResult};

use super::{AuditStore, ErrorFilter};

/// In-memory audit store.
///
/// Used by tests and as the fallback when the database is unreachable at
/// startup. Data is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, ErrorRecord>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(record: &ErrorRecord, filter: &ErrorFilter) -> bool {
    if let Some(error_type) = filter.error_type {
        if record.error_type != error_type {
            return false;
        }
    }
    if let Some(severity) = filter.severity {
        if record.severity != severity {
            return false;
        }
    }
    if let Some(ref user_id) = filter.user_id {
        if record.user_id.as_deref() != Some(user_id.as_str()) {
            return false;
        }
    }
    if let Some(ref endpoint) = filter.endpoint {
        if record.endpoint.as_deref() != Some(endpoint.as_str()) {
            return false;
        }
    }
    if let Some(resolved) = filter.resolved {
        if record.resolved != resolved {
            return false;
        }
    }
    if let Some(start_time) = filter.start_time {
        if record.created_at < start_time {
            return false;
        }
    }
    if let Some(end_time) = filter.end_time {
        if record.created_at >= end_time {
            return false;
        }
    }
    true
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn insert(&self, record: NewErrorRecord) -> AuditResult<ErrorRecord> {
        record.validate()?;
        let record = record.into_record();

        let mut records = self
            .records
            .write()
            .map_err(|_| AuditError::internal("lock poisoned"))?;
        records.insert(record.id.as_str().to_owned(), record.clone());

        Ok(record)
    }

    async fn insert_batch(&self, batch: Vec<NewErrorRecord>) -> AuditResult<Vec<AuditId>> {
        for record in &batch {
            record.validate()?;
        }

        let mut records = self
            .records
            .write()
            .map_err(|_| AuditError::internal("lock poisoned"))?;

        let mut ids = Vec::with_capacity(batch.len());
        for record in batch {
            let record = record.into_record();
            ids.push(record.id.clone());
            records.insert(record.id.as_str().to_owned(), record);
        }

        Ok(ids)
    }

    async fn get(&self, id: &AuditId) -> AuditResult<Option<ErrorRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| AuditError::internal("lock poisoned"))?;

        Ok(records.get(id.as_str()).cloned())
    }

    async fn list(&self, filter: &ErrorFilter) -> AuditResult<Vec<ErrorRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| AuditError::internal("lock poisoned"))?;

        let mut results: Vec<_> = records
            .values()
            .filter(|record| matches(record, filter))
            .cloned()
            .collect();

        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        #[allow(clippy::as_conversions)]
        let offset = filter.offset.unwrap_or(0) as usize;
        let results: Vec<_> = results.into_iter().skip(offset).collect();

        if let Some(limit) = filter.limit {
            #[allow(clippy::as_conversions)]
            Ok(results.into_iter().take(limit as usize).collect())
        } else {
            Ok(results)
        }
    }

    async fn resolve(&self, id: &AuditId, resolved_by: &str) -> AuditResult<ErrorRecord> {
        let mut records = self
            .records
            .write()
            .map_err(|_| AuditError::internal("lock poisoned"))?;

        let record = records
            .get_mut(id.as_str())
            .ok_or_else(|| AuditError::RecordNotFound(id.to_string()))?;

        if !record.resolved {
            record.resolved = true;
            record.resolved_at = Some(Utc::now());
            record.resolved_by = Some(resolved_by.to_owned());
        }

        Ok(record.clone())
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> AuditResult<u64> {
        let mut records = self
            .records
            .write()
            .map_err(|_| AuditError::internal("lock poisoned"))?;

        let before = records.len();
        records.retain(|_, record| record.created_at >= cutoff);

        Ok(u64::try_from(before - records.len()).unwrap_or(u64::MAX))
    }
}
