/// In-memory stand-in for the audit persistence API
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use clinic_scheduler::audit::{AuditApi, AuditApiError, AuditRecord, RecordPage, StorageStats};

/// How the fake responds to calls
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    None,
    /// Every call fails as if the network were down
    Offline,
    /// Every call answers with this HTTP status
    Status(u16),
}

#[derive(Default)]
struct State {
    records: BTreeMap<String, AuditRecord>,
    taken_keys: Vec<String>,
    create_calls: usize,
    exists_calls: usize,
    get_calls: usize,
}

#[derive(Clone)]
pub struct InMemoryAuditApi {
    state: Arc<Mutex<State>>,
    failure: Arc<Mutex<FailureMode>>,
}

#[allow(dead_code)]
impl InMemoryAuditApi {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            failure: Arc::new(Mutex::new(FailureMode::None)),
        }
    }

    pub fn set_failure(&self, mode: FailureMode) {
        *self.failure.lock().unwrap() = mode;
    }

    /// The next `count` uniqueness checks report a collision
    pub fn reserve_collisions(&self, count: usize) {
        let mut state = self.state.lock().unwrap();
        state.taken_keys.extend((0..count).map(|i| format!("*{i}")));
    }

    pub fn insert(&self, record: AuditRecord) {
        let mut state = self.state.lock().unwrap();
        state.records.insert(record.key.clone(), record);
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.state.lock().unwrap().records.values().cloned().collect()
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().unwrap().create_calls
    }

    pub fn exists_calls(&self) -> usize {
        self.state.lock().unwrap().exists_calls
    }

    pub fn get_calls(&self) -> usize {
        self.state.lock().unwrap().get_calls
    }

    fn check(&self) -> Result<(), AuditApiError> {
        match *self.failure.lock().unwrap() {
            FailureMode::None => Ok(()),
            FailureMode::Offline => Err(AuditApiError::Transport(
                "connection refused".to_string(),
            )),
            FailureMode::Status(status) => Err(AuditApiError::Http {
                status,
                message: format!("HTTP {status}"),
            }),
        }
    }
}

#[async_trait]
impl AuditApi for InMemoryAuditApi {
    async fn create_record(&self, record: &AuditRecord) -> Result<(), AuditApiError> {
        self.state.lock().unwrap().create_calls += 1;
        self.check()?;
        self.insert(record.clone());
        Ok(())
    }

    async fn get_record(&self, key: &str) -> Result<AuditRecord, AuditApiError> {
        self.state.lock().unwrap().get_calls += 1;
        self.check()?;
        self.state
            .lock()
            .unwrap()
            .records
            .get(key)
            .cloned()
            .ok_or_else(|| AuditApiError::Http {
                status: 404,
                message: "Audit record not found".to_string(),
            })
    }

    async fn key_exists(&self, key: &str) -> Result<bool, AuditApiError> {
        let mut state = self.state.lock().unwrap();
        state.exists_calls += 1;
        drop(state);
        self.check()?;

        let mut state = self.state.lock().unwrap();
        if state.records.contains_key(key) {
            return Ok(true);
        }
        // Reserved placeholders each absorb one check as a collision.
        Ok(state.taken_keys.pop().is_some())
    }

    async fn list_records(&self, limit: u32, offset: u32) -> Result<RecordPage, AuditApiError> {
        self.check()?;
        let state = self.state.lock().unwrap();
        let records = state
            .records
            .values()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(RecordPage {
            records,
            total: state.records.len() as u64,
            limit,
            offset,
        })
    }

    async fn storage_stats(&self) -> Result<StorageStats, AuditApiError> {
        self.check()?;
        let count = self.state.lock().unwrap().records.len() as u64;
        Ok(StorageStats {
            record_count: count,
            estimated_size_kb: count * 2,
        })
    }

    async fn health_check(&self) -> Result<(), AuditApiError> {
        self.check()
    }
}
