//! In-process [`AssetStore`] for local runs and tests.
//!
//! Behaves like the contract store: empty bytes for absent keys,
//! last-writer-wins, one receipt per accepted write. Failures can be queued
//! to exercise partial-write paths.

use std::collections::HashMap;

use async_trait::async_trait;
use collateral_assets_primitives::{AssetStore, StoreError, TxReceipt};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

#[derive(Debug)]
struct MemoryState {
    data: HashMap<String, Vec<u8>>,
    available: bool,
    next_failure: Option<StoreError>,
    key_failures: HashMap<String, StoreError>,
    writes: u64,
}

#[derive(Debug)]
pub struct MemoryStore {
    address: String,
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            state: Mutex::new(MemoryState {
                data: HashMap::new(),
                available: true,
                next_failure: None,
                key_failures: HashMap::new(),
                writes: 0,
            }),
        }
    }

    pub async fn set_available(&self, available: bool) {
        self.state.lock().await.available = available;
    }

    /// Fail the next write, whatever its key.
    pub async fn fail_next_write(&self, err: StoreError) {
        self.state.lock().await.next_failure = Some(err);
    }

    /// Fail the next write to `key` only.
    pub async fn fail_next_write_to(&self, key: &str, err: StoreError) {
        self.state.lock().await.key_failures.insert(key.to_string(), err);
    }

    /// Write bypassing failure injection and receipts.
    pub async fn put_raw(&self, key: &str, value: impl Into<Vec<u8>>) {
        self.state.lock().await.data.insert(key.to_string(), value.into());
    }

    pub async fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.state.lock().await.data.get(key).cloned()
    }

    pub async fn remove(&self, key: &str) {
        self.state.lock().await.data.remove(key);
    }

    /// Accepted writes so far.
    pub async fn write_count(&self) -> u64 {
        self.state.lock().await.writes
    }
}

#[async_trait]
impl AssetStore for MemoryStore {
    fn address(&self) -> &str {
        &self.address
    }

    async fn is_available(&self) -> Result<bool, StoreError> {
        Ok(self.state.lock().await.available)
    }

    async fn get_data(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let state = self.state.lock().await;
        if !state.available {
            return Err(StoreError::Unavailable);
        }
        Ok(state.data.get(key).cloned().unwrap_or_default())
    }

    async fn set_data(&self, key: &str, value: &[u8]) -> Result<TxReceipt, StoreError> {
        let mut state = self.state.lock().await;
        if !state.available {
            return Err(StoreError::Unavailable);
        }
        if let Some(err) = state.next_failure.take() {
            return Err(err);
        }
        if let Some(err) = state.key_failures.remove(key) {
            return Err(err);
        }

        state.writes += 1;
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hasher.update(value);
        hasher.update(state.writes.to_le_bytes());
        let hash = format!("0x{}", hex::encode(hasher.finalize()));

        state.data.insert(key.to_string(), value.to_vec());
        Ok(TxReceipt { hash })
    }
}
