//! Asset registry: the only writer of asset records and of the index.
//!
//! Store layout (shared with every other client of the same contract):
//!
//! ```text
//! asset_keys   -> ["<id>", ...]                 (submission order)
//! asset_<id>   -> {value, gameName, assetType, timestamp, owner, status}
//! ```
//!
//! State machine per asset:
//!
//! ```text
//! pending --approve--> approved   (value token scaled by 1.10)
//! pending --reject---> rejected
//! ```
//!
//! Submissions write the record first and the index second. The two writes are
//! not atomic: if the index append fails the id is kept in an unindexed list
//! and [`Registry::complete_pending_index`] retries that second phase. Readers
//! tolerate index entries whose record is missing or malformed.
//!
//! Several clients may write concurrently. Nothing coordinates them: the last
//! write of the index or of a record wins.

use std::{
    collections::HashSet,
    time::{SystemTime, UNIX_EPOCH},
};

use collateral_assets_primitives::{
    Address, Asset, AssetId, AssetRecord, AssetStatus, AssetStore, ReviewDecision, StoreError,
    TxReceipt, keys,
};
use encoded_value::{CodecError, Operation, TaggedCodec, TransformEngine, ValueCodec};
use futures::future::join_all;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock, broadcast};
use tracing::{debug, info, warn};

use crate::{
    config::ClientConfig,
    policy::ReviewPolicy,
    query::{AssetFilter, RegistryStats},
};

// ========================= Errors =========================

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid submission: {0}")]
    InvalidInput(&'static str),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("asset {0} not found")]
    NotFound(AssetId),
    #[error("asset {id} is already {status}")]
    AlreadyReviewed { id: AssetId, status: AssetStatus },
    #[error("malformed {key}: {reason}")]
    Format { key: String, reason: String },
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("store read failed: {0}")]
    StoreRead(#[source] StoreError),
    #[error("{}", tx_message(.0))]
    TransactionFailed(#[source] StoreError),
}

fn tx_message(err: &StoreError) -> String {
    match err {
        StoreError::UserRejected => "transaction rejected by user".to_string(),
        other => format!("transaction failed: {other}"),
    }
}

impl RegistryError {
    /// The wallet user declined a write, as opposed to a failing store.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, RegistryError::TransactionFailed(StoreError::UserRejected))
    }
}

// ========================= Events / inputs =========================

/// Registry changes, for observers that do not own state.
#[derive(Clone, Debug, PartialEq)]
pub enum RegistryEvent {
    /// Record and index entry written.
    Submitted { id: AssetId, owner: Address },
    /// Record written, index append failed; pending a retry.
    IndexDeferred { id: AssetId },
    Approved { id: AssetId, reviewer: Address },
    Rejected { id: AssetId, reviewer: Address },
    /// Working set reloaded from the store.
    Reloaded { assets: usize },
}

/// A new asset as entered by its owner.
#[derive(Clone, Debug, PartialEq)]
pub struct Submission {
    pub game_name: String,
    pub asset_type: String,
    /// Plaintext value; encoded before it leaves the registry.
    pub value: f64,
}

impl Submission {
    pub fn new(game_name: impl Into<String>, asset_type: impl Into<String>, value: f64) -> Self {
        Self {
            game_name: game_name.into(),
            asset_type: asset_type.into(),
            value,
        }
    }

    fn validate(&self, reject_zero_value: bool) -> Result<(), RegistryError> {
        if self.game_name.trim().is_empty() {
            return Err(RegistryError::InvalidInput("game name is empty"));
        }
        if self.asset_type.trim().is_empty() {
            return Err(RegistryError::InvalidInput("asset type is empty"));
        }
        if !self.value.is_finite() {
            return Err(RegistryError::InvalidInput("value is not a finite number"));
        }
        if reject_zero_value && self.value == 0.0 {
            return Err(RegistryError::InvalidInput("value is zero"));
        }
        Ok(())
    }
}

// ========================= Helpers =========================

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Empty bytes are an empty index. Duplicate ids keep their first position.
fn parse_index(bytes: &[u8]) -> Result<Vec<AssetId>, serde_json::Error> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let ids: Vec<AssetId> = serde_json::from_slice(bytes)?;
    let mut seen = HashSet::with_capacity(ids.len());
    Ok(ids.into_iter().filter(|id| seen.insert(id.clone())).collect())
}

/// Newest first; equal timestamps keep their current (index) order.
fn sort_newest_first(assets: &mut [Asset]) {
    assets.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

// ========================= Registry =========================

pub struct Registry<S, C = TaggedCodec> {
    store: S,
    engine: TransformEngine<C>,
    policy: ReviewPolicy,
    reject_zero_value: bool,
    assets: RwLock<Vec<Asset>>,
    unindexed: Mutex<Vec<AssetId>>,
    events: broadcast::Sender<RegistryEvent>,
}

impl<S: AssetStore> Registry<S> {
    pub fn new(store: S, config: &ClientConfig) -> Self {
        Self::with_codec(store, TaggedCodec, config)
    }
}

impl<S: AssetStore, C: ValueCodec> Registry<S, C> {
    pub fn with_codec(store: S, codec: C, config: &ClientConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            store,
            engine: TransformEngine::new(codec),
            policy: config.review_policy.clone(),
            reject_zero_value: config.reject_zero_value,
            assets: RwLock::new(Vec::new()),
            unindexed: Mutex::new(Vec::new()),
            events,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    /// Snapshot of the working set, newest first.
    pub async fn assets(&self) -> Vec<Asset> {
        self.assets.read().await.clone()
    }

    pub async fn query(&self, filter: &AssetFilter) -> Vec<Asset> {
        self.assets
            .read()
            .await
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect()
    }

    pub async fn stats(&self) -> RegistryStats {
        RegistryStats::from_assets(self.assets.read().await.iter())
    }

    /// Ids whose record was written but which are not yet in the index.
    pub async fn unindexed(&self) -> Vec<AssetId> {
        self.unindexed.lock().await.clone()
    }

    /// Submit a new asset on behalf of `owner`.
    ///
    /// The value is encoded before anything is written. The record is written
    /// first, then the id is appended to the index.
    ///
    /// # Errors
    /// * `Unauthorized` - no owner; nothing was written
    /// * `InvalidInput` - empty names, non-finite or zero value; nothing was written
    /// * `TransactionFailed` - a write failed. If it was the index append, the
    ///   record exists and the id is listed by [`Self::unindexed`]
    /// * `StoreRead` / `Format` - the index could not be read before appending
    pub async fn create(&self, owner: &Address, submission: Submission) -> Result<Asset, RegistryError> {
        if owner.is_empty() {
            return Err(RegistryError::Unauthorized("no wallet connected".into()));
        }
        submission.validate(self.reject_zero_value)?;

        let id = AssetId::generate();
        let token = self.engine.codec().encode(submission.value);
        let record = AssetRecord::pending(
            token,
            submission.game_name,
            submission.asset_type,
            unix_now(),
            owner,
        );

        let receipt = self.write_record(&id, &record).await?;
        debug!(asset = %id, tx = %receipt.hash, "asset record written");

        self.unindexed.lock().await.push(id.clone());
        if let Err(err) = self.append_to_index(&id).await {
            warn!(asset = %id, error = %err, "asset record written but not indexed");
            self.emit(RegistryEvent::IndexDeferred { id });
            return Err(err);
        }
        self.unindexed.lock().await.retain(|pending| pending != &id);

        let asset = Asset::from_record(id.clone(), &record);
        self.remember(asset.clone()).await;
        info!(asset = %id, owner = %owner, "asset submitted");
        self.emit(RegistryEvent::Submitted {
            id,
            owner: owner.clone(),
        });
        Ok(asset)
    }

    /// Retry the index append of every unindexed submission.
    ///
    /// Appending is idempotent, so an id that reached the index through another
    /// path is not duplicated. Stops at the first failure; ids indexed before
    /// it are no longer listed by [`Self::unindexed`].
    pub async fn complete_pending_index(&self) -> Result<Vec<AssetId>, RegistryError> {
        let pending = self.unindexed().await;
        let mut indexed = Vec::with_capacity(pending.len());
        for id in pending {
            self.append_to_index(&id).await?;
            self.unindexed.lock().await.retain(|p| p != &id);

            match self.load_record(&id).await {
                Ok(Some(record)) => {
                    let asset = Asset::from_record(id.clone(), &record);
                    let owner = asset.owner.clone();
                    self.remember(asset).await;
                    self.emit(RegistryEvent::Submitted {
                        id: id.clone(),
                        owner,
                    });
                }
                Ok(None) => warn!(asset = %id, "indexed asset has no record"),
                Err(err) => warn!(asset = %id, error = %err, "indexed asset record unreadable"),
            }
            info!(asset = %id, "deferred index entry written");
            indexed.push(id);
        }
        Ok(indexed)
    }

    /// Reload the working set from the store.
    ///
    /// Never fails: an unavailable store or an unreadable index yields an empty
    /// list. While the store is unavailable the working set is left as it was.
    /// Index entries whose record is missing or malformed are skipped
    /// with a warning. Result is sorted newest first.
    pub async fn list(&self) -> Vec<Asset> {
        let Some(assets) = self.load_all().await else {
            return Vec::new();
        };
        *self.assets.write().await = assets.clone();
        self.emit(RegistryEvent::Reloaded {
            assets: assets.len(),
        });
        assets
    }

    /// Approve a pending asset: scale its value token by 1.10 and mark it
    /// approved.
    ///
    /// The value adjustment is a valuation step, not a verification.
    pub async fn approve(&self, id: &AssetId, reviewer: &Address) -> Result<Asset, RegistryError> {
        self.review(id, reviewer, ReviewDecision::Approve).await
    }

    /// Reject a pending asset. The value token is left untouched.
    pub async fn reject(&self, id: &AssetId, reviewer: &Address) -> Result<Asset, RegistryError> {
        self.review(id, reviewer, ReviewDecision::Reject).await
    }

    async fn review(
        &self,
        id: &AssetId,
        reviewer: &Address,
        decision: ReviewDecision,
    ) -> Result<Asset, RegistryError> {
        if reviewer.is_empty() {
            return Err(RegistryError::Unauthorized("no wallet connected".into()));
        }
        if !self.policy.precheck(reviewer) {
            return Err(RegistryError::Unauthorized(format!(
                "{reviewer} is not a reviewer"
            )));
        }

        let mut record = self
            .load_record(id)
            .await?
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        if !self.policy.authorize(reviewer, &record.owner) {
            return Err(RegistryError::Unauthorized(format!(
                "{reviewer} may not review asset {id}"
            )));
        }
        if record.status.is_terminal() {
            return Err(RegistryError::AlreadyReviewed {
                id: id.clone(),
                status: record.status,
            });
        }

        if decision == ReviewDecision::Approve {
            record.value = self.engine.apply(&record.value, Operation::Increase10Pct)?;
        }
        record.status = decision.target_status();

        // Full overwrite; unknown fields read above are written back.
        let receipt = self.write_record(id, &record).await?;

        let asset = Asset::from_record(id.clone(), &record);
        self.remember(asset.clone()).await;
        info!(asset = %id, reviewer = %reviewer, status = %record.status, tx = %receipt.hash, "asset reviewed");
        self.emit(match decision {
            ReviewDecision::Approve => RegistryEvent::Approved {
                id: id.clone(),
                reviewer: reviewer.clone(),
            },
            ReviewDecision::Reject => RegistryEvent::Rejected {
                id: id.clone(),
                reviewer: reviewer.clone(),
            },
        });
        Ok(asset)
    }

    /// `None` when the store is unreachable.
    async fn load_all(&self) -> Option<Vec<Asset>> {
        match self.store.is_available().await {
            Ok(true) => {}
            Ok(false) => {
                warn!("asset store unavailable");
                return None;
            }
            Err(err) => {
                warn!(error = %err, "asset store availability check failed");
                return None;
            }
        }

        let ids = match self.read_index().await {
            Ok(ids) => ids,
            Err(err) => {
                warn!(error = %err, "asset index unreadable");
                return Some(Vec::new());
            }
        };

        let records = join_all(ids.iter().map(|id| self.load_record(id))).await;
        let mut assets = Vec::with_capacity(ids.len());
        for (id, loaded) in ids.into_iter().zip(records) {
            match loaded {
                Ok(Some(record)) => assets.push(Asset::from_record(id, &record)),
                Ok(None) => warn!(asset = %id, "indexed asset has no record; skipped"),
                Err(err) => warn!(asset = %id, error = %err, "asset record skipped"),
            }
        }
        sort_newest_first(&mut assets);
        debug!(assets = assets.len(), "asset list loaded");
        Some(assets)
    }

    async fn read_index(&self) -> Result<Vec<AssetId>, RegistryError> {
        let bytes = self
            .store
            .get_data(keys::INDEX_KEY)
            .await
            .map_err(RegistryError::StoreRead)?;
        parse_index(&bytes).map_err(|e| RegistryError::Format {
            key: keys::INDEX_KEY.to_string(),
            reason: e.to_string(),
        })
    }

    /// A corrupt index is an error here rather than an empty list, so an
    /// append never overwrites entries it could not read.
    async fn append_to_index(&self, id: &AssetId) -> Result<(), RegistryError> {
        let mut ids = self.read_index().await?;
        if ids.contains(id) {
            return Ok(());
        }
        ids.push(id.clone());

        let bytes = serde_json::to_vec(&ids).map_err(|e| RegistryError::Format {
            key: keys::INDEX_KEY.to_string(),
            reason: e.to_string(),
        })?;
        self.store
            .set_data(keys::INDEX_KEY, &bytes)
            .await
            .map_err(RegistryError::TransactionFailed)?;
        Ok(())
    }

    async fn load_record(&self, id: &AssetId) -> Result<Option<AssetRecord>, RegistryError> {
        let key = id.record_key();
        let bytes = self
            .store
            .get_data(&key)
            .await
            .map_err(RegistryError::StoreRead)?;
        if bytes.is_empty() {
            return Ok(None);
        }
        AssetRecord::from_bytes(&bytes)
            .map(Some)
            .map_err(|e| RegistryError::Format {
                key,
                reason: e.to_string(),
            })
    }

    async fn write_record(
        &self,
        id: &AssetId,
        record: &AssetRecord,
    ) -> Result<TxReceipt, RegistryError> {
        let key = id.record_key();
        let bytes = record.to_bytes().map_err(|e| RegistryError::Format {
            key: key.clone(),
            reason: e.to_string(),
        })?;
        self.store
            .set_data(&key, &bytes)
            .await
            .map_err(RegistryError::TransactionFailed)
    }

    async fn remember(&self, asset: Asset) {
        let mut assets = self.assets.write().await;
        match assets.iter_mut().find(|a| a.id == asset.id) {
            Some(slot) => *slot = asset,
            None => assets.push(asset),
        }
        sort_newest_first(&mut assets);
    }

    fn emit(&self, event: RegistryEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_parsing_tolerates_blank_and_dedupes() {
        assert!(parse_index(b"").unwrap().is_empty());
        assert!(parse_index(b"  \n").unwrap().is_empty());
        assert_eq!(
            parse_index(br#"["a","b","a","c"]"#).unwrap(),
            vec![AssetId::new("a"), AssetId::new("b"), AssetId::new("c")]
        );
        assert!(parse_index(b"{not json").is_err());
    }

    #[test]
    fn submissions_are_validated_at_the_boundary() {
        let ok = Submission::new("Aurora", "Weapon", 10.0);
        assert!(ok.validate(true).is_ok());

        let cases = [
            Submission::new("", "Weapon", 10.0),
            Submission::new("Aurora", "  ", 10.0),
            Submission::new("Aurora", "Weapon", f64::NAN),
            Submission::new("Aurora", "Weapon", f64::INFINITY),
            Submission::new("Aurora", "Weapon", 0.0),
        ];
        for case in cases {
            assert!(
                matches!(case.validate(true), Err(RegistryError::InvalidInput(_))),
                "{case:?}"
            );
        }

        assert!(Submission::new("Aurora", "Weapon", 0.0).validate(false).is_ok());
    }

    #[test]
    fn user_rejection_has_its_own_message() {
        let rejected = RegistryError::TransactionFailed(StoreError::UserRejected);
        assert!(rejected.is_user_rejection());
        assert_eq!(rejected.to_string(), "transaction rejected by user");

        let failed = RegistryError::TransactionFailed(StoreError::Network("timeout".into()));
        assert!(!failed.is_user_rejection());
        assert_eq!(failed.to_string(), "transaction failed: network error: timeout");
    }
}
