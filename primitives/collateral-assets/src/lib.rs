//! Types and traits for gamefi collateral asset crates
//!
//! The store and signer traits are the two external seams of the client: a
//! key-value document store (a contract exposing `getData` / `setData`) and a
//! wallet able to sign a plain-text message. Everything that crosses those
//! seams is defined here so adapters do not need to depend on the client.

#[cfg(test)]
mod tests;

use std::{
    fmt,
    str::FromStr,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Store keys shared by every client writing to the same contract.
pub mod keys {
    /// JSON array of every asset id, in submission order.
    pub const INDEX_KEY: &str = "asset_keys";
    /// Prefix of a per-asset record key.
    pub const RECORD_PREFIX: &str = "asset_";

    pub fn record_key(id: &str) -> String {
        format!("{RECORD_PREFIX}{id}")
    }
}

// ========================= Identifiers =========================

/// Opaque asset identifier.
///
/// Freshly generated ids are `<unix millis>-<uuid v4>`; ids read from the
/// store are accepted verbatim whatever their shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        Self(format!("{millis}-{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of this asset's record in the store.
    pub fn record_key(&self) -> String {
        keys::record_key(&self.0)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for AssetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Wallet address of a principal. Comparison ignores ASCII case.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Same principal, ignoring checksum casing.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl Eq for Address {}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

impl From<String> for Address {
    fn from(address: String) -> Self {
        Self(address)
    }
}

// ========================= Review state =========================

/// Review state of a submitted asset. `Approved` and `Rejected` are terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl AssetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetStatus::Pending => "pending",
            AssetStatus::Approved => "approved",
            AssetStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AssetStatus::Pending)
    }
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown asset status: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for AssetStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AssetStatus::Pending),
            "approved" => Ok(AssetStatus::Approved),
            "rejected" => Ok(AssetStatus::Rejected),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Outcome a reviewer applies to a pending asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    pub fn target_status(&self) -> AssetStatus {
        match self {
            ReviewDecision::Approve => AssetStatus::Approved,
            ReviewDecision::Reject => AssetStatus::Rejected,
        }
    }
}

// ========================= Records =========================

/// Missing, `null` and empty statuses are legacy writes of a fresh submission.
fn status_or_pending<'de, D: Deserializer<'de>>(d: D) -> Result<AssetStatus, D::Error> {
    match Option::<String>::deserialize(d)?.as_deref() {
        None | Some("") => Ok(AssetStatus::Pending),
        Some(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

/// JSON document stored at `asset_<id>`:
/// `{value, gameName, assetType, timestamp, owner, status}`.
///
/// Fields this client does not know about are kept in `extra` and written
/// back untouched when the record is rewritten.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    /// Encoded value token, never the plaintext.
    pub value: String,
    pub game_name: String,
    pub asset_type: String,
    /// Submission time, seconds since the unix epoch.
    pub timestamp: u64,
    pub owner: String,
    #[serde(default, deserialize_with = "status_or_pending")]
    pub status: AssetStatus,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AssetRecord {
    pub fn pending(
        value: String,
        game_name: String,
        asset_type: String,
        timestamp: u64,
        owner: &Address,
    ) -> Self {
        Self {
            value,
            game_name,
            asset_type,
            timestamp,
            owner: owner.as_str().to_string(),
            status: AssetStatus::Pending,
            extra: Default::default(),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// A submitted collateral item as seen by the client.
#[derive(Clone, Debug, PartialEq)]
pub struct Asset {
    pub id: AssetId,
    /// Opaque token produced by the value codec.
    pub encoded_value: String,
    pub game_name: String,
    pub asset_type: String,
    pub timestamp: u64,
    pub owner: Address,
    pub status: AssetStatus,
}

impl Asset {
    pub fn from_record(id: AssetId, record: &AssetRecord) -> Self {
        Self {
            id,
            encoded_value: record.value.clone(),
            game_name: record.game_name.clone(),
            asset_type: record.asset_type.clone(),
            timestamp: record.timestamp,
            owner: Address::new(record.owner.clone()),
            status: record.status,
        }
    }

    pub fn is_owned_by(&self, who: &Address) -> bool {
        self.owner == *who
    }
}

// ========================= Store =========================

/// Handle of an accepted store write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    pub hash: String,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("user rejected transaction")]
    UserRejected,
    #[error("store unavailable")]
    Unavailable,
    #[error("network error: {0}")]
    Network(String),
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Key-value document store backing the registry.
///
/// `get_data` returns empty bytes for an absent key. Writes are
/// last-writer-wins; the store offers no transactions across keys.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Address of the contract, folded into reveal challenges.
    fn address(&self) -> &str;

    async fn is_available(&self) -> Result<bool, StoreError>;

    async fn get_data(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    async fn set_data(&self, key: &str, value: &[u8]) -> Result<TxReceipt, StoreError>;
}

#[async_trait]
impl<T: AssetStore + ?Sized> AssetStore for Arc<T> {
    fn address(&self) -> &str {
        (**self).address()
    }

    async fn is_available(&self) -> Result<bool, StoreError> {
        (**self).is_available().await
    }

    async fn get_data(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        (**self).get_data(key).await
    }

    async fn set_data(&self, key: &str, value: &[u8]) -> Result<TxReceipt, StoreError> {
        (**self).set_data(key, value).await
    }
}

// ========================= Signer =========================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature(pub String);

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SignError {
    #[error("user rejected signature request")]
    UserRejected,
    #[error("signing failed: {0}")]
    Failed(String),
}

/// Connected wallet able to sign plain-text messages.
#[async_trait]
pub trait MessageSigner: Send + Sync {
    fn address(&self) -> &Address;

    async fn sign_message(&self, message: &str) -> Result<Signature, SignError>;
}

#[async_trait]
impl<T: MessageSigner + ?Sized> MessageSigner for Arc<T> {
    fn address(&self) -> &Address {
        (**self).address()
    }

    async fn sign_message(&self, message: &str) -> Result<Signature, SignError> {
        (**self).sign_message(message).await
    }
}
