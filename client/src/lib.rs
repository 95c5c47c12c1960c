//! GameFi collateral client
//!
//! Owners submit in-game assets as collateral, a reviewer approves or rejects
//! them, and the connected wallet can reveal a stored value after signing a
//! session challenge.
//!
//! ## Layout
//!
//! - [`registry`]: asset records and index in a shared key-value store, and the
//!   `pending -> approved | rejected` review state machine
//! - [`reveal`]: signature-gated decode of a stored value token
//! - [`session`]: one connected wallet driving the registry, one operation at a
//!   time
//! - [`config`], [`policy`]: client settings and who may review
//! - [`query`]: dashboard filtering and per-status counts
//! - [`store`], [`signer`]: in-process store and wallet for local runs
//!
//! ## Values are not confidential
//!
//! Stored values are only *encoded* (see the `encoded_value` crate). Anyone
//! who can read the store can read every value; the reveal signature is a
//! consent prompt, never verified.
//!
//! ## Example
//!
//! ```ignore
//! let config = ClientConfig::default();
//! let registry = Arc::new(Registry::new(MemoryStore::new("0xstore"), &config));
//! let mut session = Session::new(registry, &config);
//! session.connect(LocalSigner::new("0xowner"));
//!
//! let asset = session.submit(Submission::new("Aurora", "Weapon", 250.0)).await?;
//! session.approve(&asset.id).await?;
//! ```

pub mod config;
pub mod policy;
pub mod query;
pub mod registry;
pub mod reveal;
pub mod session;
pub mod signer;
pub mod store;

pub use config::{ClientConfig, ConfigError};
pub use policy::ReviewPolicy;
pub use query::{AssetFilter, RegistryStats};
pub use registry::{Registry, RegistryError, RegistryEvent, Submission};
pub use reveal::{RevealError, RevealSession, Revealer};
pub use session::{Session, SessionError};
pub use signer::LocalSigner;
pub use store::MemoryStore;
