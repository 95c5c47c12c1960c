//! A connected wallet driving the registry.
//!
//! One operation runs at a time per session: a second call while the first is
//! still awaiting the store or the wallet fails fast with
//! [`SessionError::Busy`] instead of queueing.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use collateral_assets_primitives::{Address, Asset, AssetId, AssetStore, MessageSigner};
use thiserror::Error;
use tracing::debug;

use crate::{
    config::ClientConfig,
    registry::{Registry, RegistryError, Submission},
    reveal::{RevealError, RevealSession, Revealer},
};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("please connect wallet first")]
    NotConnected,
    #[error("another operation is in progress")]
    Busy,
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Reveal(#[from] RevealError),
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Session<S, W> {
    registry: Arc<Registry<S>>,
    revealer: Revealer,
    wallet: Option<W>,
    busy: AtomicBool,
}

impl<S: AssetStore, W: MessageSigner> Session<S, W> {
    /// Start a session against `registry`. The reveal challenge parameters are
    /// fixed here for the session's lifetime.
    pub fn new(registry: Arc<Registry<S>>, config: &ClientConfig) -> Self {
        let reveal = RevealSession::start(
            registry.store().address(),
            config.chain_id,
            config.duration_days,
        );
        Self {
            registry,
            revealer: Revealer::new(reveal),
            wallet: None,
            busy: AtomicBool::new(false),
        }
    }

    pub fn connect(&mut self, wallet: W) {
        debug!(wallet = %wallet.address(), "wallet connected");
        self.wallet = Some(wallet);
    }

    pub fn disconnect(&mut self) -> Option<W> {
        self.wallet.take()
    }

    pub fn wallet(&self) -> Option<&W> {
        self.wallet.as_ref()
    }

    pub fn address(&self) -> Option<&Address> {
        self.wallet.as_ref().map(|w| w.address())
    }

    pub fn registry(&self) -> &Arc<Registry<S>> {
        &self.registry
    }

    pub fn reveal_session(&self) -> &RevealSession {
        self.revealer.session()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn begin(&self) -> Result<(&W, BusyGuard<'_>), SessionError> {
        let wallet = self.wallet.as_ref().ok_or(SessionError::NotConnected)?;
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SessionError::Busy)?;
        Ok((wallet, BusyGuard(&self.busy)))
    }

    /// Submit as the connected wallet, then reload the asset list.
    pub async fn submit(&self, submission: Submission) -> Result<Asset, SessionError> {
        let (wallet, _guard) = self.begin()?;
        let asset = self.registry.create(wallet.address(), submission).await?;
        self.registry.list().await;
        Ok(asset)
    }

    pub async fn approve(&self, id: &AssetId) -> Result<Asset, SessionError> {
        let (wallet, _guard) = self.begin()?;
        let asset = self.registry.approve(id, wallet.address()).await?;
        self.registry.list().await;
        Ok(asset)
    }

    pub async fn reject(&self, id: &AssetId) -> Result<Asset, SessionError> {
        let (wallet, _guard) = self.begin()?;
        let asset = self.registry.reject(id, wallet.address()).await?;
        self.registry.list().await;
        Ok(asset)
    }

    /// Reveal `asset`'s value after the connected wallet signs the session
    /// challenge. `Ok(None)` when the wallet declines.
    pub async fn reveal(&self, asset: &Asset) -> Result<Option<f64>, SessionError> {
        let (wallet, _guard) = self.begin()?;
        Ok(self.revealer.reveal(asset, Some(wallet)).await?)
    }

    /// Reload the asset list. Does not need a wallet.
    pub async fn refresh(&self) -> Vec<Asset> {
        self.registry.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{signer::LocalSigner, store::MemoryStore};

    fn session() -> Session<MemoryStore, LocalSigner> {
        let config = ClientConfig::default();
        let registry = Arc::new(Registry::new(MemoryStore::new("0xstore"), &config));
        Session::new(registry, &config)
    }

    #[tokio::test]
    async fn operations_need_a_wallet() {
        let session = session();
        let err = session
            .submit(Submission::new("Aurora", "Weapon", 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotConnected));
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn guard_clears_after_a_failed_operation() {
        let mut session = session();
        session.connect(LocalSigner::new("0xowner"));

        let err = session.approve(&AssetId::new("missing")).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Registry(RegistryError::NotFound(_))
        ));
        assert!(!session.is_busy());
    }

    #[test]
    fn challenge_names_the_store_contract() {
        let session = session();
        assert_eq!(session.reveal_session().contract_address, "0xstore");
        assert_eq!(session.reveal_session().duration_days, 30);
    }
}
