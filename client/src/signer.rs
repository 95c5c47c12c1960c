//! In-process [`MessageSigner`].
//!
//! The "signature" is `sha256(secret || message)`; it stands in for a wallet
//! prompt and proves nothing to a third party.

use async_trait::async_trait;
use collateral_assets_primitives::{Address, MessageSigner, SignError, Signature};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Prompt {
    Accept,
    Reject,
}

#[derive(Debug)]
pub struct LocalSigner {
    address: Address,
    secret: [u8; 32],
    prompt: Prompt,
    last_message: Mutex<Option<String>>,
}

impl LocalSigner {
    pub fn new(address: impl Into<Address>) -> Self {
        let mut secret = [0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        Self::from_secret(address, secret)
    }

    pub fn from_secret(address: impl Into<Address>, secret: [u8; 32]) -> Self {
        Self {
            address: address.into(),
            secret,
            prompt: Prompt::Accept,
            last_message: Mutex::new(None),
        }
    }

    /// A wallet whose user declines every signature request.
    pub fn rejecting(address: impl Into<Address>) -> Self {
        Self {
            prompt: Prompt::Reject,
            ..Self::new(address)
        }
    }

    /// Last message presented for signing, accepted or not.
    pub async fn last_message(&self) -> Option<String> {
        self.last_message.lock().await.clone()
    }
}

#[async_trait]
impl MessageSigner for LocalSigner {
    fn address(&self) -> &Address {
        &self.address
    }

    async fn sign_message(&self, message: &str) -> Result<Signature, SignError> {
        *self.last_message.lock().await = Some(message.to_string());
        if self.prompt == Prompt::Reject {
            return Err(SignError::UserRejected);
        }
        let mut hasher = Sha256::new();
        hasher.update(self.secret);
        hasher.update(message.as_bytes());
        Ok(Signature(format!("0x{}", hex::encode(hasher.finalize()))))
    }
}
