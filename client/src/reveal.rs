//! Signature-gated reveal of an asset's plaintext value.
//!
//! The wallet is asked to sign a challenge describing the current session and
//! the token is decoded only if it agrees. **This is a consent prompt, not
//! access control**: the signature is never verified and nothing about it is
//! needed to decode, so anyone holding the token bytes can read the value
//! without signing (see `encoded_value`'s crate docs).

use std::time::{SystemTime, UNIX_EPOCH};

use collateral_assets_primitives::{Asset, MessageSigner};
use encoded_value::{CodecError, TaggedCodec, ValueCodec};
use rand::RngCore;
use thiserror::Error;
use tracing::{debug, warn};

/// Hex digits of the per-session public key, after the `0x` prefix.
pub const PUBLIC_KEY_HEX_DIGITS: usize = 2000;

const SECONDS_PER_DAY: u64 = 86_400;

#[derive(Debug, Error)]
pub enum RevealError {
    #[error("please connect wallet first")]
    NotConnected,
    #[error(transparent)]
    Format(#[from] CodecError),
}

/// Parameters fixed when a client session starts and repeated in every
/// challenge it issues.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevealSession {
    pub public_key: String,
    pub contract_address: String,
    pub chain_id: u64,
    pub start_timestamp: u64,
    pub duration_days: u32,
}

impl RevealSession {
    /// New session starting now with a fresh random public key.
    pub fn start(contract_address: impl Into<String>, chain_id: u64, duration_days: u32) -> Self {
        let start_timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            public_key: session_public_key(),
            contract_address: contract_address.into(),
            chain_id,
            start_timestamp,
            duration_days,
        }
    }

    /// The exact message handed to the wallet.
    pub fn challenge(&self) -> String {
        format!(
            "publickey:{}\ncontractAddresses:{}\ncontractsChainId:{}\nstartTimestamp:{}\ndurationDays:{}",
            self.public_key,
            self.contract_address,
            self.chain_id,
            self.start_timestamp,
            self.duration_days
        )
    }

    /// End of the validity window stated in the challenge. Informational only.
    pub fn expires_at(&self) -> u64 {
        self.start_timestamp + u64::from(self.duration_days) * SECONDS_PER_DAY
    }
}

fn session_public_key() -> String {
    let mut bytes = [0u8; PUBLIC_KEY_HEX_DIGITS / 2];
    rand::rng().fill_bytes(&mut bytes);
    format!("0x{}", hex::encode(bytes))
}

pub struct Revealer<C = TaggedCodec> {
    session: RevealSession,
    codec: C,
}

impl Revealer<TaggedCodec> {
    pub fn new(session: RevealSession) -> Self {
        Self::with_codec(session, TaggedCodec)
    }
}

impl<C: ValueCodec> Revealer<C> {
    pub fn with_codec(session: RevealSession, codec: C) -> Self {
        Self { session, codec }
    }

    pub fn session(&self) -> &RevealSession {
        &self.session
    }

    /// Ask `signer` to sign the session challenge, then decode the asset's
    /// token.
    ///
    /// # Returns
    /// * `Ok(Some(value))` once the wallet signed
    /// * `Ok(None)` if the wallet declined or failed to sign; nothing is revealed
    ///
    /// # Errors
    /// * `RevealError::NotConnected` - no signer, nothing was requested
    /// * `RevealError::Format` - the stored token is malformed
    pub async fn reveal<W: MessageSigner + ?Sized>(
        &self,
        asset: &Asset,
        signer: Option<&W>,
    ) -> Result<Option<f64>, RevealError> {
        let Some(signer) = signer else {
            return Err(RevealError::NotConnected);
        };

        let challenge = self.session.challenge();
        // The signature is discarded: it gates the flow, it does not unlock anything.
        if let Err(err) = signer.sign_message(&challenge).await {
            warn!(asset = %asset.id, signer = %signer.address(), error = %err, "reveal not signed");
            return Ok(None);
        }

        let value = self.codec.decode(&asset.encoded_value)?;
        debug!(asset = %asset.id, signer = %signer.address(), "asset value revealed");
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_session() -> RevealSession {
        RevealSession {
            public_key: "0xabc".into(),
            contract_address: "0xC0FFEE".into(),
            chain_id: 11_155_111,
            start_timestamp: 1_700_000_000,
            duration_days: 30,
        }
    }

    #[test]
    fn challenge_layout_is_stable() {
        assert_eq!(
            fixed_session().challenge(),
            "publickey:0xabc\ncontractAddresses:0xC0FFEE\ncontractsChainId:11155111\nstartTimestamp:1700000000\ndurationDays:30"
        );
    }

    #[test]
    fn session_keys_are_fresh_hex() {
        let a = RevealSession::start("0xstore", 1, 30);
        let b = RevealSession::start("0xstore", 1, 30);
        assert_eq!(a.public_key.len(), 2 + PUBLIC_KEY_HEX_DIGITS);
        assert!(a.public_key[2..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a.public_key, b.public_key);
        assert!(a.start_timestamp > 0);
    }

    #[test]
    fn validity_window_spans_duration_days() {
        assert_eq!(fixed_session().expires_at(), 1_700_000_000 + 30 * 86_400);
    }
}
