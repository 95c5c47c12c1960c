//! # encoded-value: Value Tokens and Token Arithmetic
//!
//! This crate turns a plaintext valuation into an opaque string token, turns
//! it back, and applies named arithmetic adjustments to a token.
//!
//! ## NOT A CONFIDENTIALITY SCHEME
//!
//! The token is a **format transform**, not a ciphertext. Anyone holding a
//! token recovers the plaintext with [`decode`]; there is no key. The `FHE-`
//! tag is kept only for wire compatibility with records already written by
//! other clients. Code that needs real confidentiality must supply a genuine
//! scheme behind [`ValueCodec`]; [`TransformEngine`] and its callers only ever
//! go through `encode` / `decode` and stay unchanged.
//!
//! ## Token Layout
//!
//! ```text
//! "FHE-" || base64(shortest round-trip decimal of the f64)
//! ```
//!
//! Untagged tokens are legacy plaintext and are parsed directly:
//!
//! ```rust,ignore
//! assert_eq!(decode(&encode(250.0))?, 250.0);
//! assert_eq!(decode("3.14")?, 3.14);
//!
//! let raised = apply(&encode(100.0), Operation::Increase10Pct)?;
//! assert!((decode(&raised)? - 110.0).abs() < 1e-9);
//! ```

#[cfg(test)]
mod tests;

use std::{convert::Infallible, fmt, str::FromStr};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use thiserror::Error;

/// Prefix marking a token produced by [`TaggedCodec`].
pub const TOKEN_TAG: &str = "FHE-";

/// Malformed token. Surfaced as the format error of the registry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("token payload is not valid base64")]
    Base64,
    #[error("token payload is not utf-8")]
    Utf8,
    #[error("token does not hold a number: {0:?}")]
    NotANumber(String),
    #[error("token holds a non-finite value: {0:?}")]
    NonFinite(String),
}

/// Number <-> token conversion.
///
/// `decode(encode(x)) == x` must hold exactly for every finite `x`.
pub trait ValueCodec: Send + Sync {
    fn encode(&self, plaintext: f64) -> String;

    fn decode(&self, token: &str) -> Result<f64, CodecError>;
}

/// The `FHE-` + base64 codec. Reversible by anyone, see the crate docs.
#[derive(Clone, Copy, Debug, Default)]
pub struct TaggedCodec;

impl ValueCodec for TaggedCodec {
    fn encode(&self, plaintext: f64) -> String {
        // `Display` for f64 is the shortest string that parses back to the same bits.
        format!("{TOKEN_TAG}{}", STANDARD.encode(plaintext.to_string()))
    }

    fn decode(&self, token: &str) -> Result<f64, CodecError> {
        let text = match token.strip_prefix(TOKEN_TAG) {
            Some(payload) => {
                let bytes = STANDARD.decode(payload).map_err(|_| CodecError::Base64)?;
                String::from_utf8(bytes).map_err(|_| CodecError::Utf8)?
            }
            None => {
                log::debug!(target: "encoded-value", "decoding untagged legacy token");
                token.to_string()
            }
        };
        parse_finite(&text)
    }
}

fn parse_finite(text: &str) -> Result<f64, CodecError> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| CodecError::NotANumber(text.to_string()))?;
    if !value.is_finite() {
        return Err(CodecError::NonFinite(text.to_string()));
    }
    Ok(value)
}

/// Encode with the default [`TaggedCodec`].
pub fn encode(plaintext: f64) -> String {
    TaggedCodec.encode(plaintext)
}

/// Decode with the default [`TaggedCodec`].
pub fn decode(token: &str) -> Result<f64, CodecError> {
    TaggedCodec.decode(token)
}

/// Apply `op` to `token` with the default [`TaggedCodec`].
pub fn apply(token: &str, op: Operation) -> Result<String, CodecError> {
    TransformEngine::new(TaggedCodec).apply(token, op)
}

// ========================= Transform Engine =========================

/// Arithmetic adjustment applied to an encoded value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Operation {
    /// x 1.10
    Increase10Pct,
    /// x 0.90
    Decrease10Pct,
    /// x 2.0
    Double,
    /// x 1.0
    #[default]
    Identity,
}

impl Operation {
    pub fn factor(&self) -> f64 {
        match self {
            Operation::Increase10Pct => 1.10,
            Operation::Decrease10Pct => 0.90,
            Operation::Double => 2.0,
            Operation::Identity => 1.0,
        }
    }

    /// Wire name of the operation.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Increase10Pct => "increase10%",
            Operation::Decrease10Pct => "decrease10%",
            Operation::Double => "double",
            Operation::Identity => "identity",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown names map to [`Operation::Identity`]; parsing never fails.
impl FromStr for Operation {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "increase10%" => Operation::Increase10Pct,
            "decrease10%" => Operation::Decrease10Pct,
            "double" => Operation::Double,
            _ => Operation::Identity,
        })
    }
}

impl From<&str> for Operation {
    fn from(name: &str) -> Self {
        match name.parse() {
            Ok(op) => op,
            Err(never) => match never {},
        }
    }
}

/// Applies [`Operation`]s to tokens through a [`ValueCodec`].
///
/// The engine never looks inside a token: it decodes, multiplies and
/// re-encodes. No rounding or clamping is applied to the product.
#[derive(Clone, Debug, Default)]
pub struct TransformEngine<C = TaggedCodec> {
    codec: C,
}

impl<C: ValueCodec> TransformEngine<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// # Errors
    /// * the codec's error if `token` is malformed
    pub fn apply(&self, token: &str, op: Operation) -> Result<String, CodecError> {
        let value = self.codec.decode(token)?;
        Ok(self.codec.encode(value * op.factor()))
    }

    /// [`apply`](Self::apply) with an operation given by wire name.
    pub fn apply_named(&self, token: &str, op: &str) -> Result<String, CodecError> {
        self.apply(token, Operation::from(op))
    }
}
