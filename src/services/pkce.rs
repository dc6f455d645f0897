// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! PKCE verifier/challenge material for the federated login redirect.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};

use crate::error::AppError;

/// A PKCE pair: the verifier stays local (persisted across the redirect),
/// the challenge goes into the authorize URL.
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

impl PkcePair {
    /// Generate a fresh pair: 32 random bytes, base64url verifier,
    /// challenge = base64url(SHA-256(verifier)).
    pub fn generate() -> Result<Self, AppError> {
        let rng = SystemRandom::new();
        let mut bytes = [0u8; 32];
        rng.fill(&mut bytes)
            .map_err(|_| AppError::Auth("system RNG unavailable".to_string()))?;

        let verifier = URL_SAFE_NO_PAD.encode(bytes);
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));

        Ok(Self {
            verifier,
            challenge,
        })
    }
}
