// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential hashing and random tokens.
//!
//! Passwords are stored as `pbkdf2-sha256$<iterations>$<salt>$<hash>` with
//! base64 (no padding) salt and hash.

use std::num::NonZeroU32;

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};
use ring::{digest, pbkdf2};

use crate::error::AppError;

static ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;
const SCHEME: &str = "pbkdf2-sha256";
const CREDENTIAL_LEN: usize = digest::SHA256_OUTPUT_LEN;
const SALT_LEN: usize = 16;
const TOKEN_LEN: usize = 32;

pub const DEFAULT_ITERATIONS: u32 = 100_000;

#[derive(Clone)]
pub struct PasswordHasher {
    iterations: NonZeroU32,
    rng: SystemRandom,
}

impl PasswordHasher {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: NonZeroU32::new(iterations).unwrap_or(NonZeroU32::MIN),
            rng: SystemRandom::new(),
        }
    }

    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        let mut salt = [0u8; SALT_LEN];
        self.rng
            .fill(&mut salt)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to generate salt")))?;

        let mut credential = [0u8; CREDENTIAL_LEN];
        pbkdf2::derive(
            ALGORITHM,
            self.iterations,
            &salt,
            password.as_bytes(),
            &mut credential,
        );

        Ok(format!(
            "{}${}${}${}",
            SCHEME,
            self.iterations,
            STANDARD_NO_PAD.encode(salt),
            STANDARD_NO_PAD.encode(credential)
        ))
    }

    /// Constant-time check of `password` against a stored credential string.
    ///
    /// Malformed stored values never verify.
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        let parts: Vec<&str> = stored.split('$').collect();
        let [scheme, iterations, salt, credential] = parts[..] else {
            return false;
        };
        if scheme != SCHEME {
            return false;
        }

        let Some(iterations) = iterations.parse().ok().and_then(NonZeroU32::new) else {
            return false;
        };
        let (Ok(salt), Ok(credential)) = (
            STANDARD_NO_PAD.decode(salt),
            STANDARD_NO_PAD.decode(credential),
        ) else {
            return false;
        };

        pbkdf2::verify(ALGORITHM, iterations, &salt, password.as_bytes(), &credential).is_ok()
    }

    /// Random hex token for email verification links.
    pub fn random_token(&self) -> Result<String, AppError> {
        let mut bytes = [0u8; TOKEN_LEN];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to generate token")))?;
        Ok(hex::encode(bytes))
    }
}
