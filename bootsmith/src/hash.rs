// SPDX-FileCopyrightText: 2024-2025 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

use ring::digest::{self, Context};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    pub fn digest_size(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
        }
    }
}

/// Incremental digest computation. Finalizing consumes the value, so a
/// finalized hasher cannot be updated again.
pub struct Hasher {
    algorithm: HashAlgorithm,
    context: Context,
}

impl Hasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        let context = match algorithm {
            HashAlgorithm::Sha1 => Context::new(&digest::SHA1_FOR_LEGACY_USE_ONLY),
            HashAlgorithm::Sha256 => Context::new(&digest::SHA256),
        };

        Self { algorithm, context }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn update(&mut self, data: &[u8]) {
        self.context.update(data);
    }

    /// Write the digest to the beginning of `out`, which must be at least
    /// [`HashAlgorithm::digest_size`] bytes. Exactly that many bytes are
    /// written.
    pub fn finalize_into(self, out: &mut [u8]) {
        let size = self.algorithm.digest_size();
        assert!(
            out.len() >= size,
            "Digest buffer too small: {} < {size}",
            out.len(),
        );

        let digest = self.context.finish();
        out[..size].copy_from_slice(digest.as_ref());
    }

    pub fn finalize(self) -> Vec<u8> {
        let mut out = vec![0u8; self.algorithm.digest_size()];
        self.finalize_into(&mut out);
        out
    }
}

/// One-shot SHA-256.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Hasher::new(HashAlgorithm::Sha256);
    hasher.update(data);

    let mut out = [0u8; 32];
    hasher.finalize_into(&mut out);
    out
}
