pub mod constants;

mod coder;
mod decoder;
mod error;

pub use coder::BlobCoder;
pub use decoder::BlobDecoder;
pub use error::{BlobDecodeError, BlobEncodeError};

use alloy::primitives::{Bytes, hex};

use self::constants::BLOB_SIZE;

/// Opaque rollup payload bytes carried inside a blob.
pub type Data = Bytes;

/// A 131,072-byte EIP-4844 blob: 4096 field elements of 32 bytes each,
/// every one of which must stay below the BLS12-381 scalar modulus.
///
/// The buffer itself is unvalidated; [`BlobCoder`] produces conforming
/// blobs and [`BlobDecoder`] rejects non-conforming ones.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Blob([u8; BLOB_SIZE]);

impl Blob {
    pub const ZERO: Self = Self([0u8; BLOB_SIZE]);

    /// Zeroes the buffer in place so it can be reused for another encode.
    pub fn clear(&mut self) {
        self.0 = [0u8; BLOB_SIZE];
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Raw bytes of the blob, in the form the KZG library consumes.
    pub fn as_bytes(&self) -> &[u8; BLOB_SIZE] {
        &self.0
    }

    /// Short `aabbcc..xxyyzz` form for console output.
    pub fn terminal_string(&self) -> String {
        format!(
            "{}..{}",
            hex::encode(&self.0[..3]),
            hex::encode(&self.0[BLOB_SIZE - 3..])
        )
    }
}

impl Default for Blob {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<[u8; BLOB_SIZE]> for Blob {
    fn from(bytes: [u8; BLOB_SIZE]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Blob {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Display for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl std::fmt::Debug for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Blob({})", self.terminal_string())
    }
}
