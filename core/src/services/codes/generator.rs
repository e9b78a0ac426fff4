//! Numeric codes, opaque tokens and their digests

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use constant_time_eq::constant_time_eq;
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::errors::{DomainError, DomainResult};

/// Longest numeric code whose range fits in a `u64`
pub const MAX_CODE_LENGTH: usize = 19;

/// Generate a numeric code of exactly `length` digits
///
/// The value is uniform over `[10^(length-1), 10^length)`. Draws are 64-bit and
/// rejection sampled, so no value is favoured by a modulo bias.
pub fn generate_numeric_code(length: usize) -> DomainResult<String> {
    if length == 0 || length > MAX_CODE_LENGTH {
        return Err(DomainError::Validation {
            message: format!("code length must be between 1 and {}", MAX_CODE_LENGTH),
        });
    }

    let low = 10u64.pow(length as u32 - 1);
    let span = 10u64.pow(length as u32) - low;
    // Largest multiple of `span` representable; draws at or above it are rejected
    let limit = u64::MAX - (u64::MAX % span);

    loop {
        let draw = next_u64()?;
        if draw < limit {
            return Ok(format!("{:0width$}", low + draw % span, width = length));
        }
    }
}

/// Generate an opaque URL-safe token from `byte_size` random bytes
pub fn generate_opaque_token(byte_size: usize) -> DomainResult<String> {
    if byte_size == 0 {
        return Err(DomainError::Validation {
            message: "token size must be positive".to_string(),
        });
    }

    let mut bytes = vec![0u8; byte_size];
    fill_random(&mut bytes)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// One-way digest used to store codes and tokens at rest (lowercase hex SHA-256)
pub fn digest(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compare two digests in constant time
pub fn constant_time_equals(a: &str, b: &str) -> bool {
    constant_time_eq(a.as_bytes(), b.as_bytes())
}

fn next_u64() -> DomainResult<u64> {
    let mut buf = [0u8; 8];
    fill_random(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn fill_random(buf: &mut [u8]) -> DomainResult<()> {
    OsRng.try_fill_bytes(buf).map_err(|e| {
        tracing::error!(error = %e, event = "entropy_unavailable", "OS random source failed");
        DomainError::Entropy {
            message: e.to_string(),
        }
    })
}
