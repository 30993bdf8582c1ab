use crate::error::{AuthError, Result};
use base32::Alphabet;
use totp_lite::{totp_custom, Sha1};

const TOTP_DIGITS: u32 = 6;
const TOTP_STEP: u64 = 30; // 30 seconds

fn decode_secret(secret: &str) -> Result<Vec<u8>> {
    base32::decode(Alphabet::Rfc4648 { padding: false }, secret)
        .ok_or_else(|| AuthError::ValidationError("Invalid secret format".to_string()))
}

fn now() -> Result<u64> {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| AuthError::Internal(format!("Time error: {}", e)))
}

/// TOTP code for `secret` at unix time `time`
pub fn generate_totp_at(secret: &str, time: u64) -> Result<String> {
    let secret_bytes = decode_secret(secret)?;
    let totp_value = totp_custom::<Sha1>(TOTP_STEP, TOTP_DIGITS, &secret_bytes, time);
    Ok(format!("{:0width$}", totp_value, width = TOTP_DIGITS as usize))
}

/// Verify a TOTP code against a secret, allowing ±1 period of clock drift
pub fn verify_totp(secret: &str, code: &str) -> Result<bool> {
    verify_totp_at(secret, code, now()?)
}

pub fn verify_totp_at(secret: &str, code: &str, time: u64) -> Result<bool> {
    let code = code.trim();

    for time_offset in [-1i64, 0, 1] {
        let check_time = (time as i64 + time_offset * TOTP_STEP as i64).max(0) as u64;
        let expected_code = generate_totp_at(secret, check_time)?;

        if constant_time_compare(&expected_code, code) {
            return Ok(true);
        }
    }

    Ok(false)
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
