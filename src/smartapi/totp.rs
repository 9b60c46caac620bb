use anyhow::{anyhow, Result};
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// TOTP time step in seconds (RFC 6238 default, what SmartAPI expects).
const TIME_STEP_SECS: u64 = 30;
const CODE_DIGITS: u32 = 6;

/// Derive the 6-digit login code for the given unix time from a
/// base32-encoded shared secret (the string Angel One shows when enabling
/// TOTP). HMAC-SHA1 over the 30-second counter, dynamic truncation per
/// RFC 4226.
pub fn generate_code(secret_base32: &str, unix_time: u64) -> Result<String> {
    let key = base32::decode(secret_base32)
        .ok_or_else(|| anyhow!("TOTP secret is not valid base32"))?;
    if key.is_empty() {
        return Err(anyhow!("TOTP secret is empty"));
    }

    let counter = unix_time / TIME_STEP_SECS;

    let mut mac = HmacSha1::new_from_slice(&key)
        .map_err(|e| anyhow!("HMAC key setup failed: {}", e))?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    // Dynamic truncation: low nibble of the last byte picks the offset.
    let offset = (digest[19] & 0x0f) as usize;
    let binary = ((digest[offset] & 0x7f) as u32) << 24
        | (digest[offset + 1] as u32) << 16
        | (digest[offset + 2] as u32) << 8
        | (digest[offset + 3] as u32);

    let code = binary % 10u32.pow(CODE_DIGITS);
    Ok(format!("{:0width$}", code, width = CODE_DIGITS as usize))
}

// RFC 4648 base32, the alphabet authenticator secrets use. Lowercase input
// and trailing padding are accepted; anything else is rejected.
mod base32 {
    pub fn decode(input: &str) -> Option<Vec<u8>> {
        let mut bits: u32 = 0;
        let mut nbits = 0;
        let mut out = Vec::with_capacity(input.len() * 5 / 8);

        for c in input.chars() {
            if c == '=' || c == ' ' {
                continue;
            }
            let value = match c.to_ascii_uppercase() {
                c @ 'A'..='Z' => c as u32 - 'A' as u32,
                c @ '2'..='7' => c as u32 - '2' as u32 + 26,
                _ => return None,
            };
            bits = (bits << 5) | value;
            nbits += 5;
            if nbits >= 8 {
                nbits -= 8;
                out.push((bits >> nbits) as u8);
            }
        }

        Some(out)
    }
}
