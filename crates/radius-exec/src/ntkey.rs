//! NT_KEY token parsing.
//!
//! NTLM helper programs (ntlm_auth and friends) report the NT-hash-hash
//! of a validated credential as a single stdout line:
//! `NT_KEY: <32 hex digits>`. The decoded 16 bytes feed the MS-CHAPv2
//! authenticator-response computation.

use thiserror::Error;

/// Literal prefix the helper's output must begin with.
pub const NT_KEY_PREFIX: &str = "NT_KEY: ";

/// Hex digits required after the prefix (16 bytes).
pub const NT_KEY_HEX_LEN: usize = 32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NtKeyError {
    #[error("expecting NT_KEY in helper output")]
    MissingPrefix,
    #[error("NT_KEY has unexpected length: {0} hex digits (need {NT_KEY_HEX_LEN})")]
    TooShort(usize),
    #[error("NT_KEY has non-hex values")]
    InvalidHex,
}

/// Decode the 16-byte secret from captured helper output.
///
/// Only the first 32 hex digits are considered; anything after them
/// (typically a trailing newline) is ignored.
pub fn parse_nt_key(output: &str) -> Result<[u8; 16], NtKeyError> {
    let hex = output
        .strip_prefix(NT_KEY_PREFIX)
        .ok_or(NtKeyError::MissingPrefix)?;

    // The digit count check must not be confused by a short tail of
    // non-hex bytes; measure printable token length first.
    let token_len = hex
        .find(|c: char| c.is_whitespace())
        .unwrap_or(hex.len());
    if token_len < NT_KEY_HEX_LEN {
        return Err(NtKeyError::TooShort(token_len));
    }

    let mut secret = [0u8; 16];
    for (i, byte) in secret.iter_mut().enumerate() {
        let hi = hex_digit(hex.as_bytes()[2 * i])?;
        let lo = hex_digit(hex.as_bytes()[2 * i + 1])?;
        *byte = (hi << 4) | lo;
    }
    Ok(secret)
}

fn hex_digit(c: u8) -> Result<u8, NtKeyError> {
    (c as char)
        .to_digit(16)
        .map(|d| d as u8)
        .ok_or(NtKeyError::InvalidHex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let secret: [u8; 16] = [
            0x41, 0xC0, 0x0C, 0x58, 0x4B, 0xD2, 0xD9, 0x1C, 0x40, 0x17, 0xA2, 0xA1, 0x2F,
            0xA5, 0x9F, 0x3F,
        ];
        let hex: String = secret.iter().map(|b| format!("{:02x}", b)).collect();
        let output = format!("NT_KEY: {}\n", hex);
        assert_eq!(parse_nt_key(&output).unwrap(), secret);

        // Uppercase digits decode identically.
        let output = format!("NT_KEY: {}\n", hex.to_uppercase());
        assert_eq!(parse_nt_key(&output).unwrap(), secret);
    }

    #[test]
    fn test_missing_prefix() {
        assert_eq!(
            parse_nt_key("NT_STATUS_WRONG_PASSWORD: Wrong Password (0xc000006a)\n"),
            Err(NtKeyError::MissingPrefix)
        );
        assert_eq!(parse_nt_key(""), Err(NtKeyError::MissingPrefix));
        // Prefix match is exact, including the space.
        assert_eq!(
            parse_nt_key("NT_KEY:00112233445566778899aabbccddeeff"),
            Err(NtKeyError::MissingPrefix)
        );
    }

    #[test]
    fn test_too_short() {
        assert_eq!(
            parse_nt_key("NT_KEY: 0011223344556677889\n"),
            Err(NtKeyError::TooShort(19))
        );
        assert_eq!(parse_nt_key("NT_KEY: "), Err(NtKeyError::TooShort(0)));
    }

    #[test]
    fn test_non_hex_rejected() {
        assert_eq!(
            parse_nt_key("NT_KEY: 00112233445566778899aabbccddeegg"),
            Err(NtKeyError::InvalidHex)
        );
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let output = "NT_KEY: 000102030405060708090a0b0c0d0e0f extra";
        let secret = parse_nt_key(output).unwrap();
        assert_eq!(secret[0], 0x00);
        assert_eq!(secret[15], 0x0f);
    }
}
