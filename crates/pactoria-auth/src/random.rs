//! OS-backed random values.

use crate::error::AuthError;

/// Fill an `N`-byte array from the OS random source.
///
/// # Errors
///
/// Returns `AuthError::Random` if the random source is unavailable.
pub fn random_bytes<const N: usize>() -> Result<[u8; N], AuthError> {
    let mut bytes = [0u8; N];
    getrandom::fill(&mut bytes).map_err(|e| AuthError::Random(e.to_string()))?;
    Ok(bytes)
}

/// Lower-case hex encoding of `bytes` random bytes, used for invitation
/// tokens and token ids.
///
/// # Errors
///
/// Returns `AuthError::Random` if the random source is unavailable.
pub fn generate_token_hex(bytes: usize) -> Result<String, AuthError> {
    let mut buf = vec![0u8; bytes];
    getrandom::fill(&mut buf).map_err(|e| AuthError::Random(e.to_string()))?;
    Ok(buf.iter().map(|b| format!("{b:02x}")).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_token_shape() {
        let token = generate_token_hex(32).unwrap();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(token, generate_token_hex(32).unwrap());
    }

    #[test]
    fn zero_bytes_is_empty() {
        assert_eq!(generate_token_hex(0).unwrap(), "");
    }
}
