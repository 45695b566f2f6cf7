//! Stable names for generated dependency objects

use crapi_core::join;
use sha2::{Digest, Sha256};

/// Characters Kubernetes uses for generated name suffixes (no vowels, no
/// look-alike digits)
const SAFE_ALPHABET: &[u8] = b"bcdfghjklmnpqrstvwxz2456789";

/// Longest valid object name
const MAX_NAME_LEN: usize = 253;

/// `<prefix>-<suffix>`, where the suffix is derived from `path` only
///
/// The suffix is the decimal form of the first 8 bytes of the SHA-256 of the
/// dotted path, each digit mapped into [`SAFE_ALPHABET`]. The prefix is
/// truncated so the result stays a valid object name.
pub fn dependency_name<S: AsRef<str>>(prefix: &str, path: &[S]) -> String {
    let digest = Sha256::digest(join(path).as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    let suffix: String = u64::from_be_bytes(head)
        .to_string()
        .bytes()
        .map(|b| SAFE_ALPHABET[usize::from(b) % SAFE_ALPHABET.len()] as char)
        .collect();

    let room = MAX_NAME_LEN - suffix.len() - 1;
    let prefix = match prefix.char_indices().nth(room) {
        Some((cut, _)) => &prefix[..cut],
        None => prefix,
    };
    format!("{prefix}-{suffix}")
}
