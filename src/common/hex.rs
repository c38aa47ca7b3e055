//! Hex encoding for packets passed through text streams

pub use hex::FromHexError;

/// Decodes a string of hex digit pairs. Whitespace and `:` separators between bytes are ignored.
///
/// Error positions count digits only, not the separators that were skipped.
pub fn decode(string: &str) -> Result<Vec<u8>, FromHexError> {
    let digits: String = string
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    hex::decode(digits)
}

/// Encodes bytes as lowercase hex digits with no separators
pub fn encode(bytes: &[u8]) -> String {
    hex::encode(bytes)
}
