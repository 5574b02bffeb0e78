//! Hex encoding for command input and output.

/// Converts bytes to a lowercase hexadecimal string.
pub fn encode(bytes: &[u8]) -> String {
    let mut hex = String::with_capacity(bytes.len() * 2);
    for byte in bytes.iter() {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}

/// Converts a hexadecimal string to bytes, stripping whitespace and/or a `0x` prefix.
pub fn decode(hex: &str) -> Option<Vec<u8>> {
    let hex = hex.replace(['\t', '\n', '\r', ' '], "");
    let hex = hex.strip_prefix("0x").unwrap_or(&hex);
    if hex.len() % 2 != 0 {
        return None;
    }

    (0..hex.len())
        .step_by(2)
        .map(|i| hex.get(i..i + 2).and_then(|pair| u8::from_str_radix(pair, 16).ok()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        assert_eq!(encode(&[]), "");
        assert_eq!(encode(&[0x01, 0xAB, 0xFF]), "01abff");
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode("01abff"), Some(vec![0x01, 0xAB, 0xFF]));
        assert_eq!(decode("0x01 AB\nff"), Some(vec![0x01, 0xAB, 0xFF]));
        assert_eq!(decode(""), Some(vec![]));

        // Odd length
        assert_eq!(decode("abc"), None);

        // Not hex
        assert_eq!(decode("zz"), None);

        // Non-ASCII
        assert_eq!(decode("éé"), None);
    }
}
