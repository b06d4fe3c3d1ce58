//! Standard (padded) base64 used by every binary field on the wire.

use serde::{Deserialize, Deserializer, Serializer};

/// Encode bytes as standard base64.
pub fn encode<B: AsRef<[u8]>>(bytes: B) -> String {
    base64_simd::STANDARD.encode_to_string(bytes.as_ref())
}

/// Decode standard base64.
pub fn decode<S: AsRef<[u8]>>(encoded: S) -> Result<Vec<u8>, base64_simd::Error> {
    base64_simd::STANDARD.decode_to_vec(encoded.as_ref())
}

/// `serialize_with` helper rendering a byte field as base64 text.
pub fn serialize<B: AsRef<[u8]>, S: Serializer>(
    bytes: &B,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&encode(bytes))
}

/// `deserialize_with` counterpart of [`serialize`].
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let text = String::deserialize(deserializer)?;
    decode(text).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_is_padded_standard_alphabet() {
        assert_eq!(encode(b"hunter2"), "aHVudGVyMg==");
        assert_eq!(encode([0xfb, 0xff]), "+/8=");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode("not base64!").is_err());
    }
}
