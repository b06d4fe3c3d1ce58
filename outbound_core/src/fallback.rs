//! The clear fallback package shared by every clear-inline recipient.
//!
//! Clear-inline recipients get no wrapping of their own. The session keys go
//! out once, base64-encoded and unencrypted: those recipients already have
//! the plaintext through another channel, so this is a transport
//! convenience rather than a confidentiality boundary.

use crate::{
    attachment::{AttachmentId, AttachmentKeyEntry},
    crypto::session_key::{SessionAlgorithm, SessionKey},
    util::base64,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearFallbackPackage {
    pub body: ClearBodyPackage,

    /// One entry per attachment of the message. Omitted on the wire when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<ClearAttachmentPackage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearBodyPackage {
    /// Base64 of the clear body session key.
    pub key: String,
    pub algorithm: SessionAlgorithm,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearAttachmentPackage {
    pub attachment_id: AttachmentId,

    /// Base64 of the clear attachment session key.
    pub key: String,
    pub algorithm: SessionAlgorithm,
}

impl ClearFallbackPackage {
    pub fn new(
        body_key: &SessionKey,
        body_algorithm: SessionAlgorithm,
        attachments: &[AttachmentKeyEntry],
    ) -> Self {
        ClearFallbackPackage {
            body: ClearBodyPackage {
                key: base64::encode(body_key.as_slice()),
                algorithm: body_algorithm,
            },
            attachments: attachments
                .iter()
                .map(|entry| ClearAttachmentPackage {
                    attachment_id: entry.attachment_id.clone(),
                    key: base64::encode(entry.session_key.as_slice()),
                    algorithm: entry.algorithm,
                })
                .collect(),
        }
    }

    pub fn decode_body_key(&self) -> Result<SessionKey, DecodeKeyError> {
        decode_key(&self.body.key)
    }
}

impl ClearAttachmentPackage {
    pub fn decode_key(&self) -> Result<SessionKey, DecodeKeyError> {
        decode_key(&self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeKeyError {
    #[error("Invalid base64: {0}")]
    Base64(String),

    #[error("Expected a 32-byte key, got {0} bytes")]
    Length(usize),
}

fn decode_key(encoded: &str) -> Result<SessionKey, DecodeKeyError> {
    let bytes = base64::decode(encoded).map_err(|e| DecodeKeyError::Base64(e.to_string()))?;
    SessionKey::try_from_slice(&bytes).ok_or(DecodeKeyError::Length(bytes.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_covers_every_attachment() {
        let body_key = SessionKey::from([3; 32]);
        let attachments = vec![
            AttachmentKeyEntry::new("a", SessionKey::from([4; 32])),
            AttachmentKeyEntry::new("b", SessionKey::from([5; 32]))
                .with_algorithm(SessionAlgorithm::Aes128),
        ];

        let package = ClearFallbackPackage::new(&body_key, SessionAlgorithm::Aes256, &attachments);

        assert_eq!(package.decode_body_key().unwrap(), body_key);
        assert_eq!(package.body.algorithm, SessionAlgorithm::Aes256);
        assert_eq!(package.attachments.len(), 2);
        for (clear, entry) in package.attachments.iter().zip(&attachments) {
            assert_eq!(clear.attachment_id, entry.attachment_id);
            assert_eq!(clear.decode_key().unwrap(), entry.session_key);
            assert_eq!(clear.algorithm, entry.algorithm);
        }
    }

    #[test]
    fn test_algorithms_on_the_wire() {
        let attachments = vec![AttachmentKeyEntry::new("a", SessionKey::from([4; 32]))
            .with_algorithm(SessionAlgorithm::Aes192)];
        let package = ClearFallbackPackage::new(
            &SessionKey::from([3; 32]),
            SessionAlgorithm::XChaCha20Poly1305,
            &attachments,
        );

        let json = serde_json::to_value(&package).unwrap();
        assert_eq!(json["body"]["algorithm"], "xchacha20poly1305");
        assert_eq!(json["body"]["key"], base64::encode([3u8; 32]));
        assert_eq!(json["attachments"][0]["algorithm"], "aes192");
    }

    #[test]
    fn test_no_attachments_omitted_on_the_wire() {
        let package = ClearFallbackPackage::new(&SessionKey::from([3; 32]), SessionAlgorithm::Aes256, &[]);

        let json = serde_json::to_value(&package).unwrap();
        assert!(json.get("attachments").is_none());

        let back: ClearFallbackPackage = serde_json::from_value(json).unwrap();
        assert_eq!(back, package);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let clear = ClearAttachmentPackage {
            attachment_id: "a".into(),
            key: base64::encode([1u8; 16]),
            algorithm: SessionAlgorithm::Aes256,
        };
        assert_eq!(clear.decode_key(), Err(DecodeKeyError::Length(16)));
    }
}
