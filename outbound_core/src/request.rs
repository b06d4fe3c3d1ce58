//! The send request handed to the server.

use crate::{
    fallback::ClearFallbackPackage,
    package::AddressPackage,
    recipient::{Email, SendStrategy},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// The message body, already encrypted under the body session key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBody(#[serde(with = "crate::util::base64")] Vec<u8>);

impl EncryptedBody {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for EncryptedBody {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for EncryptedBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptedBody({} bytes)", self.0.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    pub body: EncryptedBody,

    /// OR of the wire bits of every strategy in use.
    pub send_types: u8,

    /// Address packages grouped by strategy, each group in recipient order.
    pub packages: BTreeMap<SendStrategy, Vec<AddressPackage>>,

    /// Present exactly when some recipient is clear-inline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clear_fallback: Option<ClearFallbackPackage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_offset: Option<u32>,
}

impl SendRequest {
    pub fn new(
        body: EncryptedBody,
        packages: Vec<AddressPackage>,
        clear_fallback: Option<ClearFallbackPackage>,
        expiration_offset: Option<u32>,
    ) -> Self {
        let send_types = SendStrategy::mask(packages.iter().map(|p| p.send_type));

        let mut grouped: BTreeMap<SendStrategy, Vec<AddressPackage>> = BTreeMap::new();
        for package in packages {
            grouped.entry(package.send_type).or_default().push(package);
        }

        SendRequest {
            body,
            send_types,
            packages: grouped,
            clear_fallback,
            expiration_offset,
        }
    }

    pub fn packages_for(&self, strategy: SendStrategy) -> &[AddressPackage] {
        self.packages
            .get(&strategy)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn package_for(&self, email: &Email) -> Option<&AddressPackage> {
        self.packages.values().flatten().find(|p| &p.email == email)
    }

    /// Number of address packages across all strategies.
    pub fn len(&self) -> usize {
        self.packages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
