// ─── Hex Codec ───
// Digest values travel as hex in the manifest and in status lines.

use std::fmt;

use crate::core::error::{LauncherError, LauncherResult};

/// Encode bytes as uppercase hex.
pub fn encode(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}

/// Decode a hex string. Accepts either case.
pub fn decode(value: &str) -> LauncherResult<Vec<u8>> {
    hex::decode(value).map_err(|e| LauncherError::MalformedHex {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Raw SHA-1 digest bytes, shown as uppercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sha1Digest(Vec<u8>);

impl Sha1Digest {
    pub fn from_hex(value: &str) -> LauncherResult<Self> {
        decode(value).map(Self)
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Sha1Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(&self.0))
    }
}
