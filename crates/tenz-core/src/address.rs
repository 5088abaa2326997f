//! Account and ledger identities.
//!
//! An [`Address`] is 20 opaque bytes rendered as `0x`-prefixed lowercase hex.
//! The all-zero address is reserved: it never holds a transfer grant, never
//! owns the token, and never receives tokens.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{AddressError, TokenError};

/// Number of bytes in an address.
pub const ADDRESS_LEN: usize = 20;

/// Domain separator for ledger identities derived from a deployer.
const CONTRACT_DOMAIN: &[u8] = b"tenz contract";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The zero address.
    pub const ZERO: Self = Self([0u8; ADDRESS_LEN]);

    pub const fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }

    /// Deterministic address for a human-readable label.
    ///
    /// Last 20 bytes of `BLAKE3(label)`. Used for named accounts in the CLI
    /// and in tests.
    pub fn from_label(label: &str) -> Self {
        Self::from_digest(blake3::hash(label.as_bytes()).as_bytes())
    }

    /// Identity of the `nonce`-th ledger deployed by `deployer`.
    pub fn contract(deployer: &Address, nonce: u64) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(CONTRACT_DOMAIN);
        hasher.update(&deployer.0);
        hasher.update(&nonce.to_le_bytes());
        Self::from_digest(hasher.finalize().as_bytes())
    }

    fn from_digest(digest: &[u8; 32]) -> Self {
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&digest[32 - ADDRESS_LEN..]);
        Self(bytes)
    }

    /// `Err(ZeroAddress)` for the zero address, `Ok(self)` otherwise.
    pub fn non_zero(self) -> Result<Self, TokenError> {
        if self.is_zero() {
            Err(TokenError::ZeroAddress)
        } else {
            Ok(self)
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes =
            hex::decode(digits).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        let bytes: [u8; ADDRESS_LEN] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| AddressError::InvalidLength(bytes.len()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
