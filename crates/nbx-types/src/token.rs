use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::address::{decode_hex32, Address};
use crate::error::TypeError;

/// Integrity token bound to exactly one manifest node's resolved identity.
///
/// Leaf tokens are the leaf's content address; composite tokens are
/// domain-separated hashes over declared fields and ordered child tokens
/// (see `nbx-token`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Token([u8; 32]);

impl Token {
    pub const fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        decode_hex32(s).map(Self)
    }
}

impl From<Address> for Token {
    fn from(address: Address) -> Self {
        Self(*address.as_bytes())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({})", self.short_hex())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Token {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_address_keeps_bytes() {
        let address = Address::of(b"leaf");
        let token = Token::from(address);
        assert_eq!(token.as_bytes(), address.as_bytes());
    }

    #[test]
    fn hex_roundtrip() {
        let token = Token::from_hash([7u8; 32]);
        assert_eq!(token.to_hex().parse::<Token>().unwrap(), token);
    }

    #[test]
    fn short_hex_is_8_chars() {
        assert_eq!(Token::from_hash([0xab; 32]).short_hex(), "abababab");
    }
}
