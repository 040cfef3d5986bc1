//! Fixed-size byte types shared by the block and transaction models.
//!
//! These mirror the wire representation algod uses in canonical msgpack:
//! every 32/64/80-byte identity field is a msgpack bytes value, never an
//! array of small integers, so `Serialize`/`Deserialize` are hand-written
//! around `serialize_bytes`/`deserialize_bytes` rather than derived.

use std::fmt::{self, Debug, Display, Formatter};

use data_encoding::{BASE32_NOPAD, BASE64};
use serde::{de::Visitor, Deserialize, Deserializer, Serialize, Serializer};
use sha2::Digest;

/// A round is a 64-bit block height.
pub type Round = u64;

/// Zero-based position of a transaction within its block.
pub type Intra = u64;

const CHECKSUM_LEN: usize = 4;
const HASH_LEN: usize = 32;

/// A 32-byte Algorand address.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Address(pub [u8; HASH_LEN]);

impl Default for Address {
    fn default() -> Self {
        Address([0; HASH_LEN])
    }
}

impl Address {
    pub fn new(bytes: [u8; HASH_LEN]) -> Address {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Decode a base32 address string with its trailing 4-byte checksum.
    ///
    /// `decode_address(encode_address(x)) == x` for all 32-byte `x`;
    /// rejects any input that doesn't decode to exactly 36 bytes.
    pub fn from_string(string: &str) -> Result<Address, String> {
        let checksum_address = BASE32_NOPAD
            .decode(string.as_bytes())
            .map_err(|err| format!("error decoding base32: {err:?}"))?;

        if checksum_address.len() != (HASH_LEN + CHECKSUM_LEN) {
            return Err(format!("wrong address length: {}", checksum_address.len()));
        }

        let (address, checksum) = checksum_address.split_at(HASH_LEN);
        let hashed = sha2::Sha512_256::digest(address);
        if &hashed[(HASH_LEN - CHECKSUM_LEN)..] != checksum {
            return Err("input checksum did not validate".to_string());
        }

        let mut bytes = [0; HASH_LEN];
        bytes.copy_from_slice(address);
        Ok(Address::new(bytes))
    }

    /// Encode to base32 with a 4-byte checksum (first 4 bytes of
    /// `sha512_256(raw)`) appended.
    pub fn encode_string(&self) -> String {
        let hashed = sha2::Sha512_256::digest(self.0);
        let checksum = &hashed[(HASH_LEN - CHECKSUM_LEN)..];
        let checksum_address = [&self.0, checksum].concat();
        BASE32_NOPAD.encode(&checksum_address)
    }
}

/// Encode a raw 32-byte address. Convenience wrapper around
/// [`Address::encode_string`] for callers that only have bytes.
pub fn encode_address(bytes: [u8; HASH_LEN]) -> String {
    Address::new(bytes).encode_string()
}

/// Decode a base32 address string into its raw bytes.
pub fn decode_address(string: &str) -> Result<[u8; HASH_LEN], String> {
    Address::from_string(string).map(|a| a.0)
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode_string())
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&self.0[..])
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Address(deserializer.deserialize_bytes(VisitorU8_32)?))
    }
}

/// A SHA512/256 hash, used for block digests, transaction groups and leases.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct HashDigest(pub [u8; 32]);

impl Display for HashDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", BASE64.encode(&self.0))
    }
}

impl Debug for HashDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", BASE32_NOPAD.encode(&self.0))
    }
}

impl From<&[u8]> for HashDigest {
    fn from(data: &[u8]) -> Self {
        let hashed = sha2::Sha512_256::digest(data);
        let mut hash = [0; 32];
        hash.copy_from_slice(&hashed);
        HashDigest(hash)
    }
}

impl Serialize for HashDigest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&self.0[..])
    }
}

impl<'de> Deserialize<'de> for HashDigest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(HashDigest(deserializer.deserialize_bytes(VisitorU8_32)?))
    }
}

/// An Ed25519 signature.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Ed25519Signature(pub [u8; 64]);

impl Debug for Ed25519Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", BASE64.encode(&self.0))
    }
}

impl Serialize for Ed25519Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&self.0[..])
    }
}

impl<'de> Deserialize<'de> for Ed25519Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Ed25519Signature(
            deserializer.deserialize_bytes(VisitorU8_64)?,
        ))
    }
}

/// An Ed25519 public key.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Ed25519PublicKey(pub [u8; 32]);

impl Serialize for Ed25519PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&self.0[..])
    }
}

impl<'de> Deserialize<'de> for Ed25519PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Ed25519PublicKey(
            deserializer.deserialize_bytes(VisitorU8_32)?,
        ))
    }
}

/// Visitor for msgpack `bin` values that must be exactly 32 bytes.
struct VisitorU8_32;

impl<'de> Visitor<'de> for VisitorU8_32 {
    type Value = [u8; 32];

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a 32 byte array")
    }

    fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        TryInto::<Self::Value>::try_into(v)
            .map_err(|_| E::custom(format!("invalid byte array length: {}", v.len())))
    }
}

/// Visitor for msgpack `bin` values that must be exactly 64 bytes.
struct VisitorU8_64;

impl<'de> Visitor<'de> for VisitorU8_64 {
    type Value = [u8; 64];

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a 64 byte array")
    }

    fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        TryInto::<Self::Value>::try_into(v)
            .map_err(|_| E::custom(format!("invalid byte array length: {}", v.len())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_round_trip() {
        let s = "737777777777777777777777777777777777777777777777777UFEJ2CI";
        let addr = Address::from_string(s).expect("failed to decode an address from a string");
        assert_eq!(s, addr.encode_string());
    }

    #[test]
    fn address_decode_invalid_checksum() {
        let invalid_csum = "737777777777777777777777777777777777777777777777777UFEJ2CJ";
        assert!(Address::from_string(invalid_csum).is_err());
    }

    #[test]
    fn address_decode_rejects_wrong_length() {
        // valid base32 alphabet, but not 36 bytes once decoded.
        assert!(Address::from_string("AAAAAAAA").is_err());
    }

    #[test]
    fn free_functions_round_trip() {
        let bytes = [7u8; 32];
        let s = encode_address(bytes);
        assert_eq!(decode_address(&s).unwrap(), bytes);
    }
}
