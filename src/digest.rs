// src/digest.rs

//! Fixed-size digests and their textual encodings
//!
//! A [`Digest`] is a raw cryptographic fingerprint tagged with its
//! algorithm. This module never hashes anything itself; digests come from
//! the store's own hasher (see `store::TreeHasher`) or from user input.
//! What lives here is the codec:
//!
//! - **base-16**: plain lowercase hex, natural byte order.
//! - **base-32**: the store backend's custom alphabet and reversed
//!   traversal order. This is *not* RFC 4648: the digest is treated as one
//!   little-endian bit string and symbols are emitted from the
//!   most-significant quintet down, so the last character holds the lowest
//!   five bits of byte zero. The format is externally fixed; both loops
//!   below must stay bit-exact inverses of each other or store paths stop
//!   matching already-registered content.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// The 32-symbol store alphabet. Omits `e`, `o`, `u`, `t` to avoid
/// accidental offensive substrings and ambiguous glyphs.
pub const BASE32_ALPHABET: &[u8; 32] = b"0123456789abcdfghijklmnpqrsvwxyz";

/// Digest algorithm selection
///
/// A closed set: the store backend only understands these three kinds
/// for fixed-output content addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashKind {
    /// MD5 (128-bit, legacy)
    Md5,
    /// SHA-1 (160-bit, legacy)
    Sha1,
    /// SHA-256 (256-bit)
    #[default]
    Sha256,
}

impl HashKind {
    /// Raw digest length in bytes
    #[inline]
    pub const fn digest_len(&self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha256 => 32,
        }
    }

    /// Length of the hex encoding
    #[inline]
    pub const fn hex_len(&self) -> usize {
        self.digest_len() * 2
    }

    /// Length of the base-32 encoding: one symbol per started quintet
    #[inline]
    pub const fn base32_len(&self) -> usize {
        (self.digest_len() * 8 - 1) / 5 + 1
    }

    /// Algorithm name as the store backend spells it
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for HashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for HashKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha1" | "sha-1" => Ok(Self::Sha1),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            _ => Err(Error::UnknownHashKind(s.to_string())),
        }
    }
}

/// A digest value with its algorithm
///
/// `bytes.len() == kind.digest_len()` always holds; every constructor
/// validates it, so the invariant cannot be broken later.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    kind: HashKind,
    bytes: Vec<u8>,
}

impl Digest {
    /// Create a digest from raw bytes, validating the length for `kind`
    pub fn from_bytes(kind: HashKind, bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() != kind.digest_len() {
            return Err(Error::MalformedDigest(format!(
                "{} digest must be {} bytes, got {}",
                kind,
                kind.digest_len(),
                bytes.len()
            )));
        }
        Ok(Self { kind, bytes })
    }

    /// The digest's algorithm
    #[inline]
    pub fn kind(&self) -> HashKind {
        self.kind
    }

    /// The raw digest bytes
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Encode as lowercase hex, natural byte order
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Decode a hex string into a digest of the given kind
    pub fn from_hex(kind: HashKind, s: &str) -> Result<Self> {
        if s.len() != kind.hex_len() {
            return Err(Error::MalformedDigest(format!(
                "hex {} digest must be {} characters, got {}",
                kind,
                kind.hex_len(),
                s.len()
            )));
        }
        let bytes = hex::decode(s)
            .map_err(|_| Error::MalformedDigest(format!("invalid hex in digest: {s}")))?;
        Self::from_bytes(kind, bytes)
    }

    /// Encode in the store's base-32 format
    ///
    /// Symbols are emitted for quintet index `n = base32_len-1` down to 0;
    /// quintet `n` covers bits `n*5 .. n*5+5` of the little-endian bit
    /// string, split across a byte boundary when `n*5 % 8 > 3`.
    pub fn to_base32(&self) -> String {
        let size = self.bytes.len();
        let mut out = String::with_capacity(self.kind.base32_len());
        for n in (0..self.kind.base32_len()).rev() {
            let b = n * 5;
            let i = b / 8;
            let j = b % 8;
            let mut c = (self.bytes[i] >> j) as u16;
            if i + 1 < size {
                c |= (self.bytes[i + 1] as u16) << (8 - j);
            }
            out.push(BASE32_ALPHABET[(c & 0x1f) as usize] as char);
        }
        out
    }

    /// Decode the store's base-32 format into a digest of the given kind
    ///
    /// The exact inverse bit-scatter of [`Digest::to_base32`]: the same
    /// index traversal, OR-ing each 5-bit value into one or two bytes.
    pub fn from_base32(kind: HashKind, s: &str) -> Result<Self> {
        let len = kind.base32_len();
        if s.len() != len {
            return Err(Error::MalformedDigest(format!(
                "base-32 {} digest must be {} characters, got {}",
                kind,
                len,
                s.len()
            )));
        }
        let size = kind.digest_len();
        let mut bytes = vec![0u8; size];
        let chars = s.as_bytes();
        for n in 0..len {
            let c = chars[len - 1 - n];
            let digit = BASE32_ALPHABET
                .iter()
                .position(|&a| a == c)
                .ok_or_else(|| {
                    Error::MalformedDigest(format!("invalid base-32 digest: {s}"))
                })? as u16;
            let b = n * 5;
            let i = b / 8;
            let j = b % 8;
            let v = digit << j;
            bytes[i] |= v as u8;
            if i + 1 < size {
                bytes[i + 1] |= (v >> 8) as u8;
            }
        }
        Self::from_bytes(kind, bytes)
    }

    /// Parse a digest string, optionally prefixed with its kind
    /// (e.g. `"sha256:1rzqw..."`)
    ///
    /// An unprefixed string is decoded as `default_kind`. Hex and base-32
    /// are told apart by length; the two encodings never share a length
    /// for any kind.
    pub fn parse_prefixed(s: &str, default_kind: HashKind) -> Result<Self> {
        let (kind, value) = match s.split_once(':') {
            Some((prefix, rest)) => (prefix.parse()?, rest),
            None => (default_kind, s),
        };
        if value.len() == kind.hex_len() {
            Self::from_hex(kind, value)
        } else if value.len() == kind.base32_len() {
            Self::from_base32(kind, value)
        } else {
            Err(Error::MalformedDigest(format!(
                "{} digest must be {} (hex) or {} (base-32) characters, got {}",
                kind,
                kind.hex_len(),
                kind.base32_len(),
                value.len()
            )))
        }
    }

    /// Format as a kind-prefixed base-32 string (e.g. `"sha256:1rzqw..."`)
    pub fn to_prefixed_string(&self) -> String {
        format!("{}:{}", self.kind.name(), self.to_base32())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base32())
    }
}
