//! Block selectors accepted by every block-scoped method.
//!
//! On the wire a selector is a hex quantity, one of the tags `latest`,
//! `pending`, `earliest`, `safe`, `finalized`, a 32-byte block hash, or the
//! EIP-1898 object `{ "blockNumber": .. }` / `{ "blockHash": .., "requireCanonical": .. }`.
//! `safe` and `finalized` collapse to [`BlockSelector::Latest`]: the node
//! finalizes instantly.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::B256;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BlockSelector {
    Number(u64),
    Hash(B256),
    #[default]
    Latest,
    Pending,
    Earliest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorParseError {
    InvalidQuantity(String),
    InvalidHash(String),
    UnknownTag(String),
    BothNumberAndHash,
    Empty,
}

impl fmt::Display for SelectorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidQuantity(raw) => write!(f, "invalid block number {raw:?}"),
            Self::InvalidHash(raw) => write!(f, "invalid block hash {raw:?}"),
            Self::UnknownTag(raw) => write!(f, "unknown block tag {raw:?}"),
            Self::BothNumberAndHash => f.write_str("cannot specify both blockHash and blockNumber"),
            Self::Empty => f.write_str("empty block selector"),
        }
    }
}

impl std::error::Error for SelectorParseError {}

impl BlockSelector {
    pub fn is_pending(&self) -> bool {
        matches!(self, BlockSelector::Pending)
    }
}

impl fmt::Display for BlockSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockSelector::Number(number) => write!(f, "{number:#x}"),
            BlockSelector::Hash(hash) => write!(f, "{hash}"),
            BlockSelector::Latest => f.write_str("latest"),
            BlockSelector::Pending => f.write_str("pending"),
            BlockSelector::Earliest => f.write_str("earliest"),
        }
    }
}

impl FromStr for BlockSelector {
    type Err = SelectorParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "" => Err(SelectorParseError::Empty),
            "latest" | "safe" | "finalized" => Ok(BlockSelector::Latest),
            "pending" => Ok(BlockSelector::Pending),
            "earliest" => Ok(BlockSelector::Earliest),
            hex if hex.len() == 66 && hex.starts_with("0x") => B256::from_str(hex)
                .map(BlockSelector::Hash)
                .map_err(|_| SelectorParseError::InvalidHash(hex.to_string())),
            hex if hex.starts_with("0x") => parse_quantity(hex).map(BlockSelector::Number),
            other => Err(SelectorParseError::UnknownTag(other.to_string())),
        }
    }
}

fn parse_quantity(raw: &str) -> Result<u64, SelectorParseError> {
    let digits = &raw[2..];
    if digits.is_empty() {
        return Err(SelectorParseError::InvalidQuantity(raw.to_string()));
    }
    u64::from_str_radix(digits, 16).map_err(|_| SelectorParseError::InvalidQuantity(raw.to_string()))
}

impl Serialize for BlockSelector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BlockSelector::Hash(hash) => {
                #[derive(Serialize)]
                #[serde(rename_all = "camelCase")]
                struct ByHash<'a> {
                    block_hash: &'a B256,
                }
                ByHash { block_hash: hash }.serialize(serializer)
            }
            other => serializer.collect_str(other),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSelector {
    Text(String),
    Object(SelectorObject),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SelectorObject {
    #[serde(default)]
    block_number: Option<String>,
    #[serde(default)]
    block_hash: Option<B256>,
    // Every stored block is canonical under instant finality.
    #[serde(default)]
    #[allow(dead_code)]
    require_canonical: bool,
}

impl<'de> Deserialize<'de> for BlockSelector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawSelector::deserialize(deserializer)?;
        let parsed = match raw {
            RawSelector::Text(text) => text.parse(),
            RawSelector::Object(object) => match (object.block_number, object.block_hash) {
                (Some(_), Some(_)) => Err(SelectorParseError::BothNumberAndHash),
                (Some(number), None) => number.parse(),
                (None, Some(hash)) => Ok(BlockSelector::Hash(hash)),
                (None, None) => Err(SelectorParseError::Empty),
            },
        };
        parsed.map_err(D::Error::custom)
    }
}
