use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{DateKey, ValidationError};

/// Protocol grouping shown next to the display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolCategory {
    L1,
    Dex,
    Lending,
    XChain,
    Other,
}

impl ProtocolCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::L1 => "l1",
            Self::Dex => "dex",
            Self::Lending => "lending",
            Self::XChain => "xchain",
            Self::Other => "other",
        }
    }
}

impl Display for ProtocolCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtocolCategory {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "l1" => Ok(Self::L1),
            "dex" => Ok(Self::Dex),
            "lending" => Ok(Self::Lending),
            "xchain" => Ok(Self::XChain),
            "other" => Ok(Self::Other),
            other => Err(ValidationError::InvalidCategory {
                value: other.to_owned(),
            }),
        }
    }
}

/// Descriptive metadata attached to a registered protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolMetadata {
    pub name: String,
    pub category: ProtocolCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Where the fee figure comes from (subgraph or API page).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockchain: Option<String>,
}

impl ProtocolMetadata {
    pub fn new(name: impl Into<String>, category: ProtocolCategory) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyDisplayName);
        }

        Ok(Self {
            name,
            category,
            description: None,
            website: None,
            source: None,
            token: None,
            blockchain: None,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_blockchain(mut self, blockchain: impl Into<String>) -> Self {
        self.blockchain = Some(blockchain.into());
        self
    }
}

/// USD fees attributed to one protocol on one UTC day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFeeRecord")]
pub struct FeeRecord {
    pub date: DateKey,
    pub fee: f64,
}

impl FeeRecord {
    pub fn new(date: DateKey, fee: f64) -> Result<Self, ValidationError> {
        validate_non_negative("fee", fee)?;
        Ok(Self { date, fee })
    }
}

#[derive(Deserialize)]
struct RawFeeRecord {
    date: DateKey,
    fee: f64,
}

impl TryFrom<RawFeeRecord> for FeeRecord {
    type Error = ValidationError;

    fn try_from(value: RawFeeRecord) -> Result<Self, Self::Error> {
        Self::new(value.date, value.fee)
    }
}

/// One chart point: UTC midnight timestamp with primary and secondary values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub timestamp: i64,
    pub primary: f64,
    pub secondary: f64,
}

pub(crate) fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
