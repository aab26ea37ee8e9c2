//! PartyRole - The four parties to a shipment

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when parsing roles
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoleError {
    #[error("Unknown party role: {0}")]
    UnknownRole(String),
}

/// A party's role in the shipment lifecycle.
///
/// Shippers tender freight, brokers arrange it, carriers haul it, and
/// drivers run the truck. Role determines which confirmations a party
/// participates in and which security levels apply to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyRole {
    Shipper,
    Broker,
    Carrier,
    Driver,
}

impl PartyRole {
    /// Returns the role as its canonical lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            PartyRole::Shipper => "shipper",
            PartyRole::Broker => "broker",
            PartyRole::Carrier => "carrier",
            PartyRole::Driver => "driver",
        }
    }

    /// All roles, in tender order
    pub const ALL: [PartyRole; 4] = [
        PartyRole::Shipper,
        PartyRole::Broker,
        PartyRole::Carrier,
        PartyRole::Driver,
    ];
}

impl fmt::Display for PartyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PartyRole {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "shipper" => Ok(PartyRole::Shipper),
            "broker" => Ok(PartyRole::Broker),
            "carrier" => Ok(PartyRole::Carrier),
            "driver" => Ok(PartyRole::Driver),
            other => Err(RoleError::UnknownRole(other.to_string())),
        }
    }
}
