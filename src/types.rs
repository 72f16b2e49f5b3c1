//! Shared types for MundoFi Core
//!
//! All data structures that cross module boundaries are defined here
//! for consistent serialization and FFI compatibility.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

// =============================================================================
// Network Types
// =============================================================================

/// Chains a savings wallet can live on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    BaseSepolia,
    Base,
    Ethereum,
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::BaseSepolia => 84532,
            Network::Base => 8453,
            Network::Ethereum => 1,
        }
    }

    pub fn from_chain_id(id: u64) -> Option<Self> {
        match id {
            84532 => Some(Network::BaseSepolia),
            8453 => Some(Network::Base),
            1 => Some(Network::Ethereum),
            _ => None,
        }
    }

    pub fn is_testnet(&self) -> bool {
        matches!(self, Network::BaseSepolia)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::BaseSepolia => "base-sepolia",
            Network::Base => "base",
            Network::Ethereum => "ethereum",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "base-sepolia" | "sepolia" => Ok(Network::BaseSepolia),
            "base" => Ok(Network::Base),
            "ethereum" | "eth" | "mainnet" => Ok(Network::Ethereum),
            _ => Err(format!("Unknown network: {}", s)),
        }
    }
}

// =============================================================================
// Catalog Types
// =============================================================================

/// Selectable funding wallet (read-only catalog entry)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletRef {
    pub id: String,
    pub name: String,
    pub balance: f64,
    pub currency: String,
}

impl WalletRef {
    pub fn new(id: &str, name: &str, balance: f64, currency: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            balance,
            currency: currency.to_string(),
        }
    }
}

/// Crypto asset a goal can be denominated in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoAsset {
    pub symbol: String,
    pub name: String,
    pub icon: String,
    /// Indicative USD price (static, not fetched)
    pub price: f64,
}

impl CryptoAsset {
    pub fn new(symbol: &str, name: &str, icon: &str, price: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
            price,
        }
    }
}

// =============================================================================
// Goal Types
// =============================================================================

/// Snapshot of a savings goal handed to the fund-transfer wizard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalRef {
    pub id: String,
    pub title: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub percentage: f64,
    pub crypto_type: String,
    pub crypto_icon: String,
}

// =============================================================================
// Wallet Record
// =============================================================================

/// Wallet emitted by the creation and connection wizards
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRecord {
    pub name: String,
    pub address: String,
    pub network: Network,
    pub created_at: DateTime<Utc>,
    /// Collected PIN; wiped on drop and never persisted
    #[serde(skip)]
    pub pin: Zeroizing<String>,
    /// Dashboard shows a one-time celebration while this is set
    #[serde(default)]
    pub just_created: bool,
}

impl WalletRecord {
    /// Clear the one-time celebration flag once the dashboard has shown it
    pub fn acknowledge_celebration(&mut self) {
        self.just_created = false;
    }

    pub fn has_pin(&self) -> bool {
        !self.pin.is_empty()
    }
}

impl fmt::Debug for WalletRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletRecord")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("network", &self.network)
            .field("created_at", &self.created_at)
            .field("pin", &"******")
            .field("just_created", &self.just_created)
            .finish()
    }
}

/// Authenticated embedded-wallet user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUser {
    pub user_id: String,
    pub email: Option<String>,
    pub evm_accounts: Vec<EvmAccount>,
    pub is_new_user: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvmAccount {
    pub address: String,
    pub network: Network,
}

// =============================================================================
// API Response Wrapper
// =============================================================================

/// Envelope for every JSON answer crossing the FFI boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<crate::error::MundoError>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: crate::error::MundoError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"success":false,"error":{"code":"internal","message":"Serialization failed"}}"#.to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_properties() {
        assert_eq!(Network::BaseSepolia.chain_id(), 84532);
        assert_eq!(Network::from_chain_id(84532), Some(Network::BaseSepolia));
        assert_eq!(Network::from_chain_id(5), None);
        assert!(Network::BaseSepolia.is_testnet());
        assert!(!Network::Base.is_testnet());
        assert_eq!("base_sepolia".parse::<Network>(), Ok(Network::BaseSepolia));
    }

    #[test]
    fn test_network_serializes_kebab_case() {
        let json = serde_json::to_string(&Network::BaseSepolia).unwrap();
        assert_eq!(json, "\"base-sepolia\"");
    }

    #[test]
    fn test_wallet_record_never_serializes_pin() {
        let record = WalletRecord {
            name: "Rainy day".to_string(),
            address: "0x742d35Cc6639C0532fEb42da5b5e6a01E4E8e2E7".to_string(),
            network: Network::BaseSepolia,
            created_at: Utc::now(),
            pin: Zeroizing::new("123456".to_string()),
            just_created: true,
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("123456"));
        assert!(json.contains("justCreated"));
        assert!(!format!("{:?}", record).contains("123456"));

        let restored: WalletRecord = serde_json::from_str(&json).unwrap();
        assert!(!restored.has_pin());
        assert_eq!(restored.address, record.address);
    }

    #[test]
    fn test_api_response_serialization() {
        let response = ApiResponse::ok("test_data".to_string());
        let json = response.to_json();
        assert!(json.contains("success"));
        assert!(json.contains("test_data"));
    }
}
