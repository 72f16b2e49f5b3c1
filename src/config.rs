//! Application Configuration
//!
//! Centralized configuration for the MundoFi core with:
//! - Profile presets (standard, demo)
//! - Static catalogs (preset amounts, funding wallets, assets)
//! - Wallet provider selection (chosen once, never re-detected)
//! - JSON loading and environment overrides
//! - Validation of settings

use crate::error::{MundoError, MundoResult};
use crate::types::{CryptoAsset, Network, WalletRef};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Address used when the embedded wallet cannot report its own address
pub const DEMO_FALLBACK_ADDRESS: &str = "0x742d35Cc6639C0532fEb42da5b5e6a01E4E8e2E7";

/// Code accepted without a provider round-trip when demo mode is on
pub const DEMO_BYPASS_CODE: &str = "123456";

pub const DEFAULT_API_BASE: &str = "https://api.cdp.coinbase.com";

/// Configuration profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigProfile {
    /// Real provider, no shortcuts
    Standard,
    /// Mock provider and demo bypass code, for store review and device testing
    Demo,
    /// Any manual change from a preset
    Custom,
}

/// Which wallet capability provider to build at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Mock,
    Remote,
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mock" => Ok(ProviderKind::Mock),
            "remote" | "cdp" => Ok(ProviderKind::Remote),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// Delays the mock provider waits before answering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedLatency {
    pub send_code_ms: u64,
    pub verify_code_ms: u64,
    pub connect_ms: u64,
    #[serde(default)]
    pub resolve_address_ms: u64,
}

impl SimulatedLatency {
    pub fn instant() -> Self {
        Self {
            send_code_ms: 0,
            verify_code_ms: 0,
            connect_ms: 0,
            resolve_address_ms: 0,
        }
    }

    pub fn send_code(&self) -> Duration {
        Duration::from_millis(self.send_code_ms)
    }

    pub fn verify_code(&self) -> Duration {
        Duration::from_millis(self.verify_code_ms)
    }

    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }

    pub fn resolve_address(&self) -> Duration {
        Duration::from_millis(self.resolve_address_ms)
    }
}

impl Default for SimulatedLatency {
    fn default() -> Self {
        Self {
            send_code_ms: 1_000,
            verify_code_ms: 1_000,
            connect_ms: 2_000,
            resolve_address_ms: 0,
        }
    }
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Preset this configuration started from
    pub profile: ConfigProfile,

    // Provider settings
    /// Wallet capability provider implementation
    pub provider: ProviderKind,
    /// Base URL of the remote wallet API
    pub api_base_url: String,
    /// Project identifier sent to the remote wallet API
    pub project_id: Option<String>,
    /// Mock provider delays
    pub latency: SimulatedLatency,

    // Demo settings
    /// Enables the OTP bypass code; never on outside the demo profile
    pub demo_mode: bool,
    pub demo_bypass_code: String,
    /// Address used when the provider cannot resolve the user's own address
    pub fallback_address: String,

    // Wallet settings
    /// Network recorded for newly provisioned embedded wallets
    pub provisioned_network: Network,
    /// Network recorded for externally connected wallets
    pub connected_network: Network,

    // Catalogs
    pub preset_amounts: Vec<f64>,
    pub wallet_catalog: Vec<WalletRef>,
    pub asset_catalog: Vec<CryptoAsset>,

    // Persistence
    /// Where the session snapshot is stored; in-memory when unset
    pub session_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl AppConfig {
    /// Standard preset
    pub fn standard() -> Self {
        Self {
            profile: ConfigProfile::Standard,

            provider: ProviderKind::Remote,
            api_base_url: DEFAULT_API_BASE.to_string(),
            project_id: None,
            latency: SimulatedLatency::default(),

            demo_mode: false,
            demo_bypass_code: DEMO_BYPASS_CODE.to_string(),
            fallback_address: DEMO_FALLBACK_ADDRESS.to_string(),

            provisioned_network: Network::BaseSepolia,
            connected_network: Network::BaseSepolia,

            preset_amounts: vec![10.0, 25.0, 50.0, 100.0, 200.0],
            wallet_catalog: default_wallet_catalog(),
            asset_catalog: default_asset_catalog(),

            session_file: None,
        }
    }

    /// Demo preset
    pub fn demo() -> Self {
        Self {
            profile: ConfigProfile::Demo,
            provider: ProviderKind::Mock,
            demo_mode: true,
            ..Self::standard()
        }
    }

    /// Same settings with the mock delays removed (tests, CLI scripting)
    pub fn with_instant_latency(mut self) -> Self {
        self.latency = SimulatedLatency::instant();
        self
    }

    /// Parse a JSON configuration; missing fields take standard values
    pub fn from_json_str(json: &str) -> MundoResult<Self> {
        let mut config: AppConfig = serde_json::from_str(json)?;
        config.ensure_valid()?;
        config.profile = ConfigProfile::Custom;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> MundoResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            MundoError::config_error(format!(
                "Cannot read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_json_str(&raw)
    }

    /// Apply `MUNDOFI_*` environment overrides
    pub fn apply_env_overrides(&mut self) -> MundoResult<()> {
        if let Ok(provider) = std::env::var("MUNDOFI_PROVIDER") {
            self.provider = provider.parse().map_err(MundoError::config_error)?;
            self.profile = ConfigProfile::Custom;
        }
        if let Ok(base) = std::env::var("MUNDOFI_API_BASE") {
            self.api_base_url = base;
            self.profile = ConfigProfile::Custom;
        }
        if let Ok(flag) = std::env::var("MUNDOFI_DEMO_MODE") {
            self.demo_mode = matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes");
            self.profile = ConfigProfile::Custom;
        }
        self.ensure_valid()
    }

    pub fn find_wallet(&self, wallet_id: &str) -> Option<&WalletRef> {
        self.wallet_catalog.iter().find(|w| w.id == wallet_id)
    }

    pub fn find_asset(&self, symbol: &str) -> Option<&CryptoAsset> {
        self.asset_catalog
            .iter()
            .find(|a| a.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn is_preset_amount(&self, amount: f64) -> bool {
        self.preset_amounts.iter().any(|p| (*p - amount).abs() < f64::EPSILON)
    }

    /// Validate settings consistency
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.demo_mode && self.provider == ProviderKind::Remote {
            warnings.push(
                "Warning: Demo bypass code enabled against a real provider".to_string()
            );
        }

        if self.provider == ProviderKind::Mock && self.profile == ConfigProfile::Standard {
            warnings.push(
                "Warning: Standard profile is using the mock wallet provider".to_string()
            );
        }

        if self.provider == ProviderKind::Remote && self.project_id.is_none() {
            warnings.push(
                "Warning: Remote provider configured without a project id".to_string()
            );
        }

        if self.session_file.is_none() {
            warnings.push(
                "Warning: Session will not survive an app restart (no session file)".to_string()
            );
        }

        warnings
    }

    /// Hard errors that make the configuration unusable
    pub fn ensure_valid(&self) -> MundoResult<()> {
        if self.preset_amounts.is_empty() {
            return Err(MundoError::config_error("At least one preset amount is required"));
        }
        if self.preset_amounts.iter().any(|a| !a.is_finite() || *a <= 0.0) {
            return Err(MundoError::config_error("Preset amounts must be positive"));
        }
        if self.wallet_catalog.is_empty() {
            return Err(MundoError::config_error("Wallet catalog cannot be empty"));
        }
        if !is_evm_address(&self.fallback_address) {
            return Err(MundoError::config_error(format!(
                "Fallback address is not a valid EVM address: {}",
                self.fallback_address
            )));
        }
        if self.demo_mode
            && (self.demo_bypass_code.len() != 6
                || !self.demo_bypass_code.chars().all(|c| c.is_ascii_digit()))
        {
            return Err(MundoError::config_error("Demo bypass code must be 6 digits"));
        }
        if self.provider == ProviderKind::Remote {
            let url = Url::parse(&self.api_base_url)?;
            if url.scheme() != "https" {
                return Err(MundoError::config_error("Remote provider requires an https base URL"));
            }
        }
        Ok(())
    }
}

/// `0x` followed by 40 hex digits
pub fn is_evm_address(address: &str) -> bool {
    match address.strip_prefix("0x") {
        Some(body) => body.len() == 40 && hex::decode(body).is_ok(),
        None => false,
    }
}

fn default_wallet_catalog() -> Vec<WalletRef> {
    vec![
        WalletRef::new("1", "Main Wallet", 1250.50, "USDC"),
        WalletRef::new("2", "Trading Wallet", 0.045, "BTC"),
        WalletRef::new("3", "Savings Wallet", 2.5, "ETH"),
    ]
}

fn default_asset_catalog() -> Vec<CryptoAsset> {
    vec![
        CryptoAsset::new("BTC", "Bitcoin", "₿", 36287.00),
        CryptoAsset::new("USDC", "USD Coin", "$", 1.00),
        CryptoAsset::new("ETH", "Ethereum", "Ξ", 2045.67),
        CryptoAsset::new("SOL", "Solana", "◎", 167.03),
    ]
}
