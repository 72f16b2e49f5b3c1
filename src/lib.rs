//! MundoFi Core Library
//!
//! Rust backend for the MundoFi savings app.
//!
//! # Architecture
//!
//! This crate provides:
//! - **wizard**: Transfer, wallet-creation and wallet-connection state machines
//! - **providers**: Wallet capability providers (mock and remote)
//! - **session**: Signed-in user and active wallet, persisted across restarts
//! - **goals**: Savings goal book and create-goal validation
//! - **trust**: Trust score summary
//! - **activity**: Activity feed search, filters and day grouping
//! - **config**: Presets, JSON settings and environment overrides
//! - **ffi**: C-ABI exports for the mobile shell
//!
//! # FFI Usage
//!
//! All public FFI functions are in the `ffi` module and follow this pattern:
//! - Input: JSON string (null-terminated C string)
//! - Output: JSON string (must be freed with `mundofi_free_string`)
//!
//! # Security
//!
//! PINs and one-time codes are held in `zeroize` buffers, are never
//! serialized and are redacted from logs.
//!
//! # Example
//!
//! ```rust,ignore
//! use mundofi_core::{providers::build_provider, wizard::CreateWalletWizard, AppConfig};
//!
//! let config = AppConfig::demo();
//! let mut wizard = CreateWalletWizard::new(&config, build_provider(&config)?);
//! wizard.open();
//! wizard.submit_email("ana@example.com").await?;
//! wizard.submit_otp("123456").await?;
//! wizard.submit_name("Rainy day")?;
//! let wallet = wizard.submit_pin("482913").await?;
//! println!("Wallet address: {}", wallet.address);
//! ```

pub mod activity;
pub mod config;
pub mod error;
pub mod ffi;
pub mod goals;
pub mod providers;
pub mod session;
pub mod trust;
pub mod types;
pub mod utils;
pub mod wizard;

// Re-export key types for convenience
pub use config::AppConfig;
pub use error::{ErrorCode, MundoError, MundoResult};
pub use types::*;

pub use wizard::{FlowError, Outcome, WizardKind, WizardSnapshot};

pub use ffi::{
    mundofi_activity_feed,
    mundofi_configure,
    mundofi_format_amount,
    mundofi_free_string,
    mundofi_trust_summary,
    mundofi_validate_goal,
    mundofi_wizard_close,
    mundofi_wizard_dispatch,
    mundofi_wizard_open,
    mundofi_wizard_release,
    mundofi_wizard_snapshot,
};
