//! Naming and PIN setup shared by the wallet-creation and wallet-connection
//! wizards, plus the input rules both of them apply.

use super::keypad::CODE_LENGTH;
use super::FlowError;
use crate::types::{Network, WalletRecord};
use chrono::Utc;
use zeroize::Zeroizing;

pub const MAX_WALLET_NAME_LEN: usize = 30;
pub const PIN_LENGTH: usize = CODE_LENGTH;

pub(crate) const MSG_INVALID_EMAIL: &str = "Please enter a valid email address";
pub(crate) const MSG_INVALID_OTP: &str = "Please enter the 6-digit verification code";
pub(crate) const MSG_MISSING_NAME: &str = "Please enter a name for your wallet";
pub(crate) const MSG_NAME_TOO_LONG: &str = "Wallet name must be 30 characters or fewer";
pub(crate) const MSG_INVALID_PIN: &str = "Please enter a 6-digit PIN";

/// Trimmed email; must be non-empty and contain '@'
pub fn validate_email(email: &str) -> Result<String, FlowError> {
    let trimmed = email.trim();
    if trimmed.is_empty() || !trimmed.contains('@') {
        return Err(FlowError::Validation(MSG_INVALID_EMAIL.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Trimmed wallet name, 1 to 30 characters
pub fn validate_wallet_name(name: &str) -> Result<String, FlowError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(FlowError::Validation(MSG_MISSING_NAME.to_string()));
    }
    if trimmed.chars().count() > MAX_WALLET_NAME_LEN {
        return Err(FlowError::Validation(MSG_NAME_TOO_LONG.to_string()));
    }
    Ok(trimmed.to_string())
}

pub fn is_six_digits(value: &str) -> bool {
    value.len() == CODE_LENGTH && value.bytes().all(|b| b.is_ascii_digit())
}

pub fn validate_otp(code: &str) -> Result<Zeroizing<String>, FlowError> {
    if !is_six_digits(code) {
        return Err(FlowError::Validation(MSG_INVALID_OTP.to_string()));
    }
    Ok(Zeroizing::new(code.to_string()))
}

pub fn validate_pin(pin: &str) -> Result<Zeroizing<String>, FlowError> {
    if !is_six_digits(pin) {
        return Err(FlowError::Validation(MSG_INVALID_PIN.to_string()));
    }
    Ok(Zeroizing::new(pin.to_string()))
}

/// Steps every wallet wizard ends with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStage {
    Naming,
    PinSetup,
}

/// Naming → PinSetup tail of a wallet wizard
///
/// Holds the validated name until the PIN arrives; the address and network
/// come from whichever wizard owns it.
#[derive(Debug, Clone, Default)]
pub struct WalletSetup {
    wallet_name: String,
    named: bool,
}

impl WalletSetup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> SetupStage {
        if self.named {
            SetupStage::PinSetup
        } else {
            SetupStage::Naming
        }
    }

    /// Name as last submitted (kept when stepping back to Naming)
    pub fn wallet_name(&self) -> &str {
        &self.wallet_name
    }

    pub fn submit_name(&mut self, name: &str) -> Result<(), FlowError> {
        let name = validate_wallet_name(name)?;
        self.wallet_name = name;
        self.named = true;
        Ok(())
    }

    /// PinSetup → Naming
    pub fn back_to_naming(&mut self) {
        self.named = false;
    }

    /// Validate the PIN and build the wallet record
    pub fn finish(&self, pin: &str, address: String, network: Network) -> Result<WalletRecord, FlowError> {
        if !self.named {
            return Err(FlowError::transition(SetupStage::Naming, "submit_pin"));
        }
        let pin = validate_pin(pin)?;

        Ok(WalletRecord {
            name: self.wallet_name.clone(),
            address,
            network,
            created_at: Utc::now(),
            pin,
            just_created: true,
        })
    }
}
