//! Wallet-Creation Wizard
//!
//! Provisions an embedded wallet for an email identity:
//! email → one-time code → wallet name → 6-digit PIN.
//!
//! Email delivery and code verification go through the injected
//! [`WalletProvider`]. The demo bypass code skips verification only when the
//! configuration enables demo mode.

use super::CancelToken;
use super::setup::{validate_email, validate_otp, validate_pin, WalletSetup};
use super::{operation_failure, unless_cancelled, FlowError, FlowStatus, Navigation, WizardKind, WizardSnapshot};
use crate::config::{is_evm_address, AppConfig};
use crate::error::{MundoError, MundoResult};
use crate::providers::WalletProvider;
use crate::types::{Network, WalletRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;

const MODULE: &str = "wizard::create_wallet";

const MSG_SEND_FAILED: &str = "Failed to send verification email. Please try again.";

pub const NAME_SUGGESTIONS: [&str; 3] = ["Emergency fund", "Travel fund", "My savings"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateWalletStep {
    EmailEntry,
    OtpVerification,
    Naming,
    PinSetup,
}

pub struct CreateWalletWizard {
    provider: Arc<dyn WalletProvider>,
    /// Present only when demo mode is on
    demo_bypass_code: Option<String>,
    fallback_address: String,
    network: Network,

    open: bool,
    step: CreateWalletStep,
    email: String,
    setup: WalletSetup,
    status: FlowStatus,
    cancel: CancelToken,
}

impl CreateWalletWizard {
    pub fn new(config: &AppConfig, provider: Arc<dyn WalletProvider>) -> Self {
        Self {
            provider,
            demo_bypass_code: config.demo_mode.then(|| config.demo_bypass_code.clone()),
            fallback_address: config.fallback_address.clone(),
            network: config.provisioned_network,
            open: false,
            step: CreateWalletStep::EmailEntry,
            email: String::new(),
            setup: WalletSetup::new(),
            status: FlowStatus::default(),
            cancel: CancelToken::new(),
        }
    }

    pub fn open(&mut self) {
        self.reset();
        self.open = true;
        crate::log_debug!(MODULE, "Create wallet wizard opened", provider = self.provider.name());
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn current_step(&self) -> CreateWalletStep {
        self.step
    }

    pub fn status(&self) -> &FlowStatus {
        &self.status
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn wallet_name(&self) -> &str {
        self.setup.wallet_name()
    }

    /// Token for the request currently in flight; cancelling it closes the wizard
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    // =========================================================================
    // Steps
    // =========================================================================

    pub async fn submit_email(&mut self, email: &str) -> MundoResult<()> {
        self.expect_step(CreateWalletStep::EmailEntry, "submit_email")?;

        let email = validate_email(email).map_err(|e| self.status.fail(e))?;
        self.email = email;
        self.status.begin_loading()?;

        let token = self.cancel.clone();
        let result = match unless_cancelled(&token, self.provider.send_verification_code(&self.email, &token)).await {
            Some(result) if !token.is_cancelled() => result,
            _ => return Err(self.discard_late_result()),
        };

        match result {
            Ok(()) => {
                crate::log_info!(MODULE, "Verification code sent", email = self.email);
                self.advance(CreateWalletStep::OtpVerification);
                Ok(())
            }
            Err(e) => {
                crate::log_warn!(MODULE, "Sending verification code failed", reason = e.message);
                Err(self.status.fail(operation_failure(&e, MSG_SEND_FAILED)).into())
            }
        }
    }

    pub async fn submit_otp(&mut self, code: &str) -> MundoResult<()> {
        self.expect_step(CreateWalletStep::OtpVerification, "submit_otp")?;

        let code = validate_otp(code.trim()).map_err(|e| self.status.fail(e))?;

        if self.is_bypass_code(&code) {
            crate::log_warn!(MODULE, "Demo bypass code accepted", email = self.email);
            self.advance(CreateWalletStep::Naming);
            return Ok(());
        }

        self.status.begin_loading()?;

        let token = self.cancel.clone();
        let result = match unless_cancelled(&token, self.provider.verify_code(&self.email, &code, &token)).await {
            Some(result) if !token.is_cancelled() => result,
            _ => return Err(self.discard_late_result()),
        };

        match result {
            Ok(()) => {
                crate::log_info!(MODULE, "Email verified", email = self.email);
                self.advance(CreateWalletStep::Naming);
                Ok(())
            }
            Err(e) => {
                crate::log_warn!(MODULE, "Code verification failed", reason = e.message);
                let message = self.invalid_code_message();
                Err(self.status.fail(operation_failure(&e, &message)).into())
            }
        }
    }

    pub fn submit_name(&mut self, name: &str) -> MundoResult<()> {
        self.expect_step(CreateWalletStep::Naming, "submit_name")?;
        self.setup.submit_name(name).map_err(|e| self.status.fail(e))?;
        self.advance(CreateWalletStep::PinSetup);
        Ok(())
    }

    /// Final step: resolves the wallet address and emits the record
    pub async fn submit_pin(&mut self, pin: &str) -> MundoResult<WalletRecord> {
        self.expect_step(CreateWalletStep::PinSetup, "submit_pin")?;

        validate_pin(pin).map_err(|e| self.status.fail(e))?;
        self.status.begin_loading()?;

        let token = self.cancel.clone();
        let resolved = match unless_cancelled(&token, self.provider.resolve_own_address(&token)).await {
            Some(resolved) if !token.is_cancelled() => resolved,
            _ => return Err(self.discard_late_result()),
        };

        let address = match resolved {
            Ok(Some(address)) if is_evm_address(&address) => address,
            Ok(_) => self.fallback_address.clone(),
            Err(e) => {
                crate::log_warn!(MODULE, "Address lookup failed, using fallback", reason = e.message);
                self.fallback_address.clone()
            }
        };

        let record = self
            .setup
            .finish(pin, address, self.network)
            .map_err(|e| self.status.fail(e))?;

        crate::log_info!(
            MODULE,
            "Wallet created",
            name = record.name,
            address = record.address,
            network = record.network,
        );

        self.reset();
        Ok(record)
    }

    pub fn back(&mut self) -> MundoResult<Navigation<CreateWalletStep>> {
        if !self.open {
            return Err(FlowError::Closed.into());
        }

        let previous = match self.step {
            CreateWalletStep::EmailEntry => {
                self.close();
                return Ok(Navigation::Exited);
            }
            CreateWalletStep::OtpVerification => CreateWalletStep::EmailEntry,
            CreateWalletStep::Naming => CreateWalletStep::OtpVerification,
            CreateWalletStep::PinSetup => {
                self.setup.back_to_naming();
                CreateWalletStep::Naming
            }
        };

        self.status.clear();
        self.step = previous;
        Ok(Navigation::MovedTo(previous))
    }

    /// Dismiss from any step; an in-flight request is cancelled
    pub fn close(&mut self) -> bool {
        let was_open = self.open;
        self.reset();
        was_open
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        WizardSnapshot {
            kind: WizardKind::CreateWallet,
            is_open: self.open,
            step: step_name(self.step).to_string(),
            error: self.status.error.clone(),
            is_loading: self.status.is_loading,
            fields: serde_json::json!({
                "email": self.email,
                "walletName": self.setup.wallet_name(),
                "nameSuggestions": NAME_SUGGESTIONS,
                "network": self.network,
            }),
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn is_bypass_code(&self, code: &str) -> bool {
        match &self.demo_bypass_code {
            Some(bypass) => bool::from(code.as_bytes().ct_eq(bypass.as_bytes())),
            None => false,
        }
    }

    fn invalid_code_message(&self) -> String {
        match &self.demo_bypass_code {
            Some(bypass) => format!(
                "Invalid verification code. For demo purposes, use code: {}",
                bypass
            ),
            None => "Invalid verification code. Please try again.".to_string(),
        }
    }

    fn expect_step(&self, step: CreateWalletStep, action: &'static str) -> Result<(), FlowError> {
        if !self.open {
            return Err(FlowError::Closed);
        }
        if self.step != step {
            return Err(FlowError::transition(self.step, action));
        }
        Ok(())
    }

    fn advance(&mut self, next: CreateWalletStep) {
        crate::log_debug!(MODULE, "Step change", from = step_name(self.step), to = step_name(next));
        self.status.clear();
        self.step = next;
    }

    fn discard_late_result(&mut self) -> MundoError {
        crate::log_debug!(MODULE, "Dropping result that arrived after close");
        self.reset();
        FlowError::Cancelled.into()
    }

    fn reset(&mut self) {
        self.cancel.cancel();
        self.cancel = CancelToken::new();
        self.open = false;
        self.step = CreateWalletStep::EmailEntry;
        self.email.clear();
        self.setup = WalletSetup::new();
        self.status.clear();
    }
}

pub(crate) fn step_name(step: CreateWalletStep) -> &'static str {
    match step {
        CreateWalletStep::EmailEntry => "email_entry",
        CreateWalletStep::OtpVerification => "otp_verification",
        CreateWalletStep::Naming => "naming",
        CreateWalletStep::PinSetup => "pin_setup",
    }
}
