//! Multi-step Wizards
//!
//! Finite state machines behind the app's three guided flows:
//! - **transfer**: amount → wallet → confirmation → PIN, emits a deposit receipt
//! - **create_wallet**: email → OTP → name → PIN, emits a provisioned wallet
//! - **connect_wallet**: connect → name → PIN, emits an external wallet
//!
//! Each wizard owns its transient form state. Every run ends in exactly one
//! [`Outcome`]: completing a run also closes the wizard, and closing resets
//! every field to its initial value.
//!
//! # Usage
//! ```rust,ignore
//! use mundofi_core::wizard::{TransferWizard, Key};
//!
//! let mut wizard = TransferWizard::new(&config);
//! wizard.open(goal);
//! wizard.select_preset(50.0)?;
//! wizard.select_wallet("2")?;
//! wizard.confirm_transfer()?;
//! for digit in "123456".chars() {
//!     if let Some(receipt) = wizard.press_key(Key::from_char(digit).unwrap())? {
//!         println!("Deposited {}", receipt.amount);
//!     }
//! }
//! ```

pub mod connect_wallet;
pub mod create_wallet;
pub mod keypad;
pub mod setup;
pub mod transfer;

/// Token handed to every suspending provider call; rotated whenever a wizard resets
pub use tokio_util::sync::CancellationToken as CancelToken;
pub use connect_wallet::{ConnectWalletStep, ConnectWalletWizard};
pub use create_wallet::{CreateWalletStep, CreateWalletWizard};
pub use keypad::{format_with_commas, parse_amount, Key, Keypad, KeypadMode};
pub use setup::{MAX_WALLET_NAME_LEN, PIN_LENGTH};
pub use transfer::{TransferReceipt, TransferStep, TransferSummary, TransferWizard};

use crate::error::{ErrorCode, MundoError};
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

// =============================================================================
// Types
// =============================================================================

/// Which flow a wizard implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardKind {
    Transfer,
    CreateWallet,
    ConnectWallet,
}

/// Terminal result of one wizard run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "result", rename_all = "snake_case")]
pub enum Outcome<T> {
    Completed(T),
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Cancelled => None,
        }
    }
}

/// Result of a back-navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation<S> {
    /// Moved to the given earlier step
    MovedTo(S),
    /// Back from the first step: the wizard closed
    Exited,
}

/// Step-local error message and loading flag shared by every wizard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlowStatus {
    pub error: Option<String>,
    pub is_loading: bool,
}

impl FlowStatus {
    /// Enter the loading state; refuses a second submission while loading
    pub(crate) fn begin_loading(&mut self) -> Result<(), FlowError> {
        if self.is_loading {
            return Err(FlowError::Busy);
        }
        self.is_loading = true;
        self.error = None;
        Ok(())
    }

    /// Record a failure as the step-local message and hand the error back
    pub(crate) fn fail(&mut self, err: FlowError) -> FlowError {
        self.is_loading = false;
        if err.is_user_facing() {
            self.error = Some(err.to_string());
        }
        err
    }

    pub(crate) fn clear(&mut self) {
        self.error = None;
        self.is_loading = false;
    }
}

/// JSON-friendly view of a wizard for the mobile shell
#[derive(Debug, Clone, Serialize)]
pub struct WizardSnapshot {
    pub kind: WizardKind,
    pub is_open: bool,
    pub step: String,
    pub error: Option<String>,
    pub is_loading: bool,
    pub fields: serde_json::Value,
}

// =============================================================================
// Errors
// =============================================================================

/// Wizard errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    OperationFailed(String),

    #[error("Action '{action}' is not available on step '{step}'")]
    InvalidTransition { step: String, action: &'static str },

    #[error("Wizard is closed")]
    Closed,

    #[error("Another request is still in progress")]
    Busy,

    #[error("Wizard was closed before the request finished")]
    Cancelled,
}

impl FlowError {
    /// Errors shown inline on the current step
    pub fn is_user_facing(&self) -> bool {
        matches!(self, FlowError::Validation(_) | FlowError::OperationFailed(_))
    }

    pub(crate) fn transition(step: impl std::fmt::Debug, action: &'static str) -> Self {
        FlowError::InvalidTransition {
            step: format!("{:?}", step),
            action,
        }
    }
}

impl From<FlowError> for MundoError {
    fn from(e: FlowError) -> Self {
        let code = match e {
            FlowError::Validation(_) => ErrorCode::InvalidInput,
            FlowError::OperationFailed(_) => ErrorCode::OperationFailed,
            FlowError::InvalidTransition { .. } | FlowError::Closed => ErrorCode::InvalidTransition,
            FlowError::Busy => ErrorCode::Busy,
            FlowError::Cancelled => ErrorCode::Cancelled,
        };
        MundoError::new(code, e.to_string())
    }
}

/// Map a provider failure into the step-local operation failure
pub(crate) fn operation_failure(err: &MundoError, user_message: &str) -> FlowError {
    if err.code == ErrorCode::Cancelled {
        FlowError::Cancelled
    } else {
        FlowError::OperationFailed(user_message.to_string())
    }
}

/// Await a provider call unless `cancel` fires first.
///
/// `None` means the run was cancelled; the call's future is dropped even if
/// the provider never looks at the token.
pub(crate) async fn unless_cancelled<T>(
    cancel: &CancelToken,
    request: impl Future<Output = T>,
) -> Option<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        result = request => Some(result),
    }
}
