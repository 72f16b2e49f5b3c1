//! Fund-Transfer Wizard
//!
//! Moves a deposit into a savings goal:
//! amount (preset or keypad) → funding wallet → confirmation → 6-digit PIN.
//!
//! The 6th PIN digit completes the run, returns the receipt and resets the
//! wizard. No balance check or PIN verification happens here.

use super::keypad::{format_with_commas, parse_amount, Key, Keypad};
use super::{FlowError, FlowStatus, Navigation, WizardKind, WizardSnapshot};
use crate::config::AppConfig;
use crate::error::MundoResult;
use crate::types::{GoalRef, WalletRef};
use serde::{Deserialize, Serialize};

const MODULE: &str = "wizard::transfer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStep {
    AmountSelection,
    CustomAmountEntry,
    WalletSelection,
    TransferConfirmation,
    PinEntry,
}

/// Emitted once per successful run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    pub amount: f64,
    pub goal_id: String,
    pub wallet_id: String,
}

/// What the confirmation step shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSummary {
    pub amount: f64,
    pub formatted_amount: String,
    pub transfer_type: &'static str,
    pub speed: &'static str,
    pub goal_title: String,
    pub wallet_name: String,
    pub wallet_available: String,
}

pub struct TransferWizard {
    preset_amounts: Vec<f64>,
    wallet_catalog: Vec<WalletRef>,
    goal: Option<GoalRef>,
    step: TransferStep,
    /// Preset the "Continue" button uses
    highlighted_amount: f64,
    selected_amount: f64,
    used_custom_amount: bool,
    custom_amount: Keypad,
    selected_wallet: Option<WalletRef>,
    pin: Keypad,
    status: FlowStatus,
}

impl TransferWizard {
    /// A closed wizard using the config's presets and wallet catalog
    pub fn new(config: &AppConfig) -> Self {
        let default_amount = config.preset_amounts.first().copied().unwrap_or(10.0);
        Self {
            preset_amounts: config.preset_amounts.clone(),
            wallet_catalog: config.wallet_catalog.clone(),
            goal: None,
            step: TransferStep::AmountSelection,
            highlighted_amount: default_amount,
            selected_amount: default_amount,
            used_custom_amount: false,
            custom_amount: Keypad::amount(),
            selected_wallet: None,
            pin: Keypad::pin(),
            status: FlowStatus::default(),
        }
    }

    /// Start a fresh run for `goal`
    pub fn open(&mut self, goal: GoalRef) {
        self.reset();
        crate::log_debug!(MODULE, "Transfer wizard opened", goal_id = goal.id);
        self.goal = Some(goal);
    }

    pub fn is_open(&self) -> bool {
        self.goal.is_some()
    }

    pub fn current_step(&self) -> TransferStep {
        self.step
    }

    pub fn status(&self) -> &FlowStatus {
        &self.status
    }

    pub fn goal(&self) -> Option<&GoalRef> {
        self.goal.as_ref()
    }

    pub fn preset_amounts(&self) -> &[f64] {
        &self.preset_amounts
    }

    pub fn wallets(&self) -> &[WalletRef] {
        &self.wallet_catalog
    }

    pub fn highlighted_amount(&self) -> f64 {
        self.highlighted_amount
    }

    pub fn selected_amount(&self) -> f64 {
        self.selected_amount
    }

    pub fn selected_wallet(&self) -> Option<&WalletRef> {
        self.selected_wallet.as_ref()
    }

    /// Keypad entry formatted for display
    pub fn custom_amount_display(&self) -> String {
        format_with_commas(self.custom_amount.value())
    }

    pub fn pin_length(&self) -> usize {
        self.pin.len()
    }

    // =========================================================================
    // Amount
    // =========================================================================

    /// Tap a preset without leaving the amount step
    pub fn highlight_preset(&mut self, amount: f64) -> MundoResult<()> {
        self.expect_step(TransferStep::AmountSelection, "highlight_preset")?;
        self.check_preset(amount)?;
        self.highlighted_amount = amount;
        self.status.clear();
        Ok(())
    }

    pub fn select_preset(&mut self, amount: f64) -> MundoResult<()> {
        self.expect_step(TransferStep::AmountSelection, "select_preset")?;
        self.check_preset(amount)?;

        self.highlighted_amount = amount;
        self.selected_amount = amount;
        self.used_custom_amount = false;
        self.advance(TransferStep::WalletSelection);
        Ok(())
    }

    /// "Continue" on the amount step: use the highlighted preset
    pub fn continue_with_selected(&mut self) -> MundoResult<()> {
        self.select_preset(self.highlighted_amount)
    }

    fn check_preset(&mut self, amount: f64) -> MundoResult<()> {
        if self.preset_amounts.iter().any(|p| (*p - amount).abs() < f64::EPSILON) {
            return Ok(());
        }
        Err(self
            .status
            .fail(FlowError::Validation(format!("{} is not one of the preset amounts", amount)))
            .into())
    }

    pub fn select_custom(&mut self) -> MundoResult<()> {
        self.expect_step(TransferStep::AmountSelection, "select_custom")?;
        self.custom_amount.clear();
        self.advance(TransferStep::CustomAmountEntry);
        Ok(())
    }

    pub fn press_amount_key(&mut self, key: Key) -> MundoResult<bool> {
        self.expect_step(TransferStep::CustomAmountEntry, "press_amount_key")?;
        Ok(self.custom_amount.press(key))
    }

    pub fn confirm_custom_amount(&mut self) -> MundoResult<f64> {
        self.expect_step(TransferStep::CustomAmountEntry, "confirm_custom_amount")?;

        let amount = match parse_amount(self.custom_amount.value()) {
            Some(amount) if amount > 0.0 => amount,
            _ => {
                return Err(self
                    .status
                    .fail(FlowError::Validation("Please enter an amount greater than 0".to_string()))
                    .into())
            }
        };

        self.selected_amount = amount;
        self.used_custom_amount = true;
        self.advance(TransferStep::WalletSelection);
        Ok(amount)
    }

    // =========================================================================
    // Wallet and confirmation
    // =========================================================================

    pub fn select_wallet(&mut self, wallet_id: &str) -> MundoResult<()> {
        self.expect_step(TransferStep::WalletSelection, "select_wallet")?;

        let wallet = match self.wallet_catalog.iter().find(|w| w.id == wallet_id) {
            Some(wallet) => wallet.clone(),
            None => {
                return Err(self
                    .status
                    .fail(FlowError::Validation(format!("Unknown wallet: {}", wallet_id)))
                    .into())
            }
        };

        self.selected_wallet = Some(wallet);
        self.advance(TransferStep::TransferConfirmation);
        Ok(())
    }

    /// "Continue" on the wallet step: first wallet in the catalog
    pub fn continue_with_default_wallet(&mut self) -> MundoResult<()> {
        self.expect_step(TransferStep::WalletSelection, "continue_with_default_wallet")?;
        let first = self.wallet_catalog.first().map(|w| w.id.clone());
        match first {
            Some(id) => self.select_wallet(&id),
            None => Err(self
                .status
                .fail(FlowError::Validation("No wallets available".to_string()))
                .into()),
        }
    }

    /// Summary shown on the confirmation step
    pub fn summary(&self) -> Option<TransferSummary> {
        let goal = self.goal.as_ref()?;
        let wallet = self.selected_wallet.as_ref()?;
        let formatted_amount = format_with_commas(&self.selected_amount.to_string());

        Some(TransferSummary {
            amount: self.selected_amount,
            formatted_amount,
            transfer_type: "One-time transfer",
            speed: "Instantly",
            goal_title: goal.title.clone(),
            wallet_name: wallet.name.clone(),
            wallet_available: format!(
                "{} {}",
                format_with_commas(&wallet.balance.to_string()),
                wallet.currency
            ),
        })
    }

    pub fn confirm_transfer(&mut self) -> MundoResult<()> {
        self.expect_step(TransferStep::TransferConfirmation, "confirm_transfer")?;
        self.pin.clear();
        self.advance(TransferStep::PinEntry);
        Ok(())
    }

    // =========================================================================
    // PIN
    // =========================================================================

    /// Add a PIN digit; the 6th digit completes and closes the wizard
    pub fn press_pin_key(&mut self, key: Key) -> MundoResult<Option<TransferReceipt>> {
        self.expect_step(TransferStep::PinEntry, "press_pin_key")?;

        self.pin.press(key);
        if !self.pin.is_complete() {
            return Ok(None);
        }

        let receipt = TransferReceipt {
            amount: self.selected_amount,
            goal_id: self.goal.as_ref().map(|g| g.id.clone()).unwrap_or_default(),
            wallet_id: self
                .selected_wallet
                .as_ref()
                .map(|w| w.id.clone())
                .unwrap_or_default(),
        };

        crate::log_info!(
            MODULE,
            "Transfer confirmed",
            amount = receipt.amount,
            goal_id = receipt.goal_id,
            wallet_id = receipt.wallet_id,
        );

        self.reset();
        Ok(Some(receipt))
    }

    /// Route a key to whichever keypad the current step shows
    pub fn press_key(&mut self, key: Key) -> MundoResult<Option<TransferReceipt>> {
        match self.step {
            TransferStep::CustomAmountEntry if self.is_open() => {
                self.press_amount_key(key)?;
                Ok(None)
            }
            _ => self.press_pin_key(key),
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn back(&mut self) -> MundoResult<Navigation<TransferStep>> {
        if !self.is_open() {
            return Err(FlowError::Closed.into());
        }

        let previous = match self.step {
            TransferStep::AmountSelection => {
                self.close();
                return Ok(Navigation::Exited);
            }
            TransferStep::CustomAmountEntry => TransferStep::AmountSelection,
            TransferStep::WalletSelection if self.used_custom_amount => TransferStep::CustomAmountEntry,
            TransferStep::WalletSelection => TransferStep::AmountSelection,
            TransferStep::TransferConfirmation => TransferStep::WalletSelection,
            TransferStep::PinEntry => {
                self.pin.clear();
                TransferStep::TransferConfirmation
            }
        };

        self.status.clear();
        self.step = previous;
        Ok(Navigation::MovedTo(previous))
    }

    /// Dismiss from any step. Returns false if the wizard was not open.
    pub fn close(&mut self) -> bool {
        let was_open = self.is_open();
        if was_open {
            crate::log_debug!(MODULE, "Transfer wizard closed", step = format!("{:?}", self.step));
        }
        self.reset();
        was_open
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        WizardSnapshot {
            kind: WizardKind::Transfer,
            is_open: self.is_open(),
            step: step_name(self.step).to_string(),
            error: self.status.error.clone(),
            is_loading: self.status.is_loading,
            fields: serde_json::json!({
                "goal": self.goal,
                "presetAmounts": self.preset_amounts,
                "highlightedAmount": self.highlighted_amount,
                "selectedAmount": self.selected_amount,
                "customAmount": self.custom_amount_display(),
                "wallets": self.wallet_catalog,
                "selectedWallet": self.selected_wallet,
                "summary": self.summary(),
                "pinLength": self.pin.len(),
            }),
        }
    }

    fn expect_step(&self, step: TransferStep, action: &'static str) -> Result<(), FlowError> {
        if !self.is_open() {
            return Err(FlowError::Closed);
        }
        if self.step != step {
            return Err(FlowError::transition(self.step, action));
        }
        Ok(())
    }

    fn advance(&mut self, next: TransferStep) {
        crate::log_debug!(
            MODULE,
            "Step change",
            from = step_name(self.step),
            to = step_name(next),
        );
        self.status.clear();
        self.step = next;
    }

    fn reset(&mut self) {
        let default_amount = self.preset_amounts.first().copied().unwrap_or(10.0);
        self.goal = None;
        self.step = TransferStep::AmountSelection;
        self.highlighted_amount = default_amount;
        self.selected_amount = default_amount;
        self.used_custom_amount = false;
        self.custom_amount.clear();
        self.selected_wallet = None;
        self.pin.clear();
        self.status.clear();
    }
}

pub(crate) fn step_name(step: TransferStep) -> &'static str {
    match step {
        TransferStep::AmountSelection => "amount_selection",
        TransferStep::CustomAmountEntry => "custom_amount_entry",
        TransferStep::WalletSelection => "wallet_selection",
        TransferStep::TransferConfirmation => "transfer_confirmation",
        TransferStep::PinEntry => "pin_entry",
    }
}
