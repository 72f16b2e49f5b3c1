//! Wallet-Connection Wizard
//!
//! Attaches an external wallet: connect → wallet name → 6-digit PIN.
//! The address comes from the provider's external connection; the record is
//! tagged with the configured network for connected wallets.

use super::CancelToken;
use super::setup::{validate_pin, WalletSetup};
use super::{operation_failure, unless_cancelled, FlowError, FlowStatus, Navigation, WizardKind, WizardSnapshot};
use crate::config::AppConfig;
use crate::error::{MundoError, MundoResult};
use crate::providers::WalletProvider;
use crate::types::{Network, WalletRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MODULE: &str = "wizard::connect_wallet";

const MSG_CONNECT_FAILED: &str = "Unable to connect wallet. Please try again.";

pub const NAME_SUGGESTIONS: [&str; 3] = ["My wallet", "MetaMask", "Trust wallet"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectWalletStep {
    Connect,
    Naming,
    PinSetup,
}

pub struct ConnectWalletWizard {
    provider: Arc<dyn WalletProvider>,
    network: Network,

    open: bool,
    step: ConnectWalletStep,
    connected_address: Option<String>,
    setup: WalletSetup,
    status: FlowStatus,
    cancel: CancelToken,
}

impl ConnectWalletWizard {
    pub fn new(config: &AppConfig, provider: Arc<dyn WalletProvider>) -> Self {
        Self {
            provider,
            network: config.connected_network,
            open: false,
            step: ConnectWalletStep::Connect,
            connected_address: None,
            setup: WalletSetup::new(),
            status: FlowStatus::default(),
            cancel: CancelToken::new(),
        }
    }

    pub fn open(&mut self) {
        self.reset();
        self.open = true;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn current_step(&self) -> ConnectWalletStep {
        self.step
    }

    pub fn status(&self) -> &FlowStatus {
        &self.status
    }

    pub fn connected_address(&self) -> Option<&str> {
        self.connected_address.as_deref()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub async fn connect(&mut self) -> MundoResult<()> {
        self.expect_step(ConnectWalletStep::Connect, "connect")?;
        self.status.begin_loading()?;

        let token = self.cancel.clone();
        let result = match unless_cancelled(&token, self.provider.connect_external_wallet(&token)).await {
            Some(result) if !token.is_cancelled() => result,
            _ => return Err(self.discard_late_result()),
        };

        match result {
            Ok(wallet) => {
                if let Some(chain_id) = wallet.chain_id {
                    if chain_id != self.network.chain_id() {
                        crate::log_warn!(
                            MODULE,
                            "Wallet reported a different chain",
                            reported = chain_id,
                            reported_network = Network::from_chain_id(chain_id).map_or("unknown", |n| n.as_str()),
                            expected = self.network.chain_id(),
                        );
                    }
                }
                crate::log_info!(MODULE, "External wallet connected", address = wallet.address);
                self.connected_address = Some(wallet.address);
                self.advance(ConnectWalletStep::Naming);
                Ok(())
            }
            Err(e) => {
                crate::log_warn!(MODULE, "External wallet connection failed", reason = e.message);
                Err(self.status.fail(operation_failure(&e, MSG_CONNECT_FAILED)).into())
            }
        }
    }

    pub fn submit_name(&mut self, name: &str) -> MundoResult<()> {
        self.expect_step(ConnectWalletStep::Naming, "submit_name")?;
        self.setup.submit_name(name).map_err(|e| self.status.fail(e))?;
        self.advance(ConnectWalletStep::PinSetup);
        Ok(())
    }

    pub fn submit_pin(&mut self, pin: &str) -> MundoResult<WalletRecord> {
        self.expect_step(ConnectWalletStep::PinSetup, "submit_pin")?;
        validate_pin(pin).map_err(|e| self.status.fail(e))?;

        let address = match self.connected_address.clone() {
            Some(address) => address,
            None => return Err(FlowError::transition(self.step, "submit_pin").into()),
        };

        let record = self
            .setup
            .finish(pin, address, self.network)
            .map_err(|e| self.status.fail(e))?;

        crate::log_info!(
            MODULE,
            "Wallet connected",
            name = record.name,
            address = record.address,
            network = record.network,
        );

        self.reset();
        Ok(record)
    }

    pub fn back(&mut self) -> MundoResult<Navigation<ConnectWalletStep>> {
        if !self.open {
            return Err(FlowError::Closed.into());
        }

        let previous = match self.step {
            ConnectWalletStep::Connect => {
                self.close();
                return Ok(Navigation::Exited);
            }
            ConnectWalletStep::Naming => ConnectWalletStep::Connect,
            ConnectWalletStep::PinSetup => {
                self.setup.back_to_naming();
                ConnectWalletStep::Naming
            }
        };

        self.status.clear();
        self.step = previous;
        Ok(Navigation::MovedTo(previous))
    }

    pub fn close(&mut self) -> bool {
        let was_open = self.open;
        self.reset();
        was_open
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        WizardSnapshot {
            kind: WizardKind::ConnectWallet,
            is_open: self.open,
            step: step_name(self.step).to_string(),
            error: self.status.error.clone(),
            is_loading: self.status.is_loading,
            fields: serde_json::json!({
                "connectedAddress": self.connected_address,
                "walletName": self.setup.wallet_name(),
                "nameSuggestions": NAME_SUGGESTIONS,
                "network": self.network,
            }),
        }
    }

    fn expect_step(&self, step: ConnectWalletStep, action: &'static str) -> Result<(), FlowError> {
        if !self.open {
            return Err(FlowError::Closed);
        }
        if self.step != step {
            return Err(FlowError::transition(self.step, action));
        }
        Ok(())
    }

    fn advance(&mut self, next: ConnectWalletStep) {
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
        self.step = ConnectWalletStep::Connect;
        self.connected_address = None;
        self.setup = WalletSetup::new();
        self.status.clear();
    }
}

pub(crate) fn step_name(step: ConnectWalletStep) -> &'static str {
    match step {
        ConnectWalletStep::Connect => "connect",
        ConnectWalletStep::Naming => "naming",
        ConnectWalletStep::PinSetup => "pin_setup",
    }
}
