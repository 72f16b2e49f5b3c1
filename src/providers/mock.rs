//! In-process provider for demos and tests.

use super::{ConnectedWallet, WalletProvider};
use crate::config::{SimulatedLatency, DEMO_BYPASS_CODE};
use crate::error::{MundoError, MundoResult};
use crate::wizard::CancelToken;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

/// Provider operations, for failure injection and call counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderOp {
    SendCode,
    VerifyCode,
    Connect,
    ResolveAddress,
}

impl ProviderOp {
    fn index(self) -> usize {
        match self {
            ProviderOp::SendCode => 0,
            ProviderOp::VerifyCode => 1,
            ProviderOp::Connect => 2,
            ProviderOp::ResolveAddress => 3,
        }
    }
}

pub struct MockWalletProvider {
    latency: SimulatedLatency,
    accepted_code: String,
    own_address: Option<String>,
    failing: RwLock<HashSet<ProviderOp>>,
    calls: [AtomicUsize; 4],
}

impl MockWalletProvider {
    pub fn new(latency: SimulatedLatency) -> Self {
        Self {
            latency,
            accepted_code: DEMO_BYPASS_CODE.to_string(),
            own_address: None,
            failing: RwLock::new(HashSet::new()),
            calls: Default::default(),
        }
    }

    /// No delays
    pub fn instant() -> Self {
        Self::new(SimulatedLatency::instant())
    }

    /// Address returned by `resolve_own_address`
    pub fn with_own_address(mut self, address: impl Into<String>) -> Self {
        self.own_address = Some(address.into());
        self
    }

    /// Make `op` fail until cleared
    pub fn set_failing(&self, op: ProviderOp, failing: bool) {
        if let Ok(mut set) = self.failing.write() {
            if failing {
                set.insert(op);
            } else {
                set.remove(&op);
            }
        }
    }

    /// How many times `op` has been called
    pub fn call_count(&self, op: ProviderOp) -> usize {
        self.calls[op.index()].load(Ordering::SeqCst)
    }

    fn record(&self, op: ProviderOp) -> MundoResult<()> {
        self.calls[op.index()].fetch_add(1, Ordering::SeqCst);

        let failing = self
            .failing
            .read()
            .map_err(|_| MundoError::internal("Lock poisoned"))?
            .contains(&op);
        if failing {
            return Err(MundoError::operation_failed(format!("Injected failure: {:?}", op)));
        }
        Ok(())
    }
}

/// Sleep unless cancelled first
async fn simulate(delay: Duration, cancel: &CancelToken) -> MundoResult<()> {
    if delay.is_zero() {
        return Ok(());
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(MundoError::cancelled("Request cancelled")),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}

fn random_address() -> String {
    let bytes: [u8; 20] = rand::random();
    format!("0x{}", hex::encode(bytes))
}

#[async_trait]
impl WalletProvider for MockWalletProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn send_verification_code(&self, email: &str, cancel: &CancelToken) -> MundoResult<()> {
        simulate(self.latency.send_code(), cancel).await?;
        self.record(ProviderOp::SendCode)?;
        crate::log_debug!("providers::mock", "Verification code sent", email = email);
        Ok(())
    }

    async fn verify_code(&self, _email: &str, code: &str, cancel: &CancelToken) -> MundoResult<()> {
        simulate(self.latency.verify_code(), cancel).await?;
        self.record(ProviderOp::VerifyCode)?;

        if code != self.accepted_code {
            return Err(MundoError::operation_failed("Invalid OTP"));
        }
        Ok(())
    }

    async fn connect_external_wallet(&self, cancel: &CancelToken) -> MundoResult<ConnectedWallet> {
        simulate(self.latency.connect(), cancel).await?;
        self.record(ProviderOp::Connect)?;

        Ok(ConnectedWallet {
            address: random_address(),
            chain_id: None,
        })
    }

    async fn resolve_own_address(&self, cancel: &CancelToken) -> MundoResult<Option<String>> {
        simulate(self.latency.resolve_address(), cancel).await?;
        self.record(ProviderOp::ResolveAddress)?;
        Ok(self.own_address.clone())
    }
}
