//! End-to-end wizard runs against the public API.

use async_trait::async_trait;
use mundofi_core::config::{AppConfig, SimulatedLatency};
use mundofi_core::goals::{GoalBook, GoalDraft, GoalStatus};
use mundofi_core::providers::{ConnectedWallet, MockWalletProvider, ProviderOp, WalletProvider};
use mundofi_core::session::SessionService;
use mundofi_core::wizard::{
    CancelToken, ConnectWalletWizard, CreateWalletStep, CreateWalletWizard, Key, Navigation,
    TransferStep, TransferWizard,
};
use mundofi_core::{ErrorCode, MundoResult, Network};
use std::sync::Arc;
use std::time::Duration;

fn press_all(wizard: &mut TransferWizard, keys: &str) -> Option<mundofi_core::wizard::TransferReceipt> {
    let mut receipt = None;
    for c in keys.chars() {
        receipt = wizard.press_key(Key::from_char(c).unwrap()).unwrap();
    }
    receipt
}

fn vacation_goal(book: &mut GoalBook, config: &AppConfig) -> mundofi_core::goals::Goal {
    book.create_goal(
        &GoalDraft {
            name: "Vacation".to_string(),
            target_amount: "1,000".to_string(),
            asset_symbol: Some("USDC".to_string()),
            wallet_id: Some("1".to_string()),
            target_date: None,
        },
        config,
    )
    .unwrap()
}

/// Provider that ignores cancellation and answers after a fixed delay
struct StubbornProvider {
    delay: Duration,
}

#[async_trait]
impl WalletProvider for StubbornProvider {
    fn name(&self) -> &'static str {
        "stubborn"
    }

    async fn send_verification_code(&self, _email: &str, _cancel: &CancelToken) -> MundoResult<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn verify_code(&self, _email: &str, _code: &str, _cancel: &CancelToken) -> MundoResult<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn connect_external_wallet(&self, _cancel: &CancelToken) -> MundoResult<ConnectedWallet> {
        tokio::time::sleep(self.delay).await;
        Ok(ConnectedWallet {
            address: "0x1111111111111111111111111111111111111111".to_string(),
            chain_id: Some(84532),
        })
    }

    async fn resolve_own_address(&self, _cancel: &CancelToken) -> MundoResult<Option<String>> {
        Ok(None)
    }
}

/// Provider whose address lookup never answers and never looks at the token
struct SilentLookupProvider;

#[async_trait]
impl WalletProvider for SilentLookupProvider {
    fn name(&self) -> &'static str {
        "silent-lookup"
    }

    async fn send_verification_code(&self, _email: &str, _cancel: &CancelToken) -> MundoResult<()> {
        Ok(())
    }

    async fn verify_code(&self, _email: &str, _code: &str, _cancel: &CancelToken) -> MundoResult<()> {
        Ok(())
    }

    async fn connect_external_wallet(&self, _cancel: &CancelToken) -> MundoResult<ConnectedWallet> {
        std::future::pending().await
    }

    async fn resolve_own_address(&self, _cancel: &CancelToken) -> MundoResult<Option<String>> {
        std::future::pending().await
    }
}

// =============================================================================
// Fund transfer
// =============================================================================

#[test]
fn custom_amount_transfer_funds_goal() {
    let config = AppConfig::demo();
    let mut book = GoalBook::new();
    let goal = vacation_goal(&mut book, &config);

    let mut wizard = TransferWizard::new(&config);
    wizard.open(goal.to_ref());
    wizard.select_custom().unwrap();
    assert!(press_all(&mut wizard, "1250.5").is_none());
    assert_eq!(wizard.custom_amount_display(), "1,250.5");
    assert_eq!(wizard.confirm_custom_amount().unwrap(), 1250.5);

    wizard.select_wallet("1").unwrap();
    let summary = wizard.summary().unwrap();
    assert_eq!(summary.formatted_amount, "1,250.5");
    assert_eq!(summary.goal_title, "Vacation");
    assert_eq!(summary.wallet_available, "1,250.5 USDC");

    wizard.confirm_transfer().unwrap();
    let receipt = press_all(&mut wizard, "123456").unwrap();
    assert_eq!(receipt.amount, 1250.5);
    assert!(!wizard.is_open());

    let funded = book.apply_receipt(&receipt).unwrap();
    assert_eq!(funded.status, GoalStatus::Completed);
    assert_eq!(funded.percentage(), 100.0);
}

#[test]
fn back_from_wallet_step_returns_to_custom_entry() {
    let config = AppConfig::demo();
    let mut book = GoalBook::new();
    let goal = vacation_goal(&mut book, &config);

    let mut wizard = TransferWizard::new(&config);
    wizard.open(goal.to_ref());
    wizard.select_custom().unwrap();
    press_all(&mut wizard, "75");
    wizard.confirm_custom_amount().unwrap();

    assert_eq!(wizard.back().unwrap(), Navigation::MovedTo(TransferStep::CustomAmountEntry));
    assert_eq!(wizard.back().unwrap(), Navigation::MovedTo(TransferStep::AmountSelection));
    assert_eq!(wizard.back().unwrap(), Navigation::Exited);
    assert!(!wizard.is_open());
}

#[test]
fn reopening_starts_from_a_clean_slate() {
    let config = AppConfig::demo();
    let mut book = GoalBook::new();
    let goal = vacation_goal(&mut book, &config);

    let mut wizard = TransferWizard::new(&config);
    wizard.open(goal.to_ref());
    wizard.select_preset(100.0).unwrap();
    wizard.select_wallet("3").unwrap();
    wizard.confirm_transfer().unwrap();
    press_all(&mut wizard, "12");
    assert!(wizard.close());

    wizard.open(goal.to_ref());
    assert_eq!(wizard.current_step(), TransferStep::AmountSelection);
    assert_eq!(wizard.selected_amount(), 10.0);
    assert!(wizard.selected_wallet().is_none());
    assert_eq!(wizard.pin_length(), 0);
    assert_eq!(wizard.snapshot().fields["pinLength"], 0);
}

#[test]
fn zero_custom_amount_is_rejected() {
    let config = AppConfig::demo();
    let mut book = GoalBook::new();
    let goal = vacation_goal(&mut book, &config);

    let mut wizard = TransferWizard::new(&config);
    wizard.open(goal.to_ref());
    wizard.select_custom().unwrap();
    press_all(&mut wizard, "0.00");

    let err = wizard.confirm_custom_amount().unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
    assert_eq!(
        wizard.status().error.as_deref(),
        Some("Please enter an amount greater than 0")
    );
    assert_eq!(wizard.current_step(), TransferStep::CustomAmountEntry);
}

// =============================================================================
// Wallet creation
// =============================================================================

#[tokio::test]
async fn create_wallet_then_persist_in_session() {
    let config = AppConfig::demo();
    let provider = Arc::new(
        MockWalletProvider::instant().with_own_address("0xAbCdEf0123456789aBcDeF0123456789AbCdEf01"),
    );
    let mut wizard = CreateWalletWizard::new(&config, provider.clone());
    wizard.open();

    wizard.submit_email("  ana@example.com ").await.unwrap();
    assert_eq!(wizard.email(), "ana@example.com");
    wizard.submit_otp("123456").await.unwrap();
    wizard.submit_name("Rainy day").unwrap();
    let record = wizard.submit_pin("482913").await.unwrap();

    assert_eq!(record.address, "0xAbCdEf0123456789aBcDeF0123456789AbCdEf01");
    assert_eq!(record.network, Network::BaseSepolia);
    assert!(record.just_created);
    assert!(!wizard.is_open());
    assert_eq!(provider.call_count(ProviderOp::SendCode), 1);

    let session = SessionService::in_memory();
    session.initialize().unwrap();
    session.set_wallet(Some(record)).unwrap();
    assert!(session.is_authenticated());
    assert!(session.acknowledge_celebration().unwrap());
}

#[tokio::test]
async fn bypass_code_needs_demo_mode() {
    let mut demo = AppConfig::demo();
    demo.demo_bypass_code = "654321".to_string();
    let provider = Arc::new(MockWalletProvider::instant());
    let mut wizard = CreateWalletWizard::new(&demo, provider.clone());
    wizard.open();
    wizard.submit_email("ana@example.com").await.unwrap();
    wizard.submit_otp("654321").await.unwrap();
    assert_eq!(wizard.current_step(), CreateWalletStep::Naming);
    assert_eq!(provider.call_count(ProviderOp::VerifyCode), 0);

    let mut locked = AppConfig::demo();
    locked.demo_mode = false;
    locked.demo_bypass_code = "654321".to_string();
    let provider = Arc::new(MockWalletProvider::instant());
    let mut wizard = CreateWalletWizard::new(&locked, provider.clone());
    wizard.open();
    wizard.submit_email("ana@example.com").await.unwrap();

    let err = wizard.submit_otp("654321").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::OperationFailed);
    assert_eq!(
        wizard.status().error.as_deref(),
        Some("Invalid verification code. Please try again.")
    );
    assert_eq!(wizard.current_step(), CreateWalletStep::OtpVerification);
    assert_eq!(provider.call_count(ProviderOp::VerifyCode), 1);
}

#[tokio::test]
async fn closing_during_send_cancels_the_request() {
    let config = AppConfig::demo();
    let slow = SimulatedLatency {
        send_code_ms: 5_000,
        verify_code_ms: 5_000,
        connect_ms: 5_000,
        resolve_address_ms: 5_000,
    };
    let mut wizard = CreateWalletWizard::new(&config, Arc::new(MockWalletProvider::new(slow)));
    wizard.open();

    let token = wizard.cancel_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    let err = wizard.submit_email("ana@example.com").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Cancelled);
    assert!(!wizard.is_open());
    assert_eq!(wizard.current_step(), CreateWalletStep::EmailEntry);
    assert!(!wizard.status().is_loading);
    assert_eq!(wizard.email(), "");
}

#[tokio::test]
async fn late_result_after_cancel_is_dropped() {
    let config = AppConfig::demo();
    let provider = Arc::new(StubbornProvider {
        delay: Duration::from_millis(100),
    });
    let mut wizard = CreateWalletWizard::new(&config, provider);
    wizard.open();

    let token = wizard.cancel_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();
    });

    let err = wizard.submit_email("ana@example.com").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Cancelled);
    assert!(!wizard.is_open());
    assert_eq!(wizard.current_step(), CreateWalletStep::EmailEntry);

    wizard.open();
    assert!(wizard.snapshot().error.is_none());
    assert_eq!(wizard.current_step(), CreateWalletStep::EmailEntry);
}

#[tokio::test]
async fn closing_during_address_lookup_cancels_pin_submission() {
    let config = AppConfig::demo();
    let mut wizard = CreateWalletWizard::new(&config, Arc::new(SilentLookupProvider));
    wizard.open();
    wizard.submit_email("ana@example.com").await.unwrap();
    wizard.submit_otp("123456").await.unwrap();
    wizard.submit_name("Rainy day").unwrap();

    let token = wizard.cancel_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    let result = tokio::time::timeout(Duration::from_millis(500), wizard.submit_pin("123456"))
        .await
        .expect("submit_pin returns once the run is cancelled");
    assert_eq!(result.unwrap_err().code, ErrorCode::Cancelled);
    assert!(!wizard.is_open());
    assert_eq!(wizard.current_step(), CreateWalletStep::EmailEntry);
    assert!(!wizard.status().is_loading);
}

// =============================================================================
// Wallet connection
// =============================================================================

#[tokio::test]
async fn connected_wallet_uses_connected_network() {
    let mut config = AppConfig::demo();
    config.connected_network = Network::Base;
    let provider = Arc::new(StubbornProvider {
        delay: Duration::from_millis(1),
    });
    let mut wizard = ConnectWalletWizard::new(&config, provider);
    wizard.open();

    wizard.connect().await.unwrap();
    wizard.submit_name("Ledger").unwrap();
    let record = wizard.submit_pin("135790").unwrap();
    assert_eq!(record.address, "0x1111111111111111111111111111111111111111");
    assert_eq!(record.network, Network::Base);
    assert!(!wizard.is_open());
}

#[tokio::test]
async fn closing_during_silent_connect_cancels() {
    let config = AppConfig::demo();
    let mut wizard = ConnectWalletWizard::new(&config, Arc::new(SilentLookupProvider));
    wizard.open();

    let token = wizard.cancel_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    let result = tokio::time::timeout(Duration::from_millis(500), wizard.connect())
        .await
        .expect("connect returns once the run is cancelled");
    assert_eq!(result.unwrap_err().code, ErrorCode::Cancelled);
    assert!(!wizard.is_open());
}

#[tokio::test]
async fn short_pin_keeps_connect_wizard_on_pin_step() {
    let config = AppConfig::demo();
    let mut wizard = ConnectWalletWizard::new(&config, Arc::new(MockWalletProvider::instant()));
    wizard.open();
    wizard.connect().await.unwrap();
    wizard.submit_name("Mine").unwrap();

    let err = wizard.submit_pin("123").unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
    assert_eq!(wizard.status().error.as_deref(), Some("Please enter a 6-digit PIN"));
    assert!(wizard.is_open());
}
