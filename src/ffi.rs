//! FFI Layer for MundoFi Core
//!
//! All C-ABI exports are defined here. This is the ONLY file that should
//! contain `extern "C"` functions. All functions follow a consistent pattern:
//! - Input: JSON string (null-terminated C string)
//! - Output: JSON string (must be freed with `mundofi_free_string`)
//!
//! Error handling: All functions return JSON with `success` field.
//! On error, `success: false` and `error` object is populated.
//!
//! Wizards live in a handle registry. The host opens a wizard, feeds it
//! actions one at a time and renders the returned snapshot. Asynchronous
//! steps run to completion on an internal runtime before the call returns;
//! `mundofi_wizard_close` may be called from another thread to abandon one.

use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use serde::{Deserialize, Serialize};
use tokio::runtime::Runtime;

use crate::activity::{ActivityFeed, ActivityFilter, ActivityGroup, ActivityQuery, FilterSelection};
use crate::config::AppConfig;
use crate::error::{MundoError, MundoResult};
use crate::goals::GoalDraft;
use crate::providers::{build_provider, WalletProvider};
use crate::trust;
use crate::types::{ApiResponse, GoalRef};
use crate::wizard::{
    format_with_commas, CancelToken, ConnectWalletWizard, CreateWalletWizard, Key, Navigation,
    Outcome, TransferWizard, WizardKind, WizardSnapshot,
};

const MODULE: &str = "ffi";

// =============================================================================
// Global State
// =============================================================================

struct FfiContext {
    config: AppConfig,
    provider: Arc<dyn WalletProvider>,
}

struct WizardSlot {
    wizard: tokio::sync::Mutex<AnyWizard>,
    /// Token of the request currently awaiting the provider
    in_flight: Mutex<Option<CancelToken>>,
}

lazy_static::lazy_static! {
    static ref CONTEXT: RwLock<Option<FfiContext>> = RwLock::new(None);
    static ref WIZARDS: RwLock<HashMap<u64, Arc<WizardSlot>>> = RwLock::new(HashMap::new());
    static ref RUNTIME: Option<Runtime> = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .ok();
}

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

// =============================================================================
// Memory Management
// =============================================================================

/// Free a string returned by any mundofi_* function
///
/// # Safety
/// The pointer must have been returned by a mundofi_* function
#[unsafe(no_mangle)]
pub extern "C" fn mundofi_free_string(s: *mut c_char) {
    if s.is_null() {
        return;
    }
    unsafe {
        let _ = CString::from_raw(s);
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Copy a C string into an owned Rust string, or return error JSON
fn parse_input(input: *const c_char) -> Result<String, *mut c_char> {
    if input.is_null() {
        return Err(error_response(MundoError::invalid_input("Null input pointer")));
    }

    let c_str = unsafe { CStr::from_ptr(input) };
    match c_str.to_str() {
        Ok(s) => Ok(s.to_string()),
        Err(_) => Err(error_response(MundoError::invalid_input("Invalid UTF-8 string"))),
    }
}

fn parse_request<T: serde::de::DeserializeOwned>(input: *const c_char) -> Result<T, *mut c_char> {
    let json_str = parse_input(input)?;
    serde_json::from_str(&json_str)
        .map_err(|e| error_response(MundoError::parse_error(format!("Invalid JSON: {}", e))))
}

/// Create a success response JSON string
fn success_response<T: Serialize>(data: T) -> *mut c_char {
    let response = ApiResponse::ok(data);
    string_to_ptr(response.to_json())
}

/// Create an error response JSON string
fn error_response(error: MundoError) -> *mut c_char {
    let response: ApiResponse<()> = ApiResponse::err(error);
    string_to_ptr(response.to_json())
}

fn respond<T: Serialize>(result: MundoResult<T>) -> *mut c_char {
    match result {
        Ok(data) => success_response(data),
        Err(e) => error_response(e),
    }
}

/// Convert Rust string to C string pointer
fn string_to_ptr(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(c_str) => c_str.into_raw(),
        Err(_) => {
            let fallback = r#"{"success":false,"error":{"code":"internal","message":"String conversion failed","details":null}}"#;
            CString::new(fallback)
                .map(CString::into_raw)
                .unwrap_or(std::ptr::null_mut())
        }
    }
}

fn runtime() -> MundoResult<&'static Runtime> {
    RUNTIME
        .as_ref()
        .ok_or_else(|| MundoError::internal("Async runtime unavailable"))
}

fn slot(handle: u64) -> MundoResult<Arc<WizardSlot>> {
    WIZARDS
        .read()
        .map_err(|_| MundoError::internal("Wizard registry lock poisoned"))?
        .get(&handle)
        .cloned()
        .ok_or_else(|| MundoError::not_found(format!("No wizard with handle {}", handle)))
}

fn set_in_flight(slot: &WizardSlot, token: Option<CancelToken>) {
    if let Ok(mut guard) = slot.in_flight.lock() {
        *guard = token;
    }
}

// =============================================================================
// Wizard Dispatch
// =============================================================================

enum AnyWizard {
    Transfer(TransferWizard),
    CreateWallet(CreateWalletWizard),
    ConnectWallet(ConnectWalletWizard),
}

/// One user action, tagged by `type`
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WizardAction {
    HighlightPreset { amount: f64 },
    SelectPreset { amount: f64 },
    SelectCustom,
    PressKey { key: String },
    ConfirmCustomAmount,
    ContinueWithSelected,
    SelectWallet { wallet_id: String },
    ContinueWithDefaultWallet,
    ConfirmTransfer,
    SubmitEmail { email: String },
    SubmitOtp { code: String },
    SubmitName { name: String },
    SubmitPin { pin: String },
    Connect,
    Back,
    Close,
}

impl WizardAction {
    fn name(&self) -> &'static str {
        match self {
            WizardAction::HighlightPreset { .. } => "highlight_preset",
            WizardAction::SelectPreset { .. } => "select_preset",
            WizardAction::SelectCustom => "select_custom",
            WizardAction::PressKey { .. } => "press_key",
            WizardAction::ConfirmCustomAmount => "confirm_custom_amount",
            WizardAction::ContinueWithSelected => "continue_with_selected",
            WizardAction::SelectWallet { .. } => "select_wallet",
            WizardAction::ContinueWithDefaultWallet => "continue_with_default_wallet",
            WizardAction::ConfirmTransfer => "confirm_transfer",
            WizardAction::SubmitEmail { .. } => "submit_email",
            WizardAction::SubmitOtp { .. } => "submit_otp",
            WizardAction::SubmitName { .. } => "submit_name",
            WizardAction::SubmitPin { .. } => "submit_pin",
            WizardAction::Connect => "connect",
            WizardAction::Back => "back",
            WizardAction::Close => "close",
        }
    }
}

type ActionOutcome = Option<Outcome<serde_json::Value>>;

fn completed<T: Serialize>(value: T) -> MundoResult<ActionOutcome> {
    Ok(Some(Outcome::Completed(serde_json::to_value(value)?)))
}

fn closed_outcome(was_open: bool) -> ActionOutcome {
    if was_open {
        Some(Outcome::Cancelled)
    } else {
        None
    }
}

fn exited<S>(navigation: Navigation<S>) -> ActionOutcome {
    match navigation {
        Navigation::MovedTo(_) => None,
        Navigation::Exited => Some(Outcome::Cancelled),
    }
}

impl AnyWizard {
    fn build(kind: WizardKind, ctx: &FfiContext) -> Self {
        match kind {
            WizardKind::Transfer => AnyWizard::Transfer(TransferWizard::new(&ctx.config)),
            WizardKind::CreateWallet => {
                AnyWizard::CreateWallet(CreateWalletWizard::new(&ctx.config, ctx.provider.clone()))
            }
            WizardKind::ConnectWallet => {
                AnyWizard::ConnectWallet(ConnectWalletWizard::new(&ctx.config, ctx.provider.clone()))
            }
        }
    }

    fn kind(&self) -> WizardKind {
        match self {
            AnyWizard::Transfer(_) => WizardKind::Transfer,
            AnyWizard::CreateWallet(_) => WizardKind::CreateWallet,
            AnyWizard::ConnectWallet(_) => WizardKind::ConnectWallet,
        }
    }

    fn open(&mut self, goal: Option<GoalRef>) -> MundoResult<()> {
        match self {
            AnyWizard::Transfer(w) => {
                let goal = goal.ok_or_else(|| {
                    MundoError::invalid_input("A goal is required to open the transfer wizard")
                })?;
                w.open(goal);
            }
            AnyWizard::CreateWallet(w) => w.open(),
            AnyWizard::ConnectWallet(w) => w.open(),
        }
        Ok(())
    }

    fn close(&mut self) -> bool {
        match self {
            AnyWizard::Transfer(w) => w.close(),
            AnyWizard::CreateWallet(w) => w.close(),
            AnyWizard::ConnectWallet(w) => w.close(),
        }
    }

    fn snapshot(&self) -> WizardSnapshot {
        match self {
            AnyWizard::Transfer(w) => w.snapshot(),
            AnyWizard::CreateWallet(w) => w.snapshot(),
            AnyWizard::ConnectWallet(w) => w.snapshot(),
        }
    }

    fn cancel_token(&self) -> Option<CancelToken> {
        match self {
            AnyWizard::Transfer(_) => None,
            AnyWizard::CreateWallet(w) => Some(w.cancel_token()),
            AnyWizard::ConnectWallet(w) => Some(w.cancel_token()),
        }
    }

    async fn apply(&mut self, action: WizardAction) -> MundoResult<ActionOutcome> {
        let action_name = action.name();
        match (self, action) {
            (w, WizardAction::Close) => Ok(closed_outcome(w.close())),

            // Fund transfer
            (AnyWizard::Transfer(w), WizardAction::HighlightPreset { amount }) => {
                w.highlight_preset(amount).map(|_| None)
            }
            (AnyWizard::Transfer(w), WizardAction::SelectPreset { amount }) => {
                w.select_preset(amount).map(|_| None)
            }
            (AnyWizard::Transfer(w), WizardAction::SelectCustom) => w.select_custom().map(|_| None),
            (AnyWizard::Transfer(w), WizardAction::ContinueWithSelected) => {
                w.continue_with_selected().map(|_| None)
            }
            (AnyWizard::Transfer(w), WizardAction::PressKey { key }) => {
                let key: Key = key.parse().map_err(MundoError::invalid_input)?;
                match w.press_key(key)? {
                    Some(receipt) => completed(receipt),
                    None => Ok(None),
                }
            }
            (AnyWizard::Transfer(w), WizardAction::ConfirmCustomAmount) => {
                w.confirm_custom_amount().map(|_| None)
            }
            (AnyWizard::Transfer(w), WizardAction::SelectWallet { wallet_id }) => {
                w.select_wallet(&wallet_id).map(|_| None)
            }
            (AnyWizard::Transfer(w), WizardAction::ContinueWithDefaultWallet) => {
                w.continue_with_default_wallet().map(|_| None)
            }
            (AnyWizard::Transfer(w), WizardAction::ConfirmTransfer) => {
                w.confirm_transfer().map(|_| None)
            }
            (AnyWizard::Transfer(w), WizardAction::Back) => w.back().map(exited),

            // Wallet creation
            (AnyWizard::CreateWallet(w), WizardAction::SubmitEmail { email }) => {
                w.submit_email(&email).await.map(|_| None)
            }
            (AnyWizard::CreateWallet(w), WizardAction::SubmitOtp { code }) => {
                w.submit_otp(&code).await.map(|_| None)
            }
            (AnyWizard::CreateWallet(w), WizardAction::SubmitName { name }) => {
                w.submit_name(&name).map(|_| None)
            }
            (AnyWizard::CreateWallet(w), WizardAction::SubmitPin { pin }) => {
                completed(w.submit_pin(&pin).await?)
            }
            (AnyWizard::CreateWallet(w), WizardAction::Back) => w.back().map(exited),

            // Wallet connection
            (AnyWizard::ConnectWallet(w), WizardAction::Connect) => w.connect().await.map(|_| None),
            (AnyWizard::ConnectWallet(w), WizardAction::SubmitName { name }) => {
                w.submit_name(&name).map(|_| None)
            }
            (AnyWizard::ConnectWallet(w), WizardAction::SubmitPin { pin }) => {
                completed(w.submit_pin(&pin)?)
            }
            (AnyWizard::ConnectWallet(w), WizardAction::Back) => w.back().map(exited),

            (w, _) => Err(MundoError::invalid_transition(format!(
                "Action '{}' does not apply to a {:?} wizard",
                action_name,
                w.kind()
            ))),
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

#[derive(Serialize)]
struct ConfigureResponse {
    warnings: Vec<String>,
    provider: &'static str,
}

#[derive(Serialize)]
struct OpenResponse {
    handle: u64,
    snapshot: WizardSnapshot,
}

#[derive(Serialize)]
struct DispatchResponse {
    snapshot: WizardSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: ActionOutcome,
}

#[derive(Deserialize)]
struct HandleRequest {
    handle: u64,
}

// =============================================================================
// Configuration
// =============================================================================

/// Install the configuration every wizard opened afterwards uses
///
/// # Input
/// An `AppConfig` JSON object; missing fields take standard values.
///
/// # Output
/// ```json
/// { "success": true, "data": { "warnings": [...], "provider": "mock" } }
/// ```
#[unsafe(no_mangle)]
pub extern "C" fn mundofi_configure(input: *const c_char) -> *mut c_char {
    let json_str = match parse_input(input) {
        Ok(s) => s,
        Err(ptr) => return ptr,
    };
    respond(configure(&json_str))
}

fn configure(json_str: &str) -> MundoResult<ConfigureResponse> {
    let config = AppConfig::from_json_str(json_str)?;
    let provider = build_provider(&config)?;
    let warnings = config.validate();
    for warning in &warnings {
        crate::log_warn!(MODULE, "Configuration warning", detail = warning);
    }

    let response = ConfigureResponse {
        warnings,
        provider: provider.name(),
    };
    *CONTEXT
        .write()
        .map_err(|_| MundoError::internal("Context lock poisoned"))? = Some(FfiContext { config, provider });
    Ok(response)
}

// =============================================================================
// Wizards
// =============================================================================

/// Open a wizard
///
/// # Input
/// ```json
/// { "kind": "transfer", "goal": { "id": "1", "title": "...", ... } }
/// ```
/// `goal` is required for `transfer`. Pass `handle` to reopen an existing
/// wizard instead of allocating a new one.
///
/// # Output
/// ```json
/// { "success": true, "data": { "handle": 1, "snapshot": { ... } } }
/// ```
#[unsafe(no_mangle)]
pub extern "C" fn mundofi_wizard_open(input: *const c_char) -> *mut c_char {
    #[derive(Deserialize)]
    struct OpenRequest {
        kind: WizardKind,
        goal: Option<GoalRef>,
        handle: Option<u64>,
    }

    let request: OpenRequest = match parse_request(input) {
        Ok(r) => r,
        Err(ptr) => return ptr,
    };
    respond(wizard_open(request.kind, request.goal, request.handle))
}

fn wizard_open(kind: WizardKind, goal: Option<GoalRef>, handle: Option<u64>) -> MundoResult<OpenResponse> {
    if let Some(handle) = handle {
        let slot = slot(handle)?;
        let snapshot = runtime()?.block_on(async {
            let mut wizard = slot.wizard.lock().await;
            if wizard.kind() != kind {
                return Err(MundoError::invalid_input(format!(
                    "Handle {} is a {:?} wizard",
                    handle,
                    wizard.kind()
                )));
            }
            wizard.open(goal)?;
            Ok::<_, MundoError>(wizard.snapshot())
        })?;
        return Ok(OpenResponse { handle, snapshot });
    }

    let mut wizard = {
        let ctx = CONTEXT
            .read()
            .map_err(|_| MundoError::internal("Context lock poisoned"))?;
        let ctx = ctx
            .as_ref()
            .ok_or_else(|| MundoError::config_error("Call mundofi_configure before opening a wizard"))?;
        AnyWizard::build(kind, ctx)
    };
    wizard.open(goal)?;
    let snapshot = wizard.snapshot();

    let handle = NEXT_HANDLE.fetch_add(1, Ordering::SeqCst);
    let slot = Arc::new(WizardSlot {
        wizard: tokio::sync::Mutex::new(wizard),
        in_flight: Mutex::new(None),
    });
    WIZARDS
        .write()
        .map_err(|_| MundoError::internal("Wizard registry lock poisoned"))?
        .insert(handle, slot);

    crate::log_debug!(MODULE, "Wizard opened", handle = handle, kind = format!("{:?}", kind));
    Ok(OpenResponse { handle, snapshot })
}

/// Apply one user action to a wizard
///
/// # Input
/// ```json
/// { "handle": 1, "action": { "type": "select_preset", "amount": 50 } }
/// ```
///
/// # Output
/// ```json
/// {
///   "success": true,
///   "data": {
///     "snapshot": { ... },
///     "outcome": { "status": "completed", "result": { ... } }
///   }
/// }
/// ```
/// `outcome` is present only when the action ended the run.
#[unsafe(no_mangle)]
pub extern "C" fn mundofi_wizard_dispatch(input: *const c_char) -> *mut c_char {
    #[derive(Deserialize)]
    struct DispatchRequest {
        handle: u64,
        action: WizardAction,
    }

    let request: DispatchRequest = match parse_request(input) {
        Ok(r) => r,
        Err(ptr) => return ptr,
    };
    respond(wizard_dispatch(request.handle, request.action))
}

fn wizard_dispatch(handle: u64, action: WizardAction) -> MundoResult<DispatchResponse> {
    let slot = slot(handle)?;
    runtime()?.block_on(async {
        let mut wizard = slot.wizard.lock().await;
        set_in_flight(&slot, wizard.cancel_token());
        let result = wizard.apply(action).await;
        set_in_flight(&slot, None);

        let outcome = result?;
        Ok::<_, MundoError>(DispatchResponse {
            snapshot: wizard.snapshot(),
            outcome,
        })
    })
}

/// Current view of a wizard
///
/// # Input
/// ```json
/// { "handle": 1 }
/// ```
#[unsafe(no_mangle)]
pub extern "C" fn mundofi_wizard_snapshot(input: *const c_char) -> *mut c_char {
    let request: HandleRequest = match parse_request(input) {
        Ok(r) => r,
        Err(ptr) => return ptr,
    };
    respond(wizard_snapshot(request.handle))
}

fn wizard_snapshot(handle: u64) -> MundoResult<WizardSnapshot> {
    let slot = slot(handle)?;
    let snapshot = runtime()?.block_on(async { slot.wizard.lock().await.snapshot() });
    Ok(snapshot)
}

/// Dismiss a wizard from any step, abandoning an in-flight request
///
/// Safe to call while another thread is blocked in `mundofi_wizard_dispatch`
/// for the same handle: the pending request resolves as `cancelled`.
///
/// # Input
/// ```json
/// { "handle": 1 }
/// ```
#[unsafe(no_mangle)]
pub extern "C" fn mundofi_wizard_close(input: *const c_char) -> *mut c_char {
    let request: HandleRequest = match parse_request(input) {
        Ok(r) => r,
        Err(ptr) => return ptr,
    };
    respond(wizard_close(request.handle))
}

fn wizard_close(handle: u64) -> MundoResult<DispatchResponse> {
    let slot = slot(handle)?;

    let interrupted = match slot.in_flight.lock() {
        Ok(mut guard) => guard.take().map(|token| token.cancel()).is_some(),
        Err(_) => false,
    };
    if interrupted {
        crate::log_debug!(MODULE, "Cancelling in-flight request", handle = handle);
    }

    let response = runtime()?.block_on(async {
        let mut wizard = slot.wizard.lock().await;
        let was_open = wizard.close();
        DispatchResponse {
            snapshot: wizard.snapshot(),
            outcome: closed_outcome(was_open || interrupted),
        }
    });
    Ok(response)
}

/// Forget a wizard handle
///
/// # Input
/// ```json
/// { "handle": 1 }
/// ```
#[unsafe(no_mangle)]
pub extern "C" fn mundofi_wizard_release(input: *const c_char) -> *mut c_char {
    let request: HandleRequest = match parse_request(input) {
        Ok(r) => r,
        Err(ptr) => return ptr,
    };
    respond(wizard_release(request.handle))
}

fn wizard_release(handle: u64) -> MundoResult<bool> {
    let removed = WIZARDS
        .write()
        .map_err(|_| MundoError::internal("Wizard registry lock poisoned"))?
        .remove(&handle);

    if let Some(slot) = &removed {
        if let Ok(mut guard) = slot.in_flight.lock() {
            if let Some(token) = guard.take() {
                token.cancel();
            }
        }
    }
    Ok(removed.is_some())
}

// =============================================================================
// Formatting & Screens
// =============================================================================

/// Comma-format a raw amount the way the keypad display shows it
///
/// # Input
/// ```json
/// { "value": "12345.6" }
/// ```
///
/// # Output
/// ```json
/// { "success": true, "data": { "formatted": "12,345.6" } }
/// ```
#[unsafe(no_mangle)]
pub extern "C" fn mundofi_format_amount(input: *const c_char) -> *mut c_char {
    #[derive(Deserialize)]
    struct FormatRequest {
        value: String,
    }

    #[derive(Serialize)]
    struct FormatResponse {
        formatted: String,
    }

    let request: FormatRequest = match parse_request(input) {
        Ok(r) => r,
        Err(ptr) => return ptr,
    };
    success_response(FormatResponse {
        formatted: format_with_commas(&request.value),
    })
}

/// Validate the create-goal form against the configured catalogs
///
/// # Input
/// ```json
/// { "name": "Trip", "targetAmount": "1,500", "assetSymbol": "USDC", "walletId": "1" }
/// ```
#[unsafe(no_mangle)]
pub extern "C" fn mundofi_validate_goal(input: *const c_char) -> *mut c_char {
    let draft: GoalDraft = match parse_request(input) {
        Ok(r) => r,
        Err(ptr) => return ptr,
    };
    respond(validate_goal(&draft))
}

fn validate_goal(draft: &GoalDraft) -> MundoResult<crate::goals::ValidGoal> {
    let ctx = CONTEXT
        .read()
        .map_err(|_| MundoError::internal("Context lock poisoned"))?;
    match ctx.as_ref() {
        Some(ctx) => draft.validate(&ctx.config),
        None => draft.validate(&AppConfig::standard()),
    }
}

/// Trust score screen data
#[unsafe(no_mangle)]
pub extern "C" fn mundofi_trust_summary() -> *mut c_char {
    success_response(trust::trust_summary())
}

/// Activity screen: search, filter chips and day groups
///
/// # Input
/// ```json
/// {
///   "search": "fund",
///   "filters": ["deposits"],
///   "toggle": "completed",
///   "today": "2026-10-19",
///   "utcOffsetMinutes": -300
/// }
/// ```
/// Every field is optional. `toggle` taps one chip on top of `filters`; the
/// response carries the resulting selection for the next call.
#[unsafe(no_mangle)]
pub extern "C" fn mundofi_activity_feed(input: *const c_char) -> *mut c_char {
    let request: ActivityFeedRequest = match parse_request(input) {
        Ok(r) => r,
        Err(ptr) => return ptr,
    };
    respond(activity_feed(request))
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct ActivityFeedRequest {
    search: String,
    filters: Vec<ActivityFilter>,
    toggle: Option<ActivityFilter>,
    today: Option<chrono::NaiveDate>,
    utc_offset_minutes: i32,
}

#[derive(Serialize)]
struct FilterChip {
    id: ActivityFilter,
    label: &'static str,
    active: bool,
}

#[derive(Serialize)]
struct ActivityFeedResponse {
    filters: FilterSelection,
    chips: Vec<FilterChip>,
    groups: Vec<ActivityGroup>,
}

fn activity_feed(request: ActivityFeedRequest) -> MundoResult<ActivityFeedResponse> {
    let offset = chrono::FixedOffset::east_opt(request.utc_offset_minutes.saturating_mul(60))
        .ok_or_else(|| MundoError::invalid_input("UTC offset out of range"))?;
    let now = chrono::Utc::now();
    let today = request
        .today
        .unwrap_or_else(|| now.with_timezone(&offset).date_naive());

    let mut filters = FilterSelection::new(request.filters);
    if let Some(chip) = request.toggle {
        filters.toggle(chip);
    }

    let query = ActivityQuery {
        search: request.search,
        filters,
    };
    let groups = ActivityFeed::sample(now).query(&query, today, offset);
    let chips = ActivityFilter::ALL
        .iter()
        .map(|f| FilterChip {
            id: *f,
            label: f.label(),
            active: query.filters.filters().contains(f),
        })
        .collect();

    Ok(ActivityFeedResponse {
        filters: query.filters,
        chips,
        groups,
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn call(f: extern "C" fn(*const c_char) -> *mut c_char, input: &str) -> serde_json::Value {
        let c_input = CString::new(input).unwrap();
        let out = f(c_input.as_ptr());
        let json = unsafe { CStr::from_ptr(out) }.to_str().unwrap().to_string();
        mundofi_free_string(out);
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_null_input_is_rejected() {
        let out = mundofi_wizard_snapshot(std::ptr::null());
        let json = unsafe { CStr::from_ptr(out) }.to_str().unwrap().to_string();
        mundofi_free_string(out);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["code"], "invalid_input");
    }

    #[test]
    fn test_format_amount() {
        let value = call(mundofi_format_amount, r#"{"value":"1234567.5"}"#);
        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["formatted"], "1,234,567.5");
    }

    #[test]
    fn test_unknown_handle() {
        let value = call(mundofi_wizard_snapshot, r#"{"handle":999999}"#);
        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["code"], "not_found");
    }

    #[test]
    fn test_action_for_other_wizard_kind() {
        call(mundofi_configure, r#"{"provider":"mock","demo_mode":true,"latency":{"send_code_ms":0,"verify_code_ms":0,"connect_ms":0}}"#);
        let opened = call(mundofi_wizard_open, r#"{"kind":"connect_wallet"}"#);
        let handle = opened["data"]["handle"].as_u64().unwrap();

        let value = call(
            mundofi_wizard_dispatch,
            &format!(r#"{{"handle":{},"action":{{"type":"confirm_transfer"}}}}"#, handle),
        );
        assert_eq!(value["error"]["code"], "invalid_transition");
    }

    #[test]
    fn test_activity_feed_toggle_and_groups() {
        let value = call(mundofi_activity_feed, r#"{"filters":["all_accounts"],"toggle":"swaps"}"#);
        assert_eq!(value["success"], true, "{}", value);
        assert_eq!(value["data"]["filters"], serde_json::json!(["swaps"]));
        assert_eq!(value["data"]["chips"][0]["active"], false);
        assert_eq!(value["data"]["chips"][3]["active"], true);

        let groups = value["data"]["groups"].as_array().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0]["title"], "Today");
        assert_eq!(groups[0]["activities"][0]["title"], "BTC → USDC");

        let value = call(mundofi_activity_feed, r#"{"utcOffsetMinutes":100000}"#);
        assert_eq!(value["error"]["code"], "invalid_input");
    }

    #[test]
    fn test_trust_summary() {
        let out = mundofi_trust_summary();
        let json = unsafe { CStr::from_ptr(out) }.to_str().unwrap().to_string();
        mundofi_free_string(out);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["data"]["score"], 742);
        assert_eq!(value["data"]["bandLabel"], "Very Good");
    }
}
