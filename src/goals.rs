//! Savings Goals
//!
//! In-memory goal book behind the goals screens:
//! - Goal creation from a validated draft
//! - Partial updates, deletion and bulk replacement
//! - Applying a completed transfer to its goal
//!
//! Percentages are derived from the amounts and never exceed 100.

use crate::config::AppConfig;
use crate::error::{MundoError, MundoResult};
use crate::types::GoalRef;
use crate::wizard::keypad::{group_thousands, parse_amount};
use crate::wizard::TransferReceipt;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

const MODULE: &str = "goals";

pub const MAX_GOAL_NAME_LEN: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Completed,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub title: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub crypto_type: String,
    pub crypto_icon: String,
    pub wallet_id: String,
    pub target_date: Option<NaiveDate>,
    pub status: GoalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Goal detail shows a one-time success popup while set
    #[serde(default)]
    pub just_created: bool,
}

impl Goal {
    pub fn percentage(&self) -> f64 {
        percentage_of(self.current_amount, self.target_amount)
    }

    /// Snapshot handed to the transfer wizard
    pub fn to_ref(&self) -> GoalRef {
        GoalRef {
            id: self.id.clone(),
            title: self.title.clone(),
            target_amount: self.target_amount,
            current_amount: self.current_amount,
            percentage: self.percentage(),
            crypto_type: self.crypto_type.clone(),
            crypto_icon: self.crypto_icon.clone(),
        }
    }

    /// A goal nobody has funded yet
    pub fn is_new(&self) -> bool {
        self.current_amount == 0.0
    }
}

fn percentage_of(current: f64, target: f64) -> f64 {
    if target <= 0.0 {
        return 0.0;
    }
    (current / target * 100.0).clamp(0.0, 100.0)
}

// =============================================================================
// Draft
// =============================================================================

/// Create-goal form as typed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalDraft {
    pub name: String,
    /// Comma-formatted text from the amount field
    pub target_amount: String,
    pub asset_symbol: Option<String>,
    pub wallet_id: Option<String>,
    pub target_date: Option<NaiveDate>,
}

/// Draft that passed validation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidGoal {
    pub title: String,
    pub target_amount: f64,
    pub crypto_type: String,
    pub crypto_icon: String,
    pub wallet_id: String,
    pub target_date: Option<NaiveDate>,
}

impl GoalDraft {
    /// Check the rules in form order and report the first failure
    pub fn validate(&self, config: &AppConfig) -> MundoResult<ValidGoal> {
        let title = validate_goal_title(&self.name)?;

        let target_amount = match parse_amount(&self.target_amount) {
            Some(amount) if amount > 0.0 => amount,
            _ => return Err(MundoError::invalid_input("Please enter a valid target amount")),
        };

        let asset = self
            .asset_symbol
            .as_deref()
            .and_then(|symbol| config.find_asset(symbol))
            .ok_or_else(|| MundoError::invalid_input("Please select an asset to save in"))?;

        let wallet = self
            .wallet_id
            .as_deref()
            .and_then(|id| config.find_wallet(id))
            .ok_or_else(|| MundoError::invalid_input("Please select a wallet for this goal"))?;

        Ok(ValidGoal {
            title,
            target_amount,
            crypto_type: asset.symbol.clone(),
            crypto_icon: asset.icon.clone(),
            wallet_id: wallet.id.clone(),
            target_date: self.target_date,
        })
    }
}

/// Trimmed goal title, non-empty and at most [`MAX_GOAL_NAME_LEN`] characters
pub fn validate_goal_title(name: &str) -> MundoResult<String> {
    let title = name.trim();
    if title.is_empty() {
        return Err(MundoError::invalid_input("Please enter a goal name"));
    }
    if title.chars().count() > MAX_GOAL_NAME_LEN {
        return Err(MundoError::invalid_input("Goal name must be 50 characters or fewer"));
    }
    Ok(title.to_string())
}

/// Reformat the target-amount field as the user types: whole dollars with commas
pub fn format_target_input(text: &str) -> String {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    let trimmed = digits.trim_start_matches('0');

    if digits.is_empty() {
        String::new()
    } else if trimmed.is_empty() {
        "0".to_string()
    } else {
        group_thousands(trimmed)
    }
}

// =============================================================================
// Book
// =============================================================================

/// Fields a partial update may change
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalUpdate {
    pub title: Option<String>,
    pub target_amount: Option<f64>,
    pub current_amount: Option<f64>,
    pub target_date: Option<NaiveDate>,
    pub status: Option<GoalStatus>,
    pub just_created: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct GoalBook {
    goals: Vec<Goal>,
}

impl GoalBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn get(&self, goal_id: &str) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == goal_id)
    }

    pub fn set_goals(&mut self, goals: Vec<Goal>) {
        self.goals = goals;
    }

    pub fn add_goal(&mut self, goal: Goal) {
        self.goals.push(goal);
    }

    /// Validate a draft and add the resulting goal
    pub fn create_goal(&mut self, draft: &GoalDraft, config: &AppConfig) -> MundoResult<Goal> {
        let valid = draft.validate(config)?;
        let now = Utc::now();

        let goal = Goal {
            id: self.next_id(now),
            title: valid.title,
            target_amount: valid.target_amount,
            current_amount: 0.0,
            crypto_type: valid.crypto_type,
            crypto_icon: valid.crypto_icon,
            wallet_id: valid.wallet_id,
            target_date: valid.target_date,
            status: GoalStatus::Active,
            created_at: now,
            updated_at: now,
            just_created: true,
        };

        crate::log_info!(MODULE, "Goal created", goal_id = goal.id, target = goal.target_amount);
        self.goals.push(goal.clone());
        Ok(goal)
    }

    pub fn update_goal(&mut self, goal_id: &str, update: GoalUpdate) -> MundoResult<&Goal> {
        let title = update.title.as_deref().map(validate_goal_title).transpose()?;
        if let Some(target) = update.target_amount {
            if !target.is_finite() || target <= 0.0 {
                return Err(MundoError::invalid_input("Target amount must be positive"));
            }
        }
        let goal = self.find_mut(goal_id)?;

        if let Some(title) = title {
            goal.title = title;
        }
        if let Some(target) = update.target_amount {
            goal.target_amount = target;
        }
        if let Some(current) = update.current_amount {
            goal.current_amount = current.max(0.0);
        }
        if update.target_date.is_some() {
            goal.target_date = update.target_date;
        }
        if let Some(status) = update.status {
            goal.status = status;
        }
        if let Some(flag) = update.just_created {
            goal.just_created = flag;
        }
        goal.updated_at = Utc::now();
        Ok(&*goal)
    }

    /// Returns false when no goal had that id
    pub fn delete_goal(&mut self, goal_id: &str) -> bool {
        let before = self.goals.len();
        self.goals.retain(|g| g.id != goal_id);
        self.goals.len() != before
    }

    /// Add a deposit to a goal; reaching the target completes it
    pub fn apply_deposit(&mut self, goal_id: &str, amount: f64) -> MundoResult<&Goal> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(MundoError::invalid_input("Deposit must be positive"));
        }

        let goal = self.find_mut(goal_id)?;
        goal.current_amount += amount;
        goal.just_created = false;
        if goal.current_amount >= goal.target_amount {
            goal.status = GoalStatus::Completed;
        }
        goal.updated_at = Utc::now();

        crate::log_info!(
            MODULE,
            "Deposit applied",
            goal_id = goal.id,
            amount = amount,
            percentage = format!("{:.1}", goal.percentage()),
        );
        Ok(&*goal)
    }

    /// Apply what a finished transfer wizard returned
    pub fn apply_receipt(&mut self, receipt: &TransferReceipt) -> MundoResult<&Goal> {
        self.apply_deposit(&receipt.goal_id, receipt.amount)
    }

    fn find_mut(&mut self, goal_id: &str) -> MundoResult<&mut Goal> {
        self.goals
            .iter_mut()
            .find(|g| g.id == goal_id)
            .ok_or_else(|| MundoError::not_found(format!("Goal not found: {}", goal_id)))
    }

    /// Millisecond timestamp, bumped past any id already taken
    fn next_id(&self, now: DateTime<Utc>) -> String {
        let mut candidate = now.timestamp_millis();
        while self.get(&candidate.to_string()).is_some() {
            candidate += 1;
        }
        candidate.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn draft() -> GoalDraft {
        GoalDraft {
            name: " Emergency Fund ".to_string(),
            target_amount: "1,000".to_string(),
            asset_symbol: Some("USDC".to_string()),
            wallet_id: Some("1".to_string()),
            target_date: None,
        }
    }

    #[test]
    fn test_create_goal() {
        let mut book = GoalBook::new();
        let goal = book.create_goal(&draft(), &AppConfig::standard()).unwrap();
        assert_eq!(goal.title, "Emergency Fund");
        assert_eq!(goal.target_amount, 1000.0);
        assert_eq!(goal.crypto_icon, "$");
        assert!(goal.just_created);
        assert!(goal.is_new());
        assert_eq!(book.goals().len(), 1);
    }

    #[test]
    fn test_validation_order() {
        let config = AppConfig::standard();
        let mut d = GoalDraft::default();
        assert_eq!(d.validate(&config).unwrap_err().message, "Please enter a goal name");

        d.name = "Trip".to_string();
        assert_eq!(d.validate(&config).unwrap_err().message, "Please enter a valid target amount");

        d.target_amount = "0".to_string();
        assert_eq!(d.validate(&config).unwrap_err().message, "Please enter a valid target amount");

        d.target_amount = "500".to_string();
        assert_eq!(d.validate(&config).unwrap_err().message, "Please select an asset to save in");

        d.asset_symbol = Some("ETH".to_string());
        let err = d.validate(&config).unwrap_err();
        assert_eq!(err.message, "Please select a wallet for this goal");
        assert_eq!(err.code, ErrorCode::InvalidInput);

        d.wallet_id = Some("3".to_string());
        assert!(d.validate(&config).is_ok());

        d.name = "x".repeat(51);
        assert!(d.validate(&config).is_err());
    }

    #[test]
    fn test_deposit_recomputes_percentage() {
        let mut book = GoalBook::new();
        let id = book.create_goal(&draft(), &AppConfig::standard()).unwrap().id;

        let goal = book.apply_deposit(&id, 250.0).unwrap();
        assert_eq!(goal.current_amount, 250.0);
        assert_eq!(goal.percentage(), 25.0);
        assert_eq!(goal.status, GoalStatus::Active);
        assert!(!goal.just_created);

        let goal = book.apply_deposit(&id, 1000.0).unwrap();
        assert_eq!(goal.percentage(), 100.0);
        assert_eq!(goal.status, GoalStatus::Completed);
        assert_eq!(goal.to_ref().percentage, 100.0);
    }

    #[test]
    fn test_apply_receipt() {
        let mut book = GoalBook::new();
        let id = book.create_goal(&draft(), &AppConfig::standard()).unwrap().id;
        let receipt = TransferReceipt {
            amount: 50.0,
            goal_id: id.clone(),
            wallet_id: "2".to_string(),
        };
        assert_eq!(book.apply_receipt(&receipt).unwrap().current_amount, 50.0);

        let missing = TransferReceipt { goal_id: "nope".to_string(), ..receipt };
        assert_eq!(book.apply_receipt(&missing).unwrap_err().code, ErrorCode::NotFound);
    }

    #[test]
    fn test_update_and_delete() {
        let mut book = GoalBook::new();
        let id = book.create_goal(&draft(), &AppConfig::standard()).unwrap().id;

        let update = GoalUpdate {
            title: Some("Rainy Day".to_string()),
            status: Some(GoalStatus::Paused),
            ..Default::default()
        };
        let goal = book.update_goal(&id, update).unwrap();
        assert_eq!(goal.title, "Rainy Day");
        assert_eq!(goal.status, GoalStatus::Paused);

        let bad = GoalUpdate { target_amount: Some(0.0), ..Default::default() };
        assert!(book.update_goal(&id, bad).is_err());

        assert!(book.delete_goal(&id));
        assert!(!book.delete_goal(&id));
    }

    #[test]
    fn test_update_title_follows_form_rules() {
        let mut book = GoalBook::new();
        let id = book.create_goal(&draft(), &AppConfig::standard()).unwrap().id;

        let blank = GoalUpdate { title: Some("   ".to_string()), ..Default::default() };
        let err = book.update_goal(&id, blank).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert_eq!(err.message, "Please enter a goal name");

        let long = GoalUpdate {
            title: Some("x".repeat(MAX_GOAL_NAME_LEN + 1)),
            status: Some(GoalStatus::Paused),
            ..Default::default()
        };
        let err = book.update_goal(&id, long).unwrap_err();
        assert_eq!(err.message, "Goal name must be 50 characters or fewer");

        let goal = book.get(&id).unwrap();
        assert_eq!(goal.title, "Emergency Fund");
        assert_eq!(goal.status, GoalStatus::Active);

        let padded = GoalUpdate { title: Some("  Rainy Day ".to_string()), ..Default::default() };
        assert_eq!(book.update_goal(&id, padded).unwrap().title, "Rainy Day");
    }

    #[test]
    fn test_ids_are_unique() {
        let mut book = GoalBook::new();
        let a = book.create_goal(&draft(), &AppConfig::standard()).unwrap().id;
        let b = book.create_goal(&draft(), &AppConfig::standard()).unwrap().id;
        assert_ne!(a, b);
    }

    #[test]
    fn test_format_target_input() {
        assert_eq!(format_target_input(""), "");
        assert_eq!(format_target_input("$ 1234567"), "1,234,567");
        assert_eq!(format_target_input("00012"), "12");
        assert_eq!(format_target_input("12.50"), "1,250");
    }
}
