//! Activity Feed
//!
//! Account history for the activity screen:
//! - case-insensitive title search
//! - filter chips, where "All Accounts" excludes every other chip
//! - day buckets: "Today", "Yesterday", then "Month D" (newest first)
//!
//! Grouping takes `today` and the viewer's UTC offset as arguments so the
//! day boundaries can be tested without a clock.

use crate::goals::{Goal, GoalStatus};
use crate::wizard::TransferReceipt;
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const MODULE: &str = "activity";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Deposit,
    Withdrawal,
    GoalCompleted,
    Swap,
    TransferIn,
    TransferOut,
    TrustUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Completed,
    Processing,
    Cancelled,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub kind: ActivityKind,
    pub title: String,
    pub subtitle: String,
    /// Signed; outflows are negative. Absent for non-monetary events.
    pub amount: Option<f64>,
    pub status: ActivityStatus,
    pub date: DateTime<Utc>,
    pub icon: String,
}

impl Activity {
    #[allow(clippy::too_many_arguments)]
    fn sample(
        id: &str,
        kind: ActivityKind,
        title: &str,
        subtitle: &str,
        amount: Option<f64>,
        status: ActivityStatus,
        date: DateTime<Utc>,
        icon: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            kind,
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            amount,
            status,
            date,
            icon: icon.to_string(),
        }
    }

    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim();
        query.is_empty() || self.title.to_lowercase().contains(&query.to_lowercase())
    }
}

// =============================================================================
// Filters
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityFilter {
    AllAccounts,
    Deposits,
    Goals,
    Swaps,
    Completed,
    Processing,
}

impl ActivityFilter {
    /// Chip order on screen
    pub const ALL: [ActivityFilter; 6] = [
        ActivityFilter::AllAccounts,
        ActivityFilter::Deposits,
        ActivityFilter::Goals,
        ActivityFilter::Swaps,
        ActivityFilter::Completed,
        ActivityFilter::Processing,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ActivityFilter::AllAccounts => "All Accounts",
            ActivityFilter::Deposits => "Deposits",
            ActivityFilter::Goals => "Goals",
            ActivityFilter::Swaps => "Swaps",
            ActivityFilter::Completed => "Completed",
            ActivityFilter::Processing => "Processing",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityFilter::AllAccounts => "all_accounts",
            ActivityFilter::Deposits => "deposits",
            ActivityFilter::Goals => "goals",
            ActivityFilter::Swaps => "swaps",
            ActivityFilter::Completed => "completed",
            ActivityFilter::Processing => "processing",
        }
    }

    fn is_status(&self) -> bool {
        matches!(self, ActivityFilter::Completed | ActivityFilter::Processing)
    }

    fn matches(&self, activity: &Activity) -> bool {
        use ActivityKind::*;
        match self {
            ActivityFilter::AllAccounts => true,
            ActivityFilter::Deposits => matches!(activity.kind, Deposit | TransferIn),
            ActivityFilter::Goals => matches!(activity.kind, Deposit | GoalCompleted),
            ActivityFilter::Swaps => activity.kind == Swap,
            ActivityFilter::Completed => activity.status == ActivityStatus::Completed,
            ActivityFilter::Processing => {
                matches!(activity.status, ActivityStatus::Processing | ActivityStatus::Pending)
            }
        }
    }
}

impl std::str::FromStr for ActivityFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        ActivityFilter::ALL
            .into_iter()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| format!("Unknown activity filter: {}", s))
    }
}

/// Selected filter chips. Never empty: clearing the last chip falls back to
/// "All Accounts".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FilterSelection(Vec<ActivityFilter>);

impl Default for FilterSelection {
    fn default() -> Self {
        Self(vec![ActivityFilter::AllAccounts])
    }
}

impl FilterSelection {
    /// Normalize a selection coming from the UI
    pub fn new(filters: impl IntoIterator<Item = ActivityFilter>) -> Self {
        let mut selected = Vec::new();
        for filter in filters {
            if filter == ActivityFilter::AllAccounts {
                return Self::default();
            }
            if !selected.contains(&filter) {
                selected.push(filter);
            }
        }
        if selected.is_empty() {
            return Self::default();
        }
        Self(selected)
    }

    pub fn filters(&self) -> &[ActivityFilter] {
        &self.0
    }

    pub fn is_all(&self) -> bool {
        self.0 == [ActivityFilter::AllAccounts]
    }

    /// Tap a chip. "All Accounts" replaces the selection; any other chip
    /// drops "All Accounts" and flips its own membership.
    pub fn toggle(&mut self, filter: ActivityFilter) {
        if filter == ActivityFilter::AllAccounts {
            *self = Self::default();
            return;
        }

        self.0.retain(|f| *f != ActivityFilter::AllAccounts);
        if let Some(pos) = self.0.iter().position(|f| *f == filter) {
            self.0.remove(pos);
        } else {
            self.0.push(filter);
        }
        if self.0.is_empty() {
            *self = Self::default();
        }
    }

    /// Type chips are OR-ed, status chips are OR-ed, and the two groups AND-ed
    pub fn matches(&self, activity: &Activity) -> bool {
        if self.is_all() {
            return true;
        }
        let (status, kind): (Vec<_>, Vec<_>) = self.0.iter().partition(|f| f.is_status());
        let any = |group: &[&ActivityFilter]| group.is_empty() || group.iter().any(|f| f.matches(activity));
        any(kind.as_slice()) && any(status.as_slice())
    }
}

// =============================================================================
// Grouping
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityGroup {
    pub title: String,
    pub date: NaiveDate,
    pub activities: Vec<Activity>,
}

/// Bucket by calendar day in `offset`. Today and Yesterday come first, other
/// days follow newest first; entries inside a bucket are newest first.
pub fn group_by_date(
    activities: impl IntoIterator<Item = Activity>,
    today: NaiveDate,
    offset: FixedOffset,
) -> Vec<ActivityGroup> {
    let mut days: BTreeMap<NaiveDate, Vec<Activity>> = BTreeMap::new();
    for activity in activities {
        let day = activity.date.with_timezone(&offset).date_naive();
        days.entry(day).or_default().push(activity);
    }

    let yesterday = today - Duration::days(1);
    let mut groups: Vec<ActivityGroup> = days
        .into_iter()
        .rev()
        .map(|(day, mut activities)| {
            activities.sort_by(|a, b| b.date.cmp(&a.date));
            ActivityGroup {
                title: day_label(day, today),
                date: day,
                activities,
            }
        })
        .collect();

    groups.sort_by_key(|g| {
        if g.date == today {
            0
        } else if g.date == yesterday {
            1
        } else {
            2
        }
    });
    groups
}

/// "Today", "Yesterday", "October 4", or "October 4, 2025" outside the current year
pub fn day_label(day: NaiveDate, today: NaiveDate) -> String {
    if day == today {
        "Today".to_string()
    } else if Some(day) == today.pred_opt() {
        "Yesterday".to_string()
    } else if day.year() == today.year() {
        day.format("%B %-d").to_string()
    } else {
        day.format("%B %-d, %Y").to_string()
    }
}

// =============================================================================
// Feed
// =============================================================================

/// Search text and chips as currently set on screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityQuery {
    pub search: String,
    pub filters: FilterSelection,
}

#[derive(Debug, Clone, Default)]
pub struct ActivityFeed {
    activities: Vec<Activity>,
}

impl ActivityFeed {
    pub fn new(activities: Vec<Activity>) -> Self {
        Self { activities }
    }

    /// Demo history relative to `now`: two entries today, three yesterday,
    /// two from fifteen days ago
    pub fn sample(now: DateTime<Utc>) -> Self {
        use ActivityKind::*;
        use ActivityStatus::*;
        let yesterday = now - Duration::days(1);
        let fortnight = now - Duration::days(15);
        Self::new(vec![
            Activity::sample("1", Deposit, "Emergency Fund", "Goal deposit", Some(250.0), Processing, now, "🏦"),
            Activity::sample("2", Swap, "BTC → USDC", "Crypto swap", Some(-0.01), Completed, now, "🔄"),
            Activity::sample("3", TransferOut, "Rent Payment", "External transfer", Some(-1200.0), Cancelled, yesterday, "🏠"),
            Activity::sample("4", GoalCompleted, "Vacation Fund", "Goal completed", Some(2500.0), Completed, yesterday, "🏆"),
            Activity::sample("5", Deposit, "Car Savings", "Goal deposit", Some(300.0), Completed, yesterday, "🚗"),
            Activity::sample("6", TrustUpdate, "Trust Score Update", "Monthly calculation", None, Completed, fortnight, "🛡️"),
            Activity::sample("7", TransferIn, "Salary Deposit", "Bank transfer", Some(3500.0), Completed, fortnight, "💼"),
        ])
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn push(&mut self, activity: Activity) {
        self.activities.push(activity);
    }

    /// Log a finished transfer against the goal it funded. A deposit that
    /// completes the goal also logs the completion.
    pub fn record_deposit(&mut self, receipt: &TransferReceipt, goal: &Goal, at: DateTime<Utc>) {
        let id = self.next_id(at);
        self.activities.push(Activity {
            id,
            kind: ActivityKind::Deposit,
            title: goal.title.clone(),
            subtitle: "Goal deposit".to_string(),
            amount: Some(receipt.amount),
            status: ActivityStatus::Processing,
            date: at,
            icon: goal.crypto_icon.clone(),
        });

        if goal.status == GoalStatus::Completed {
            let id = self.next_id(at);
            self.activities.push(Activity {
                id,
                kind: ActivityKind::GoalCompleted,
                title: goal.title.clone(),
                subtitle: "Goal completed".to_string(),
                amount: Some(goal.current_amount),
                status: ActivityStatus::Completed,
                date: at,
                icon: "🏆".to_string(),
            });
        }

        crate::log_debug!(MODULE, "Deposit recorded", goal_id = goal.id, amount = receipt.amount);
    }

    /// Search, filter and group for display
    pub fn query(&self, query: &ActivityQuery, today: NaiveDate, offset: FixedOffset) -> Vec<ActivityGroup> {
        let visible = self
            .activities
            .iter()
            .filter(|a| a.matches_search(&query.search) && query.filters.matches(a))
            .cloned();
        group_by_date(visible, today, offset)
    }

    fn next_id(&self, at: DateTime<Utc>) -> String {
        let mut candidate = at.timestamp_millis();
        while self.activities.iter().any(|a| a.id == candidate.to_string()) {
            candidate += 1;
        }
        candidate.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn entry(id: &str, date: DateTime<Utc>) -> Activity {
        Activity::sample(id, ActivityKind::Deposit, id, "Goal deposit", Some(1.0), ActivityStatus::Completed, date, "$")
    }

    fn titles(groups: &[ActivityGroup]) -> Vec<&str> {
        groups.iter().map(|g| g.title.as_str()).collect()
    }

    #[test]
    fn test_day_boundaries() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let groups = group_by_date(
            vec![
                entry("midnight", at(2026, 10, 19, 0, 0)),
                entry("last-minute-yesterday", at(2026, 10, 18, 23, 59)),
                entry("start-of-yesterday", at(2026, 10, 18, 0, 0)),
                entry("two-days", at(2026, 10, 17, 23, 59)),
            ],
            today,
            utc(),
        );

        assert_eq!(titles(&groups), vec!["Today", "Yesterday", "October 17"]);
        assert_eq!(groups[0].activities[0].id, "midnight");
        let yesterday: Vec<_> = groups[1].activities.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(yesterday, vec!["last-minute-yesterday", "start-of-yesterday"]);
    }

    #[test]
    fn test_offset_moves_day_boundary() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        // 02:00 UTC on the 19th is still the 18th five hours west
        let activity = entry("late", at(2026, 10, 19, 2, 0));
        let west = FixedOffset::west_opt(5 * 3600).unwrap();

        assert_eq!(titles(&group_by_date(vec![activity.clone()], today, utc())), vec!["Today"]);
        assert_eq!(titles(&group_by_date(vec![activity], today, west)), vec!["Yesterday"]);
    }

    #[test]
    fn test_today_and_yesterday_pinned_before_other_days() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let groups = group_by_date(
            vec![
                entry("old", at(2026, 9, 1, 12, 0)),
                entry("future", at(2026, 10, 25, 12, 0)),
                entry("yesterday", at(2026, 10, 18, 12, 0)),
                entry("recent", at(2026, 10, 10, 12, 0)),
                entry("today", at(2026, 10, 19, 9, 0)),
                entry("last-year", at(2025, 12, 31, 12, 0)),
            ],
            today,
            utc(),
        );

        assert_eq!(
            titles(&groups),
            vec!["Today", "Yesterday", "October 25", "October 10", "September 1", "December 31, 2025"]
        );
    }

    #[test]
    fn test_year_start_yesterday() {
        let today = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        let groups = group_by_date(vec![entry("nye", at(2026, 12, 31, 22, 0))], today, utc());
        assert_eq!(titles(&groups), vec!["Yesterday"]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let feed = ActivityFeed::sample(at(2026, 10, 19, 12, 0));
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let query = ActivityQuery {
            search: "  fund ".to_string(),
            ..Default::default()
        };

        let groups = feed.query(&query, today, utc());
        let found: Vec<_> = groups.iter().flat_map(|g| g.activities.iter().map(|a| a.title.as_str())).collect();
        assert_eq!(found, vec!["Emergency Fund", "Vacation Fund"]);
    }

    #[test]
    fn test_toggle_all_accounts_is_exclusive() {
        let mut selection = FilterSelection::default();
        selection.toggle(ActivityFilter::Deposits);
        assert_eq!(selection.filters(), &[ActivityFilter::Deposits]);

        selection.toggle(ActivityFilter::Completed);
        assert_eq!(selection.filters(), &[ActivityFilter::Deposits, ActivityFilter::Completed]);

        selection.toggle(ActivityFilter::AllAccounts);
        assert!(selection.is_all());

        selection.toggle(ActivityFilter::Swaps);
        selection.toggle(ActivityFilter::Swaps);
        assert!(selection.is_all());

        let normalized = FilterSelection::new([ActivityFilter::Goals, ActivityFilter::AllAccounts]);
        assert!(normalized.is_all());
    }

    #[test]
    fn test_filter_from_str() {
        assert_eq!("all-accounts".parse::<ActivityFilter>(), Ok(ActivityFilter::AllAccounts));
        assert_eq!(" Deposits".parse::<ActivityFilter>(), Ok(ActivityFilter::Deposits));
        assert!("withdrawals".parse::<ActivityFilter>().is_err());
    }

    #[test]
    fn test_filters_combine_kind_and_status() {
        let feed = ActivityFeed::sample(at(2026, 10, 19, 12, 0));
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

        let ids = |filters: &[ActivityFilter]| -> Vec<String> {
            let query = ActivityQuery {
                search: String::new(),
                filters: FilterSelection::new(filters.iter().copied()),
            };
            let mut ids: Vec<String> = feed
                .query(&query, today, utc())
                .into_iter()
                .flat_map(|g| g.activities.into_iter().map(|a| a.id))
                .collect();
            ids.sort();
            ids
        };

        assert_eq!(ids(&[ActivityFilter::Deposits]), vec!["1", "5", "7"]);
        assert_eq!(ids(&[ActivityFilter::Swaps]), vec!["2"]);
        assert_eq!(ids(&[ActivityFilter::Deposits, ActivityFilter::Completed]), vec!["5", "7"]);
        assert_eq!(ids(&[ActivityFilter::Goals, ActivityFilter::Swaps]), vec!["1", "2", "4", "5"]);
        assert_eq!(ids(&[ActivityFilter::Processing]), vec!["1"]);
        assert_eq!(ids(&[]).len(), 7);
    }

    #[test]
    fn test_sample_groups() {
        let now = at(2026, 10, 19, 12, 0);
        let feed = ActivityFeed::sample(now);
        let groups = feed.query(&ActivityQuery::default(), now.date_naive(), utc());
        assert_eq!(titles(&groups), vec!["Today", "Yesterday", "October 4"]);
        assert_eq!(groups[1].activities.len(), 3);
    }

    #[test]
    fn test_record_deposit_logs_completion() {
        use crate::config::AppConfig;
        use crate::goals::{GoalBook, GoalDraft};

        let mut book = GoalBook::new();
        let goal_id = book
            .create_goal(
                &GoalDraft {
                    name: "Bike".to_string(),
                    target_amount: "100".to_string(),
                    asset_symbol: Some("USDC".to_string()),
                    wallet_id: Some("1".to_string()),
                    target_date: None,
                },
                &AppConfig::standard(),
            )
            .unwrap()
            .id;
        let receipt = TransferReceipt {
            amount: 100.0,
            goal_id,
            wallet_id: "1".to_string(),
        };
        let goal = book.apply_receipt(&receipt).unwrap().clone();

        let mut feed = ActivityFeed::default();
        let now = at(2026, 10, 19, 12, 0);
        feed.record_deposit(&receipt, &goal, now);

        let kinds: Vec<_> = feed.activities().iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![ActivityKind::Deposit, ActivityKind::GoalCompleted]);
        assert_ne!(feed.activities()[0].id, feed.activities()[1].id);
        assert_eq!(feed.activities()[0].status, ActivityStatus::Processing);
    }
}
