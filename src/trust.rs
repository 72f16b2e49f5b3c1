//! Trust score summary shown on the trust screen.
//!
//! The score and activities are fixed sample data; only the band and impact
//! tier logic is real.

use serde::{Deserialize, Serialize};

pub const MAX_SCORE: u16 = 850;

const SAMPLE_SCORE: u16 = 742;
const SAMPLE_MONTHLY_CHANGE: i16 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Excellent,
    VeryGood,
    Good,
    Fair,
    Poor,
}

impl ScoreBand {
    pub fn for_score(score: u16) -> Self {
        match score {
            800.. => ScoreBand::Excellent,
            740..=799 => ScoreBand::VeryGood,
            670..=739 => ScoreBand::Good,
            580..=669 => ScoreBand::Fair,
            _ => ScoreBand::Poor,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreBand::Excellent => "Excellent",
            ScoreBand::VeryGood => "Very Good",
            ScoreBand::Good => "Good",
            ScoreBand::Fair => "Fair",
            ScoreBand::Poor => "Poor",
        }
    }

    /// Range text for the legend; `Poor` is not listed there
    pub fn range(&self) -> &'static str {
        match self {
            ScoreBand::Excellent => "800-850",
            ScoreBand::VeryGood => "740-799",
            ScoreBand::Good => "670-739",
            ScoreBand::Fair => "580-669",
            ScoreBand::Poor => "300-579",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustActivityKind {
    Contribution,
    HoldingStreak,
    SwapEfficiency,
    PortfolioRisk,
    Consistency,
}

/// How strongly an activity moved the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactTier {
    High,
    Moderate,
    Low,
}

impl ImpactTier {
    pub fn for_impact(impact: i16) -> Self {
        if impact > 15 {
            ImpactTier::High
        } else if impact > 5 {
            ImpactTier::Moderate
        } else {
            ImpactTier::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustActivity {
    pub id: String,
    pub kind: TrustActivityKind,
    pub title: String,
    pub description: String,
    pub impact: i16,
    pub tier: ImpactTier,
    pub when: String,
}

impl TrustActivity {
    fn sample(id: &str, kind: TrustActivityKind, title: &str, description: &str, impact: i16, when: &str) -> Self {
        Self {
            id: id.to_string(),
            kind,
            title: title.to_string(),
            description: description.to_string(),
            impact,
            tier: ImpactTier::for_impact(impact),
            when: when.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustSummary {
    pub score: u16,
    pub max_score: u16,
    /// Rounded share of the maximum, for the progress ring
    pub percentage: u8,
    pub monthly_change: i16,
    pub band: ScoreBand,
    pub band_label: String,
    pub activities: Vec<TrustActivity>,
}

pub fn trust_summary() -> TrustSummary {
    let band = ScoreBand::for_score(SAMPLE_SCORE);
    TrustSummary {
        score: SAMPLE_SCORE,
        max_score: MAX_SCORE,
        percentage: score_percentage(SAMPLE_SCORE),
        monthly_change: SAMPLE_MONTHLY_CHANGE,
        band,
        band_label: band.label().to_string(),
        activities: sample_activities(),
    }
}

pub fn score_percentage(score: u16) -> u8 {
    let pct = (f64::from(score.min(MAX_SCORE)) / f64::from(MAX_SCORE) * 100.0).round();
    pct as u8
}

fn sample_activities() -> Vec<TrustActivity> {
    use TrustActivityKind::*;
    vec![
        TrustActivity::sample("1", Contribution, "Consistent Savings", "Regular contributions to goals for 3 months", 15, "2 days ago"),
        TrustActivity::sample("2", HoldingStreak, "Diamond Hands", "Held positions during 20% market dip", 8, "1 week ago"),
        TrustActivity::sample("3", SwapEfficiency, "Smart Swapping", "Optimal timing on DCA purchases", 5, "3 days ago"),
        TrustActivity::sample("4", PortfolioRisk, "Risk Management", "Balanced portfolio allocation (70/30 stable/growth)", 10, "1 week ago"),
        TrustActivity::sample("5", Consistency, "Goal Completion", "Successfully completed Emergency Fund goal", 25, "2 weeks ago"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries() {
        assert_eq!(ScoreBand::for_score(850), ScoreBand::Excellent);
        assert_eq!(ScoreBand::for_score(800), ScoreBand::Excellent);
        assert_eq!(ScoreBand::for_score(799), ScoreBand::VeryGood);
        assert_eq!(ScoreBand::for_score(740), ScoreBand::VeryGood);
        assert_eq!(ScoreBand::for_score(739), ScoreBand::Good);
        assert_eq!(ScoreBand::for_score(670), ScoreBand::Good);
        assert_eq!(ScoreBand::for_score(669), ScoreBand::Fair);
        assert_eq!(ScoreBand::for_score(580), ScoreBand::Fair);
        assert_eq!(ScoreBand::for_score(579), ScoreBand::Poor);
    }

    #[test]
    fn test_sample_summary() {
        let summary = trust_summary();
        assert_eq!(summary.score, 742);
        assert_eq!(summary.band_label, "Very Good");
        assert_eq!(summary.percentage, 87);
        assert_eq!(summary.monthly_change, 12);
        assert_eq!(summary.activities.len(), 5);
        assert_eq!(summary.activities[4].tier, ImpactTier::High);
        assert_eq!(summary.activities[1].tier, ImpactTier::Moderate);
        assert_eq!(summary.activities[2].tier, ImpactTier::Low);
    }
}
