//! Verdict shown on the summary page for the session's failure tally.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunchTier {
    Perfect,
    Few,
    Several,
    Many,
    Collector,
}

impl PunchTier {
    #[must_use]
    pub const fn for_tally(total_failures: u32) -> Self {
        match total_failures {
            0 => Self::Perfect,
            1..=3 => Self::Few,
            4..=6 => Self::Several,
            7..=9 => Self::Many,
            _ => Self::Collector,
        }
    }

    #[must_use]
    pub const fn headline(self) -> &'static str {
        match self {
            Self::Perfect => "Wow! You're actually good at this! 😮",
            Self::Few => "Not bad... but could be better! 😏",
            Self::Several => "Someone's getting a bit too many punches! 😅",
            Self::Many => "Are you trying to set a record or something? 😂",
            Self::Collector => "At this point, you're just collecting punches! 🥊",
        }
    }

    #[must_use]
    pub const fn remark(self) -> &'static str {
        match self {
            Self::Perfect => "Perfect score! You're officially a code-cracking genius! 🌟",
            Self::Few => "A few extra punches never hurt anyone... much! 😉",
            Self::Several => "Your arm must be getting tired from all these punches! 💪",
            Self::Many => "You're really testing my patience here! 😤",
            Self::Collector => "I hope you're proud of your punch collection! 🏆",
        }
    }

    #[must_use]
    pub const fn achievement_asset(self) -> &'static str {
        match self {
            Self::Perfect => "/gifs/achievement0.gif",
            _ => "/gifs/achievement.gif",
        }
    }
}

/// Everything the summary page renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryVerdict {
    pub total_failures: u32,
    pub tier: PunchTier,
    pub headline: String,
    pub remark: String,
    pub achievement_asset: String,
}

#[must_use]
pub fn summary_verdict(total_failures: u32) -> SummaryVerdict {
    let tier = PunchTier::for_tally(total_failures);
    SummaryVerdict {
        total_failures,
        tier,
        headline: tier.headline().to_string(),
        remark: tier.remark().to_string(),
        achievement_asset: tier.achievement_asset().to_string(),
    }
}
