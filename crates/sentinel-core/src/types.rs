//! Basic types for the feed: statuses, departments and risk buckets

use sentinel_config::ThresholdConfig;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Highest possible risk score
pub const MAX_RISK_SCORE: u8 = 100;

/// Scores above this are flagged
const FLAGGED_ABOVE: u8 = 60;
/// Scores above this (and not flagged) are pending review
const PENDING_ABOVE: u8 = 40;

/// Review status of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Waiting for manual review
    Pending,
    /// Flagged as high risk
    Flagged,
    /// Cleared automatically
    Cleared,
}

impl TransactionStatus {
    /// Derive the status from a risk score
    pub fn from_risk_score(score: u8) -> Self {
        if score > FLAGGED_ABOVE {
            TransactionStatus::Flagged
        } else if score > PENDING_ABOVE {
            TransactionStatus::Pending
        } else {
            TransactionStatus::Cleared
        }
    }

    pub fn all() -> [TransactionStatus; 3] {
        [
            TransactionStatus::Pending,
            TransactionStatus::Flagged,
            TransactionStatus::Cleared,
        ]
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(TransactionStatus::Pending),
            "flagged" => Ok(TransactionStatus::Flagged),
            "cleared" => Ok(TransactionStatus::Cleared),
            _ => Err(format!("Invalid transaction status: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Flagged => write!(f, "flagged"),
            TransactionStatus::Cleared => write!(f, "cleared"),
        }
    }
}

/// Department owning a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Department {
    Finance,
    Operations,
    Sales,
    Legal,
    #[serde(rename = "IT")]
    It,
    #[serde(rename = "HR")]
    Hr,
    Procurement,
    Marketing,
}

impl Department {
    pub fn all() -> [Department; 8] {
        [
            Department::Finance,
            Department::Operations,
            Department::Sales,
            Department::Legal,
            Department::It,
            Department::Hr,
            Department::Procurement,
            Department::Marketing,
        ]
    }
}

impl std::str::FromStr for Department {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "finance" => Ok(Department::Finance),
            "operations" | "ops" => Ok(Department::Operations),
            "sales" => Ok(Department::Sales),
            "legal" => Ok(Department::Legal),
            "it" => Ok(Department::It),
            "hr" => Ok(Department::Hr),
            "procurement" => Ok(Department::Procurement),
            "marketing" => Ok(Department::Marketing),
            _ => Err(format!("Invalid department: {}", s)),
        }
    }
}

impl std::fmt::Display for Department {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Department::Finance => write!(f, "Finance"),
            Department::Operations => write!(f, "Operations"),
            Department::Sales => write!(f, "Sales"),
            Department::Legal => write!(f, "Legal"),
            Department::It => write!(f, "IT"),
            Department::Hr => write!(f, "HR"),
            Department::Procurement => write!(f, "Procurement"),
            Department::Marketing => write!(f, "Marketing"),
        }
    }
}

/// Named risk bucket used for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn all() -> [RiskLevel; 3] {
        [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High]
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    /// Accepts bare names as well as display labels such as `High (61-100)`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.split_whitespace().next().unwrap_or_default();
        match name.to_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            _ => Err(format!("Invalid risk level: {}", s)),
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
        }
    }
}

/// Bucket boundaries over [0, 100].
///
/// Low is `0..medium_floor`, Medium is `medium_floor..high_floor`,
/// High is `high_floor..=100`. Construction guarantees all three are
/// non-empty and contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RiskBands {
    medium_floor: u8,
    high_floor: u8,
}

impl Default for RiskBands {
    fn default() -> Self {
        Self {
            medium_floor: 31,
            high_floor: 61,
        }
    }
}

impl RiskBands {
    /// Create bands from the lowest Medium and lowest High score
    pub fn new(medium_floor: u8, high_floor: u8) -> CoreResult<Self> {
        if medium_floor == 0 || medium_floor >= high_floor || high_floor > MAX_RISK_SCORE {
            return Err(CoreError::InvalidThresholds {
                medium: medium_floor,
                high: high_floor,
            });
        }
        Ok(Self {
            medium_floor,
            high_floor,
        })
    }

    /// Bands from the settings provider
    pub fn from_thresholds(thresholds: &ThresholdConfig) -> CoreResult<Self> {
        Self::new(thresholds.medium_risk_score, thresholds.high_risk_score)
    }

    /// The bucket a score falls into (scores above 100 count as High)
    pub fn level_for(&self, score: u8) -> RiskLevel {
        if score >= self.high_floor {
            RiskLevel::High
        } else if score >= self.medium_floor {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Inclusive score range covered by a bucket
    pub fn range(&self, level: RiskLevel) -> (u8, u8) {
        match level {
            RiskLevel::Low => (0, self.medium_floor - 1),
            RiskLevel::Medium => (self.medium_floor, self.high_floor - 1),
            RiskLevel::High => (self.high_floor, MAX_RISK_SCORE),
        }
    }

    /// Display label, e.g. `Medium (31-60)`
    pub fn label(&self, level: RiskLevel) -> String {
        let (low, high) = self.range(level);
        format!("{} ({}-{})", level, low, high)
    }
}
