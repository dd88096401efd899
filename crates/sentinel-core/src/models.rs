//! Core data models for the feed

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{Department, RiskBands, RiskLevel, TransactionStatus, MAX_RISK_SCORE};

/// A single transaction in the live feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Unique transaction identifier
    pub id: String,
    /// Display time (HH:MM:SS)
    pub timestamp: String,
    /// Counterparty name
    pub entity: String,
    /// Amount in whole dollars
    pub amount: u64,
    /// Risk score in 0..=100
    #[serde(deserialize_with = "saturating_score")]
    pub risk_score: u8,
    /// Review status derived from the risk score
    pub status: TransactionStatus,
    pub department: Department,
    /// Transaction category (wire transfer, invoice payment, ...)
    #[serde(rename = "type")]
    pub kind: String,
}

/// Read any integer score, saturating to the `u8` range so one bad row
/// gets clamped on ingestion instead of failing the whole document
fn saturating_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    Ok(raw.clamp(0, i64::from(u8::MAX)) as u8)
}

impl Transaction {
    /// Create a transaction, clamping the score and deriving the status
    pub fn new(
        id: impl Into<String>,
        timestamp: impl Into<String>,
        entity: impl Into<String>,
        amount: u64,
        risk_score: u8,
        department: Department,
        kind: impl Into<String>,
    ) -> Self {
        let risk_score = risk_score.min(MAX_RISK_SCORE);
        Self {
            id: id.into(),
            timestamp: timestamp.into(),
            entity: entity.into(),
            amount,
            risk_score,
            status: TransactionStatus::from_risk_score(risk_score),
            department,
            kind: kind.into(),
        }
    }

    /// Check the invariants a deserialized transaction may have broken
    pub fn validate(&self) -> CoreResult<()> {
        if self.id.trim().is_empty() {
            return Err(CoreError::InvalidTransaction {
                id: self.id.clone(),
                reason: "empty id".to_string(),
            });
        }
        if self.risk_score > MAX_RISK_SCORE {
            return Err(CoreError::InvalidTransaction {
                id: self.id.clone(),
                reason: format!("risk score {} is above {}", self.risk_score, MAX_RISK_SCORE),
            });
        }
        let expected = TransactionStatus::from_risk_score(self.risk_score);
        if self.status != expected {
            return Err(CoreError::InvalidTransaction {
                id: self.id.clone(),
                reason: format!(
                    "status {} does not match risk score {}",
                    self.status, self.risk_score
                ),
            });
        }
        Ok(())
    }

    /// Clamp the risk score and re-derive the status so downstream state
    /// never sees an out-of-range transaction
    pub fn sanitized(mut self) -> Self {
        if let Err(e) = self.validate() {
            log::warn!("Sanitizing transaction on ingestion: {}", e);
        }
        self.risk_score = self.risk_score.min(MAX_RISK_SCORE);
        self.status = TransactionStatus::from_risk_score(self.risk_score);
        self
    }

    /// Risk bucket of this transaction
    pub fn risk_level(&self, bands: &RiskBands) -> RiskLevel {
        bands.level_for(self.risk_score)
    }

    pub fn is_flagged(&self) -> bool {
        self.status == TransactionStatus::Flagged
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "{} {} {} {} risk={} {}",
            self.id,
            self.timestamp,
            self.entity,
            sentinel_utils::format_currency(self.amount),
            self.risk_score,
            self.status
        )
    }
}
