//! Transaction sources feeding the live window

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Local, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use sentinel_config::{SourceConfig, SourceKind};
use std::collections::VecDeque;
use std::path::Path;

use crate::error::{CoreError, CoreResult, DefaultErrorLogger, ErrorContext, ErrorLogger};
use crate::models::Transaction;
use crate::types::Department;

/// Ordered, append-only supply of transactions
#[async_trait]
pub trait TransactionSource: Send {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Transactions shown when the feed starts, newest first
    async fn initial_batch(&mut self, count: usize) -> CoreResult<Vec<Transaction>>;

    /// The next arriving transaction, or `None` once the source ran dry
    async fn next_transaction(&mut self) -> CoreResult<Option<Transaction>>;
}

/// Boxed source reference
pub type SourceRef = Box<dyn TransactionSource>;

/// Build the source described by the configuration
pub async fn from_config(config: &SourceConfig) -> CoreResult<SourceRef> {
    match config.kind {
        SourceKind::Mock => Ok(Box::new(MockGenerator::new(config.seed, config.pool_size))),
        SourceKind::Replay => {
            let path = config.path.as_ref().ok_or_else(|| CoreError::ConfigError {
                message: "source.path is required for replay sources".to_string(),
            })?;
            Ok(Box::new(ReplaySource::from_file(path).await?))
        }
    }
}

// ==================== Mock generator ====================

const ENTITIES: [&str; 15] = [
    "Acme Corporation",
    "GlobalTech Solutions",
    "Sterling Industries",
    "Nexus Dynamics",
    "Vertex Partners",
    "Omega Holdings",
    "Pinnacle Group",
    "Quantum Systems",
    "Atlas Ventures",
    "Cipher Technologies",
    "Meridian Capital",
    "Horizon Enterprises",
    "Vanguard Associates",
    "Summit Consulting",
    "Eclipse Financial",
];

const DEPARTMENTS: [Department; 7] = [
    Department::Finance,
    Department::Operations,
    Department::Sales,
    Department::Legal,
    Department::It,
    Department::Hr,
    Department::Procurement,
];

const TRANSACTION_TYPES: [&str; 7] = [
    "Wire Transfer",
    "Invoice Payment",
    "Vendor Settlement",
    "Expense Reimbursement",
    "Capital Expenditure",
    "Service Fee",
    "Consulting Payment",
];

/// Seconds between the timestamps of the initial batch
const INITIAL_SPACING_SECS: i64 = 45;

/// Random demo transactions.
///
/// Amounts: 50% $1K-$10K, 30% $10K-$100K, 15% $100K-$1M, 5% $1M-$6M.
/// Risk: 70% low (5-39), 20% medium (40-69), 10% high (70-99).
pub struct MockGenerator {
    rng: StdRng,
    /// Transactions left before the generator runs dry; `None` = unlimited
    remaining: Option<usize>,
    sequence: u64,
}

impl MockGenerator {
    /// A `pool_size` of 0 never runs dry; a seed makes the output reproducible
    pub fn new(seed: Option<u64>, pool_size: usize) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            remaining: (pool_size > 0).then_some(pool_size),
            sequence: 0,
        }
    }

    fn take_slot(&mut self) -> bool {
        match &mut self.remaining {
            None => true,
            Some(0) => false,
            Some(left) => {
                *left -= 1;
                true
            }
        }
    }

    fn amount(&mut self) -> u64 {
        let tier: f64 = self.rng.gen();
        if tier > 0.95 {
            self.rng.gen_range(1_000_000..6_000_000)
        } else if tier > 0.8 {
            self.rng.gen_range(100_000..1_000_000)
        } else if tier > 0.5 {
            self.rng.gen_range(10_000..100_000)
        } else {
            self.rng.gen_range(1_000..10_000)
        }
    }

    fn risk_score(&mut self) -> u8 {
        let tier: f64 = self.rng.gen();
        if tier > 0.9 {
            self.rng.gen_range(70..100)
        } else if tier > 0.7 {
            self.rng.gen_range(40..70)
        } else {
            self.rng.gen_range(5..40)
        }
    }

    fn generate(&mut self, timestamp: String) -> Transaction {
        let sequence = self.sequence;
        self.sequence += 1;

        let millis = Utc::now().timestamp_millis().rem_euclid(100_000_000);
        let id = format!("TXN-{:08}-{:04}", millis, sequence);
        let amount = self.amount();
        let risk_score = self.risk_score();
        let entity = ENTITIES.choose(&mut self.rng).copied().unwrap_or(ENTITIES[0]);
        let department = DEPARTMENTS.choose(&mut self.rng).copied().unwrap_or(Department::Finance);
        let kind = TRANSACTION_TYPES.choose(&mut self.rng).copied().unwrap_or(TRANSACTION_TYPES[0]);

        Transaction::new(id, timestamp, entity, amount, risk_score, department, kind)
    }
}

#[async_trait]
impl TransactionSource for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn initial_batch(&mut self, count: usize) -> CoreResult<Vec<Transaction>> {
        let now = Local::now();
        let mut batch = Vec::with_capacity(count);
        for offset in 0..count {
            if !self.take_slot() {
                break;
            }
            let at = now - ChronoDuration::seconds(offset as i64 * INITIAL_SPACING_SECS);
            let timestamp = sentinel_utils::format_clock(&at);
            batch.push(self.generate(timestamp));
        }
        Ok(batch)
    }

    async fn next_transaction(&mut self) -> CoreResult<Option<Transaction>> {
        if !self.take_slot() {
            return Ok(None);
        }
        let timestamp = sentinel_utils::format_clock(&Local::now());
        Ok(Some(self.generate(timestamp)))
    }
}

// ==================== Replay ====================

/// Replays a fixed list of transactions in order.
///
/// Rows without an id cannot be tracked by the feed; they are skipped and
/// reported as [`CoreError::SourceError`].
pub struct ReplaySource {
    pending: VecDeque<Transaction>,
    served: usize,
}

impl ReplaySource {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self {
            pending: transactions.into(),
            served: 0,
        }
    }

    /// Load a JSON array of transactions
    pub async fn from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(CoreError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = tokio::fs::read_to_string(path).await?;
        let source = Self::from_json(&content)?;
        log::info!("Loaded {} transactions from {}", source.remaining(), path.display());
        Ok(source)
    }

    pub fn from_json(content: &str) -> CoreResult<Self> {
        let transactions: Vec<Transaction> = serde_json::from_str(content)?;
        let logger = DefaultErrorLogger;
        for (position, tx) in transactions.iter().enumerate() {
            if let Err(e) = tx.validate() {
                let context = ErrorContext::new("load_replay")
                    .with_data("position", serde_json::json!(position));
                logger.log_warning(&e.to_string(), &context);
            }
        }
        Ok(Self::new(transactions))
    }

    /// Transactions not yet handed out
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    fn take(&mut self) -> Option<CoreResult<Transaction>> {
        let transaction = self.pending.pop_front()?;
        let position = self.served;
        self.served += 1;
        if transaction.id.trim().is_empty() {
            return Some(Err(CoreError::SourceError {
                message: format!("replay row {} has no id", position),
            }));
        }
        Some(Ok(transaction))
    }
}

#[async_trait]
impl TransactionSource for ReplaySource {
    fn name(&self) -> &str {
        "replay"
    }

    async fn initial_batch(&mut self, count: usize) -> CoreResult<Vec<Transaction>> {
        let logger = DefaultErrorLogger;
        let mut batch = Vec::with_capacity(count.min(self.pending.len()));
        while batch.len() < count {
            match self.take() {
                Some(Ok(transaction)) => batch.push(transaction),
                Some(Err(e)) => logger.log_error(&e, &ErrorContext::new("initial_batch")),
                None => break,
            }
        }
        Ok(batch)
    }

    async fn next_transaction(&mut self) -> CoreResult<Option<Transaction>> {
        self.take().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionStatus;
    use std::collections::HashSet;

    fn replay_json() -> &'static str {
        r#"[
            {"id": "txn_8921_uk", "timestamp": "10:48:22", "entity": "Barclays Intl. Settlement",
             "amount": 14500000, "riskScore": 12, "status": "cleared", "department": "Finance",
             "type": "Interbank Transfer"},
            {"id": "txn_9921_aml", "timestamp": "10:46:58", "entity": "Shell Entity #892 (Cyprus)",
             "amount": 480000, "riskScore": 94, "status": "flagged", "department": "Legal",
             "type": "High-Risk Withdrawal"},
            {"id": "txn_3321_pci", "timestamp": "10:42:10", "entity": "Global Payments Proc.",
             "amount": 320000, "riskScore": 15, "status": "cleared", "department": "Sales",
             "type": "Batch Settlement"}
        ]"#
    }

    #[tokio::test]
    async fn test_mock_generator_respects_pool_size() {
        let mut source = MockGenerator::new(Some(7), 10);
        let batch = source.initial_batch(8).await.unwrap();
        assert_eq!(batch.len(), 8);
        assert!(source.next_transaction().await.unwrap().is_some());
        assert!(source.next_transaction().await.unwrap().is_some());
        assert!(source.next_transaction().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mock_generator_unlimited_pool() {
        let mut source = MockGenerator::new(Some(7), 0);
        for _ in 0..200 {
            assert!(source.next_transaction().await.unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn test_mock_transactions_are_well_formed() {
        let mut source = MockGenerator::new(Some(42), 0);
        let mut ids = HashSet::new();
        let batch = source.initial_batch(50).await.unwrap();
        for tx in &batch {
            assert!(tx.validate().is_ok());
            assert!(ids.insert(tx.id.clone()), "duplicate id {}", tx.id);
            assert!((5..100).contains(&tx.risk_score));
            assert!((1_000..6_000_000).contains(&tx.amount));
            assert!(DEPARTMENTS.contains(&tx.department));
            assert_eq!(tx.timestamp.len(), 8);
            assert_eq!(tx.status, TransactionStatus::from_risk_score(tx.risk_score));
        }
    }

    #[tokio::test]
    async fn test_seeded_generators_agree_on_scores() {
        let mut a = MockGenerator::new(Some(99), 0);
        let mut b = MockGenerator::new(Some(99), 0);
        let scores = |batch: Vec<Transaction>| -> Vec<u8> {
            batch.iter().map(|t| t.risk_score).collect()
        };
        let a_scores = scores(a.initial_batch(20).await.unwrap());
        let b_scores = scores(b.initial_batch(20).await.unwrap());
        assert_eq!(a_scores, b_scores);
    }

    #[tokio::test]
    async fn test_replay_order() {
        let mut source = ReplaySource::from_json(replay_json()).unwrap();
        let batch = source.initial_batch(2).await.unwrap();
        let ids: Vec<&str> = batch.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["txn_8921_uk", "txn_9921_aml"]);
        assert_eq!(source.remaining(), 1);

        let next = source.next_transaction().await.unwrap().unwrap();
        assert_eq!(next.id, "txn_3321_pci");
        assert!(source.next_transaction().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replay_initial_batch_larger_than_data() {
        let mut source = ReplaySource::from_json(replay_json()).unwrap();
        assert_eq!(source.initial_batch(8).await.unwrap().len(), 3);
        assert!(source.next_transaction().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replay_reports_rows_without_id() {
        let row = |id: &str| {
            Transaction::new(
                id,
                "10:00:00",
                "Nexus Dynamics",
                800,
                12,
                Department::It,
                "Service Fee",
            )
        };
        let mut source = ReplaySource::new(vec![row("A"), row(""), row("B"), row(" "), row("C")]);

        let batch = source.initial_batch(2).await.unwrap();
        let ids: Vec<&str> = batch.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);

        let err = source.next_transaction().await.unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::SourceError);
        assert!(err.to_string().contains("row 3"));

        assert_eq!(source.next_transaction().await.unwrap().unwrap().id, "C");
        assert!(source.next_transaction().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replay_keeps_out_of_range_scores() {
        let json = replay_json().replace("\"riskScore\": 94", "\"riskScore\": 940");
        let mut source = ReplaySource::from_json(&json).unwrap();
        let batch = source.initial_batch(3).await.unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[1].risk_score, 255);
        assert_eq!(batch[1].clone().sanitized().risk_score, 100);
    }

    #[test]
    fn test_replay_rejects_malformed_json() {
        let err = ReplaySource::from_json("{\"id\": 1}").err().unwrap();
        assert_eq!(err.code(), crate::error::ErrorCode::InvalidFormat);
    }

    #[tokio::test]
    async fn test_replay_missing_file() {
        let err = ReplaySource::from_file("/nonexistent/feed.json").await.err().unwrap();
        assert_eq!(err.code(), crate::error::ErrorCode::FileNotFound);
    }

    #[tokio::test]
    async fn test_from_config_builds_mock() {
        let config = SourceConfig::default();
        let source = from_config(&config).await.unwrap();
        assert_eq!(source.name(), "mock");
    }
}
