//! Multi-criterion transaction filtering
//!
//! Filtering is a pure function of the feed contents, the active filter
//! set and the risk bands. [`FilterEngine`] caches the last result so that
//! repeated snapshots of an unchanged feed share one [`FilteredView`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::feed::FeedBuffer;
use crate::models::Transaction;
use crate::types::{Department, RiskBands, RiskLevel, TransactionStatus};

/// Active filters. An empty axis places no constraint on that axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub departments: BTreeSet<Department>,
    pub risk_levels: BTreeSet<RiskLevel>,
    pub statuses: BTreeSet<TransactionStatus>,
}

impl FilterState {
    pub fn is_active(&self) -> bool {
        !self.departments.is_empty() || !self.risk_levels.is_empty() || !self.statuses.is_empty()
    }

    /// Number of selected values across all axes
    pub fn active_count(&self) -> usize {
        self.departments.len() + self.risk_levels.len() + self.statuses.len()
    }

    pub fn toggle_department(&mut self, department: Department) {
        toggle(&mut self.departments, department);
    }

    pub fn toggle_risk_level(&mut self, level: RiskLevel) {
        toggle(&mut self.risk_levels, level);
    }

    pub fn toggle_status(&mut self, status: TransactionStatus) {
        toggle(&mut self.statuses, status);
    }

    pub fn clear(&mut self) {
        self.departments.clear();
        self.risk_levels.clear();
        self.statuses.clear();
    }

    /// AND across axes, OR within an axis
    pub fn matches(&self, tx: &Transaction, bands: &RiskBands) -> bool {
        (self.departments.is_empty() || self.departments.contains(&tx.department))
            && (self.risk_levels.is_empty() || self.risk_levels.contains(&tx.risk_level(bands)))
            && (self.statuses.is_empty() || self.statuses.contains(&tx.status))
    }
}

fn toggle<T: Ord>(set: &mut BTreeSet<T>, value: T) {
    if !set.remove(&value) {
        set.insert(value);
    }
}

/// Filter a newest-first sequence, preserving its order
pub fn apply(buffer: &[Transaction], filters: &FilterState, bands: &RiskBands) -> Vec<Transaction> {
    if !filters.is_active() {
        return buffer.to_vec();
    }
    buffer
        .iter()
        .filter(|tx| filters.matches(tx, bands))
        .cloned()
        .collect()
}

/// Result of filtering the feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredView {
    pub transactions: Vec<Transaction>,
    /// Length of the unfiltered feed
    pub total: usize,
    pub filters_active: bool,
}

impl FilteredView {
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Filters hide every transaction in a non-empty feed
    pub fn is_filtered_out(&self) -> bool {
        self.filters_active && self.transactions.is_empty() && self.total > 0
    }

    pub fn get(&self, index: usize) -> Option<&Transaction> {
        self.transactions.get(index)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.transactions.iter().position(|tx| tx.id == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.transactions.iter().map(|tx| tx.id.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheKey {
    revision: u64,
    filters: FilterState,
    bands: RiskBands,
}

/// Memoizing wrapper around [`apply`] for a single feed buffer
#[derive(Debug)]
pub struct FilterEngine {
    bands: RiskBands,
    cache: Option<(CacheKey, Arc<FilteredView>)>,
}

impl FilterEngine {
    pub fn new(bands: RiskBands) -> Self {
        Self { bands, cache: None }
    }

    pub fn bands(&self) -> &RiskBands {
        &self.bands
    }

    pub fn set_bands(&mut self, bands: RiskBands) {
        self.bands = bands;
    }

    /// Filtered view of `buffer`, recomputed only when the buffer revision,
    /// the filters or the bands changed since the previous call
    pub fn view(&mut self, buffer: &FeedBuffer, filters: &FilterState) -> Arc<FilteredView> {
        let key = CacheKey {
            revision: buffer.revision(),
            filters: filters.clone(),
            bands: self.bands,
        };

        if let Some((cached_key, view)) = &self.cache {
            if *cached_key == key {
                return Arc::clone(view);
            }
        }

        let view = Arc::new(FilteredView {
            transactions: apply(buffer.transactions(), filters, &self.bands),
            total: buffer.len(),
            filters_active: filters.is_active(),
        });
        log::trace!(
            "Filtered feed revision {}: {} of {} transactions",
            key.revision,
            view.len(),
            view.total
        );
        self.cache = Some((key, Arc::clone(&view)));
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn tx(id: &str, score: u8, department: Department) -> Transaction {
        Transaction::new(id, "10:00:00", "Vertex Partners", 5000, score, department, "Service Fee")
    }

    fn scenario() -> Vec<Transaction> {
        vec![
            tx("T1", 10, Department::Finance),
            tx("T2", 55, Department::Legal),
            tx("T3", 85, Department::Finance),
        ]
    }

    fn is_subsequence(sub: &[Transaction], full: &[Transaction]) -> bool {
        let mut rest = full.iter();
        sub.iter().all(|item| rest.any(|candidate| candidate.id == item.id))
    }

    #[test]
    fn test_empty_filters_are_identity() {
        let buffer = scenario();
        let result = apply(&buffer, &FilterState::default(), &RiskBands::default());
        assert_eq!(result, buffer);
    }

    #[test]
    fn test_high_risk_scenario() {
        let mut filters = FilterState::default();
        filters.toggle_risk_level("High (61-100)".parse().unwrap());
        let result = apply(&scenario(), &filters, &RiskBands::default());
        let ids: Vec<&str> = result.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["T3"]);
    }

    #[test]
    fn test_or_within_axis_and_across_axes() {
        let buffer = scenario();
        let bands = RiskBands::default();

        let mut filters = FilterState::default();
        filters.toggle_risk_level(RiskLevel::Low);
        filters.toggle_risk_level(RiskLevel::High);
        let ids: Vec<String> = apply(&buffer, &filters, &bands).into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["T1", "T3"]);

        filters.toggle_status(TransactionStatus::Flagged);
        let ids: Vec<String> = apply(&buffer, &filters, &bands).into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["T3"]);

        filters.toggle_department(Department::Legal);
        assert!(apply(&buffer, &filters, &bands).is_empty());
    }

    #[test]
    fn test_results_are_ordered_subsequences() {
        let buffer: Vec<Transaction> = (0..=100u8)
            .map(|score| {
                let department = Department::all()[score as usize % 8];
                tx(&format!("T{}", score), score, department)
            })
            .collect();
        let bands = RiskBands::default();

        for department in Department::all() {
            for level in RiskLevel::all() {
                for status in TransactionStatus::all() {
                    let mut filters = FilterState::default();
                    filters.toggle_department(department);
                    filters.toggle_risk_level(level);
                    filters.toggle_status(status);
                    let result = apply(&buffer, &filters, &bands);
                    assert!(is_subsequence(&result, &buffer));
                    assert!(result.iter().all(|t| filters.matches(t, &bands)));
                }
            }
        }
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let mut filters = FilterState::default();
        filters.toggle_department(Department::It);
        assert!(filters.is_active());
        assert_eq!(filters.active_count(), 1);
        filters.toggle_department(Department::It);
        assert_eq!(filters, FilterState::default());
        assert!(!filters.is_active());
    }

    #[test]
    fn test_clear() {
        let mut filters = FilterState::default();
        filters.toggle_department(Department::Sales);
        filters.toggle_status(TransactionStatus::Pending);
        filters.clear();
        assert_eq!(filters.active_count(), 0);
    }

    #[test]
    fn test_custom_bands_shift_buckets() {
        let mut filters = FilterState::default();
        filters.toggle_risk_level(RiskLevel::High);
        let bands = RiskBands::new(40, 50).unwrap();
        let ids: Vec<String> = apply(&scenario(), &filters, &bands)
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["T2", "T3"]);
    }

    #[test]
    fn test_view_distinguishes_no_match_from_no_filters() {
        let mut engine = FilterEngine::new(RiskBands::default());
        let mut buffer = FeedBuffer::new(15, Duration::from_secs(2));
        buffer.seed(scenario());

        let view = engine.view(&buffer, &FilterState::default());
        assert_eq!(view.len(), 3);
        assert!(!view.filters_active);
        assert!(!view.is_filtered_out());

        let mut filters = FilterState::default();
        filters.toggle_department(Department::Marketing);
        let view = engine.view(&buffer, &filters);
        assert!(view.is_empty());
        assert_eq!(view.total, 3);
        assert!(view.filters_active);
        assert!(view.is_filtered_out());
    }

    #[test]
    fn test_view_is_memoized() {
        let mut engine = FilterEngine::new(RiskBands::default());
        let mut buffer = FeedBuffer::new(15, Duration::from_secs(2));
        buffer.seed(scenario());
        let filters = FilterState::default();

        let first = engine.view(&buffer, &filters);
        let second = engine.view(&buffer, &filters);
        assert!(Arc::ptr_eq(&first, &second));

        buffer.ingest(tx("T4", 20, Department::Hr), Instant::now());
        let third = engine.view(&buffer, &filters);
        assert!(!Arc::ptr_eq(&second, &third));
        assert_eq!(third.get(0).map(|t| t.id.as_str()), Some("T4"));

        let mut narrowed = FilterState::default();
        narrowed.toggle_status(TransactionStatus::Cleared);
        let fourth = engine.view(&buffer, &narrowed);
        assert!(!Arc::ptr_eq(&third, &fourth));
        assert_eq!(fourth.ids(), vec!["T4", "T1"]);

        engine.set_bands(RiskBands::new(50, 90).unwrap());
        let fifth = engine.view(&buffer, &narrowed);
        assert!(!Arc::ptr_eq(&fourth, &fifth));
    }
}
