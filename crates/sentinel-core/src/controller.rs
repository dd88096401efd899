//! Single owner of the feed state
//!
//! The controller holds the buffer, the active filters, the navigation
//! state machine and the audit scan. Every mutation goes through it so the
//! filtered view is recomputed and navigation reconciled in one place.

use sentinel_config::Config;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use crate::audit::{AuditScan, AuditSnapshot};
use crate::error::CoreResult;
use crate::feed::FeedBuffer;
use crate::filter::{FilterEngine, FilterState, FilteredView};
use crate::keyboard::Command;
use crate::models::Transaction;
use crate::navigation::{Direction, Navigation, NavigationEvent, NavigationSnapshot};
use crate::types::{Department, RiskBands, RiskLevel, TransactionStatus};

/// Event for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum UiEvent {
    Navigation { event: NavigationEvent },
    FocusSearch,
    AuditStarted,
    AuditCompleted { findings: usize },
    AuditCancelled,
}

fn navigation_events(events: Vec<NavigationEvent>) -> Vec<UiEvent> {
    events
        .into_iter()
        .map(|event| UiEvent::Navigation { event })
        .collect()
}

/// Feed state owner
#[derive(Debug)]
pub struct FeedController {
    buffer: FeedBuffer,
    filters: FilterState,
    engine: FilterEngine,
    view: Arc<FilteredView>,
    navigation: Navigation,
    audit: AuditScan,
}

impl FeedController {
    pub fn new(buffer: FeedBuffer, bands: RiskBands) -> Self {
        let mut engine = FilterEngine::new(bands);
        let filters = FilterState::default();
        let view = engine.view(&buffer, &filters);
        Self {
            buffer,
            filters,
            engine,
            view,
            navigation: Navigation::default(),
            audit: AuditScan::default(),
        }
    }

    pub fn from_config(config: &Config) -> CoreResult<Self> {
        let bands = RiskBands::from_thresholds(&config.thresholds)?;
        Ok(Self::new(FeedBuffer::from_config(&config.feed), bands))
    }

    // ==================== Feed ====================

    pub fn seed(&mut self, batch: Vec<Transaction>) -> Vec<UiEvent> {
        self.buffer.seed(batch);
        self.refresh()
    }

    pub fn ingest(&mut self, transaction: Transaction, now: Instant) -> Vec<UiEvent> {
        self.buffer.ingest(transaction, now);
        self.refresh()
    }

    /// Expire highlight marks
    pub fn sweep(&mut self, now: Instant) -> usize {
        self.buffer.sweep(now)
    }

    // ==================== Filters ====================

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: FilterState) -> Vec<UiEvent> {
        self.filters = filters;
        self.refresh()
    }

    pub fn toggle_department(&mut self, department: Department) -> Vec<UiEvent> {
        self.filters.toggle_department(department);
        self.refresh()
    }

    pub fn toggle_risk_level(&mut self, level: RiskLevel) -> Vec<UiEvent> {
        self.filters.toggle_risk_level(level);
        self.refresh()
    }

    pub fn toggle_status(&mut self, status: TransactionStatus) -> Vec<UiEvent> {
        self.filters.toggle_status(status);
        self.refresh()
    }

    pub fn clear_filters(&mut self) -> Vec<UiEvent> {
        self.filters.clear();
        self.refresh()
    }

    /// Apply new thresholds from the settings provider
    pub fn set_bands(&mut self, bands: RiskBands) -> Vec<UiEvent> {
        self.engine.set_bands(bands);
        self.refresh()
    }

    pub fn bands(&self) -> &RiskBands {
        self.engine.bands()
    }

    // ==================== Navigation ====================

    /// Execute a keyboard command
    pub fn apply(&mut self, command: Command) -> Vec<UiEvent> {
        let rows = &self.view.transactions;
        match command {
            Command::Close => navigation_events(self.navigation.escape()),
            Command::FocusSearch => vec![UiEvent::FocusSearch],
            Command::TriggerAudit => self.start_audit(),
            Command::NavigateUp => navigation_events(self.navigation.step(Direction::Up, rows)),
            Command::NavigateDown => navigation_events(self.navigation.step(Direction::Down, rows)),
            Command::Activate => navigation_events(self.navigation.activate(rows)),
        }
    }

    /// Pointer activation of a row
    pub fn click(&mut self, id: &str) -> Vec<UiEvent> {
        navigation_events(self.navigation.select(id, &self.view.transactions))
    }

    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    // ==================== Audit ====================

    pub fn start_audit(&mut self) -> Vec<UiEvent> {
        if self.audit.start() {
            log::info!("Audit scan started");
            vec![UiEvent::AuditStarted]
        } else {
            log::debug!("Audit already running");
            Vec::new()
        }
    }

    pub fn advance_audit(&mut self, increment: f64) -> Vec<UiEvent> {
        if self.audit.advance(increment) {
            let findings = self.audit.findings().len();
            log::info!("Audit scan complete: {} findings", findings);
            vec![UiEvent::AuditCompleted { findings }]
        } else {
            Vec::new()
        }
    }

    pub fn cancel_audit(&mut self) -> Vec<UiEvent> {
        if self.audit.cancel() {
            log::info!("Audit scan cancelled at {:.0}%", self.audit.progress());
            vec![UiEvent::AuditCancelled]
        } else {
            Vec::new()
        }
    }

    pub fn audit(&self) -> &AuditScan {
        &self.audit
    }

    // ==================== Views ====================

    pub fn buffer(&self) -> &FeedBuffer {
        &self.buffer
    }

    /// Current filtered view
    pub fn view(&self) -> Arc<FilteredView> {
        Arc::clone(&self.view)
    }

    pub fn snapshot(&self, now: Instant) -> FeedSnapshot {
        FeedSnapshot {
            view: self.view(),
            filters: self.filters.clone(),
            navigation: self.navigation.snapshot(),
            recent_ids: self.buffer.recent_ids(now),
            audit: self.audit.snapshot(),
            bands: *self.engine.bands(),
            capacity: self.buffer.capacity(),
        }
    }

    /// Recompute the filtered view and reconcile navigation if it changed
    fn refresh(&mut self) -> Vec<UiEvent> {
        let view = self.engine.view(&self.buffer, &self.filters);
        if Arc::ptr_eq(&view, &self.view) {
            return Vec::new();
        }
        self.view = view;
        navigation_events(self.navigation.reconcile(&self.view.transactions))
    }
}

/// Read-only state handed to the presentation layer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    pub view: Arc<FilteredView>,
    pub filters: FilterState,
    pub navigation: NavigationSnapshot,
    /// Ids still highlighted as new
    pub recent_ids: BTreeSet<String>,
    pub audit: AuditSnapshot,
    /// Bands the view was bucketed with
    pub bands: RiskBands,
    pub capacity: usize,
}

impl FeedSnapshot {
    /// Footer line, e.g. `Showing 3 of 15 transactions (filtered)`
    pub fn status_line(&self) -> String {
        if self.view.is_filtered_out() {
            return "No transactions match the current filters".to_string();
        }
        format!(
            "Showing {} of {} transactions{}",
            self.view.len(),
            self.view.total,
            if self.view.filters_active { " (filtered)" } else { "" }
        )
    }
}
