//! Plain-text and JSON rendering of feed snapshots

use sentinel_core::{
    AuditStatus, FeedSnapshot, NavigationEvent, NavigationMode, RiskBands, Transaction, UiEvent,
};
use sentinel_utils::{format_currency, format_progress};
use std::sync::Arc;

/// Prints snapshots as they change, skipping redraws nothing visible caused
pub struct Renderer {
    json: bool,
    last: Option<Arc<FeedSnapshot>>,
}

impl Renderer {
    pub fn new(json: bool) -> Self {
        Self { json, last: None }
    }

    pub fn snapshot(&mut self, snapshot: Arc<FeedSnapshot>) {
        if self.json {
            match serde_json::to_string(&*snapshot) {
                Ok(line) => println!("{}", line),
                Err(e) => log::error!("Failed to serialize snapshot: {}", e),
            }
            self.last = Some(snapshot);
            return;
        }

        let (table_changed, audit_changed) = match &self.last {
            None => (true, true),
            Some(last) => (
                !Arc::ptr_eq(&last.view, &snapshot.view)
                    || last.navigation != snapshot.navigation
                    || last.recent_ids != snapshot.recent_ids
                    || last.bands != snapshot.bands,
                last.audit.status != snapshot.audit.status
                    || last.audit.phase != snapshot.audit.phase,
            ),
        };

        if table_changed {
            self.print_table(&snapshot);
        }
        if audit_changed {
            self.print_audit(&snapshot);
        }
        self.last = Some(snapshot);
    }

    pub fn event(&self, event: &UiEvent) {
        if self.json {
            match serde_json::to_string(event) {
                Ok(line) => println!("{}", line),
                Err(e) => log::error!("Failed to serialize event: {}", e),
            }
            return;
        }

        match event {
            UiEvent::Navigation {
                event: NavigationEvent::Opened { id },
            } => println!("-> opened {}", id),
            UiEvent::Navigation { event: NavigationEvent::Closed } => println!("-> closed"),
            UiEvent::Navigation { event: NavigationEvent::ScrollIntoView { .. } } => {}
            UiEvent::FocusSearch => println!("-> search focused"),
            UiEvent::AuditStarted => println!("-> audit started"),
            UiEvent::AuditCompleted { findings } => {
                println!("-> audit complete, {} findings", findings)
            }
            UiEvent::AuditCancelled => println!("-> audit cancelled"),
        }
    }

    fn print_table(&self, snapshot: &FeedSnapshot) {
        let focused = usize::try_from(snapshot.navigation.focused_index).ok();
        let selected = snapshot.navigation.selected.as_ref().map(|tx| tx.id.as_str());

        println!();
        for (index, tx) in snapshot.view.transactions.iter().enumerate() {
            let marker = if selected == Some(tx.id.as_str()) {
                '*'
            } else if focused == Some(index) {
                '>'
            } else {
                ' '
            };
            let new = if snapshot.recent_ids.contains(&tx.id) { "NEW" } else { "" };
            println!("{} {}", marker, row(tx, &snapshot.bands, new));
        }
        println!("{}", snapshot.status_line());

        if snapshot.navigation.mode == NavigationMode::Selected {
            if let Some(tx) = &snapshot.navigation.selected {
                println!(
                    "  [{}] {} | {} | {} | risk {} ({}) | {}",
                    tx.id,
                    tx.entity,
                    tx.kind,
                    format_currency(tx.amount),
                    tx.risk_score,
                    snapshot.bands.label(tx.risk_level(&snapshot.bands)),
                    tx.status
                );
            }
        }
    }

    fn print_audit(&self, snapshot: &FeedSnapshot) {
        let audit = &snapshot.audit;
        match audit.status {
            AuditStatus::Idle => {}
            AuditStatus::Scanning => println!(
                "[audit] {} {}",
                format_progress(audit.progress),
                audit.phase.as_deref().unwrap_or_default()
            ),
            AuditStatus::Cancelled => {
                println!("[audit] cancelled at {}", format_progress(audit.progress))
            }
            AuditStatus::Complete => {
                println!("[audit] complete");
                for finding in &audit.findings {
                    println!(
                        "  {:?} {}: {} ({} affected)",
                        finding.severity, finding.kind, finding.description, finding.affected_count
                    );
                }
            }
        }
    }
}

fn row(tx: &Transaction, bands: &RiskBands, new: &str) -> String {
    format!(
        "{:<8} {:<20} {:<28} {:>14} {:>3} {:<6} {:<8} {:<11} {}",
        tx.timestamp,
        tx.id,
        tx.entity,
        format_currency(tx.amount),
        tx.risk_score,
        tx.risk_level(bands).to_string(),
        tx.status.to_string(),
        tx.department.to_string(),
        new
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::Department;

    #[test]
    fn test_row_uses_given_bands() {
        let tx = Transaction::new(
            "TXN-7",
            "10:00:00",
            "Atlas Ventures",
            4200,
            50,
            Department::Sales,
            "Invoice Payment",
        );
        assert!(row(&tx, &RiskBands::default(), "").contains("Medium"));
        let narrow = RiskBands::new(20, 50).unwrap();
        assert!(row(&tx, &narrow, "NEW").contains("High"));
        assert!(row(&tx, &narrow, "NEW").ends_with("NEW"));
    }
}
