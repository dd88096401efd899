//! Simulated audit scan progress
//!
//! The scan is a demo animation: progress advances by externally supplied
//! increments and the findings are a fixed catalog. It can be cancelled at
//! any point, which discards partial progress.

use serde::Serialize;

/// Labels shown while the scan runs, one per 15% of progress
pub const SCAN_PHASES: [&str; 7] = [
    "Initializing neural network...",
    "Loading transaction patterns...",
    "Analyzing vendor relationships...",
    "Detecting statistical anomalies...",
    "Cross-referencing historical data...",
    "Generating risk assessments...",
    "Compiling results...",
];

const PHASE_WIDTH: f64 = 15.0;

/// Progress increment bounds per tick (lower inclusive, upper exclusive)
pub const MIN_INCREMENT: f64 = 2.0;
pub const MAX_INCREMENT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingSeverity {
    Critical,
    Warning,
    Info,
}

/// One anomaly reported at the end of a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditFinding {
    pub id: String,
    pub kind: String,
    pub severity: FindingSeverity,
    pub description: String,
    pub affected_count: u32,
}

impl AuditFinding {
    fn new(
        id: &str,
        kind: &str,
        severity: FindingSeverity,
        description: &str,
        affected_count: u32,
    ) -> Self {
        Self {
            id: id.to_string(),
            kind: kind.to_string(),
            severity,
            description: description.to_string(),
            affected_count,
        }
    }
}

/// The fixed findings every completed scan reports
pub fn demo_findings() -> Vec<AuditFinding> {
    vec![
        AuditFinding::new(
            "1",
            "Duplicate Invoice",
            FindingSeverity::Critical,
            "Invoice #INV-2024-8892 appears 3 times across vendors",
            3,
        ),
        AuditFinding::new(
            "2",
            "High-Value Outlier",
            FindingSeverity::Critical,
            "Transaction exceeds 400% of vendor baseline",
            1,
        ),
        AuditFinding::new(
            "3",
            "Velocity Spike",
            FindingSeverity::Warning,
            "15 transactions in 2-minute window from single source",
            15,
        ),
        AuditFinding::new(
            "4",
            "Round Number Pattern",
            FindingSeverity::Warning,
            "Suspicious clustering of $X,000 transactions",
            7,
        ),
        AuditFinding::new(
            "5",
            "New Vendor Risk",
            FindingSeverity::Info,
            "3 new vendors added without standard vetting",
            3,
        ),
    ]
}

/// Audit scan state machine
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuditScan {
    #[default]
    Idle,
    Scanning { progress: f64 },
    Complete { findings: Vec<AuditFinding> },
    Cancelled { progress: f64 },
}

impl AuditScan {
    pub fn is_running(&self) -> bool {
        matches!(self, AuditScan::Scanning { .. })
    }

    /// Start a fresh scan. Returns false if one is already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        *self = AuditScan::Scanning { progress: 0.0 };
        true
    }

    /// Advance a running scan; returns true when this step completed it
    pub fn advance(&mut self, increment: f64) -> bool {
        let AuditScan::Scanning { progress } = self else {
            return false;
        };
        *progress += increment.max(0.0);
        if *progress >= 100.0 {
            *self = AuditScan::Complete {
                findings: demo_findings(),
            };
            return true;
        }
        false
    }

    /// Halt a running scan. Returns false if nothing was running.
    pub fn cancel(&mut self) -> bool {
        let AuditScan::Scanning { progress } = self else {
            return false;
        };
        let progress = *progress;
        *self = AuditScan::Cancelled { progress };
        true
    }

    /// Progress in percent, capped at 100
    pub fn progress(&self) -> f64 {
        match self {
            AuditScan::Idle => 0.0,
            AuditScan::Scanning { progress } | AuditScan::Cancelled { progress } => {
                progress.min(100.0)
            }
            AuditScan::Complete { .. } => 100.0,
        }
    }

    /// Label of the current phase
    pub fn phase(&self) -> Option<&'static str> {
        match self {
            AuditScan::Scanning { progress } => {
                let index = ((progress / PHASE_WIDTH).floor() as usize).min(SCAN_PHASES.len() - 1);
                Some(SCAN_PHASES[index])
            }
            AuditScan::Complete { .. } => Some("Scan complete"),
            _ => None,
        }
    }

    pub fn findings(&self) -> &[AuditFinding] {
        match self {
            AuditScan::Complete { findings } => findings,
            _ => &[],
        }
    }

    pub fn snapshot(&self) -> AuditSnapshot {
        let status = match self {
            AuditScan::Idle => AuditStatus::Idle,
            AuditScan::Scanning { .. } => AuditStatus::Scanning,
            AuditScan::Complete { .. } => AuditStatus::Complete,
            AuditScan::Cancelled { .. } => AuditStatus::Cancelled,
        };
        AuditSnapshot {
            status,
            progress: self.progress(),
            phase: self.phase().map(str::to_string),
            findings: self.findings().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Idle,
    Scanning,
    Complete,
    Cancelled,
}

/// Read-only audit state for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditSnapshot {
    pub status: AuditStatus,
    pub progress: f64,
    pub phase: Option<String>,
    pub findings: Vec<AuditFinding>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_runs_to_completion() {
        let mut scan = AuditScan::default();
        assert!(scan.start());
        assert!(scan.is_running());
        assert_eq!(scan.phase(), Some(SCAN_PHASES[0]));

        let mut completed = false;
        for _ in 0..50 {
            if scan.advance(MIN_INCREMENT) {
                completed = true;
                break;
            }
        }
        assert!(completed);
        assert_eq!(scan.progress(), 100.0);
        assert_eq!(scan.findings().len(), 5);
        assert_eq!(scan.findings()[0].severity, FindingSeverity::Critical);
    }

    #[test]
    fn test_phase_follows_progress() {
        let mut scan = AuditScan::default();
        scan.start();
        scan.advance(16.0);
        assert_eq!(scan.phase(), Some(SCAN_PHASES[1]));
        scan.advance(80.0);
        assert_eq!(scan.phase(), Some(SCAN_PHASES[6]));
    }

    #[test]
    fn test_start_while_running_is_ignored() {
        let mut scan = AuditScan::default();
        scan.start();
        scan.advance(30.0);
        assert!(!scan.start());
        assert_eq!(scan.progress(), 30.0);
    }

    #[test]
    fn test_cancel_discards_results() {
        let mut scan = AuditScan::default();
        assert!(!scan.cancel());
        scan.start();
        scan.advance(40.0);
        assert!(scan.cancel());
        assert!(!scan.is_running());
        assert!(scan.findings().is_empty());
        assert!(!scan.advance(90.0));
        assert_eq!(scan.snapshot().status, AuditStatus::Cancelled);

        // A cancelled scan can be restarted from zero
        assert!(scan.start());
        assert_eq!(scan.progress(), 0.0);
    }

    #[test]
    fn test_restart_after_completion() {
        let mut scan = AuditScan::default();
        scan.start();
        scan.advance(150.0);
        assert_eq!(scan.snapshot().status, AuditStatus::Complete);
        assert!(scan.start());
        assert!(scan.findings().is_empty());
    }
}
