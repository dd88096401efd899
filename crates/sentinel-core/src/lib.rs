//! Live transaction feed state
//!
//! A bounded newest-first buffer of transactions with filtering, keyboard
//! navigation and a simulated audit scan. [`FeedController`] holds the
//! state and is fully synchronous; [`FeedSession`] drives it from timers
//! and a [`TransactionSource`] inside a tokio task.

pub mod audit;
pub mod controller;
pub mod error;
pub mod feed;
pub mod filter;
pub mod keyboard;
pub mod models;
pub mod navigation;
pub mod session;
pub mod source;
pub mod types;

pub use audit::{AuditFinding, AuditScan, AuditSnapshot, AuditStatus, FindingSeverity};
pub use controller::{FeedController, FeedSnapshot, UiEvent};
pub use error::{CoreError, CoreResult, ErrorSeverity};
pub use feed::{FeedBuffer, IngestOutcome, RecentArrivals};
pub use filter::{FilterEngine, FilterState, FilteredView};
pub use keyboard::{Command, Dispatch, Key, KeyEvent, KeyboardDispatcher};
pub use models::Transaction;
pub use navigation::{Direction, Navigation, NavigationEvent, NavigationMode, NavigationSnapshot};
pub use session::{FeedSession, SessionCommand, SessionHandle};
pub use source::{MockGenerator, ReplaySource, SourceRef, TransactionSource};
pub use types::{Department, RiskBands, RiskLevel, TransactionStatus};
