//! Keyboard/pointer navigation over the filtered feed
//!
//! Every index held here points into the *currently filtered* sequence.
//! Up/down movement while a transaction is open uses that same sequence,
//! so the focused row and the open detail can never disagree. Callers must
//! run [`Navigation::reconcile`] whenever the filtered sequence changes.

use serde::Serialize;

use crate::models::Transaction;

/// Movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    fn delta(self) -> isize {
        match self {
            Direction::Up => -1,
            Direction::Down => 1,
        }
    }
}

/// Coarse state, for display and assertions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationMode {
    Idle,
    Focused,
    Selected,
}

/// Instructions for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum NavigationEvent {
    /// Bring the row into view (nearest edge, smooth)
    ScrollIntoView { index: usize, id: String },
    /// Open the detail panel for a transaction
    Opened { id: String },
    /// Close the detail panel
    Closed,
}

/// Navigation state machine
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Navigation {
    /// Nothing focused, nothing open
    #[default]
    Idle,
    /// Browsing with the keyboard; `id` is the focused transaction
    Focused { index: usize, id: String },
    /// A transaction is open and `index` is its filtered position
    Selected { index: usize, transaction: Transaction },
}

impl Navigation {
    pub fn mode(&self) -> NavigationMode {
        match self {
            Navigation::Idle => NavigationMode::Idle,
            Navigation::Focused { .. } => NavigationMode::Focused,
            Navigation::Selected { .. } => NavigationMode::Selected,
        }
    }

    pub fn focused_index(&self) -> Option<usize> {
        match self {
            Navigation::Idle => None,
            Navigation::Focused { index, .. } | Navigation::Selected { index, .. } => Some(*index),
        }
    }

    pub fn selected(&self) -> Option<&Transaction> {
        match self {
            Navigation::Selected { transaction, .. } => Some(transaction),
            _ => None,
        }
    }

    /// Arrow key handling
    pub fn step(&mut self, direction: Direction, filtered: &[Transaction]) -> Vec<NavigationEvent> {
        if filtered.is_empty() {
            return self.reconcile(filtered);
        }
        let last = filtered.len() - 1;

        match self {
            Navigation::Idle => {
                // From "nothing focused" both directions land on the first row
                self.focus(0, filtered)
            }
            Navigation::Focused { index, .. } => {
                let current = (*index).min(last);
                let target =
                    (current as isize + direction.delta()).clamp(0, last as isize) as usize;
                if target == *index {
                    return Vec::new();
                }
                self.focus(target, filtered)
            }
            Navigation::Selected { transaction, .. } => {
                let Some(current) = filtered.iter().position(|tx| tx.id == transaction.id) else {
                    return self.reconcile(filtered);
                };
                let target = current as isize + direction.delta();
                if target < 0 || target as usize > last {
                    return Vec::new();
                }
                let target = target as usize;
                let next = filtered[target].clone();
                let id = next.id.clone();
                *self = Navigation::Selected {
                    index: target,
                    transaction: next,
                };
                vec![
                    NavigationEvent::ScrollIntoView { index: target, id: id.clone() },
                    NavigationEvent::Opened { id },
                ]
            }
        }
    }

    /// Enter: open the focused transaction
    pub fn activate(&mut self, filtered: &[Transaction]) -> Vec<NavigationEvent> {
        let index = match self {
            Navigation::Focused { index, .. } => *index,
            _ => return Vec::new(),
        };
        let Some(transaction) = filtered.get(index).cloned() else {
            return self.reconcile(filtered);
        };
        let id = transaction.id.clone();
        *self = Navigation::Selected { index, transaction };
        vec![NavigationEvent::Opened { id }]
    }

    /// Click on a row: open it directly
    pub fn select(&mut self, id: &str, filtered: &[Transaction]) -> Vec<NavigationEvent> {
        let Some(index) = filtered.iter().position(|tx| tx.id == id) else {
            log::debug!("Ignoring selection of {} (not in the filtered feed)", id);
            return Vec::new();
        };
        if matches!(self, Navigation::Selected { transaction, .. } if transaction.id == id) {
            return Vec::new();
        }
        *self = Navigation::Selected {
            index,
            transaction: filtered[index].clone(),
        };
        vec![
            NavigationEvent::ScrollIntoView { index, id: id.to_string() },
            NavigationEvent::Opened { id: id.to_string() },
        ]
    }

    /// Escape: drop focus and selection
    pub fn escape(&mut self) -> Vec<NavigationEvent> {
        match std::mem::take(self) {
            Navigation::Idle => Vec::new(),
            _ => vec![NavigationEvent::Closed],
        }
    }

    /// Re-anchor indices after the filtered sequence changed.
    ///
    /// The focused or selected transaction is looked up by id. A selection
    /// that was filtered out or evicted is closed and focus falls back to the
    /// nearest valid row; an empty sequence resets to idle. Whenever the
    /// focused row ends up at a different index or on a different
    /// transaction, a `ScrollIntoView` follows.
    pub fn reconcile(&mut self, filtered: &[Transaction]) -> Vec<NavigationEvent> {
        let (previous, anchor) = match &*self {
            Navigation::Idle => return Vec::new(),
            Navigation::Focused { index, id } => (*index, id.clone()),
            Navigation::Selected { index, transaction } => (*index, transaction.id.clone()),
        };

        let mut events = Vec::new();
        match filtered.iter().position(|tx| tx.id == anchor) {
            Some(pos) => {
                if let Navigation::Focused { index, .. } | Navigation::Selected { index, .. } =
                    self
                {
                    *index = pos;
                }
            }
            None => {
                if matches!(self, Navigation::Selected { .. }) {
                    log::debug!("Selected transaction {} left the filtered feed", anchor);
                    events.push(NavigationEvent::Closed);
                }
                if filtered.is_empty() {
                    *self = Navigation::Idle;
                    return events;
                }
                let clamped = previous.min(filtered.len() - 1);
                *self = Navigation::Focused {
                    index: clamped,
                    id: filtered[clamped].id.clone(),
                };
            }
        }

        if let Some(index) = self.focused_index() {
            let id = &filtered[index].id;
            if index != previous || *id != anchor {
                events.push(NavigationEvent::ScrollIntoView {
                    index,
                    id: id.clone(),
                });
            }
        }
        events
    }

    pub fn snapshot(&self) -> NavigationSnapshot {
        NavigationSnapshot {
            mode: self.mode(),
            focused_index: self.focused_index().map_or(-1, |index| index as i64),
            selected: self.selected().cloned(),
        }
    }

    fn focus(&mut self, index: usize, filtered: &[Transaction]) -> Vec<NavigationEvent> {
        let id = filtered[index].id.clone();
        *self = Navigation::Focused {
            index,
            id: id.clone(),
        };
        vec![NavigationEvent::ScrollIntoView { index, id }]
    }
}

/// Read-only navigation state handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationSnapshot {
    pub mode: NavigationMode,
    /// `-1` when nothing is focused
    pub focused_index: i64,
    pub selected: Option<Transaction>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Department;

    fn feed(count: usize) -> Vec<Transaction> {
        (0..count)
            .map(|i| {
                Transaction::new(
                    format!("T{}", i),
                    "10:00:00",
                    "Omega Holdings",
                    2500,
                    20,
                    Department::Operations,
                    "Invoice Payment",
                )
            })
            .collect()
    }

    #[test]
    fn test_arrow_down_twice_from_idle() {
        let filtered = feed(5);
        let mut nav = Navigation::default();
        nav.step(Direction::Down, &filtered);
        assert_eq!(nav.focused_index(), Some(0));
        nav.step(Direction::Down, &filtered);
        assert_eq!(nav.focused_index(), Some(1));
        assert_eq!(nav.mode(), NavigationMode::Focused);
    }

    #[test]
    fn test_arrow_up_from_idle_lands_on_first_row() {
        let filtered = feed(5);
        let mut nav = Navigation::default();
        let events = nav.step(Direction::Up, &filtered);
        assert_eq!(nav.focused_index(), Some(0));
        assert_eq!(
            events,
            vec![NavigationEvent::ScrollIntoView {
                index: 0,
                id: "T0".to_string()
            }]
        );
    }

    #[test]
    fn test_focus_clamps_at_bounds() {
        let filtered = feed(3);
        let mut nav = Navigation::default();
        for _ in 0..10 {
            nav.step(Direction::Down, &filtered);
        }
        assert_eq!(nav.focused_index(), Some(2));
        assert!(nav.step(Direction::Down, &filtered).is_empty());

        for _ in 0..10 {
            nav.step(Direction::Up, &filtered);
        }
        assert_eq!(nav.focused_index(), Some(0));
    }

    #[test]
    fn test_arrows_on_empty_feed_are_noops() {
        let mut nav = Navigation::default();
        assert!(nav.step(Direction::Down, &[]).is_empty());
        assert_eq!(nav, Navigation::Idle);
        assert!(nav.activate(&[]).is_empty());
    }

    #[test]
    fn test_enter_opens_focused_transaction() {
        let filtered = feed(4);
        let mut nav = Navigation::default();
        nav.step(Direction::Down, &filtered);
        nav.step(Direction::Down, &filtered);
        let events = nav.activate(&filtered);
        assert_eq!(events, vec![NavigationEvent::Opened { id: "T1".to_string() }]);
        assert_eq!(nav.mode(), NavigationMode::Selected);
        assert_eq!(nav.selected().map(|t| t.id.as_str()), Some("T1"));
        assert_eq!(nav.focused_index(), Some(1));
    }

    #[test]
    fn test_enter_in_idle_or_selected_is_noop() {
        let filtered = feed(4);
        let mut nav = Navigation::default();
        assert!(nav.activate(&filtered).is_empty());
        assert_eq!(nav, Navigation::Idle);

        nav.select("T2", &filtered);
        let before = nav.clone();
        assert!(nav.activate(&filtered).is_empty());
        assert_eq!(nav, before);
    }

    #[test]
    fn test_arrows_move_open_selection() {
        let filtered = feed(3);
        let mut nav = Navigation::default();
        nav.select("T1", &filtered);

        let events = nav.step(Direction::Down, &filtered);
        assert_eq!(nav.selected().map(|t| t.id.as_str()), Some("T2"));
        assert_eq!(nav.focused_index(), Some(2));
        assert!(events.contains(&NavigationEvent::Opened { id: "T2".to_string() }));

        // Boundary: no-op, stays selected
        assert!(nav.step(Direction::Down, &filtered).is_empty());
        assert_eq!(nav.selected().map(|t| t.id.as_str()), Some("T2"));

        nav.step(Direction::Up, &filtered);
        nav.step(Direction::Up, &filtered);
        assert_eq!(nav.focused_index(), Some(0));
        assert!(nav.step(Direction::Up, &filtered).is_empty());
        assert_eq!(nav.mode(), NavigationMode::Selected);
    }

    #[test]
    fn test_click_selects_filtered_position() {
        let filtered = feed(6);
        let mut nav = Navigation::default();
        let events = nav.select("T4", &filtered);
        assert_eq!(nav.focused_index(), Some(4));
        assert_eq!(events[0], NavigationEvent::ScrollIntoView { index: 4, id: "T4".to_string() });

        assert!(nav.select("missing", &filtered).is_empty());
        assert_eq!(nav.focused_index(), Some(4));
    }

    #[test]
    fn test_escape_from_selected() {
        let filtered = feed(3);
        let mut nav = Navigation::default();
        nav.select("T2", &filtered);
        let events = nav.escape();
        assert_eq!(events, vec![NavigationEvent::Closed]);
        assert_eq!(nav.mode(), NavigationMode::Idle);
        assert_eq!(nav.focused_index(), None);
        assert!(nav.selected().is_none());
        assert_eq!(nav.snapshot().focused_index, -1);
    }

    #[test]
    fn test_escape_from_focused_and_idle() {
        let filtered = feed(3);
        let mut nav = Navigation::default();
        assert!(nav.escape().is_empty());
        nav.step(Direction::Down, &filtered);
        assert_eq!(nav.escape(), vec![NavigationEvent::Closed]);
        assert_eq!(nav, Navigation::Idle);
    }

    #[test]
    fn test_reconcile_follows_selected_transaction() {
        let mut filtered = feed(3);
        let mut nav = Navigation::default();
        nav.select("T1", &filtered);

        // A new arrival at the head shifts every row down
        filtered.insert(0, feed(10).pop().unwrap());
        assert_eq!(
            nav.reconcile(&filtered),
            vec![NavigationEvent::ScrollIntoView {
                index: 2,
                id: "T1".to_string()
            }]
        );
        assert_eq!(nav.focused_index(), Some(2));
        assert_eq!(nav.selected().map(|t| t.id.as_str()), Some("T1"));
    }

    #[test]
    fn test_reconcile_drops_filtered_out_selection() {
        let filtered = feed(5);
        let mut nav = Navigation::default();
        nav.select("T4", &filtered);

        let narrowed: Vec<Transaction> = filtered[..2].to_vec();
        let events = nav.reconcile(&narrowed);
        assert_eq!(
            events,
            vec![
                NavigationEvent::Closed,
                NavigationEvent::ScrollIntoView {
                    index: 1,
                    id: "T1".to_string()
                },
            ]
        );
        assert_eq!(nav.mode(), NavigationMode::Focused);
        assert_eq!(nav.focused_index(), Some(1));

        let events = nav.reconcile(&[]);
        assert!(events.is_empty());
        assert_eq!(nav, Navigation::Idle);
    }

    #[test]
    fn test_reconcile_selection_with_empty_feed() {
        let filtered = feed(2);
        let mut nav = Navigation::default();
        nav.select("T0", &filtered);
        assert_eq!(nav.reconcile(&[]), vec![NavigationEvent::Closed]);
        assert_eq!(nav.snapshot().focused_index, -1);
    }

    #[test]
    fn test_reconcile_focus_clamps_when_row_disappears() {
        let filtered = feed(6);
        let mut nav = Navigation::default();
        for _ in 0..6 {
            nav.step(Direction::Down, &filtered);
        }
        assert_eq!(nav.focused_index(), Some(5));

        let narrowed = feed(3);
        assert_eq!(
            nav.reconcile(&narrowed),
            vec![NavigationEvent::ScrollIntoView {
                index: 2,
                id: "T2".to_string()
            }]
        );
        assert_eq!(nav.focused_index(), Some(2));
        assert!(nav.step(Direction::Down, &narrowed).is_empty());
    }

    #[test]
    fn test_stale_selection_is_reconciled_on_step() {
        let filtered = feed(4);
        let mut nav = Navigation::default();
        nav.select("T3", &filtered);
        let narrowed = feed(2);
        let events = nav.step(Direction::Up, &narrowed);
        assert_eq!(
            events,
            vec![
                NavigationEvent::Closed,
                NavigationEvent::ScrollIntoView {
                    index: 1,
                    id: "T1".to_string()
                },
            ]
        );
        assert_eq!(nav.focused_index(), Some(1));
    }

    #[test]
    fn test_reconcile_focus_follows_arrival() {
        let mut filtered = feed(4);
        let mut nav = Navigation::default();
        nav.step(Direction::Down, &filtered);
        nav.step(Direction::Down, &filtered);

        filtered.insert(0, feed(10).pop().unwrap());
        let events = nav.reconcile(&filtered);
        assert_eq!(
            events,
            vec![NavigationEvent::ScrollIntoView {
                index: 2,
                id: "T1".to_string()
            }]
        );
        assert_eq!(nav.focused_index(), Some(2));
    }

    #[test]
    fn test_reconcile_unchanged_position_is_silent() {
        let filtered = feed(4);
        let mut nav = Navigation::default();
        nav.step(Direction::Down, &filtered);
        assert!(nav.reconcile(&filtered).is_empty());

        nav.select("T2", &filtered);
        assert!(nav.reconcile(&filtered).is_empty());
        assert!(Navigation::Idle.reconcile(&filtered).is_empty());
    }
}
