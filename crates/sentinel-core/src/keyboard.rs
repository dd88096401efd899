//! Global keyboard shortcuts mapped to typed commands

use serde::Serialize;

/// Physical key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    ArrowUp,
    ArrowDown,
    Char(char),
    Other(String),
}

/// Modifier keys held during the key press
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    /// Cmd on macOS
    pub meta: bool,
    pub alt: bool,
    pub shift: bool,
}

impl Modifiers {
    /// Cmd or Ctrl, whichever the platform uses for shortcuts
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Element that had focus when the key was pressed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FocusTarget {
    #[default]
    Document,
    /// Text input, textarea or editable content
    TextInput,
}

/// A key press as delivered by the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    pub target: FocusTarget,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::default(),
            target: FocusTarget::Document,
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.modifiers.ctrl = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.modifiers.meta = true;
        self
    }

    pub fn in_text_input(mut self) -> Self {
        self.target = FocusTarget::TextInput;
        self
    }
}

impl std::str::FromStr for KeyEvent {
    type Err = String;

    /// Parse combos such as `ctrl+k`, `cmd+a`, `down` or `esc`.
    /// An `input:` prefix marks the event as typed inside a text field.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (target, combo) = match trimmed.strip_prefix("input:") {
            Some(rest) => (FocusTarget::TextInput, rest),
            None => (FocusTarget::Document, trimmed),
        };

        let mut modifiers = Modifiers::default();
        let mut key = None;
        for part in combo.split('+').map(str::trim) {
            match part.to_lowercase().as_str() {
                "ctrl" | "control" => modifiers.ctrl = true,
                "cmd" | "meta" | "super" => modifiers.meta = true,
                "alt" | "option" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                "esc" | "escape" => key = Some(Key::Escape),
                "enter" | "return" => key = Some(Key::Enter),
                "up" | "arrowup" => key = Some(Key::ArrowUp),
                "down" | "arrowdown" => key = Some(Key::ArrowDown),
                "" => return Err(format!("Invalid key combo: {}", s)),
                other => {
                    let mut chars = other.chars();
                    key = match (chars.next(), chars.next()) {
                        (Some(c), None) => Some(Key::Char(c)),
                        _ => Some(Key::Other(part.to_string())),
                    };
                }
            }
        }

        key.map(|key| KeyEvent {
            key,
            modifiers,
            target,
        })
        .ok_or_else(|| format!("Invalid key combo: {}", s))
    }
}

/// Semantic command produced by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Command {
    /// Close the detail panel and drop focus
    Close,
    /// Move keyboard focus to the search box
    FocusSearch,
    /// Start an audit scan
    TriggerAudit,
    NavigateUp,
    NavigateDown,
    /// Open the focused transaction
    Activate,
}

impl Command {
    /// Shortcut hint shown in the help overlay
    pub fn shortcut_hint(&self) -> &'static str {
        match self {
            Command::Close => "Esc",
            Command::FocusSearch => "⌘K",
            Command::TriggerAudit => "⌘A",
            Command::NavigateUp => "↑",
            Command::NavigateDown => "↓",
            Command::Activate => "Enter",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Command::Close => "Close panel / clear selection",
            Command::FocusSearch => "Focus search",
            Command::TriggerAudit => "Run AI audit",
            Command::NavigateUp => "Previous transaction",
            Command::NavigateDown => "Next transaction",
            Command::Activate => "Open focused transaction",
        }
    }

    pub fn all() -> [Command; 6] {
        [
            Command::Close,
            Command::FocusSearch,
            Command::TriggerAudit,
            Command::NavigateUp,
            Command::NavigateDown,
            Command::Activate,
        ]
    }
}

/// Outcome of dispatching a key event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The key maps to a command; the default action must be suppressed
    Handled(Command),
    /// Not a shortcut; let the key through untouched
    PassThrough,
}

impl Dispatch {
    pub fn prevents_default(&self) -> bool {
        matches!(self, Dispatch::Handled(_))
    }

    pub fn command(&self) -> Option<Command> {
        match self {
            Dispatch::Handled(command) => Some(*command),
            Dispatch::PassThrough => None,
        }
    }
}

/// Maps key events to commands
#[derive(Debug, Clone, Copy)]
pub struct KeyboardDispatcher {
    enabled: bool,
}

impl Default for KeyboardDispatcher {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl KeyboardDispatcher {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn dispatch(&self, event: &KeyEvent) -> Dispatch {
        if !self.enabled {
            return Dispatch::PassThrough;
        }

        let in_input = event.target == FocusTarget::TextInput;
        let command = match &event.key {
            Key::Escape => Some(Command::Close),
            Key::Char(c) if event.modifiers.command() && c.eq_ignore_ascii_case(&'k') => {
                Some(Command::FocusSearch)
            }
            // Cmd/Ctrl+A keeps its select-all meaning inside text fields
            Key::Char(c)
                if event.modifiers.command() && c.eq_ignore_ascii_case(&'a') && !in_input =>
            {
                Some(Command::TriggerAudit)
            }
            Key::ArrowUp if !in_input => Some(Command::NavigateUp),
            Key::ArrowDown if !in_input => Some(Command::NavigateDown),
            Key::Enter if !in_input => Some(Command::Activate),
            _ => None,
        };

        match command {
            Some(command) => {
                log::trace!("Key {:?} -> {:?}", event.key, command);
                Dispatch::Handled(command)
            }
            None => Dispatch::PassThrough,
        }
    }
}
