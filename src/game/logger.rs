//! Game log
//!
//! Every event is appended to the typed log regardless of verbosity; the
//! verbosity, format and mode only decide what gets echoed as text.

use crate::game::GameEvent;
use serde::{Deserialize, Serialize};

/// Verbosity level for game output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Silent - no output during game
    Silent = 0,
    /// Minimal - only game outcome
    Minimal = 1,
    /// Normal - turns and key actions (default)
    #[default]
    Normal = 2,
    /// Verbose - all actions and state changes
    Verbose = 3,
}

/// Output format for echoed log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Machine-readable JSON output (one object per line)
    Json,
}

/// Output destination for echoed log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputMode {
    /// Output only to stdout (default)
    #[default]
    Stdout,
    /// Capture only to in-memory buffer (no stdout)
    Memory,
    /// Both stdout and in-memory buffer
    Both,
}

/// One logged event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub turn: u32,
    pub event: GameEvent,
}

/// Append-only event log with turn slicing
#[derive(Debug, Clone, Default)]
pub struct GameLogger {
    verbosity: VerbosityLevel,
    output_format: OutputFormat,
    output_mode: OutputMode,
    entries: Vec<LogEntry>,
    /// Index of the first entry of each turn, in turn order
    turn_starts: Vec<usize>,
    /// Echoed lines captured in Memory/Both mode
    captured: Vec<String>,
}

impl GameLogger {
    /// Create a new logger with default verbosity (Normal)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logger with specified verbosity
    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        GameLogger {
            verbosity,
            ..Self::default()
        }
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = verbosity;
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn set_output_format(&mut self, format: OutputFormat) {
        self.output_format = format;
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    /// Capture echoed lines in memory instead of printing them
    pub fn enable_capture(&mut self) {
        self.output_mode = OutputMode::Memory;
    }

    /// Mark the start of a new turn slice
    pub fn begin_turn(&mut self) {
        self.turn_starts.push(self.entries.len());
    }

    /// Append an event and echo it if verbosity allows
    pub fn record(&mut self, turn: u32, event: GameEvent) {
        let level = event.level();
        let entry = LogEntry { turn, event };
        if level <= self.verbosity && self.verbosity > VerbosityLevel::Silent {
            self.echo(level, &entry);
        }
        self.entries.push(entry);
    }

    fn echo(&mut self, level: VerbosityLevel, entry: &LogEntry) {
        #[cfg(not(feature = "verbose-logging"))]
        if level == VerbosityLevel::Verbose {
            return;
        }
        let line = match self.output_format {
            OutputFormat::Text if level == VerbosityLevel::Minimal => entry.event.to_string(),
            OutputFormat::Text => format!("  {}", entry.event),
            OutputFormat::Json => match serde_json::to_string(entry) {
                Ok(json) => json,
                Err(err) => format!("{{\"event\":\"unserializable\",\"error\":\"{err}\"}}"),
            },
        };
        if matches!(self.output_mode, OutputMode::Stdout | OutputMode::Both) {
            println!("{line}");
        }
        if matches!(self.output_mode, OutputMode::Memory | OutputMode::Both) {
            self.captured.push(line);
        }
    }

    /// Every event so far
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn events(&self) -> impl Iterator<Item = &GameEvent> {
        self.entries.iter().map(|entry| &entry.event)
    }

    /// Events of the turn in progress
    pub fn current_turn(&self) -> &[LogEntry] {
        match self.turn_starts.last() {
            Some(&start) => &self.entries[start..],
            None => &self.entries,
        }
    }

    /// Events of the turn before the one in progress
    pub fn previous_turn(&self) -> &[LogEntry] {
        match self.turn_starts.as_slice() {
            [.., prev, last] => &self.entries[*prev..*last],
            _ => &[],
        }
    }

    /// Echoed lines captured in memory
    pub fn logs(&self) -> &[String] {
        &self.captured
    }

    /// Print captured lines to stdout and clear them
    pub fn flush_buffer(&mut self) {
        for line in self.captured.drain(..) {
            println!("{line}");
        }
    }
}
