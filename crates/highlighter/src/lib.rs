//! 10-K Keyword Highlighter
//!
//! Finds regular-expression matches in the visible text of a filing and
//! either wraps them in styled marker elements or counts them.
//!
//! # Shape
//!
//! 1. **One operation**: `highlight(pattern)` / `count(pattern)`, applied once
//!    per pattern in list order
//! 2. **Counts are values**: every call returns its count, the caller folds
//!    them into `MatchCounts`
//! 3. **No timers**: a session runs once when the host publishes `DocumentReady`

pub mod config;
pub mod counts;
pub mod edgar;
pub mod error;
pub mod events;
pub mod highlight;
pub mod keywords;
pub mod pattern;
pub mod session;
pub mod style;
pub mod trigger;

pub use config::{load_patterns, HighlighterConfig, StyleConfig};
pub use counts::{MatchCounts, PatternCount};
pub use edgar::{Company, Filing};
pub use error::{HighlightError, Result};
pub use events::{EventBus, HostEvent};
pub use highlight::{
    HighlightOptions, HighlightOutcome, Highlighter, RunMode, RunReport, SkippedPattern,
};
pub use keywords::{default_patterns, DEFAULT_PATTERNS};
pub use pattern::Pattern;
pub use session::{HighlightSession, SessionConfig};
pub use style::StyleRule;
pub use trigger::{file_url, TriggerSet};
