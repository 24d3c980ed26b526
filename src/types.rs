//! Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Per-module progress lifecycle. Transitions only move forward:
/// not_started -> in_progress -> completed, with completed terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::NotStarted => "not_started",
            ProgressStatus::InProgress => "in_progress",
            ProgressStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressStatus::Completed)
    }

    /// Forward-only state machine check. A failed quiz attempt stays
    /// in_progress; nothing ever returns to not_started.
    pub fn can_transition_to(&self, next: ProgressStatus) -> bool {
        use ProgressStatus::*;
        match (self, next) {
            (NotStarted, InProgress) | (NotStarted, Completed) => true,
            (InProgress, InProgress) | (InProgress, Completed) => true,
            (Completed, Completed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgressStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(ProgressStatus::NotStarted),
            "in_progress" => Ok(ProgressStatus::InProgress),
            "completed" => Ok(ProgressStatus::Completed),
            other => Err(format!("unknown progress status: {}", other)),
        }
    }
}

/// Publication lifecycle for catalog content (programs, courses, lessons,
/// modules). Archived doubles as the soft-delete flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Draft,
    Published,
    Archived,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Published => "published",
            ContentStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ContentStatus::Draft),
            "published" => Ok(ContentStatus::Published),
            "archived" => Ok(ContentStatus::Archived),
            other => Err(format!("unknown content status: {}", other)),
        }
    }
}

/// How a module counts as finished for the user who interacted with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionMethod {
    /// Video playback reached the completion threshold (>= 95%).
    VideoWatched,
    /// Quiz attempt scored at or above the passing mark.
    QuizPassed,
    /// Explicit "mark complete" action.
    Manual,
}

/// Offset/limit pagination parsed from query strings, clamped server-side.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Page {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Page {
    pub const DEFAULT_LIMIT: i64 = 50;

    pub fn limit(&self, max: i64) -> i64 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, max)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_status_round_trips() {
        for s in [ProgressStatus::NotStarted, ProgressStatus::InProgress, ProgressStatus::Completed] {
            assert_eq!(s.as_str().parse::<ProgressStatus>().unwrap(), s);
        }
        assert!("done".parse::<ProgressStatus>().is_err());
    }

    #[test]
    fn completed_is_terminal() {
        assert!(ProgressStatus::Completed.is_terminal());
        assert!(!ProgressStatus::Completed.can_transition_to(ProgressStatus::InProgress));
        assert!(!ProgressStatus::Completed.can_transition_to(ProgressStatus::NotStarted));
        assert!(!ProgressStatus::InProgress.can_transition_to(ProgressStatus::NotStarted));
    }

    #[test]
    fn failed_attempt_keeps_in_progress() {
        // A failed quiz stays in_progress; re-asserting the same state is legal.
        assert!(ProgressStatus::InProgress.can_transition_to(ProgressStatus::InProgress));
    }

    #[test]
    fn page_clamps_limit_and_offset() {
        let page = Page { limit: Some(10_000), offset: Some(-5) };
        assert_eq!(page.limit(100), 100);
        assert_eq!(page.offset(), 0);

        let page = Page::default();
        assert_eq!(page.limit(100), Page::DEFAULT_LIMIT);
        assert_eq!(page.offset(), 0);
    }
}
