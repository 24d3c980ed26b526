//! Per-module progress tracking and the program completion aggregator.
//!
//! `calculate_program_progress` is the only writer of `user_program_progress`:
//! it recounts required-module completions from scratch and upserts the
//! summary row under the (user_id, program_id) natural key. Concurrent
//! recomputes for the same key are safe because the last writer persists a
//! full recount, never an increment.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config;
use crate::database::models::{UserProgramProgress, UserProgress};
use crate::types::{CompletionMethod, ProgressStatus};
use crate::workers::recompute::RecomputeQueue;

#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("completion not eligible: {0}")]
    NotEligible(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Outcome of a program progress recompute, also persisted as the summary row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgramCompletion {
    pub completion_percentage: i32,
    pub is_completed: bool,
}

/// Evidence accompanying a module completion request
#[derive(Debug, Deserialize)]
pub struct ModuleCompletion {
    pub method: CompletionMethod,
    /// Quiz score (percentage) for quiz_passed completions
    pub score: Option<i32>,
    /// Portion of the video watched (percentage) for video_watched completions
    pub watched_percentage: Option<i32>,
}

/// Percentage of required modules completed, rounded half-up to an integer.
/// Callers handle the zero-total case before reaching this.
pub(crate) fn completion_percentage(completed: i64, total: i64) -> i32 {
    debug_assert!(total > 0);
    (100.0 * completed as f64 / total as f64).round() as i32
}

pub struct ProgressService {
    pool: PgPool,
}

impl ProgressService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lazily create the (user, module) progress row on first interaction.
    /// Idempotent: a repeat start touches updated_at and returns the row as-is.
    pub async fn start_module(
        &self,
        user_id: Uuid,
        module_id: Uuid,
    ) -> Result<UserProgress, ProgressError> {
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM modules WHERE id = $1")
            .bind(module_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(ProgressError::NotFound(format!("module {} not found", module_id)));
        }

        let row = sqlx::query_as::<_, UserProgress>(
            "INSERT INTO user_progress (user_id, module_id, status) \
             VALUES ($1, $2, 'in_progress') \
             ON CONFLICT (user_id, module_id) DO UPDATE SET updated_at = now() \
             RETURNING *",
        )
        .bind(user_id)
        .bind(module_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Record a quiz attempt. A passing score completes the module; a failing
    /// score increments attempts and leaves the row in_progress.
    pub async fn record_attempt(
        &self,
        progress_id: Uuid,
        score: i32,
    ) -> Result<UserProgress, ProgressError> {
        let row = self.get_progress_404(progress_id).await?;
        if parse_status(&row.status).is_terminal() {
            // Completed is terminal; late attempts are ignored
            return Ok(row);
        }

        let pass_mark = config::config().progress.quiz_pass_mark;
        if score >= pass_mark {
            return self
                .complete_module(
                    progress_id,
                    ModuleCompletion {
                        method: CompletionMethod::QuizPassed,
                        score: Some(score),
                        watched_percentage: None,
                    },
                )
                .await;
        }

        let row = sqlx::query_as::<_, UserProgress>(
            "UPDATE user_progress SET attempts = attempts + 1, updated_at = now() \
             WHERE id = $1 RETURNING *",
        )
        .bind(progress_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Mark a progress row completed and queue a program-level recompute.
    ///
    /// Re-completing an already-completed row is a strict no-op that keeps
    /// the original completed_at. The recompute is dispatched fire-and-forget;
    /// its failure never fails this call, so the program summary can
    /// transiently lag module completion.
    pub async fn complete_module(
        &self,
        progress_id: Uuid,
        completion: ModuleCompletion,
    ) -> Result<UserProgress, ProgressError> {
        let row = self.get_progress_404(progress_id).await?;
        if parse_status(&row.status).is_terminal() {
            return Ok(row);
        }

        check_eligibility(&completion)?;

        // The status guard makes the terminal no-op atomic: of two racing
        // completes, only one UPDATE matches, so completed_at and attempts
        // are written exactly once.
        let count_attempt = completion.method == CompletionMethod::QuizPassed;
        let updated = sqlx::query_as::<_, UserProgress>(
            "UPDATE user_progress SET \
                 status = 'completed', \
                 completion_percentage = 100, \
                 completed_at = now(), \
                 attempts = attempts + CASE WHEN $2 THEN 1 ELSE 0 END, \
                 updated_at = now() \
             WHERE id = $1 AND status <> 'completed' RETURNING *",
        )
        .bind(progress_id)
        .bind(count_attempt)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = updated else {
            // Lost the race to another completer, which also queued the
            // recompute; return the row as it now stands.
            return self.get_progress_404(progress_id).await;
        };

        match self.program_for_progress(progress_id).await? {
            Some(program_id) => {
                RecomputeQueue::instance().enqueue(row.user_id, program_id);
            }
            None => {
                tracing::warn!(
                    progress_id = %progress_id,
                    "completed module has no owning program; skipping recompute"
                );
            }
        }

        Ok(row)
    }

    /// Recount required-module completions for (user, program) and upsert the
    /// denormalized summary row. Zero required modules yields 0% / not
    /// completed and writes nothing.
    pub async fn calculate_program_progress(
        &self,
        user_id: Uuid,
        program_id: Uuid,
    ) -> Result<ProgramCompletion, ProgressError> {
        let required: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT m.id FROM modules m \
             JOIN lessons l ON l.id = m.lesson_id \
             JOIN courses c ON c.id = l.course_id \
             WHERE c.program_id = $1 AND m.is_required = TRUE",
        )
        .bind(program_id)
        .fetch_all(&self.pool)
        .await?;

        if required.is_empty() {
            return Ok(ProgramCompletion { completion_percentage: 0, is_completed: false });
        }

        let required_ids: Vec<Uuid> = required.into_iter().map(|(id,)| id).collect();
        let completed: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM user_progress \
             WHERE user_id = $1 AND module_id = ANY($2) AND status = 'completed'",
        )
        .bind(user_id)
        .bind(&required_ids)
        .fetch_one(&self.pool)
        .await?;

        let pct = completion_percentage(completed.0, required_ids.len() as i64);
        let is_completed = pct == 100;
        let status =
            if is_completed { ProgressStatus::Completed } else { ProgressStatus::InProgress };

        sqlx::query(
            "INSERT INTO user_program_progress \
                 (user_id, program_id, status, completion_percentage, completed_at, updated_at) \
             VALUES ($1, $2, $3, $4, CASE WHEN $5 THEN now() END, now()) \
             ON CONFLICT (user_id, program_id) DO UPDATE SET \
                 status = EXCLUDED.status, \
                 completion_percentage = EXCLUDED.completion_percentage, \
                 completed_at = EXCLUDED.completed_at, \
                 updated_at = now()",
        )
        .bind(user_id)
        .bind(program_id)
        .bind(status.as_str())
        .bind(pct)
        .bind(is_completed)
        .execute(&self.pool)
        .await?;

        Ok(ProgramCompletion { completion_percentage: pct, is_completed })
    }

    pub async fn get_module_progress(
        &self,
        user_id: Uuid,
        module_id: Uuid,
    ) -> Result<Option<UserProgress>, ProgressError> {
        let row = sqlx::query_as::<_, UserProgress>(
            "SELECT * FROM user_progress WHERE user_id = $1 AND module_id = $2",
        )
        .bind(user_id)
        .bind(module_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_program_progress(
        &self,
        user_id: Uuid,
        program_id: Uuid,
    ) -> Result<Option<UserProgramProgress>, ProgressError> {
        let row = sqlx::query_as::<_, UserProgramProgress>(
            "SELECT * FROM user_program_progress WHERE user_id = $1 AND program_id = $2",
        )
        .bind(user_id)
        .bind(program_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// User ids with any progress inside a program, for bulk recomputes
    pub async fn enrolled_user_ids(&self, program_id: Uuid) -> Result<Vec<Uuid>, ProgressError> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT DISTINCT up.user_id FROM user_progress up \
             JOIN modules m ON m.id = up.module_id \
             JOIN lessons l ON l.id = m.lesson_id \
             JOIN courses c ON c.id = l.course_id \
             WHERE c.program_id = $1",
        )
        .bind(program_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    pub async fn find_progress(
        &self,
        progress_id: Uuid,
    ) -> Result<Option<UserProgress>, ProgressError> {
        let row = sqlx::query_as::<_, UserProgress>("SELECT * FROM user_progress WHERE id = $1")
            .bind(progress_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_progress_404(&self, progress_id: Uuid) -> Result<UserProgress, ProgressError> {
        self.find_progress(progress_id)
            .await?
            .ok_or_else(|| ProgressError::NotFound(format!("progress {} not found", progress_id)))
    }

    /// Owning program of a progress row via the Module -> Lesson -> Course chain
    async fn program_for_progress(&self, progress_id: Uuid) -> Result<Option<Uuid>, ProgressError> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT c.program_id FROM user_progress up \
             JOIN modules m ON m.id = up.module_id \
             JOIN lessons l ON l.id = m.lesson_id \
             JOIN courses c ON c.id = l.course_id \
             WHERE up.id = $1",
        )
        .bind(progress_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(id,)| id))
    }
}

fn parse_status(status: &str) -> ProgressStatus {
    // Rows only ever hold the three known values; treat anything else as active
    status.parse().unwrap_or(ProgressStatus::InProgress)
}

fn check_eligibility(completion: &ModuleCompletion) -> Result<(), ProgressError> {
    let progress_config = &config::config().progress;
    match completion.method {
        CompletionMethod::VideoWatched => {
            let watched = completion.watched_percentage.unwrap_or(0);
            if watched < progress_config.video_completion_threshold {
                return Err(ProgressError::NotEligible(format!(
                    "watched {}% but {}% is required",
                    watched, progress_config.video_completion_threshold
                )));
            }
        }
        CompletionMethod::QuizPassed => {
            let score = completion.score.unwrap_or(0);
            if score < progress_config.quiz_pass_mark {
                return Err(ProgressError::NotEligible(format!(
                    "scored {} but the pass mark is {}",
                    score, progress_config.quiz_pass_mark
                )));
            }
        }
        CompletionMethod::Manual => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_up() {
        // Round-half-up convention, fixed here because the two legacy
        // implementations (SQL truncation vs service-layer rounding) diverged.
        assert_eq!(completion_percentage(1, 3), 33);
        assert_eq!(completion_percentage(2, 3), 67);
        assert_eq!(completion_percentage(1, 6), 17);
        assert_eq!(completion_percentage(5, 6), 83);
        assert_eq!(completion_percentage(1, 8), 13);
    }

    #[test]
    fn monotonic_four_module_walk() {
        assert_eq!(completion_percentage(1, 4), 25);
        assert_eq!(completion_percentage(2, 4), 50);
        assert_eq!(completion_percentage(3, 4), 75);
        assert_eq!(completion_percentage(4, 4), 100);
    }

    #[test]
    fn full_and_empty_counts() {
        assert_eq!(completion_percentage(0, 5), 0);
        assert_eq!(completion_percentage(5, 5), 100);
    }

    #[test]
    fn video_completion_needs_threshold() {
        let below = ModuleCompletion {
            method: CompletionMethod::VideoWatched,
            score: None,
            watched_percentage: Some(90),
        };
        assert!(check_eligibility(&below).is_err());

        let at = ModuleCompletion {
            method: CompletionMethod::VideoWatched,
            score: None,
            watched_percentage: Some(95),
        };
        assert!(check_eligibility(&at).is_ok());

        let missing = ModuleCompletion {
            method: CompletionMethod::VideoWatched,
            score: None,
            watched_percentage: None,
        };
        assert!(check_eligibility(&missing).is_err());
    }

    #[test]
    fn quiz_completion_needs_pass_mark() {
        let fail = ModuleCompletion {
            method: CompletionMethod::QuizPassed,
            score: Some(50),
            watched_percentage: None,
        };
        assert!(check_eligibility(&fail).is_err());

        let pass = ModuleCompletion {
            method: CompletionMethod::QuizPassed,
            score: Some(70),
            watched_percentage: None,
        };
        assert!(check_eligibility(&pass).is_ok());
    }

    #[test]
    fn manual_completion_is_always_eligible() {
        let manual = ModuleCompletion {
            method: CompletionMethod::Manual,
            score: None,
            watched_percentage: None,
        };
        assert!(check_eligibility(&manual).is_ok());
    }
}
