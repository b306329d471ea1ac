// src/session.rs

//! Timed attempt session state machine.
//!
//! Models the client-side quiz-taking flow: a countdown that starts on the
//! first answer interaction, forced submission on timeout or focus loss, and
//! a manual submit path behind a confirmation step. Every transition takes
//! the current `Instant` so the machine is fully deterministic under test.
//!
//! Focus-loss detection is an advisory integrity signal only. It is trivially
//! bypassable and must never be treated as a security boundary.
//!
//! The machine guarantees that at most one submission payload is produced per
//! flight: once a payload has been handed out, every further timeout, blur or
//! submit trigger returns `None` until the caller reports the outcome.

use std::fmt;
use std::time::{Duration, Instant};

use crate::models::attempt::{AnswerInput, SubmitAttemptRequest, UNANSWERED};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    InProgress,
    /// Manual submit requested; countdown paused until confirmed or canceled.
    AwaitingConfirmation,
    /// A payload is in flight; all triggers are suppressed.
    Submitting,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    QuestionOutOfRange,
    /// The session is not accepting answers in its current phase.
    NotAnswerable,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::QuestionOutOfRange => write!(f, "question index out of range"),
            SessionError::NotAnswerable => write!(f, "session is not accepting answers"),
        }
    }
}

impl std::error::Error for SessionError {}

pub struct AttemptSession {
    time_limit: Duration,
    answers: Vec<Option<i64>>,
    phase: Phase,
    /// Wall-clock deadline; set while `InProgress`.
    deadline: Option<Instant>,
    /// Remaining time, authoritative whenever the countdown is paused.
    remaining: Duration,
}

impl AttemptSession {
    pub fn new(question_count: usize, time_limit_minutes: u64) -> Self {
        let time_limit = Duration::from_secs(time_limit_minutes * 60);
        AttemptSession {
            time_limit,
            answers: vec![None; question_count],
            phase: Phase::NotStarted,
            deadline: None,
            remaining: time_limit,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn answer(&self, question: usize) -> Option<i64> {
        self.answers.get(question).copied().flatten()
    }

    /// Time left on the countdown. Before the first interaction this is the
    /// full limit; while paused it is the value captured at the pause.
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.phase {
            Phase::InProgress => self
                .deadline
                .map(|d| d.saturating_duration_since(now))
                .unwrap_or(self.remaining),
            _ => self.remaining,
        }
    }

    /// Records an answer. The first interaction starts the countdown.
    pub fn select_answer(
        &mut self,
        question: usize,
        option: i64,
        now: Instant,
    ) -> Result<(), SessionError> {
        // Rejected interactions must not start the countdown.
        if question >= self.answers.len() {
            return Err(SessionError::QuestionOutOfRange);
        }
        if self.phase == Phase::NotStarted {
            self.deadline = Some(now + self.time_limit);
            self.phase = Phase::InProgress;
        }
        if self.phase != Phase::InProgress {
            return Err(SessionError::NotAnswerable);
        }
        self.answers[question] = Some(option);
        Ok(())
    }

    /// Countdown pulse. Past the deadline this forces a submission.
    pub fn tick(&mut self, now: Instant) -> Option<SubmitAttemptRequest> {
        if self.phase == Phase::InProgress && self.remaining(now) == Duration::ZERO {
            return Some(self.begin_submission(now, true));
        }
        None
    }

    /// Tab hidden or window blurred: forces a submission immediately,
    /// including while the confirmation dialog is showing.
    pub fn focus_lost(&mut self, now: Instant) -> Option<SubmitAttemptRequest> {
        match self.phase {
            Phase::InProgress | Phase::AwaitingConfirmation => {
                Some(self.begin_submission(now, true))
            }
            _ => None,
        }
    }

    /// Manual submit: opens the confirmation step and pauses the countdown.
    pub fn request_submit(&mut self, now: Instant) {
        if self.phase == Phase::InProgress {
            self.remaining = self.remaining(now);
            self.deadline = None;
            self.phase = Phase::AwaitingConfirmation;
        }
    }

    /// Backs out of the confirmation step; the countdown resumes from where
    /// it was paused.
    pub fn cancel_submit(&mut self, now: Instant) {
        if self.phase == Phase::AwaitingConfirmation {
            self.deadline = Some(now + self.remaining);
            self.phase = Phase::InProgress;
        }
    }

    /// Confirms the manual submit.
    pub fn confirm_submit(&mut self, now: Instant) -> Option<SubmitAttemptRequest> {
        if self.phase == Phase::AwaitingConfirmation {
            return Some(self.begin_submission(now, false));
        }
        None
    }

    /// The in-flight request failed; the session returns to `InProgress` with
    /// the countdown resumed from the moment the submission started.
    pub fn submission_failed(&mut self, now: Instant) {
        if self.phase == Phase::Submitting {
            self.deadline = Some(now + self.remaining);
            self.phase = Phase::InProgress;
        }
    }

    /// The in-flight request was acknowledged; the session is finished.
    pub fn submission_succeeded(&mut self) {
        if self.phase == Phase::Submitting {
            self.phase = Phase::Done;
        }
    }

    fn begin_submission(&mut self, now: Instant, forced: bool) -> SubmitAttemptRequest {
        self.remaining = self.remaining(now);
        self.deadline = None;
        self.phase = Phase::Submitting;

        let answers = self
            .answers
            .iter()
            .enumerate()
            .map(|(index, selected)| AnswerInput {
                question_index: index as i64,
                selected_option: selected.unwrap_or(UNANSWERED),
            })
            .collect();

        SubmitAttemptRequest {
            answers,
            time_spent: (self.time_limit - self.remaining).as_secs() as i64,
            forced_submit: forced,
        }
    }
}
