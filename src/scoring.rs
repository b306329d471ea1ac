// src/scoring.rs

use crate::models::attempt::{AnswerInput, AnswerResult, UNANSWERED};
use crate::models::quiz::Question;

/// Result of grading one submission against one quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct GradedAttempt {
    pub answers: Vec<AnswerResult>,
    pub score: i64,
    pub total_points: i64,
}

/// Grades a submission. Pure computation; persistence is the caller's job.
///
/// Answers align with questions by position: the i-th submitted entry answers
/// the i-th question. A missing entry (submission shorter than the quiz) and
/// the -1 sentinel both count as unanswered, which is simply incorrect. An
/// out-of-range selection can never match the correct index, so it needs no
/// special casing. `total_points` accumulates every question's point value
/// regardless of correctness, so `score <= total_points` always holds.
pub fn grade(questions: &[Question], submitted: &[AnswerInput]) -> GradedAttempt {
    let mut score = 0;
    let mut total_points = 0;
    let mut answers = Vec::with_capacity(questions.len());

    for (index, question) in questions.iter().enumerate() {
        total_points += question.points;

        let selected = submitted
            .get(index)
            .map(|a| a.selected_option)
            .unwrap_or(UNANSWERED);

        let is_correct = selected == question.correct_answer;
        let points = if is_correct { question.points } else { 0 };
        score += points;

        answers.push(AnswerResult {
            question_index: index as i64,
            selected_option: selected,
            is_correct,
            points,
        });
    }

    GradedAttempt {
        answers,
        score,
        total_points,
    }
}
