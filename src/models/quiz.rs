// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::{Validate, ValidationError};

use crate::id::Id;

/// A single multiple-choice question, embedded in the quiz row as JSON.
/// Identity is the position index; attempts reference questions by index and
/// store graded results as a snapshot, so later quiz edits never regrade them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub text: String,

    /// Ordered option strings (at least two).
    pub options: Vec<String>,

    /// Index into `options` of the correct choice.
    pub correct_answer: i64,

    /// Positive point value awarded for a correct answer.
    pub points: i64,
}

/// Represents the 'quizzes' table, joined with the creator's username.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Quiz {
    pub id: Id,
    pub title: String,
    pub description: Option<String>,
    pub questions: Json<Vec<Question>>,
    pub time_limit: i64,
    pub category: String,
    pub is_public: bool,
    pub created_by: Id,
    pub creator_username: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating or fully replacing a quiz.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: String,
    #[validate(length(max = 500, message = "Description must be less than 500 characters"))]
    pub description: Option<String>,
    #[validate(custom(function = validate_questions))]
    pub questions: Vec<QuestionInput>,
    #[validate(range(min = 1, message = "Time limit must be a positive number"))]
    pub time_limit: i64,
    #[serde(default = "default_category")]
    #[validate(length(min = 1, max = 50))]
    pub category: String,
    #[serde(default = "default_is_public")]
    pub is_public: bool,
}

fn default_category() -> String {
    "General".to_string()
}

fn default_is_public() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: i64,
    #[serde(default = "default_points")]
    pub points: i64,
}

fn default_points() -> i64 {
    1
}

impl From<QuestionInput> for Question {
    fn from(q: QuestionInput) -> Self {
        Question {
            text: q.text,
            options: q.options,
            correct_answer: q.correct_answer,
            points: q.points,
        }
    }
}

/// Validates the embedded question list:
/// at least one question, each with non-empty text, two or more options,
/// an in-bounds correct index and a positive point value.
fn validate_questions(questions: &[QuestionInput]) -> Result<(), ValidationError> {
    if questions.is_empty() {
        return Err(ValidationError::new("at_least_one_question"));
    }
    for q in questions {
        if q.text.trim().is_empty() {
            return Err(ValidationError::new("question_text_required"));
        }
        if q.options.len() < 2 {
            return Err(ValidationError::new("at_least_two_options"));
        }
        if q.correct_answer < 0 || q.correct_answer as usize >= q.options.len() {
            return Err(ValidationError::new("correct_answer_out_of_bounds"));
        }
        if q.points < 1 {
            return Err(ValidationError::new("points_must_be_positive"));
        }
    }
    Ok(())
}

/// DTO for sending a question to a client, hiding the correct index unless
/// the caller owns the quiz.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub text: String,
    pub options: Vec<String>,
    pub points: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CreatorInfo {
    pub id: Id,
    pub username: String,
}

/// Outbound quiz representation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResponse {
    pub id: Id,
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<QuestionView>,
    pub question_count: usize,
    pub time_limit: i64,
    pub category: String,
    pub is_public: bool,
    pub created_by: CreatorInfo,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Quiz {
    /// Converts the row into its outbound shape.
    /// With `redact` set, the correct answer indices are withheld.
    pub fn into_response(self, redact: bool) -> QuizResponse {
        let questions = self
            .questions
            .0
            .into_iter()
            .map(|q| QuestionView {
                text: q.text,
                options: q.options,
                points: q.points,
                correct_answer: if redact { None } else { Some(q.correct_answer) },
            })
            .collect::<Vec<_>>();
        QuizResponse {
            question_count: questions.len(),
            id: self.id,
            title: self.title,
            description: self.description,
            questions,
            time_limit: self.time_limit,
            category: self.category,
            is_public: self.is_public,
            created_by: CreatorInfo {
                id: self.created_by,
                username: self.creator_username,
            },
            created_at: self.created_at,
        }
    }
}

/// Paginated quiz listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizListResponse {
    pub quizzes: Vec<QuizResponse>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_quizzes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(correct: i64, options: usize) -> QuestionInput {
        QuestionInput {
            text: "What is 2 + 2?".to_string(),
            options: (0..options).map(|i| format!("option {i}")).collect(),
            correct_answer: correct,
            points: 1,
        }
    }

    fn request(questions: Vec<QuestionInput>) -> CreateQuizRequest {
        CreateQuizRequest {
            title: "Arithmetic".to_string(),
            description: None,
            questions,
            time_limit: 5,
            category: default_category(),
            is_public: true,
        }
    }

    #[test]
    fn quiz_requires_at_least_one_question() {
        assert!(request(vec![]).validate().is_err());
        assert!(request(vec![question(0, 2)]).validate().is_ok());
    }

    #[test]
    fn correct_answer_must_be_within_option_bounds() {
        assert!(request(vec![question(2, 2)]).validate().is_err());
        assert!(request(vec![question(-1, 2)]).validate().is_err());
        assert!(request(vec![question(1, 2)]).validate().is_ok());
    }

    #[test]
    fn validation_errors_carry_the_failing_code() {
        // The error params embed the offending question list, so rendering
        // the error must work with the full request payload attached.
        let err = request(vec![question(5, 2)]).validate().unwrap_err();
        assert!(err.to_string().contains("correct_answer_out_of_bounds"));
    }

    #[test]
    fn questions_need_two_or_more_options() {
        assert!(request(vec![question(0, 1)]).validate().is_err());
    }

    #[test]
    fn points_must_be_positive() {
        let mut q = question(0, 3);
        q.points = 0;
        assert!(request(vec![q]).validate().is_err());
    }

    #[test]
    fn time_limit_must_be_positive() {
        let mut req = request(vec![question(0, 2)]);
        req.time_limit = 0;
        assert!(req.validate().is_err());
    }
}
