//! crates/study_helper_core/src/domain.rs
//!
//! Defines the core data structures shared by every part of the quiz client.
//! Field names follow the backend's JSON payloads so the same types are used
//! on the wire and in memory.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type CourseId = u64;
pub type MaterialId = u64;
pub type QuizId = u64;
pub type QuestionId = u64;

/// Content type assumed for materials uploaded without one.
pub const DEFAULT_MATERIAL_TYPE: &str = "application/pdf";

//=========================================================================================
// Course Materials
//=========================================================================================

/// An uploaded course material. `file_name` is the key its downloaded blob is cached under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: MaterialId,
    pub file_name: String,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
    /// Storage reference used to download the raw file.
    pub material_file_url: String,
}

impl Material {
    /// Human-readable file size, e.g. `"2.38 MB"`.
    pub fn formatted_size(&self) -> String {
        match self.file_size {
            Some(bytes) => format_file_size(bytes),
            None => "Unknown size".to_string(),
        }
    }

    pub fn display_type(&self) -> &str {
        self.file_type.as_deref().unwrap_or(DEFAULT_MATERIAL_TYPE)
    }
}

/// Formats a byte count as B, KB (one decimal) or MB (two decimals).
pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1_048_576 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.2} MB", bytes as f64 / 1_048_576.0)
    }
}

/// A downloaded binary payload together with the content type it was served as.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub data: Bytes,
    pub content_type: String,
}

//=========================================================================================
// Quizzes and Questions
//=========================================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizStatus {
    Generating,
    #[default]
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: QuizId,
    #[serde(alias = "quiz_title")]
    pub title: String,
    #[serde(alias = "course")]
    pub course_id: u64,
    pub number_of_questions: u32,
    #[serde(default)]
    pub time_limit_minutes: Option<u32>,
    #[serde(default)]
    pub status: QuizStatus,
}

/// Payload for manually creating a quiz within a course.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewQuiz {
    pub quiz_title: String,
    pub number_of_questions: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub material_list: Vec<MaterialId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "MCQ")]
    Mcq,
    #[serde(rename = "TRUE_FALSE")]
    TrueFalse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: u64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    #[serde(alias = "quiz")]
    pub quiz_id: QuizId,
    pub question: String,
    pub question_type: QuestionType,
    /// Only meaningful for MCQ questions.
    #[serde(default)]
    pub options: Vec<QuestionOption>,
}

impl Question {
    /// The values a user may select: option letters for MCQ, `"true"`/`"false"` otherwise.
    pub fn allowed_values(&self) -> Vec<String> {
        match self.question_type {
            QuestionType::Mcq => (0..self.options.len())
                .filter_map(|idx| char::from_u32('a' as u32 + idx as u32))
                .map(String::from)
                .collect(),
            QuestionType::TrueFalse => vec!["true".to_string(), "false".to_string()],
        }
    }

    pub fn accepts(&self, value: &str) -> bool {
        self.allowed_values().iter().any(|allowed| allowed == value)
    }
}

/// Selected values keyed by question id. Serializes as a JSON object with string keys.
pub type AnswerSet = BTreeMap<QuestionId, String>;

//=========================================================================================
// Grading
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_id: QuestionId,
    pub is_correct: bool,
    #[serde(default)]
    pub correct_answer: Option<String>,
}

/// The graded outcome of one submission, in the order the server returned it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuizResult {
    pub items: Vec<QuestionResult>,
}

impl QuizResult {
    pub fn for_question(&self, question_id: QuestionId) -> Option<&QuestionResult> {
        self.items.iter().find(|r| r.question_id == question_id)
    }

    pub fn score(&self) -> usize {
        self.items.iter().filter(|r| r.is_correct).count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

//=========================================================================================
// Quick-create ("upload + generate")
//=========================================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuickCreateRequest {
    pub material_file_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_questions: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickCreateResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub quiz_id: QuizId,
    #[serde(default)]
    pub quiz_title: Option<String>,
    #[serde(default)]
    pub number_of_questions: Option<u32>,
    pub status: QuizStatus,
}

/// One answer from the status endpoint the generation poller queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickCreateStatus {
    pub quiz_id: QuizId,
    #[serde(default)]
    pub quiz_title: Option<String>,
    pub status: QuizStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub quiz: Option<Quiz>,
    #[serde(default)]
    pub questions: Option<Vec<Question>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(file_size: Option<u64>) -> Material {
        Material {
            id: 1,
            file_name: "notes.pdf".to_string(),
            file_type: None,
            file_size,
            uploaded_at: None,
            material_file_url: "2025-06-05T08:55:05_notes".to_string(),
        }
    }

    #[test]
    fn formats_sizes_like_the_materials_view() {
        assert_eq!(material(Some(2_500_000)).formatted_size(), "2.38 MB");
        assert_eq!(material(Some(512)).formatted_size(), "512 B");
        assert_eq!(material(Some(1536)).formatted_size(), "1.5 KB");
        assert_eq!(material(None).formatted_size(), "Unknown size");
    }

    #[test]
    fn material_type_defaults_to_pdf() {
        assert_eq!(material(None).display_type(), "application/pdf");
    }

    #[test]
    fn mcq_accepts_letters_up_to_option_count() {
        let question = Question {
            id: 7,
            quiz_id: 1,
            question: "Pick one".to_string(),
            question_type: QuestionType::Mcq,
            options: (0..3)
                .map(|id| QuestionOption { id, text: format!("option {id}") })
                .collect(),
        };
        assert!(question.accepts("a"));
        assert!(question.accepts("c"));
        assert!(!question.accepts("d"));
        assert!(!question.accepts("true"));
    }

    #[test]
    fn true_false_ignores_options() {
        let question: Question = serde_json::from_value(serde_json::json!({
            "id": 3,
            "quiz": 9,
            "question": "Rust has a GC",
            "question_type": "TRUE_FALSE"
        }))
        .unwrap();
        assert_eq!(question.quiz_id, 9);
        assert!(question.accepts("false"));
        assert!(!question.accepts("a"));
    }

    #[test]
    fn answer_set_serializes_with_string_keys() {
        let mut answers = AnswerSet::new();
        answers.insert(12, "b".to_string());
        let json = serde_json::to_value(&answers).unwrap();
        assert_eq!(json, serde_json::json!({ "12": "b" }));
    }

    #[test]
    fn quiz_result_joins_by_question_id() {
        let result: QuizResult = serde_json::from_value(serde_json::json!([
            { "question_id": 1, "is_correct": true },
            { "question_id": 2, "is_correct": false, "correct_answer": "c" }
        ]))
        .unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.score(), 1);
        assert_eq!(
            result.for_question(2).and_then(|r| r.correct_answer.as_deref()),
            Some("c")
        );
    }
}
