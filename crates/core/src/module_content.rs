//! Typed module content.
//!
//! Stored as JSONB in `modules.content`, discriminated by a `type` field.

use serde::{Deserialize, Serialize};

pub const CONTENT_SECTION: &str = "content_section";
pub const VIDEO_SECTION: &str = "video_section";
pub const QUESTION: &str = "question";
pub const FINAL_QUIZ: &str = "final_quiz";

/// Minimum number of answer options per question.
pub const MIN_OPTIONS: usize = 2;

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    #[serde(rename = "correctIndex", alias = "correct_index")]
    pub correct_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModuleContent {
    ContentSection {
        body: String,
    },
    VideoSection {
        video_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration_secs: Option<u32>,
    },
    Question {
        question: QuizQuestion,
    },
    FinalQuiz {
        questions: Vec<QuizQuestion>,
    },
}

impl ModuleContent {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::ContentSection { .. } => CONTENT_SECTION,
            Self::VideoSection { .. } => VIDEO_SECTION,
            Self::Question { .. } => QUESTION,
            Self::FinalQuiz { .. } => FINAL_QUIZ,
        }
    }

    /// Questions a learner must answer to finish this module. Empty for
    /// reading and video modules.
    pub fn questions(&self) -> &[QuizQuestion] {
        match self {
            Self::Question { question } => std::slice::from_ref(question),
            Self::FinalQuiz { questions } => questions,
            Self::ContentSection { .. } | Self::VideoSection { .. } => &[],
        }
    }

    pub fn is_graded(&self) -> bool {
        !self.questions().is_empty()
    }
}

/// Validate authored content before it is stored.
pub fn validate_module_content(content: &ModuleContent) -> Result<(), String> {
    match content {
        ModuleContent::ContentSection { body } => {
            if body.trim().is_empty() {
                return Err("Content section body must not be empty".to_string());
            }
        }
        ModuleContent::VideoSection {
            video_url,
            duration_secs,
        } => {
            if video_url.trim().is_empty() {
                return Err("Video section requires a video_url".to_string());
            }
            if *duration_secs == Some(0) {
                return Err("Video duration must be positive".to_string());
            }
        }
        ModuleContent::Question { question } => validate_question(question, 1)?,
        ModuleContent::FinalQuiz { questions } => {
            if questions.is_empty() {
                return Err("Final quiz must contain at least one question".to_string());
            }
            for (i, q) in questions.iter().enumerate() {
                validate_question(q, i + 1)?;
            }
        }
    }
    Ok(())
}

fn validate_question(question: &QuizQuestion, number: usize) -> Result<(), String> {
    if question.prompt.trim().is_empty() {
        return Err(format!("Question {number} has an empty prompt"));
    }
    if question.options.len() < MIN_OPTIONS {
        return Err(format!(
            "Question {number} needs at least {MIN_OPTIONS} options"
        ));
    }
    if let Some(pos) = question.options.iter().position(|o| o.trim().is_empty()) {
        return Err(format!("Question {number} option {} is empty", pos + 1));
    }
    if question.correct_index >= question.options.len() {
        return Err(format!(
            "Question {number} correctIndex {} is out of range",
            question.correct_index
        ));
    }
    Ok(())
}
