//! Quiz grading.

use serde::{Deserialize, Serialize};

use crate::module_content::ModuleContent;

/// Passing threshold used when a program does not set its own.
pub const DEFAULT_PASSING_SCORE: i16 = 80;

/// Validate a program-level passing score (percent).
pub fn validate_passing_score(score: i16) -> Result<(), String> {
    if (0..=100).contains(&score) {
        Ok(())
    } else {
        Err(format!("passing_score must be between 0 and 100, got {score}"))
    }
}

/// Result of grading one submission. Stored on the item progress row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOutcome {
    /// The option index the learner picked for each question.
    pub answers: Vec<usize>,
    pub correct_count: i32,
    pub total_count: i32,
    /// Percentage, rounded.
    pub score: i16,
    pub passed: bool,
}

/// Grade `answers` against the authored content.
///
/// Returns `Err` when the module has no questions or the number of answers
/// does not match. A question counts as correct only when the picked index
/// equals its `correctIndex`.
pub fn grade(
    content: &ModuleContent,
    answers: &[usize],
    passing_score: i16,
) -> Result<QuizOutcome, String> {
    let questions = content.questions();
    if questions.is_empty() {
        return Err(format!(
            "Module of type '{}' has no questions to answer",
            content.type_name()
        ));
    }
    if answers.len() != questions.len() {
        return Err(format!(
            "Expected {} answers, got {}",
            questions.len(),
            answers.len()
        ));
    }

    let correct = questions
        .iter()
        .zip(answers)
        .filter(|(q, a)| q.correct_index == **a)
        .count();
    let total = questions.len();

    Ok(QuizOutcome {
        answers: answers.to_vec(),
        correct_count: correct as i32,
        total_count: total as i32,
        score: ((correct as f64 / total as f64) * 100.0).round() as i16,
        // Integer comparison so 4/5 at 80% passes exactly.
        passed: correct as i64 * 100 >= passing_score as i64 * total as i64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_content::QuizQuestion;

    fn quiz(correct: &[usize]) -> ModuleContent {
        ModuleContent::FinalQuiz {
            questions: correct
                .iter()
                .enumerate()
                .map(|(i, c)| QuizQuestion {
                    prompt: format!("Q{i}"),
                    options: vec!["a".into(), "b".into(), "c".into()],
                    correct_index: *c,
                })
                .collect(),
        }
    }

    #[test]
    fn test_all_correct_passes() {
        let outcome = grade(&quiz(&[0, 1, 2]), &[0, 1, 2], DEFAULT_PASSING_SCORE).unwrap();
        assert_eq!(outcome.correct_count, 3);
        assert_eq!(outcome.score, 100);
        assert!(outcome.passed);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let outcome = grade(&quiz(&[0, 0, 0, 0, 0]), &[0, 0, 0, 0, 1], 80).unwrap();
        assert_eq!(outcome.score, 80);
        assert!(outcome.passed);
    }

    #[test]
    fn test_below_threshold_fails() {
        let outcome = grade(&quiz(&[0, 0, 0]), &[0, 0, 1], 80).unwrap();
        assert_eq!(outcome.score, 67);
        assert!(!outcome.passed);
    }

    #[test]
    fn test_single_question_module() {
        let content = ModuleContent::Question {
            question: QuizQuestion {
                prompt: "Pick b".into(),
                options: vec!["a".into(), "b".into()],
                correct_index: 1,
            },
        };
        assert!(grade(&content, &[1], DEFAULT_PASSING_SCORE).unwrap().passed);
        assert!(!grade(&content, &[0], DEFAULT_PASSING_SCORE).unwrap().passed);
    }

    #[test]
    fn test_answer_count_mismatch_rejected() {
        assert!(grade(&quiz(&[0, 1]), &[0], DEFAULT_PASSING_SCORE).is_err());
    }

    #[test]
    fn test_ungraded_module_rejected() {
        let content = ModuleContent::ContentSection { body: "text".into() };
        assert!(grade(&content, &[], DEFAULT_PASSING_SCORE).is_err());
    }

    #[test]
    fn test_passing_score_bounds() {
        assert!(validate_passing_score(0).is_ok());
        assert!(validate_passing_score(100).is_ok());
        assert!(validate_passing_score(101).is_err());
        assert!(validate_passing_score(-1).is_err());
    }
}
