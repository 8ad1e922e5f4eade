use std::collections::BTreeMap;

use crate::api::types::{ChoiceId, Quiz, QuestionId, QuizResult};
use crate::error::{Error, Result};

/// One student's pass through a lesson quiz.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum QuizAttempt {
    #[default]
    NotStarted,
    InProgress {
        quiz: Quiz,
        answers: BTreeMap<QuestionId, ChoiceId>,
    },
    Reviewed {
        quiz: Quiz,
        answers: BTreeMap<QuestionId, ChoiceId>,
        result: QuizResult,
    },
}

impl QuizAttempt {
    pub fn start(quiz: Quiz) -> Self {
        QuizAttempt::InProgress {
            quiz,
            answers: BTreeMap::new(),
        }
    }

    pub fn quiz(&self) -> Option<&Quiz> {
        match self {
            QuizAttempt::NotStarted => None,
            QuizAttempt::InProgress { quiz, .. } | QuizAttempt::Reviewed { quiz, .. } => Some(quiz),
        }
    }

    pub fn answers(&self) -> Option<&BTreeMap<QuestionId, ChoiceId>> {
        match self {
            QuizAttempt::NotStarted => None,
            QuizAttempt::InProgress { answers, .. } | QuizAttempt::Reviewed { answers, .. } => {
                Some(answers)
            }
        }
    }

    pub fn result(&self) -> Option<&QuizResult> {
        match self {
            QuizAttempt::Reviewed { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Records one choice per question; a later choice replaces an earlier one.
    pub fn answer(&mut self, question: QuestionId, choice: ChoiceId) -> Result<()> {
        let QuizAttempt::InProgress { quiz, answers } = self else {
            return Err(Error::NotPermitted("no quiz in progress"));
        };

        let known = quiz
            .questions
            .iter()
            .find(|q| q.id == question)
            .ok_or(Error::Invalid("question is not part of this quiz"))?
            .choices
            .iter()
            .any(|c| c.id == choice);
        if !known {
            return Err(Error::Invalid("choice does not belong to the question"));
        }

        answers.insert(question, choice);
        Ok(())
    }

    /// Submission opens once every question has a recorded choice.
    pub fn can_submit(&self) -> bool {
        match self {
            QuizAttempt::InProgress { quiz, answers } => answers.len() >= quiz.questions.len(),
            _ => false,
        }
    }

    pub(crate) fn ensure_complete(&self) -> Result<&BTreeMap<QuestionId, ChoiceId>> {
        match self {
            QuizAttempt::InProgress { quiz, answers } => {
                if answers.len() < quiz.questions.len() {
                    Err(Error::Incomplete {
                        answered: answers.len(),
                        total: quiz.questions.len(),
                    })
                } else {
                    Ok(answers)
                }
            }
            _ => Err(Error::NotPermitted("no quiz in progress")),
        }
    }

    pub(crate) fn review(&mut self, result: QuizResult) {
        if let QuizAttempt::InProgress { quiz, answers } = std::mem::take(self) {
            *self = QuizAttempt::Reviewed {
                quiz,
                answers,
                result,
            };
        }
    }
}
