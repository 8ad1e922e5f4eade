use crate::api::types::{NewChoice, NewQuestion, NewQuiz, PracticeQuestion};
use crate::error::{Error, Result};

/// Index of the correct option: the first option equal to `answer`, or 0 when
/// nothing matches.
pub fn correct_index(question: &PracticeQuestion) -> usize {
    question
        .options
        .iter()
        .position(|option| *option == question.answer)
        .unwrap_or(0)
}

/// Turns a generated practice set into a quiz payload for the lesson.
pub fn practice_to_quiz(lesson_title: &str, questions: &[PracticeQuestion]) -> NewQuiz {
    NewQuiz {
        title: format!("Required Quiz: {}", lesson_title),
        questions: questions
            .iter()
            .map(|q| {
                let correct = correct_index(q);
                NewQuestion {
                    text: q.question.clone(),
                    choices: q
                        .options
                        .iter()
                        .enumerate()
                        .map(|(i, option)| NewChoice {
                            text: option.clone(),
                            is_correct: i == correct,
                        })
                        .collect(),
                }
            })
            .collect(),
    }
}

/// The single-question quiz form instructors fill in by hand.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizDraft {
    pub title: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

impl Default for QuizDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            question: String::new(),
            options: vec![String::new(); 4],
            correct_index: 0,
        }
    }
}

impl QuizDraft {
    pub fn to_quiz(&self) -> Result<NewQuiz> {
        if self.title.trim().is_empty() || self.question.trim().is_empty() {
            return Err(Error::Invalid("quiz title and question are required"));
        }
        if self.options.is_empty() || self.options.iter().any(|o| o.trim().is_empty()) {
            return Err(Error::Invalid("every option needs text"));
        }
        if self.correct_index >= self.options.len() {
            return Err(Error::Invalid("correct option is out of range"));
        }

        Ok(NewQuiz {
            title: self.title.clone(),
            questions: vec![NewQuestion {
                text: self.question.clone(),
                choices: self
                    .options
                    .iter()
                    .enumerate()
                    .map(|(i, option)| NewChoice {
                        text: option.clone(),
                        is_correct: i == self.correct_index,
                    })
                    .collect(),
            }],
        })
    }
}
