use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type CourseId = u64;
pub type LessonId = u64;
pub type QuestionId = u64;
pub type ChoiceId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "student")]
    Student,
    #[serde(rename = "instructor")]
    Instructor,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Role::Student => "student",
            Role::Instructor => "instructor",
        })
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "instructor" => Ok(Role::Instructor),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
}

/// `POST /auth/login/` response.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthTokens {
    pub access: String,
    pub refresh: String,
}

/// `POST /auth/register/` response; the user is trusted as-is.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub access: String,
    pub refresh: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct NewAccount<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub instructor_name: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
    #[serde(default)]
    pub enrollment_count: u64,
    /// 0..=100, only meaningful for students
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub is_enrolled: bool,
    /// 0 means the course has no ratings yet
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub user_rating: Option<u8>,
}

impl Course {
    pub fn lesson(&self, id: LessonId) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == id)
    }

    /// Lessons in declared order, the way the lesson list is shown.
    pub fn ordered_lessons(&self) -> Vec<&Lesson> {
        let mut lessons: Vec<&Lesson> = self.lessons.iter().collect();
        lessons.sort_by_key(|l| l.order);
        lessons
    }

    pub fn has_ratings(&self) -> bool {
        self.average_rating > 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Lesson {
    pub id: LessonId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub has_quiz: bool,
    #[serde(default)]
    pub quiz_passed: bool,
}

impl Lesson {
    /// Counted as done: completed directly, or through its quiz.
    pub fn is_satisfied(&self) -> bool {
        self.is_completed || (self.has_quiz && self.quiz_passed)
    }
}

#[derive(Debug, Serialize)]
pub struct NewLesson {
    pub title: String,
    pub content: String,
    pub order: u32,
}

#[derive(Debug, Serialize)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Quiz {
    #[serde(default)]
    pub id: Option<u64>,
    pub title: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Choice {
    pub id: ChoiceId,
    pub text: String,
    /// Only revealed after submission; the student-facing fetch omits it.
    #[serde(default)]
    pub is_correct: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct QuizSubmission<'a> {
    pub answers: &'a BTreeMap<QuestionId, ChoiceId>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuizResult {
    pub score: u32,
    pub total: u32,
    pub passed: bool,
    #[serde(default)]
    pub correct_answers: Vec<CorrectAnswer>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CorrectAnswer {
    pub question_id: QuestionId,
    pub question_text: String,
    #[serde(default)]
    pub correct_choice_id: Option<ChoiceId>,
    pub correct_choice_text: String,
}

/// `create_quiz` payload; submitting replaces any quiz already on the lesson.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewQuiz {
    pub title: String,
    pub questions: Vec<NewQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewQuestion {
    pub text: String,
    pub choices: Vec<NewChoice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewChoice {
    pub text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PracticeSet {
    #[serde(default)]
    pub questions: Vec<PracticeQuestion>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PracticeQuestion {
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProgressSummary {
    #[serde(default)]
    pub students: Vec<StudentProgress>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StudentProgress {
    pub student_name: String,
    #[serde(default)]
    pub email: String,
    pub progress: u8,
}

/// Generic `{"detail": ...}` acknowledgement.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Detail {
    #[serde(default)]
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RatingReceipt {
    #[serde(default)]
    pub detail: String,
    pub rating: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_from_server_json() {
        let json = r#"{
            "id": 3,
            "title": "Rust 101",
            "description": "Ownership and friends",
            "instructor_name": "ferris",
            "created_at": "2024-05-01T10:00:00Z",
            "lessons": [
                {"id": 9, "course": 3, "title": "Borrowing", "content": "text", "order": 2,
                 "is_completed": false, "has_quiz": true, "quiz_passed": true},
                {"id": 8, "course": 3, "title": "Moves", "content": "https://youtu.be/abc", "order": 1,
                 "is_completed": true, "has_quiz": false, "quiz_passed": false}
            ],
            "enrollment_count": 12,
            "progress": 50,
            "is_enrolled": true,
            "average_rating": 4.5,
            "user_rating": null
        }"#;

        let course: Course = serde_json::from_str(json).unwrap();
        assert_eq!(course.instructor_name, "ferris");
        assert_eq!(course.user_rating, None);
        assert!(course.has_ratings());

        let ordered: Vec<LessonId> = course.ordered_lessons().iter().map(|l| l.id).collect();
        assert_eq!(ordered, vec![8, 9]);
        assert!(course.lesson(9).unwrap().is_satisfied());
        assert!(course.lesson(8).unwrap().is_satisfied());
    }

    #[test]
    fn lesson_satisfaction() {
        let mut lesson = Lesson {
            id: 1,
            title: "Intro".into(),
            content: String::new(),
            order: 1,
            is_completed: false,
            has_quiz: false,
            quiz_passed: false,
        };
        assert!(!lesson.is_satisfied());

        // a stale pass flag without a quiz does not count
        lesson.quiz_passed = true;
        assert!(!lesson.is_satisfied());

        lesson.has_quiz = true;
        assert!(lesson.is_satisfied());

        lesson.has_quiz = false;
        lesson.is_completed = true;
        assert!(lesson.is_satisfied());
    }

    #[test]
    fn student_quiz_has_no_correctness() {
        let json = r#"{"id": 1, "title": "Quiz", "questions": [
            {"id": 10, "text": "2+2?", "choices": [{"id": 100, "text": "4"}, {"id": 101, "text": "5"}]}
        ]}"#;
        let quiz: Quiz = serde_json::from_str(json).unwrap();
        assert!(quiz.questions[0].choices.iter().all(|c| c.is_correct.is_none()));
    }

    #[test]
    fn role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Instructor).unwrap(), "\"instructor\"");
        assert_eq!("student".parse::<Role>().unwrap(), Role::Student);
        assert!("admin".parse::<Role>().is_err());
    }
}
