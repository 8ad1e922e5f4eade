use crate::error::Result;

use super::types::{
    AuthTokens, Course, CourseId, Detail, Lesson, LessonId, NewCourse, NewLesson, NewQuiz, PracticeSet,
    ProgressSummary, Quiz, QuizResult, RatingReceipt, Registration, Role, User,
};
use std::collections::BTreeMap;

/// Every remote operation the client needs, one method per endpoint.
///
/// Authenticated calls take the access token explicitly; implementations never
/// look tokens up on their own.
pub trait Backend {
    // --- auth ---
    fn login(&self, username: &str, password: &str) -> Result<AuthTokens>;

    fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Registration>;

    fn me(&self, access: &str) -> Result<User>;

    // --- courses ---
    fn list_courses(&self, access: Option<&str>) -> Result<Vec<Course>>;

    fn get_course(&self, access: &str, course: CourseId) -> Result<Course>;

    fn create_course(&self, access: &str, course: &NewCourse) -> Result<Course>;

    fn enroll(&self, access: &str, course: CourseId) -> Result<Detail>;

    fn progress_summary(&self, access: &str, course: CourseId) -> Result<ProgressSummary>;

    /// PDF bytes.
    fn certificate(&self, access: &str, course: CourseId) -> Result<Vec<u8>>;

    fn rate(&self, access: &str, course: CourseId, rating: u8) -> Result<RatingReceipt>;

    // --- lessons ---
    fn create_lesson(&self, access: &str, course: CourseId, lesson: &NewLesson) -> Result<Lesson>;

    fn complete_lesson(&self, access: &str, course: CourseId, lesson: LessonId) -> Result<Detail>;

    fn generate_practice(
        &self,
        access: &str,
        course: CourseId,
        lesson: LessonId,
    ) -> Result<PracticeSet>;

    // --- quizzes ---
    fn get_quiz(&self, access: &str, course: CourseId, lesson: LessonId) -> Result<Quiz>;

    fn submit_quiz(
        &self,
        access: &str,
        course: CourseId,
        lesson: LessonId,
        answers: &BTreeMap<u64, u64>,
    ) -> Result<QuizResult>;

    fn create_quiz(
        &self,
        access: &str,
        course: CourseId,
        lesson: LessonId,
        quiz: &NewQuiz,
    ) -> Result<Detail>;
}
