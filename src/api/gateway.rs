use std::collections::BTreeMap;
use std::io::Read;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::error::{Error, Result};

use super::backend::Backend;
use super::types::{
    AuthTokens, Course, CourseId, Credentials, Detail, Lesson, LessonId, NewAccount, NewCourse,
    NewLesson, NewQuiz, PracticeSet, ProgressSummary, Quiz, QuizResult, QuizSubmission,
    RatingReceipt, Registration, Role, User,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/";

/// The single outbound HTTP client.
pub struct ApiGateway {
    base_url: String,
    agent: ureq::Agent,
}

impl ApiGateway {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            base_url: normalize_base_url(base_url),
            agent: builder.build(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: &str, path: &str, access: Option<&str>) -> ureq::Request {
        debug!(method, path, "api request");
        let request = self.agent.request(method, &self.url(path));
        match access {
            Some(token) => request.set("Authorization", &format!("Bearer {}", token)),
            None => request,
        }
    }

    fn get<T: DeserializeOwned>(&self, path: &str, access: Option<&str>) -> Result<T> {
        let response = self.request("GET", path, access).call()?;
        decode(response)
    }

    fn post<T: DeserializeOwned>(&self, path: &str, access: Option<&str>) -> Result<T> {
        let response = self.request("POST", path, access).call()?;
        decode(response)
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        access: Option<&str>,
        body: &B,
    ) -> Result<T> {
        let response = self.request("POST", path, access).send_json(body)?;
        decode(response)
    }
}

fn decode<T: DeserializeOwned>(response: ureq::Response) -> Result<T> {
    let body = response.into_string()?;
    // some acknowledgements come back empty
    let body = if body.trim().is_empty() { "{}" } else { &body };
    serde_json::from_str(body).map_err(|e| Error::Decode(e.to_string()))
}

pub(crate) fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim();
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    }
}

fn lesson_path(course: CourseId, lesson: LessonId, action: &str) -> String {
    format!("courses/{}/lessons/{}/{}/", course, lesson, action)
}

impl Backend for ApiGateway {
    fn login(&self, username: &str, password: &str) -> Result<AuthTokens> {
        self.post_json("auth/login/", None, &Credentials { username, password })
    }

    fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Registration> {
        let account = NewAccount {
            username,
            email,
            password,
            role,
        };
        self.post_json("auth/register/", None, &account)
    }

    fn me(&self, access: &str) -> Result<User> {
        self.get("auth/me/", Some(access))
    }

    fn list_courses(&self, access: Option<&str>) -> Result<Vec<Course>> {
        self.get("courses/", access)
    }

    fn get_course(&self, access: &str, course: CourseId) -> Result<Course> {
        self.get(&format!("courses/{}/", course), Some(access))
    }

    fn create_course(&self, access: &str, course: &NewCourse) -> Result<Course> {
        self.post_json("courses/", Some(access), course)
    }

    fn enroll(&self, access: &str, course: CourseId) -> Result<Detail> {
        self.post(&format!("courses/{}/enroll/", course), Some(access))
    }

    fn progress_summary(&self, access: &str, course: CourseId) -> Result<ProgressSummary> {
        self.get(&format!("courses/{}/progress_summary/", course), Some(access))
    }

    fn certificate(&self, access: &str, course: CourseId) -> Result<Vec<u8>> {
        let response = self
            .request("GET", &format!("courses/{}/certificate/", course), Some(access))
            .call()?;
        let mut bytes = Vec::new();
        response.into_reader().read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    fn rate(&self, access: &str, course: CourseId, rating: u8) -> Result<RatingReceipt> {
        self.post_json(
            &format!("courses/{}/rate/", course),
            Some(access),
            &json!({ "rating": rating }),
        )
    }

    fn create_lesson(&self, access: &str, course: CourseId, lesson: &NewLesson) -> Result<Lesson> {
        self.post_json(&format!("courses/{}/lessons/", course), Some(access), lesson)
    }

    fn complete_lesson(&self, access: &str, course: CourseId, lesson: LessonId) -> Result<Detail> {
        self.post(&lesson_path(course, lesson, "complete"), Some(access))
    }

    fn generate_practice(
        &self,
        access: &str,
        course: CourseId,
        lesson: LessonId,
    ) -> Result<PracticeSet> {
        self.post(&lesson_path(course, lesson, "generate-practice"), Some(access))
    }

    fn get_quiz(&self, access: &str, course: CourseId, lesson: LessonId) -> Result<Quiz> {
        self.get(&lesson_path(course, lesson, "quiz"), Some(access))
    }

    fn submit_quiz(
        &self,
        access: &str,
        course: CourseId,
        lesson: LessonId,
        answers: &BTreeMap<u64, u64>,
    ) -> Result<QuizResult> {
        self.post_json(
            &lesson_path(course, lesson, "quiz"),
            Some(access),
            &QuizSubmission { answers },
        )
    }

    fn create_quiz(
        &self,
        access: &str,
        course: CourseId,
        lesson: LessonId,
        quiz: &NewQuiz,
    ) -> Result<Detail> {
        self.post_json(&lesson_path(course, lesson, "create_quiz"), Some(access), quiz)
    }
}
