//! A scripted in-memory server for exercising session and workspace flows.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use learnhub::api::types::{
    AuthTokens, Choice, Course, CourseId, Detail, Lesson, LessonId, NewCourse, NewLesson, NewQuiz,
    PracticeQuestion, PracticeSet, ProgressSummary, Question, Quiz, QuizResult, RatingReceipt,
    Registration, Role, StudentProgress, User,
};
use learnhub::session::{MemoryTokenStore, TokenPair};
use learnhub::{Backend, Error, Result, Session};

pub const NOW: i64 = 1_700_000_000;

pub fn jwt(exp: i64) -> String {
    format!(
        "{}.{}.signature",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(format!(r#"{{"token_type":"access","exp":{exp},"user_id":1}}"#))
    )
}

pub fn fresh_tokens() -> TokenPair {
    TokenPair {
        access: jwt(NOW + 3600),
        refresh: "refresh-token".into(),
    }
}

pub fn user(name: &str, role: Role) -> User {
    User {
        id: 7,
        username: name.into(),
        email: format!("{name}@example.com"),
        role,
    }
}

pub fn lesson(id: LessonId, order: u32, has_quiz: bool) -> Lesson {
    Lesson {
        id,
        title: format!("Lesson {id}"),
        content: format!("Content of lesson {id}"),
        order,
        is_completed: false,
        has_quiz,
        quiz_passed: false,
    }
}

pub fn course(instructor: &str) -> Course {
    Course {
        id: 1,
        title: "Rust 101".into(),
        description: "Ownership, borrowing and more".into(),
        instructor_name: instructor.into(),
        created_at: None,
        lessons: vec![lesson(11, 1, false), lesson(12, 2, true), lesson(13, 3, false)],
        enrollment_count: 3,
        progress: 0,
        is_enrolled: true,
        average_rating: 0.0,
        user_rating: None,
    }
}

/// Quiz for lesson 12: two questions, correct choices 101 and 201.
pub fn quiz() -> Quiz {
    let question = |id: u64, text: &str| Question {
        id,
        text: text.into(),
        choices: vec![
            Choice {
                id: id * 100 + 1,
                text: "right".into(),
                is_correct: None,
            },
            Choice {
                id: id * 100 + 2,
                text: "wrong".into(),
                is_correct: None,
            },
        ],
    };
    Quiz {
        id: Some(5),
        title: "Borrow check".into(),
        questions: vec![question(1, "What moves?"), question(2, "What borrows?")],
    }
}

pub struct FakeBackend {
    pub user: User,
    pub course: RefCell<Course>,
    pub quiz: Quiz,
    pub practice: Vec<PracticeQuestion>,
    pub calls: RefCell<Vec<String>>,
    pub failing: RefCell<HashSet<&'static str>>,
    pub created_quizzes: RefCell<Vec<NewQuiz>>,
    pub created_lessons: RefCell<Vec<(String, u32)>>,
    pub ratings: RefCell<Vec<u8>>,
}

impl FakeBackend {
    pub fn new(user: User, course: Course) -> Self {
        Self {
            user,
            course: RefCell::new(course),
            quiz: quiz(),
            practice: vec![
                PracticeQuestion {
                    question: "Which trait enables `?`".into(),
                    options: vec!["From".into(), "Into".into(), "Try".into()],
                    answer: "Try".into(),
                    explanation: "the Try trait drives `?`".into(),
                },
                PracticeQuestion {
                    question: "Default integer type".into(),
                    options: vec!["u8".into(), "i64".into()],
                    answer: "i32".into(),
                    explanation: "i32 is the default".into(),
                },
            ],
            calls: RefCell::new(Vec::new()),
            failing: RefCell::new(HashSet::new()),
            created_quizzes: RefCell::new(Vec::new()),
            created_lessons: RefCell::new(Vec::new()),
            ratings: RefCell::new(Vec::new()),
        }
    }

    pub fn fail(&self, endpoint: &'static str) {
        self.failing.borrow_mut().insert(endpoint);
    }

    pub fn recover(&self, endpoint: &'static str) {
        self.failing.borrow_mut().remove(endpoint);
    }

    pub fn count(&self, endpoint: &str) -> usize {
        self.calls.borrow().iter().filter(|c| *c == endpoint).count()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn hit(&self, endpoint: &'static str) -> Result<()> {
        self.calls.borrow_mut().push(endpoint.to_string());
        if self.failing.borrow().contains(endpoint) {
            return Err(Error::Status {
                status: 500,
                message: Some(format!("{endpoint} failed")),
            });
        }
        Ok(())
    }

    fn recompute_progress(course: &mut Course) {
        let done = course.lessons.iter().filter(|l| l.is_completed).count();
        course.progress = if course.lessons.is_empty() {
            0
        } else {
            (done * 100 / course.lessons.len()) as u8
        };
    }
}

/// Session already logged in as the backend's user.
pub fn logged_in(api: &FakeBackend) -> Session<MemoryTokenStore> {
    let mut session = Session::new(MemoryTokenStore::with_tokens(fresh_tokens()));
    session.bootstrap_at(api, NOW);
    assert!(session.current_user().is_some());
    api.clear_calls();
    session
}

impl Backend for FakeBackend {
    fn login(&self, _username: &str, password: &str) -> Result<AuthTokens> {
        self.hit("login")?;
        if password != "secret" {
            return Err(Error::Status {
                status: 401,
                message: Some("No active account found with the given credentials".into()),
            });
        }
        let tokens = fresh_tokens();
        Ok(AuthTokens {
            access: tokens.access,
            refresh: tokens.refresh,
        })
    }

    fn register(
        &self,
        username: &str,
        email: &str,
        _password: &str,
        role: Role,
    ) -> Result<Registration> {
        self.hit("register")?;
        let tokens = fresh_tokens();
        Ok(Registration {
            access: tokens.access,
            refresh: tokens.refresh,
            user: User {
                id: 99,
                username: username.into(),
                email: email.into(),
                role,
            },
        })
    }

    fn me(&self, _access: &str) -> Result<User> {
        self.hit("me")?;
        Ok(self.user.clone())
    }

    fn list_courses(&self, _access: Option<&str>) -> Result<Vec<Course>> {
        self.hit("list_courses")?;
        Ok(vec![self.course.borrow().clone()])
    }

    fn get_course(&self, _access: &str, _course: CourseId) -> Result<Course> {
        self.hit("get_course")?;
        Ok(self.course.borrow().clone())
    }

    fn create_course(&self, _access: &str, course: &NewCourse) -> Result<Course> {
        self.hit("create_course")?;
        let mut created = self.course.borrow().clone();
        created.id = 2;
        created.title = course.title.clone();
        created.lessons.clear();
        Ok(created)
    }

    fn enroll(&self, _access: &str, _course: CourseId) -> Result<Detail> {
        self.hit("enroll")?;
        Ok(Detail {
            detail: "Successfully enrolled.".into(),
        })
    }

    fn progress_summary(&self, _access: &str, _course: CourseId) -> Result<ProgressSummary> {
        self.hit("progress_summary")?;
        Ok(ProgressSummary {
            students: vec![StudentProgress {
                student_name: "sam".into(),
                email: "sam@example.com".into(),
                progress: 33,
            }],
        })
    }

    fn certificate(&self, _access: &str, _course: CourseId) -> Result<Vec<u8>> {
        self.hit("certificate")?;
        Ok(b"%PDF-1.4 certificate".to_vec())
    }

    fn rate(&self, _access: &str, _course: CourseId, rating: u8) -> Result<RatingReceipt> {
        self.hit("rate")?;
        self.ratings.borrow_mut().push(rating);
        let mut course = self.course.borrow_mut();
        course.user_rating = Some(rating);
        course.average_rating = f64::from(rating);
        Ok(RatingReceipt {
            detail: "Course rated successfully.".into(),
            rating,
        })
    }

    fn create_lesson(&self, _access: &str, _course: CourseId, lesson: &NewLesson) -> Result<Lesson> {
        self.hit("create_lesson")?;
        self.created_lessons
            .borrow_mut()
            .push((lesson.title.clone(), lesson.order));
        let mut course = self.course.borrow_mut();
        let id = 100 + course.lessons.len() as u64;
        let created = Lesson {
            id,
            title: lesson.title.clone(),
            content: lesson.content.clone(),
            order: lesson.order,
            is_completed: false,
            has_quiz: false,
            quiz_passed: false,
        };
        course.lessons.push(created.clone());
        Ok(created)
    }

    fn complete_lesson(&self, _access: &str, _course: CourseId, lesson: LessonId) -> Result<Detail> {
        self.hit("complete_lesson")?;
        let mut course = self.course.borrow_mut();
        if let Some(l) = course.lessons.iter_mut().find(|l| l.id == lesson) {
            l.is_completed = true;
        }
        Self::recompute_progress(&mut course);
        Ok(Detail {
            detail: "Lesson marked as complete.".into(),
        })
    }

    fn generate_practice(
        &self,
        _access: &str,
        _course: CourseId,
        _lesson: LessonId,
    ) -> Result<PracticeSet> {
        self.hit("generate_practice")?;
        Ok(PracticeSet {
            questions: self.practice.clone(),
        })
    }

    fn get_quiz(&self, _access: &str, _course: CourseId, _lesson: LessonId) -> Result<Quiz> {
        self.hit("get_quiz")?;
        Ok(self.quiz.clone())
    }

    fn submit_quiz(
        &self,
        _access: &str,
        _course: CourseId,
        lesson: LessonId,
        answers: &BTreeMap<u64, u64>,
    ) -> Result<QuizResult> {
        self.hit("submit_quiz")?;
        let total = self.quiz.questions.len() as u32;
        let score = answers
            .iter()
            .filter(|(q, c)| **c == **q * 100 + 1)
            .count() as u32;
        let passed = score * 5 >= total * 4;

        if passed {
            let mut course = self.course.borrow_mut();
            if let Some(l) = course.lessons.iter_mut().find(|l| l.id == lesson) {
                l.quiz_passed = true;
                l.is_completed = true;
            }
            Self::recompute_progress(&mut course);
        }

        Ok(QuizResult {
            score,
            total,
            passed,
            correct_answers: self
                .quiz
                .questions
                .iter()
                .map(|q| learnhub::api::types::CorrectAnswer {
                    question_id: q.id,
                    question_text: q.text.clone(),
                    correct_choice_id: Some(q.id * 100 + 1),
                    correct_choice_text: "right".into(),
                })
                .collect(),
        })
    }

    fn create_quiz(
        &self,
        _access: &str,
        _course: CourseId,
        lesson: LessonId,
        quiz: &NewQuiz,
    ) -> Result<Detail> {
        self.hit("create_quiz")?;
        self.created_quizzes.borrow_mut().push(quiz.clone());
        let mut course = self.course.borrow_mut();
        if let Some(l) = course.lessons.iter_mut().find(|l| l.id == lesson) {
            l.has_quiz = true;
        }
        Ok(Detail {
            detail: "Quiz created successfully.".into(),
        })
    }
}
