mod practice;
mod quiz;

pub use practice::{correct_index, practice_to_quiz, QuizDraft};
pub use quiz::QuizAttempt;

use tracing::{debug, warn};

use crate::api::types::{
    Course, CourseId, Lesson, LessonId, NewLesson, NewQuiz, PracticeQuestion, QuizResult, Role,
    StudentProgress, User,
};
use crate::api::Backend;
use crate::error::{Error, Result};
use crate::guard;
use crate::session::{Session, TokenStore};

/// Transient user-facing notification, drained by whoever renders the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
    Info(String),
}

/// Where the caller should go after loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Stay,
    Home,
    Login,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Loading,
    Loaded(Course),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonStatus {
    Satisfied,
    Pending,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingPrompt {
    pub open: bool,
    pub selected: Option<u8>,
}

/// Live view state for one open course.
///
/// Every mutation is followed by a full re-read of the course before the
/// view reflects it; nothing is patched locally. A workspace is discarded on
/// navigation away and rebuilt on return.
#[derive(Debug)]
pub struct CourseWorkspace {
    course_id: CourseId,
    phase: Phase,
    active: Option<Lesson>,
    can_manage: bool,
    adding_lesson: bool,
    next_order: u32,
    adding_quiz: bool,
    practice: Option<Vec<PracticeQuestion>>,
    attempt: QuizAttempt,
    rating: RatingPrompt,
    class_progress: Vec<StudentProgress>,
    notices: Vec<Notice>,
}

impl CourseWorkspace {
    pub fn new(course_id: CourseId) -> Self {
        Self {
            course_id,
            phase: Phase::Loading,
            active: None,
            can_manage: false,
            adding_lesson: false,
            next_order: 1,
            adding_quiz: false,
            practice: None,
            attempt: QuizAttempt::NotStarted,
            rating: RatingPrompt::default(),
            class_progress: Vec::new(),
            notices: Vec::new(),
        }
    }

    // --- view state ---

    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn course(&self) -> Option<&Course> {
        match &self.phase {
            Phase::Loaded(course) => Some(course),
            Phase::Loading => None,
        }
    }

    pub fn active_lesson(&self) -> Option<&Lesson> {
        self.active.as_ref()
    }

    /// Ownership capability, evaluated once per load.
    pub fn can_manage(&self) -> bool {
        self.can_manage
    }

    pub fn is_adding_lesson(&self) -> bool {
        self.adding_lesson
    }

    pub fn is_adding_quiz(&self) -> bool {
        self.adding_quiz
    }

    /// Suggested order for the next lesson; duplicates are left to the server.
    pub fn next_lesson_order(&self) -> u32 {
        self.next_order
    }

    pub fn practice(&self) -> Option<&[PracticeQuestion]> {
        self.practice.as_deref()
    }

    pub fn attempt(&self) -> &QuizAttempt {
        &self.attempt
    }

    pub fn rating_prompt(&self) -> RatingPrompt {
        self.rating
    }

    pub fn class_progress(&self) -> &[StudentProgress] {
        &self.class_progress
    }

    pub fn lesson_status(lesson: &Lesson) -> LessonStatus {
        if lesson.is_satisfied() {
            LessonStatus::Satisfied
        } else {
            LessonStatus::Pending
        }
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // --- load ---

    /// Fetches the course. A failed fetch abandons the view.
    pub fn load<S: TokenStore>(&mut self, api: &impl Backend, session: &Session<S>) -> Navigation {
        let Ok((access, user)) = session.require() else {
            return Navigation::Login;
        };

        match self.reload(api, access, user) {
            Ok(()) => Navigation::Stay,
            Err(e) => {
                warn!(course = self.course_id, error = %e, "course failed to load");
                Navigation::Home
            }
        }
    }

    fn reload(&mut self, api: &impl Backend, access: &str, user: &User) -> Result<()> {
        let course = api.get_course(access, self.course_id)?;

        // replace the active lesson with the fresh copy; never merge
        let previous = self.active.as_ref().map(|l| l.id);
        self.active = previous
            .and_then(|id| course.lesson(id))
            .or_else(|| course.ordered_lessons().first().copied())
            .cloned();

        self.can_manage = guard::can_manage(Some(user), &course);
        self.next_order = order_after(course.lessons.len());

        self.class_progress = if self.can_manage {
            match api.progress_summary(access, self.course_id) {
                Ok(summary) => summary.students,
                Err(e) => {
                    warn!(course = self.course_id, error = %e, "class progress unavailable");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        debug!(course = course.id, lessons = course.lessons.len(), "course loaded");
        self.phase = Phase::Loaded(course);
        Ok(())
    }

    /// Reload after a successful mutation. The mutation already happened, so a
    /// failed re-read is logged rather than reported as the action failing.
    fn refresh(&mut self, api: &impl Backend, access: &str, user: &User) -> bool {
        match self.reload(api, access, user) {
            Ok(()) => true,
            Err(e) => {
                warn!(course = self.course_id, error = %e, "reload after update failed");
                false
            }
        }
    }

    fn prompt_rating_if_unrated(&mut self) {
        if let Some(course) = self.course() {
            if course.user_rating.is_none() && !self.rating.open {
                self.rating = RatingPrompt {
                    open: true,
                    selected: None,
                };
            }
        }
    }

    fn fail<T>(&mut self, error: Error) -> Result<T> {
        self.notices.push(Notice::Error(error.user_message()));
        Err(error)
    }

    fn loaded_lesson(&self) -> Result<&Lesson> {
        if self.course().is_none() {
            return Err(Error::NotPermitted("course is not loaded"));
        }
        self.active
            .as_ref()
            .ok_or(Error::NotPermitted("no lesson selected"))
    }

    // --- lessons ---

    /// Switches lessons, discarding any quiz attempt or practice draft.
    pub fn select_lesson(&mut self, lesson: LessonId) -> Result<()> {
        let Some(course) = self.course() else {
            return Err(Error::NotPermitted("course is not loaded"));
        };
        let Some(found) = course.lesson(lesson).cloned() else {
            return Err(Error::Invalid("lesson is not part of this course"));
        };

        if self.active.as_ref().map(|l| l.id) == Some(found.id) {
            return Ok(());
        }

        self.active = Some(found);
        self.practice = None;
        self.attempt = QuizAttempt::NotStarted;
        self.adding_quiz = false;
        Ok(())
    }

    pub fn set_adding_lesson(&mut self, open: bool) {
        self.adding_lesson = open;
    }

    pub fn add_lesson<S: TokenStore>(
        &mut self,
        api: &impl Backend,
        session: &Session<S>,
        title: &str,
        content: &str,
        order: Option<u32>,
    ) -> Result<()> {
        let (access, user) = session.require()?;
        if !self.can_manage {
            return self.fail(Error::NotPermitted("only the course instructor can add lessons"));
        }
        if title.trim().is_empty() || content.trim().is_empty() {
            return self.fail(Error::Invalid("lesson title and content are required"));
        }

        let lesson = NewLesson {
            title: title.to_string(),
            content: content.to_string(),
            order: order.unwrap_or(self.next_order),
        };
        if let Err(e) = api.create_lesson(access, self.course_id, &lesson) {
            return self.fail(e);
        }

        self.adding_lesson = false;
        self.notices
            .push(Notice::Success(format!("Lesson '{}' added", lesson.title)));
        self.refresh(api, access, user);
        Ok(())
    }

    /// Offered to students on lessons without a quiz that are not yet complete.
    pub fn mark_complete<S: TokenStore>(
        &mut self,
        api: &impl Backend,
        session: &Session<S>,
    ) -> Result<()> {
        let (access, user) = session.require()?;
        if user.role != Role::Student {
            return self.fail(Error::NotPermitted("only students complete lessons"));
        }
        let lesson = match self.loaded_lesson() {
            Ok(lesson) => lesson,
            Err(e) => return self.fail(e),
        };
        if lesson.has_quiz {
            return self.fail(Error::NotPermitted("this lesson is completed by passing its quiz"));
        }
        if lesson.is_completed {
            return self.fail(Error::NotPermitted("lesson is already completed"));
        }

        let lesson_id = lesson.id;
        if let Err(e) = api.complete_lesson(access, self.course_id, lesson_id) {
            return self.fail(e);
        }
        self.notices
            .push(Notice::Success("Lesson marked as completed!".to_string()));

        if self.refresh(api, access, user) {
            self.prompt_rating_if_unrated();
        }
        Ok(())
    }

    // --- AI practice ---

    /// Replaces the practice draft; nothing is persisted until saved.
    pub fn generate_practice<S: TokenStore>(
        &mut self,
        api: &impl Backend,
        session: &Session<S>,
    ) -> Result<()> {
        let (access, _) = session.require()?;
        if !self.can_manage {
            return self.fail(Error::NotPermitted("only the course instructor can generate practice"));
        }
        let lesson_id = match self.loaded_lesson() {
            Ok(lesson) => lesson.id,
            Err(e) => return self.fail(e),
        };

        match api.generate_practice(access, self.course_id, lesson_id) {
            Ok(set) => {
                self.practice = Some(set.questions);
                self.notices.push(Notice::Success(
                    "AI practice questions generated successfully!".to_string(),
                ));
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    pub fn discard_practice(&mut self) {
        self.practice = None;
    }

    /// Saves the draft as the lesson's quiz, replacing any existing one.
    pub fn save_practice<S: TokenStore>(
        &mut self,
        api: &impl Backend,
        session: &Session<S>,
    ) -> Result<()> {
        let (access, user) = session.require()?;
        if !self.can_manage {
            return self.fail(Error::NotPermitted("only the course instructor can save quizzes"));
        }
        let lesson = match self.loaded_lesson() {
            Ok(lesson) => lesson,
            Err(e) => return self.fail(e),
        };
        let Some(questions) = self.practice.as_deref() else {
            return self.fail(Error::NotPermitted("no practice set to save"));
        };

        let lesson_id = lesson.id;
        let quiz = practice_to_quiz(&lesson.title, questions);
        self.put_quiz(api, access, user, lesson_id, &quiz, "AI Practice saved as the Required Quiz!")?;
        self.practice = None;
        Ok(())
    }

    // --- quiz authoring ---

    pub fn set_adding_quiz(&mut self, open: bool) {
        self.adding_quiz = open;
    }

    /// Manual single-question quiz; replaces any existing quiz on the lesson.
    pub fn author_quiz<S: TokenStore>(
        &mut self,
        api: &impl Backend,
        session: &Session<S>,
        draft: &QuizDraft,
    ) -> Result<()> {
        let (access, user) = session.require()?;
        if !self.can_manage {
            return self.fail(Error::NotPermitted("only the course instructor can author quizzes"));
        }
        let lesson_id = match self.loaded_lesson() {
            Ok(lesson) => lesson.id,
            Err(e) => return self.fail(e),
        };
        let quiz = match draft.to_quiz() {
            Ok(quiz) => quiz,
            Err(e) => return self.fail(e),
        };

        self.put_quiz(api, access, user, lesson_id, &quiz, "Quiz created/updated!")?;
        self.adding_quiz = false;
        Ok(())
    }

    fn put_quiz(
        &mut self,
        api: &impl Backend,
        access: &str,
        user: &User,
        lesson: LessonId,
        quiz: &NewQuiz,
        success: &str,
    ) -> Result<()> {
        if let Err(e) = api.create_quiz(access, self.course_id, lesson, quiz) {
            return self.fail(e);
        }
        self.notices.push(Notice::Success(success.to_string()));
        self.refresh(api, access, user);
        Ok(())
    }

    // --- quiz taking ---

    pub fn take_quiz<S: TokenStore>(
        &mut self,
        api: &impl Backend,
        session: &Session<S>,
    ) -> Result<()> {
        let (access, user) = session.require()?;
        if user.role != Role::Student {
            return self.fail(Error::NotPermitted("only students take quizzes"));
        }
        let lesson = match self.loaded_lesson() {
            Ok(lesson) => lesson,
            Err(e) => return self.fail(e),
        };
        if !lesson.has_quiz {
            return self.fail(Error::NotPermitted("this lesson has no quiz"));
        }
        if lesson.quiz_passed {
            return self.fail(Error::NotPermitted("quiz is already passed"));
        }

        let lesson_id = lesson.id;
        self.fetch_attempt(api, access, lesson_id)
    }

    fn fetch_attempt(&mut self, api: &impl Backend, access: &str, lesson: LessonId) -> Result<()> {
        match api.get_quiz(access, self.course_id, lesson) {
            Ok(quiz) => {
                self.attempt = QuizAttempt::start(quiz);
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    pub fn answer(&mut self, question: u64, choice: u64) -> Result<()> {
        self.attempt.answer(question, choice)
    }

    pub fn can_submit_quiz(&self) -> bool {
        self.attempt.can_submit()
    }

    /// Posts the answers and moves to review. A pass reloads the course and
    /// may prompt for a rating; a fail leaves the course untouched.
    pub fn submit_quiz<S: TokenStore>(
        &mut self,
        api: &impl Backend,
        session: &Session<S>,
    ) -> Result<QuizResult> {
        let (access, user) = session.require()?;
        let lesson_id = match self.loaded_lesson() {
            Ok(lesson) => lesson.id,
            Err(e) => return self.fail(e),
        };
        let answers = match self.attempt.ensure_complete() {
            Ok(answers) => answers.clone(),
            Err(e) => return self.fail(e),
        };

        let result = match api.submit_quiz(access, self.course_id, lesson_id, &answers) {
            Ok(result) => result,
            Err(e) => return self.fail(e),
        };

        self.notices
            .push(Notice::Success("Quiz submitted successfully!".to_string()));
        self.attempt.review(result.clone());
        if !result.passed {
            self.notices.push(Notice::Info(format!(
                "Scored {}/{}. Review the correct answers and retake when ready.",
                result.score, result.total
            )));
        }

        if result.passed && self.refresh(api, access, user) {
            self.prompt_rating_if_unrated();
        }
        Ok(result)
    }

    /// Starts over with a freshly fetched quiz.
    pub fn retake<S: TokenStore>(&mut self, api: &impl Backend, session: &Session<S>) -> Result<()> {
        let (access, _) = session.require()?;
        if !matches!(self.attempt, QuizAttempt::Reviewed { .. }) {
            return self.fail(Error::NotPermitted("nothing to retake"));
        }
        let lesson_id = match self.loaded_lesson() {
            Ok(lesson) => lesson.id,
            Err(e) => return self.fail(e),
        };
        self.fetch_attempt(api, access, lesson_id)
    }

    // --- rating ---

    pub fn select_rating(&mut self, stars: u8) -> Result<()> {
        if !(1..=5).contains(&stars) {
            return Err(Error::InvalidRating(stars));
        }
        self.rating.selected = Some(stars);
        Ok(())
    }

    /// Closes the prompt without rating. Only a later completion or pass
    /// reopens it.
    pub fn dismiss_rating(&mut self) {
        self.rating = RatingPrompt::default();
    }

    pub fn open_rating(&mut self) {
        self.rating.open = true;
    }

    pub fn submit_rating<S: TokenStore>(
        &mut self,
        api: &impl Backend,
        session: &Session<S>,
    ) -> Result<()> {
        let (access, user) = session.require()?;
        if user.role != Role::Student {
            return self.fail(Error::NotPermitted("only students rate courses"));
        }
        let Some(stars) = self.rating.selected else {
            return self.fail(Error::Invalid("select a rating first"));
        };

        if let Err(e) = api.rate(access, self.course_id, stars) {
            return self.fail(e);
        }
        self.rating = RatingPrompt::default();
        self.notices
            .push(Notice::Success("Thanks for rating this course!".to_string()));
        self.refresh(api, access, user);
        Ok(())
    }

    // --- certificate ---

    /// PDF certificate, available to students once the course is fully done.
    pub fn certificate<S: TokenStore>(
        &mut self,
        api: &impl Backend,
        session: &Session<S>,
    ) -> Result<Vec<u8>> {
        let (access, user) = session.require()?;
        if user.role != Role::Student {
            return self.fail(Error::NotPermitted("only students receive certificates"));
        }
        match self.course().map(|c| c.progress) {
            Some(progress) if progress >= 100 => {}
            Some(_) => return self.fail(Error::NotPermitted("course is not 100% completed yet")),
            None => return self.fail(Error::NotPermitted("course is not loaded")),
        }

        match api.certificate(access, self.course_id) {
            Ok(bytes) => Ok(bytes),
            Err(e) => self.fail(e),
        }
    }
}

/// Default order for a lesson appended after `count` existing ones.
fn order_after(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX).saturating_add(1)
}
