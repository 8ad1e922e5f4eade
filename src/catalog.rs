//! Course lists and dashboard actions outside a single course view.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::api::types::{Course, CourseId, NewCourse, ProgressSummary, Role};
use crate::api::Backend;
use crate::error::{Error, Result};
use crate::session::{Session, TokenStore};

/// Home page listing; sends the token when there is one.
pub fn list_courses<S: TokenStore>(api: &impl Backend, session: &Session<S>) -> Result<Vec<Course>> {
    api.list_courses(session.access_token())
}

pub fn enroll<S: TokenStore>(
    api: &impl Backend,
    session: &Session<S>,
    course: CourseId,
) -> Result<String> {
    let (access, user) = session.require()?;
    if user.role != Role::Student {
        return Err(Error::NotPermitted("only students enroll in courses"));
    }
    let detail = api.enroll(access, course)?;
    info!(course, "enrolled");
    Ok(detail.detail)
}

pub fn create_course<S: TokenStore>(
    api: &impl Backend,
    session: &Session<S>,
    title: &str,
    description: &str,
) -> Result<Course> {
    let (access, user) = session.require()?;
    if user.role != Role::Instructor {
        return Err(Error::NotPermitted("only instructors create courses"));
    }
    if title.trim().is_empty() {
        return Err(Error::Invalid("course title is required"));
    }

    let course = NewCourse {
        title: title.to_string(),
        description: description.to_string(),
    };
    api.create_course(access, &course)
}

/// Instructor dashboard row.
#[derive(Debug, Clone)]
pub struct CourseOverview {
    pub course: Course,
    pub summary: ProgressSummary,
}

/// The instructor's own courses with class progress. Courses whose summary
/// cannot be loaded are left out.
pub fn instructor_overview<S: TokenStore>(
    api: &impl Backend,
    session: &Session<S>,
) -> Result<Vec<CourseOverview>> {
    let (access, user) = session.require()?;
    if user.role != Role::Instructor {
        return Err(Error::NotPermitted("only instructors have a class overview"));
    }

    let courses = api.list_courses(Some(access))?;
    Ok(courses
        .into_iter()
        .filter(|c| c.instructor_name == user.username)
        .filter_map(|course| match api.progress_summary(access, course.id) {
            Ok(summary) => Some(CourseOverview { course, summary }),
            Err(e) => {
                warn!(course = course.id, error = %e, "skipping course without summary");
                None
            }
        })
        .collect())
}

/// Courses the student is enrolled in.
pub fn enrolled_courses<S: TokenStore>(
    api: &impl Backend,
    session: &Session<S>,
) -> Result<Vec<Course>> {
    let (access, _) = session.require()?;
    Ok(api
        .list_courses(Some(access))?
        .into_iter()
        .filter(|c| c.is_enrolled)
        .collect())
}

/// `Certificate_<title>.pdf`, with path separators and control characters in
/// the title replaced so the name stays a single component.
pub fn certificate_file_name(course_title: &str) -> String {
    let title: String = course_title
        .chars()
        .map(|c| {
            if matches!(c, '/' | '\\') || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    format!("Certificate_{}.pdf", title)
}

/// Writes certificate bytes as [`certificate_file_name`] inside `dir`.
pub fn save_certificate(bytes: &[u8], course_title: &str, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(certificate_file_name(course_title));
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&path)?;
    file.write_all(bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certificate_written_under_title() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = save_certificate(b"%PDF-1.4", "Rust 101", dir.path()).unwrap();

        assert_eq!(path.file_name().unwrap(), "Certificate_Rust 101.pdf");
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4");
    }

    #[test]
    fn separators_in_title_stay_inside_dir() {
        let dir = tempfile::TempDir::new().unwrap();

        let path = save_certificate(b"%PDF-1.4", "Web/Rust", dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "Certificate_Web_Rust.pdf");
        assert_eq!(path.parent().unwrap(), dir.path());

        let path = save_certificate(b"%PDF-1.4", "../..\\up\n", dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "Certificate_.._.._up_.pdf");
        assert_eq!(path.parent().unwrap(), dir.path());
        assert!(path.exists());
    }
}
