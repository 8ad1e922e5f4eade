//! Navigation decisions. Everything here is a pure function of its inputs.

use crate::api::types::{Course, CourseId, Role, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectToLogin,
    RedirectToHome,
}

/// Entry check for protected views.
pub fn can_enter(user: Option<&User>, required: Option<&[Role]>) -> Decision {
    match (user, required) {
        (None, _) => Decision::RedirectToLogin,
        (Some(user), Some(roles)) if !roles.contains(&user.role) => Decision::RedirectToHome,
        _ => Decision::Allow,
    }
}

/// Login and registration forms are only for visitors.
pub fn can_enter_auth_form(user: Option<&User>) -> Decision {
    match user {
        Some(_) => Decision::RedirectToHome,
        None => Decision::Allow,
    }
}

/// Whether the user may mutate this particular course: instructors manage
/// only the courses they own.
pub fn can_manage(user: Option<&User>, course: &Course) -> bool {
    user.is_some_and(|u| u.role == Role::Instructor && u.username == course.instructor_name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Register,
    Dashboard,
    Course(CourseId),
}

impl Route {
    pub fn resolve(&self, user: Option<&User>) -> Decision {
        match self {
            Route::Home => Decision::Allow,
            Route::Login | Route::Register => can_enter_auth_form(user),
            Route::Dashboard | Route::Course(_) => can_enter(user, None),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardKind {
    Instructor,
    Student,
}

impl DashboardKind {
    pub fn for_user(user: &User) -> Self {
        match user.role {
            Role::Instructor => DashboardKind::Instructor,
            Role::Student => DashboardKind::Student,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, role: Role) -> User {
        User {
            id: 1,
            username: name.into(),
            email: format!("{name}@example.com"),
            role,
        }
    }

    fn course_by(instructor: &str) -> Course {
        Course {
            id: 1,
            title: "Rust".into(),
            description: String::new(),
            instructor_name: instructor.into(),
            created_at: None,
            lessons: vec![],
            enrollment_count: 0,
            progress: 0,
            is_enrolled: false,
            average_rating: 0.0,
            user_rating: None,
        }
    }

    #[test]
    fn no_session_goes_to_login() {
        assert_eq!(can_enter(None, None), Decision::RedirectToLogin);
        assert_eq!(
            can_enter(None, Some(&[Role::Instructor])),
            Decision::RedirectToLogin
        );
    }

    #[test]
    fn roles_gate_entry() {
        let student = user("sam", Role::Student);
        assert_eq!(can_enter(Some(&student), None), Decision::Allow);
        assert_eq!(
            can_enter(Some(&student), Some(&[Role::Instructor])),
            Decision::RedirectToHome
        );
        assert_eq!(
            can_enter(Some(&student), Some(&[Role::Instructor, Role::Student])),
            Decision::Allow
        );
    }

    #[test]
    fn decisions_are_stable() {
        let instructor = user("ferris", Role::Instructor);
        let roles = [Role::Student];
        let first = can_enter(Some(&instructor), Some(&roles));
        for _ in 0..10 {
            assert_eq!(can_enter(Some(&instructor), Some(&roles)), first);
        }
    }

    #[test]
    fn auth_forms_redirect_when_logged_in() {
        let student = user("sam", Role::Student);
        assert_eq!(Route::Login.resolve(Some(&student)), Decision::RedirectToHome);
        assert_eq!(Route::Register.resolve(None), Decision::Allow);
        assert_eq!(Route::Home.resolve(None), Decision::Allow);
        assert_eq!(Route::Course(3).resolve(None), Decision::RedirectToLogin);
        assert_eq!(Route::Dashboard.resolve(Some(&student)), Decision::Allow);
    }

    #[test]
    fn ownership_not_role_gates_management() {
        let course = course_by("ferris");
        assert!(can_manage(Some(&user("ferris", Role::Instructor)), &course));
        assert!(!can_manage(Some(&user("other", Role::Instructor)), &course));
        assert!(!can_manage(Some(&user("ferris", Role::Student)), &course));
        assert!(!can_manage(None, &course));
    }

    #[test]
    fn dashboard_follows_role() {
        assert_eq!(
            DashboardKind::for_user(&user("ferris", Role::Instructor)),
            DashboardKind::Instructor
        );
        assert_eq!(
            DashboardKind::for_user(&user("sam", Role::Student)),
            DashboardKind::Student
        );
    }
}
