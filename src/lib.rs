pub mod api;
pub mod catalog;
pub mod config;
pub mod content;
pub mod error;
pub mod guard;
pub mod session;
pub mod workspace;

pub use api::{ApiGateway, Backend};
pub use error::{Error, Result};
pub use session::{Session, TokenStore};
pub use workspace::CourseWorkspace;
