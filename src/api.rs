mod backend;
mod gateway;
pub mod types;

pub use backend::Backend;
pub use gateway::{ApiGateway, DEFAULT_BASE_URL};
