//! Meeting service: configuration, logging and the orchestration layer that
//! binds each meeting to its electoral register policy.

pub mod config;
pub mod error;
pub mod logging;
pub mod meeting;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use logging::{init_logging, LogFormat};
pub use meeting::MeetingService;
