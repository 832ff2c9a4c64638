pub mod auth;

pub use auth::{examinee_auth_middleware, ExamineeClaims};
