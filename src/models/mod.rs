pub mod auth;
pub mod edit;
pub mod gemini;

pub use auth::*;
pub use edit::*;
pub use gemini::*;
