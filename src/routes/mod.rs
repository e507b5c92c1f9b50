pub mod health_checks;
pub(crate) mod template;
pub(crate) mod user;

pub use health_checks::*;
