pub mod errors;
pub mod options;
pub mod template_service;

pub use errors::{ServiceConfigError, ServiceError};
pub use options::{ClientOptions, ClientOptionsBuilder, OwnerIdentity, UserDeletionPolicy};
pub use template_service::{TemplateFilter, TemplateService};
