use crate::providers::ProviderError;

/// Failures of `TemplateService` operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// No owner could be resolved from the credential
    #[error("No owner specified, please authenticate.")]
    AuthFailure,
    /// Caller tried to act on another user's record
    #[error("Users may only act on their own record.")]
    UnauthorizedUser,
    /// User lookup or provisioning failed
    #[error("Unable to resolve user record.")]
    InvalidUser,
    #[error("Unable to store given template.")]
    InvalidTemplate,
    #[error("No matching templates.")]
    TemplateNotFound,
    #[error("No matching user.")]
    UserNotFound,
    /// Deletion refused while the user still owns templates
    #[error("User still owns {0} template(s).")]
    UserHasTemplates(u64),
    #[error(transparent)]
    Storage(#[from] ProviderError),
}

/// Startup errors raised while assembling the service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceConfigError {
    #[error("Missing Storage Provider: please provide a storage provider.")]
    MissingStorageProvider,
    #[error("Missing Authentication Provider: please provide an authentication provider.")]
    MissingAuthenticationProvider,
    #[error("Invalid client options: {0}")]
    Invalid(String),
}

impl From<derive_builder::UninitializedFieldError> for ServiceConfigError {
    fn from(err: derive_builder::UninitializedFieldError) -> Self {
        match err.field_name() {
            "storage_provider" => Self::MissingStorageProvider,
            "authentication_provider" => Self::MissingAuthenticationProvider,
            other => Self::Invalid(format!("{other} is not set")),
        }
    }
}
