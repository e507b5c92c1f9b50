//! Pluggable providers
//!
//! The template service talks to persistence and identity only through the
//! traits defined here, so both can be swapped per environment and mocked in tests.
//!
//! ## Architecture Pattern
//!
//! 1. Trait in `{kind}/provider.rs`
//! 2. Implementations next to it (`postgres.rs`, `memory.rs`, `jwt.rs`, ...)
//! 3. `{kind}/init.rs` picks the implementation from `Settings`
//! 4. The trait object is handed to `TemplateService` through `ClientOptions`
//!
//! ## Usage
//!
//! ```ignore
//! let storage = providers::storage::init(&settings).await?;
//! let authentication = providers::authentication::init(&settings.auth)?;
//! let options = ClientOptionsBuilder::default()
//!     .storage_provider(storage)
//!     .authentication_provider(authentication)
//!     .build()?;
//! let service = TemplateService::init(options);
//! ```

pub mod authentication;
pub mod errors;
pub mod storage;

pub use authentication::{AuthenticationProvider, Credential};
pub use errors::ProviderError;
pub use storage::StorageProvider;
