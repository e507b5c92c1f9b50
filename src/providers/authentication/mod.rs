pub mod init;
pub mod jwt;
pub mod oauth;
mod provider;
pub mod static_tokens;

pub use init::init;
pub use jwt::JwtProvider;
pub use oauth::{OAuthCache, OAuthProvider};
pub use provider::{AuthenticationProvider, Credential};
pub use static_tokens::StaticProvider;
