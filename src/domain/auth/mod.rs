//! Authentication types for the domain layer.
//!
//! These types describe principals, token claims and refresh-token sessions.
//! They have **no signing dependencies** - the `TokenSigner` port turns
//! claims into opaque strings and back.

mod errors;
mod principal;
mod token;

pub use errors::AuthError;
pub use principal::{Principal, PrincipalKind, PrincipalRef, Role};
pub use token::{mask_token, TokenClaims, TokenPair, TokenUse};
