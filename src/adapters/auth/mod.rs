//! Authentication adapters.
//!
//! - `JwtTokenSigner` - HS256 implementation of the `TokenSigner` port

mod jwt_signer;

pub use jwt_signer::JwtTokenSigner;
