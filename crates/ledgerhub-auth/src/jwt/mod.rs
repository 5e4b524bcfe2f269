//! HS256 access tokens.

pub mod claims;
pub mod decoder;
pub mod encoder;

pub use claims::{AccessClaims, AccessSubject};
pub use decoder::JwtDecoder;
pub use encoder::{JwtEncoder, MintedAccessToken};
