pub mod argon2_hasher;
pub mod jwt;

pub use argon2_hasher::Argon2Hasher;
pub use jwt::JwtTokenIssuer;
