pub mod jwt;

pub use jwt::{decode_jwt, expiration_time, issued_at_time, DecodedToken};
