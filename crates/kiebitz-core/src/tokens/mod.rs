//! Priority-token issuance.

pub mod requests;
pub mod service;

pub use requests::GetTokenData;
pub use service::{TokenMint, DEFAULT_MAX_TOKENS_PER_USER};
