//! Authentication exchange: secrets, the one-shot token fetcher, and lifetime hints.

pub mod claims;
pub mod fetcher;
pub mod secret;

pub use claims::*;
pub use fetcher::*;
pub use secret::*;
