pub mod client;
pub mod convert;
pub mod error;
