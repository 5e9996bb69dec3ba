//! Certificate issuance: request models, validation, the issuance workflow
//! and its HTTP handlers.

pub mod allow_list;
pub mod error;
pub mod handlers;
pub mod models;
pub mod validation;
pub mod workflow;

pub use allow_list::AllowList;
pub use error::IssuanceError;
