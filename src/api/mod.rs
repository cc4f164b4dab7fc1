//! Typed endpoints of the document service.

mod auth;
mod documents;
mod models;
pub mod validation;

pub use auth::AuthApi;
pub use documents::DocumentsApi;
pub use models::{DocumentItem, DocumentPage, LoginResponse, UserData};
pub use validation::{load_upload, Credentials, ValidationError};
