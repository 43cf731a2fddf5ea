pub mod auth;
pub mod text;
pub mod validation;
