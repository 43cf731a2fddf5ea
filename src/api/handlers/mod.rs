pub mod auth;
pub mod certificates;
pub mod health;
