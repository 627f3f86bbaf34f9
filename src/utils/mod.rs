pub mod auth;
pub mod temp;
