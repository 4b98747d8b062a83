pub mod auth;
pub mod config;
pub mod home;
pub mod projects;
pub mod settings;
pub mod templates;
pub mod users;
