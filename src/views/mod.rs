//! Text rendering of every screen
//!
//! Screens are tagged unions matched in one `render` each, so the command
//! handlers only decide which variant to show.

pub mod admin;
pub mod home;
pub mod project;
pub mod templates;
pub mod widgets;

pub use home::HomeScreen;
pub use project::ProjectScreen;
