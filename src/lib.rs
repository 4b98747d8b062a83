//! BluePrint: template-driven project management from the terminal
//!
//! Templates describe stages, tasks and subtasks; projects are cloned from
//! them and track completion, answers and links. The [`board`] module holds
//! the project workflows, [`api`] talks to the server and [`cli`] wires both
//! to the command line.

pub mod admin;
pub mod api;
pub mod auth;
pub mod board;
pub mod breadcrumb;
pub mod cli;
pub mod config;
pub mod gems;
pub mod links;
pub mod notify;
pub mod progress;
pub mod routes;
pub mod structure;
pub mod views;
