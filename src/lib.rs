//! Concept Mentor is a terminal tutor that explains a concept with a remote
//! LLM, quizzes the learner on it, and grades the answers.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns configuration, credentials, the settings gate, the chat
//!   completion client, and the tutoring state machine.
//! - [`ui`] renders the full-screen interface and runs the event loop that
//!   turns key presses into tutor actions.
//! - [`cli`] parses arguments and runs setup commands.
//! - [`api`] defines the chat completion payloads.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which resolves settings and then hands off
//! to [`ui::run_tutor`] for interactive sessions.

pub mod api;
pub mod cli;
pub mod core;
pub mod logging;
pub mod ui;
pub mod utils;
