//! Full-screen terminal front end.

pub mod event_loop;
pub mod lifecycle;
pub mod markdown;
pub mod renderer;
pub mod screen;

pub use event_loop::{run_tutor, SessionExit};
