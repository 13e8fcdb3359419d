//! Interactive blemish removal: pick a flaw, pick a clean patch, and the
//! patch is cloned over the flaw with Poisson blending.
//!
//! [`session::RetouchSession`] holds all editing state and is driven purely
//! by [`session::SessionEvent`]s; [`app`] is the eframe front end.

pub mod logger;

pub mod app;
pub mod cli;
pub mod error;
pub mod geometry;
pub mod history;
pub mod io;
pub mod ops;
pub mod session;
pub mod settings;

pub use error::{Result, RetouchError};
