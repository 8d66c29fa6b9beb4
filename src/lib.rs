#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod aggregate;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod mock;
pub mod notice;
pub mod remote;
pub mod session;
pub mod summary;
pub mod theme;

pub use error::{Error, Result};
