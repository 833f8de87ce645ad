pub mod app;
pub mod config;
pub mod error;
pub mod history;
pub mod mail;

pub use app::{Mode, Navigator};
pub use config::Config;
pub use error::{Error, Result};
