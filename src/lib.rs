pub mod boundary;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod inspector;
pub mod planner;
pub mod publisher;
pub mod remote;
pub mod report;
pub mod retry;
pub mod ui;

pub use error::{ReleaseError, Result};
