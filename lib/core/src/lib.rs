//! Core types shared across the ujian workspace.
//!
//! This crate provides the foundational identifier types and the
//! `Result` alias used by the access-control and server crates.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, UserId};
