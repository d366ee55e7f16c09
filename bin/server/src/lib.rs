//! ujian examination dashboard server.
//!
//! This crate serves the role-scoped dashboard behind the access gate from
//! `ujian-platform-access`, backed by a hosted auth/REST service.

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod pages;

#[cfg(test)]
mod test_support;
