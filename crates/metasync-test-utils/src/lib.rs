//! Shared test utilities for the metasync workspace.
//!
//! This crate provides standardised fixtures and in-memory collaborators so
//! engine tests never touch the network. It is a dev-dependency only and is
//! never published.
//!
//! # Modules
//!
//! - [`fixtures`]: record, snapshot and profile builders
//! - [`fakes`]: in-memory fetcher and registry implementations
//! - [`state`]: [`TestState`](state::TestState) temporary state directory

pub mod fakes;
pub mod fixtures;
pub mod state;
