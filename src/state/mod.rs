//! State management module
//!
//! This module handles all application state:
//! - Shared data structures (data.rs)
//! - The gallery, active panorama and interaction mode (session.rs)
//! - User preferences persisted as JSON (prefs.rs)

pub mod data;
pub mod prefs;
pub mod session;
