//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into use-case level APIs.
//! - Keep CLI and other front ends decoupled from storage details.

pub mod event_service;
