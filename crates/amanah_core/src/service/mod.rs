//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate collection reads and writes into use-case level APIs.
//! - Run every mutation inside one store transaction.
//! - Keep callers decoupled from storage keys and JSON encoding.

pub mod activity_service;
pub mod auth_service;
pub mod campaign_service;
pub mod group_service;
pub mod invite_service;
pub mod preference_service;
