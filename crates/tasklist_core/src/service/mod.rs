//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate validation, entity mutation, and persistence into
//!   operations a UI adapter can call directly.
//! - Keep UI layers decoupled from storage details.

pub mod task_store;
