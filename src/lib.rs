//! Cimiento — declarative landing-zone compiler.
//!
//! Resolves a zone manifest into create-or-reuse decisions, deterministic
//! names, and a dependency-ordered plan for an external provisioning engine.

pub mod cli;
pub mod core;
pub mod runlog;
