// src/core/mod.rs

//! The reconnaissance engine: data models, sources, per-domain orchestration,
//! batch scheduling and the pure analyzers that run over finished reports.

pub mod error;

/// Finding kinds mapped to human-readable titles and remediation advice.
pub mod knowledge_base;

/// Report, slot and source-result types shared by every layer.
pub mod models;

pub mod orchestrator;
pub mod pricing;
pub mod scheduler;

/// Concrete network-backed sources, one per report slot.
pub mod sources;

pub mod threat;

#[cfg(test)]
pub mod testing;
