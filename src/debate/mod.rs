//! Structured multi-agent debate: role-specialized agents iterate through
//! proposal, critique, and refinement phases over a configured number of
//! rounds; a judge then synthesizes a final solution.

pub mod agent;
pub mod clarification;
pub mod error;
pub mod hooks;
pub mod judge;
pub mod model;
pub mod orchestrator;
pub mod persistence;
pub mod provider;
pub mod roles;
pub mod summarizer;
pub mod tracing_shim;
