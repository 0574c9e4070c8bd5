//! Compliance evaluation engine for public procurement tenders.
//!
//! A run ingests a tender specification ("pliego") and a bidder proposal
//! ("contrato"), builds the ordered requirement registry, resolves the bidder
//! profile against external registries and produces the scored
//! [`workflows::tender::EvaluationResult`] shown on the procurement dashboard.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
