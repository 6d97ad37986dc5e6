//! Ingestion pipeline orchestration

pub mod ingest;

pub use ingest::{run, IngestOutcome, IngestStage};
