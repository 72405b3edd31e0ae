//! Conversation analytics pipeline: a seeded synthetic generator for
//! enriched customer-support conversation records, the assembler that
//! turns its samples into an ordered interchange table, and the segment
//! aggregation the dashboard drill-down runs on top.

pub mod config;
pub mod models;
pub mod services;

pub use config::{Config, SynthesisProfile};
pub use services::{generate, AnalyticsTable, DatasetStore, SegmentAggregator, TableSource};
