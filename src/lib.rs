//! Lead Enrichment API Library
//!
//! This library collects third-party data about a lead from several
//! enrichment APIs, condenses it into a bounded text summary, and asks a
//! language model for a narrative analysis.
//!
//! # Modules
//!
//! - `analysis`: Prompt assembly and the language-model client.
//! - `config`: Configuration management.
//! - `enrichment`: Connector fan-out (aggregator) and the end-to-end pipeline.
//! - `errors`: Error handling types.
//! - `extraction`: Per-source field extraction and the essential summary.
//! - `handlers`: HTTP request handlers and router.
//! - `models`: Core data models.
//! - `notifier`: Report mailer trait and HTTP mail relay client.
//! - `report`: HTML rendering of enrichment reports.
//! - `services`: External API clients (PeopleDataLabs, Apollo, Hunter.io, SerpAPI).

pub mod analysis;
pub mod config;
pub mod enrichment;
pub mod errors;
pub mod extraction;
pub mod handlers;
pub mod models;
pub mod notifier;
pub mod report;
pub mod services;
