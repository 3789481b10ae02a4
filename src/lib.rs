//! memo-node - remote-controlled audio capture node
//!
//! This crate polls a control server for a recording intent, captures raw
//! PCM into a fixed-size session buffer while that intent holds, tracks
//! signal-quality statistics, and uploads each finished session.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Session state machine, capture buffer, quality metrics, poll state
//! - **Application**: Use cases (poller, upload pipeline, controller) and port traits
//! - **Infrastructure**: Adapter implementations (reqwest, cpal, TOML files)
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
