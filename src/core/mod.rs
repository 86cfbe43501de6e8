//! Core library components.
//!
//! This module contains the control-plane logic: credential brokering,
//! request validation, command rendering, manifest fetching and workflow
//! submission, plus the orchestrator that sequences them.

pub mod command;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod domain;
pub mod manifest;
pub mod orchestrator;
pub mod store;
pub mod types;
pub mod validation;
pub mod workflow;
