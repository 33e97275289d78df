//! Salesboard - sales analytics dashboard
//!
//! Loads transaction CSVs once, derives the dataset-wide aggregates, and
//! serves a tabbed dashboard with store, state and product-family
//! drill-downs computed on demand.

pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod web;

pub use error::{Error, LoadError, Result};
