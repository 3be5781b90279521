//! Library exports for the URL shortener
//!
//! This module exposes internal components for testing and potential library usage.

pub mod activity;
pub mod auth;
pub mod clicks;
pub mod cli;
pub mod clock;
pub mod command;
pub mod config;
pub mod database;
pub mod error;
pub mod model;
pub mod random;
pub mod redirect;
pub mod registry;
pub mod service;
pub mod stats;

pub use error::{AppError, ServiceError, StoreError};
pub use service::{ServiceOptions, UrlService};
