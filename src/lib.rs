//! camwatch - client core for a CCTV monitoring dashboard.
//!
//! # Overview
//!
//! camwatch talks to a camera backend over REST, keeps one reconciled copy of
//! its cameras, recordings and alerts, derives the overview statistics and
//! serves filtered views of all of it as JSON. Video itself never passes
//! through here: streaming, ONVIF control and recording all live behind the
//! backend and the streaming service.
//!
//! # Modules
//!
//! - [`model`]: Wire types and explicit patch records
//! - [`client`]: Backend REST client
//! - [`streaming`]: Streaming service client, stream poller and start-up retry
//! - [`filter`]: Search, filter and sort over collections
//! - [`aggregation`]: Dashboard statistics
//! - [`dashboard`]: View-state controller
//! - [`storage`]: SQLite snapshot cache and settings store
//! - [`api`]: HTTP view server handlers

pub mod aggregation;
pub mod api;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod format;
pub mod model;
pub mod seed;
pub mod storage;
pub mod streaming;
