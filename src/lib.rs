//! # docstash
//!
//! Capture a document image, send it to a processing endpoint with a target
//! language, and keep the returned text alongside the image reference in a
//! local SQLite key-value store.
//!
//! ```text
//! ┌──────────┐  upload   ┌──────────────┐
//! │  image   │──────────▶│ HTTP endpoint│
//! └──────────┘           └──────┬───────┘
//!                               │ result text
//!                               ▼
//!                      ┌─────────────────┐    ┌──────────┐
//!                      │ LifecycleCtrl   │───▶│  SQLite  │
//!                      │ (docstash-core) │    │   kv     │
//!                      └─────────────────┘    └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! docstash init
//! docstash language set french
//! docstash upload ./scan.jpg --save
//! docstash list
//! docstash delete 1700000000000
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite key-value store |
//! | [`http_processor`] | Multipart upload client |
//! | [`app`] | Store + processor wiring |
//! | [`logging`] | Subscriber setup |
//! | [`upload`], [`list`], [`show`], [`delete`], [`language_cmd`], [`doctor_cmd`] | CLI commands |

pub mod app;
pub mod config;
pub mod db;
pub mod delete;
pub mod doctor_cmd;
pub mod http_processor;
pub mod language_cmd;
pub mod list;
pub mod logging;
pub mod migrate;
pub mod show;
pub mod sqlite_store;
pub mod upload;
