//! Web server for browser-based reading list checks.
//!
//! This module provides a single-page upload interface using Axum.
//! Users upload a `.txt`/`.docx` reading list or paste citations and get one
//! report per entry back.
//!
//! ## Starting the Server
//!
//! ```text
//! # Start on default port 8080
//! cite-check serve
//!
//! # Custom port and auto-open browser
//! cite-check serve --port 3000 --open
//!
//! # Bind to all interfaces
//! cite-check serve --address 0.0.0.0
//! ```
//!
//! ## API Endpoints
//!
//! - `GET /` - Main page with upload form
//! - `POST /api/check` - Check a reading list (multipart form: `file` or
//!   `text`, optional `include_slow`, `author_threshold`, `title_threshold`)
//! - `GET /api/sources` - List the registered metadata sources

pub mod server;
