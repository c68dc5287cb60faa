//! Output generation for run artifacts.
//!
//! # Submodules
//!
//! - [`json`]: Writes the filtered article list and the run summary, and
//!   reads the article list back for uploads and local retrieval
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── articles.json
//! └── logs/
//!     ├── scrape_2026-02-07_00-00-01.log
//!     └── scrape_2026-02-08_00-00-02.log
//! ```

pub mod json;
