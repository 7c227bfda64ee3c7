//! Content generators for static site output.
//!
//! Generates auxiliary files from the built route table:
//!
//! - **Sitemap**: Search engine indexing (`sitemap.xml`)
//! - **Robots**: Crawler policy (`robots.txt`)
//!
//! Both consume the in-memory route table, avoiding a second filesystem
//! scan.

pub mod robots;
pub mod sitemap;

pub use robots::build_robots;
pub use sitemap::build_sitemap;
