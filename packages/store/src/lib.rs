#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! JSON file-backed collaborators for the reporting core.
//!
//! - [`local::JsonDirStore`] keeps one device's reports and submission meta in
//!   a directory, one JSON document per key.
//! - [`feed_file::JsonFeedFile`] is a flat shared feed file that several
//!   devices publish into and read snapshots from.

pub mod feed_file;
pub mod local;
pub mod paths;

pub use feed_file::JsonFeedFile;
pub use local::JsonDirStore;
