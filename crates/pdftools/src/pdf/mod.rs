//! lopdf helpers shared by compression and merging.
//!
//! - `document`: loading, saving and page inspection
//! - `images`: JPEG re-encoding of embedded images and image XObject creation
//! - `optimize`: object deduplication and metadata stripping

pub mod document;
pub mod images;
pub mod optimize;

pub use document::{load_document, page_count, save_document};
