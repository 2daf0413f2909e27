//! # artwork-magick
//!
//! ImageMagick plumbing for artwork derivatives.
//!
//! This crate provides:
//! - Target sizes and geometry strings ([`Size`])
//! - The width-driven JPEG quality and sharpening policy ([`QualityPolicy`])
//! - A converter that shells out to `convert`/`magick` ([`Converter`])
//! - Tool discovery ([`check_tools`], [`find_convert`])
//! - Scratch space for rewriting an image in place ([`Workspace`])
//!
//! ## Example
//!
//! ```no_run
//! use artwork_magick::{Converter, Method, Size};
//! use std::path::Path;
//!
//! let converter = Converter::discover(None)?;
//! let ok = converter.try_convert(
//!     Path::new("photo.jpg"),
//!     Path::new("photo-200w.jpg"),
//!     &Size::Square(200),
//!     Method::Thumbnail,
//! );
//! println!("thumbnail written: {ok}");
//! # Ok::<(), artwork_magick::Error>(())
//! ```

pub mod convert;
mod error;
pub mod geometry;
pub mod tools;
pub mod workspace;

// Re-exports
pub use convert::Converter;
pub use error::{Error, Result};
pub use geometry::{source_width, Method, QualityPolicy, Size};
pub use tools::{check_tool, check_tools, find_convert, ToolInfo};
pub use workspace::Workspace;
