//! Firmware image parsing and editing.
//!
//! This module provides functionality for reading and mutating the
//! fixed-size (512 KiB) firmware image that carries the boot configuration,
//! organized as a sequence of self-describing binary sections.
//!
//! ## Architecture
//!
//! The module is organized into three main components:
//!
//! - [`structures`]: Format constants and the [`Section`] view type
//! - [`parser`]: Low-level scan building the section table from raw bytes
//! - [`editor`]: High-level [`Image`] API for end users
//!
//! ## Container Format Overview
//!
//! All integers are big-endian. Each section is:
//!
//! ```text
//! +--------------------+
//! |  magic        (4B) |  section kind tag
//! +--------------------+
//! |  length       (4B) |  payload bytes, excluding this header
//! +--------------------+
//! |  name        (12B) |  file sections only, NUL-padded
//! +--------------------+
//! |  reserved     (4B) |  file sections only, preserved verbatim
//! +--------------------+
//! |  payload           |
//! +--------------------+
//! ```
//!
//! Sections are laid out back to back, each starting on an 8-byte boundary;
//! file sections other than the last are padded out to 4096-byte block
//! boundaries by dedicated padding sections. An all-zero or all-ones magic
//! marks the end of the table; the rest of the image is erased flash.
//!
//! ## Limitations
//!
//! - No section insertion or deletion, only in-place payload replacement
//! - Payload contents are never interpreted
//! - The image layout itself is produced by an external generator

mod editor;
mod parser;
mod structures;

pub use editor::{FileLocation, Image};
pub use parser::scan_sections;
pub use structures::*;
