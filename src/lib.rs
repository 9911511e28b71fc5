//! # bootconf
//!
//! Edit the boot configuration embedded in fixed-size firmware images.
//!
//! A release image is a 512 KiB flash blob organized as a sequence of
//! self-describing binary sections. Among them are named "file" sections
//! carrying replaceable content: the human-readable boot configuration and,
//! optionally, its signature and the matching public key. This library
//! parses the section table, extracts named payloads, and replaces them in
//! place while keeping every structural invariant of the container intact,
//! so a read-modify-write round trip is byte-for-byte reproducible.
//!
//! ## Features
//!
//! - Lossless section-table parsing with strict corruption detection
//! - In-place payload replacement with automatic re-padding
//! - Host integration: resolve the newest release image, read the active
//!   configuration, stage an update for next boot
//! - RSA public-key import for the signing sections
//!
//! ## Example
//!
//! ```no_run
//! use bootconf::Image;
//! use bootconf::image::CONFIG_NAME;
//!
//! fn main() -> anyhow::Result<()> {
//!     let data = std::fs::read("release.img")?;
//!     let mut image = Image::from_bytes(data)?;
//!
//!     println!("{}", String::from_utf8_lossy(image.read_file(CONFIG_NAME)?));
//!
//!     image.update_file(CONFIG_NAME, b"console=ttyS0\nboot_delay=3\n")?;
//!     std::fs::write("patched.img", image.as_bytes())?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod host;
pub mod image;
pub mod keys;

pub use cli::{Cli, Command};
pub use error::{ImageError, ImageResult};
pub use host::{ActiveConfig, BootHost, LocalHost};
pub use image::{FileLocation, Image, Section};
