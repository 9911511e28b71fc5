//! Low-level section-table scanner.
//!
//! This module handles the binary parsing of the image's section headers,
//! building the ordered table that the [`Image`](super::Image) editor works
//! from.
//!
//! ## Scanning Strategy
//!
//! The table is discovered by a single forward scan from offset 0:
//! 1. Read the two big-endian header words (magic, length)
//! 2. Stop at an end-of-table sentinel (all-zero or all-ones magic)
//! 3. Reject anything that fails the base-magic mask check
//! 4. Advance past the declared payload, rounded up to 8 bytes
//!
//! The scan is lossless: it only records offsets and lengths, so an image
//! that is parsed and re-emitted without updates is byte-for-byte identical
//! to the input.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::Cursor;
use tracing::debug;

use crate::error::{ImageError, ImageResult};

use super::structures::*;

/// Scan the section table of an image buffer.
///
/// Starting at offset 0, reads consecutive section headers until the logical
/// end of the table. Bytes past the end of the table are unused (erased
/// flash) and are not modeled as sections.
///
/// # Arguments
///
/// * `data` - The full image buffer (the caller has already checked its size)
///
/// # Returns
///
/// The ordered section table. Ordering is significant: the final entry is
/// treated specially by the update path's padding policy.
///
/// # Errors
///
/// Returns [`ImageError::CorruptSection`] when a header's masked magic does
/// not match the base magic, or when a section's declared extent cannot fit
/// in the image. The scan aborts at the first bad header and never attempts
/// to resynchronize: skipping forward would risk misinterpreting arbitrary
/// binary data as structure.
pub fn scan_sections(data: &[u8]) -> ImageResult<Vec<Section>> {
    let mut sections = Vec::new();
    let mut cursor = Cursor::new(data);
    let mut offset = 0usize;

    while offset + HEADER_SIZE <= data.len() {
        cursor.set_position(offset as u64);
        let magic = cursor.read_u32::<BigEndian>()?;

        // Not an error: the remainder of the image is unused flash
        if magic == END_FREE || magic == END_ERASED {
            break;
        }

        if magic & MAGIC_MASK != BASE_MAGIC {
            return Err(ImageError::CorruptSection { offset, magic });
        }

        let length = cursor.read_u32::<BigEndian>()? as usize;

        // The declared extent must stay inside the image, and a file section
        // must at least hold its fixed name and reserved fields
        if offset + HEADER_SIZE + length > data.len() {
            return Err(ImageError::CorruptSection { offset, magic });
        }

        let name = if magic == FILE_MAGIC {
            if length < FILE_OVERHEAD {
                return Err(ImageError::CorruptSection { offset, magic });
            }
            let start = offset + HEADER_SIZE;
            Some(decode_name(&data[start..start + NAME_SIZE]))
        } else {
            None
        };

        debug!(
            "  [{}] magic {:#010x} @ {:#x}, {} bytes{}",
            sections.len(),
            magic,
            offset,
            length,
            name.as_deref().map(|n| format!(" ({n})")).unwrap_or_default()
        );

        let section = Section {
            magic,
            offset,
            length,
            name,
        };

        // Next section starts at the declared end, rounded up to 8 bytes
        offset = align_up(section.end(), SECTION_ALIGN);
        sections.push(section);
    }

    debug!("section table: {} entries", sections.len());
    Ok(sections)
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{BLOB_MAGIC, ImageBuilder};
    use super::*;

    #[test]
    fn scans_a_single_file_section() {
        let data = ImageBuilder::new().file("bootconf.txt", b"foo=1\n").finish();
        let sections = scan_sections(&data).unwrap();

        assert_eq!(sections.len(), 1);
        let sec = &sections[0];
        assert_eq!(sec.magic, FILE_MAGIC);
        assert_eq!(sec.offset, 0);
        assert_eq!(sec.length, 6 + FILE_OVERHEAD);
        assert_eq!(sec.name.as_deref(), Some("bootconf.txt"));
    }

    #[test]
    fn scans_files_separated_by_padding() {
        let data = ImageBuilder::new()
            .file("bootconf.txt", b"foo=1\n")
            .pad_to_block()
            .file("bootconf.sig", &[0xAB; 256])
            .finish();
        let sections = scan_sections(&data).unwrap();

        assert_eq!(sections.len(), 3);
        assert!(sections[0].is_file());
        assert!(sections[1].is_padding());
        assert!(sections[2].is_file());
        // The padding section spans exactly to the next block boundary
        assert_eq!(align_up(sections[1].end(), SECTION_ALIGN), BLOCK_ALIGN);
        assert_eq!(sections[2].offset, BLOCK_ALIGN);
    }

    #[test]
    fn every_section_offset_is_aligned() {
        let data = ImageBuilder::new()
            .file("bootconf.txt", b"odd length payload\n")
            .pad_to_block()
            .file("bootconf.sig", &[1, 2, 3])
            .pad_to_block()
            .file("bootconf.pub", &[9; 264])
            .finish();

        for sec in scan_sections(&data).unwrap() {
            assert_eq!(sec.offset % SECTION_ALIGN, 0);
        }
    }

    #[test]
    fn accepts_generic_filled_sections() {
        let data = ImageBuilder::new()
            .section(BLOB_MAGIC, &[0x10; 40])
            .pad_to_block()
            .file("bootconf.txt", b"foo=1\n")
            .finish();
        let sections = scan_sections(&data).unwrap();

        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].magic, BLOB_MAGIC);
        assert!(sections[0].name.is_none());
        assert_eq!(sections[2].name.as_deref(), Some("bootconf.txt"));
    }

    #[test]
    fn stops_at_erased_flash() {
        // An image that is nothing but erased flash has an empty table
        let data = vec![ERASED; IMAGE_SIZE];
        assert!(scan_sections(&data).unwrap().is_empty());
    }

    #[test]
    fn stops_at_zeroed_end_marker() {
        let mut data = ImageBuilder::new().file("bootconf.txt", b"x").finish();
        // Overwrite the erased tail with zeroes; the scan must still stop
        let end = align_up(HEADER_SIZE + FILE_OVERHEAD + 1, SECTION_ALIGN);
        data[end..].fill(0);
        assert_eq!(scan_sections(&data).unwrap().len(), 1);
    }

    #[test]
    fn rejects_unrecognized_magic_at_the_right_offset() {
        let mut data = ImageBuilder::new()
            .file("bootconf.txt", b"foo=1\n")
            .pad_to_block()
            .file("bootconf.sig", &[0xAB; 64])
            .finish();
        // Corrupt the second block's header
        data[BLOCK_ALIGN] = 0xDE;

        match scan_sections(&data) {
            Err(ImageError::CorruptSection { offset, .. }) => {
                assert_eq!(offset, BLOCK_ALIGN);
            }
            other => panic!("expected CorruptSection, got {other:?}"),
        }
    }

    #[test]
    fn rejects_a_section_overrunning_the_image() {
        let mut data = ImageBuilder::new().file("bootconf.txt", b"foo=1\n").finish();
        // Declared length reaching past the end of the buffer
        data[4..8].copy_from_slice(&(IMAGE_SIZE as u32).to_be_bytes());

        assert!(matches!(
            scan_sections(&data),
            Err(ImageError::CorruptSection { offset: 0, .. })
        ));
    }

    #[test]
    fn rejects_a_file_section_too_short_for_its_name() {
        let mut data = vec![ERASED; IMAGE_SIZE];
        data[0..4].copy_from_slice(&FILE_MAGIC.to_be_bytes());
        data[4..8].copy_from_slice(&8u32.to_be_bytes());

        assert!(matches!(
            scan_sections(&data),
            Err(ImageError::CorruptSection { offset: 0, .. })
        ));
    }

    #[test]
    fn trims_trailing_nuls_from_names() {
        let data = ImageBuilder::new().file("conf", b"abc").finish();
        let sections = scan_sections(&data).unwrap();
        assert_eq!(sections[0].name.as_deref(), Some("conf"));
    }
}
