use tracing::debug;

use crate::error::{ImageError, ImageResult};

use super::parser::scan_sections;
use super::structures::*;

/// Location of a named file section, as returned by [`Image::find_file`].
#[derive(Debug, Clone, Copy)]
pub struct FileLocation {
    /// Byte offset of the section header within the image
    pub offset: usize,
    /// Declared length from the header (payload + name + reserved fields)
    pub length: usize,
    /// Whether the section is the final entry of the table, which decides
    /// the padding policy on update
    pub last: bool,
}

/// An in-memory firmware image: the exclusively owned byte buffer plus the
/// section table built once at load time.
///
/// Sections are views (offset + length) into the buffer, so updates mutate
/// in place and never relocate a section's header. The image is consumed by
/// exactly one terminal emit via [`as_bytes`](Image::as_bytes) or
/// [`into_bytes`](Image::into_bytes).
pub struct Image {
    data: Vec<u8>,
    sections: Vec<Section>,
}

impl Image {
    /// Parse an image from its raw bytes.
    ///
    /// # Errors
    ///
    /// [`ImageError::SizeMismatch`] unless the buffer is exactly
    /// [`IMAGE_SIZE`] bytes; [`ImageError::CorruptSection`] when the scan
    /// hits an invalid header.
    pub fn from_bytes(data: Vec<u8>) -> ImageResult<Self> {
        if data.len() != IMAGE_SIZE {
            return Err(ImageError::SizeMismatch {
                expected: IMAGE_SIZE,
                actual: data.len(),
            });
        }
        let sections = scan_sections(&data)?;
        Ok(Self { data, sections })
    }

    /// The ordered section table.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// The full image buffer, emitted verbatim with no re-validation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the image, returning the buffer for a terminal write.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Locate a named file section.
    ///
    /// First match wins: duplicate names are tolerated, trusting the
    /// single-producer image generator, and the scan order decides.
    pub fn find_file(&self, name: &str) -> Option<FileLocation> {
        let idx = self.file_index(name)?;
        Some(FileLocation {
            offset: self.sections[idx].offset,
            length: self.sections[idx].length,
            last: idx == self.sections.len() - 1,
        })
    }

    fn file_index(&self, name: &str) -> Option<usize> {
        self.sections
            .iter()
            .position(|s| s.is_file() && s.name.as_deref() == Some(name))
    }

    /// Extract the payload of a named file section.
    ///
    /// Returns exactly the stored payload bytes, excluding the header, name
    /// and reserved fields.
    pub fn read_file(&self, name: &str) -> ImageResult<&[u8]> {
        let idx = self
            .file_index(name)
            .ok_or_else(|| ImageError::TargetNotFound(name.to_string()))?;
        let sec = &self.sections[idx];
        let start = sec.payload_offset();
        Ok(&self.data[start..start + sec.payload_len()])
    }

    /// Replace the payload of a named file section in place.
    ///
    /// The section's header never moves; its length field is rewritten and
    /// the span after the new payload is re-padded so that every following
    /// section keeps its offset and alignment:
    ///
    /// - fill to the next 8-byte boundary with the erased-flash value
    /// - for a non-terminal section, carve a fresh padding section up to the
    ///   next 4096-byte block boundary (when the gap leaves room for its
    ///   header), so a later scan walks past the gap instead of
    ///   misinterpreting stale bytes
    /// - for the terminal section, erase the remaining tail of the image; no
    ///   padding record is needed since the scan stops at erased flash
    ///
    /// # Errors
    ///
    /// [`ImageError::TargetNotFound`] when no file section carries `name`;
    /// [`ImageError::CapacityExceeded`] when header, name and payload would
    /// extend past the fixed image size. On error the buffer is untouched.
    pub fn update_file(&mut self, name: &str, payload: &[u8]) -> ImageResult<()> {
        let idx = self
            .file_index(name)
            .ok_or_else(|| ImageError::TargetNotFound(name.to_string()))?;
        let offset = self.sections[idx].offset;
        let payload_start = self.sections[idx].payload_offset();
        let payload_end = payload_start + payload.len();

        // Every check happens before the first mutation: a failed update
        // must leave the image exactly as it was
        if payload_end > IMAGE_SIZE {
            return Err(ImageError::CapacityExceeded {
                name: name.to_string(),
                payload_len: payload.len(),
            });
        }
        let last = idx == self.sections.len() - 1;

        let new_length = payload.len() + FILE_OVERHEAD;
        put_u32_be(&mut self.data, offset + 4, new_length as u32);
        self.data[payload_start..payload_end].copy_from_slice(payload);
        self.sections[idx].length = new_length;

        // Erased-state fill up to the next 8-byte boundary keeps whatever
        // follows aligned for any payload length parity
        let mut pad = payload_end;
        while pad % SECTION_ALIGN != 0 {
            self.data[pad] = ERASED;
            pad += 1;
        }

        if last {
            // Nothing downstream depends on block alignment here. Erase
            // through the end of the image so a shrink cannot leave old
            // payload bytes where the next scan reads a header word.
            self.data[pad..].fill(ERASED);
            debug!("updated \"{}\" ({} bytes, terminal)", name, payload.len());
            return Ok(());
        }

        // A stale padding record behind this section no longer describes
        // the gap; the fresh one is inserted below when there is room
        if self.sections.get(idx + 1).is_some_and(Section::is_padding) {
            self.sections.remove(idx + 1);
        }

        let gap = align_up(pad, BLOCK_ALIGN) - pad;
        if gap > HEADER_SIZE {
            put_u32_be(&mut self.data, pad, PAD_MAGIC);
            put_u32_be(&mut self.data, pad + 4, (gap - HEADER_SIZE) as u32);
            self.data[pad + HEADER_SIZE..pad + gap].fill(ERASED);
            self.sections.insert(
                idx + 1,
                Section {
                    magic: PAD_MAGIC,
                    offset: pad,
                    length: gap - HEADER_SIZE,
                    name: None,
                },
            );
            debug!(
                "updated \"{}\" ({} bytes), padding section of {} at {:#x}",
                name,
                payload.len(),
                gap - HEADER_SIZE,
                pad
            );
        } else {
            // A gap of 8 bytes or less has no room for a padding header.
            // The bytes are left as they are; a later scan reads them as
            // end-of-table only while they remain in the erased state.
            debug!(
                "updated \"{}\" ({} bytes), unmarked gap of {}",
                name,
                payload.len(),
                gap
            );
        }
        Ok(())
    }
}

fn put_u32_be(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}
