use crate::bits::reader::{read_u32, read_u64};
use crate::errors::{CaptureResult, Mp4Error};

/// Box header information
#[derive(Debug, Clone, PartialEq)]
pub struct BoxHeader {
    pub name: String,
    /// Total box size including the header. `None` for a box that runs to end of file.
    pub size: Option<u64>,
    pub header_size: u64,
}

impl BoxHeader {
    pub fn payload_size(&self) -> Option<u64> {
        self.size.map(|size| size - self.header_size)
    }
}

/// Parse a box header from a byte slice advancing the cursor.
///
/// Returns `Ok(None)` when `data` does not yet hold a complete header.
pub fn parse_box_header(data: &[u8], pos: &mut usize) -> CaptureResult<Option<BoxHeader>> {
    let start = *pos;
    let mut cursor = start;
    let Some(size32) = read_u32(data, &mut cursor) else {
        return Ok(None);
    };
    let Some(name) = data.get(cursor..cursor + 4) else {
        return Ok(None);
    };
    cursor += 4;
    let name = String::from_utf8_lossy(name).into_owned();

    let (size, header_size) = match size32 {
        0 => (None, 8),
        1 => {
            let Some(size) = read_u64(data, &mut cursor) else {
                return Ok(None);
            };
            if size < 16 {
                return Err(Mp4Error::malformed(format!(
                    "{} box has invalid extended size {}",
                    name, size
                ))
                .into());
            }
            (Some(size), 16)
        }
        size if size < 8 => {
            return Err(
                Mp4Error::malformed(format!("{} box has invalid size {}", name, size)).into(),
            );
        }
        size => (Some(size as u64), 8),
    };

    *pos = cursor;
    Ok(Some(BoxHeader {
        name,
        size,
        header_size,
    }))
}

/// Write a box header to a vector
pub fn write_box_header(output: &mut Vec<u8>, name: &str, size: u32) {
    output.extend_from_slice(&size.to_be_bytes());
    output.extend_from_slice(name.as_bytes());
}

/// Serialize a box in its on-disk form: 32-bit size, fourcc, payload.
pub fn write_box(name: &str, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 8);
    write_box_header(&mut out, name, (payload.len() + 8) as u32);
    out.extend_from_slice(payload);
    out
}

/// Iterator over the child boxes of a fully buffered container payload.
///
/// Yields `(name, payload)` pairs and stops at the first header that does not fit.
pub struct BoxIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BoxIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl<'a> Iterator for BoxIter<'a> {
    type Item = (String, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.pos;
        let mut pos = self.pos;
        let header = parse_box_header(self.data, &mut pos).ok()??;
        let end = match header.size {
            Some(size) => start.checked_add(usize::try_from(size).ok()?)?,
            None => self.data.len(),
        };
        if end > self.data.len() {
            return None;
        }
        self.pos = end;
        Some((header.name, &self.data[pos..end]))
    }
}

/// Find a box and return the contained slice
pub fn find_box<'a>(data: &'a [u8], name: &str) -> Option<&'a [u8]> {
    BoxIter::new(data)
        .find(|(box_name, _)| box_name == name)
        .map(|(_, payload)| payload)
}

/// Find a required child box, naming the parent in the error.
pub fn require_box<'a>(data: &'a [u8], name: &str, parent: &str) -> CaptureResult<&'a [u8]> {
    find_box(data, name).ok_or_else(|| Mp4Error::missing(name, parent).into())
}
