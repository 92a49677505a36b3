//! The CFF INDEX structure, used by the String INDEX that holds the custom
//! glyph names of a font.

use crate::cff::StringTable;
use crate::stream::{Readable, Reader, U24};
use crate::{Error, Result};

/// A CFF INDEX: an array of variable-sized objects.
#[derive(Clone, Copy, Debug, Default)]
pub struct Index<'a> {
    data: &'a [u8],
    offsets: VarOffsets<'a>,
}

impl<'a> Index<'a> {
    /// Parse an INDEX, advancing the reader past it.
    pub fn parse(r: &mut Reader<'a>) -> Result<Self> {
        let count = r.read::<u16>()?;
        if count == 0 {
            return Ok(Index::default());
        }

        let offset_size = r.read::<OffsetSize>()?;
        let offsets_len = (usize::from(count) + 1) * offset_size.to_usize();
        let offsets = VarOffsets { data: r.read_bytes(offsets_len)?, offset_size };

        // Last offset indicates the size of the object data.
        match offsets.last() {
            Some(last_offset) => {
                let data = r.read_bytes(last_offset as usize)?;
                Ok(Index { data, offsets })
            }
            None => Ok(Index::default()),
        }
    }

    /// The number of objects.
    pub fn len(&self) -> u32 {
        // Last offset points to the byte after the object data. We should skip it.
        self.offsets.len().saturating_sub(1)
    }

    /// Whether the INDEX has no objects.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The object at `index`.
    pub fn get(&self, index: u32) -> Option<&'a [u8]> {
        let next_index = index.checked_add(1)?;
        let start = self.offsets.get(index)? as usize;
        let end = self.offsets.get(next_index)? as usize;
        self.data.get(start..end)
    }

    /// Iterate over the objects.
    pub fn iter(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        (0..self.len()).filter_map(|i| self.get(i))
    }
}

/// Strings are PostScript names and thus ASCII. Anything that isn't valid
/// UTF-8 is treated as missing.
impl StringTable for Index<'_> {
    fn string(&self, index: usize) -> Option<&str> {
        let object = self.get(u32::try_from(index).ok()?)?;
        std::str::from_utf8(object).ok()
    }

    fn count(&self) -> usize {
        self.len() as usize
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct VarOffsets<'a> {
    data: &'a [u8],
    offset_size: OffsetSize,
}

impl VarOffsets<'_> {
    fn get(&self, index: u32) -> Option<u32> {
        if index >= self.len() {
            return None;
        }

        let start = index as usize * self.offset_size.to_usize();
        let mut r = Reader::new_at(self.data, start);
        let n: u32 = match self.offset_size {
            OffsetSize::Size1 => u32::from(r.read::<u8>().ok()?),
            OffsetSize::Size2 => u32::from(r.read::<u16>().ok()?),
            OffsetSize::Size3 => r.read::<U24>().ok()?.0,
            OffsetSize::Size4 => r.read::<u32>().ok()?,
        };

        // Offsets are offset by one byte in the font,
        // so we have to shift them back.
        n.checked_sub(1)
    }

    fn last(&self) -> Option<u32> {
        self.len().checked_sub(1).and_then(|last| self.get(last))
    }

    fn len(&self) -> u32 {
        (self.data.len() / self.offset_size.to_usize()) as u32
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
enum OffsetSize {
    #[default]
    Size1 = 1,
    Size2 = 2,
    Size3 = 3,
    Size4 = 4,
}

impl OffsetSize {
    fn to_usize(self) -> usize {
        self as usize
    }
}

impl Readable<'_> for OffsetSize {
    const SIZE: usize = 1;

    fn read(r: &mut Reader<'_>) -> Result<Self> {
        match r.read::<u8>()? {
            1 => Ok(OffsetSize::Size1),
            2 => Ok(OffsetSize::Size2),
            3 => Ok(OffsetSize::Size3),
            4 => Ok(OffsetSize::Size4),
            _ => Err(Error::InvalidData),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_index() {
        #[rustfmt::skip]
        let data = [
            0, 2, // count
            1, // offset size
            1, 8, 14, // offsets
            b'u', b'n', b'i', b'2', b'6', b'0', b'3',
            b's', b'm', b'i', b'l', b'e', b'y',
            0xAA, // trailing byte
        ];

        let mut r = Reader::new(&data);
        let index = Index::parse(&mut r).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.string(0), Some("uni2603"));
        assert_eq!(index.string(1), Some("smiley"));
        assert_eq!(index.string(2), None);
        assert_eq!(r.tail(), &[0xAA]);
        assert_eq!(index.iter().count(), 2);
    }

    #[test]
    fn empty_index() {
        let mut r = Reader::new(&[0, 0]);
        let index = Index::parse(&mut r).unwrap();
        assert!(index.is_empty());
        assert!(r.at_end());
    }

    #[test]
    fn bad_offset_size() {
        let mut r = Reader::new(&[0, 1, 7, 1, 1]);
        assert_eq!(Index::parse(&mut r).unwrap_err(), Error::InvalidData);
    }
}
