//! Reading and writing the `cmap` table, which maps characters to glyphs.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use crate::stream::{Readable, Reader, Writeable, Writer};
use crate::{Error, Result};

pub use self::subtable0::Subtable0;
pub use self::subtable12::Subtable12;
pub use self::subtable4::Subtable4;

mod subtable0;
mod subtable12;
pub mod subtable14;
mod subtable4;

/// A mapping from code points to glyphs, as defined by a `cmap` subtable.
pub trait CharacterMap {
    /// Returns the glyph of a code point.
    fn glyph_index(&self, code_point: u32) -> Option<u16>;

    /// Calls `f` for each code point and its glyph.
    fn mappings(&self, f: impl FnMut(u32, u16));
}

impl CharacterMap for BTreeMap<u32, u16> {
    fn glyph_index(&self, code_point: u32) -> Option<u16> {
        self.get(&code_point).copied()
    }

    fn mappings(&self, mut f: impl FnMut(u32, u16)) {
        for (&c, &g) in self {
            f(c, g);
        }
    }
}

impl<S: BuildHasher> CharacterMap for HashMap<u32, u16, S> {
    fn glyph_index(&self, code_point: u32) -> Option<u16> {
        self.get(&code_point).copied()
    }

    fn mappings(&self, mut f: impl FnMut(u32, u16)) {
        for (&c, &g) in self {
            f(c, g);
        }
    }
}

impl<T: CharacterMap + ?Sized> CharacterMap for &T {
    fn glyph_index(&self, code_point: u32) -> Option<u16> {
        T::glyph_index(self, code_point)
    }

    fn mappings(&self, f: impl FnMut(u32, u16)) {
        T::mappings(self, f)
    }
}

/// Identifies the platform and encoding of a subtable.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct EncodingRecord {
    /// The platform ID.
    pub platform_id: u16,
    /// The platform-specific encoding ID.
    pub encoding_id: u16,
    /// The offset of the subtable from the start of the `cmap` table.
    pub subtable_offset: u32,
}

impl EncodingRecord {
    fn is_unicode(&self) -> bool {
        self.platform_id == 0
            || (self.platform_id == 3 && [0, 1, 10].contains(&self.encoding_id))
    }

    fn is_variation_sequences(&self) -> bool {
        self.platform_id == 0 && self.encoding_id == 5
    }
}

impl Readable<'_> for EncodingRecord {
    const SIZE: usize = 8;

    fn read(r: &mut Reader) -> Result<Self> {
        let platform_id = r.read::<u16>()?;
        let encoding_id = r.read::<u16>()?;
        let subtable_offset = r.read::<u32>()?;

        Ok(EncodingRecord { platform_id, encoding_id, subtable_offset })
    }
}

impl Writeable for EncodingRecord {
    fn write(&self, w: &mut Writer) {
        w.write::<u16>(self.platform_id);
        w.write::<u16>(self.encoding_id);
        w.write::<u32>(self.subtable_offset);
    }
}

/// A parsed `cmap` table header.
#[derive(Debug, Clone)]
pub struct Table<'a> {
    data: &'a [u8],
    records: Vec<EncodingRecord>,
}

impl<'a> Table<'a> {
    /// Parse the header and encoding records of a `cmap` table.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let mut r = Reader::new(data);
        r.read::<u16>()?; // version
        let num_tables = r.read::<u16>()?;
        let records = r.read_vector::<EncodingRecord>(usize::from(num_tables))?;
        Ok(Self { data, records })
    }

    /// The encoding records, in the order of the table.
    pub fn records(&self) -> &[EncodingRecord] {
        &self.records
    }

    /// The data of the subtable a record points to.
    pub fn subtable(&self, record: &EncodingRecord) -> Result<&'a [u8]> {
        self.data.get(record.subtable_offset as usize..).ok_or(Error::InvalidOffset)
    }

    /// The preferred Unicode subtable: format 12 if there is one, otherwise
    /// format 4.
    pub fn unicode_map(&self) -> Result<Option<UnicodeMap<'a>>> {
        let mut format4 = None;

        for record in self.records.iter().filter(|r| r.is_unicode()) {
            let data = self.subtable(record)?;
            match u16::read_at(data, 0)? {
                12 => return Ok(Some(UnicodeMap::Format12(Subtable12::read_at(data, 0)?))),
                4 if format4.is_none() => format4 = Some(data),
                _ => {}
            }
        }

        format4
            .map(|data| Subtable4::read_at(data, 0).map(UnicodeMap::Format4))
            .transpose()
    }

    /// The Unicode Variation Sequences subtable, merged onto `base`.
    pub fn variation_sequences(
        &self,
        base: &impl CharacterMap,
    ) -> Result<Option<subtable14::VariationSequences>> {
        let Some(record) = self.records.iter().find(|r| r.is_variation_sequences())
        else {
            return Ok(None);
        };

        let data = self.subtable(record)?;
        subtable14::VariationSequences::parse(data, base).map(Some)
    }
}

/// A subtable that maps Unicode code points to glyphs.
#[derive(Debug, Clone)]
pub enum UnicodeMap<'a> {
    /// Format 4, limited to the Basic Multilingual Plane.
    Format4(Subtable4<'a>),
    /// Format 12, covering all planes.
    Format12(Subtable12),
}

impl CharacterMap for UnicodeMap<'_> {
    fn glyph_index(&self, code_point: u32) -> Option<u16> {
        match self {
            Self::Format4(subtable) => subtable.glyph_index(code_point),
            Self::Format12(subtable) => subtable.glyph_index(code_point),
        }
    }

    fn mappings(&self, f: impl FnMut(u32, u16)) {
        match self {
            Self::Format4(subtable) => subtable.mappings(f),
            Self::Format12(subtable) => subtable.mappings(f),
        }
    }
}

/// A single-byte encoding for `cmap` tables of fonts with at most 256 codes.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum ByteEncoding {
    /// The Macintosh Roman encoding with a format 0 subtable. It is supported
    /// by TrueType consumers as well as PDF readers.
    #[default]
    MacRoman,
    /// The Windows Symbol encoding with a format 4 subtable, where the codes
    /// live at `0xF000` and up.
    Symbol,
}

impl ByteEncoding {
    /// The first character of the symbol encoding's private use area.
    const SYMBOL_BASE: u16 = 0xF000;

    fn platform_and_encoding(self) -> (u16, u16) {
        match self {
            Self::MacRoman => (1, 0),
            Self::Symbol => (3, 0),
        }
    }

    fn of_record(record: &EncodingRecord) -> Option<Self> {
        [Self::MacRoman, Self::Symbol].into_iter().find(|encoding| {
            encoding.platform_and_encoding() == (record.platform_id, record.encoding_id)
        })
    }
}

/// Build a `cmap` table with a single subtable that maps single-byte codes
/// to glyphs in the given encoding.
///
/// The Mac Roman subtable stores glyphs as bytes, so it fails with
/// [`Error::InvalidData`] for glyphs above 255. Renumber the glyphs first,
/// as [`ClusterAllocator::build_output_charmap`](crate::ClusterAllocator::build_output_charmap)
/// does.
pub fn encode_single_byte(
    mapping: &BTreeMap<u8, u16>,
    encoding: ByteEncoding,
) -> Result<Vec<u8>> {
    let mut subtable = Writer::new();
    match encoding {
        ByteEncoding::MacRoman => subtable.write(Subtable0::from_mappings(mapping)?),
        ByteEncoding::Symbol => subtable.write(Subtable4::from_mappings(
            mapping.iter().map(|(&c, &g)| (ByteEncoding::SYMBOL_BASE + u16::from(c), g)),
        )),
    }

    let (platform_id, encoding_id) = encoding.platform_and_encoding();
    let record = EncodingRecord {
        platform_id,
        encoding_id,
        subtable_offset: (2 * 2 + EncodingRecord::SIZE) as u32,
    };

    let subtable = subtable.finish();
    let mut w = Writer::with_capacity(record.subtable_offset as usize + subtable.len());
    w.write::<u16>(0); // version
    w.write::<u16>(1); // number of subtables
    w.write(record);
    w.extend(&subtable);
    Ok(w.finish())
}

/// Read back the codes of a `cmap` table written by [`encode_single_byte`].
///
/// The first subtable in one of the supported single-byte encodings is used.
/// Codes that map to `.notdef` are indistinguishable from unmapped ones and
/// are left out.
pub fn decode_single_byte(data: &[u8]) -> Result<BTreeMap<u8, u16>> {
    let table = Table::parse(data)?;
    let (record, encoding) = table
        .records()
        .iter()
        .find_map(|record| Some((record, ByteEncoding::of_record(record)?)))
        .ok_or(Error::InvalidData)?;

    let subtable = table.subtable(record)?;
    let mut mapping = BTreeMap::new();

    match (encoding, u16::read_at(subtable, 0)?) {
        (ByteEncoding::MacRoman, 0) => {
            Subtable0::read_at(subtable, 0)?.mappings(|c, g| {
                mapping.insert(c as u8, g);
            });
        }
        (ByteEncoding::Symbol, 4) => {
            let subtable = Subtable4::read_at(subtable, 0)?;
            for code in 0..=u8::MAX {
                let c = u32::from(ByteEncoding::SYMBOL_BASE + u16::from(code));
                if let Some(g) = subtable.glyph_index(c).filter(|&g| g != 0) {
                    mapping.insert(code, g);
                }
            }
        }
        _ => return Err(Error::InvalidData),
    }

    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> BTreeMap<u8, u16> {
        BTreeMap::from([(0x20, 3), (0x21, 36), (0x22, 37), (0x23, 0), (0x40, 12)])
    }

    fn without_notdef(mapping: BTreeMap<u8, u16>) -> BTreeMap<u8, u16> {
        mapping.into_iter().filter(|&(_, g)| g != 0).collect()
    }

    #[test]
    fn mac_roman_layout() {
        let data = encode_single_byte(&mapping(), ByteEncoding::MacRoman).unwrap();
        assert_eq!(data.len(), 12 + 262);
        assert_eq!(&data[..12], &[0, 0, 0, 1, 0, 1, 0, 0, 0, 0, 0, 12]);
        assert_eq!(&data[12..18], &[0, 0, 1, 6, 0, 0]);
        assert_eq!(data[18 + 0x21], 36);
    }

    #[test]
    fn single_byte_round_trip() {
        for encoding in [ByteEncoding::MacRoman, ByteEncoding::Symbol] {
            let data = encode_single_byte(&mapping(), encoding).unwrap();
            assert_eq!(decode_single_byte(&data), Ok(without_notdef(mapping())));
        }
    }

    #[test]
    fn wide_glyphs() {
        let mapping = BTreeMap::from([(0x20, 3), (0x21, 1234)]);
        assert_eq!(
            encode_single_byte(&mapping, ByteEncoding::MacRoman),
            Err(Error::InvalidData)
        );

        let data = encode_single_byte(&mapping, ByteEncoding::Symbol).unwrap();
        assert_eq!(decode_single_byte(&data), Ok(mapping));
    }

    #[test]
    fn symbol_record() {
        let data = encode_single_byte(&mapping(), ByteEncoding::Symbol).unwrap();
        let table = Table::parse(&data).unwrap();
        assert_eq!(
            table.records(),
            &[EncodingRecord { platform_id: 3, encoding_id: 0, subtable_offset: 12 }]
        );
        let subtable = Subtable4::read_at(table.subtable(&table.records()[0]).unwrap(), 0);
        assert_eq!(subtable.unwrap().glyph_index(0xF040), Some(12));
    }

    #[test]
    fn decode_rejects_unicode_tables() {
        let mut w = Writer::new();
        w.write::<u16>(0);
        w.write::<u16>(1);
        w.write(EncodingRecord { platform_id: 0, encoding_id: 3, subtable_offset: 12 });
        w.write(Subtable12::from_mappings([(0x41, 5)]));
        let data = w.finish();

        assert_eq!(decode_single_byte(&data), Err(Error::InvalidData));

        let table = Table::parse(&data).unwrap();
        let map = table.unicode_map().unwrap().unwrap();
        assert_eq!(map.glyph_index(0x41), Some(5));
        assert!(table.variation_sequences(&map).unwrap().is_none());
    }

    #[test]
    fn prefers_format12() {
        let format4 = {
            let mut w = Writer::new();
            w.write(Subtable4::from_mappings([(0x41, 5)]));
            w.finish()
        };
        let format12 = {
            let mut w = Writer::new();
            w.write(Subtable12::from_mappings([(0x41, 6), (0x1F600, 7)]));
            w.finish()
        };

        let mut w = Writer::new();
        w.write::<u16>(0);
        w.write::<u16>(2);
        w.write(EncodingRecord { platform_id: 3, encoding_id: 1, subtable_offset: 20 });
        w.write(EncodingRecord {
            platform_id: 3,
            encoding_id: 10,
            subtable_offset: 20 + format4.len() as u32,
        });
        w.extend(&format4);
        w.extend(&format12);
        let data = w.finish();

        let table = Table::parse(&data).unwrap();
        let map = table.unicode_map().unwrap().unwrap();
        assert!(matches!(map, UnicodeMap::Format12(_)));
        assert_eq!(map.glyph_index(0x1F600), Some(7));
    }

    #[test]
    fn truncated_table() {
        assert_eq!(Table::parse(&[0, 0, 0, 2, 0, 1]).unwrap_err(), Error::MissingData);
        let data = [0, 0, 0, 1, 0, 1, 0, 0, 0, 0, 1, 0];
        let table = Table::parse(&data).unwrap();
        assert_eq!(table.subtable(&table.records()[0]), Err(Error::InvalidOffset));
    }
}
