//! CFF charsets, which map glyph IDs to string IDs.
//!
//! See <https://adobe-type-tools.github.io/font-tech-notes/pdfs/5176.CFF.pdf#page=21>.

use std::sync::OnceLock;

use crate::cff::standard::{
    EXPERT_CHARSET, EXPERT_SUBSET_CHARSET, ISO_ADOBE_LAST_SID, STANDARD_STRINGS,
};
use crate::cff::{StringId, StringTable};
use crate::remapper::GlyphRemapper;
use crate::stream::{Readable, Reader, Writer};
use crate::{Error, Result};

/// Enumerates Charset IDs defined in the Adobe Technical Note #5176, Table 22
pub mod charset_id {
    /// The ISO-Adobe charset.
    pub const ISO_ADOBE: usize = 0;
    /// The Expert charset.
    pub const EXPERT: usize = 1;
    /// The Expert Subset charset.
    pub const EXPERT_SUBSET: usize = 2;
}

/// The name of glyph 0 in every charset.
const NOTDEF: &str = ".notdef";

/// The on-disk format of a custom charset, stored as its first byte.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CharsetFormat {
    /// One SID per glyph.
    Array = 0,
    /// Ranges of consecutive SIDs with an 8-bit count.
    Range8 = 1,
    /// Ranges of consecutive SIDs with a 16-bit count.
    Range16 = 2,
}

impl CharsetFormat {
    /// The tag byte of the format.
    pub fn tag(self) -> u8 {
        self as u8
    }

    fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(Self::Array),
            1 => Ok(Self::Range8),
            2 => Ok(Self::Range16),
            _ => Err(Error::UnknownCharsetFormat(tag)),
        }
    }
}

/// A run of glyphs with consecutive SIDs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CharsetRange {
    /// The SID of the first glyph in the range.
    pub first: StringId,
    /// The number of glyphs in the range, not counting the first one.
    pub left: u16,
}

impl CharsetRange {
    /// The number of glyphs covered by the range.
    pub fn len(&self) -> u32 {
        u32::from(self.left) + 1
    }
}

/// A charset that is stored in the font.
///
/// Glyph 0 is always `.notdef` and not part of the entries.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CustomCharset {
    /// The SIDs of glyph 1 onwards.
    Array(Vec<StringId>),
    /// Ranges, each with a count below 256.
    Range8(Vec<CharsetRange>),
    /// Ranges with a count of up to 65535.
    Range16(Vec<CharsetRange>),
}

impl CustomCharset {
    /// Read a charset that starts with its format byte.
    fn parse(r: &mut Reader, glyph_count: u16) -> Result<Self> {
        let format = CharsetFormat::from_tag(r.read::<u8>()?)?;

        let charset = match format {
            CharsetFormat::Array => {
                let count = usize::from(glyph_count.saturating_sub(1));
                Self::Array(r.read_vector::<StringId>(count)?)
            }
            CharsetFormat::Range8 => Self::Range8(parse_ranges::<u8>(r, glyph_count)?),
            CharsetFormat::Range16 => Self::Range16(parse_ranges::<u16>(r, glyph_count)?),
        };

        log::debug!("parsed {format:?} charset for {glyph_count} glyphs");
        Ok(charset)
    }

    /// Pick the smallest representation of a sequence of SIDs for the
    /// glyphs 1 onwards.
    pub fn compact(sids: Vec<StringId>) -> Self {
        let ranges = rangify(&sids);

        // Without a single run of two or more SIDs, ranges can't be smaller.
        let format = match ranges.iter().map(|r| r.left).max() {
            None | Some(0) => CharsetFormat::Array,
            Some(1..=255) => CharsetFormat::Range8,
            Some(_) => CharsetFormat::Range16,
        };

        let record_size = match format {
            CharsetFormat::Array => return Self::Array(sids),
            CharsetFormat::Range8 => 3,
            CharsetFormat::Range16 => 4,
        };

        let range_size = record_size * ranges.len();
        let array_size = 2 * sids.len();
        log::debug!(
            "charset with {} SIDs: {range_size} bytes as {format:?}, {array_size} bytes as array",
            sids.len()
        );

        match format {
            _ if array_size <= range_size => Self::Array(sids),
            CharsetFormat::Range16 => Self::Range16(ranges),
            _ => Self::Range8(ranges),
        }
    }

    /// The format of the charset.
    pub fn format(&self) -> CharsetFormat {
        match self {
            Self::Array(_) => CharsetFormat::Array,
            Self::Range8(_) => CharsetFormat::Range8,
            Self::Range16(_) => CharsetFormat::Range16,
        }
    }

    /// The SID of a glyph other than `.notdef`.
    fn sid(&self, glyph_id: u16) -> Option<StringId> {
        let index = glyph_id.checked_sub(1)?;
        let ranges = match self {
            Self::Array(sids) => return sids.get(usize::from(index)).copied(),
            Self::Range8(ranges) | Self::Range16(ranges) => ranges,
        };

        let mut index = u32::from(index);
        for range in ranges {
            if index < range.len() {
                let offset = u16::try_from(index).ok()?;
                return range.first.0.checked_add(offset).map(StringId);
            }

            index -= range.len();
        }

        None
    }

    /// Write the format byte followed by the entries.
    fn write(&self, w: &mut Writer) {
        w.write::<u8>(self.format().tag());

        match self {
            Self::Array(sids) => w.write_vector(sids),
            Self::Range8(ranges) => {
                // `compact` only picks this format when every count fits a byte.
                for range in ranges {
                    w.write(range.first);
                    w.write::<u8>(range.left as u8);
                }
            }
            Self::Range16(ranges) => {
                for range in ranges {
                    w.write(range.first);
                    w.write::<u16>(range.left);
                }
            }
        }
    }
}

/// Read ranges until all glyphs but `.notdef` are covered.
///
/// The number of ranges is not stored in the font.
fn parse_ranges<'a, L>(r: &mut Reader<'a>, glyph_count: u16) -> Result<Vec<CharsetRange>>
where
    L: Readable<'a> + Into<u16>,
{
    let total = u32::from(glyph_count.saturating_sub(1));
    let mut covered = 0;
    let mut ranges = vec![];

    while covered < total {
        let first = r.read::<StringId>()?;
        let left: u16 = r.read::<L>()?.into();
        log::trace!("charset range {first:?} + {left}");

        let range = CharsetRange { first, left };
        covered += range.len();
        ranges.push(range);
    }

    Ok(ranges)
}

/// Split SIDs into maximal runs of consecutive values.
fn rangify(sids: &[StringId]) -> Vec<CharsetRange> {
    let mut ranges: Vec<CharsetRange> = vec![];

    for &sid in sids {
        match ranges.last_mut() {
            Some(range) if u32::from(range.first.0) + range.len() == u32::from(sid.0) => {
                range.left += 1;
            }
            _ => ranges.push(CharsetRange { first: sid, left: 0 }),
        }
    }

    ranges
}

/// The predefined and custom charsets.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CharsetKind {
    /// The ISO-Adobe charset, glyph IDs equal SIDs up to `zcaron`.
    IsoAdobe,
    /// The Expert charset.
    Expert,
    /// The Expert Subset charset.
    ExpertSubset,
    /// A charset stored in the font.
    Custom(CustomCharset),
}

/// Character set for mapping from glyph IDs to string IDs and thus names.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Charset {
    kind: CharsetKind,
    glyph_count: u16,
}

impl Charset {
    /// Create a charset from its parts.
    pub fn new(kind: CharsetKind, glyph_count: u16) -> Self {
        Self { kind, glyph_count }
    }

    /// Parse the charset of a CFF table.
    ///
    /// `offset_or_id` is the charset operand of the Top DICT: either one of
    /// the [`charset_id`]s, or an offset into `cff`, the data of the whole
    /// CFF table. `glyph_count` is the number of glyphs in the CharStrings
    /// INDEX, including `.notdef`.
    pub fn parse(cff: &[u8], offset_or_id: usize, glyph_count: u16) -> Result<Self> {
        let kind = match offset_or_id {
            charset_id::ISO_ADOBE => CharsetKind::IsoAdobe,
            charset_id::EXPERT => CharsetKind::Expert,
            charset_id::EXPERT_SUBSET => CharsetKind::ExpertSubset,
            offset => {
                let data = cff.get(offset..).ok_or(Error::InvalidOffset)?;
                let mut r = Reader::new(data);
                CharsetKind::Custom(CustomCharset::parse(&mut r, glyph_count)?)
            }
        };

        Ok(Self { kind, glyph_count })
    }

    /// The kind of the charset.
    pub fn kind(&self) -> &CharsetKind {
        &self.kind
    }

    /// The number of glyphs, including `.notdef`.
    pub fn glyph_count(&self) -> u16 {
        self.glyph_count
    }

    /// Whether this is one of the predefined charsets, which are not stored
    /// in the font.
    pub fn is_predefined(&self) -> bool {
        !matches!(self.kind, CharsetKind::Custom(_))
    }

    /// The format of a custom charset.
    pub fn format(&self) -> Option<CharsetFormat> {
        match &self.kind {
            CharsetKind::Custom(custom) => Some(custom.format()),
            _ => None,
        }
    }

    /// Returns the string ID of a glyph.
    pub fn sid(&self, glyph_id: u16) -> Option<StringId> {
        if glyph_id == 0 {
            return Some(StringId(0));
        }

        if glyph_id >= self.glyph_count {
            return None;
        }

        match &self.kind {
            CharsetKind::IsoAdobe => {
                (glyph_id <= ISO_ADOBE_LAST_SID).then_some(StringId(glyph_id))
            }
            CharsetKind::Expert => {
                EXPERT_CHARSET.get(usize::from(glyph_id)).map(|&sid| StringId(sid))
            }
            CharsetKind::ExpertSubset => {
                EXPERT_SUBSET_CHARSET.get(usize::from(glyph_id)).map(|&sid| StringId(sid))
            }
            CharsetKind::Custom(custom) => custom.sid(glyph_id),
        }
    }

    /// Returns the glyph ID of a string ID, if a glyph uses it.
    pub fn glyph_id(&self, sid: StringId) -> Option<u16> {
        self.iter().find(|&(_, s)| s == sid).map(|(gid, _)| gid)
    }

    /// Returns the name of a glyph.
    ///
    /// Custom strings are looked up in `strings`, which is usually the
    /// String [`Index`](crate::cff::index::Index) of the font. Predefined
    /// charsets only use standard strings.
    pub fn name<'a, S>(&self, glyph_id: u16, strings: &'a S) -> Option<&'a str>
    where
        S: StringTable + ?Sized,
    {
        if glyph_id == 0 {
            return Some(NOTDEF);
        }

        match predefined_names(&self.kind) {
            Some(names) if glyph_id < self.glyph_count => {
                names.get(usize::from(glyph_id)).copied()
            }
            Some(_) => None,
            None => self.sid(glyph_id)?.resolve(strings),
        }
    }

    /// Iterate over all glyph IDs and their string IDs, starting with
    /// `.notdef`.
    pub fn iter(&self) -> impl Iterator<Item = (u16, StringId)> + '_ {
        (0..self.glyph_count).map_while(|gid| Some((gid, self.sid(gid)?)))
    }

    /// Encode the charset for a font whose glyphs were remapped.
    ///
    /// The new charset names each new glyph like its old glyph. Predefined
    /// charsets are not stored in the font and yield no data.
    pub fn encode(&self, remapper: &GlyphRemapper) -> Result<Vec<u8>> {
        if self.is_predefined() {
            return Ok(vec![]);
        }

        let sids = remapper
            .remapped_gids()
            .skip(1)
            .map(|old_gid| self.sid(old_gid).ok_or(Error::InvalidData))
            .collect::<Result<Vec<_>>>()?;

        let custom = CustomCharset::compact(sids);
        log::debug!("encoding charset as {:?}", custom.format());

        let mut w = Writer::with_capacity(1 + 2 * remapper.num_gids());
        custom.write(&mut w);
        Ok(w.finish())
    }
}

/// The glyph names of a predefined charset, indexed by glyph ID.
///
/// Each list is built once and then shared.
fn predefined_names(kind: &CharsetKind) -> Option<&'static [&'static str]> {
    static ISO_ADOBE: OnceLock<Vec<&'static str>> = OnceLock::new();
    static EXPERT: OnceLock<Vec<&'static str>> = OnceLock::new();
    static EXPERT_SUBSET: OnceLock<Vec<&'static str>> = OnceLock::new();

    let from_sids = |sids: &[u16]| -> Vec<&'static str> {
        sids.iter().map(|&sid| STANDARD_STRINGS[usize::from(sid)]).collect()
    };

    let names = match kind {
        CharsetKind::IsoAdobe => ISO_ADOBE.get_or_init(|| {
            STANDARD_STRINGS[..=usize::from(ISO_ADOBE_LAST_SID)].to_vec()
        }),
        CharsetKind::Expert => EXPERT.get_or_init(|| from_sids(&EXPERT_CHARSET)),
        CharsetKind::ExpertSubset => {
            EXPERT_SUBSET.get_or_init(|| from_sids(&EXPERT_SUBSET_CHARSET))
        }
        CharsetKind::Custom(_) => return None,
    };

    Some(names.as_slice())
}
