use std::cmp::Ordering;

use super::CharacterMap;
use crate::stream::{Readable, Reader, Writeable, Writer};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SequentialMapGroupRecord {
    start_char_code: u32,
    end_char_code: u32,
    start_glyph_id: u32,
}

impl Readable<'_> for SequentialMapGroupRecord {
    const SIZE: usize = 3 * 4;

    fn read(r: &mut Reader<'_>) -> Result<Self> {
        let start_char_code = r.read::<u32>()?;
        let end_char_code = r.read::<u32>()?;
        let start_glyph_id = r.read::<u32>()?;

        Ok(Self { start_char_code, end_char_code, start_glyph_id })
    }
}

impl Writeable for SequentialMapGroupRecord {
    fn write(&self, w: &mut Writer) {
        w.write::<u32>(self.start_char_code);
        w.write::<u32>(self.end_char_code);
        w.write::<u32>(self.start_glyph_id);
    }
}

/// A format 12 subtable: segmented coverage of all Unicode planes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtable12 {
    language: u32,
    groups: Vec<SequentialMapGroupRecord>,
}

impl Subtable12 {
    const MAX_CODE_POINT: u32 = 0x10_FFFF;

    /// Build a subtable from `(code point, glyph)` pairs.
    ///
    /// Consecutive code points that map to consecutive glyphs share a group.
    pub fn from_mappings(pairs: impl IntoIterator<Item = (u32, u16)>) -> Self {
        let mut pairs: Vec<_> = pairs.into_iter().collect();
        pairs.sort();
        pairs.dedup_by_key(|&mut (c, _)| c);

        let mut groups = vec![];
        let mut map_iter = pairs.into_iter();

        if let Some(first) = map_iter.next() {
            let mut cur_start = first.0;
            let mut cur_gid = first.1;
            let mut cur_range = 0;

            for next in map_iter {
                if next.0 == cur_start + cur_range + 1
                    && u32::from(next.1) == u32::from(cur_gid) + cur_range + 1
                {
                    cur_range += 1;
                    continue;
                }

                groups.push(SequentialMapGroupRecord {
                    start_char_code: cur_start,
                    end_char_code: cur_start + cur_range,
                    start_glyph_id: u32::from(cur_gid),
                });

                cur_start = next.0;
                cur_gid = next.1;
                cur_range = 0;
            }

            groups.push(SequentialMapGroupRecord {
                start_char_code: cur_start,
                end_char_code: cur_start + cur_range,
                start_glyph_id: u32::from(cur_gid),
            });
        }

        Self { language: 0, groups }
    }

    /// Returns a glyph index for a code point.
    pub fn glyph_index(&self, code_point: u32) -> Option<u16> {
        let index = self
            .groups
            .binary_search_by(|range| {
                if range.start_char_code > code_point {
                    Ordering::Greater
                } else if range.end_char_code < code_point {
                    Ordering::Less
                } else {
                    Ordering::Equal
                }
            })
            .ok()?;

        let group = &self.groups[index];

        let id = group
            .start_glyph_id
            .checked_add(code_point)?
            .checked_sub(group.start_char_code)?;
        u16::try_from(id).ok()
    }

    /// Calls `f` for each code point defined in this table.
    pub fn codepoints(&self, mut f: impl FnMut(u32)) {
        for group in &self.groups {
            for code_point in group.start_char_code..=group.end_char_code {
                f(code_point);
            }
        }
    }
}

impl CharacterMap for Subtable12 {
    fn glyph_index(&self, code_point: u32) -> Option<u16> {
        Subtable12::glyph_index(self, code_point)
    }

    fn mappings(&self, mut f: impl FnMut(u32, u16)) {
        self.codepoints(|c| {
            if let Some(g) = self.glyph_index(c) {
                f(c, g);
            }
        });
    }
}

impl Readable<'_> for Subtable12 {
    const SIZE: usize = 2 + 2 + 4 + 4 + 4;

    fn read(r: &mut Reader<'_>) -> Result<Self> {
        if r.read::<u16>()? != 12 {
            return Err(Error::InvalidData);
        }
        r.read::<u16>()?; // reserved
        r.read::<u32>()?; // length
        let language = r.read::<u32>()?;
        let num_groups = r.read::<u32>()?;

        let groups = r.read_vector::<SequentialMapGroupRecord>(num_groups as usize)?;

        // Groups outside of Unicode would make iterating the code points
        // take forever.
        if groups.iter().any(|g| {
            g.start_char_code > g.end_char_code || g.end_char_code > Self::MAX_CODE_POINT
        }) {
            return Err(Error::InvalidData);
        }

        log::trace!("read {} groups of a format 12 cmap", groups.len());
        Ok(Self { language, groups })
    }
}

impl Writeable for Subtable12 {
    fn write(&self, w: &mut Writer) {
        // format + reserved + length + language + num_groups + num_groups * (start_char,
        // end_char, start_glyph_id)
        let length = Self::SIZE + SequentialMapGroupRecord::SIZE * self.groups.len();

        w.write::<u16>(12);
        w.write::<u16>(0);
        w.write::<u32>(length as u32);
        w.write::<u32>(self.language);
        w.write::<u32>(self.groups.len() as u32);
        w.write_vector(&self.groups);
    }
}
