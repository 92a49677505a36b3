use std::borrow::Cow;

use super::CharacterMap;
use crate::stream::{Readable, Reader, Writeable, Writer};
use crate::{Error, Result};

/// A format 4 subtable: segment mapping to delta values, limited to the
/// Basic Multilingual Plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtable4<'a> {
    language: u16,
    seg_count: u16,
    end_codes: Vec<u16>,
    start_codes: Vec<u16>,
    id_deltas: Vec<i16>,
    id_range_offsets: Vec<u16>,
    /// The glyph ID array that follows the range offsets.
    glyph_id_array: Cow<'a, [u8]>,
}

impl Subtable4<'_> {
    /// Build a subtable from `(code point, glyph)` pairs.
    ///
    /// Runs of code points with the same delta to their glyph share a
    /// segment. The code point `0xFFFF` is reserved for the final segment and
    /// is skipped.
    pub fn from_mappings(pairs: impl IntoIterator<Item = (u16, u16)>) -> Self {
        let mut pairs: Vec<_> = pairs.into_iter().filter(|&(c, _)| c != 0xFFFF).collect();
        pairs.sort();
        pairs.dedup_by_key(|&mut (c, _)| c);

        let delta = |(c, g): (u16, u16)| g.wrapping_sub(c) as i16;

        let mut segments = vec![];
        let mut map_iter = pairs.into_iter();

        if let Some(first) = map_iter.next() {
            let mut cur_start = first.0;
            let mut cur_delta = delta(first);
            let mut cur_range = 0;

            for next in map_iter {
                if u32::from(next.0) == u32::from(cur_start) + cur_range + 1
                    && delta(next) == cur_delta
                {
                    cur_range += 1;
                    continue;
                }

                segments.push((cur_start, cur_start + cur_range as u16, cur_delta));
                cur_start = next.0;
                cur_delta = delta(next);
                cur_range = 0;
            }

            segments.push((cur_start, cur_start + cur_range as u16, cur_delta));
        }

        // The final start and end code must be 0xFFFF. It maps to `.notdef`.
        segments.push((0xFFFF, 0xFFFF, 1));

        Self {
            language: 0,
            seg_count: segments.len() as u16,
            end_codes: segments.iter().map(|s| s.1).collect(),
            start_codes: segments.iter().map(|s| s.0).collect(),
            id_deltas: segments.iter().map(|s| s.2).collect(),
            id_range_offsets: vec![0; segments.len()],
            glyph_id_array: Cow::Owned(vec![]),
        }
    }

    /// Returns a glyph index for a code point.
    pub fn glyph_index(&self, code_point: u32) -> Option<u16> {
        let code_point = u16::try_from(code_point).ok()?;

        // A custom binary search.
        let mut start = 0;
        let mut end = self.start_codes.len();
        while end > start {
            let index = (start + end) / 2;
            let end_value = *self.end_codes.get(index)?;
            if end_value >= code_point {
                let start_value = *self.start_codes.get(index)?;
                if start_value > code_point {
                    end = index;
                } else {
                    let id_range_offset = *self.id_range_offsets.get(index)?;
                    let id_delta = *self.id_deltas.get(index)?;
                    if id_range_offset == 0 {
                        return Some(code_point.wrapping_add(id_delta as u16));
                    } else if id_range_offset == 0xFFFF {
                        // Some malformed fonts have 0xFFFF as the last offset.
                        return None;
                    }

                    // The range offset is relative to its own position in the
                    // range offset array.
                    let delta = (u32::from(code_point) - u32::from(start_value)) * 2;
                    let pos = (index as u32 * 2 + delta + u32::from(id_range_offset))
                        .checked_sub(u32::from(self.seg_count) * 2)?;

                    let glyph_array_value =
                        u16::read_at(&self.glyph_id_array, pos as usize).ok()?;

                    // 0 indicates missing glyph.
                    if glyph_array_value == 0 {
                        return None;
                    }

                    return Some(glyph_array_value.wrapping_add(id_delta as u16));
                }
            } else {
                start = index + 1;
            }
        }

        None
    }

    /// Calls `f` for each code point defined in this table.
    pub fn codepoints(&self, mut f: impl FnMut(u32)) {
        for (start, end) in self.start_codes.iter().zip(&self.end_codes) {
            // 0xFFFF indicates the end of the codes.
            if *start == *end && *start == 0xFFFF {
                break;
            }

            for code_point in *start..=*end {
                f(u32::from(code_point));
            }
        }
    }
}

impl CharacterMap for Subtable4<'_> {
    fn glyph_index(&self, code_point: u32) -> Option<u16> {
        Subtable4::glyph_index(self, code_point)
    }

    fn mappings(&self, mut f: impl FnMut(u32, u16)) {
        self.codepoints(|c| {
            if let Some(g) = self.glyph_index(c) {
                f(c, g);
            }
        });
    }
}

impl<'a> Readable<'a> for Subtable4<'a> {
    const SIZE: usize = 2 * 8;

    fn read(r: &mut Reader<'a>) -> Result<Self> {
        let start = r.offset();
        if r.read::<u16>()? != 4 {
            return Err(Error::InvalidData);
        }

        let length = r.read::<u16>()?;
        let language = r.read::<u16>()?;
        let seg_count_x2 = r.read::<u16>()?;

        if seg_count_x2 < 2 {
            return Err(Error::InvalidData);
        }

        let seg_count = seg_count_x2 / 2;
        r.skip(6)?; // search range + entry selector + range shift
        let end_codes = r.read_vector::<u16>(usize::from(seg_count))?;
        r.skip(2)?; // reserved pad
        let start_codes = r.read_vector::<u16>(usize::from(seg_count))?;
        let id_deltas = r.read_vector::<i16>(usize::from(seg_count))?;
        let id_range_offsets = r.read_vector::<u16>(usize::from(seg_count))?;

        // Some fonts have a wrong length, so a short glyph array is accepted.
        let array_len = (start + usize::from(length)).saturating_sub(r.offset());
        let tail = r.tail();
        let glyph_id_array = Cow::Borrowed(tail.get(..array_len).unwrap_or(tail));

        Ok(Subtable4 {
            language,
            seg_count,
            end_codes,
            start_codes,
            id_deltas,
            id_range_offsets,
            glyph_id_array,
        })
    }
}

impl Writeable for Subtable4<'_> {
    fn write(&self, w: &mut Writer) {
        w.write::<u16>(4); // format

        // (format + length + language + seg_count_x2 + search_range +
        // entry_selector + range_shift + reserved_pad) + seg_count *
        // (end_code + start_code + id_delta + id_range_offsets) + glyph_id_array
        let length = 2 * 8 + 2 * self.seg_count * 4 + self.glyph_id_array.len() as u16;
        w.write::<u16>(length);
        w.write::<u16>(self.language);

        let seg_count_x2 = 2 * self.seg_count;
        let floor_log_2 = (u16::BITS - self.seg_count.leading_zeros()) - 1;
        let search_range = 2 * 2u16.pow(floor_log_2);
        let entry_selector = floor_log_2 as u16;
        let range_shift = seg_count_x2 - search_range;

        w.write::<u16>(seg_count_x2);
        w.write::<u16>(search_range);
        w.write::<u16>(entry_selector);
        w.write::<u16>(range_shift);

        w.write_vector(&self.end_codes);
        w.write::<u16>(0); // reserved pad
        w.write_vector(&self.start_codes);
        w.write_vector(&self.id_deltas);
        w.write_vector(&self.id_range_offsets);
        w.extend(&self.glyph_id_array);
    }
}
