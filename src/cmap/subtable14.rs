//! The Unicode Variation Sequences subtable (`cmap` format 14).
//!
//! A variation sequence is a base code point followed by a variation
//! selector. The subtable lists, per selector, the sequences that use the
//! glyph of the base character (the default UVS table) and the sequences that
//! map to a glyph of their own (the non-default UVS table).

use rustc_hash::FxHashMap;

use super::CharacterMap;
use crate::cluster::Cluster;
use crate::stream::{Readable, Reader, U24};
use crate::{Error, Result};

/// A variation selector record of the subtable header.
#[derive(Debug, Clone, Copy)]
struct VariationSelectorRecord {
    selector: u32,
    default_uvs_offset: u32,
    non_default_uvs_offset: u32,
}

impl Readable<'_> for VariationSelectorRecord {
    const SIZE: usize = 3 + 4 + 4;

    fn read(r: &mut Reader<'_>) -> Result<Self> {
        let selector = r.read::<U24>()?.0;
        let default_uvs_offset = r.read::<u32>()?;
        let non_default_uvs_offset = r.read::<u32>()?;
        Ok(Self { selector, default_uvs_offset, non_default_uvs_offset })
    }
}

/// A range of code points in a default UVS table.
#[derive(Debug, Clone, Copy)]
struct UnicodeRange {
    start: u32,
    additional_count: u8,
}

impl Readable<'_> for UnicodeRange {
    const SIZE: usize = 3 + 1;

    fn read(r: &mut Reader<'_>) -> Result<Self> {
        let start = r.read::<U24>()?.0;
        let additional_count = r.read::<u8>()?;
        Ok(Self { start, additional_count })
    }
}

/// A mapping of a non-default UVS table.
#[derive(Debug, Clone, Copy)]
struct UvsMapping {
    code_point: u32,
    glyph_id: u16,
}

impl Readable<'_> for UvsMapping {
    const SIZE: usize = 3 + 2;

    fn read(r: &mut Reader<'_>) -> Result<Self> {
        let code_point = r.read::<U24>()?.0;
        let glyph_id = r.read::<u16>()?;
        Ok(Self { code_point, glyph_id })
    }
}

/// Resolves clusters to glyphs through a base character map and a variation
/// sequences subtable.
///
/// The lookup table is keyed by `(code point, selector)`, where selector 0
/// stands for a code point without a variation selector.
#[derive(Debug, Clone, Default)]
pub struct VariationSequences {
    map: FxHashMap<(u32, u32), u16>,
    selectors: Vec<u32>,
}

impl VariationSequences {
    /// Parse a format 14 subtable and merge it onto the base mapping.
    ///
    /// `data` has to start at the subtable. Sequences of the default UVS
    /// table map to the glyph that `base` has for the first code point of
    /// their range. Sequences of the non-default UVS table override them.
    pub fn parse(data: &[u8], base: &impl CharacterMap) -> Result<Self> {
        let mut r = Reader::new(data);
        if r.read::<u16>()? != 14 {
            return Err(Error::InvalidData);
        }

        r.read::<u32>()?; // length
        let count = r.read::<u32>()?;
        let records = r.read_vector::<VariationSelectorRecord>(count as usize)?;
        log::debug!("parsing {} variation selector records", records.len());

        let mut map = FxHashMap::default();
        base.mappings(|c, g| {
            map.insert((c, 0), g);
        });

        for record in &records {
            let selector = record.selector;

            if record.default_uvs_offset != 0 {
                let mut r = reader_at(data, record.default_uvs_offset)?;
                let count = r.read::<u32>()?;
                for range in r.read_vector::<UnicodeRange>(count as usize)? {
                    let Some(glyph) = base.glyph_index(range.start) else {
                        log::trace!(
                            "default sequence range at {:#x} has no base glyph",
                            range.start
                        );
                        continue;
                    };

                    let end = range.start + u32::from(range.additional_count);
                    for c in range.start..=end {
                        map.insert((c, selector), glyph);
                    }
                }
            }

            if record.non_default_uvs_offset != 0 {
                let mut r = reader_at(data, record.non_default_uvs_offset)?;
                let count = r.read::<u32>()?;
                for mapping in r.read_vector::<UvsMapping>(count as usize)? {
                    map.insert((mapping.code_point, selector), mapping.glyph_id);
                }
            }
        }

        let selectors = records.iter().map(|r| r.selector).collect();
        Ok(Self { map, selectors })
    }

    /// The glyph of a cluster, or `.notdef` if there is none.
    pub fn resolve(&self, cluster: &Cluster) -> u16 {
        self.glyph_index(cluster.base(), cluster.selector().unwrap_or(0))
            .unwrap_or(0)
    }

    /// The glyph of a code point followed by a selector. A selector of 0
    /// looks up the code point on its own.
    pub fn glyph_index(&self, code_point: u32, selector: u32) -> Option<u16> {
        self.map.get(&(code_point, selector)).copied()
    }

    /// Whether the subtable is usable. Parsing either fails or produces a
    /// usable subtable, so this is always true.
    pub fn supported(&self) -> bool {
        true
    }

    /// The variation selectors of the subtable, in record order.
    pub fn selectors(&self) -> &[u32] {
        &self.selectors
    }

    /// The number of entries in the lookup table, including those of the
    /// base mapping.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the lookup table is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn reader_at(data: &[u8], offset: u32) -> Result<Reader<'_>> {
    let offset = offset as usize;
    if offset >= data.len() {
        return Err(Error::InvalidOffset);
    }
    Ok(Reader::new_at(data, offset))
}
