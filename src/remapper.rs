use std::collections::{BTreeMap, BTreeSet};

/// Assigns a new, contiguous ordering to a subset of glyphs.
///
/// For example, if a subset only needs the glyphs 4, 9 and 16, the remapper
/// yields:
/// 0 -> 0 (The .notdef glyph will always be included)
/// 4 -> 1
/// 9 -> 2
/// 16 -> 3
///
/// A font needs glyph IDs that start at 0 without gaps, so the old IDs cannot
/// be reused. The reverse direction, from a new glyph ID to the old one, is
/// what tables like the CFF charset need when they are re-encoded.
#[derive(Debug, Clone)]
pub struct GlyphRemapper {
    /// A map from old glyph IDs to new ones.
    forward: BTreeMap<u16, u16>,
    /// The old glyph IDs, indexed by their new glyph ID.
    backward: Vec<u16>,
}

impl GlyphRemapper {
    /// Create a new remapper that only contains `.notdef`.
    pub fn new() -> Self {
        let mut remapper = Self { forward: BTreeMap::new(), backward: Vec::new() };
        remapper.remap(0);
        remapper
    }

    /// Create a remapper from an existing set of glyphs. The mapping will be
    /// monotonically increasing.
    pub fn new_from_glyphs(glyphs: &[u16]) -> Self {
        let mut remapper = Self::new();
        for glyph in BTreeSet::from_iter(glyphs) {
            remapper.remap(*glyph);
        }

        remapper
    }

    /// Remap a glyph ID, or return the existing mapping if the glyph ID has
    /// been remapped before.
    ///
    /// # Panics
    /// Panics if more than 65536 glyphs are remapped, which cannot happen
    /// with 16-bit glyph IDs.
    pub fn remap(&mut self, old: u16) -> u16 {
        *self.forward.entry(old).or_insert_with(|| {
            let new = u16::try_from(self.backward.len()).expect("remapper was overflowed");
            self.backward.push(old);
            new
        })
    }

    /// Get the new glyph ID of an old one, if it has been remapped before.
    pub fn get(&self, old: u16) -> Option<u16> {
        self.forward.get(&old).copied()
    }

    /// Get the old glyph ID that was assigned the new glyph ID.
    pub fn get_reverse(&self, new: u16) -> Option<u16> {
        self.backward.get(usize::from(new)).copied()
    }

    /// The number of glyphs in the new ordering, including `.notdef`.
    pub fn num_gids(&self) -> usize {
        self.backward.len()
    }

    /// Return an iterator that yields the old glyphs in the order of their new
    /// glyph IDs. For example, after remapping 3, 39, 8, 3, 10, 2 the iterator
    /// yields 0, 3, 39, 8, 10, 2.
    pub fn remapped_gids(&self) -> impl Iterator<Item = u16> + '_ {
        self.backward.iter().copied()
    }
}

impl Default for GlyphRemapper {
    fn default() -> Self {
        Self::new()
    }
}
