use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;

use crate::cmap::{self, ByteEncoding};
use crate::remapper::GlyphRemapper;
use crate::{Error, Result};

/// A requested character identity: a code point, optionally followed by a
/// Unicode variation selector.
///
/// Clusters compare by their full sequence, so `U+0041` and
/// `U+0041 U+FE00` are different clusters.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Cluster {
    base: u32,
    selector: Option<u32>,
}

impl Cluster {
    /// The space cluster, which always occupies code `0x20`.
    pub const SPACE: Self = Self::new(0x20);

    /// A cluster consisting of a single code point.
    pub const fn new(base: u32) -> Self {
        Self { base, selector: None }
    }

    /// A cluster of a code point followed by a variation selector.
    pub const fn with_selector(base: u32, selector: u32) -> Self {
        Self { base, selector: Some(selector) }
    }

    /// Create a cluster from a sequence of one or two code points.
    pub fn from_slice(code_points: &[u32]) -> Option<Self> {
        match *code_points {
            [base] => Some(Self::new(base)),
            [base, selector] => Some(Self::with_selector(base, selector)),
            _ => None,
        }
    }

    /// The base code point.
    pub fn base(&self) -> u32 {
        self.base
    }

    /// The variation selector, if any.
    pub fn selector(&self) -> Option<u32> {
        self.selector
    }
}

impl From<char> for Cluster {
    fn from(c: char) -> Self {
        Self::new(u32::from(c))
    }
}

/// The code reserved for [`Cluster::SPACE`].
const SPACE_CODE: u8 = 0x20;

/// Assigns single-byte codes to clusters, in first-use order.
///
/// Code `0x20` always belongs to the space cluster, all other clusters get
/// the codes `0x21..=0xFF`. This leaves room for 223 clusters besides space.
/// Control codes below `0x20` are never handed out since PDF consumers tend
/// to treat them specially.
#[derive(Debug, Clone)]
pub struct ClusterAllocator {
    /// The next code to be assigned. Reaches `0x100` once the space is full.
    next: u16,
    /// A map from clusters to their code.
    codes: FxHashMap<Cluster, u8>,
    /// The clusters in code order, starting at [`SPACE_CODE`].
    clusters: Vec<Cluster>,
}

impl ClusterAllocator {
    /// Create a new allocator that only contains the space cluster.
    pub fn new() -> Self {
        let mut codes = FxHashMap::default();
        codes.insert(Cluster::SPACE, SPACE_CODE);

        Self {
            next: u16::from(SPACE_CODE) + 1,
            codes,
            clusters: vec![Cluster::SPACE],
        }
    }

    /// Assign a code to a cluster, or return the one it already has.
    ///
    /// Fails with [`Error::CodeSpaceExhausted`] if the cluster is new and all
    /// codes are taken. Use [`covers`](Self::covers) to test beforehand.
    pub fn assign(&mut self, cluster: Cluster) -> Result<u8> {
        if let Some(&code) = self.codes.get(&cluster) {
            return Ok(code);
        }

        let code = u8::try_from(self.next).map_err(|_| Error::CodeSpaceExhausted)?;
        log::trace!("assigning code {code:#04x} to {cluster:?}");

        self.codes.insert(cluster, code);
        self.clusters.push(cluster);
        self.next += 1;

        Ok(code)
    }

    /// Whether the cluster already has a code or could still get one.
    ///
    /// This does not reserve anything.
    pub fn covers(&self, cluster: &Cluster) -> bool {
        self.includes(cluster) || self.next <= u16::from(u8::MAX)
    }

    /// Whether the cluster already has a code.
    pub fn includes(&self, cluster: &Cluster) -> bool {
        self.codes.contains_key(cluster)
    }

    /// The cluster that was assigned a code.
    pub fn from_code(&self, code: u8) -> Option<&Cluster> {
        let index = code.checked_sub(SPACE_CODE)?;
        self.clusters.get(usize::from(index))
    }

    /// The code of a cluster, if it has one.
    pub fn to_code(&self, cluster: &Cluster) -> Option<u8> {
        self.codes.get(cluster).copied()
    }

    /// The number of assigned clusters, including space.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Whether nothing besides the space cluster was assigned.
    pub fn is_empty(&self) -> bool {
        self.clusters.len() == 1
    }

    /// The number of codes that can still be assigned.
    pub fn remaining(&self) -> usize {
        usize::from((u16::from(u8::MAX) + 1).saturating_sub(self.next))
    }

    /// Iterate over all assigned codes and their clusters, in code order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &Cluster)> + '_ {
        (SPACE_CODE..=u8::MAX).zip(&self.clusters)
    }

    /// A copy of the mapping from codes back to Unicode, as needed for
    /// a `ToUnicode` map.
    pub fn to_unicode_table(&self) -> BTreeMap<u8, Cluster> {
        self.iter().map(|(code, cluster)| (code, *cluster)).collect()
    }

    /// The glyphs of the original font that are needed for the assigned
    /// clusters, sorted and without duplicates.
    ///
    /// `resolve` maps a cluster to its glyph. Clusters without a glyph map to
    /// `.notdef`, which is always part of the result.
    pub fn retained_glyph_ids(
        &self,
        mut resolve: impl FnMut(&Cluster) -> Option<u16>,
    ) -> Vec<u16> {
        let mut glyphs = BTreeSet::from([0]);
        glyphs.extend(self.clusters.iter().map(|c| resolve(c).unwrap_or(0)));
        glyphs.into_iter().collect()
    }

    /// Build a `cmap` table for the assigned codes, along with the glyph
    /// order of the subset font.
    ///
    /// `resolve` maps a cluster to its glyph in the original font. The glyphs
    /// are renumbered densely in code order, starting with `.notdef` at 0, and
    /// the table maps each code to its new glyph. The returned remapper holds
    /// the old glyph of every new one, e.g. for [`Charset::encode`].
    ///
    /// The codes have nothing to do with the characters of `encoding`, any
    /// single-byte encoding can hold them. Readers of the table have to use
    /// the same encoding, see [`cmap::decode_single_byte`].
    ///
    /// [`Charset::encode`]: crate::Charset::encode
    pub fn build_output_charmap(
        &self,
        mut resolve: impl FnMut(&Cluster) -> Option<u16>,
        encoding: ByteEncoding,
    ) -> Result<(Vec<u8>, GlyphRemapper)> {
        let mut remapper = GlyphRemapper::new();
        let mapping = self
            .iter()
            .map(|(code, cluster)| (code, remapper.remap(resolve(cluster).unwrap_or(0))))
            .collect::<BTreeMap<_, _>>();

        log::debug!(
            "output cmap maps {} codes to {} glyphs",
            mapping.len(),
            remapper.num_gids()
        );

        let table = cmap::encode_single_byte(&mapping, encoding)?;
        Ok((table, remapper))
    }
}

impl Default for ClusterAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(allocator: &mut ClusterAllocator, count: u32) {
        for c in 0..count {
            allocator.assign(Cluster::new(0x1000 + c)).unwrap();
        }
    }

    #[test]
    fn space_is_reserved() {
        let mut allocator = ClusterAllocator::new();
        assert_eq!(allocator.to_code(&Cluster::SPACE), Some(0x20));
        assert_eq!(allocator.assign(Cluster::new(0x20)), Ok(0x20));
        assert_eq!(allocator.assign(Cluster::new(0x41)), Ok(0x21));
        assert_eq!(allocator.from_code(0x20), Some(&Cluster::SPACE));
        assert_eq!(allocator.from_code(0x1F), None);
        assert!(!allocator.is_empty());
    }

    #[test]
    fn assign_is_idempotent() {
        let mut allocator = ClusterAllocator::new();
        let a = Cluster::new(0x41);
        let b = Cluster::with_selector(0x41, 0xFE00);

        assert_eq!(allocator.assign(a), Ok(0x21));
        assert_eq!(allocator.assign(b), Ok(0x22));
        assert_eq!(allocator.assign(a), Ok(0x21));
        assert_eq!(allocator.remaining(), 0x100 - 0x23);
        assert_eq!(allocator.assign(Cluster::new(0x42)), Ok(0x23));
        assert_eq!(allocator.len(), 4);
    }

    #[test]
    fn distinct_clusters_get_distinct_codes() {
        let mut allocator = ClusterAllocator::new();
        fill(&mut allocator, 223);

        let codes = allocator.to_unicode_table();
        assert_eq!(codes.len(), 224);
        for (code, cluster) in &codes {
            assert_eq!(allocator.to_code(cluster), Some(*code));
            if *cluster != Cluster::SPACE {
                assert!(*code >= 0x21);
            }
        }
    }

    #[test]
    fn capacity() {
        let mut allocator = ClusterAllocator::new();
        fill(&mut allocator, 222);

        let last = Cluster::new(0x41);
        assert!(allocator.covers(&last));
        assert!(!allocator.includes(&last));
        assert_eq!(allocator.assign(last), Ok(0xFF));
        assert_eq!(allocator.remaining(), 0);

        let extra = Cluster::new(0x42);
        assert!(!allocator.covers(&extra));
        assert_eq!(allocator.assign(extra), Err(Error::CodeSpaceExhausted));
        assert!(allocator.covers(&last));
        assert_eq!(allocator.assign(last), Ok(0xFF));
        assert_eq!(allocator.to_code(&extra), None);
    }

    #[test]
    fn retained_glyphs() {
        let mut allocator = ClusterAllocator::new();
        allocator.assign(Cluster::new(0x42)).unwrap();
        allocator.assign(Cluster::new(0x41)).unwrap();
        allocator.assign(Cluster::with_selector(0x41, 0xFE00)).unwrap();
        allocator.assign(Cluster::new(0x263A)).unwrap();

        let resolve = |c: &Cluster| match (c.base(), c.selector()) {
            (0x20, None) => Some(3),
            (0x41, None) => Some(36),
            (0x41, Some(_)) => Some(90),
            (0x42, None) => Some(36),
            _ => None,
        };

        assert_eq!(allocator.retained_glyph_ids(resolve), vec![0, 3, 36, 90]);
    }

    #[test]
    fn output_glyphs_are_renumbered() {
        let font = BTreeMap::from([(0x20, 3), (0x4E00, 1234), (0x4E01, 700)]);
        let resolve = |c: &Cluster| font.get(&c.base()).copied();

        let mut allocator = ClusterAllocator::new();
        allocator.assign(Cluster::new(0x4E00)).unwrap();
        allocator.assign(Cluster::new(0x41)).unwrap();
        allocator.assign(Cluster::new(0x4E01)).unwrap();
        assert_eq!(allocator.retained_glyph_ids(resolve), vec![0, 3, 700, 1234]);

        for encoding in [ByteEncoding::MacRoman, ByteEncoding::Symbol] {
            let (table, remapper) = allocator.build_output_charmap(resolve, encoding).unwrap();
            assert_eq!(remapper.remapped_gids().collect::<Vec<_>>(), vec![0, 3, 1234, 700]);

            let decoded = cmap::decode_single_byte(&table).unwrap();
            assert_eq!(decoded, BTreeMap::from([(0x20, 1), (0x21, 2), (0x23, 3)]));
            for (code, new) in decoded {
                let cluster = allocator.from_code(code).unwrap();
                assert_eq!(remapper.get_reverse(new), resolve(cluster));
            }
        }
    }

    #[test]
    fn cluster_from_slice() {
        assert_eq!(Cluster::from_slice(&[0x41]), Some(Cluster::new(0x41)));
        assert_eq!(
            Cluster::from_slice(&[0x41, 0xFE0F]),
            Some(Cluster::with_selector(0x41, 0xFE0F))
        );
        assert_eq!(Cluster::from_slice(&[]), None);
        assert_eq!(Cluster::from_slice(&[1, 2, 3]), None);
        assert_ne!(Cluster::new(0x41), Cluster::with_selector(0x41, 0xFE00));
    }
}
