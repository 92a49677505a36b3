use std::collections::BTreeMap;

use charspace::cff::charset::CustomCharset;
use charspace::cmap::{self, Subtable12};
use charspace::stream::{Writer, U24};
use charspace::{
    ByteEncoding, CharacterMap, Charset, CharsetKind, Cluster, ClusterAllocator,
    GlyphRemapper, StringId, VariationSequences,
};
use ttf_parser::cmap::GlyphVariationResult;
use ttf_parser::{GlyphId, PlatformId};

const VS1: u32 = 0xFE00;
const VS17: u32 = 0xE0100;

fn base_mapping() -> BTreeMap<u32, u16> {
    BTreeMap::from([
        (0x20, 1),
        (0x41, 2),
        (0x42, 3),
        (0x43, 4),
        (0x2764, 7),
        (0x4E00, 1234),
        (0x845B, 8),
        (0x1F600, 9),
    ])
}

/// A format 14 subtable with one default and one non-default sequence per
/// selector.
fn variation_subtable() -> Vec<u8> {
    let mut w = Writer::new();
    w.write::<u16>(14);
    w.write::<u32>(10 + 2 * 11 + 2 * (8 + 9));
    w.write::<u32>(2);

    w.write(U24(VS1));
    w.write::<u32>(32);
    w.write::<u32>(40);
    w.write(U24(VS17));
    w.write::<u32>(49);
    w.write::<u32>(57);

    for (default, non_default) in [((0x2764, 0), (0x41, 10)), ((0x42, 0), (0x845B, 11))] {
        w.write::<u32>(1);
        w.write(U24(default.0));
        w.write::<u8>(default.1);
        w.write::<u32>(1);
        w.write(U24(non_default.0));
        w.write::<u16>(non_default.1);
    }

    w.finish()
}

/// A `cmap` table with a format 12 and a format 14 subtable.
fn font_cmap() -> Vec<u8> {
    let mut format12 = Writer::new();
    format12.write(Subtable12::from_mappings(base_mapping()));
    let format12 = format12.finish();
    let format14 = variation_subtable();

    let mut w = Writer::new();
    w.write::<u16>(0);
    w.write::<u16>(2);
    w.write::<u16>(0);
    w.write::<u16>(5);
    w.write::<u32>(20);
    w.write::<u16>(3);
    w.write::<u16>(10);
    w.write::<u32>(20 + format14.len() as u32);
    w.extend(&format14);
    w.extend(&format12);
    w.finish()
}

#[test]
fn base_map_agrees_with_ttf_parser() {
    let data = font_cmap();
    let table = cmap::Table::parse(&data).unwrap();
    let ours = table.unicode_map().unwrap().unwrap();
    let theirs = ttf_parser::cmap::Table::parse(&data).unwrap();
    let subtable = theirs
        .subtables
        .into_iter()
        .find(|s| s.platform_id == PlatformId::Windows && s.encoding_id == 10)
        .unwrap();

    for c in [0x20, 0x41, 0x42, 0x43, 0x44, 0x2764, 0x4E00, 0x845B, 0x1F600, 0x1F601] {
        assert_eq!(ours.glyph_index(c), subtable.glyph_index(c).map(|g| g.0));
    }
}

#[test]
fn variation_sequences_agree_with_ttf_parser() {
    let data = font_cmap();
    let table = cmap::Table::parse(&data).unwrap();
    let base = table.unicode_map().unwrap().unwrap();
    let sequences = table.variation_sequences(&base).unwrap().unwrap();
    assert_eq!(sequences.selectors(), &[VS1, VS17]);

    let theirs = ttf_parser::cmap::Table::parse(&data).unwrap();
    let subtable = theirs
        .subtables
        .into_iter()
        .find(|s| s.platform_id == PlatformId::Unicode && s.encoding_id == 5)
        .unwrap();

    for c in [0x41, 0x42, 0x2764, 0x845B, 0x1F600] {
        for selector in [VS1, VS17] {
            let expected = match subtable.glyph_variation_index(c, selector) {
                Some(GlyphVariationResult::Found(GlyphId(g))) => g,
                Some(GlyphVariationResult::UseDefault) => base.glyph_index(c).unwrap_or(0),
                None => 0,
            };

            let cluster = Cluster::with_selector(c, selector);
            assert_eq!(sequences.resolve(&cluster), expected, "{c:#x} {selector:#x}");
        }

        let plain = Cluster::new(c);
        assert_eq!(sequences.resolve(&plain), base.glyph_index(c).unwrap_or(0));
    }
}

#[test]
fn output_charmap_agrees_with_ttf_parser() {
    let data = font_cmap();
    let table = cmap::Table::parse(&data).unwrap();
    let base = table.unicode_map().unwrap().unwrap();
    let sequences = VariationSequences::parse(
        table.subtable(&table.records()[0]).unwrap(),
        &base,
    )
    .unwrap();

    let mut allocator = ClusterAllocator::new();
    for cluster in [
        Cluster::new(0x41),
        Cluster::with_selector(0x41, VS1),
        Cluster::new(0x1F600),
        Cluster::with_selector(0x845B, VS17),
        Cluster::new(0x44),
        Cluster::new(0x4E00),
    ] {
        allocator.assign(cluster).unwrap();
    }

    let resolve = |c: &Cluster| Some(sequences.resolve(c));
    assert_eq!(allocator.retained_glyph_ids(resolve), vec![0, 1, 2, 9, 10, 11, 1234]);

    // Codes and the glyphs of their clusters in the original font.
    let original = [
        (0x20, 1),
        (0x21, 2),
        (0x22, 10),
        (0x23, 9),
        (0x24, 11),
        (0x25, 0),
        (0x26, 1234),
    ];

    for (encoding, base_code) in [(ByteEncoding::MacRoman, 0), (ByteEncoding::Symbol, 0xF000)]
    {
        let (out, remapper) = allocator.build_output_charmap(resolve, encoding).unwrap();
        assert_eq!(remapper.num_gids(), 7);

        let parsed = ttf_parser::cmap::Table::parse(&out).unwrap();
        let subtable = parsed.subtables.get(0).unwrap();

        for (code, old) in original {
            let new = subtable.glyph_index(base_code + code).map_or(0, |g| g.0);
            assert_eq!(remapper.get_reverse(new), Some(old), "{encoding:?} {code:#x}");
        }

        let decoded = cmap::decode_single_byte(&out).unwrap();
        assert_eq!(decoded.len(), 6);
        assert_eq!(decoded[&0x26], 6);
        assert_eq!(allocator.from_code(0x26), Some(&Cluster::new(0x4E00)));
    }
}

#[test]
fn charset_follows_remapped_glyphs() {
    // The font names glyph 1 to 11 with custom strings.
    let strings: Vec<String> = (1..12).map(|i| format!("g{i:02}")).collect();
    let sids = (0..11).map(|i| StringId(391 + i)).collect();
    let charset = Charset::new(CharsetKind::Custom(CustomCharset::Array(sids)), 12);

    let data = font_cmap();
    let table = cmap::Table::parse(&data).unwrap();
    let base = table.unicode_map().unwrap().unwrap();
    let sequences = table.variation_sequences(&base).unwrap().unwrap();

    let mut allocator = ClusterAllocator::new();
    for c in "ABC\u{1F600}".chars() {
        allocator.assign(Cluster::from(c)).unwrap();
    }
    allocator.assign(Cluster::with_selector(0x41, VS1)).unwrap();

    let glyphs = allocator.retained_glyph_ids(|c| Some(sequences.resolve(c)));
    assert_eq!(glyphs, vec![0, 1, 2, 3, 4, 9, 10]);

    let remapper = GlyphRemapper::new_from_glyphs(&glyphs);
    let encoded = charset.encode(&remapper).unwrap();

    // Glyphs 1 to 4 and 9 to 10 form two runs of consecutive strings.
    assert_eq!(encoded, vec![1, 0x01, 0x87, 3, 0x01, 0x8F, 1]);

    let mut cff = vec![0; 4];
    cff.extend(&encoded);
    let subset = Charset::parse(&cff, 4, remapper.num_gids() as u16).unwrap();
    for (new, old) in remapper.remapped_gids().enumerate() {
        assert_eq!(
            subset.name(new as u16, &strings),
            charset.name(old, &strings),
        );
    }
}
