/*!
Encoding and decoding building blocks for subsetting fonts into compact,
single-byte addressable fonts.

The crate covers three pieces that a subsetting pipeline combines:

- [`ClusterAllocator`] assigns compact 8-bit codes to Unicode character
  clusters (a code point, optionally followed by a variation selector),
  remembers the mapping back to Unicode and produces a `cmap` table for the
  assigned codes.
- [`Charset`] reads and writes the glyph naming table of CFF fonts, including
  the three predefined charsets.
- [`VariationSequences`] reads a `cmap` format 14 subtable and resolves
  clusters with variation selectors to glyphs.

# Example
Assign codes to a few clusters and build the `cmap` table for them.

```
use std::collections::BTreeMap;
use charspace::{ByteEncoding, Cluster, ClusterAllocator};

# fn main() -> Result<(), charspace::Error> {
// The glyphs of the original font.
let cmap = BTreeMap::from([(0x20, 3), (0x41, 36), (0x4E00, 1234)]);
let resolve = |cluster: &Cluster| cmap.get(&cluster.base()).copied();

let mut allocator = ClusterAllocator::new();
assert_eq!(allocator.assign(Cluster::new(0x4E00))?, 0x21);
assert_eq!(allocator.assign(Cluster::new(0x41))?, 0x22);
assert_eq!(allocator.assign(Cluster::new(0x4E00))?, 0x21);

assert_eq!(allocator.retained_glyph_ids(resolve), vec![0, 3, 36, 1234]);

// The subset font numbers its glyphs in code order.
let (table, remapper) = allocator.build_output_charmap(resolve, ByteEncoding::MacRoman)?;
let codes = charspace::cmap::decode_single_byte(&table)?;
assert_eq!(codes[&0x21], 2);
assert_eq!(remapper.get_reverse(2), Some(1234));
# Ok(())
# }
```
*/

#![deny(unsafe_code)]
#![deny(missing_docs)]

pub mod cff;
mod cluster;
pub mod cmap;
mod remapper;
pub mod stream;

pub use crate::cff::charset::{Charset, CharsetFormat, CharsetKind};
pub use crate::cff::{StringId, StringTable};
pub use crate::cluster::{Cluster, ClusterAllocator};
pub use crate::cmap::subtable14::VariationSequences;
pub use crate::cmap::{ByteEncoding, CharacterMap};
pub use crate::remapper::GlyphRemapper;

use std::fmt::{self, Display, Formatter};

/// The result type for everything.
pub type Result<T> = std::result::Result<T, Error>;

/// An error that occurred while reading or writing a table.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Error {
    /// An offset pointed outside of the data.
    InvalidOffset,
    /// Parsing expected more data.
    MissingData,
    /// Parsed data was invalid.
    InvalidData,
    /// A CFF charset uses a format other than 0, 1 or 2.
    UnknownCharsetFormat(u8),
    /// All 224 single-byte codes are already assigned to other clusters.
    CodeSpaceExhausted,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::InvalidOffset => f.pad("invalid offset"),
            Self::MissingData => f.pad("missing more data"),
            Self::InvalidData => f.pad("invalid data"),
            Self::UnknownCharsetFormat(format) => {
                write!(f, "unsupported charset format {format}")
            }
            Self::CodeSpaceExhausted => f.pad("no single-byte codes left"),
        }
    }
}

impl std::error::Error for Error {}
