//! Glyph naming in CFF tables.
//!
//! CFF fonts name their glyphs through string IDs (SIDs). The first 391 SIDs
//! refer to a fixed set of standard strings, all others index the String
//! INDEX of the font. The [`charset`] maps glyph IDs to SIDs.

pub mod charset;
pub mod index;
mod standard;

use crate::stream::{Readable, Reader, Writeable, Writer};
use crate::Result;

use self::standard::STANDARD_STRINGS;

/// A type-safe wrapper for string ID.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct StringId(pub u16);

impl StringId {
    /// The number of standard strings. SIDs from here on refer to the
    /// font's own strings.
    pub const STANDARD_STRING_LEN: u16 = 391;

    /// Whether this SID refers to a standard string.
    pub fn is_standard_string(&self) -> bool {
        self.0 < Self::STANDARD_STRING_LEN
    }

    /// The standard string of this SID, if it is one.
    pub fn standard_string(&self) -> Option<&'static str> {
        STANDARD_STRINGS.get(usize::from(self.0)).copied()
    }

    /// Resolve the SID to a string, looking up custom strings in `strings`.
    pub fn resolve<'a, S>(&self, strings: &'a S) -> Option<&'a str>
    where
        S: StringTable + ?Sized,
    {
        match self.standard_string() {
            Some(string) => Some(string),
            None => strings.string(usize::from(self.0 - Self::STANDARD_STRING_LEN)),
        }
    }
}

impl Readable<'_> for StringId {
    const SIZE: usize = u16::SIZE;

    fn read(r: &mut Reader<'_>) -> Result<Self> {
        r.read::<u16>().map(Self)
    }
}

impl Writeable for StringId {
    fn write(&self, w: &mut Writer) {
        w.write::<u16>(self.0)
    }
}

impl From<u16> for StringId {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

/// The custom strings of a font, i.e. the contents of its String INDEX.
///
/// Index 0 corresponds to SID 391.
pub trait StringTable {
    /// The string at `index`.
    fn string(&self, index: usize) -> Option<&str>;

    /// The number of strings.
    fn count(&self) -> usize;
}

impl<S: AsRef<str>> StringTable for [S] {
    fn string(&self, index: usize) -> Option<&str> {
        self.get(index).map(AsRef::as_ref)
    }

    fn count(&self) -> usize {
        self.len()
    }
}

impl<S: AsRef<str>> StringTable for Vec<S> {
    fn string(&self, index: usize) -> Option<&str> {
        self.as_slice().string(index)
    }

    fn count(&self) -> usize {
        self.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_strings() {
        assert_eq!(StringId(0).standard_string(), Some(".notdef"));
        assert_eq!(StringId(1).standard_string(), Some("space"));
        assert_eq!(StringId(390).standard_string(), Some("Semibold"));
        assert_eq!(StringId(391).standard_string(), None);
        assert!(StringId(390).is_standard_string());
        assert!(!StringId(391).is_standard_string());
    }

    #[test]
    fn resolve_custom_strings() {
        let strings = vec!["uni2603", "smiley"];
        assert_eq!(StringId(34).resolve(&strings), Some("A"));
        assert_eq!(StringId(391).resolve(&strings), Some("uni2603"));
        assert_eq!(StringId(392).resolve(&strings), Some("smiley"));
        assert_eq!(StringId(393).resolve(&strings), None);
        assert_eq!(strings.count(), 2);
    }
}
