use std::collections::BTreeMap;

use super::CharacterMap;
use crate::stream::{Readable, Reader, Writeable, Writer};
use crate::{Error, Result};

/// A format 0 subtable: one glyph byte for each of the 256 codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtable0 {
    language: u16,
    glyph_ids: [u8; 256],
}

impl Subtable0 {
    /// Build a subtable from a code to glyph mapping.
    ///
    /// Fails with [`Error::InvalidData`] if a glyph is above 255, since a
    /// format 0 subtable stores glyphs as single bytes.
    pub fn from_mappings(mapping: &BTreeMap<u8, u16>) -> Result<Self> {
        let mut glyph_ids = [0; 256];
        for (&code, &glyph) in mapping {
            glyph_ids[usize::from(code)] = u8::try_from(glyph).map_err(|_| {
                log::debug!("glyph {glyph} of code {code:#04x} does not fit a format 0 cmap");
                Error::InvalidData
            })?;
        }

        Ok(Self { language: 0, glyph_ids })
    }
}

impl CharacterMap for Subtable0 {
    fn glyph_index(&self, code_point: u32) -> Option<u16> {
        let code = u8::try_from(code_point).ok()?;
        match self.glyph_ids[usize::from(code)] {
            0 => None,
            glyph => Some(u16::from(glyph)),
        }
    }

    fn mappings(&self, mut f: impl FnMut(u32, u16)) {
        for (code, &glyph) in self.glyph_ids.iter().enumerate() {
            if glyph != 0 {
                f(code as u32, u16::from(glyph));
            }
        }
    }
}

impl Readable<'_> for Subtable0 {
    const SIZE: usize = 3 * 2 + 256;

    fn read(r: &mut Reader) -> Result<Self> {
        if r.read::<u16>()? != 0 {
            return Err(Error::InvalidData);
        }
        r.read::<u16>()?; // length
        let language = r.read::<u16>()?;
        let glyph_ids = r.read::<[u8; 256]>()?;
        Ok(Self { language, glyph_ids })
    }
}

impl Writeable for Subtable0 {
    fn write(&self, w: &mut Writer) {
        w.write::<u16>(0);
        w.write::<u16>(Self::SIZE as u16);
        w.write::<u16>(self.language);
        w.write(self.glyph_ids);
    }
}
