//! Big-endian reading and writing of binary data.

use crate::{Error, Result};

/// A readable stream of binary data.
#[derive(Clone, Debug)]
pub struct Reader<'a> {
    /// The underlying data of the reader.
    data: &'a [u8],
    /// The current offset in bytes. Is not guaranteed to be in range.
    offset: usize,
}

impl<'a> Reader<'a> {
    /// Create a new readable stream of binary data.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Create a new readable stream of binary data at a specific position.
    pub fn new_at(data: &'a [u8], offset: usize) -> Self {
        Self { data, offset }
    }

    /// The underlying data of the reader.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// The remaining data from the current offset.
    pub fn tail(&self) -> &'a [u8] {
        self.data.get(self.offset..).unwrap_or_default()
    }

    /// Returns the current offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Check whether the reader is at the end of the buffer.
    pub fn at_end(&self) -> bool {
        self.offset >= self.data.len()
    }

    /// Jump to a specific location.
    pub fn jump(&mut self, offset: usize) {
        self.offset = offset;
    }

    /// Try to read `T` from the data.
    pub fn read<T: Readable<'a>>(&mut self) -> Result<T> {
        T::read(self)
    }

    /// Read a certain number of bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.offset.checked_add(len).ok_or(Error::MissingData)?;
        let v = self.data.get(self.offset..end).ok_or(Error::MissingData)?;
        self.offset = end;
        Ok(v)
    }

    /// Try to read a vector of `T` from the data.
    pub fn read_vector<T: Readable<'a>>(&mut self, count: usize) -> Result<Vec<T>> {
        // Don't trust the count for preallocation, the data might be truncated.
        let mut res = Vec::with_capacity(count.min(self.tail().len() / T::SIZE.max(1)));

        for _ in 0..count {
            res.push(self.read::<T>()?);
        }

        Ok(res)
    }

    /// Skip the next `n` bytes from the stream.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.read_bytes(n).map(|_| ())
    }
}

/// A writable stream of binary data.
#[derive(Debug, Default)]
pub struct Writer(Vec<u8>);

impl Writer {
    /// Create a new writable stream of binary data.
    pub fn new() -> Self {
        Self(Vec::with_capacity(1024))
    }

    /// Create a new writable stream of binary data with a capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    /// Write `T` into the data.
    pub fn write<T: Writeable>(&mut self, data: T) {
        data.write(self);
    }

    /// Write all elements of a slice.
    pub fn write_vector<T: Writeable>(&mut self, data: &[T]) {
        for el in data {
            el.write(self);
        }
    }

    /// Give bytes into the writer.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.0.extend(bytes);
    }

    /// The number of written bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing was written yet.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return the written bytes.
    pub fn finish(self) -> Vec<u8> {
        self.0
    }
}

/// Trait for an object that can be read from a byte stream with a fixed size.
pub trait Readable<'a>: Sized {
    /// The number of bytes the object takes up in the stream.
    const SIZE: usize;

    /// Read the object, advancing the reader.
    fn read(r: &mut Reader<'a>) -> Result<Self>;

    /// Read the object at a specific offset of some data.
    fn read_at(data: &'a [u8], offset: usize) -> Result<Self> {
        let mut r = Reader::new_at(data, offset);
        Self::read(&mut r)
    }
}

/// Trait for an object that can be written into a byte stream.
pub trait Writeable: Sized {
    /// Write the object.
    fn write(&self, w: &mut Writer);
}

impl<T: Writeable> Writeable for &T {
    fn write(&self, w: &mut Writer) {
        T::write(self, w)
    }
}

impl<const N: usize> Readable<'_> for [u8; N] {
    const SIZE: usize = N;

    fn read(r: &mut Reader) -> Result<Self> {
        let bytes = r.read_bytes(N)?;
        bytes.try_into().map_err(|_| Error::MissingData)
    }
}

impl<const N: usize> Writeable for [u8; N] {
    fn write(&self, w: &mut Writer) {
        w.extend(self)
    }
}

macro_rules! impl_int {
    ($($ty:ty),*) => {
        $(
            impl Readable<'_> for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                fn read(r: &mut Reader) -> Result<Self> {
                    r.read::<[u8; std::mem::size_of::<$ty>()]>().map(Self::from_be_bytes)
                }
            }

            impl Writeable for $ty {
                fn write(&self, w: &mut Writer) {
                    w.extend(&self.to_be_bytes());
                }
            }
        )*
    };
}

impl_int!(u8, u16, i16, u32, i32);

/// A 24-bit unsigned integer, as used for code points in `cmap` format 14.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct U24(pub u32);

impl U24 {
    /// The largest value that fits into 24 bits.
    pub const MAX: u32 = 0xFF_FFFF;
}

impl Readable<'_> for U24 {
    const SIZE: usize = 3;

    fn read(r: &mut Reader<'_>) -> Result<Self> {
        let data = r.read::<[u8; 3]>()?;
        Ok(U24(u32::from_be_bytes([0, data[0], data[1], data[2]])))
    }
}

impl Writeable for U24 {
    fn write(&self, w: &mut Writer) {
        let data = self.0.to_be_bytes();
        w.write::<[u8; 3]>([data[1], data[2], data[3]]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_big_endian() {
        let data = [0x01, 0x02, 0xFF, 0xFE, 0x00, 0x00, 0x01, 0x0A, 0x0B, 0x0C, 0x0D];
        let mut r = Reader::new(&data);
        assert_eq!(r.read::<u16>(), Ok(0x0102));
        assert_eq!(r.read::<i16>(), Ok(-2));
        assert_eq!(r.read::<u32>(), Ok(0x0000_010A));
        assert_eq!(r.read::<U24>(), Ok(U24(0x0B_0C0D)));
        assert!(r.at_end());
        assert_eq!(r.read::<u8>(), Err(Error::MissingData));
    }

    #[test]
    fn u24_write() {
        let mut w = Writer::new();
        w.write(U24(0x0E_0100));
        assert_eq!(w.finish(), vec![0x0E, 0x01, 0x00]);
    }

    #[test]
    fn read_vector_truncated() {
        let data = [0, 1, 0, 2, 0];
        let mut r = Reader::new(&data);
        assert_eq!(r.read_vector::<u16>(3), Err(Error::MissingData));
        assert_eq!(Reader::new(&data).read_vector::<u16>(2), Ok(vec![1, 2]));
    }
}
