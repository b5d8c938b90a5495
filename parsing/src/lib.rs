pub use parsing_macro::*;

pub trait Endianess {}

pub struct LittleEndian;
impl Endianess for LittleEndian {}

pub type LE = LittleEndian;

pub struct BigEndian;
impl Endianess for BigEndian {}

pub type BE = BigEndian;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A read asked for more bytes than the buffer still holds
    #[error("unexpected end of data: wanted {wanted} bytes, {remaining} remaining")]
    UnexpectedEndOfData { wanted: usize, remaining: usize },
    #[error("magic number mismatch: expected {expected:#x}, found {found:#x}")]
    MagicCheckFailed { expected: u64, found: u64 },
    #[error("invalid utf-8 string: {0}")]
    InterpretStrFailed(#[from] std::str::Utf8Error),
    #[error("no variant for type value {0:#x}")]
    EnumTypeValueMatchFailed(u64),
    /// A `limit_buffer` region was not fully consumed by the parse
    #[error("{remaining} bytes left unread in a limited buffer")]
    UnconsumedBytes { remaining: usize },
    #[error("seek to {position} is past the end of a {len} byte buffer")]
    SeekOutOfBounds { position: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

pub trait ReadBytes<'a> {
    fn read_bytes(&mut self, num: usize) -> Result<&'a [u8]>;
    fn read_rest(&mut self) -> &'a [u8];
    fn remaining(&self) -> usize;
    fn read_type<E: Endianess, T: Parse<'a, E>>(&mut self) -> Result<T>;
    fn read_type_be<T: Parse<'a, BigEndian>>(&mut self) -> Result<T> {
        self.read_type::<BigEndian, T>()
    }
    fn read_type_le<T: Parse<'a, LittleEndian>>(&mut self) -> Result<T> {
        self.read_type::<LittleEndian, T>()
    }
    /// Reads `num` bytes and interprets them as UTF-8.
    /// Invalid sequences are an error, never replaced.
    fn read_utf8(&mut self, num: usize) -> Result<&'a str> {
        let bytes = self.read_bytes(num)?;
        Ok(std::str::from_utf8(bytes)?)
    }
}

impl<'a> ReadBytes<'a> for &'a [u8] {
    fn read_bytes(&mut self, num: usize) -> Result<&'a [u8]> {
        let buf: &'a [u8] = *self;
        if num <= buf.len() {
            let (front, back) = buf.split_at(num);
            *self = back;
            Ok(front)
        } else {
            Err(Error::UnexpectedEndOfData {
                wanted: num,
                remaining: buf.len(),
            })
        }
    }

    fn read_rest(&mut self) -> &'a [u8] {
        let buf: &'a [u8] = *self;
        *self = &buf[buf.len()..];
        buf
    }

    fn remaining(&self) -> usize {
        self.len()
    }

    fn read_type<E: Endianess, T: Parse<'a, E>>(&mut self) -> Result<T> {
        T::parse(self)
    }
}

/// A read position over a whole buffer.
///
/// Unlike a bare slice, a cursor remembers where it is relative to the start
/// of the buffer, so callers can compute absolute offsets (chunk ends, frame
/// ends) and jump to them.
#[derive(Clone, Copy, Debug)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn is_at_end(&self) -> bool {
        self.pos == self.buf.len()
    }

    /// Moves to an absolute offset. Seeking to exactly the end is allowed.
    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.buf.len() {
            return Err(Error::SeekOutOfBounds {
                position,
                len: self.buf.len(),
            });
        }
        self.pos = position;
        Ok(())
    }
}

impl<'a> ReadBytes<'a> for Cursor<'a> {
    fn read_bytes(&mut self, num: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if num > remaining {
            return Err(Error::UnexpectedEndOfData {
                wanted: num,
                remaining,
            });
        }
        let bytes = &self.buf[self.pos..self.pos + num];
        self.pos += num;
        Ok(bytes)
    }

    fn read_rest(&mut self) -> &'a [u8] {
        let bytes = &self.buf[self.pos..];
        self.pos = self.buf.len();
        bytes
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn read_type<E: Endianess, T: Parse<'a, E>>(&mut self) -> Result<T> {
        T::parse(self)
    }
}

pub trait Parse<'a, E: Endianess>: Sized {
    fn parse(input: &mut impl ReadBytes<'a>) -> Result<Self>;
}

macro_rules! impl_primitive_parse {
    ($typ: ty) => {
        impl<'a> Parse<'a, LittleEndian> for $typ {
            fn parse(input: &mut impl ReadBytes<'a>) -> Result<Self> {
                let mut raw = [0_u8; std::mem::size_of::<$typ>()];
                raw.copy_from_slice(input.read_bytes(std::mem::size_of::<$typ>())?);
                Ok(<$typ>::from_le_bytes(raw))
            }
        }

        impl<'a> Parse<'a, BigEndian> for $typ {
            fn parse(input: &mut impl ReadBytes<'a>) -> Result<Self> {
                let mut raw = [0_u8; std::mem::size_of::<$typ>()];
                raw.copy_from_slice(input.read_bytes(std::mem::size_of::<$typ>())?);
                Ok(<$typ>::from_be_bytes(raw))
            }
        }

        impl<'a, E: Endianess, const N: usize> Parse<'a, E> for [$typ; N]
        where
            $typ: Parse<'a, E>,
        {
            fn parse(input: &mut impl ReadBytes<'a>) -> Result<Self> {
                let mut out = [Default::default(); N];
                for i in out.iter_mut() {
                    *i = input.read_type::<E, $typ>()?;
                }
                Ok(out)
            }
        }
    };
}

impl_primitive_parse!(u8);
impl_primitive_parse!(u16);
impl_primitive_parse!(u32);
impl_primitive_parse!(u64);
impl_primitive_parse!(u128);

impl_primitive_parse!(i8);
impl_primitive_parse!(i16);
impl_primitive_parse!(i32);
impl_primitive_parse!(i64);
impl_primitive_parse!(i128);

impl_primitive_parse!(f32);
impl_primitive_parse!(f64);

#[cfg(test)]
mod test {
    use crate::{Cursor, Error, ReadBytes, LE};

    #[test]
    fn little_and_big_endian() {
        let bytes = [0x34_u8, 0x12];
        let mut b = bytes.as_slice();
        assert_eq!(b.read_type_le::<u16>().unwrap(), 0x1234);
        let mut b = bytes.as_slice();
        assert_eq!(b.read_type_be::<u16>().unwrap(), 0x3412);

        let bytes = 0xA5E0_F1FA_u64.to_le_bytes();
        let mut b = bytes.as_slice();
        assert_eq!(b.read_type::<LE, u64>().unwrap(), 0xA5E0_F1FA);
        assert!(b.is_empty());
    }

    #[test]
    fn signed_values() {
        let bytes = [0xFE_u8, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        let mut b = bytes.as_slice();
        assert_eq!(b.read_type_le::<i32>().unwrap(), -2);
        assert_eq!(b.read_type_le::<i16>().unwrap(), -1);
    }

    #[test]
    fn float() {
        let bytes = 1.5_f32.to_le_bytes();
        let mut b = bytes.as_slice();
        assert_eq!(b.read_type_le::<f32>().unwrap(), 1.5);
    }

    #[test]
    fn short_read_fails_without_consuming() {
        let bytes = [1_u8, 2, 3];
        let mut b = bytes.as_slice();
        let err = b.read_type_le::<u32>().unwrap_err();
        assert_eq!(
            err,
            Error::UnexpectedEndOfData {
                wanted: 4,
                remaining: 3
            }
        );
        assert_eq!(b.len(), 3);
    }

    #[test]
    fn utf8_errors_are_propagated() {
        let bytes = [b'o', b'k', 0xFF];
        let mut b = bytes.as_slice();
        assert_eq!(b.read_utf8(2).unwrap(), "ok");
        assert!(matches!(
            b.read_utf8(1),
            Err(Error::InterpretStrFailed(_))
        ));
    }

    #[test]
    fn cursor_tracks_position() {
        let bytes = [1_u8, 0, 2, 0, 3, 0];
        let mut c = Cursor::new(&bytes);
        assert_eq!(c.read_type_le::<u16>().unwrap(), 1);
        assert_eq!(c.position(), 2);
        c.seek(4).unwrap();
        assert_eq!(c.read_type_le::<u16>().unwrap(), 3);
        assert!(c.is_at_end());
        assert_eq!(c.remaining(), 0);

        c.seek(0).unwrap();
        assert_eq!(c.read_rest().len(), 6);
    }

    #[test]
    fn cursor_rejects_bad_seek_and_short_reads() {
        let bytes = [0_u8; 4];
        let mut c = Cursor::new(&bytes);
        assert_eq!(
            c.seek(5),
            Err(Error::SeekOutOfBounds {
                position: 5,
                len: 4
            })
        );
        c.seek(2).unwrap();
        assert_eq!(
            c.read_bytes(3),
            Err(Error::UnexpectedEndOfData {
                wanted: 3,
                remaining: 2
            })
        );
        assert_eq!(c.position(), 2);
    }
}
