#![forbid(unsafe_code)]
//! Little-endian encoding helpers and a bounds-checked cursor shared by the
//! codec, the directory and the entry iterator.

/// Width of every integer field in the format.
pub const U64_LEN: usize = core::mem::size_of::<u64>();

pub mod le {
    //! Fixed-width little-endian integers.

    use super::U64_LEN;

    /// Appends `v` as eight little-endian bytes.
    #[inline]
    pub fn put_u64(dst: &mut Vec<u8>, v: u64) {
        dst.extend_from_slice(&v.to_le_bytes());
    }

    /// Decodes the first eight bytes of `src` as a little-endian u64.
    ///
    /// Panics if `src` is shorter than eight bytes; callers go through
    /// [`super::buf::Cursor`] when the length is not already known.
    #[inline]
    pub fn get_u64(src: &[u8]) -> u64 {
        let mut bytes = [0u8; U64_LEN];
        bytes.copy_from_slice(&src[..U64_LEN]);
        u64::from_le_bytes(bytes)
    }
}

pub mod buf {
    //! A slice-backed cursor that reports truncation instead of panicking.

    use core::fmt;

    use super::{le, U64_LEN};
    use crate::types::{ColumnarError, Result};

    /// A cursor for reading bytes from a slice with offset tracking.
    pub struct Cursor<'a> {
        buf: &'a [u8],
        off: usize,
    }

    impl<'a> Cursor<'a> {
        /// Creates a new cursor starting at offset 0.
        pub fn new(buf: &'a [u8]) -> Self {
            Self { buf, off: 0 }
        }

        /// Takes the next `n` bytes, advancing the offset.
        ///
        /// Fails with [`ColumnarError::Truncated`] and leaves the cursor
        /// untouched when fewer than `n` bytes remain.
        pub fn take(&mut self, n: usize, context: &'static str) -> Result<&'a [u8]> {
            let remaining = self.remaining();
            if n > remaining {
                return Err(ColumnarError::truncated(context, n, remaining));
            }
            let start = self.off;
            self.off += n;
            Ok(&self.buf[start..self.off])
        }

        /// Reads a little-endian u64.
        pub fn read_u64(&mut self, context: &'static str) -> Result<u64> {
            self.take(U64_LEN, context).map(le::get_u64)
        }

        /// Reads a u64 length and converts it to `usize`, rejecting lengths
        /// larger than what is left in the buffer.
        pub fn read_len(&mut self, context: &'static str) -> Result<usize> {
            let raw = self.read_u64(context)?;
            let remaining = self.remaining();
            match usize::try_from(raw) {
                Ok(len) if len <= remaining => Ok(len),
                _ => Err(ColumnarError::Truncated {
                    context,
                    needed: raw,
                    remaining: remaining as u64,
                }),
            }
        }

        /// Returns the number of bytes remaining in the buffer.
        pub fn remaining(&self) -> usize {
            self.buf.len().saturating_sub(self.off)
        }

        /// Returns true once every byte has been consumed.
        pub fn is_empty(&self) -> bool {
            self.remaining() == 0
        }

        /// Current read offset from the start of the slice.
        pub fn position(&self) -> usize {
            self.off
        }
    }

    impl<'a> fmt::Debug for Cursor<'a> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("Cursor")
                .field("off", &self.off)
                .field("remaining", &self.remaining())
                .finish()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{buf::Cursor, le};
    use crate::types::ColumnarError;
    use proptest::prelude::*;

    #[test]
    fn u64_is_little_endian() {
        let mut dst = Vec::new();
        le::put_u64(&mut dst, 0x0102_0304_0506_0708);
        assert_eq!(dst, vec![8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(le::get_u64(&dst), 0x0102_0304_0506_0708);
    }

    #[test]
    fn cursor_take_reports_truncation() {
        let mut cur = Cursor::new(&[1, 2, 3]);
        let err = cur.take(4, "payload").unwrap_err();
        match err {
            ColumnarError::Truncated {
                context,
                needed,
                remaining,
            } => {
                assert_eq!(context, "payload");
                assert_eq!(needed, 4);
                assert_eq!(remaining, 3);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(cur.position(), 0, "failed take must not advance");
        assert_eq!(cur.take(3, "payload").unwrap(), &[1, 2, 3]);
        assert!(cur.is_empty());
    }

    #[test]
    fn read_len_rejects_lengths_past_the_end() {
        let mut buf = Vec::new();
        le::put_u64(&mut buf, 9);
        buf.extend_from_slice(&[0; 4]);
        let mut cur = Cursor::new(&buf);
        assert!(matches!(
            cur.read_len("name"),
            Err(ColumnarError::Truncated { needed: 9, remaining: 4, .. })
        ));
    }

    proptest! {
        #[test]
        fn cursor_reads_back_written_u64s(xs in proptest::collection::vec(any::<u64>(), 0..32)) {
            let mut buf = Vec::new();
            for &x in &xs {
                le::put_u64(&mut buf, x);
            }
            let mut cur = Cursor::new(&buf);
            for &x in &xs {
                prop_assert_eq!(cur.read_u64("value").unwrap(), x);
            }
            prop_assert!(cur.is_empty());
        }
    }
}
