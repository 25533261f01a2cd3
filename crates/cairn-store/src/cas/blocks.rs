//! Fixed-size block comparison of two byte streams

use std::io::{ErrorKind, Read};

/// Block size used when comparing stored content with a source file
pub const COMPARE_BLOCK_SIZE: usize = 4096;

/// Outcome of [`compare_streams`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamComparison {
    Equal,
    /// Block `block` came back with different lengths, i.e. one stream ended first
    LengthMismatch { block: u64, left: usize, right: usize },
    /// Block `block` has the same length but different bytes
    ContentMismatch { block: u64 },
}

impl StreamComparison {
    pub fn is_equal(&self) -> bool {
        matches!(self, StreamComparison::Equal)
    }
}

/// Fill `buf` as far as the reader allows; a short count means end of stream
pub fn read_block<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Compare two streams block by block, stopping at the first difference
///
/// Neither stream is ever held in memory beyond one block.
pub fn compare_streams<A: Read, B: Read>(
    mut left: A,
    mut right: B,
    block_size: usize,
) -> std::io::Result<StreamComparison> {
    let mut lbuf = vec![0u8; block_size];
    let mut rbuf = vec![0u8; block_size];
    let mut block = 0u64;

    loop {
        let ln = read_block(&mut left, &mut lbuf)?;
        let rn = read_block(&mut right, &mut rbuf)?;
        if ln != rn {
            return Ok(StreamComparison::LengthMismatch {
                block,
                left: ln,
                right: rn,
            });
        }
        if ln == 0 {
            return Ok(StreamComparison::Equal);
        }
        if lbuf[..ln] != rbuf[..rn] {
            return Ok(StreamComparison::ContentMismatch { block });
        }
        block += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_streams() {
        let data = vec![7u8; COMPARE_BLOCK_SIZE * 2 + 5];
        assert_eq!(
            compare_streams(&data[..], &data[..], COMPARE_BLOCK_SIZE).unwrap(),
            StreamComparison::Equal
        );
        assert!(compare_streams(&b""[..], &b""[..], 16).unwrap().is_equal());
    }

    #[test]
    fn test_last_byte_of_full_block() {
        let a = vec![1u8; COMPARE_BLOCK_SIZE * 2];
        let mut b = a.clone();
        b[COMPARE_BLOCK_SIZE * 2 - 1] = 2;

        assert_eq!(
            compare_streams(&a[..], &b[..], COMPARE_BLOCK_SIZE).unwrap(),
            StreamComparison::ContentMismatch { block: 1 }
        );
    }

    #[test]
    fn test_prefix_is_length_mismatch() {
        let a = vec![1u8; COMPARE_BLOCK_SIZE];
        let b = vec![1u8; COMPARE_BLOCK_SIZE + 1];

        assert_eq!(
            compare_streams(&a[..], &b[..], COMPARE_BLOCK_SIZE).unwrap(),
            StreamComparison::LengthMismatch {
                block: 1,
                left: 0,
                right: 1
            }
        );
    }

    #[test]
    fn test_read_block_handles_short_reads() {
        struct Trickle<'a>(&'a [u8]);
        impl Read for Trickle<'_> {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if self.0.is_empty() || buf.is_empty() {
                    return Ok(0);
                }
                buf[0] = self.0[0];
                self.0 = &self.0[1..];
                Ok(1)
            }
        }

        let mut reader = Trickle(b"abcdef");
        let mut buf = [0u8; 4];
        assert_eq!(read_block(&mut reader, &mut buf).unwrap(), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(read_block(&mut reader, &mut buf).unwrap(), 2);
    }
}
