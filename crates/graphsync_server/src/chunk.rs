//! Server-side chunk streaming.

use std::io::Read;

/// A single-use lazy iterator over fixed-size byte ranges of one
/// file's content.
///
/// Created on the first `PullChunk` for a container, advanced once
/// per pull, and removed from the session the moment it is exhausted
/// so that exactly one end marker can ever be produced for it.
pub(crate) struct ChunkStream {
    reader: Box<dyn Read + Send>,
    chunk_size: usize,
    file_size: u64,
    next_sequence: u32,
}

impl ChunkStream {
    /// Wraps a content reader.
    pub(crate) fn new(reader: Box<dyn Read + Send>, chunk_size: usize, file_size: u64) -> Self {
        Self {
            reader,
            chunk_size,
            file_size,
            next_sequence: 0,
        }
    }

    /// Returns the declared file size.
    pub(crate) fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Reads the next chunk. `None` means the content is exhausted
    /// and the stream must be discarded.
    pub(crate) fn next_chunk(&mut self) -> std::io::Result<Option<(u32, Vec<u8>)>> {
        let mut buf = vec![0u8; self.chunk_size];
        let mut filled = 0;

        while filled < self.chunk_size {
            let n = self.reader.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 {
            return Ok(None);
        }

        buf.truncate(filled);
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        Ok(Some((sequence, buf)))
    }
}

impl std::fmt::Debug for ChunkStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStream")
            .field("chunk_size", &self.chunk_size)
            .field("file_size", &self.file_size)
            .field("next_sequence", &self.next_sequence)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn stream(content: &[u8], chunk_size: usize) -> ChunkStream {
        ChunkStream::new(
            Box::new(Cursor::new(content.to_vec())),
            chunk_size,
            content.len() as u64,
        )
    }

    #[test]
    fn splits_content_into_fixed_chunks() {
        let mut s = stream(&[7u8; 10], 4);

        let (seq, data) = s.next_chunk().unwrap().unwrap();
        assert_eq!((seq, data.len()), (0, 4));
        let (seq, data) = s.next_chunk().unwrap().unwrap();
        assert_eq!((seq, data.len()), (1, 4));
        let (seq, data) = s.next_chunk().unwrap().unwrap();
        assert_eq!((seq, data.len()), (2, 2));
        assert!(s.next_chunk().unwrap().is_none());
    }

    #[test]
    fn exact_multiple_has_no_short_tail() {
        let mut s = stream(&[1u8; 8], 4);
        assert_eq!(s.next_chunk().unwrap().unwrap().1.len(), 4);
        assert_eq!(s.next_chunk().unwrap().unwrap().1.len(), 4);
        assert!(s.next_chunk().unwrap().is_none());
    }

    #[test]
    fn empty_content_is_immediately_exhausted() {
        let mut s = stream(&[], 4);
        assert!(s.next_chunk().unwrap().is_none());
    }
}
