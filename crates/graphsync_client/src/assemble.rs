//! Chunked-file reassembly.

use crate::error::{ClientError, ClientResult};
use graphsync_protocol::{ChunkGuard, FileChunk, FileContainer, FileEnd};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Reassembles one chunk stream into a file.
///
/// Chunks are buffered into a temporary file next to the destination;
/// on the end marker the buffer is flushed, parent directories are
/// created, and the temporary file is atomically moved over the
/// destination path, replacing whatever was there.
///
/// The first chunk carrying a nonzero file size fixes the expected
/// size for the whole transfer; any later disagreement, or any gap in
/// the sequence numbers, fails the transfer with no partial-acceptance
/// fallback.
#[derive(Debug)]
pub struct FileAssembler {
    temp: NamedTempFile,
    dest: PathBuf,
    guard: ChunkGuard,
    bytes_written: u64,
}

impl FileAssembler {
    /// Starts a transfer into `dest_dir`, named by the container's
    /// file name.
    pub fn begin(dest_dir: &Path, container: &FileContainer) -> ClientResult<Self> {
        let dest = dest_dir.join(&container.file_name);
        let parent = dest.parent().map(Path::to_path_buf).unwrap_or_else(|| dest_dir.to_path_buf());
        std::fs::create_dir_all(&parent)?;

        let temp = NamedTempFile::new_in(&parent)?;
        debug!(dest = %dest.display(), size = container.file_size, "file transfer started");

        Ok(Self {
            temp,
            dest,
            guard: ChunkGuard::new(),
            bytes_written: 0,
        })
    }

    /// Buffers one chunk.
    ///
    /// The sequence and size invariants are checked first and their
    /// violation is fatal. A plain I/O failure writing the buffered
    /// bytes is logged and left for the size invariant to surface.
    pub fn add_chunk(&mut self, chunk: &FileChunk) -> ClientResult<()> {
        self.guard.accept(chunk.sequence, chunk.file_size)?;

        match self.temp.as_file_mut().write_all(&chunk.data) {
            Ok(()) => self.bytes_written += chunk.data.len() as u64,
            Err(e) => warn!(error = %e, sequence = chunk.sequence, "chunk write failed"),
        }
        Ok(())
    }

    /// Completes the transfer: flushes, then atomically relocates the
    /// temporary file over the destination.
    pub fn finish(mut self, end: &FileEnd) -> ClientResult<PathBuf> {
        self.guard.finish(end.file_size)?;
        self.temp.as_file_mut().flush()?;

        self.temp
            .persist(&self.dest)
            .map_err(|e| ClientError::Io(e.error))?;
        debug!(dest = %self.dest.display(), bytes = self.bytes_written, "file transfer completed");
        Ok(self.dest)
    }

    /// Returns the number of content bytes buffered so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Returns the destination path this transfer resolves to.
    pub fn dest(&self) -> &Path {
        &self.dest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphsync_protocol::ProtocolError;

    fn container(name: &str, size: u64) -> FileContainer {
        FileContainer::new("node-1", name, size)
    }

    fn chunk(sequence: u32, file_size: u64, data: &[u8]) -> FileChunk {
        FileChunk::new("node-1", sequence, file_size, data.to_vec())
    }

    #[test]
    fn reassembles_chunks_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut assembler =
            FileAssembler::begin(dir.path(), &container("out.bin", 10)).unwrap();

        assembler.add_chunk(&chunk(0, 10, b"hello ")).unwrap();
        assembler.add_chunk(&chunk(1, 10, b"world")).unwrap();
        let path = assembler.finish(&FileEnd::new("node-1", 10)).unwrap();

        assert_eq!(std::fs::read(path).unwrap(), b"hello world");
    }

    #[test]
    fn sequence_gap_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut assembler =
            FileAssembler::begin(dir.path(), &container("out.bin", 10)).unwrap();

        assembler.add_chunk(&chunk(0, 10, b"aa")).unwrap();
        let err = assembler.add_chunk(&chunk(2, 10, b"bb")).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Violation(ProtocolError::SequenceMismatch {
                expected: 1,
                received: 2
            })
        ));
    }

    #[test]
    fn size_drift_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut assembler =
            FileAssembler::begin(dir.path(), &container("out.bin", 10)).unwrap();

        assembler.add_chunk(&chunk(0, 10, b"aa")).unwrap();
        let err = assembler.add_chunk(&chunk(1, 12, b"bb")).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Violation(ProtocolError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn end_marker_size_mismatch_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut assembler =
            FileAssembler::begin(dir.path(), &container("out.bin", 4)).unwrap();

        assembler.add_chunk(&chunk(0, 4, b"data")).unwrap();
        let err = assembler.finish(&FileEnd::new("node-1", 5)).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Violation(ProtocolError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn overwrites_an_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.bin");
        std::fs::write(&dest, b"stale").unwrap();

        let mut assembler =
            FileAssembler::begin(dir.path(), &container("out.bin", 3)).unwrap();
        assembler.add_chunk(&chunk(0, 3, b"new")).unwrap();
        assembler.finish(&FileEnd::new("node-1", 3)).unwrap();

        assert_eq!(std::fs::read(dest).unwrap(), b"new");
    }

    #[test]
    fn creates_nested_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut assembler =
            FileAssembler::begin(dir.path(), &container("a/b/out.bin", 2)).unwrap();

        assembler.add_chunk(&chunk(0, 2, b"ok")).unwrap();
        let path = assembler.finish(&FileEnd::new("node-1", 2)).unwrap();

        assert_eq!(path, dir.path().join("a/b/out.bin"));
        assert_eq!(std::fs::read(path).unwrap(), b"ok");
    }

    #[test]
    fn empty_file_transfer() {
        let dir = tempfile::tempdir().unwrap();
        let assembler = FileAssembler::begin(dir.path(), &container("empty", 0)).unwrap();
        let path = assembler.finish(&FileEnd::new("node-1", 0)).unwrap();

        assert_eq!(std::fs::read(path).unwrap(), b"");
    }
}
