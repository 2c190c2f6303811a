//! Random-access byte sources.
//!
//! Every read is fully described by an absolute offset and a length; no source
//! keeps a cursor. Sources are therefore safe to share between independent
//! parses without locking. Reading past the end of the available data is not an
//! error: the read simply returns fewer bytes than requested.
use std::{fmt, fs::File, io, path::Path, sync::Arc};

/// Largest buffer the default [`ByteSource::read`] allocates ahead of a read.
const READ_CHUNK: usize = 64 * 1024;

/// Read contract the engine relies on.
pub trait ByteSource: Send + Sync + fmt::Debug {
    /// Fill `buf` with bytes starting at `offset`. Returns how many bytes were
    /// actually available, `0..=buf.len()`.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Read up to `length` bytes at `offset`.
    ///
    /// The buffer grows one bounded chunk at a time, so a huge `length` costs
    /// no more memory than the bytes actually present.
    fn read(&self, offset: u64, length: usize) -> io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(length.min(READ_CHUNK));
        while buf.len() < length {
            let start = buf.len();
            let Some(position) = offset.checked_add(start as u64) else {
                break;
            };
            let step = (length - start).min(READ_CHUNK);
            buf.resize(start + step, 0);
            let read = self.read_at(position, &mut buf[start..])?;
            buf.truncate(start + read);
            if read < step {
                break;
            }
        }
        Ok(buf)
    }

    /// Returns true if `length` bytes can be read at `offset`.
    ///
    /// Available data is contiguous, so probing the last byte of the range is
    /// enough. Empty ranges are always available.
    fn is_available(&self, offset: u64, length: usize) -> io::Result<bool> {
        let Some(last) = length.checked_sub(1) else {
            return Ok(true);
        };
        let Some(position) = offset.checked_add(last as u64) else {
            return Ok(false);
        };
        Ok(self.read_at(position, &mut [0u8])? == 1)
    }
}

/// Byte source backed by an owned buffer.
#[derive(Clone)]
pub struct InMemorySource {
    data: Arc<[u8]>,
}

impl InMemorySource {
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self { data: data.into() }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for InMemorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InMemorySource({} bytes)", self.data.len())
    }
}

impl ByteSource for InMemorySource {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let Ok(start) = usize::try_from(offset) else {
            return Ok(0);
        };
        let Some(available) = self.data.get(start..) else {
            return Ok(0);
        };
        let count = available.len().min(buf.len());
        buf[..count].copy_from_slice(&available[..count]);
        Ok(count)
    }

    fn read(&self, offset: u64, length: usize) -> io::Result<Vec<u8>> {
        let available = usize::try_from(offset)
            .ok()
            .and_then(|start| self.data.get(start..))
            .unwrap_or_default();
        Ok(available[..available.len().min(length)].to_vec())
    }

    fn is_available(&self, offset: u64, length: usize) -> io::Result<bool> {
        Ok(usize::try_from(offset)
            .ok()
            .and_then(|start| start.checked_add(length))
            .is_some_and(|end| end <= self.data.len()))
    }
}

/// Byte source backed by a file, read with positional reads.
pub struct FileSource {
    file: File,
    len: u64,
}

impl FileSource {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self { file, len })
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[cfg(unix)]
    fn positional_read(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        std::os::unix::fs::FileExt::read_at(&self.file, buf, offset)
    }

    #[cfg(windows)]
    fn positional_read(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        std::os::windows::fs::FileExt::seek_read(&self.file, buf, offset)
    }
}

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileSource({} bytes)", self.len)
    }
}

impl ByteSource for FileSource {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            let position = offset + filled as u64;
            if position >= self.len {
                break;
            }
            match self.positional_read(position, &mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    fn is_available(&self, offset: u64, length: usize) -> io::Result<bool> {
        Ok(offset
            .checked_add(length as u64)
            .is_some_and(|end| end <= self.len))
    }
}
