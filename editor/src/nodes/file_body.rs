use std::fmt::{self, Debug};
use std::io::Read;

use bytes::Bytes;

use crate::{B3Digest, B3HashingReader};

/// The text of a file: its blake3 checksum and the bytes it was computed
/// over.
///
/// Bodies are compared by reading them fully, never by identity of the
/// underlying buffer.
#[derive(Clone)]
pub struct FileBody {
    digest: B3Digest,
    data: Bytes,
}

impl FileBody {
    pub fn new(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            digest: B3Digest::of(&data),
            data,
        }
    }

    /// Reads `r` until EOF, hashing the data while it passes through.
    pub fn from_reader<R: Read>(r: R) -> std::io::Result<Self> {
        let mut hr = B3HashingReader::from(r);
        let mut data = Vec::new();
        hr.read_to_end(&mut data)?;

        Ok(Self {
            digest: hr.digest().into(),
            data: data.into(),
        })
    }

    pub fn digest(&self) -> &B3Digest {
        &self.digest
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Returns a copy not sharing the underlying buffer.
    pub fn dup(&self) -> Self {
        Self {
            digest: self.digest.clone(),
            data: Bytes::copy_from_slice(&self.data),
        }
    }
}

impl PartialEq for FileBody {
    fn eq(&self, other: &Self) -> bool {
        // Compare the checksum first, it's cheap, then the full contents.
        self.digest == other.digest && self.data[..] == other.data[..]
    }
}

impl Eq for FileBody {}

impl Debug for FileBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileBody")
            .field("digest", &self.digest)
            .field("size", &self.size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::FileBody;
    use crate::fixtures::{BLOB_B, HELLOWORLD_BLOB_CONTENTS};
    use crate::B3Digest;

    #[test]
    fn from_reader_matches_new() {
        let from_reader = FileBody::from_reader(&BLOB_B[..]).expect("must succeed");
        let new = FileBody::new(BLOB_B.clone());

        assert_eq!(new, from_reader);
        assert_eq!(B3Digest::of(&BLOB_B), *from_reader.digest());
        assert_eq!(BLOB_B.len() as u64, from_reader.size());
    }

    #[test]
    fn dup_does_not_share_buffer() {
        let body = FileBody::new(HELLOWORLD_BLOB_CONTENTS);
        let dup = body.dup();

        assert_eq!(body, dup);
        assert_ne!(body.data.as_ptr(), dup.data.as_ptr());
    }

    #[test]
    fn different_bodies_differ() {
        assert_ne!(FileBody::new(&b"a"[..]), FileBody::new(&b"b"[..]));
    }
}
