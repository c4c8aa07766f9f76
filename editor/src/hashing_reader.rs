use std::io::Read;

/// Wraps an existing [Read], and allows querying for the digest of all data
/// read "through" it.
/// The hash function is configurable by type parameter.
pub struct HashingReader<R, H>
where
    R: Read,
    H: digest::Digest,
{
    inner: R,
    hasher: H,
}

pub type B3HashingReader<R> = HashingReader<R, blake3::Hasher>;

impl<R, H> HashingReader<R, H>
where
    R: Read,
    H: digest::Digest,
{
    pub fn from(r: R) -> Self {
        Self {
            inner: r,
            hasher: H::new(),
        }
    }

    /// Return the digest.
    pub fn digest(self) -> digest::Output<H> {
        self.hasher.finalize()
    }
}

impl<R, H> Read for HashingReader<R, H>
where
    R: Read,
    H: digest::Digest,
{
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }
}
