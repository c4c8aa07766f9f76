use bytes::Bytes;
use data_encoding::BASE64;

/// The blake3 digest of a file body.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct B3Digest(Bytes);

pub const B3_LEN: usize = 32;

impl B3Digest {
    pub fn of(data: &[u8]) -> Self {
        blake3::hash(data).into()
    }

    /// Returns the first few characters of the textual form, for log lines.
    pub fn short(&self) -> String {
        let mut s = BASE64.encode(&self.0);
        s.truncate(8);
        format!("b3:{}", s)
    }
}

impl From<blake3::Hash> for B3Digest {
    fn from(value: blake3::Hash) -> Self {
        Self(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl From<digest::Output<blake3::Hasher>> for B3Digest {
    fn from(value: digest::Output<blake3::Hasher>) -> Self {
        let v = Into::<[u8; B3_LEN]>::into(value);
        Self(Bytes::copy_from_slice(&v))
    }
}

impl std::fmt::Display for B3Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "b3:{}", BASE64.encode(&self.0))
    }
}

impl std::fmt::Debug for B3Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "b3:{}", BASE64.encode(&self.0))
    }
}
