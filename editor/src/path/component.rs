use crate::ValidateNodeError;

use bstr::ByteSlice;
use std::fmt::{self, Debug, Display};

/// A single, canonical path segment: the name of a node inside its parent
/// directory.
/// Internally uses a [bytes::Bytes], but disallows slashes and null bytes to
/// be present, as well as '.', '..' and the empty string.
#[repr(transparent)]
#[derive(Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct PathComponent {
    pub(super) inner: bytes::Bytes,
}

impl PathComponent {
    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }
}

impl AsRef<[u8]> for PathComponent {
    fn as_ref(&self) -> &[u8] {
        self.inner.as_ref()
    }
}

impl From<PathComponent> for bytes::Bytes {
    fn from(value: PathComponent) -> Self {
        value.inner
    }
}

pub(super) fn is_valid_name<B: AsRef<[u8]>>(name: B) -> bool {
    let v = name.as_ref();

    !v.is_empty() && v != *b".." && v != *b"." && !v.contains(&0x00) && !v.contains(&b'/')
}

impl TryFrom<bytes::Bytes> for PathComponent {
    type Error = ValidateNodeError;

    fn try_from(value: bytes::Bytes) -> Result<Self, Self::Error> {
        if !is_valid_name(&value) {
            return Err(ValidateNodeError::InvalidName(value));
        }

        Ok(Self { inner: value })
    }
}

impl TryFrom<&[u8]> for PathComponent {
    type Error = ValidateNodeError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::try_from(bytes::Bytes::copy_from_slice(value))
    }
}

impl TryFrom<&str> for PathComponent {
    type Error = ValidateNodeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.as_bytes())
    }
}

impl Debug for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Debug::fmt(self.inner.as_bstr(), f)
    }
}

impl Display for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(self.inner.as_bstr(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::PathComponent;
    use rstest::rstest;

    #[rstest]
    #[case::simple("trunk")]
    #[case::dotfile(".keep")]
    #[case::dots("...")]
    #[case::space("a b")]
    fn valid(#[case] name: &str) {
        let c = PathComponent::try_from(name).expect("must succeed");
        assert_eq!(name.as_bytes(), c.as_bytes());
    }

    #[rstest]
    #[case::empty("")]
    #[case::dot(".")]
    #[case::dotdot("..")]
    #[case::slash("a/b")]
    #[case::trailing_slash("a/")]
    #[case::null("fo\0o")]
    fn invalid(#[case] name: &str) {
        PathComponent::try_from(name).expect_err("must fail");
    }
}
