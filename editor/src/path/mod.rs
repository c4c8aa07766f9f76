//! Contains data structures to deal with paths inside a versioned tree.
use std::{
    fmt::{self, Debug, Display},
    str::FromStr,
};

mod component;
pub use component::PathComponent;

use crate::ValidateNodeError;

/// A path relative to the root of a versioned tree, or relative to some node
/// inside it.
/// These are always relative and platform-independent, and made up of
/// [PathComponent]s separated by slashes. The empty path addresses the node
/// it is relative to.
#[derive(Clone, Default, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct RelPath {
    components: Vec<PathComponent>,
}

impl RelPath {
    /// The empty path.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    /// Provides an iterator over the components of the path.
    /// In case the path is empty, an empty iterator is returned.
    pub fn components(&self) -> impl DoubleEndedIterator<Item = &PathComponent> {
        self.components.iter()
    }
}

impl FromIterator<PathComponent> for RelPath {
    fn from_iter<T: IntoIterator<Item = PathComponent>>(iter: T) -> Self {
        Self {
            components: iter.into_iter().collect(),
        }
    }
}

impl FromStr for RelPath {
    type Err = ValidateNodeError;

    fn from_str(s: &str) -> Result<RelPath, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        s.split('/').map(PathComponent::try_from).collect()
    }
}

impl Display for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, component) in self.components.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            Display::fmt(component, f)?;
        }
        Ok(())
    }
}

impl Debug for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Debug::fmt(&self.to_string(), f)
    }
}
