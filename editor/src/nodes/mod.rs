//! This holds types describing the content of nodes in a versioned tree.
mod file_body;
mod symlink_target;

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use bytes::Bytes;

use crate::{PathRev, ValidateNodeError};
pub use file_body::FileBody;
pub use symlink_target::SymlinkTarget;

/// Versioned properties of a node, by name.
pub type Properties = BTreeMap<String, Bytes>;

/// The kind of a node.
///
/// [NodeKind::Unknown] only ever appears on content that purely refers to
/// other, committed content, where the kind is taken from the referenced
/// node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Dir,
    File,
    Symlink,
    Unknown,
}

impl NodeKind {
    /// Whether this is one of the kinds a node in a tree can have.
    pub fn is_known(&self) -> bool {
        !matches!(self, NodeKind::Unknown)
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Dir => "dir",
            NodeKind::File => "file",
            NodeKind::Symlink => "symlink",
            NodeKind::Unknown => "unknown",
        })
    }
}

/// The kind-specific part of a node's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeBody {
    File(FileBody),
    Symlink(SymlinkTarget),
}

impl NodeBody {
    fn name(&self) -> &'static str {
        match self {
            NodeBody::File(_) => "file",
            NodeBody::Symlink(_) => "symlink",
        }
    }

    fn dup(&self) -> Self {
        match self {
            NodeBody::File(body) => NodeBody::File(body.dup()),
            NodeBody::Symlink(target) => NodeBody::Symlink(target.dup()),
        }
    }
}

/// The content of a node: its kind, properties and body.
///
/// Content may refer to a node in a committed revision. Fields which are not
/// set are then inherited from the referenced node, so content holding only a
/// reference means "the same content as over there".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeContent {
    kind: NodeKind,
    reference: Option<PathRev>,
    /// [None] means inherited from the reference, or empty without one.
    properties: Option<Properties>,
    /// [None] means inherited from the reference, or not yet set.
    body: Option<NodeBody>,
}

impl NodeContent {
    pub fn dir(properties: Properties) -> Self {
        Self {
            kind: NodeKind::Dir,
            reference: None,
            properties: Some(properties),
            body: None,
        }
    }

    pub fn file(properties: Properties, body: FileBody) -> Self {
        Self {
            kind: NodeKind::File,
            reference: None,
            properties: Some(properties),
            body: Some(NodeBody::File(body)),
        }
    }

    pub fn symlink(properties: Properties, target: SymlinkTarget) -> Self {
        Self {
            kind: NodeKind::Symlink,
            reference: None,
            properties: Some(properties),
            body: Some(NodeBody::Symlink(target)),
        }
    }

    /// Content inheriting everything from the node at `reference`.
    pub fn reference(reference: PathRev) -> Self {
        Self {
            kind: NodeKind::Unknown,
            reference: Some(reference),
            properties: None,
            body: None,
        }
    }

    /// The content of a freshly created node of the given kind: no
    /// properties, an empty text for files, and no target for symlinks.
    pub fn empty(kind: NodeKind) -> Self {
        Self {
            kind,
            reference: None,
            properties: Some(Properties::new()),
            body: match kind {
                NodeKind::File => Some(NodeBody::File(FileBody::new(Bytes::new()))),
                _ => None,
            },
        }
    }

    /// Sets the reference fields not set here are inherited from.
    pub fn with_reference(self, reference: PathRev) -> Self {
        Self {
            reference: Some(reference),
            ..self
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn reference_loc(&self) -> Option<&PathRev> {
        self.reference.as_ref()
    }

    pub fn properties(&self) -> Option<&Properties> {
        self.properties.as_ref()
    }

    pub fn body(&self) -> Option<&NodeBody> {
        self.body.as_ref()
    }

    pub fn file_body(&self) -> Option<&FileBody> {
        match &self.body {
            Some(NodeBody::File(body)) => Some(body),
            _ => None,
        }
    }

    pub fn symlink_target(&self) -> Option<&SymlinkTarget> {
        match &self.body {
            Some(NodeBody::Symlink(target)) => Some(target),
            _ => None,
        }
    }

    /// Sets a property. On content inheriting its properties, this stops the
    /// inheritance: the result only carries the properties set explicitly.
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<Bytes>) {
        self.properties
            .get_or_insert_with(Properties::new)
            .insert(name.into(), value.into());
    }

    pub fn remove_property(&mut self, name: &str) -> Option<Bytes> {
        self.properties.as_mut()?.remove(name)
    }

    /// Checks the content is internally consistent: the body matches the
    /// kind, and content of unknown kind carries a reference. Files and
    /// symlinks need a body unless they inherit it from their reference.
    pub fn validate(&self) -> Result<(), ValidateNodeError> {
        match (self.kind, &self.body) {
            (NodeKind::Unknown, _) if self.reference.is_none() => {
                Err(ValidateNodeError::MissingReference)
            }
            (NodeKind::File | NodeKind::Symlink, None) if self.reference.is_none() => {
                Err(ValidateNodeError::MissingBody(self.kind))
            }
            (NodeKind::Unknown, Some(body))
            | (NodeKind::Dir, Some(body))
            | (NodeKind::File, Some(body @ NodeBody::Symlink(_)))
            | (NodeKind::Symlink, Some(body @ NodeBody::File(_))) => {
                Err(ValidateNodeError::UnexpectedBody {
                    kind: self.kind,
                    body: body.name(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Checks the content can describe a node of kind `expected`.
    /// Content of unknown kind passes, its kind is only known once the
    /// reference is resolved.
    pub fn check_kind(&self, expected: NodeKind) -> Result<(), ValidateNodeError> {
        if self.kind.is_known() && self.kind != expected {
            return Err(ValidateNodeError::KindMismatch {
                expected,
                actual: self.kind,
            });
        }
        Ok(())
    }

    /// Fills in everything not set here from `referenced`, the content of
    /// the node [Self::reference_loc] points to.
    /// The returned content doesn't carry a reference anymore.
    pub fn resolve(&self, referenced: &NodeContent) -> Result<NodeContent, ValidateNodeError> {
        if !referenced.kind.is_known() {
            return Err(ValidateNodeError::UnknownKind);
        }
        self.check_kind(referenced.kind)?;

        let resolved = NodeContent {
            kind: referenced.kind,
            reference: None,
            properties: self
                .properties
                .clone()
                .or_else(|| referenced.properties.clone()),
            body: self.body.clone().or_else(|| referenced.body.clone()),
        };
        resolved.validate()?;

        Ok(resolved)
    }

    /// Returns a deep copy, not sharing any buffers with self.
    pub fn dup(&self) -> Self {
        Self {
            kind: self.kind,
            reference: self.reference.clone(),
            properties: self.properties.as_ref().map(|properties| {
                properties
                    .iter()
                    .map(|(k, v)| (k.clone(), Bytes::copy_from_slice(v)))
                    .collect()
            }),
            body: self.body.as_ref().map(NodeBody::dup),
        }
    }
}

impl Display for NodeContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(reference) = &self.reference {
            write!(f, " ref={}", reference)?;
        }
        match &self.properties {
            Some(properties) => write!(f, " props={}", properties.len())?,
            None => write!(f, " props=inherit")?,
        }
        match &self.body {
            Some(NodeBody::File(body)) => {
                write!(f, " {} ({} bytes)", body.digest().short(), body.size())
            }
            Some(NodeBody::Symlink(target)) => write!(f, " -> {}", target),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use rstest::rstest;

    use super::{FileBody, NodeBody, NodeContent, NodeKind, Properties, SymlinkTarget};
    use crate::fixtures::{
        DIR_CONTENT, FILE_CONTENT_V1, FILE_CONTENT_V2, SYMLINK_CONTENT, TRUNK_R1,
    };
    use crate::ValidateNodeError;

    #[rstest]
    #[case::dir(&*DIR_CONTENT)]
    #[case::file(&*FILE_CONTENT_V1)]
    #[case::symlink(&*SYMLINK_CONTENT)]
    fn dup_is_equal(#[case] content: &NodeContent) {
        let dup = content.dup();
        assert_eq!(*content, dup);
    }

    #[test]
    fn dup_is_independent() {
        let original = FILE_CONTENT_V1.clone();
        let mut dup = original.dup();
        dup.set_property("svn:eol-style", "native");
        dup.remove_property("svn:mime-type");

        assert_ne!(original, dup);
        assert_eq!(*FILE_CONTENT_V1, original);
    }

    #[test]
    fn bodies_compare_by_content() {
        assert_ne!(*FILE_CONTENT_V1, *FILE_CONTENT_V2);
        assert_eq!(
            NodeContent::file(Properties::new(), FileBody::new(Bytes::from_static(b"x"))),
            NodeContent::file(Properties::new(), FileBody::new(b"x".to_vec())),
        );
    }

    #[rstest]
    #[case::dir(NodeContent::dir(Properties::new()), Ok(()))]
    #[case::reference(NodeContent::reference(TRUNK_R1.clone()), Ok(()))]
    #[case::empty_file(NodeContent::empty(NodeKind::File), Ok(()))]
    #[case::empty_symlink(
        NodeContent::empty(NodeKind::Symlink),
        Err(ValidateNodeError::MissingBody(NodeKind::Symlink))
    )]
    #[case::symlink_inheriting_target(
        NodeContent::empty(NodeKind::Symlink).with_reference(TRUNK_R1.clone()),
        Ok(())
    )]
    #[case::unknown_without_reference(
        NodeContent {
            kind: NodeKind::Unknown,
            reference: None,
            properties: None,
            body: None,
        },
        Err(ValidateNodeError::MissingReference)
    )]
    fn validate(#[case] content: NodeContent, #[case] exp: Result<(), ValidateNodeError>) {
        assert_eq!(exp, content.validate());
    }

    #[test]
    fn validate_rejects_mismatched_body() {
        let content = NodeContent {
            kind: NodeKind::Dir,
            reference: None,
            properties: None,
            body: Some(NodeBody::Symlink(SymlinkTarget::try_from("a").unwrap())),
        };
        assert_eq!(
            Err(ValidateNodeError::UnexpectedBody {
                kind: NodeKind::Dir,
                body: "symlink"
            }),
            content.validate()
        );
    }

    #[test]
    fn resolve_inherits_unset_fields() {
        let mut content = NodeContent::reference(TRUNK_R1.clone());
        content.set_property("k", "v");

        let resolved = content.resolve(&FILE_CONTENT_V1).expect("must resolve");
        assert_eq!(NodeKind::File, resolved.kind());
        assert_eq!(None, resolved.reference_loc());
        assert_eq!(1, resolved.properties().unwrap().len());
        assert_eq!(FILE_CONTENT_V1.file_body(), resolved.file_body());
    }

    #[test]
    fn resolve_rejects_kind_mismatch() {
        let content = DIR_CONTENT.clone().with_reference(TRUNK_R1.clone());
        assert_eq!(
            Err(ValidateNodeError::KindMismatch {
                expected: NodeKind::File,
                actual: NodeKind::Dir
            }),
            content.resolve(&FILE_CONTENT_V1)
        );
    }
}
