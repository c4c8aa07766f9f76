use serde::Deserialize;

/// What resurrecting a node-branch that is still present in the transaction
/// does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResurrectPolicy {
    /// Fail with [crate::Error::AlreadyExists].
    #[default]
    Reject,
    /// Treat it like a move, restoring the content from the source.
    Alter,
}

/// Settings of the editors handed out by a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditorConfig {
    #[serde(default)]
    pub resurrect: ResurrectPolicy,

    /// Wrap the receiver in a [crate::TracingReceiver].
    #[serde(default)]
    pub trace: bool,
}
