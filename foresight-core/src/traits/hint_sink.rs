use crate::models::ResourceHint;

/// The document that receives resource hint declarations.
///
/// Only the resource hint manager calls into this, and only from within
/// its scheduling pass.
pub trait IHintSink: Send + Sync {
    /// Add a `<link rel=...>` style declaration for `hint`.
    fn apply(&self, hint: &ResourceHint);

    /// Remove a previously applied declaration.
    fn remove(&self, hint: &ResourceHint);
}
