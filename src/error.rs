use thiserror::Error;

/// Errors reported by [`AvlTree`](crate::AvlTree).
///
/// Looking up or removing a key that is not stored is not an error;
/// those operations report `None` or `false` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The smallest or largest key was requested from an empty tree.
    #[error("tree is empty")]
    EmptyTree,
}

pub type Result<T> = std::result::Result<T, Error>;
