use std::fmt;

use thiserror::Error;

/// Which reconciliation step an [`Error::Sync`] failure occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOp {
    Create,
    Delete,
    Link,
    Unlink,
}

impl fmt::Display for SyncOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            SyncOp::Create => "create",
            SyncOp::Delete => "delete",
            SyncOp::Link => "link",
            SyncOp::Unlink => "unlink",
        };
        f.write_str(op)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("not found")]
    NotFound,

    #[error("already exists")]
    AlreadyExists,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A reconciliation step failed hard enough to abort the whole save
    /// or delete. The caller's transaction should roll back.
    #[error("tag {op} failed for '{name}'")]
    Sync {
        op: SyncOp,
        name: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub(crate) fn sync(op: SyncOp, name: impl Into<String>, source: Error) -> Self {
        Error::Sync {
            op,
            name: name.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
