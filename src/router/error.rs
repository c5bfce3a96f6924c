use thiserror::Error;

pub type RouterResult<T> = Result<T, RouterError>;

#[derive(Error, Debug)]
pub enum RouterError {
    /// An existing mount is a prefix of (or equal to) the requested one.
    #[error("cannot mount under existing mount '{existing}'")]
    NestedMount { existing: String },

    /// The requested mount is a prefix of an existing one.
    #[error("cannot mount over existing mount '{existing}'")]
    NestedUnder { existing: String },

    #[error("no mount at '{path}'")]
    NoMount { path: String },

    /// Unknown path, or a tainted mount refusing the operation. The two are
    /// reported identically.
    #[error("no handler for route '{path}'")]
    NoRoute { path: String },

    #[error(transparent)]
    Backend(anyhow::Error),
}

impl RouterError {
    pub fn is_nested_mount(&self) -> bool {
        matches!(self, Self::NestedMount { .. } | Self::NestedUnder { .. })
    }

    pub fn is_no_route(&self) -> bool {
        matches!(self, Self::NoRoute { .. })
    }
}
