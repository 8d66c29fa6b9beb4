use thiserror::Error;

/// Where a session lookup searched before giving up. Surfaced in the
/// not-found message so users know whether cloud sync was even attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupScope {
    /// No remote store configured; only local history was searched.
    LocalOnly,
    /// Remote store configured; both the remote and local history missed.
    CloudAndLocal,
}

impl std::fmt::Display for LookupScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupScope::LocalOnly => write!(f, "local storage only"),
            LookupScope::CloudAndLocal => write!(f, "cloud and local storage"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("session \"{id}\" not found in {scope}; verify the code is correct")]
    SessionNotFound { id: String, scope: LookupScope },

    #[error("session \"{0}\" is no longer accepting votes")]
    SessionClosed(String),

    #[error("no votes yet; wait for at least one participant before revealing")]
    NoVotes,

    #[error("remote store error: {0}")]
    Remote(#[from] crate::remote::RemoteError),

    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;
