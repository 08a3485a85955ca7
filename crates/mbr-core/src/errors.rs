/// Core error type for the reaction dispatcher.
///
/// Adapter crates map their transport errors into this type so the core can
/// decide what is fatal (startup) and what is recovered locally (poll, verify).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("no working identities")]
    NoWorkingIdentities,

    #[error("backend unreachable: {0}")]
    Unreachable(String),

    #[error("credential rejected: {0}")]
    InvalidCredential(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("cycle aborted: {0}")]
    CycleAborted(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Startup errors end the process; everything else is recovered by a caller.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config(_) | Error::NoWorkingIdentities)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_startup_errors_are_fatal() {
        assert!(Error::Config("x".into()).is_fatal());
        assert!(Error::NoWorkingIdentities.is_fatal());
        assert!(!Error::Unreachable("timeout".into()).is_fatal());
        assert!(!Error::Backend("Bad Gateway".into()).is_fatal());
        assert!(!Error::CycleAborted("panic".into()).is_fatal());
    }
}
