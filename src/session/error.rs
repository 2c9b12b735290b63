use thiserror::Error;

/// Rejected input updates. The session is left untouched when one is returned.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("input is {len} characters but the target is only {max}")]
    InputOverflow { len: usize, max: usize },
    #[error("unsupported character {ch:?} at position {position}")]
    UnsupportedChar { position: usize, ch: char },
}
