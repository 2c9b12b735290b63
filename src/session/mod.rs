pub mod error;
pub mod input;
pub mod result;
pub mod typing;

pub use error::SessionError;
pub use result::{SessionResult, StatHistoryEntry};
pub use typing::{CharStatus, LiveStats, Mistake, SessionStatus, TypingSession};
