pub mod catalog;
pub mod chapter;

pub use catalog::ChapterCatalog;
pub use chapter::{Chapter, Difficulty, TAB_WIDTH};
