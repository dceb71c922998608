pub mod style;
pub mod terminal;

pub use terminal::{ConsoleObserver, ConsolePrompter};
