pub mod passage_loader;

pub use passage_loader::{load_passages, parse_passages, PassageFormat};
