//! Lexical exercise generation: tiered Spanish word selection on top of an
//! unreliable text generator.

pub mod config;
pub mod error;
pub mod generate;
pub mod language;
pub mod store;
pub mod types;

pub use config::GenerationConfig;
pub use error::{GenerationError, GeneratorError};
pub use generate::{run_generation, WordGenerator};
pub use store::{ExerciseStore, JsonFileStore, MemoryStore};
pub use types::*;
