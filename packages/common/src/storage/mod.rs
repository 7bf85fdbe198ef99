mod error;
mod paths;

pub mod ids;
pub mod tree;

pub use error::StorageError;
pub use paths::WorkPaths;
pub use tree::WorkStore;
