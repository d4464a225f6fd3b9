//! Dataset acquisition for the tax engine.
//!
//! Sources fetch raw documents, [`DatasetLoader`] parses and validates them,
//! and [`DatasetStore`] keeps validated datasets per tax year.

mod loader;
mod source;
mod store;

pub use loader::{DatasetLoader, LoaderError};
pub use source::{
    DatasetDocument, DatasetSource, DirectorySource, EmbeddedSource, MemorySource, SourceError,
};
pub use store::{DatasetInfo, DatasetStore, shared_store};
