pub mod catalog;

// Re-export from catalog.rs so we can do "use crate::catalog::*;"
pub use catalog::*;
