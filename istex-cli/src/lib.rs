// All core functionality is in istex-core
// This CLI acts as a thin wrapper around the core library

// CLI-specific modules
pub mod inputs;
pub mod logging;

// Re-export core types for convenience
pub use istex_core::*;
