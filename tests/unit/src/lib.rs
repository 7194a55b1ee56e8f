
pub mod clock_tests;
pub mod convergence_tests;

// Re-export fixture types for use across test modules
pub use fixtures::*;
