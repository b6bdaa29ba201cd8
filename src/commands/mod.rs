pub mod check;
pub mod import;
pub mod run;

// Re-export command functions for convenience
pub use check::check;
pub use import::import;
pub use run::run;
