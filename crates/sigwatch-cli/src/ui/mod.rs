//! Terminal output

pub mod console;

pub use console::ConsoleReporter;
