//! Process exit codes.

use sigwatch_core::{Error, RunReport};

/// Every processed version verified.
pub const OK: u8 = 0;
/// A signature, integrity or fetch failure.
pub const FAILURE: u8 = 1;
/// Configuration or storage is unusable; nothing can be trusted.
pub const SYSTEMIC: u8 = 2;

pub fn for_report(report: &RunReport) -> u8 {
    if report.is_success() { OK } else { FAILURE }
}

pub fn for_error(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<Error>() {
        Some(e) if e.is_systemic() => SYSTEMIC,
        _ => FAILURE,
    }
}
