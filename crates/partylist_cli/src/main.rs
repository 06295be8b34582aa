//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `partylist_core` linkage.
//! - Print the attendance summary of an existing store when one is configured.

use partylist_core::db::open_db;
use partylist_core::{AttendanceService, SqliteFamilyRepository};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("partylist_core ping={}", partylist_core::ping());
    println!("partylist_core version={}", partylist_core::core_version());

    let Some(db_path) = std::env::var_os("PARTYLIST_DB_PATH") else {
        return ExitCode::SUCCESS;
    };

    match print_summary(&db_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("partylist summary failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn print_summary(db_path: &std::ffi::OsStr) -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db(db_path)?;
    let service = AttendanceService::new(SqliteFamilyRepository::try_new(&conn)?);

    let families = service.list_families()?;
    let summary = service.attendance_summary()?;
    println!("families={}", families.len());
    println!(
        "attending adults={} children={} total={}",
        summary.attending_adults(),
        summary.attending_children(),
        summary.total_attending()
    );
    Ok(())
}
