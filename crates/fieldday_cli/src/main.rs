//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `fieldday_core` linkage.
//! - Print the progression summary of an existing database when one is given.

use std::process::ExitCode;

fn main() -> ExitCode {
    println!("fieldday_core ping={}", fieldday_core::ping());
    println!("fieldday_core version={}", fieldday_core::core_version());

    let Some(db_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };
    match fieldday_core::Engine::open(&db_path) {
        Ok(engine) => {
            println!("{}", engine.export_summary());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("fieldday_core open failed path={db_path} error={err}");
            ExitCode::FAILURE
        }
    }
}
