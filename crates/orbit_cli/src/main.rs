//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `orbit_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use orbit_core::db::migrations::latest_version;
use orbit_core::db::open_db_in_memory;

fn main() {
    println!("orbit_core version={}", orbit_core::core_version());

    match open_db_in_memory() {
        Ok(_) => println!("orbit_core schema_version={}", latest_version()),
        Err(err) => {
            eprintln!("orbit_core bootstrap failed: {err}");
            std::process::exit(1);
        }
    }
}
