use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::db::Database;
use crate::server::DASHBOARD_FILE;
use crate::upload::UploadStore;

// Embed the default front-end at compile time
const DASHBOARD_HTML: &str = include_str!("../../resources/dashboard.html");

/// Creates the database schema, the public root with its upload directory,
/// and a starter dashboard page.
pub fn run(db_path: &Path, public_dir: &Path, force: bool) -> Result<()> {
    let db_existed = db_path.exists();
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Database::open(db_path)?;
    if db_existed {
        println!("Database {} is up to date", db_path.display());
    } else {
        println!("Created database {}", db_path.display());
    }

    let uploads = UploadStore::ensure(public_dir)?;
    println!("Upload directory ready at {}", uploads.dir().display());

    let dashboard = public_dir.join(DASHBOARD_FILE);
    let dashboard_exists = dashboard.exists();
    if !dashboard_exists || force {
        fs::write(&dashboard, DASHBOARD_HTML)
            .with_context(|| format!("Failed to write {}", dashboard.display()))?;
        if dashboard_exists {
            println!("Updated {} with the default dashboard", dashboard.display());
        } else {
            println!("Created {}", dashboard.display());
        }
    } else {
        println!("Keeping existing {} (use --force to replace it)", dashboard.display());
    }

    println!("CivicOne initialized successfully!");
    println!("\nNext steps:");
    println!("  civicone serve              # Start the HTTP server");

    Ok(())
}
