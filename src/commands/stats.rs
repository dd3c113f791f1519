use anyhow::Result;

use crate::db::Database;

pub fn run(db: &Database) -> Result<()> {
    let stats = db.stats()?;
    println!("Total:    {}", stats.total);
    println!("Resolved: {}", stats.resolved);
    println!("Pending:  {}", stats.pending);

    let counts = db.category_counts()?;
    if !counts.is_empty() {
        println!("\nBy category:");
        for entry in counts {
            println!("  {:<24} {}", entry.category, entry.count);
        }
    }

    Ok(())
}
