use anyhow::Result;

use crate::db::Database;

pub fn run(db: &Database, department: Option<&str>) -> Result<()> {
    let issues = match department {
        Some(name) => db.list_by_department(name)?,
        None => db.list_issues()?,
    };

    if issues.is_empty() {
        println!("No issues found.");
        return Ok(());
    }

    for issue in issues {
        let status_display = format!("[{}]", issue.status);
        let photo = if issue.image_path.is_some() { "photo" } else { "" };
        println!(
            "#{:<4} {:10} {:<16} {:<36} {:<14} {}",
            issue.id,
            status_display,
            truncate(&issue.category, 16),
            truncate(&issue.description, 36),
            truncate(&issue.department, 14),
            photo
        );
    }

    Ok(())
}

fn truncate(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars - 3).collect();
        format!("{}...", truncated)
    }
}
