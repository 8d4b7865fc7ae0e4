//! Plain-text rendering of tasks and profiles

use auth::Profile;
use tasks::Task;

pub fn profile_line(profile: &Profile) -> String {
    format!("{} <{}> (id {})", profile.display_name(), profile.email, profile.id)
}

/// One-line summary of a task
pub fn task_line(task: &Task) -> String {
    let mark = if task.is_complete { "x" } else { " " };
    let recipient = task
        .recipient
        .as_ref()
        .map(|recipient| recipient.email.as_str())
        .unwrap_or("-");
    let mut line = format!(
        "#{:<4} [{}] {}  {} -> {}  {}",
        task.id,
        mark,
        task.name,
        task.sender.email,
        recipient,
        task.created_at.format("%Y-%m-%d %H:%M")
    );
    if !task.files.is_empty() {
        line.push_str(&format!("  ({} files)", task.files.len()));
    }
    line
}

/// Multi-line detail of a task
pub fn task_detail(task: &Task) -> String {
    let mut out = task_line(task);
    if let Some(description) = task.description.as_deref().filter(|d| !d.is_empty()) {
        out.push_str("\n       ");
        out.push_str(description);
    }
    if let Some(completed_at) = task.completed_at {
        out.push_str(&format!(
            "\n       completed {}",
            completed_at.format("%Y-%m-%d %H:%M")
        ));
    }
    out
}
