//! Terminal UI helpers for task display.
//!
//! This module uses println! for CLI output, which is appropriate
//! for terminal user interfaces.

#![allow(clippy::disallowed_macros)]

use colored::Colorize;
use comfy_table::{Cell, Color, ContentArrangement, Table};

use crate::entities::{Propagation, Subtask, Task, TaskPriority, TaskStatus};
use crate::time;

/// Get colored status string
pub fn status_colored(status: TaskStatus) -> String {
    match status {
        TaskStatus::Started => "started".cyan().to_string(),
        TaskStatus::Paused => "paused".yellow().to_string(),
        TaskStatus::Completed => "completed".green().to_string(),
    }
}

/// Get colored priority string
pub fn priority_colored(priority: TaskPriority) -> String {
    match priority {
        TaskPriority::Low => "low".dimmed().to_string(),
        TaskPriority::Medium => "medium".normal().to_string(),
        TaskPriority::High => "high".red().bold().to_string(),
    }
}

const fn status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Started => Color::Cyan,
        TaskStatus::Paused => Color::Yellow,
        TaskStatus::Completed => Color::Green,
    }
}

const fn priority_color(priority: TaskPriority) -> Color {
    match priority {
        TaskPriority::Low => Color::DarkGrey,
        TaskPriority::Medium => Color::White,
        TaskPriority::High => Color::Red,
    }
}

/// Create a table for displaying tasks
pub fn task_table(tasks: &[Task], show_subtasks: bool) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::Cyan),
        Cell::new("Title").fg(Color::Cyan),
        Cell::new("Priority").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
        Cell::new("Deadline").fg(Color::Cyan),
        Cell::new("Duration").fg(Color::Cyan),
        Cell::new("Subtasks").fg(Color::Cyan),
    ]);

    for task in tasks {
        let progress = match task.subtask_progress() {
            (_, 0) => "-".to_string(),
            (done, total) => format!("{done}/{total}"),
        };

        table.add_row(vec![
            Cell::new(&task.id),
            Cell::new(&task.title),
            Cell::new(task.priority.to_string()).fg(priority_color(task.priority)),
            Cell::new(task.status.to_string()).fg(status_color(task.status)),
            Cell::new(time::format_date(task.effective_deadline())),
            Cell::new(task.duration_display()),
            Cell::new(progress),
        ]);

        if show_subtasks {
            for subtask in &task.subtasks {
                table.add_row(vec![
                    Cell::new(format!("  {}", subtask.full_id())).fg(Color::DarkGrey),
                    Cell::new(format!("  └─ {}", subtask.title)).fg(Color::DarkGrey),
                    Cell::new("-"),
                    Cell::new(subtask.status.to_string()).fg(status_color(subtask.status)),
                    Cell::new(time::format_date(subtask.deadline)),
                    Cell::new(subtask.duration_display()),
                    Cell::new("-"),
                ]);
            }
        }
    }

    table
}

/// Display task details in a formatted way
pub fn display_task_details(task: &Task) {
    println!("{}", "═".repeat(60).dimmed());
    println!(
        "{} {} {}",
        "Task".cyan().bold(),
        task.id.cyan().bold(),
        format!("[{}]", task.status).yellow()
    );
    println!("{}", "═".repeat(60).dimmed());
    println!();

    println!("{}: {}", "Title".bold(), task.title);
    println!("{}: {}", "Status".bold(), status_colored(task.status));
    println!("{}: {}", "Priority".bold(), priority_colored(task.priority));
    println!(
        "{}: {}",
        "Deadline".bold(),
        time::format_date(task.effective_deadline())
    );
    println!("{}: {}", "Started".bold(), time::format_date(task.started_at));
    if let Some(ended) = task.ended_at {
        println!("{}: {}", "Ended".bold(), time::format_date(ended));
    }
    println!("{}: {}", "Duration".bold(), task.duration_display());

    if let Some(ref description) = task.description {
        println!();
        println!("{}", "Description".bold().underline());
        println!("{description}");
    }

    if !task.subtasks.is_empty() {
        let (done, total) = task.subtask_progress();
        println!();
        println!("{} ({done}/{total})", "Subtasks".bold().underline());
        for subtask in &task.subtasks {
            display_subtask_line(subtask);
        }
    }

    println!();
}

fn display_subtask_line(subtask: &Subtask) {
    let check = if subtask.is_completed() {
        "✓".green()
    } else {
        "•".dimmed()
    };
    println!(
        "  {} {} - {} [{}] due {} ({})",
        check,
        subtask.full_id(),
        subtask.title,
        status_colored(subtask.status),
        time::format_date(subtask.deadline),
        subtask.duration_display()
    );
}

/// Human-readable account of what a status change did to the parent task
pub fn describe_propagation(task_id: &str, propagation: Propagation) -> Option<String> {
    match propagation {
        Propagation::Unchanged => None,
        Propagation::ParentCompleted => Some(format!(
            "All subtasks completed, task {task_id} marked as completed"
        )),
        Propagation::ParentReopened => Some(format!("Task {task_id} reopened")),
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}
