//! Summary prompt construction

use std::path::Path;

use crate::transcript::{Message, Todo, TodoStatus};

pub const GLYPH_COMPLETED: &str = "■";
pub const GLYPH_IN_PROGRESS: &str = "▶";
pub const GLYPH_PENDING: &str = "□";

pub fn status_glyph(status: &TodoStatus) -> &'static str {
    match status {
        TodoStatus::Completed => GLYPH_COMPLETED,
        TodoStatus::InProgress => GLYPH_IN_PROGRESS,
        _ => GLYPH_PENDING,
    }
}

/// One bullet line per todo: `  <glyph> <content>`
pub fn format_todos(todos: &[Todo]) -> String {
    todos
        .iter()
        .map(|t| format!("  {} {}", status_glyph(&t.status), t.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `ROLE: content` blocks separated by blank lines
pub fn format_conversation(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}\n", m.role.as_str().to_uppercase(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prompt handed to the summary command on stdin.
pub fn build_summary_prompt(project_dir: &Path, messages: &[Message], todos: &[Todo]) -> String {
    let dir = project_dir.display();
    let conversation = format_conversation(messages);

    let todos_section = if todos.is_empty() {
        String::new()
    } else {
        format!(
            "\n# Current Todo List (from session):\n\
             The following is the EXACT todo list from the session. Include ALL items in your handoff summary, preserving EXACT wording:\n\n\
             {}\n\n",
            format_todos(todos)
        )
    };

    format!(
        "You are creating a handoff summary for a coding session in project directory: `{dir}`\n\n\
         Start with a line `Title: <short title>` naming the work.\n\n\
         Analyze this conversation and create a comprehensive handoff document that includes:\n\n\
         1. **Session Overview**: What was being worked on?\n\
         2. **Key Decisions**: Important technical decisions made\n\
         3. **Work Completed**: What was successfully implemented\n\
         4. **Pending Tasks**: What remains to be done\n\
         5. **Todo List**: List ALL todo items from the \"Current Todo List\" section verbatim, keeping the markers ({GLYPH_COMPLETED}/{GLYPH_IN_PROGRESS}/{GLYPH_PENDING})\n\
         6. **Context for Next Session**: Critical information the next person needs to know\n\
         7. **Files Modified**: Key files that were changed (if mentioned), as paths under `{dir}`\n\n\
         Be concise but thorough. Format the output in markdown.\n\
         {todos_section}\
         # Conversation:\n\n\
         {conversation}\n\
         # Handoff Summary:"
    )
}
