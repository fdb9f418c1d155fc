use console::style;
use loopbot_core::traits::{ChatMessage, Role};
use std::io::{self, Write};

const RULE_WIDTH: usize = 80;

fn title(role: Role) -> &'static str {
    match role {
        Role::System => " System Message ",
        Role::User => " Human Message ",
        Role::Assistant => " Ai Message ",
        Role::Tool => " Tool Message ",
    }
}

fn header(role: Role) -> String {
    let title = title(role);
    let fill = RULE_WIDTH.saturating_sub(title.len());
    let left = "=".repeat(fill / 2);
    let right = "=".repeat(fill - fill / 2);
    format!("{left}{title}{right}")
}

/// Full-width transcript block for one message, used by `react`.
pub fn format_message(message: &ChatMessage) -> String {
    let mut out = header(message.role);
    out.push('\n');

    if let Some(id) = &message.tool_call_id {
        out.push_str(&format!("Call ID: {id}\n"));
    }
    if !message.content.is_empty() {
        out.push('\n');
        out.push_str(&message.content);
        out.push('\n');
    }
    if !message.pending_tool_calls().is_empty() {
        out.push_str("Tool Calls:\n");
        for call in message.pending_tool_calls() {
            out.push_str(&format!("  {} ({})\n", call.name, call.id));
            out.push_str(&format!("    Args: {}\n", call.arguments));
        }
    }
    out
}

pub fn print_message(message: &ChatMessage) {
    let block = format_message(message);
    let (head, body) = block.split_once('\n').unwrap_or((block.as_str(), ""));
    println!("{}", style(head).bold());
    print!("{body}");
}

pub fn write_reply(out: &mut impl Write, reply: &str) -> io::Result<()> {
    writeln!(out, "\n{} {}", style("AI:").green().bold(), reply)
}
