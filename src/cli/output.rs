use colored::Colorize;

/// Print a success message.
pub fn success(msg: &str) {
    println!("  {} {}", "✓".green(), msg);
}

/// Print a warning message.
pub fn warning(msg: &str) {
    println!("  {} {}", "⚠".yellow(), msg);
}

/// Print an error message.
pub fn error(msg: &str) {
    eprintln!("  {} {}", "✗".red(), msg);
}

/// Print a header line.
pub fn header(msg: &str) {
    println!("\n{}", msg.bold());
}

/// Print an indented key identifier.
pub fn key(identifier: &str) {
    println!("    • {}", identifier.dimmed());
}

/// Print an indented key identifier with a trailing note.
pub fn key_note(identifier: &str, note: &str) {
    println!("    • {} {}", identifier.dimmed(), format!("({note})").yellow());
}
