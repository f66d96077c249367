//! Output formatting utilities

use console::style;

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", style("[OK]").green().bold(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", style("[ERROR]").red().bold(), message);
}

/// Print a warning message
pub fn warning(message: &str) {
    println!("{} {}", style("[WARN]").yellow().bold(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", style("[INFO]").blue().bold(), message);
}

/// Print a bold section heading
pub fn heading(title: &str) {
    println!("\n{}\n", style(title).bold());
}

/// Print a labelled value, aligned under [`heading`]
pub fn field(label: &str, value: &str) {
    println!("  {} {}", style(format!("{:<12}", label)).dim(), value);
}
