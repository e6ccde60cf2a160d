//! Console output helpers for experiment progress and metric lines

use colored::Colorize;

fn dim(s: &str) -> colored::ColoredString {
    s.truecolor(100, 100, 100)
}

/// Print a section header with a rule underneath.
pub fn section(title: &str) {
    println!();
    println!("{}", title.white().bold());
    println!("{}", dim(&"─".repeat(40)));
}

/// Print one named metric value.
pub fn metric(name: &str, value: f64) {
    println!("- {}: {}", name.truecolor(140, 140, 140), value);
}

/// Print a model name with its best cross-validated score.
pub fn model_score(name: &str, score: f64) {
    println!("{}", name);
    println!("R2 score: {}\n", score);
}
