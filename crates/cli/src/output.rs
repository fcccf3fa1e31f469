//! Terminal output utilities
//!
//! Provides consistent formatting for CLI output.

use catalogue_search::record::HVA;
use catalogue_search::{RankedResult, SearchResponse};
use owo_colors::OwoColorize;

/// Status message helpers
pub struct Status;

impl Status {
    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        println!("{} {}", "ℹ".blue(), message);
    }

    /// Print a header
    pub fn header(message: &str) {
        println!();
        println!("{}", message.bold());
        println!("{}", "─".repeat(message.chars().count()));
    }
}

/// Format a duration for display
pub fn format_duration(duration: std::time::Duration) -> String {
    let micros = duration.as_micros();
    if micros < 1000 {
        return format!("{}µs", micros);
    }
    let secs = duration.as_secs_f32();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = (secs / 60.0).floor();
        let remaining_secs = secs % 60.0;
        format!("{}m {:.0}s", mins, remaining_secs)
    }
}

/// Format a count with singular/plural
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

/// Format a match score; lower is better
pub fn format_score(score: f64) -> String {
    format!("{:.3}", score)
}

/// One result as plain text: position, title, subtitle and score.
///
/// Service results whose impact levels include HVA get a marker.
pub fn result_line(position: usize, result: &RankedResult) -> String {
    let hva = result
        .as_service()
        .and_then(|service| service.provider.services_in_scope.get(&service.title))
        .is_some_and(|levels| levels.iter().any(|level| level == HVA));

    format!(
        "{:>2}. {}{} - {} ({})",
        position,
        result.title(),
        if hva { " [HVA]" } else { "" },
        result.subtitle(),
        format_score(result.score()),
    )
}

/// Print both result lists for a response
pub fn print_response(response: &SearchResponse) {
    let results = &response.results;
    if results.is_empty() {
        Status::warning(&format!("No matches for \"{}\"", response.q));
        return;
    }

    print_group("Providers", &results.provider_results);
    print_group("Services", &results.service_results);
}

fn print_group(label: &str, results: &[RankedResult]) {
    if results.is_empty() {
        return;
    }
    Status::header(&format!("{} ({})", label, results.len()));
    for (i, result) in results.iter().enumerate() {
        println!("{}", result_line(i + 1, result).cyan());
    }
}
