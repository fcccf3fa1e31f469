//! Summary command - provider counts by type

use crate::load::load_catalogue;
use anyhow::Result;
use catalogue_search::ProviderRecord;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Totals for one provider type
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct TypeSummary {
    pub providers: usize,
    pub services: usize,
    pub hva_services: usize,
    /// Provider reference links across all providers
    pub reference_links: usize,
}

/// JSON output for the summary
#[derive(Debug, Serialize)]
struct JsonSummaryOutput {
    total: TypeSummary,
    by_type: BTreeMap<String, TypeSummary>,
}

/// Run summary command
pub fn run(data: &Path, json: bool) -> Result<()> {
    let records = load_catalogue(data, json)?;
    let by_type = summarize(&records);
    let total = by_type.values().fold(TypeSummary::default(), |mut acc, s| {
        acc.providers += s.providers;
        acc.services += s.services;
        acc.hva_services += s.hva_services;
        acc.reference_links += s.reference_links;
        acc
    });

    if json {
        let output = JsonSummaryOutput { total, by_type };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    println!("  {}", "Catalogue Summary".blue().bold());
    println!();
    println!(
        "  {:<12} {:>9} {:>9} {:>6} {:>6}",
        "Type".dimmed(),
        "Providers".dimmed(),
        "Services".dimmed(),
        "HVA".dimmed(),
        "Links".dimmed()
    );
    for (kind, s) in &by_type {
        print_row(kind, s);
    }
    println!("  {}", "─".repeat(46).dimmed());
    print_row("Total", &total);
    println!();

    Ok(())
}

fn print_row(label: &str, s: &TypeSummary) {
    println!(
        "  {:<12} {:>9} {:>9} {:>6} {:>6}",
        label, s.providers, s.services, s.hva_services, s.reference_links
    );
}

/// Group records by provider type; records without a type are listed as "(none)".
pub fn summarize(records: &[ProviderRecord]) -> BTreeMap<String, TypeSummary> {
    let mut by_type: BTreeMap<String, TypeSummary> = BTreeMap::new();
    for record in records {
        let kind = match record.provider_type.as_str() {
            "" => "(none)",
            other => other,
        };
        let entry = by_type.entry(kind.to_string()).or_default();
        entry.providers += 1;
        entry.services += record.service_count();
        entry.hva_services += record.hva_service_count();
        entry.reference_links += record
            .references
            .as_ref()
            .map_or(0, |refs| refs.provider_links().len());
    }
    by_type
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_by_type() {
        let records = vec![
            ProviderRecord::new("Contoso", "CSP")
                .with_service("Blob Storage", ["Medium"])
                .with_service("Queue", ["HVA"]),
            ProviderRecord::new("Fabrikam", "SaaS").with_service("Mail", ["Medium", "HVA"]),
            ProviderRecord::new("Woodgrove", "CSP"),
            ProviderRecord::new("Tailspin", ""),
        ];

        let summary = summarize(&records);
        let csp = &summary["CSP"];
        assert_eq!(csp.providers, 2);
        assert_eq!(csp.services, 2);
        assert_eq!(csp.hva_services, 1);
        assert_eq!(summary["SaaS"].hva_services, 1);
        assert_eq!(summary["(none)"].providers, 1);
    }
}
