//! Flattening of provider records into searchable entries.

use crate::config::{ProviderWeights, ServiceWeights};
use crate::index::WeightedField;
use crate::record::ProviderRecord;
use std::sync::Arc;

/// Separator used when joining underlying platforms into one field.
pub const CSP_SEPARATOR: &str = ", ";

/// A provider as the provider index sees it.
#[derive(Debug, Clone)]
pub struct FlatProviderEntry {
    pub name: String,
    pub provider_type: String,
    /// Underlying platforms joined with [`CSP_SEPARATOR`]
    pub underlying_csp: String,
    pub record: Arc<ProviderRecord>,
}

impl FlatProviderEntry {
    /// Indexed fields with their weights.
    pub fn fields(weights: &ProviderWeights) -> Vec<WeightedField<Self>> {
        vec![
            WeightedField::new("name", weights.name, |e: &Self| e.name.as_str()),
            WeightedField::new("type", weights.provider_type, |e: &Self| e.provider_type.as_str()),
            WeightedField::new("underlyingCSP", weights.underlying_csp, |e: &Self| {
                e.underlying_csp.as_str()
            }),
        ]
    }
}

/// One (provider, service) pair as the service index sees it.
#[derive(Debug, Clone)]
pub struct FlatServiceEntry {
    pub title: String,
    /// Owning provider's name; used for grouping and subtitles only
    pub provider_name: String,
    pub provider_type: String,
    pub record: Arc<ProviderRecord>,
}

impl FlatServiceEntry {
    /// Indexed fields with their weights.
    pub fn fields(weights: &ServiceWeights) -> Vec<WeightedField<Self>> {
        vec![
            WeightedField::new("title", weights.title, |e: &Self| e.title.as_str()),
            WeightedField::new("providerName", weights.provider_name, |e: &Self| {
                e.provider_name.as_str()
            }),
        ]
    }
}

/// Both flat entry lists produced from one catalogue.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub providers: Vec<FlatProviderEntry>,
    pub services: Vec<FlatServiceEntry>,
}

/// Flatten a catalogue in input order.
///
/// Records without a name are placeholders and are left out of both lists.
pub fn normalize<I>(records: I) -> Normalized
where
    I: IntoIterator<Item = ProviderRecord>,
{
    let mut out = Normalized::default();

    for record in records {
        if record.name.is_empty() {
            tracing::trace!("skipping provider record without a name");
            continue;
        }

        let record = Arc::new(record);
        let provider_type = record.provider_type.as_str().to_string();

        out.providers.push(FlatProviderEntry {
            name: record.name.clone(),
            provider_type: provider_type.clone(),
            underlying_csp: record.underlying_csp.join(CSP_SEPARATOR),
            record: Arc::clone(&record),
        });

        for title in record.services_in_scope.titles() {
            out.services.push(FlatServiceEntry {
                title: title.to_string(),
                provider_name: record.name.clone(),
                provider_type: provider_type.clone(),
                record: Arc::clone(&record),
            });
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalogue() -> Vec<ProviderRecord> {
        vec![
            ProviderRecord::new("Contoso", "CSP")
                .with_underlying("Azure")
                .with_underlying("AWS")
                .with_service("Blob Storage", ["Medium"])
                .with_service("Queue", ["HVA"]),
            ProviderRecord::new("", "SaaS").with_service("Ghost", ["Medium"]),
            ProviderRecord::new("Fabrikam", "PaaS").with_service("Queue", ["Medium"]),
        ]
    }

    #[test]
    fn test_skips_unnamed_records() {
        let flat = normalize(catalogue());
        let names: Vec<_> = flat.providers.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Contoso", "Fabrikam"]);
        assert!(flat.services.iter().all(|s| s.title != "Ghost"));
    }

    #[test]
    fn test_joins_underlying_csp() {
        let flat = normalize(catalogue());
        assert_eq!(flat.providers[0].underlying_csp, "Azure, AWS");
        assert_eq!(flat.providers[1].underlying_csp, "");
    }

    #[test]
    fn test_services_in_input_order() {
        let flat = normalize(catalogue());
        let pairs: Vec<_> = flat
            .services
            .iter()
            .map(|s| (s.title.as_str(), s.provider_name.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("Blob Storage", "Contoso"), ("Queue", "Contoso"), ("Queue", "Fabrikam")]
        );
    }

    #[test]
    fn test_entries_share_record() {
        let flat = normalize(catalogue());
        assert!(Arc::ptr_eq(&flat.providers[0].record, &flat.services[0].record));
        assert!(Arc::ptr_eq(&flat.services[0].record, &flat.services[1].record));
        assert_eq!(flat.services[2].provider_type, "PaaS");
    }
}
