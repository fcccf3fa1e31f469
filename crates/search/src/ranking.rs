//! Merging provider and service hits into ranked results.
//!
//! Providers can surface two ways: directly, because their own fields match
//! the query, or by promotion, because some of their services match even
//! though the provider itself does not. Each provider appears at most once;
//! a direct match always wins over a promotion for the same name.

use crate::config::RankingConfig;
use crate::index::SearchHit;
use crate::normalize::{FlatProviderEntry, FlatServiceEntry};
use crate::record::ProviderRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Subtitle for providers that matched by name.
pub const PROVIDER_SUBTITLE: &str = "Provider";

/// Why a provider is in the result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchReason {
    /// The provider's own fields matched
    Name,
    /// Only the provider's services matched
    Services,
}

/// A provider in the ranked output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMatch {
    pub title: String,
    pub subtitle: String,
    pub provider: Arc<ProviderRecord>,
    pub score: f64,
    pub reason: MatchReason,
    /// Services of this provider among the service hits
    pub matched_service_count: usize,
}

/// A service in the ranked output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMatch {
    pub title: String,
    /// Owning provider's name
    pub subtitle: String,
    pub provider: Arc<ProviderRecord>,
    pub score: f64,
}

/// One entry of a ranked result list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RankedResult {
    Provider(ProviderMatch),
    Service(ServiceMatch),
}

impl RankedResult {
    pub fn title(&self) -> &str {
        match self {
            RankedResult::Provider(p) => &p.title,
            RankedResult::Service(s) => &s.title,
        }
    }

    pub fn subtitle(&self) -> &str {
        match self {
            RankedResult::Provider(p) => &p.subtitle,
            RankedResult::Service(s) => &s.subtitle,
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            RankedResult::Provider(p) => p.score,
            RankedResult::Service(s) => s.score,
        }
    }

    /// The record to open when this result is chosen.
    pub fn provider(&self) -> &Arc<ProviderRecord> {
        match self {
            RankedResult::Provider(p) => &p.provider,
            RankedResult::Service(s) => &s.provider,
        }
    }

    pub fn as_provider(&self) -> Option<&ProviderMatch> {
        match self {
            RankedResult::Provider(p) => Some(p),
            RankedResult::Service(_) => None,
        }
    }

    pub fn as_service(&self) -> Option<&ServiceMatch> {
        match self {
            RankedResult::Service(s) => Some(s),
            RankedResult::Provider(_) => None,
        }
    }
}

/// Both ranked lists for one query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub provider_results: Vec<RankedResult>,
    pub service_results: Vec<RankedResult>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.provider_results.is_empty() && self.service_results.is_empty()
    }
}

/// Subtitle for a provider result.
pub fn provider_subtitle(reason: MatchReason, count: usize) -> String {
    match reason {
        MatchReason::Name => PROVIDER_SUBTITLE.to_string(),
        MatchReason::Services => {
            let noun = if count == 1 { "service" } else { "services" };
            format!("{PROVIDER_SUBTITLE} • {count} matching {noun}")
        }
    }
}

/// Title order following the root-locale collation browsers use.
///
/// Letters compare case-insensitively, after punctuation and digits. Titles
/// that differ only in case put lowercase first, and the ordinal comparison
/// settles anything left so the order is total. Accents are not folded.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(collation_key(b))
        .then_with(|| case_order(a, b))
        .then_with(|| a.cmp(b))
}

fn collation_key(s: &str) -> impl Iterator<Item = (u8, char)> + '_ {
    s.chars().flat_map(char::to_lowercase).map(|c| {
        let class = if c.is_alphabetic() {
            2
        } else if c.is_numeric() {
            1
        } else {
            0
        };
        (class, c)
    })
}

fn case_order(a: &str, b: &str) -> Ordering {
    a.chars()
        .zip(b.chars())
        .find(|(x, y)| x != y)
        .map_or(Ordering::Equal, |(x, y)| x.is_uppercase().cmp(&y.is_uppercase()))
}

struct Candidate<'a> {
    title: &'a str,
    provider: &'a Arc<ProviderRecord>,
    score: f64,
    reason: MatchReason,
    count: usize,
}

/// Merge raw index hits into the final provider and service lists.
pub fn merge(
    provider_hits: &[SearchHit<'_, FlatProviderEntry>],
    service_hits: &[SearchHit<'_, FlatServiceEntry>],
    config: &RankingConfig,
) -> SearchResults {
    // Matching services per provider, in first-seen order.
    let mut counts: Vec<(&str, &Arc<ProviderRecord>, usize)> = Vec::new();
    let mut slot_of: HashMap<&str, usize> = HashMap::new();
    for hit in service_hits {
        let name = hit.entry.provider_name.as_str();
        match slot_of.get(name) {
            Some(&slot) => counts[slot].2 += 1,
            None => {
                slot_of.insert(name, counts.len());
                counts.push((name, &hit.entry.record, 1));
            }
        }
    }
    let count_for = |name: &str| slot_of.get(name).map_or(0, |&slot| counts[slot].2);

    let mut candidates: Vec<Candidate<'_>> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for hit in provider_hits {
        let name = hit.entry.name.as_str();
        if !seen.insert(name) {
            continue;
        }
        candidates.push(Candidate {
            title: name,
            provider: &hit.entry.record,
            score: hit.score,
            reason: MatchReason::Name,
            count: count_for(name),
        });
    }

    for &(name, provider, count) in &counts {
        if seen.contains(name) {
            continue;
        }
        candidates.push(Candidate {
            title: name,
            provider,
            score: config.promotion_score,
            reason: MatchReason::Services,
            count,
        });
    }

    candidates.sort_by(|a, b| {
        a.score
            .total_cmp(&b.score)
            .then_with(|| b.count.cmp(&a.count))
            .then_with(|| compare_titles(a.title, b.title))
    });
    candidates.truncate(config.provider_result_limit);

    let provider_results = candidates
        .into_iter()
        .map(|c| {
            RankedResult::Provider(ProviderMatch {
                title: c.title.to_string(),
                subtitle: provider_subtitle(c.reason, c.count),
                provider: Arc::clone(c.provider),
                score: c.score,
                reason: c.reason,
                matched_service_count: c.count,
            })
        })
        .collect();

    let mut services: Vec<&SearchHit<'_, FlatServiceEntry>> = service_hits.iter().collect();
    services.sort_by(|a, b| {
        a.score
            .total_cmp(&b.score)
            .then_with(|| compare_titles(&a.entry.title, &b.entry.title))
    });
    services.truncate(config.service_result_limit);

    let service_results = services
        .into_iter()
        .map(|hit| {
            RankedResult::Service(ServiceMatch {
                title: hit.entry.title.clone(),
                subtitle: hit.entry.provider_name.clone(),
                provider: Arc::clone(&hit.entry.record),
                score: hit.score,
            })
        })
        .collect();

    SearchResults { provider_results, service_results }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(name: &str) -> FlatProviderEntry {
        FlatProviderEntry {
            name: name.to_string(),
            provider_type: "CSP".to_string(),
            underlying_csp: String::new(),
            record: Arc::new(ProviderRecord::new(name, "CSP")),
        }
    }

    fn service(title: &str, owner: &FlatProviderEntry) -> FlatServiceEntry {
        FlatServiceEntry {
            title: title.to_string(),
            provider_name: owner.name.clone(),
            provider_type: owner.provider_type.clone(),
            record: Arc::clone(&owner.record),
        }
    }

    fn providers_of(results: &SearchResults) -> Vec<&ProviderMatch> {
        results.provider_results.iter().filter_map(RankedResult::as_provider).collect()
    }

    #[test]
    fn test_subtitles() {
        assert_eq!(provider_subtitle(MatchReason::Name, 3), "Provider");
        assert_eq!(provider_subtitle(MatchReason::Services, 1), "Provider • 1 matching service");
        assert_eq!(provider_subtitle(MatchReason::Services, 2), "Provider • 2 matching services");
    }

    #[test]
    fn test_empty_hits() {
        let results = merge(&[], &[], &RankingConfig::default());
        assert!(results.is_empty());
    }

    #[test]
    fn test_promotes_provider_with_matching_services() {
        let contoso = provider("Contoso");
        let blob = service("Blob Storage", &contoso);
        let table = service("Table Storage", &contoso);
        let service_hits = [
            SearchHit { entry: &blob, score: 0.02 },
            SearchHit { entry: &table, score: 0.03 },
        ];

        let results = merge(&[], &service_hits, &RankingConfig::default());
        let providers = providers_of(&results);

        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].title, "Contoso");
        assert_eq!(providers[0].reason, MatchReason::Services);
        assert_eq!(providers[0].score, 0.6);
        assert_eq!(providers[0].matched_service_count, 2);
        assert_eq!(providers[0].subtitle, "Provider • 2 matching services");
        assert_eq!(results.service_results.len(), 2);
    }

    #[test]
    fn test_direct_match_wins_over_promotion() {
        let contoso = provider("Contoso");
        let queue = service("Contoso Queue", &contoso);
        let provider_hits = [SearchHit { entry: &contoso, score: 0.01 }];
        let service_hits = [SearchHit { entry: &queue, score: 0.02 }];

        let results = merge(&provider_hits, &service_hits, &RankingConfig::default());
        let providers = providers_of(&results);

        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].reason, MatchReason::Name);
        assert_eq!(providers[0].subtitle, "Provider");
        assert_eq!(providers[0].matched_service_count, 1);
    }

    #[test]
    fn test_duplicate_provider_hit_keeps_first() {
        let a = provider("Acme");
        let provider_hits = [SearchHit { entry: &a, score: 0.1 }, SearchHit { entry: &a, score: 0.2 }];

        let results = merge(&provider_hits, &[], &RankingConfig::default());
        assert_eq!(results.provider_results.len(), 1);
        assert_eq!(results.provider_results[0].score(), 0.1);
    }

    #[test]
    fn test_tie_breaks_count_then_title() {
        let zeta = provider("zeta");
        let alpha = provider("Alpha");
        let beta = provider("beta");
        let z1 = service("Queue", &zeta);
        let z2 = service("Queues", &zeta);
        let a1 = service("Queue", &alpha);
        let b1 = service("Queue", &beta);
        let service_hits = [
            SearchHit { entry: &b1, score: 0.1 },
            SearchHit { entry: &a1, score: 0.1 },
            SearchHit { entry: &z1, score: 0.1 },
            SearchHit { entry: &z2, score: 0.2 },
        ];

        let results = merge(&[], &service_hits, &RankingConfig::default());
        let titles: Vec<_> = results.provider_results.iter().map(RankedResult::title).collect();
        assert_eq!(titles, vec!["zeta", "Alpha", "beta"]);
    }

    #[test]
    fn test_title_collation() {
        let mut titles = vec!["acme", "Acme", "A~x", "Ab", "A1", "a b"];
        titles.sort_by(|a, b| compare_titles(a, b));
        assert_eq!(titles, vec!["a b", "A~x", "A1", "Ab", "acme", "Acme"]);
        assert_eq!(compare_titles("Queue", "Queue"), Ordering::Equal);
    }

    #[test]
    fn test_service_order_and_identity() {
        let a = provider("Alpha");
        let b = provider("Beta");
        let qa = service("Queue", &a);
        let qb = service("Queue", &b);
        let arch = service("archive", &b);
        let service_hits = [
            SearchHit { entry: &qb, score: 0.1 },
            SearchHit { entry: &qa, score: 0.1 },
            SearchHit { entry: &arch, score: 0.1 },
        ];

        let results = merge(&[], &service_hits, &RankingConfig::default());
        let pairs: Vec<_> = results
            .service_results
            .iter()
            .map(|r| (r.title(), r.subtitle()))
            .collect();
        // Same title under two providers stays two results; equal keys keep hit order.
        assert_eq!(pairs, vec![("archive", "Beta"), ("Queue", "Beta"), ("Queue", "Alpha")]);
    }

    #[test]
    fn test_caps() {
        let owners: Vec<_> = (0..20).map(|i| provider(&format!("P{i:02}"))).collect();
        let entries: Vec<_> = owners.iter().map(|o| service("Queue", o)).collect();
        let provider_hits: Vec<_> = owners.iter().map(|o| SearchHit { entry: o, score: 0.1 }).collect();
        let service_hits: Vec<_> = entries.iter().map(|e| SearchHit { entry: e, score: 0.1 }).collect();

        let results = merge(&provider_hits, &service_hits, &RankingConfig::default());
        assert_eq!(results.provider_results.len(), 8);
        assert_eq!(results.service_results.len(), 16);
    }

    #[test]
    fn test_serialized_shape() {
        let contoso = provider("Contoso");
        let blob = service("Blob Storage", &contoso);
        let results = merge(&[], &[SearchHit { entry: &blob, score: 0.02 }], &RankingConfig::default());

        let json = serde_json::to_value(&results).unwrap();
        let p = &json["providerResults"][0];
        assert_eq!(p["kind"], "provider");
        assert_eq!(p["matchedServiceCount"], 1);
        assert_eq!(p["reason"], "services");
        assert_eq!(p["provider"]["name"], "Contoso");
        let s = &json["serviceResults"][0];
        assert_eq!(s["kind"], "service");
        assert_eq!(s["subtitle"], "Contoso");
    }
}
