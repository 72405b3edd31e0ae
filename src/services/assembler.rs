use anyhow::{Context, Result};
use polars::prelude::*;

use crate::config::profile::SynthesisProfile;
use crate::models::Record;
use crate::services::synthesizer::{FieldVectors, RecordSynthesizer};
use crate::services::templates;

/// The assembled analytics table: total, ordered by conversation date, and
/// immutable for the rest of the session. Filtering or aggregating derives
/// new data, never mutates this.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsTable {
    records: Vec<Record>,
}

impl AnalyticsTable {
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Materialize the interchange columns. Dates become ISO-8601 strings
    /// (lexicographic order is chronological order) and absent optionals
    /// become nulls, never placeholder text.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let records = &self.records;

        let columns = vec![
            Series::new(
                "conversation_id",
                records.iter().map(|r| r.conversation_id.clone()).collect::<Vec<_>>(),
            ),
            Series::new(
                "conversation_date",
                records
                    .iter()
                    .map(|r| r.conversation_date.to_string())
                    .collect::<Vec<_>>(),
            ),
            Series::new(
                "page_name",
                records.iter().map(|r| r.page_name.clone()).collect::<Vec<_>>(),
            ),
            Series::new(
                "message_count",
                records.iter().map(|r| r.message_count).collect::<Vec<_>>(),
            ),
            Series::new(
                "intent_primary",
                records
                    .iter()
                    .map(|r| r.intent_primary.as_str().to_string())
                    .collect::<Vec<_>>(),
            ),
            Series::new(
                "purchase_stage",
                records
                    .iter()
                    .map(|r| r.purchase_stage.as_str().to_string())
                    .collect::<Vec<_>>(),
            ),
            Series::new(
                "funnel_type",
                records
                    .iter()
                    .map(|r| r.funnel_type.as_str().to_string())
                    .collect::<Vec<_>>(),
            ),
            Series::new(
                "funnel_is_successful",
                records
                    .iter()
                    .map(|r| u32::from(r.funnel_is_successful))
                    .collect::<Vec<_>>(),
            ),
            Series::new(
                "sentiment_overall",
                records
                    .iter()
                    .map(|r| r.sentiment_overall.as_str().to_string())
                    .collect::<Vec<_>>(),
            ),
            Series::new(
                "sentiment_score",
                records.iter().map(|r| r.sentiment_score).collect::<Vec<_>>(),
            ),
            Series::new(
                "disc_primary",
                records
                    .iter()
                    .map(|r| r.disc_primary.as_str().to_string())
                    .collect::<Vec<_>>(),
            ),
            Series::new(
                "generation_cohort",
                records.iter().map(|r| r.generation_cohort.clone()).collect::<Vec<_>>(),
            ),
            Series::new(
                "lifestyle_segment",
                records.iter().map(|r| r.lifestyle_segment.clone()).collect::<Vec<_>>(),
            ),
            Series::new(
                "urgency_level",
                records
                    .iter()
                    .map(|r| r.urgency_level.as_str().to_string())
                    .collect::<Vec<_>>(),
            ),
            Series::new(
                "trust_level",
                records
                    .iter()
                    .map(|r| r.trust_level.as_str().to_string())
                    .collect::<Vec<_>>(),
            ),
            Series::new(
                "price_sensitivity",
                records
                    .iter()
                    .map(|r| r.price_sensitivity.as_str().to_string())
                    .collect::<Vec<_>>(),
            ),
            Series::new(
                "agent_overall_score",
                records.iter().map(|r| r.agent_overall_score).collect::<Vec<_>>(),
            ),
            Series::new(
                "empathy_score",
                records.iter().map(|r| r.empathy_score).collect::<Vec<_>>(),
            ),
            Series::new(
                "agent_closing_skill",
                records.iter().map(|r| r.agent_closing_skill).collect::<Vec<_>>(),
            ),
            Series::new(
                "predicted_csat",
                records.iter().map(|r| r.predicted_csat).collect::<Vec<_>>(),
            ),
            Series::new(
                "conversion_probability",
                records.iter().map(|r| r.conversion_probability).collect::<Vec<_>>(),
            ),
            Series::new(
                "competitor_brand",
                records.iter().map(|r| r.competitor_brand.clone()).collect::<Vec<_>>(),
            ),
            Series::new(
                "product_interest",
                records.iter().map(|r| r.product_interest.clone()).collect::<Vec<_>>(),
            ),
            Series::new(
                "churn_reason",
                records.iter().map(|r| r.churn_reason.clone()).collect::<Vec<_>>(),
            ),
            Series::new(
                "conversation_snippet",
                records
                    .iter()
                    .map(|r| r.conversation_snippet.clone())
                    .collect::<Vec<_>>(),
            ),
        ];

        DataFrame::new(columns).context("Failed to assemble analytics DataFrame")
    }
}

/// Join index-aligned field vectors into row records, assign identifiers,
/// and order the table by conversation date.
///
/// `conversation_id` is `{YYYYMMDD}_{index:04}` over the pre-sort row
/// index, so IDs are stable per generation and intentionally decoupled
/// from post-sort positions.
pub fn assemble(vectors: FieldVectors) -> AnalyticsTable {
    let n = vectors.len();
    let mut records = Vec::with_capacity(n);

    for i in 0..n {
        let date = vectors.dates[i];
        records.push(Record {
            conversation_id: format!("{}_{:04}", date.format("%Y%m%d"), i),
            conversation_date: date,
            page_name: vectors.pages[i].to_string(),
            message_count: vectors.message_counts[i],
            intent_primary: vectors.intents[i],
            purchase_stage: vectors.stages[i],
            funnel_type: vectors.funnels[i],
            funnel_is_successful: vectors.conversions[i],
            sentiment_overall: vectors.sentiments[i],
            sentiment_score: vectors.sentiment_scores[i],
            disc_primary: vectors.discs[i],
            generation_cohort: vectors.cohorts[i].to_string(),
            lifestyle_segment: vectors.lifestyles[i].to_string(),
            urgency_level: vectors.urgency[i],
            trust_level: vectors.trust[i],
            price_sensitivity: vectors.price_sensitivity[i],
            agent_overall_score: vectors.agent_scores[i],
            empathy_score: vectors.empathy_scores[i],
            agent_closing_skill: vectors.closing_skills[i],
            predicted_csat: vectors.csats[i],
            conversion_probability: vectors.conversion_probabilities[i],
            competitor_brand: vectors.competitors[i].map(str::to_string),
            product_interest: vectors.products[i].to_string(),
            churn_reason: vectors.churn_reasons[i].map(str::to_string),
            conversation_snippet: templates::for_intent(vectors.intents[i]).to_string(),
        });
    }

    // Stable sort: equal dates keep generation order.
    records.sort_by_key(|r| r.conversation_date);

    AnalyticsTable { records }
}

/// Generate a full synthetic analytics table from the default profile.
pub fn generate(n: usize, seed: u64) -> Result<AnalyticsTable> {
    generate_with_profile(SynthesisProfile::default(), n, seed)
}

/// Same as [`generate`] but with an injected profile, for callers that
/// need alternative distributions.
pub fn generate_with_profile(
    profile: SynthesisProfile,
    n: usize,
    seed: u64,
) -> Result<AnalyticsTable> {
    let synthesizer = RecordSynthesizer::new(profile)?;
    let vectors = synthesizer.synthesize(n, seed)?;
    Ok(assemble(vectors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SCHEMA_COLUMNS;
    use std::collections::HashSet;

    #[test]
    fn generates_exactly_n_records() {
        let table = generate(350, 42).unwrap();
        assert_eq!(table.len(), 350);
    }

    #[test]
    fn same_inputs_give_identical_tables() {
        let a = generate(350, 42).unwrap();
        let b = generate(350, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn conversation_ids_are_unique() {
        let table = generate(2_000, 1).unwrap();
        let ids: HashSet<&str> = table.records().iter().map(|r| r.conversation_id.as_str()).collect();
        assert_eq!(ids.len(), table.len());
    }

    #[test]
    fn table_is_sorted_by_date() {
        let table = generate(500, 42).unwrap();
        let records = table.records();
        for pair in records.windows(2) {
            assert!(pair[0].conversation_date <= pair[1].conversation_date);
        }
    }

    #[test]
    fn ids_keep_pre_sort_indices() {
        let table = generate(300, 8).unwrap();

        let mut suffixes = HashSet::new();
        for record in table.records() {
            let (prefix, suffix) = record
                .conversation_id
                .split_once('_')
                .expect("id has date and index parts");
            assert_eq!(prefix, record.conversation_date.format("%Y%m%d").to_string());
            suffixes.insert(suffix.parse::<usize>().unwrap());
        }

        // Every pre-sort index appears exactly once, whatever the sort did.
        assert_eq!(suffixes, (0..300).collect::<HashSet<_>>());
    }

    #[test]
    fn single_record_scenario() {
        let table = generate(1, 42).unwrap();
        assert_eq!(table.len(), 1);

        let record = &table.records()[0];
        assert_eq!(
            record.conversation_id,
            format!("{}_0000", record.conversation_date.format("%Y%m%d"))
        );
        assert!(!record.page_name.is_empty());
        assert!(!record.generation_cohort.is_empty());
        assert!(!record.lifestyle_segment.is_empty());
        assert!(!record.product_interest.is_empty());
        assert_eq!(
            record.conversation_snippet,
            templates::for_intent(record.intent_primary)
        );
        assert!((0.02..=0.98).contains(&record.conversion_probability));
    }

    #[test]
    fn dataframe_matches_interchange_schema() {
        let table = generate(120, 42).unwrap();
        let df = table.to_dataframe().unwrap();

        assert_eq!(df.height(), 120);
        assert_eq!(df.get_column_names(), SCHEMA_COLUMNS.to_vec());

        let absent = table
            .records()
            .iter()
            .filter(|r| r.competitor_brand.is_none())
            .count();
        assert_eq!(df.column("competitor_brand").unwrap().null_count(), absent);
    }
}
