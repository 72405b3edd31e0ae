use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveDate};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;

use crate::config::profile::{ScoreParams, SentimentRanges, SynthesisProfile, WeightedValues};
use crate::models::{Disc, FunnelType, Intent, Level, PurchaseStage, Sentiment};

/// Index-aligned per-field sample vectors: element `i` across all vectors
/// describes record `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldVectors {
    pub dates: Vec<NaiveDate>,
    pub pages: Vec<&'static str>,
    pub message_counts: Vec<u32>,
    pub intents: Vec<Intent>,
    pub stages: Vec<PurchaseStage>,
    pub funnels: Vec<FunnelType>,
    pub conversions: Vec<bool>,
    pub sentiments: Vec<Sentiment>,
    pub sentiment_scores: Vec<f64>,
    pub discs: Vec<Disc>,
    pub cohorts: Vec<&'static str>,
    pub lifestyles: Vec<&'static str>,
    pub urgency: Vec<Level>,
    pub trust: Vec<Level>,
    pub price_sensitivity: Vec<Level>,
    pub agent_scores: Vec<f64>,
    pub empathy_scores: Vec<f64>,
    pub closing_skills: Vec<f64>,
    pub csats: Vec<f64>,
    pub conversion_probabilities: Vec<f64>,
    pub competitors: Vec<Option<&'static str>>,
    pub products: Vec<&'static str>,
    pub churn_reasons: Vec<Option<&'static str>>,
}

impl FieldVectors {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Draws statistically coherent conversation records from a validated
/// [`SynthesisProfile`]. Pure function of `(n, seed)`: same inputs, same
/// profile, bitwise-identical output.
///
/// Fields are sampled marginally from their fixed distributions; the one
/// designed correlation is the conversion outcome, whose Bernoulli
/// parameter is the additive rule over intent, sentiment, and stage.
#[derive(Debug, Clone)]
pub struct RecordSynthesizer {
    profile: SynthesisProfile,
}

impl RecordSynthesizer {
    /// Validates the profile's distribution tables up front; a mismatch is
    /// a fatal configuration error, not a runtime condition.
    pub fn new(profile: SynthesisProfile) -> Result<Self> {
        profile.validate()?;
        Ok(Self { profile })
    }

    pub fn profile(&self) -> &SynthesisProfile {
        &self.profile
    }

    /// Draw `n` records' worth of field vectors. `n == 0` is rejected
    /// before any sampling happens.
    pub fn synthesize(&self, n: usize, seed: u64) -> Result<FieldVectors> {
        if n == 0 {
            return Err(anyhow!("record count must be at least 1, got 0"));
        }

        let p = &self.profile;
        let mut rng = StdRng::seed_from_u64(seed);

        let dates = self.sample_dates(n, &mut rng)?;
        let pages = sample_weighted(&p.pages, n, &mut rng)?;
        let intents = sample_weighted(&p.intents, n, &mut rng)?;
        let stages = sample_weighted(&p.stages, n, &mut rng)?;
        let funnels = sample_weighted(&p.funnels, n, &mut rng)?;
        let sentiments = sample_weighted(&p.sentiments, n, &mut rng)?;
        let discs = sample_weighted(&p.discs, n, &mut rng)?;
        let cohorts = sample_weighted(&p.cohorts, n, &mut rng)?;
        let lifestyles = sample_weighted(&p.lifestyles, n, &mut rng)?;
        let urgency = sample_weighted(&p.urgency, n, &mut rng)?;
        let trust = sample_weighted(&p.trust, n, &mut rng)?;
        let price_sensitivity = sample_weighted(&p.price_sensitivity, n, &mut rng)?;
        let competitors = sample_uniform(&p.competitors, n, &mut rng);
        let products = sample_uniform(&p.products, n, &mut rng);
        let churn_reasons = sample_uniform(&p.churn_reasons, n, &mut rng);

        let agent_scores =
            sentiment_normal_scores(&sentiments, p.agent_score, p.score_clip, &mut rng)?;
        let empathy_scores =
            sentiment_normal_scores(&sentiments, p.empathy_score, p.score_clip, &mut rng)?;
        let closing_skills =
            sentiment_normal_scores(&sentiments, p.closing_skill, p.score_clip, &mut rng)?;

        // Conversion is the one field conditioned on others: the additive
        // rule yields the Bernoulli parameter, clamped once after summing.
        let raw_probabilities: Vec<f64> = (0..n)
            .map(|i| p.conversion.probability(intents[i], sentiments[i], stages[i]))
            .collect();
        let conversions: Vec<bool> = raw_probabilities
            .iter()
            .map(|prob| rng.gen::<f64>() < *prob)
            .collect();
        let conversion_probabilities: Vec<f64> =
            raw_probabilities.iter().map(|prob| round_to(*prob, 3)).collect();

        let sentiment_scores = sentiment_uniform_scores(&sentiments, p.sentiment_score, &mut rng);
        let csats = sentiment_uniform_scores(&sentiments, p.predicted_csat, &mut rng);

        let message_counts: Vec<u32> = (0..n)
            .map(|_| rng.gen_range(p.message_count_min..=p.message_count_max))
            .collect();

        Ok(FieldVectors {
            dates,
            pages,
            message_counts,
            intents,
            stages,
            funnels,
            conversions,
            sentiments,
            sentiment_scores,
            discs,
            cohorts,
            lifestyles,
            urgency,
            trust,
            price_sensitivity,
            agent_scores,
            empathy_scores,
            closing_skills,
            csats,
            conversion_probabilities,
            competitors,
            products,
            churn_reasons,
        })
    }

    /// Dates are drawn from the day calendar of the generation window with
    /// an exponential ramp: the newest day outweighs the oldest by roughly
    /// e^recency_ramp.
    fn sample_dates(&self, n: usize, rng: &mut StdRng) -> Result<Vec<NaiveDate>> {
        let p = &self.profile;
        let num_days = (p.date_end - p.date_start).num_days() + 1;
        let days: Vec<NaiveDate> = (0..num_days)
            .map(|i| p.date_start + Duration::days(i))
            .collect();

        let weights: Vec<f64> = if num_days == 1 {
            vec![1.0]
        } else {
            (0..num_days)
                .map(|i| {
                    let t = i as f64 / (num_days - 1) as f64;
                    (p.recency_ramp * (t - 1.0)).exp()
                })
                .collect()
        };
        let index =
            WeightedIndex::new(&weights).map_err(|e| anyhow!("invalid date weights: {}", e))?;

        Ok((0..n).map(|_| days[index.sample(rng)]).collect())
    }
}

fn sample_weighted<T: Copy>(
    table: &WeightedValues<T>,
    n: usize,
    rng: &mut StdRng,
) -> Result<Vec<T>> {
    let index =
        WeightedIndex::new(&table.weights).map_err(|e| anyhow!("invalid weight vector: {}", e))?;
    Ok((0..n).map(|_| table.values[index.sample(rng)]).collect())
}

fn sample_uniform<T: Copy>(pool: &[T], n: usize, rng: &mut StdRng) -> Vec<T> {
    (0..n).map(|_| pool[rng.gen_range(0..pool.len())]).collect()
}

fn sentiment_normal_scores(
    sentiments: &[Sentiment],
    params: ScoreParams,
    clip: (f64, f64),
    rng: &mut StdRng,
) -> Result<Vec<f64>> {
    let positive = Normal::new(params.mean_positive, params.sigma)?;
    let neutral = Normal::new(params.mean_neutral, params.sigma)?;
    let negative = Normal::new(params.mean_negative, params.sigma)?;

    Ok(sentiments
        .iter()
        .map(|sentiment| {
            let dist = match sentiment {
                Sentiment::Positive => positive,
                Sentiment::Neutral => neutral,
                Sentiment::Negative => negative,
            };
            round_to(dist.sample(rng).clamp(clip.0, clip.1), 1)
        })
        .collect())
}

fn sentiment_uniform_scores(
    sentiments: &[Sentiment],
    ranges: SentimentRanges,
    rng: &mut StdRng,
) -> Vec<f64> {
    sentiments
        .iter()
        .map(|sentiment| {
            let (lo, hi) = ranges.range_for(*sentiment);
            round_to(rng.gen_range(lo..hi), 2)
        })
        .collect()
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
