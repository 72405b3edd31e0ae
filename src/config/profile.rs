use anyhow::{anyhow, Result};
use chrono::NaiveDate;

use crate::models::{Disc, FunnelType, Intent, Level, PurchaseStage, Sentiment};

/// A categorical value set paired with its sampling weights.
#[derive(Debug, Clone)]
pub struct WeightedValues<T: Copy> {
    pub values: Vec<T>,
    pub weights: Vec<f64>,
}

impl<T: Copy> WeightedValues<T> {
    pub fn new(values: Vec<T>, weights: Vec<f64>) -> Self {
        Self { values, weights }
    }

    /// Weight vectors must describe a probability distribution over the
    /// value set. A mismatch is a programming error in the profile.
    fn validate(&self, field: &str) -> Result<()> {
        if self.values.is_empty() {
            return Err(anyhow!("{} has an empty value set", field));
        }
        if self.values.len() != self.weights.len() {
            return Err(anyhow!(
                "{} has {} values but {} weights",
                field,
                self.values.len(),
                self.weights.len()
            ));
        }
        if self.weights.iter().any(|w| *w < 0.0) {
            return Err(anyhow!("{} has a negative weight", field));
        }
        let sum: f64 = self.weights.iter().sum();
        if (sum - 1.0).abs() > 1e-9 {
            return Err(anyhow!("{} weights sum to {}, expected 1.0", field, sum));
        }
        Ok(())
    }
}

/// Normal-draw parameters for a sentiment-conditioned performance score.
#[derive(Debug, Clone, Copy)]
pub struct ScoreParams {
    pub mean_positive: f64,
    pub mean_neutral: f64,
    pub mean_negative: f64,
    pub sigma: f64,
}

/// Uniform sub-range per sentiment label, for the asymmetric score family.
#[derive(Debug, Clone, Copy)]
pub struct SentimentRanges {
    pub positive: (f64, f64),
    pub neutral: (f64, f64),
    pub negative: (f64, f64),
}

impl SentimentRanges {
    pub fn range_for(&self, sentiment: Sentiment) -> (f64, f64) {
        match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Neutral => self.neutral,
            Sentiment::Negative => self.negative,
        }
    }

    fn validate(&self, field: &str) -> Result<()> {
        for (lo, hi) in [self.positive, self.neutral, self.negative] {
            if lo >= hi {
                return Err(anyhow!("{} has an empty range [{}, {}]", field, lo, hi));
            }
        }
        Ok(())
    }
}

/// Additive rule for the conversion probability. All deltas are summed once
/// per record and the result clamped once, never per term, so an extreme
/// combination may leave [0, 1] before the final clamp.
#[derive(Debug, Clone, Copy)]
pub struct ConversionRule {
    pub base: f64,
    /// Applied when intent is mua_hang or dat_lich_do.
    pub transactional_intent_boost: f64,
    /// Applied when intent is khieu_nai.
    pub complaint_penalty: f64,
    pub positive_sentiment_boost: f64,
    pub negative_sentiment_penalty: f64,
    /// Applied when stage is purchase or evaluation.
    pub late_stage_boost: f64,
    pub awareness_penalty: f64,
    pub floor: f64,
    pub ceiling: f64,
}

impl ConversionRule {
    pub fn probability(&self, intent: Intent, sentiment: Sentiment, stage: PurchaseStage) -> f64 {
        let mut p = self.base;
        if matches!(intent, Intent::Purchase | Intent::BookAppointment) {
            p += self.transactional_intent_boost;
        }
        if intent == Intent::Complaint {
            p -= self.complaint_penalty;
        }
        match sentiment {
            Sentiment::Positive => p += self.positive_sentiment_boost,
            Sentiment::Negative => p -= self.negative_sentiment_penalty,
            Sentiment::Neutral => {}
        }
        if matches!(stage, PurchaseStage::Purchase | PurchaseStage::Evaluation) {
            p += self.late_stage_boost;
        }
        if stage == PurchaseStage::Awareness {
            p -= self.awareness_penalty;
        }
        p.clamp(self.floor, self.ceiling)
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.floor)
            || !(0.0..=1.0).contains(&self.ceiling)
            || self.floor >= self.ceiling
        {
            return Err(anyhow!(
                "conversion rule clamp [{}, {}] is not a probability interval",
                self.floor,
                self.ceiling
            ));
        }
        Ok(())
    }
}

/// Immutable configuration for the record synthesizer: fixed weighted
/// distributions per categorical field, the generation date window, and the
/// score/conversion parameters.
#[derive(Debug, Clone)]
pub struct SynthesisProfile {
    pub pages: WeightedValues<&'static str>,
    pub intents: WeightedValues<Intent>,
    pub stages: WeightedValues<PurchaseStage>,
    pub funnels: WeightedValues<FunnelType>,
    pub sentiments: WeightedValues<Sentiment>,
    pub discs: WeightedValues<Disc>,
    pub cohorts: WeightedValues<&'static str>,
    pub lifestyles: WeightedValues<&'static str>,
    pub urgency: WeightedValues<Level>,
    pub trust: WeightedValues<Level>,
    pub price_sensitivity: WeightedValues<Level>,
    /// Uniform draw.
    pub products: Vec<&'static str>,
    /// Uniform draw over a pool whose `None` slots set the absence rate.
    pub competitors: Vec<Option<&'static str>>,
    pub churn_reasons: Vec<Option<&'static str>>,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    /// Exponent span of the date recency ramp: day weights follow
    /// exp(linspace(-recency_ramp, 0)), favoring the newest days.
    pub recency_ramp: f64,
    /// Inclusive bounds for message_count.
    pub message_count_min: u32,
    pub message_count_max: u32,
    pub agent_score: ScoreParams,
    pub empathy_score: ScoreParams,
    pub closing_skill: ScoreParams,
    /// Clamp interval for the three normal performance scores.
    pub score_clip: (f64, f64),
    pub sentiment_score: SentimentRanges,
    pub predicted_csat: SentimentRanges,
    pub conversion: ConversionRule,
}

impl Default for SynthesisProfile {
    fn default() -> Self {
        Self {
            pages: WeightedValues::new(
                vec![
                    "Kính mắt Hoàng Anh - HN",
                    "Kính mắt Minh Trí - HCM",
                    "Quang Đức Optical - ĐN",
                    "Hùng Optics - CT",
                ],
                vec![0.35, 0.40, 0.15, 0.10],
            ),
            intents: WeightedValues::new(
                Intent::ALL.to_vec(),
                vec![0.28, 0.22, 0.18, 0.12, 0.08, 0.05, 0.04, 0.03],
            ),
            stages: WeightedValues::new(
                PurchaseStage::ALL.to_vec(),
                vec![0.18, 0.25, 0.20, 0.15, 0.14, 0.08],
            ),
            funnels: WeightedValues::new(FunnelType::ALL.to_vec(), vec![0.35, 0.25, 0.20, 0.20]),
            sentiments: WeightedValues::new(Sentiment::ALL.to_vec(), vec![0.50, 0.30, 0.20]),
            discs: WeightedValues::new(Disc::ALL.to_vec(), vec![0.35, 0.30, 0.22, 0.13]),
            cohorts: WeightedValues::new(
                vec!["Millennial", "Gen Z", "Gen X", "Boomer"],
                vec![0.40, 0.28, 0.22, 0.10],
            ),
            lifestyles: WeightedValues::new(
                vec![
                    "Nhân viên văn phòng",
                    "Học sinh/Sinh viên",
                    "Phụ huynh",
                    "Chuyên gia",
                    "Người trung niên",
                ],
                vec![0.34, 0.26, 0.20, 0.12, 0.08],
            ),
            urgency: WeightedValues::new(Level::ALL.to_vec(), vec![0.20, 0.50, 0.30]),
            trust: WeightedValues::new(Level::ALL.to_vec(), vec![0.40, 0.40, 0.20]),
            price_sensitivity: WeightedValues::new(Level::ALL.to_vec(), vec![0.35, 0.40, 0.25]),
            products: vec![
                "Kính cận",
                "Kính lão",
                "Kính áp tròng",
                "Kính râm",
                "Gọng kính",
                "Tròng kính cao cấp",
                "Kính trẻ em",
            ],
            competitors: vec![
                None,
                None,
                None,
                None,
                None,
                None,
                Some("Specsavers"),
                Some("Grand Vision"),
                Some("Local store"),
                Some("Online shop"),
            ],
            churn_reasons: vec![
                None,
                None,
                None,
                None,
                None,
                None,
                None,
                Some("gia_cao"),
                Some("khong_co_mau"),
                Some("mua_cho_roi"),
                Some("can_sua_lai"),
            ],
            date_start: NaiveDate::from_ymd_opt(2025, 7, 1).expect("valid calendar date"),
            date_end: NaiveDate::from_ymd_opt(2026, 1, 31).expect("valid calendar date"),
            recency_ramp: 2.0,
            message_count_min: 4,
            message_count_max: 25,
            agent_score: ScoreParams {
                mean_positive: 7.6,
                mean_neutral: 6.0,
                mean_negative: 4.4,
                sigma: 1.1,
            },
            empathy_score: ScoreParams {
                mean_positive: 7.8,
                mean_neutral: 6.0,
                mean_negative: 4.2,
                sigma: 1.1,
            },
            closing_skill: ScoreParams {
                mean_positive: 7.0,
                mean_neutral: 6.0,
                mean_negative: 4.8,
                sigma: 1.1,
            },
            score_clip: (1.0, 10.0),
            sentiment_score: SentimentRanges {
                positive: (6.0, 9.5),
                neutral: (4.0, 7.0),
                negative: (1.0, 4.5),
            },
            predicted_csat: SentimentRanges {
                positive: (3.8, 5.0),
                neutral: (2.5, 4.0),
                negative: (1.5, 2.8),
            },
            conversion: ConversionRule {
                base: 0.35,
                transactional_intent_boost: 0.25,
                complaint_penalty: 0.20,
                positive_sentiment_boost: 0.15,
                negative_sentiment_penalty: 0.15,
                late_stage_boost: 0.20,
                awareness_penalty: 0.12,
                floor: 0.02,
                ceiling: 0.98,
            },
        }
    }
}

impl SynthesisProfile {
    /// Check every distribution vector and parameter once, up front. A
    /// failure here is fatal: the profile is construction-time data, not
    /// runtime input.
    pub fn validate(&self) -> Result<()> {
        self.pages.validate("page_name")?;
        self.intents.validate("intent_primary")?;
        self.stages.validate("purchase_stage")?;
        self.funnels.validate("funnel_type")?;
        self.sentiments.validate("sentiment_overall")?;
        self.discs.validate("disc_primary")?;
        self.cohorts.validate("generation_cohort")?;
        self.lifestyles.validate("lifestyle_segment")?;
        self.urgency.validate("urgency_level")?;
        self.trust.validate("trust_level")?;
        self.price_sensitivity.validate("price_sensitivity")?;
        if self.products.is_empty() {
            return Err(anyhow!("product_interest has an empty value set"));
        }
        if self.competitors.is_empty() || self.churn_reasons.is_empty() {
            return Err(anyhow!("optional-field pools must not be empty"));
        }
        if self.date_start > self.date_end {
            return Err(anyhow!(
                "date window starts {} after it ends {}",
                self.date_start,
                self.date_end
            ));
        }
        if self.message_count_min > self.message_count_max {
            return Err(anyhow!("message_count bounds are inverted"));
        }
        for (name, params) in [
            ("agent_overall_score", self.agent_score),
            ("empathy_score", self.empathy_score),
            ("agent_closing_skill", self.closing_skill),
        ] {
            if params.sigma <= 0.0 {
                return Err(anyhow!("{} sigma must be positive", name));
            }
        }
        if self.score_clip.0 >= self.score_clip.1 {
            return Err(anyhow!("score clip interval is empty"));
        }
        self.sentiment_score.validate("sentiment_score")?;
        self.predicted_csat.validate("predicted_csat")?;
        self.conversion.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_is_valid() {
        SynthesisProfile::default().validate().unwrap();
    }

    #[test]
    fn rejects_weights_not_summing_to_one() {
        let mut profile = SynthesisProfile::default();
        profile.sentiments =
            WeightedValues::new(Sentiment::ALL.to_vec(), vec![0.50, 0.30, 0.30]);
        assert!(profile.validate().is_err());
    }

    #[test]
    fn rejects_mismatched_weight_length() {
        let mut profile = SynthesisProfile::default();
        profile.discs = WeightedValues::new(Disc::ALL.to_vec(), vec![0.5, 0.5]);
        assert!(profile.validate().is_err());
    }

    #[test]
    fn conversion_rule_clamps_after_summing() {
        let rule = SynthesisProfile::default().conversion;

        // Complaint + negative + awareness drives the raw sum to -0.12
        // before the clamp catches it at the floor.
        let worst = rule.probability(
            Intent::Complaint,
            Sentiment::Negative,
            PurchaseStage::Awareness,
        );
        assert_eq!(worst, 0.02);

        let best = rule.probability(Intent::Purchase, Sentiment::Positive, PurchaseStage::Purchase);
        assert!((best - 0.95).abs() < 1e-12);
    }

    #[test]
    fn conversion_rule_orders_sentiments() {
        let rule = SynthesisProfile::default().conversion;
        let positive = rule.probability(
            Intent::PriceInquiry,
            Sentiment::Positive,
            PurchaseStage::Consideration,
        );
        let negative = rule.probability(
            Intent::PriceInquiry,
            Sentiment::Negative,
            PurchaseStage::Consideration,
        );
        assert!(positive > negative);
    }
}
