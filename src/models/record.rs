use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Primary contact intent extracted from a conversation.
///
/// Wire values are the canonical Vietnamese keys produced by the enrichment
/// pipeline; they double as the lookup keys for dialogue templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    #[serde(rename = "hoi_gia")]
    PriceInquiry,
    #[serde(rename = "tu_van_do_mat")]
    EyeExamConsult,
    #[serde(rename = "dat_lich_do")]
    BookAppointment,
    #[serde(rename = "hoi_san_pham")]
    ProductInquiry,
    #[serde(rename = "mua_hang")]
    Purchase,
    #[serde(rename = "khieu_nai")]
    Complaint,
    #[serde(rename = "hoi_bao_hanh")]
    WarrantyInquiry,
    #[serde(rename = "tu_van_kinh_ap_trong")]
    ContactLensConsult,
}

impl Intent {
    pub const ALL: [Intent; 8] = [
        Intent::PriceInquiry,
        Intent::EyeExamConsult,
        Intent::BookAppointment,
        Intent::ProductInquiry,
        Intent::Purchase,
        Intent::Complaint,
        Intent::WarrantyInquiry,
        Intent::ContactLensConsult,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::PriceInquiry => "hoi_gia",
            Intent::EyeExamConsult => "tu_van_do_mat",
            Intent::BookAppointment => "dat_lich_do",
            Intent::ProductInquiry => "hoi_san_pham",
            Intent::Purchase => "mua_hang",
            Intent::Complaint => "khieu_nai",
            Intent::WarrantyInquiry => "hoi_bao_hanh",
            Intent::ContactLensConsult => "tu_van_kinh_ap_trong",
        }
    }
}

/// Stage of the purchase journey, ordered awareness → loyalty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStage {
    Awareness,
    Consideration,
    Intent,
    Evaluation,
    Purchase,
    Loyalty,
}

impl PurchaseStage {
    pub const ALL: [PurchaseStage; 6] = [
        PurchaseStage::Awareness,
        PurchaseStage::Consideration,
        PurchaseStage::Intent,
        PurchaseStage::Evaluation,
        PurchaseStage::Purchase,
        PurchaseStage::Loyalty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStage::Awareness => "awareness",
            PurchaseStage::Consideration => "consideration",
            PurchaseStage::Intent => "intent",
            PurchaseStage::Evaluation => "evaluation",
            PurchaseStage::Purchase => "purchase",
            PurchaseStage::Loyalty => "loyalty",
        }
    }
}

/// Lead classification for the conversation's funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelType {
    WarmLead,
    ColdLead,
    HotLead,
    ExistingCustomer,
}

impl FunnelType {
    pub const ALL: [FunnelType; 4] = [
        FunnelType::WarmLead,
        FunnelType::ColdLead,
        FunnelType::HotLead,
        FunnelType::ExistingCustomer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FunnelType::WarmLead => "warm_lead",
            FunnelType::ColdLead => "cold_lead",
            FunnelType::HotLead => "hot_lead",
            FunnelType::ExistingCustomer => "existing_customer",
        }
    }
}

/// Overall customer sentiment for the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

/// DISC personality group inferred for the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Disc {
    #[serde(rename = "D")]
    Dominance,
    #[serde(rename = "I")]
    Influence,
    #[serde(rename = "S")]
    Steadiness,
    #[serde(rename = "C")]
    Conscientiousness,
}

impl Disc {
    pub const ALL: [Disc; 4] = [
        Disc::Dominance,
        Disc::Influence,
        Disc::Steadiness,
        Disc::Conscientiousness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Disc::Dominance => "D",
            Disc::Influence => "I",
            Disc::Steadiness => "S",
            Disc::Conscientiousness => "C",
        }
    }
}

/// Three-step level scale shared by urgency, trust, and price sensitivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    High,
    Medium,
    Low,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::High, Level::Medium, Level::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::High => "high",
            Level::Medium => "medium",
            Level::Low => "low",
        }
    }
}

/// One conversation's enriched analytics row.
///
/// Optional fields carry an explicit no-value marker; consumers branch on
/// presence, never on string emptiness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique within a batch; derived from date + pre-sort row index.
    pub conversation_id: String,
    pub conversation_date: NaiveDate,
    pub page_name: String,
    pub message_count: u32,
    pub intent_primary: Intent,
    pub purchase_stage: PurchaseStage,
    pub funnel_type: FunnelType,
    pub funnel_is_successful: bool,
    pub sentiment_overall: Sentiment,
    pub sentiment_score: f64,
    pub disc_primary: Disc,
    pub generation_cohort: String,
    pub lifestyle_segment: String,
    pub urgency_level: Level,
    pub trust_level: Level,
    pub price_sensitivity: Level,
    pub agent_overall_score: f64,
    pub empathy_score: f64,
    pub agent_closing_skill: f64,
    pub predicted_csat: f64,
    /// The probability that parameterized the conversion draw.
    pub conversion_probability: f64,
    pub competitor_brand: Option<String>,
    pub product_interest: String,
    pub churn_reason: Option<String>,
    /// Canned multi-turn dialogue selected by primary intent.
    pub conversation_snippet: String,
}

/// Interchange column order for the delimited export (one header row,
/// ISO-8601 dates, `.` decimal separator).
pub const SCHEMA_COLUMNS: [&str; 25] = [
    "conversation_id",
    "conversation_date",
    "page_name",
    "message_count",
    "intent_primary",
    "purchase_stage",
    "funnel_type",
    "funnel_is_successful",
    "sentiment_overall",
    "sentiment_score",
    "disc_primary",
    "generation_cohort",
    "lifestyle_segment",
    "urgency_level",
    "trust_level",
    "price_sensitivity",
    "agent_overall_score",
    "empathy_score",
    "agent_closing_skill",
    "predicted_csat",
    "conversion_probability",
    "competitor_brand",
    "product_interest",
    "churn_reason",
    "conversation_snippet",
];

/// Columns that belong to the upstream producer only (internal identifiers,
/// raw PII, pipeline bookkeeping). They must never survive into a table
/// handed to consumers.
pub const UPSTREAM_COLUMNS: [&str; 5] = [
    "full_conversation",
    "thread_id",
    "customer_id",
    "page_id",
    "processed_at",
];
