mod cost;
pub mod export;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::rooms::{RenovationNeed, RoomCategory, RoomVerdict};

pub use cost::CostRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    #[serde(rename = "bajo")]
    Low,
    #[serde(rename = "medio")]
    Medium,
}

impl ConfidenceLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfidenceLevel::Low => "bajo",
            ConfidenceLevel::Medium => "medio",
        }
    }
}

/// How the figures in a report were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOrigin {
    /// Per-room verdicts from the image pipeline, possibly all placeholders.
    ImageAnalysis,
    /// Area-only heuristic; no image was looked at.
    AreaHeuristic,
}

/// Final, immutable result of one analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    rooms: IndexMap<RoomCategory, RoomVerdict>,
    auxiliary: IndexMap<RoomCategory, RoomVerdict>,
    total: CostRange,
    confidence: ConfidenceLevel,
    comments: String,
    origin: ReportOrigin,
}

impl AnalysisReport {
    /// Surfaced categories are stored in report order and any that are missing get the
    /// "not analyzed" placeholder. View and Unknown verdicts are kept as auxiliary data.
    pub fn new(
        verdicts: IndexMap<RoomCategory, RoomVerdict>,
        total: CostRange,
        confidence: ConfidenceLevel,
        comments: impl Into<String>,
        origin: ReportOrigin,
    ) -> Self {
        let mut auxiliary = IndexMap::new();
        for category in RoomCategory::ALL {
            if category.is_surfaced() {
                continue;
            }
            if let Some(verdict) = verdicts.get(&category) {
                auxiliary.insert(category, verdict.clone());
            }
        }
        Self {
            rooms: complete_surfaced(&verdicts),
            auxiliary,
            total,
            confidence,
            comments: comments.into(),
            origin,
        }
    }

    pub fn rooms(&self) -> &IndexMap<RoomCategory, RoomVerdict> {
        &self.rooms
    }

    pub fn room(&self, category: RoomCategory) -> Option<&RoomVerdict> {
        self.rooms
            .get(&category)
            .or_else(|| self.auxiliary.get(&category))
    }

    pub fn auxiliary(&self) -> &IndexMap<RoomCategory, RoomVerdict> {
        &self.auxiliary
    }

    pub fn total(&self) -> CostRange {
        self.total
    }

    pub fn confidence(&self) -> ConfidenceLevel {
        self.confidence
    }

    pub fn comments(&self) -> &str {
        &self.comments
    }

    pub fn origin(&self) -> ReportOrigin {
        self.origin
    }

    pub fn to_document(&self) -> ReportDocument {
        let rooms = self
            .rooms
            .iter()
            .map(|(category, verdict)| {
                (
                    category.report_key().to_string(),
                    RoomAssessment {
                        needs_renovation: verdict.needs_renovation,
                        justification: verdict.justification.clone(),
                    },
                )
            })
            .collect();
        let breakdown = self
            .rooms
            .iter()
            .map(|(category, verdict)| {
                (
                    category.report_key().to_string(),
                    verdict.estimated_cost.clone(),
                )
            })
            .collect();
        let items = self
            .rooms
            .iter()
            .map(|(category, verdict)| {
                (
                    category.report_key().to_string(),
                    verdict.items_to_renovate.clone(),
                )
            })
            .collect();
        let auxiliary = self
            .auxiliary
            .iter()
            .map(|(category, verdict)| {
                (
                    category.report_key().to_string(),
                    VerdictDocument::from(verdict),
                )
            })
            .collect();

        ReportDocument {
            rooms,
            costs: CostEstimate {
                total: self.total.to_string(),
                breakdown,
            },
            items,
            confidence: self.confidence,
            comments: self.comments.clone(),
            auxiliary,
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.to_document())
    }
}

/// The four surfaced categories in report order, with placeholders for gaps.
pub fn complete_surfaced(
    verdicts: &IndexMap<RoomCategory, RoomVerdict>,
) -> IndexMap<RoomCategory, RoomVerdict> {
    RoomCategory::SURFACED
        .into_iter()
        .map(|category| {
            let verdict = verdicts
                .get(&category)
                .cloned()
                .unwrap_or_else(RoomVerdict::not_analyzed);
            (category, verdict)
        })
        .collect()
}

/// Serialized shape of a report, as consumed by the exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    #[serde(rename = "análisis_por_habitación")]
    pub rooms: IndexMap<String, RoomAssessment>,
    #[serde(rename = "estimación_costes")]
    pub costs: CostEstimate,
    #[serde(rename = "elementos_a_reformar")]
    pub items: IndexMap<String, String>,
    #[serde(rename = "nivel_confianza")]
    pub confidence: ConfidenceLevel,
    #[serde(rename = "comentarios_adicionales")]
    pub comments: String,
    #[serde(
        rename = "análisis_auxiliar",
        default,
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub auxiliary: IndexMap<String, VerdictDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomAssessment {
    #[serde(rename = "necesita_reforma")]
    pub needs_renovation: RenovationNeed,
    #[serde(rename = "justificación")]
    pub justification: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub total: String,
    #[serde(rename = "desglose")]
    pub breakdown: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictDocument {
    #[serde(rename = "necesita_reforma")]
    pub needs_renovation: RenovationNeed,
    #[serde(rename = "justificación")]
    pub justification: String,
    #[serde(rename = "elementos_a_reformar")]
    pub items_to_renovate: String,
    #[serde(rename = "estimación_coste")]
    pub estimated_cost: String,
}

impl From<&RoomVerdict> for VerdictDocument {
    fn from(verdict: &RoomVerdict) -> Self {
        Self {
            needs_renovation: verdict.needs_renovation,
            justification: verdict.justification.clone(),
            items_to_renovate: verdict.items_to_renovate.clone(),
            estimated_cost: verdict.estimated_cost.clone(),
        }
    }
}
