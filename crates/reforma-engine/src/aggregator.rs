use indexmap::IndexMap;
use reforma_contracts::report::{
    complete_surfaced, AnalysisReport, ConfidenceLevel, CostRange, ReportOrigin,
};
use reforma_contracts::rooms::{RoomCategory, RoomVerdict};
use tracing::debug;

use crate::fallback::area_total;

const IMAGE_COMMENT: &str =
    "Este análisis se basa únicamente en el análisis visual de las imágenes disponibles.";
const AREA_TOTAL_NOTE: &str =
    "El coste total se ha estimado a partir de la superficie (600-800 €/m²).";
const NO_IMAGES_COMMENT: &str = "No se pudo analizar ninguna imagen.";

/// Per-room outcomes collected while walking the buckets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomFindings {
    verdicts: IndexMap<RoomCategory, RoomVerdict>,
    classified: Vec<RoomCategory>,
}

impl RoomFindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verdict produced by the vision model.
    pub fn record_classified(&mut self, room: RoomCategory, verdict: RoomVerdict) {
        self.verdicts.insert(room, verdict);
        if !self.classified.contains(&room) {
            self.classified.push(room);
        }
    }

    /// Placeholder standing in for a room that could not be judged.
    pub fn record_placeholder(&mut self, room: RoomCategory, verdict: RoomVerdict) {
        self.verdicts.insert(room, verdict);
        self.classified.retain(|existing| *existing != room);
    }

    pub fn verdicts(&self) -> &IndexMap<RoomCategory, RoomVerdict> {
        &self.verdicts
    }

    pub fn is_classified(&self, room: RoomCategory) -> bool {
        self.classified.contains(&room)
    }

    /// Successful classifications among the surfaced rooms.
    pub fn classified_surfaced(&self) -> usize {
        RoomCategory::SURFACED
            .iter()
            .filter(|room| self.is_classified(**room))
            .count()
    }

    /// Successful classifications, auxiliary rooms included.
    pub fn classified_total(&self) -> usize {
        self.classified.len()
    }
}

/// Merges per-room findings into the final report.
///
/// The total is the sum of every surfaced room's cost range that parses; rooms whose
/// cost text does not parse are left out. When none parse the total falls back to
/// `area × 600–800 €`.
pub fn aggregate(findings: &RoomFindings, area_m2: f64) -> AnalysisReport {
    let surfaced = complete_surfaced(findings.verdicts());

    let mut parsed = 0usize;
    let mut total = CostRange::default();
    for (room, verdict) in &surfaced {
        match CostRange::parse(&verdict.estimated_cost) {
            Some(range) => {
                parsed += 1;
                total = total + range;
            }
            None => debug!(
                room = room.source_label(),
                cost = %verdict.estimated_cost,
                "cost text not parsable; left out of total"
            ),
        }
    }
    if parsed == 0 {
        total = area_total(area_m2);
    }

    let confidence = if findings.classified_surfaced() > 0 {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    };
    let comments = match (confidence, parsed) {
        (ConfidenceLevel::Medium, 0) => format!("{IMAGE_COMMENT} {AREA_TOTAL_NOTE}"),
        (ConfidenceLevel::Medium, _) => IMAGE_COMMENT.to_string(),
        (ConfidenceLevel::Low, 0) => format!("{NO_IMAGES_COMMENT} {AREA_TOTAL_NOTE}"),
        (ConfidenceLevel::Low, _) => NO_IMAGES_COMMENT.to_string(),
    };

    let mut verdicts = surfaced;
    for (room, verdict) in findings.verdicts() {
        if !room.is_surfaced() {
            verdicts.insert(*room, verdict.clone());
        }
    }
    AnalysisReport::new(
        verdicts,
        total,
        confidence,
        comments,
        ReportOrigin::ImageAnalysis,
    )
}

#[cfg(test)]
mod tests {
    use reforma_contracts::report::{ConfidenceLevel, ReportOrigin};
    use reforma_contracts::rooms::{RenovationNeed, RoomCategory, RoomVerdict};

    use super::{aggregate, RoomFindings};

    fn verdict(cost: &str) -> RoomVerdict {
        RoomVerdict {
            needs_renovation: RenovationNeed::Yes,
            justification: "Suelo desgastado".to_string(),
            items_to_renovate: "suelo".to_string(),
            estimated_cost: cost.to_string(),
        }
    }

    #[test]
    fn every_surfaced_room_gets_a_verdict() {
        let report = aggregate(&RoomFindings::new(), 50.0);
        for room in RoomCategory::SURFACED {
            assert_eq!(report.rooms()[&room], RoomVerdict::not_analyzed());
        }
    }

    #[test]
    fn unparsable_costs_fall_back_to_area_total() {
        let mut findings = RoomFindings::new();
        findings.record_placeholder(RoomCategory::Kitchen, RoomVerdict::unknown("sin imagen"));
        findings.record_classified(RoomCategory::Bathroom, verdict("depende del material"));
        let report = aggregate(&findings, 90.0);
        assert_eq!(report.total().to_string(), "54000 - 72000 €");
        assert_eq!(report.confidence(), ConfidenceLevel::Medium);
        assert!(report.comments().contains("superficie"));
    }

    #[test]
    fn parsed_costs_are_summed_and_bad_ones_skipped() {
        let mut findings = RoomFindings::new();
        findings.record_classified(RoomCategory::Bathroom, verdict("1.200 - 1.500 €"));
        findings.record_classified(RoomCategory::Kitchen, verdict("4000-6000€"));
        findings.record_classified(RoomCategory::LivingArea, verdict("barato"));
        let report = aggregate(&findings, 90.0);
        assert_eq!(report.total().to_string(), "5200 - 7500 €");
        assert_eq!(report.origin(), ReportOrigin::ImageAnalysis);
    }

    #[test]
    fn auxiliary_rooms_never_count() {
        let mut findings = RoomFindings::new();
        findings.record_classified(RoomCategory::View, verdict("100 - 200 €"));
        let report = aggregate(&findings, 10.0);
        assert_eq!(report.total().to_string(), "6000 - 8000 €");
        assert_eq!(report.confidence(), ConfidenceLevel::Low);
        assert_eq!(report.auxiliary().len(), 1);
    }

    #[test]
    fn placeholder_replaces_earlier_classification() {
        let mut findings = RoomFindings::new();
        findings.record_classified(RoomCategory::Hallway, verdict("1 - 2 €"));
        findings.record_placeholder(RoomCategory::Hallway, RoomVerdict::unknown("error"));
        assert!(!findings.is_classified(RoomCategory::Hallway));
        assert_eq!(findings.classified_surfaced(), 0);

        findings.record_classified(RoomCategory::View, verdict("1 - 2 €"));
        assert_eq!(findings.classified_surfaced(), 0);
        assert_eq!(findings.classified_total(), 1);
    }
}
