use indexmap::IndexMap;
use reforma_contracts::report::{AnalysisReport, ConfidenceLevel, CostRange, ReportOrigin};
use reforma_contracts::rooms::{RenovationNeed, RoomCategory, RoomVerdict, UNKNOWN_TEXT};

/// Whole-property rate band in €/m².
pub(crate) const AREA_RATE_LOW: u64 = 600;
pub(crate) const AREA_RATE_HIGH: u64 = 800;

/// `(room, % of the floor area, €/m² low, €/m² high)`. Bathroom and kitchen are priced
/// above living areas and hallways; weighted by area the bands add up to 600–800 €/m².
pub const FALLBACK_BANDS: [(RoomCategory, u64, u64, u64); 4] = [
    (RoomCategory::LivingArea, 50, 550, 750),
    (RoomCategory::Bathroom, 20, 750, 950),
    (RoomCategory::Kitchen, 20, 650, 850),
    (RoomCategory::Hallway, 10, 450, 650),
];

const FALLBACK_JUSTIFICATION: &str =
    "No se pudieron analizar las imágenes; estimación aproximada según la superficie.";
const FALLBACK_COMMENT: &str =
    "Este análisis es aproximado ya que no se pudieron analizar las imágenes.";

pub(crate) fn area_total(area_m2: f64) -> CostRange {
    CostRange::for_area(area_m2, AREA_RATE_LOW, AREA_RATE_HIGH)
}

/// Area-only report; no network, same input always gives the same report.
pub fn fallback_report(area_m2: f64) -> AnalysisReport {
    let verdicts: IndexMap<RoomCategory, RoomVerdict> = FALLBACK_BANDS
        .iter()
        .map(|&(category, percent, low, high)| {
            let share = CostRange::for_area_share(area_m2, percent, low, high);
            (
                category,
                RoomVerdict {
                    needs_renovation: RenovationNeed::Unknown,
                    justification: FALLBACK_JUSTIFICATION.to_string(),
                    items_to_renovate: UNKNOWN_TEXT.to_string(),
                    estimated_cost: share.to_string(),
                },
            )
        })
        .collect();

    AnalysisReport::new(
        verdicts,
        area_total(area_m2),
        ConfidenceLevel::Low,
        FALLBACK_COMMENT,
        ReportOrigin::AreaHeuristic,
    )
}

/// Single-figure estimate at 700 €/m², shown next to the area-only report.
pub fn midpoint_estimate(area_m2: f64) -> u64 {
    CostRange::for_area(area_m2, 700, 700).low
}

#[cfg(test)]
mod tests {
    use reforma_contracts::report::{ConfidenceLevel, CostRange, ReportOrigin};
    use reforma_contracts::rooms::RoomCategory;

    use super::{fallback_report, midpoint_estimate, FALLBACK_BANDS};

    #[test]
    fn weighted_bands_match_the_area_rate() {
        let low: u64 = FALLBACK_BANDS.iter().map(|(_, pct, low, _)| pct * low).sum();
        let high: u64 = FALLBACK_BANDS.iter().map(|(_, pct, _, high)| pct * high).sum();
        assert_eq!((low, high), (600 * 100, 800 * 100));
        let percent: u64 = FALLBACK_BANDS.iter().map(|(_, pct, _, _)| pct).sum();
        assert_eq!(percent, 100);
    }

    #[test]
    fn breakdown_sums_to_total_within_rounding() {
        for area in [1.0, 37.5, 80.0, 90.0, 123.45, 1000.0] {
            let report = fallback_report(area);
            let sum = report
                .rooms()
                .values()
                .filter_map(|verdict| CostRange::parse(&verdict.estimated_cost))
                .fold(CostRange::default(), |acc, range| acc + range);
            let total = report.total();
            assert!(total.low.abs_diff(sum.low) <= 4, "area {area}: {sum:?} vs {total:?}");
            assert!(total.high.abs_diff(sum.high) <= 4, "area {area}: {sum:?} vs {total:?}");
        }
    }

    #[test]
    fn fallback_report_is_low_confidence_and_complete() {
        let report = fallback_report(80.0);
        assert_eq!(report.confidence(), ConfidenceLevel::Low);
        assert_eq!(report.origin(), ReportOrigin::AreaHeuristic);
        assert_eq!(report.total().to_string(), "48000 - 64000 €");
        assert_eq!(report.rooms().len(), 4);
        assert_eq!(
            report.rooms()[&RoomCategory::LivingArea].estimated_cost,
            "22000 - 30000 €"
        );
        assert!(report
            .rooms()
            .values()
            .all(|verdict| verdict.is_unknown() && verdict.justification.contains("aproximada")));
    }

    #[test]
    fn zero_area_gives_zero_total() {
        assert_eq!(fallback_report(0.0).total(), CostRange::default());
        assert_eq!(midpoint_estimate(80.0), 56000);
    }
}
