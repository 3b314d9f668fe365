use serde::{Deserialize, Serialize};

pub const UNKNOWN_TEXT: &str = "Desconocido";

const NOT_ANALYZED_JUSTIFICATION: &str = "No analizado";
const NOT_SPECIFIED_ITEMS: &str = "No especificado";
const NOT_AVAILABLE_COST: &str = "No disponible";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenovationNeed {
    #[serde(rename = "si")]
    Yes,
    #[serde(rename = "no")]
    No,
    #[serde(rename = "?")]
    Unknown,
}

impl RenovationNeed {
    /// Lenient reading of the model's answer; anything unrecognized is unknown.
    pub fn from_answer(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase();
        match lowered.trim_end_matches(['.', '!']) {
            "si" | "sí" | "yes" | "true" => RenovationNeed::Yes,
            "no" | "false" => RenovationNeed::No,
            _ => RenovationNeed::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RenovationNeed::Yes => "si",
            RenovationNeed::No => "no",
            RenovationNeed::Unknown => "?",
        }
    }
}

/// Per-room judgement, either from the vision model or a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomVerdict {
    pub needs_renovation: RenovationNeed,
    pub justification: String,
    pub items_to_renovate: String,
    pub estimated_cost: String,
}

impl RoomVerdict {
    /// Placeholder used when a room could not be judged; the justification says why.
    pub fn unknown(justification: impl Into<String>) -> Self {
        Self {
            needs_renovation: RenovationNeed::Unknown,
            justification: justification.into(),
            items_to_renovate: UNKNOWN_TEXT.to_string(),
            estimated_cost: UNKNOWN_TEXT.to_string(),
        }
    }

    /// Placeholder for a surfaced room the pipeline never produced a verdict for.
    pub fn not_analyzed() -> Self {
        Self {
            needs_renovation: RenovationNeed::Unknown,
            justification: NOT_ANALYZED_JUSTIFICATION.to_string(),
            items_to_renovate: NOT_SPECIFIED_ITEMS.to_string(),
            estimated_cost: NOT_AVAILABLE_COST.to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.needs_renovation == RenovationNeed::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::{RenovationNeed, RoomVerdict};

    #[test]
    fn renovation_need_reads_common_answers() {
        assert_eq!(RenovationNeed::from_answer("si"), RenovationNeed::Yes);
        assert_eq!(RenovationNeed::from_answer(" Sí "), RenovationNeed::Yes);
        assert_eq!(RenovationNeed::from_answer("NO."), RenovationNeed::No);
        assert_eq!(RenovationNeed::from_answer("?"), RenovationNeed::Unknown);
        assert_eq!(RenovationNeed::from_answer("quizás"), RenovationNeed::Unknown);
    }

    #[test]
    fn renovation_need_wire_form() -> anyhow::Result<()> {
        assert_eq!(serde_json::to_string(&RenovationNeed::Yes)?, "\"si\"");
        assert_eq!(serde_json::to_string(&RenovationNeed::Unknown)?, "\"?\"");
        Ok(())
    }

    #[test]
    fn placeholders_are_unknown() {
        let verdict = RoomVerdict::unknown("No hay imágenes disponibles de Cocina.");
        assert!(verdict.is_unknown());
        assert_eq!(verdict.estimated_cost, "Desconocido");
        assert_eq!(RoomVerdict::not_analyzed().justification, "No analizado");
    }
}
