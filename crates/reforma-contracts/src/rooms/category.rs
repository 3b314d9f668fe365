use serde::{Deserialize, Serialize};

/// Room label attached to a listing photo.
///
/// The set is closed: every photo lands in exactly one category and anything the
/// listing provider labels differently is treated as [`RoomCategory::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomCategory {
    LivingArea,
    Bathroom,
    Hallway,
    View,
    Kitchen,
    Unknown,
}

impl RoomCategory {
    /// Bucket order, matching the order the listing provider groups its photos in.
    pub const ALL: [RoomCategory; 6] = [
        RoomCategory::LivingArea,
        RoomCategory::Bathroom,
        RoomCategory::Hallway,
        RoomCategory::View,
        RoomCategory::Kitchen,
        RoomCategory::Unknown,
    ];

    /// Categories that appear in the report, in report order.
    pub const SURFACED: [RoomCategory; 4] = [
        RoomCategory::LivingArea,
        RoomCategory::Bathroom,
        RoomCategory::Kitchen,
        RoomCategory::Hallway,
    ];

    /// Label used by the listing provider (`localizedName`).
    pub fn source_label(self) -> &'static str {
        match self {
            RoomCategory::LivingArea => "Estancia",
            RoomCategory::Bathroom => "Baño",
            RoomCategory::Hallway => "Pasillo",
            RoomCategory::View => "Vistas",
            RoomCategory::Kitchen => "Cocina",
            RoomCategory::Unknown => "Desconocido",
        }
    }

    /// Verbatim match against the five known provider labels.
    pub fn from_source_label(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .filter(|category| *category != RoomCategory::Unknown)
            .find(|category| category.source_label() == label)
            .unwrap_or(RoomCategory::Unknown)
    }

    /// Key under which the category is reported.
    pub fn report_key(self) -> &'static str {
        match self {
            RoomCategory::LivingArea => "estancias",
            RoomCategory::Bathroom => "baños",
            RoomCategory::Kitchen => "cocina",
            RoomCategory::Hallway => "pasillo",
            RoomCategory::View => "vistas",
            RoomCategory::Unknown => "desconocido",
        }
    }

    /// Capitalized report key, used as the row title of the tabular exports.
    pub fn display_name(self) -> String {
        let key = self.report_key();
        let mut chars = key.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    pub fn is_surfaced(self) -> bool {
        Self::SURFACED.contains(&self)
    }
}

/// A listing photo paired with the category it was bucketed into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    category: RoomCategory,
    url: String,
}

impl ImageRef {
    pub fn new(category: RoomCategory, url: impl Into<String>) -> Self {
        Self {
            category,
            url: url.into(),
        }
    }

    pub fn category(&self) -> RoomCategory {
        self.category
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::RoomCategory;

    #[test]
    fn source_labels_match_verbatim() {
        assert_eq!(RoomCategory::from_source_label("Cocina"), RoomCategory::Kitchen);
        assert_eq!(RoomCategory::from_source_label("Baño"), RoomCategory::Bathroom);
        assert_eq!(RoomCategory::from_source_label("cocina"), RoomCategory::Unknown);
        assert_eq!(RoomCategory::from_source_label("Bano"), RoomCategory::Unknown);
        assert_eq!(RoomCategory::from_source_label("Terraza"), RoomCategory::Unknown);
        assert_eq!(
            RoomCategory::from_source_label("Desconocido"),
            RoomCategory::Unknown
        );
    }

    #[test]
    fn surfaced_categories_use_report_order() {
        let keys: Vec<&str> = RoomCategory::SURFACED
            .iter()
            .map(|category| category.report_key())
            .collect();
        assert_eq!(keys, vec!["estancias", "baños", "cocina", "pasillo"]);
        assert!(!RoomCategory::View.is_surfaced());
        assert!(!RoomCategory::Unknown.is_surfaced());
    }

    #[test]
    fn display_name_capitalizes_non_ascii_keys() {
        assert_eq!(RoomCategory::Bathroom.display_name(), "Baños");
        assert_eq!(RoomCategory::LivingArea.display_name(), "Estancias");
    }
}
