use indexmap::IndexMap;
use reforma_contracts::rooms::{ImageRef, RoomCategory};

/// Listing photos grouped by room, all six categories always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomBuckets {
    buckets: IndexMap<RoomCategory, Vec<String>>,
}

impl RoomBuckets {
    /// Buckets `(label, url)` pairs, keeping arrival order inside each bucket.
    pub fn from_images<I, L, U>(images: I) -> Self
    where
        I: IntoIterator<Item = (L, U)>,
        L: AsRef<str>,
        U: Into<String>,
    {
        let mut buckets: IndexMap<RoomCategory, Vec<String>> = RoomCategory::ALL
            .into_iter()
            .map(|category| (category, Vec::new()))
            .collect();
        for (label, url) in images {
            let category = RoomCategory::from_source_label(label.as_ref());
            buckets.entry(category).or_default().push(url.into());
        }
        Self { buckets }
    }

    pub fn urls(&self, category: RoomCategory) -> &[String] {
        self.buckets
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The only photo of a room that is ever sent to the model.
    pub fn sample(&self, category: RoomCategory) -> Option<ImageRef> {
        self.urls(category)
            .first()
            .map(|url| ImageRef::new(category, url.clone()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (RoomCategory, &[String])> {
        self.buckets
            .iter()
            .map(|(category, urls)| (*category, urls.as_slice()))
    }

    pub fn total_images(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}
