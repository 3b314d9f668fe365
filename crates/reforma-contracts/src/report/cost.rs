use std::fmt;
use std::ops::Add;

/// Inclusive euro range, rendered as `"<low> - <high> €"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CostRange {
    pub low: u64,
    pub high: u64,
}

impl CostRange {
    pub fn new(low: u64, high: u64) -> Self {
        Self { low, high }
    }

    /// `area × rate` for both bounds, truncated to whole euros. Negative or NaN areas
    /// yield zero.
    pub fn for_area(area_m2: f64, low_rate: u64, high_rate: u64) -> Self {
        Self {
            low: truncate_euros(area_m2 * low_rate as f64),
            high: truncate_euros(area_m2 * high_rate as f64),
        }
    }

    /// Share of an area priced at its own band; `percent` is the share of the area.
    pub fn for_area_share(area_m2: f64, percent: u64, low_rate: u64, high_rate: u64) -> Self {
        Self {
            low: truncate_euros(area_m2 * (low_rate * percent) as f64 / 100.0),
            high: truncate_euros(area_m2 * (high_rate * percent) as f64 / 100.0),
        }
    }

    /// Tolerant reading of a free-text range such as `"1.200 - 1.500 €"`.
    ///
    /// The text must split on `-` into exactly two sides; each side keeps only its
    /// digits and must have at least one. Anything else is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut sides = raw.split('-');
        let low = sides.next()?;
        let high = sides.next()?;
        if sides.next().is_some() {
            return None;
        }
        Some(Self {
            low: digits_only(low)?,
            high: digits_only(high)?,
        })
    }
}

impl Add for CostRange {
    type Output = CostRange;

    fn add(self, other: CostRange) -> CostRange {
        CostRange {
            low: self.low.saturating_add(other.low),
            high: self.high.saturating_add(other.high),
        }
    }
}

impl fmt::Display for CostRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} €", self.low, self.high)
    }
}

fn digits_only(side: &str) -> Option<u64> {
    let digits: String = side.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

fn truncate_euros(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::CostRange;

    #[test]
    fn parse_ignores_non_digits_on_each_side() {
        assert_eq!(CostRange::parse("500 - 700 €"), Some(CostRange::new(500, 700)));
        assert_eq!(
            CostRange::parse("1.200 - 1.500 €"),
            Some(CostRange::new(1200, 1500))
        );
        assert_eq!(
            CostRange::parse("entre 3000€-4500€ aprox"),
            Some(CostRange::new(3000, 4500))
        );
    }

    #[test]
    fn parse_is_stable_on_its_own_output() {
        let range = CostRange::new(500, 700);
        assert_eq!(CostRange::parse(&range.to_string()), Some(range));
    }

    #[test]
    fn parse_rejects_unusable_text() {
        assert_eq!(CostRange::parse("Desconocido"), None);
        assert_eq!(CostRange::parse("No disponible"), None);
        assert_eq!(CostRange::parse("1500 €"), None);
        assert_eq!(CostRange::parse("1000 - 2000 - 3000"), None);
        assert_eq!(CostRange::parse("mucho - poco"), None);
        assert_eq!(CostRange::parse(""), None);
    }

    #[test]
    fn area_ranges_truncate() {
        assert_eq!(CostRange::for_area(90.0, 600, 800), CostRange::new(54000, 72000));
        assert_eq!(CostRange::for_area(85.5, 600, 800), CostRange::new(51300, 68400));
        assert_eq!(CostRange::for_area(-3.0, 600, 800), CostRange::default());
        assert_eq!(
            CostRange::for_area_share(80.0, 20, 750, 950),
            CostRange::new(12000, 15200)
        );
    }

    #[test]
    fn addition_sums_both_bounds() {
        let total = CostRange::new(1000, 1500) + CostRange::new(200, 300);
        assert_eq!(total, CostRange::new(1200, 1800));
        assert_eq!(total.to_string(), "1200 - 1800 €");
    }
}
