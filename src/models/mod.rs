use std::collections::BTreeSet;
use std::fmt;

/// Written in place of the condition when the page has no condition label
pub const NO_CONDITION: &str = "no condition";

/// Written in place of the rating when the page has no rating
pub const NO_RATING: &str = "no rating";

/// A numeric-looking value scraped from the page.
///
/// Well-formed values are kept as numbers, anything else keeps the raw text
/// so the row can still be written.
#[derive(Debug, Clone, PartialEq)]
pub enum Numeric {
    Value(f64),
    Raw(String),
}

impl Numeric {
    pub fn parse(text: &str) -> Self {
        match parse_number(text) {
            Some(v) => Numeric::Value(v),
            None => Numeric::Raw(text.to_string()),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Numeric::Value(_))
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Value(v) => write!(f, "{}", v),
            Numeric::Raw(s) => f.write_str(s),
        }
    }
}

/// Parse a number as the site prints it: spaces or NBSP as thousands
/// separators, comma as the decimal mark.
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{00A0}' && *c != '\u{202F}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Attributes shared by every unit of one property
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyInfo {
    pub location: String,
    pub amenities: BTreeSet<String>,
    pub energy_class: String,
    pub condition: String,
    pub renovation_year: Numeric,
    pub building_year: Numeric,
    /// `None` when the page shows no rating
    pub rating: Option<Numeric>,
}

impl PropertyInfo {
    /// False when a numeric-looking field had to fall back to raw text
    pub fn numeric_valid(&self) -> bool {
        self.renovation_year.is_valid()
            && self.building_year.is_valid()
            && self.rating.as_ref().map_or(true, Numeric::is_valid)
    }

    pub fn rating_text(&self) -> String {
        match &self.rating {
            Some(rating) => rating.to_string(),
            None => NO_RATING.to_string(),
        }
    }
}

/// One apartment unit variant, the atomic output row
#[derive(Debug, Clone, PartialEq)]
pub struct UnitRecord {
    pub property: PropertyInfo,
    pub unit_type: String,
    pub address: String,
    pub rooms: String,
    pub surface_area: f64,
    pub count: u32,
    pub rent: f64,
}
