use crate::models::{parse_number, Numeric, PropertyInfo, UnitRecord, NO_CONDITION};
use crate::scrapers::error::ExtractError;
use crate::scrapers::types::ExtractionSchema;
use anyhow::{anyhow, Result};
use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

struct Selectors {
    services: Selector,
    condition_span: Selector,
    basic_info: Selector,
    basic_info_row: Selector,
    basic_info_label: Selector,
    basic_info_value: Selector,
    location: Selector,
    rating: Selector,
    apartments: Selector,
    apartment_type: Selector,
    apartment_type_name: Selector,
    apartment_entry: Selector,
    address: Selector,
    surface_area: Selector,
    count: Selector,
    rent: Selector,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector {:?}: {}", css, e))
}

impl Selectors {
    fn compile(schema: &ExtractionSchema) -> Result<Self> {
        Ok(Self {
            services: selector(&schema.services)?,
            condition_span: selector(&schema.condition_span)?,
            basic_info: selector(&schema.basic_info)?,
            basic_info_row: selector(&schema.basic_info_row)?,
            basic_info_label: selector(&schema.basic_info_label)?,
            basic_info_value: selector(&schema.basic_info_value)?,
            location: selector(&schema.location)?,
            rating: selector(&schema.rating)?,
            apartments: selector(&schema.apartments)?,
            apartment_type: selector(&schema.apartment_type)?,
            apartment_type_name: selector(&schema.apartment_type_name)?,
            apartment_entry: selector(&schema.apartment_entry)?,
            address: selector(&schema.address)?,
            surface_area: selector(&schema.surface_area)?,
            count: selector(&schema.count)?,
            rent: selector(&schema.rent)?,
        })
    }
}

/// Turns a property detail page into one record per apartment unit
pub struct PropertyExtractor {
    schema: ExtractionSchema,
    selectors: Selectors,
}

impl PropertyExtractor {
    pub fn new(schema: ExtractionSchema) -> Result<Self> {
        let selectors = Selectors::compile(&schema)?;
        Ok(Self { schema, selectors })
    }

    /// Extract every unit listed on the page.
    ///
    /// A page without the apartment listing yields no records. Any missing
    /// required element fails the whole property.
    pub fn extract(&self, document: &Html) -> Result<Vec<UnitRecord>, ExtractError> {
        let apartments = match document.select(&self.selectors.apartments).next() {
            Some(el) => el,
            None => {
                debug!("No apartment listing on page");
                return Ok(Vec::new());
            }
        };

        // Property-level fields are only read once a unit entry needs them
        let mut info: Option<PropertyInfo> = None;
        let mut records = Vec::new();
        for group in apartments.select(&self.selectors.apartment_type) {
            let unit_type = self.required_text(
                group,
                &self.selectors.apartment_type_name,
                &self.schema.apartment_type_name,
            )?;

            for entry in group.select(&self.selectors.apartment_entry) {
                let shared = match info.take() {
                    Some(shared) => shared,
                    None => self.property_info(document)?,
                };
                records.push(self.unit(entry, &unit_type, &shared)?);
                info = Some(shared);
            }
        }

        Ok(records)
    }

    fn property_info(&self, document: &Html) -> Result<PropertyInfo, ExtractError> {
        let basic_info = self.basic_info(document)?;
        let lookup = |label: &str| {
            basic_info
                .get(label)
                .map(String::as_str)
                .ok_or_else(|| ExtractError::MissingBasicInfoRow(label.to_string()))
        };

        let energy_class = lookup(&self.schema.energy_class_label)?.to_string();
        let renovation_year =
            Numeric::parse(last_listed(lookup(&self.schema.renovation_year_label)?));
        let building_year =
            Numeric::parse(last_listed(lookup(&self.schema.building_year_label)?));

        let location = document
            .select(&self.selectors.location)
            .next()
            .map(element_text)
            .ok_or_else(|| ExtractError::MissingRequired(self.schema.location.clone()))?;

        let rating = document
            .select(&self.selectors.rating)
            .next()
            .map(|el| {
                let text = element_text(el);
                Numeric::parse(strip_unit(&text, &self.schema.rating_suffix))
            });

        Ok(PropertyInfo {
            location,
            amenities: self.amenities(document),
            energy_class,
            condition: self.condition(document),
            renovation_year,
            building_year,
            rating,
        })
    }

    fn amenities(&self, document: &Html) -> BTreeSet<String> {
        let services = match document.select(&self.selectors.services).next() {
            Some(el) => el.text().collect::<String>(),
            None => return BTreeSet::new(),
        };

        // First non-blank line is the section heading
        services
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .skip(1)
            .map(str::to_string)
            .collect()
    }

    fn condition(&self, document: &Html) -> String {
        let marker = self.schema.condition_marker.as_str();

        // Only a span's own text counts, so a wrapping span never matches
        document
            .select(&self.selectors.condition_span)
            .map(|el| {
                el.children()
                    .filter_map(|node| node.value().as_text())
                    .map(|text| &**text)
                    .collect::<String>()
            })
            .map(|text| text.trim().to_string())
            .find(|text| text.contains(marker))
            .map(|text| {
                let stripped = text.strip_prefix(marker).unwrap_or(&text);
                stripped.trim().to_string()
            })
            .unwrap_or_else(|| NO_CONDITION.to_string())
    }

    fn basic_info(&self, document: &Html) -> Result<HashMap<String, String>, ExtractError> {
        let table = document
            .select(&self.selectors.basic_info)
            .next()
            .ok_or(ExtractError::MissingBasicInfo)?;

        let mut rows = HashMap::new();
        for row in table.select(&self.selectors.basic_info_row) {
            let label = row.select(&self.selectors.basic_info_label).next();
            let value = row.select(&self.selectors.basic_info_value).next();
            match (label, value) {
                (Some(label), Some(value)) => {
                    rows.insert(element_text(label), element_text(value));
                }
                _ => debug!("Skipping basic info row without label or value"),
            }
        }

        Ok(rows)
    }

    fn unit(
        &self,
        entry: ElementRef,
        unit_type: &str,
        info: &PropertyInfo,
    ) -> Result<UnitRecord, ExtractError> {
        let selectors = &self.selectors;
        let schema = &self.schema;

        let address_and_rooms = self.required_text(entry, &selectors.address, &schema.address)?;
        let (address, rooms) = split_address(&address_and_rooms);

        let surface_area =
            self.required_text(entry, &selectors.surface_area, &schema.surface_area)?;
        let count = self.required_text(entry, &selectors.count, &schema.count)?;
        let rent = self.required_text(entry, &selectors.rent, &schema.rent)?;

        Ok(UnitRecord {
            property: info.clone(),
            unit_type: unit_type.to_string(),
            address,
            rooms,
            surface_area: number_field(
                "surface_area",
                strip_unit(&surface_area, &schema.surface_area_suffix),
            )?,
            count: count_field(strip_unit(&count, &schema.count_suffix))?,
            rent: number_field("rent", strip_unit(&rent, &schema.rent_suffix))?,
        })
    }

    fn required_text(
        &self,
        parent: ElementRef,
        selector: &Selector,
        css: &str,
    ) -> Result<String, ExtractError> {
        parent
            .select(selector)
            .next()
            .map(element_text)
            .ok_or_else(|| ExtractError::MissingRequired(css.to_string()))
    }
}

fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Remove a trailing unit such as `m²`, `kpl` or `€`.
/// Text without the unit is returned unchanged apart from trimming.
pub fn strip_unit<'a>(text: &'a str, unit: &str) -> &'a str {
    let text = text.trim();
    match text.strip_suffix(unit) {
        Some(rest) => rest.trim_end(),
        None => text,
    }
}

/// `"1975, 2012"` -> `"2012"`
fn last_listed(value: &str) -> &str {
    value.split(", ").last().unwrap_or(value).trim()
}

/// Split `"Kitarakuja 1 A 2, 2h+k"` into address and room count: the first
/// comma segment is the address and the last one the rooms.
pub fn split_address(text: &str) -> (String, String) {
    let address = text.split(", ").next().unwrap_or(text).trim().to_string();
    let rooms = text.split(", ").last().unwrap_or(text).trim().to_string();
    (address, rooms)
}

fn number_field(field: &str, raw: &str) -> Result<f64, ExtractError> {
    parse_number(raw).ok_or_else(|| ExtractError::MalformedNumber {
        field: field.to_string(),
        raw: raw.to_string(),
    })
}

fn count_field(raw: &str) -> Result<u32, ExtractError> {
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    cleaned.parse::<u32>().map_err(|_| ExtractError::MalformedNumber {
        field: "count".to_string(),
        raw: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NO_RATING;

    fn extractor() -> PropertyExtractor {
        PropertyExtractor::new(ExtractionSchema::default()).unwrap()
    }

    const SERVICES: &str = r#"
        <div class="services_list">
            <h3>Palvelut</h3>
            <ul>
                <li>Sauna</li>
                <li>Pesutupa</li>

                <li>Kuntosali</li>
            </ul>
        </div>"#;

    const BASIC_INFO: &str = r#"
        <div class="property-table w-100 col-12">
            <div class="row">
                <div class="col-12 col-md-3">Energialuokka</div>
                <div class="col-12 col-md-9">C2018</div>
            </div>
            <div class="row">
                <div class="col-12 col-md-3">Perusparannusvuosi</div>
                <div class="col-12 col-md-9">1998, 2015</div>
            </div>
            <div class="row">
                <div class="col-12 col-md-3">Rakennusvuosi</div>
                <div class="col-12 col-md-9">1975</div>
            </div>
            <div class="row"><div class="col-12">Hissi</div></div>
        </div>"#;

    const APARTMENTS: &str = r#"
        <div class="element-property-apartments-listing--content">
            <div class="single-container">
                <div class="type">Yksiöt</div>
                <div class="element-block apartment-info">
                    <div class="apartment-address">Kitarakuja 1 A 2, 1h+kk</div>
                    <div class="surface-area">25 m²</div>
                    <div class="count">12 kpl</div>
                    <div class="rent">550 €</div>
                </div>
                <div class="element-block apartment-info">
                    <div class="apartment-address">Kitarakuja 1 B 7, 1h+k</div>
                    <div class="surface-area">31,5 m²</div>
                    <div class="count">4 kpl</div>
                    <div class="rent">1&nbsp;020 €</div>
                </div>
            </div>
            <div class="single-container">
                <div class="type">Kaksiot</div>
                <div class="element-block apartment-info">
                    <div class="apartment-address">Kitarakuja 1 C 9, 2h+k</div>
                    <div class="surface-area">45 m²</div>
                    <div class="count">3 kpl</div>
                    <div class="rent">850 €</div>
                </div>
            </div>
        </div>"#;

    const LOCATION: &str = r#"<span class="location">Kannelmäki</span>"#;

    fn page(parts: &[&str]) -> Html {
        Html::parse_document(&format!("<html><body>{}</body></html>", parts.concat()))
    }

    fn full_page() -> Html {
        page(&[
            LOCATION,
            r#"<span class="rating">4.2/5</span>"#,
            r#"<span>Kohteen kunto: Hyvä</span>"#,
            SERVICES,
            BASIC_INFO,
            APARTMENTS,
        ])
    }

    #[test]
    fn extracts_every_unit_entry() {
        let records = extractor().extract(&full_page()).unwrap();
        assert_eq!(records.len(), 3);

        let first = &records[0];
        assert_eq!(first.unit_type, "Yksiöt");
        assert_eq!(first.address, "Kitarakuja 1 A 2");
        assert_eq!(first.rooms, "1h+kk");
        assert_eq!(first.surface_area, 25.0);
        assert_eq!(first.count, 12);
        assert_eq!(first.rent, 550.0);

        assert_eq!(records[1].surface_area, 31.5);
        assert_eq!(records[1].rent, 1020.0);
        assert_eq!(records[2].unit_type, "Kaksiot");
        assert_eq!(records[2].rooms, "2h+k");
    }

    #[test]
    fn property_fields_are_shared_by_all_units() {
        let records = extractor().extract(&full_page()).unwrap();
        let info = &records[0].property;

        assert_eq!(info.location, "Kannelmäki");
        assert_eq!(info.energy_class, "C2018");
        assert_eq!(info.condition, "Hyvä");
        assert_eq!(info.renovation_year, Numeric::Value(2015.0));
        assert_eq!(info.building_year, Numeric::Value(1975.0));
        assert_eq!(info.rating, Some(Numeric::Value(4.2)));

        let amenities: Vec<&str> = info.amenities.iter().map(String::as_str).collect();
        assert_eq!(amenities, vec!["Kuntosali", "Pesutupa", "Sauna"]);

        assert!(records.iter().all(|r| &r.property == info));
    }

    #[test]
    fn missing_listing_yields_no_records() {
        let without_listing = page(&[SERVICES, BASIC_INFO, LOCATION]);
        assert!(extractor().extract(&without_listing).unwrap().is_empty());

        let bare = page(&["<p>Nothing here</p>"]);
        assert!(extractor().extract(&bare).unwrap().is_empty());
    }

    #[test]
    fn listing_without_entries_needs_no_basic_info() {
        let empty = r#"<div class="element-property-apartments-listing--content"></div>"#;
        assert_eq!(extractor().extract(&page(&[LOCATION, empty])), Ok(Vec::new()));

        let no_units = r#"
            <div class="element-property-apartments-listing--content">
                <div class="single-container"><div class="type">Yksiöt</div></div>
            </div>"#;
        assert_eq!(extractor().extract(&page(&[LOCATION, no_units])), Ok(Vec::new()));
    }

    #[test]
    fn condition_comes_from_the_innermost_span() {
        let nested = r#"<span class="meta">Vuokrakohde <span>Kohteen kunto: Hyvä</span></span>"#;
        let doc = page(&[LOCATION, nested, BASIC_INFO, APARTMENTS]);
        let records = extractor().extract(&doc).unwrap();
        assert_eq!(records[0].property.condition, "Hyvä");
    }

    #[test]
    fn optional_fields_fall_back_to_sentinels() {
        let doc = page(&[LOCATION, BASIC_INFO, APARTMENTS]);
        let records = extractor().extract(&doc).unwrap();
        let info = &records[0].property;

        assert!(info.amenities.is_empty());
        assert_eq!(info.condition, NO_CONDITION);
        assert_eq!(info.rating, None);
        assert_eq!(info.rating_text(), NO_RATING);
    }

    #[test]
    fn missing_location_fails_the_property() {
        let doc = page(&[BASIC_INFO, APARTMENTS]);
        assert_eq!(
            extractor().extract(&doc),
            Err(ExtractError::MissingRequired("span.location".to_string()))
        );
    }

    #[test]
    fn missing_basic_info_fails_the_property() {
        let doc = page(&[LOCATION, APARTMENTS]);
        assert_eq!(extractor().extract(&doc), Err(ExtractError::MissingBasicInfo));
    }

    #[test]
    fn missing_basic_info_row_fails_the_property() {
        let table = BASIC_INFO.replace("Energialuokka", "Lämmitys");
        let doc = page(&[LOCATION, table.as_str(), APARTMENTS]);
        assert_eq!(
            extractor().extract(&doc),
            Err(ExtractError::MissingBasicInfoRow("Energialuokka".to_string()))
        );
    }

    #[test]
    fn malformed_rent_fails_the_property() {
        let listing = APARTMENTS.replace("850 €", "kysy €");
        let doc = page(&[LOCATION, BASIC_INFO, listing.as_str()]);
        assert_eq!(
            extractor().extract(&doc),
            Err(ExtractError::MalformedNumber {
                field: "rent".to_string(),
                raw: "kysy".to_string(),
            })
        );
    }

    #[test]
    fn unparsable_year_keeps_raw_text() {
        let table = BASIC_INFO.replace("1975", "ei tiedossa");
        let doc = page(&[LOCATION, table.as_str(), APARTMENTS]);
        let records = extractor().extract(&doc).unwrap();
        assert_eq!(records[0].property.building_year, Numeric::Raw("ei tiedossa".to_string()));
        assert!(!records[0].property.numeric_valid());
    }

    #[test]
    fn strips_units_exactly_once() {
        assert_eq!(strip_unit("25 m²", "m²"), "25");
        assert_eq!(strip_unit("3 kpl", "kpl"), "3");
        assert_eq!(strip_unit("950 €", "€"), "950");
        assert_eq!(strip_unit("4.2/5", "/5"), "4.2");
        assert_eq!(strip_unit("950", "€"), "950");

        let cases = [("25 m²", "m²"), ("3 kpl", "kpl"), ("950 €", "€"), ("12", "kpl")];
        for (text, unit) in cases {
            let once = strip_unit(text, unit);
            assert_eq!(strip_unit(once, unit), once);
        }
    }

    #[test]
    fn address_split_uses_first_and_last_segment() {
        assert_eq!(
            split_address("Kitarakuja 1 A 2, 2 rooms"),
            ("Kitarakuja 1 A 2".to_string(), "2 rooms".to_string())
        );
        assert_eq!(
            split_address("Kitarakuja 1, A 2, 2 rooms"),
            ("Kitarakuja 1".to_string(), "2 rooms".to_string())
        );
        assert_eq!(
            split_address("Kitarakuja 1"),
            ("Kitarakuja 1".to_string(), "Kitarakuja 1".to_string())
        );
    }

    #[test]
    fn years_take_the_last_listed_value() {
        assert_eq!(last_listed("1998, 2015"), "2015");
        assert_eq!(last_listed("1975"), "1975");
    }
}
