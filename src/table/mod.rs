use crate::models::UnitRecord;
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Scalar columns, written before the amenity columns
pub const BASE_COLUMNS: [&str; 13] = [
    "location",
    "energy_class",
    "condition",
    "renovation_year",
    "building_year",
    "type",
    "address",
    "rooms",
    "surface_area",
    "count",
    "rent",
    "rating",
    "numeric_valid",
];

/// The flat output table with one binary column per amenity
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub amenities: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Pivot the records. Amenity columns are the union over all records,
    /// sorted by name.
    pub fn from_records(records: &[UnitRecord]) -> Self {
        let amenities: Vec<String> = records
            .iter()
            .flat_map(|r| r.property.amenities.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let rows = records.iter().map(|r| row(r, &amenities)).collect();

        Self { amenities, rows }
    }

    pub fn header(&self) -> Vec<String> {
        BASE_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.amenities.iter().cloned())
            .collect()
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(self.header())?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        self.write_csv(file)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("💾 Saved {} rows to {}", self.rows.len(), path.display());
        Ok(())
    }
}

fn row(record: &UnitRecord, amenities: &[String]) -> Vec<String> {
    let info = &record.property;
    let mut row = vec![
        info.location.clone(),
        info.energy_class.clone(),
        info.condition.clone(),
        info.renovation_year.to_string(),
        info.building_year.to_string(),
        record.unit_type.clone(),
        record.address.clone(),
        record.rooms.clone(),
        record.surface_area.to_string(),
        record.count.to_string(),
        record.rent.to_string(),
        info.rating_text(),
        flag(info.numeric_valid()),
    ];
    row.extend(amenities.iter().map(|a| flag(info.amenities.contains(a))));
    row
}

fn flag(set: bool) -> String {
    let value = if set { "1" } else { "0" };
    value.to_string()
}
