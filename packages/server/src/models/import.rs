use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{AppError, RowError};

use super::plant::{PlantDraft, PlantRequest, validate_plant};
use super::shared::Violations;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CsvImportResponse {
    /// Number of plants created.
    #[schema(example = 12)]
    pub created: usize,
}

/// One data row keyed by lowercased header name.
struct CsvRow(HashMap<String, String>);

impl CsvRow {
    fn cell(&self, column: &str) -> &str {
        self.0.get(column).map(String::as_str).unwrap_or("")
    }

    fn text(&self, column: &str) -> String {
        self.cell(column).to_string()
    }

    fn text_or(&self, column: &str, default: &str) -> String {
        match self.cell(column) {
            "" => default.to_string(),
            value => value.to_string(),
        }
    }

    fn season(&self, column: &str) -> Option<String> {
        match self.cell(column) {
            "" => None,
            value => Some(value.to_string()),
        }
    }

    fn flag(&self, column: &str) -> bool {
        self.cell(column).eq_ignore_ascii_case("true")
    }

    fn integer(&self, column: &str, default: i64, v: &mut Violations) -> i64 {
        match self.cell(column) {
            "" => default,
            raw => raw.parse().unwrap_or_else(|_| {
                v.add(column, "A valid integer is required.");
                default
            }),
        }
    }

    fn decimal(&self, column: &str, default: Decimal, v: &mut Violations) -> Decimal {
        match self.cell(column) {
            "" => default,
            raw => Decimal::from_str(raw).unwrap_or_else(|_| {
                v.add(column, "A valid number is required.");
                default
            }),
        }
    }

    /// Build a plant body with the declared defaults for empty or missing cells.
    fn to_request(&self, v: &mut Violations) -> PlantRequest {
        let d = PlantRequest::default();
        PlantRequest {
            common_name: self.text("common_name"),
            scientific_name: self.text("scientific_name"),
            description: self.text("description"),
            care_instructions: self.text("care_instructions"),
            planting_instructions: self.text("planting_instructions"),
            light_requirement: self.text_or("light_requirement", &d.light_requirement),
            water_requirement: self.text_or("water_requirement", &d.water_requirement),
            temperature_min: self.integer("temperature_min", d.temperature_min, v),
            temperature_max: self.integer("temperature_max", d.temperature_max, v),
            humidity_requirement: self.integer("humidity_requirement", d.humidity_requirement, v),
            soil_type: self.text("soil_type"),
            fertilizer_requirements: self.text("fertilizer_requirements"),
            mature_height: self.decimal("mature_height", d.mature_height, v),
            mature_spread: self.decimal("mature_spread", d.mature_spread, v),
            growth_rate: self.text_or("growth_rate", &d.growth_rate),
            time_to_maturity: self.text("time_to_maturity"),
            flowering_season: self.season("flowering_season"),
            flowering_color: self.text("flowering_color"),
            fruiting_season: self.season("fruiting_season"),
            fragrant: self.flag("fragrant"),
            hardiness_zone: self.text("hardiness_zone"),
            native_region: self.text("native_region"),
            drought_tolerant: self.flag("drought_tolerant"),
            deer_resistant: self.flag("deer_resistant"),
            pest_resistant: self.flag("pest_resistant"),
            edible: self.flag("edible"),
            indoor_suitable: self.flag("indoor_suitable"),
            price: self.decimal("price", d.price, v),
            quantity: self.integer("quantity", d.quantity, v),
            featured: self.flag("featured"),
        }
    }
}

pub const DUPLICATE_IN_CATALOG: &str = "A plant with this scientific name already exists.";

/// One data row after validation, with whatever it violated.
struct ParsedRow {
    row: usize,
    common_name: String,
    draft: PlantDraft,
    violations: Violations,
}

/// A validated CSV upload awaiting the catalog duplicate check.
pub struct PlantCsv {
    rows: Vec<ParsedRow>,
}

impl PlantCsv {
    /// Parse and validate every row of an upload.
    ///
    /// Malformed files and files without data rows fail here; row
    /// violations are held until [`PlantCsv::into_drafts`].
    pub fn parse(data: &[u8]) -> Result<Self, AppError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(data);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| AppError::Validation(format!("Malformed CSV header: {e}")))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_ascii_lowercase())
            .collect();

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let row_number = index + 1;
            let record = record.map_err(|e| {
                AppError::Validation(format!("Malformed CSV at row {row_number}: {e}"))
            })?;

            let row = CsvRow(
                headers
                    .iter()
                    .cloned()
                    .zip(record.iter().map(str::to_string))
                    .collect(),
            );

            let mut violations = Violations::default();
            let request = row.to_request(&mut violations);
            let draft = validate_plant(&request, &mut violations);
            rows.push(ParsedRow {
                row: row_number,
                common_name: request.common_name.trim().to_string(),
                draft,
                violations,
            });
        }

        if rows.is_empty() {
            return Err(AppError::Validation(
                "The CSV file contains no data rows".into(),
            ));
        }
        Ok(Self { rows })
    }

    /// Distinct non-blank scientific names in the upload.
    pub fn scientific_names(&self) -> Vec<String> {
        let names: HashSet<&str> = self
            .rows
            .iter()
            .map(|r| r.draft.scientific_name.as_str())
            .filter(|name| !name.is_empty())
            .collect();
        names.into_iter().map(str::to_string).collect()
    }

    /// Reject rows whose scientific name is already in the catalog or
    /// repeats an earlier row, then release the drafts.
    ///
    /// Either every row becomes a draft, or the batch is rejected with the
    /// violations of every failing row.
    pub fn into_drafts(self, in_catalog: &HashSet<String>) -> Result<Vec<PlantDraft>, AppError> {
        let mut first_seen: HashMap<String, usize> = HashMap::new();
        let mut drafts = Vec::new();
        let mut rejected = Vec::new();

        for mut parsed in self.rows {
            let name = parsed.draft.scientific_name.clone();
            if !name.is_empty() {
                if in_catalog.contains(&name) {
                    parsed.violations.add("scientific_name", DUPLICATE_IN_CATALOG);
                } else if let Some(earlier) = first_seen.get(&name) {
                    parsed.violations.add(
                        "scientific_name",
                        format!(
                            "A plant with this scientific name appears earlier in this file (row {earlier})."
                        ),
                    );
                } else {
                    first_seen.insert(name, parsed.row);
                }
            }

            if parsed.violations.is_empty() {
                drafts.push(parsed.draft);
            } else {
                rejected.push(RowError {
                    row: parsed.row,
                    common_name: parsed.common_name,
                    errors: parsed.violations.into_errors(),
                });
            }
        }

        if !rejected.is_empty() {
            return Err(AppError::ImportRejected(rejected));
        }
        Ok(drafts)
    }
}
