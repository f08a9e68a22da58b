use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AppError, FieldError};

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 20)]
    pub per_page: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 3)]
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        Self {
            page,
            per_page,
            total,
            total_pages: total.div_ceil(per_page),
        }
    }
}

/// Highest page number a listing accepts; larger requests read this page.
pub const MAX_PAGE: u64 = 1_000_000;

/// Normalize optional paging parameters to `(1 <= page <= MAX_PAGE, 1 <= per_page <= 100)`.
pub fn page_bounds(page: Option<u64>, per_page: Option<u64>) -> (u64, u64) {
    (
        page.unwrap_or(1).clamp(1, MAX_PAGE),
        per_page.unwrap_or(20).clamp(1, 100),
    )
}

/// Row offset of the first item on `page`.
pub fn page_offset(page: u64, per_page: u64) -> u64 {
    page.saturating_sub(1).saturating_mul(per_page)
}

/// Narrow a range-checked integer to its `INTEGER` column type.
///
/// Out-of-range values map to 0; they are only ever written after
/// validation rejected nothing.
pub fn narrow(value: i64) -> i32 {
    i32::try_from(value).unwrap_or_default()
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub const NOT_NULL_MESSAGE: &str = "This field may not be null.";

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Render a money or size decimal with exactly `places` decimal places.
pub fn fixed_scale(mut value: Decimal, places: u32) -> Decimal {
    value.rescale(places);
    value
}

/// Collects every field violation of a request before rejecting it.
#[derive(Debug, Default)]
pub struct Violations(Vec<FieldError>);

impl Violations {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.0
    }

    /// `Ok(())` when nothing was recorded, otherwise `AppError::InvalidFields`.
    pub fn finish(self) -> Result<(), AppError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidFields(self.0))
        }
    }

    /// Trim a text value and check its length; `required` rejects blank values.
    pub fn text(&mut self, field: &str, value: &str, max_chars: usize, required: bool) -> String {
        let trimmed = value.trim();
        if required && trimmed.is_empty() {
            self.add(field, "This field may not be blank.");
        } else if trimmed.chars().count() > max_chars {
            self.add(
                field,
                format!("Ensure this field has no more than {max_chars} characters."),
            );
        }
        trimmed.to_string()
    }

    /// Trim an unbounded text value, rejecting blanks when `required`.
    pub fn long_text(&mut self, field: &str, value: &str, required: bool) -> String {
        let trimmed = value.trim();
        if required && trimmed.is_empty() {
            self.add(field, "This field may not be blank.");
        }
        trimmed.to_string()
    }

    pub fn range(&mut self, field: &str, value: i64, min: i64, max: i64) {
        if value < min {
            self.add(
                field,
                format!("Ensure this value is greater than or equal to {min}."),
            );
        } else if value > max {
            self.add(
                field,
                format!("Ensure this value is less than or equal to {max}."),
            );
        }
    }

    /// A count stored in an `INTEGER` column: `0..=i32::MAX`.
    pub fn non_negative(&mut self, field: &str, value: i64) {
        self.range(field, value, 0, i32::MAX.into());
    }

    /// Check a non-negative decimal against a `(max_digits, decimal_places)` column.
    pub fn decimal(&mut self, field: &str, value: Decimal, max_digits: u32, places: u32) {
        if value.is_sign_negative() && !value.is_zero() {
            self.add(field, "Ensure this value is greater than or equal to 0.");
            return;
        }
        let normalized = value.normalize();
        if normalized.scale() > places {
            self.add(
                field,
                format!("Ensure that there are no more than {places} decimal places."),
            );
            return;
        }
        let whole_digits = max_digits - places;
        if normalized.trunc() >= Decimal::from(10u64.pow(whole_digits)) {
            self.add(
                field,
                format!("Ensure that there are no more than {whole_digits} digits before the decimal point."),
            );
        }
    }

    /// Parse a value from a closed vocabulary, recording a violation on failure.
    pub fn choice<T>(&mut self, field: &str, raw: &str) -> Option<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match raw.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                self.add(field, e.to_string());
                None
            }
        }
    }
}
