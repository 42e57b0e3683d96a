/*!
# Schema Registry

This module defines the fixed column layout of the store financials table and the
validation rules applied to it. The layout is a contract with the warehouse table:
column order here is the column order of the staged file and of the table itself.

A [`FinancialsSchema`] is an immutable value. Build one per process (or per test)
and pass it explicitly to the validator and reconciler.
*/

use crate::errors::{CsvError, CsvResult};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

// ================================================================================================
// Column Layout
// ================================================================================================

pub const YEAR_COLUMN: &str = "YEAR";
pub const PERIOD_COLUMN: &str = "PERIOD";
pub const OPENED_COLUMN: &str = "OPENED";
pub const STORE_LOCATION_COLUMN: &str = "STORE_LOCATION";

/// Required columns in exact table order
pub const REQUIRED_COLUMNS: &[&str] = &[
    "YEAR",
    "PERIOD",
    "OPENED",
    "STORE_LOCATION",
    "SALES",
    "BREAD_COGS",
    "PROTEIN_COGS",
    "PRODUCE_COGS",
    "DAIRY_COGS",
    "GROCERY_COGS",
    "BEVERAGE_COGS",
    "SNACK_COGS",
    "PAPER_SUPPLIES",
    "COGS",
    "ARTL_RTL",
    "HOURLY_CREW",
    "TOTAL_LABOR_COST",
    "TOTAL_PR_TAXES_AND_BENEFITS",
    "RENT",
    "GAS_AND_ELECTRIC",
    "WATER",
    "CAM_CHARGES",
    "COMMERCIAL_RENT_TAX",
    "REAL_ESTATE_TAX",
    "GENERAL_LIABILITY_INSURANCE",
    "SUPPLIES",
    "DISCRETIONARY",
    "HVAC_REPAIRS",
    "BUILDING_REPAIRS",
    "PLUMBING_REPAIRS",
    "ELECTRIC_REPAIRS",
    "REFRIGERATION_REPAIRS",
    "COMPUTER_REPAIRS",
    "CLEANING_GREASE_TRAP",
    "WASTE_REMOVAL",
    "PEST_CONTROL",
    "ALARM_SYSTEM",
    "TELEPHONE_AND_INTERNET",
    "WEB_EXPENSES",
    "PROMOTIONS",
    "DELIVERY_FEES",
    "CATERING_FEES",
    "PROCESSING_FEES",
    "INTERNAL_GA",
    "TOTAL_GA",
];

/// Merge key, in join order
pub const KEY_COLUMNS: &[&str] = &[YEAR_COLUMN, PERIOD_COLUMN, STORE_LOCATION_COLUMN];

pub const MIN_YEAR: i32 = 2019;
pub const MAX_YEAR: i32 = 2030;
pub const MIN_PERIOD: u32 = 1;
pub const MAX_PERIOD: u32 = 13;

// ================================================================================================
// Validation Rules
// ================================================================================================

/// How non-numeric values in financial columns are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericPolicy {
    /// Replace the value with null and keep going
    #[default]
    Lenient,

    /// Report the column as a validation problem
    Strict,
}

/// Tunable validation rules, loadable from a YAML rules file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationRules {
    pub min_year: i32,
    pub max_year: i32,
    pub min_period: u32,
    pub max_period: u32,
    pub numeric_policy: NumericPolicy,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_year: MIN_YEAR,
            max_year: MAX_YEAR,
            min_period: MIN_PERIOD,
            max_period: MAX_PERIOD,
            numeric_policy: NumericPolicy::Lenient,
        }
    }
}

impl ValidationRules {
    /// Reject inverted ranges
    pub fn check(&self) -> CsvResult<()> {
        if self.min_year > self.max_year {
            return Err(CsvError::InvalidRules(format!(
                "min_year {} is greater than max_year {}",
                self.min_year, self.max_year
            )));
        }
        if self.min_period > self.max_period {
            return Err(CsvError::InvalidRules(format!(
                "min_period {} is greater than max_period {}",
                self.min_period, self.max_period
            )));
        }
        Ok(())
    }
}

// ================================================================================================
// Schema
// ================================================================================================

/// Column layout plus validation rules for one financials table
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialsSchema {
    required_columns: Vec<String>,
    key_columns: Vec<String>,
    financial_columns: Vec<String>,
    rules: ValidationRules,
}

impl FinancialsSchema {
    /// The production layout with default rules
    pub fn standard() -> Self {
        Self::build(ValidationRules::default())
    }

    /// The production layout with custom rules
    pub fn with_rules(rules: ValidationRules) -> CsvResult<Self> {
        rules.check()?;
        Ok(Self::build(rules))
    }

    fn build(rules: ValidationRules) -> Self {
        let required_columns: Vec<String> =
            REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
        let key_columns: Vec<String> = KEY_COLUMNS.iter().map(|c| c.to_string()).collect();

        // Everything except the keys and OPENED
        let financial_columns = required_columns
            .iter()
            .filter(|c| !key_columns.contains(c) && c.as_str() != OPENED_COLUMN)
            .cloned()
            .collect();

        Self {
            required_columns,
            key_columns,
            financial_columns,
            rules,
        }
    }

    pub fn required_columns(&self) -> &[String] {
        &self.required_columns
    }

    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    pub fn financial_columns(&self) -> &[String] {
        &self.financial_columns
    }

    /// Columns compared when deciding whether a matched row changed
    pub fn change_columns(&self) -> Vec<String> {
        let mut columns = self.financial_columns.clone();
        columns.push(OPENED_COLUMN.to_string());
        columns
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    pub fn year_range(&self) -> RangeInclusive<i64> {
        i64::from(self.rules.min_year)..=i64::from(self.rules.max_year)
    }

    pub fn period_range(&self) -> RangeInclusive<i64> {
        i64::from(self.rules.min_period)..=i64::from(self.rules.max_period)
    }

    /// Position of a financial column within a record's financial values
    pub fn financial_index(&self, column: &str) -> Option<usize> {
        self.financial_columns.iter().position(|c| c == column)
    }
}

impl Default for FinancialsSchema {
    fn default() -> Self {
        Self::standard()
    }
}

// ================================================================================================
// Tests
// ================================================================================================
