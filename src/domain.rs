//! Domain tables and their column names
//!
//! The business rules, corrections and imputations are fixed to one daily
//! sales schema. Tables are recognized by name; any other table is carried
//! through without table-specific handling.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A table the pipeline has domain rules for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Sales,
    Inventory,
    Weather,
    Finance,
    Marketing,
    Macroeconomics,
}

impl TableKind {
    pub const ALL: [TableKind; 6] = [
        TableKind::Sales,
        TableKind::Inventory,
        TableKind::Weather,
        TableKind::Finance,
        TableKind::Marketing,
        TableKind::Macroeconomics,
    ];

    /// Recognize a table by its configured name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            TableKind::Sales => "sales",
            TableKind::Inventory => "inventory",
            TableKind::Weather => "weather",
            TableKind::Finance => "finance",
            TableKind::Marketing => "marketing",
            TableKind::Macroeconomics => "macroeconomics",
        }
    }

    /// Tables whose declared numeric columns must never be negative
    pub fn requires_non_negative(self) -> bool {
        matches!(self, TableKind::Sales | TableKind::Inventory)
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Column names of the sales table
pub mod sales {
    pub const PAID_UNITS: &str = "paid_units";
    pub const BONUS_UNITS: &str = "bonus_units";
    pub const TOTAL_UNITS: &str = "total_units";
    pub const IS_PROMOTION: &str = "is_promotion";
}

/// Column names of the inventory table
pub mod inventory {
    pub const PAID_SALES: &str = "paid_sales";
    pub const BONUS_SALES: &str = "bonus_sales";
    pub const TOTAL_SALES: &str = "total_sales";
    pub const UNITS_PREPARED: &str = "units_prepared";
    pub const UNITS_WASTED: &str = "units_wasted";
    pub const UNITS_STOCKED_OUT: &str = "units_stocked_out";
    pub const THEORETICAL_DEMAND: &str = "theoretical_demand";
}

/// Column names of the weather table
pub mod weather {
    pub const AVG_TEMPERATURE: &str = "avg_temperature";
    pub const RAIN_PROBABILITY: &str = "rain_probability";
    pub const PRECIPITATION_MM: &str = "precipitation_mm";
    pub const RAIN_TYPE: &str = "rain_type";
    pub const IS_RAINY_DAY: &str = "is_rainy_day";
    pub const MACRO_EVENT: &str = "macro_event";

    /// Rain type meaning "no rain", also the fallback when no mode exists
    pub const NO_RAIN: &str = "None";
}

/// Column names of the finance table
pub mod finance {
    pub const UNIT_PRICE: &str = "unit_price";
    pub const UNIT_COST: &str = "unit_cost";
    pub const GROSS_MARGIN: &str = "gross_margin";
    pub const MARGIN_PCT: &str = "margin_pct";
}

/// Column names of the marketing table
pub mod marketing {
    pub const IG_COST: &str = "ig_cost";
    pub const FB_COST: &str = "fb_cost";
    pub const TOTAL_SPEND: &str = "total_spend";
    pub const IG_PCT: &str = "ig_pct";
    pub const FB_PCT: &str = "fb_pct";
    pub const CAMPAIGN_ACTIVE: &str = "campaign_active";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_kind_from_name() {
        for kind in TableKind::ALL {
            assert_eq!(TableKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(TableKind::from_name("customers"), None);
        assert_eq!(TableKind::from_name("Sales"), None);
    }

    #[test]
    fn test_non_negative_tables() {
        assert!(TableKind::Sales.requires_non_negative());
        assert!(TableKind::Inventory.requires_non_negative());
        assert!(!TableKind::Weather.requires_non_negative());
    }
}
