//! Table-specific correction and imputation steps
//!
//! Each table kind maps to an ordered list of typed steps. A step declares
//! the columns it needs; the engine decides from that whether it runs, is
//! skipped, or fails the table.

use crate::config::BusinessRules;
use crate::domain::{finance, inventory, marketing, sales, weather, TableKind};
use crate::error::{Error, Result};
use crate::frame::{add, ratio_or_zero, sub, Cell, ColumnKind, Frame};
use std::collections::HashMap;
use std::fmt;

/// What a step needs from the frame it runs on
pub(crate) struct StepContext<'a> {
    pub table: &'a str,
    pub temporal_column: &'a str,
    pub rules: &'a BusinessRules,
}

/// How a frame's columns line up with what a step requires
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Requirement {
    Ready,
    /// None of the required columns are present
    Absent(Vec<String>),
    /// Some but not all required columns are present
    Partial(Vec<String>),
}

impl Requirement {
    pub fn check(frame: &Frame, required: &[&str]) -> Self {
        let missing = frame.missing_columns(required);
        if missing.is_empty() {
            Requirement::Ready
        } else if missing.len() == required.len() {
            Requirement::Absent(missing)
        } else {
            Requirement::Partial(missing)
        }
    }
}

// ============================================================================
// Corrections
// ============================================================================

/// Repair of a derived field from the fields it depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    /// Sales: on promotion days bonus units mirror paid units; total is
    /// recomputed for every row
    PromotionBonusParity,
    /// Inventory: inside the configured promotion season bonus sales mirror
    /// paid sales
    PromotionSeasonParity,
    /// Inventory: total sales = paid + bonus
    SalesTotal,
    /// Inventory: wasted = prepared - total sales
    WasteBalance,
    /// Inventory: demand = total sales + stocked out, always overwritten
    DemandRecompute,
}

impl Correction {
    /// Ordered corrections for a table kind
    pub fn registry(kind: TableKind) -> &'static [Correction] {
        match kind {
            TableKind::Sales => &[Correction::PromotionBonusParity],
            TableKind::Inventory => &[
                Correction::PromotionSeasonParity,
                Correction::SalesTotal,
                Correction::WasteBalance,
                Correction::DemandRecompute,
            ],
            _ => &[],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Correction::PromotionBonusParity => "promotion_bonus_parity",
            Correction::PromotionSeasonParity => "promotion_season_parity",
            Correction::SalesTotal => "sales_total",
            Correction::WasteBalance => "waste_balance",
            Correction::DemandRecompute => "demand_recompute",
        }
    }

    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            Correction::PromotionBonusParity => &[
                sales::IS_PROMOTION,
                sales::PAID_UNITS,
                sales::BONUS_UNITS,
                sales::TOTAL_UNITS,
            ],
            Correction::PromotionSeasonParity => {
                &[inventory::PAID_SALES, inventory::BONUS_SALES]
            }
            Correction::SalesTotal => &[
                inventory::PAID_SALES,
                inventory::BONUS_SALES,
                inventory::TOTAL_SALES,
            ],
            Correction::WasteBalance => &[
                inventory::UNITS_PREPARED,
                inventory::TOTAL_SALES,
                inventory::UNITS_WASTED,
            ],
            Correction::DemandRecompute => &[
                inventory::TOTAL_SALES,
                inventory::UNITS_STOCKED_OUT,
                inventory::THEORETICAL_DEMAND,
            ],
        }
    }

    /// Apply the correction; returns the number of rows it altered
    ///
    /// Every required column must be present and numeric.
    pub(crate) fn apply(self, frame: &mut Frame, ctx: &StepContext<'_>) -> Result<usize> {
        let cols = resolve(frame, self.required_columns());
        require_numeric(frame, ctx.table, self.required_columns(), &cols)?;

        let altered = match self {
            Correction::PromotionBonusParity => {
                let [promo, paid, bonus, total] = [cols[0], cols[1], cols[2], cols[3]];
                let mut fixed = 0;
                for row in frame.rows_mut() {
                    if row[promo].is_flag_set() && row[paid].differs(&row[bonus]) {
                        row[bonus] = row[paid].clone();
                        fixed += 1;
                    }
                    row[total] = add(&row[paid], &row[bonus]);
                }
                fixed
            }
            Correction::PromotionSeasonParity => {
                let date = frame.column_index(ctx.temporal_column).ok_or_else(|| {
                    Error::missing_columns(
                        ctx.table,
                        self.name(),
                        vec![ctx.temporal_column.to_string()],
                    )
                })?;
                let [paid, bonus] = [cols[0], cols[1]];
                let mut fixed = 0;
                for row in frame.rows_mut() {
                    let in_season = row[date]
                        .as_date()
                        .is_some_and(|d| ctx.rules.promotion_season.contains(d));
                    if in_season && row[paid].differs(&row[bonus]) {
                        row[bonus] = row[paid].clone();
                        fixed += 1;
                    }
                }
                fixed
            }
            Correction::SalesTotal => {
                recompute(frame, cols[2], |row| add(&row[cols[0]], &row[cols[1]]))
            }
            Correction::WasteBalance => {
                recompute(frame, cols[2], |row| sub(&row[cols[0]], &row[cols[1]]))
            }
            Correction::DemandRecompute => {
                recompute(frame, cols[2], |row| add(&row[cols[0]], &row[cols[1]]))
            }
        };
        Ok(altered)
    }
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Overwrite a column with a value derived from each row; returns how many
/// rows held a different value before
fn recompute(frame: &mut Frame, target: usize, f: impl Fn(&[Cell]) -> Cell) -> usize {
    let mut altered = 0;
    for row in frame.rows_mut() {
        let value = f(row);
        if row[target].differs(&value) {
            altered += 1;
        }
        row[target] = value;
    }
    altered
}

// ============================================================================
// Imputations
// ============================================================================

/// Filling of gaps, run after the calendar is complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Imputation {
    /// Forward fill, then backward fill, each listed column
    FillForwardBackward(&'static [&'static str]),
    /// Weather: fill rain type with its most frequent value, or no-rain
    RainTypeMode,
    /// Weather: rainy day unless the rain type is the no-rain value
    RainyDayFlag,
    /// Forward fill, then backward fill, every column
    FillAll,
    /// Finance: margin and margin percentage from price and cost
    GrossMargin,
    /// Marketing: active when either channel has spend
    CampaignActive,
    /// Marketing: total spend across channels, added when absent
    TotalSpend,
    /// Marketing: each channel's share of total spend, added when absent
    SpendShares,
}

impl Imputation {
    /// Ordered imputations for a table kind
    pub fn registry(kind: TableKind) -> &'static [Imputation] {
        match kind {
            TableKind::Weather => &[
                Imputation::FillForwardBackward(&[weather::AVG_TEMPERATURE]),
                Imputation::FillForwardBackward(&[weather::RAIN_PROBABILITY]),
                Imputation::FillForwardBackward(&[weather::PRECIPITATION_MM]),
                Imputation::RainTypeMode,
                Imputation::RainyDayFlag,
                Imputation::FillForwardBackward(&[weather::MACRO_EVENT]),
            ],
            TableKind::Finance => &[
                Imputation::FillForwardBackward(&[finance::UNIT_PRICE, finance::UNIT_COST]),
                Imputation::GrossMargin,
            ],
            TableKind::Macroeconomics => &[Imputation::FillAll],
            TableKind::Marketing => &[
                Imputation::FillForwardBackward(&[marketing::IG_COST, marketing::FB_COST]),
                Imputation::CampaignActive,
                Imputation::TotalSpend,
                Imputation::SpendShares,
            ],
            TableKind::Sales | TableKind::Inventory => &[],
        }
    }

    pub fn name(self) -> String {
        match self {
            Imputation::FillForwardBackward(columns) => format!("fill_{}", columns.join("_")),
            Imputation::RainTypeMode => "rain_type_mode".to_string(),
            Imputation::RainyDayFlag => "rainy_day_flag".to_string(),
            Imputation::FillAll => "fill_all".to_string(),
            Imputation::GrossMargin => "gross_margin".to_string(),
            Imputation::CampaignActive => "campaign_active".to_string(),
            Imputation::TotalSpend => "total_spend".to_string(),
            Imputation::SpendShares => "spend_shares".to_string(),
        }
    }

    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            Imputation::FillForwardBackward(columns) => columns,
            Imputation::RainTypeMode => &[weather::RAIN_TYPE],
            Imputation::RainyDayFlag => &[weather::RAIN_TYPE, weather::IS_RAINY_DAY],
            Imputation::FillAll => &[],
            Imputation::GrossMargin => &[
                finance::UNIT_PRICE,
                finance::UNIT_COST,
                finance::GROSS_MARGIN,
                finance::MARGIN_PCT,
            ],
            Imputation::CampaignActive => &[
                marketing::IG_COST,
                marketing::FB_COST,
                marketing::CAMPAIGN_ACTIVE,
            ],
            Imputation::TotalSpend => &[marketing::IG_COST, marketing::FB_COST],
            Imputation::SpendShares => &[
                marketing::IG_COST,
                marketing::FB_COST,
                marketing::TOTAL_SPEND,
            ],
        }
    }

    /// Apply the imputation; returns the number of cells filled or changed
    pub(crate) fn apply(self, frame: &mut Frame, ctx: &StepContext<'_>) -> Result<usize> {
        let cols = resolve(frame, self.required_columns());
        let changed = match self {
            Imputation::FillForwardBackward(_) => cols
                .iter()
                .map(|&idx| frame.fill_forward_backward(idx))
                .sum(),
            Imputation::RainTypeMode => {
                let idx = cols[0];
                let fill = mode(frame, idx).unwrap_or_else(|| Cell::from(weather::NO_RAIN));
                let mut filled = 0;
                for row in frame.rows_mut() {
                    if row[idx].is_null() {
                        row[idx] = fill.clone();
                        filled += 1;
                    }
                }
                filled
            }
            Imputation::RainyDayFlag => {
                let [rain_type, flag] = [cols[0], cols[1]];
                recompute_cells(frame, flag, |row| {
                    let dry = row[rain_type].as_str() == Some(weather::NO_RAIN);
                    Cell::Int(i64::from(!dry))
                })
            }
            Imputation::FillAll => (0..frame.num_columns())
                .map(|idx| frame.fill_forward_backward(idx))
                .sum(),
            Imputation::GrossMargin => {
                require_numeric(frame, ctx.table, self.required_columns(), &cols[..2])?;
                let [price, cost, margin, pct] = [cols[0], cols[1], cols[2], cols[3]];
                recompute_cells(frame, margin, |row| sub(&row[price], &row[cost]))
                    + recompute_cells(frame, pct, |row| ratio_or_zero(&row[margin], &row[price]))
            }
            Imputation::CampaignActive => {
                require_numeric(frame, ctx.table, self.required_columns(), &cols[..2])?;
                let [ig, fb, active] = [cols[0], cols[1], cols[2]];
                recompute_cells(frame, active, |row| {
                    let spends = |c: &Cell| c.as_f64().is_some_and(|v| v > 0.0);
                    Cell::Int(i64::from(spends(&row[ig]) || spends(&row[fb])))
                })
            }
            Imputation::TotalSpend => {
                require_numeric(frame, ctx.table, self.required_columns(), &cols)?;
                let [ig, fb] = [cols[0], cols[1]];
                let total = frame.ensure_column(marketing::TOTAL_SPEND);
                recompute_cells(frame, total, |row| add(&row[ig], &row[fb]))
            }
            Imputation::SpendShares => {
                require_numeric(frame, ctx.table, self.required_columns(), &cols)?;
                let [ig, fb, total] = [cols[0], cols[1], cols[2]];
                let ig_pct = frame.ensure_column(marketing::IG_PCT);
                let fb_pct = frame.ensure_column(marketing::FB_PCT);
                recompute_cells(frame, ig_pct, |row| ratio_or_zero(&row[ig], &row[total]))
                    + recompute_cells(frame, fb_pct, |row| ratio_or_zero(&row[fb], &row[total]))
            }
        };
        Ok(changed)
    }
}

impl fmt::Display for Imputation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Overwrite a column, counting cells whose value changed
fn recompute_cells(frame: &mut Frame, target: usize, f: impl Fn(&[Cell]) -> Cell) -> usize {
    let mut changed = 0;
    for row in frame.rows_mut() {
        let value = f(row);
        if row[target] != value {
            changed += 1;
        }
        row[target] = value;
    }
    changed
}

/// Most frequent non-null value; ties go to the smallest rendering
fn mode(frame: &Frame, idx: usize) -> Option<Cell> {
    let mut counts: HashMap<&Cell, usize> = HashMap::new();
    for cell in frame.column(idx).filter(|c| !c.is_null()) {
        *counts.entry(cell).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|(a, ca), (b, cb)| ca.cmp(cb).then_with(|| b.to_string().cmp(&a.to_string())))
        .map(|(cell, _)| cell.clone())
}

// ============================================================================
// Helpers
// ============================================================================

/// Positions of columns the caller has already checked are present
fn resolve(frame: &Frame, names: &[&str]) -> Vec<usize> {
    names
        .iter()
        .filter_map(|name| frame.column_index(name))
        .collect()
}

/// Arithmetic columns must not hold text or dates
fn require_numeric(frame: &Frame, table: &str, names: &[&str], cols: &[usize]) -> Result<()> {
    for (name, &idx) in names.iter().zip(cols) {
        let kind = frame.column_kind(idx);
        if matches!(kind, ColumnKind::Text | ColumnKind::Date | ColumnKind::Mixed) {
            return Err(Error::integrity(
                table,
                format!("column '{name}' is {kind}, expected numeric"),
            ));
        }
    }
    Ok(())
}
