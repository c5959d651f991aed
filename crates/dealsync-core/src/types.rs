use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DealSyncError;
use crate::DealSyncResult;

/// All monetary values, in millions. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Percentage points (8.5 = 8.5%). Converted to a decimal rate only by
/// [`crate::time_value::to_rate`].
pub type Percent = Decimal;

/// Rates expressed as decimals (0.05 = 5%): discount factors, ratios, shares of value.
pub type Rate = Decimal;

/// Multiples (e.g., 8.5x EV/EBITDA)
pub type Multiple = Decimal;

/// Projected cash flows, one per future period. Period `i` (1-indexed) is
/// position `i - 1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Money>", into = "Vec<Money>")]
pub struct CashFlowSeries(Vec<Money>);

impl CashFlowSeries {
    pub fn new(flows: Vec<Money>) -> DealSyncResult<Self> {
        if flows.is_empty() {
            return Err(DealSyncError::InvalidInput {
                field: "cash_flows".into(),
                reason: "At least one projected cash flow is required".into(),
            });
        }
        Ok(Self(flows))
    }

    /// Build a series from host-side floating point values, rejecting NaN and
    /// infinities.
    pub fn from_f64(flows: &[f64]) -> DealSyncResult<Self> {
        let mut converted = Vec::with_capacity(flows.len());
        for (idx, value) in flows.iter().enumerate() {
            if !value.is_finite() {
                return Err(DealSyncError::InvalidInput {
                    field: format!("cash_flows[{idx}]"),
                    reason: format!("Cash flow must be finite, got {value}"),
                });
            }
            let dec = Decimal::from_f64(*value).ok_or_else(|| DealSyncError::InvalidInput {
                field: format!("cash_flows[{idx}]"),
                reason: format!("Cash flow {value} is outside the decimal range"),
            })?;
            converted.push(dec);
        }
        Self::new(converted)
    }

    pub fn flows(&self) -> &[Money] {
        &self.0
    }

    /// Number of explicit projection periods (N).
    pub fn periods(&self) -> u32 {
        self.0.len() as u32
    }

    pub fn last(&self) -> Money {
        // Non-empty by construction.
        self.0[self.0.len() - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Money> {
        self.0.iter()
    }

    /// Same flows with trailing zeros stripped (`55.00` -> `55`).
    pub fn normalized(&self) -> Self {
        Self(self.0.iter().map(Decimal::normalize).collect())
    }
}

impl TryFrom<Vec<Money>> for CashFlowSeries {
    type Error = DealSyncError;

    fn try_from(flows: Vec<Money>) -> Result<Self, Self::Error> {
        Self::new(flows)
    }
}

impl From<CashFlowSeries> for Vec<Money> {
    fn from(series: CashFlowSeries) -> Self {
        series.0
    }
}

/// Discount-rate assumptions shared by the DCF and synergy engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiscountAssumptions {
    /// Weighted average cost of capital, in percent
    pub wacc: Percent,
    /// Perpetual growth beyond the explicit horizon, in percent
    pub terminal_growth: Percent,
}

impl DiscountAssumptions {
    pub fn new(wacc: Percent, terminal_growth: Percent) -> Self {
        Self {
            wacc,
            terminal_growth,
        }
    }

    /// WACC must be strictly positive.
    pub fn validate_discount_rate(&self) -> DealSyncResult<()> {
        if self.wacc <= Decimal::ZERO {
            return Err(DealSyncError::InvalidAssumption {
                field: "wacc".into(),
                reason: format!("WACC must be positive, got {}%", self.wacc),
            });
        }
        Ok(())
    }

    /// Full Gordon-growth constraint set: `wacc > 0`, `g > -100%`, `g < wacc`.
    pub fn validate(&self) -> DealSyncResult<()> {
        self.validate_discount_rate()?;
        if self.terminal_growth <= -Decimal::ONE_HUNDRED {
            return Err(DealSyncError::InvalidAssumption {
                field: "terminal_growth".into(),
                reason: format!(
                    "Terminal growth must exceed -100%, got {}%",
                    self.terminal_growth
                ),
            });
        }
        if self.terminal_growth >= self.wacc {
            return Err(DealSyncError::InvalidAssumption {
                field: "terminal_growth".into(),
                reason: format!(
                    "Terminal growth ({}%) must be less than WACC ({}%) for a perpetuity to be defined",
                    self.terminal_growth, self.wacc
                ),
            });
        }
        Ok(())
    }

    /// Same rates at their minimal scale, so `8.5` and `8.50` serialise alike.
    pub fn normalized(&self) -> Self {
        Self::new(self.wacc.normalize(), self.terminal_growth.normalize())
    }

    /// Copy with both rates moved by the given percentage-point deltas.
    pub fn shifted(&self, wacc_delta: Percent, growth_delta: Percent) -> DealSyncResult<Self> {
        let out_of_range = |field: &str| DealSyncError::InvalidInput {
            field: field.into(),
            reason: "Shifted rate is outside the representable decimal range".into(),
        };
        Ok(Self {
            wacc: self
                .wacc
                .checked_add(wacc_delta)
                .ok_or_else(|| out_of_range("wacc"))?,
            terminal_growth: self
                .terminal_growth
                .checked_add(growth_delta)
                .ok_or_else(|| out_of_range("terminal_growth"))?,
        })
    }
}

/// Sensitivity variable specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityVariable {
    pub name: String,
    pub min: Decimal,
    pub max: Decimal,
    pub step: Decimal,
}

impl SensitivityVariable {
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.clone(),
            min: self.min.normalize(),
            max: self.max.normalize(),
            step: self.step.normalize(),
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
