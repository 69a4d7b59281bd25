// src/models.rs
use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Ordered cash flows: index 0 is the (negative) initial outlay, the last
/// index is the terminal liquidation value.
pub type CashFlowSeries = Vec<f64>;

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    NonPositiveAmount(f64),
    ZeroHorizon,
    HorizonTooLong(u32),
    StakingYieldOutOfRange(f64),
    RiskFreeRateOutOfRange(f64),
    NonPositivePrice(f64),
    NonPositiveExpectedPrice(f64),
    FundamentalsOutOfRange(f64),
    InvalidPricePoint { index: usize, price: f64 },
    NonIncreasingTimestamp { index: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValidationError::NonPositiveAmount(v) => write!(f, "investment amount must be positive, got {}", v),
            ValidationError::ZeroHorizon => write!(f, "investment horizon must be at least one year"),
            ValidationError::HorizonTooLong(v) => {
                write!(f, "investment horizon must be at most {} years, got {}", InvestmentInputs::MAX_HORIZON_YEARS, v)
            }
            ValidationError::StakingYieldOutOfRange(v) => write!(f, "staking yield must be within 0-50%, got {}", v),
            ValidationError::RiskFreeRateOutOfRange(v) => write!(f, "risk-free rate must be within 2-4%, got {}", v),
            ValidationError::NonPositivePrice(v) => write!(f, "current price must be positive, got {}", v),
            ValidationError::NonPositiveExpectedPrice(v) => write!(f, "expected price must be positive, got {}", v),
            ValidationError::FundamentalsOutOfRange(v) => write!(f, "fundamentals score must be within 0-10, got {}", v),
            ValidationError::InvalidPricePoint { index, price } => {
                write!(f, "price point {} is not a positive finite number: {}", index, price)
            }
            ValidationError::NonIncreasingTimestamp { index } => {
                write!(f, "price point {} is not strictly after its predecessor", index)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasketType {
    Bitcoin,
    BlueChip,
    SmallCap,
}

impl BasketType {
    pub const ALL: [BasketType; 3] = [BasketType::Bitcoin, BasketType::BlueChip, BasketType::SmallCap];

    /// Prefix used for per-basket environment variables.
    pub fn env_prefix(self) -> &'static str {
        match self {
            BasketType::Bitcoin => "BITCOIN",
            BasketType::BlueChip => "BLUE_CHIP",
            BasketType::SmallCap => "SMALL_CAP",
        }
    }
}

impl fmt::Display for BasketType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            BasketType::Bitcoin => "Bitcoin",
            BasketType::BlueChip => "Blue-chip",
            BasketType::SmallCap => "Small-cap",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for BasketType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "bitcoin" | "btc" => Ok(BasketType::Bitcoin),
            "blue_chip" | "bluechip" => Ok(BasketType::BlueChip),
            "small_cap" | "smallcap" => Ok(BasketType::SmallCap),
            other => Err(format!("unknown basket type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmartMoney {
    Buying,
    #[default]
    Neutral,
    Selling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BitcoinMarketState {
    Bullish,
    #[default]
    Neutral,
    Bearish,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentInputs {
    pub coin_id: String,
    pub investment_amount: f64,
    pub horizon_years: u32,
    #[serde(default)]
    pub staking_yield: Option<f64>,
    #[serde(default)]
    pub risk_free_rate: Option<f64>,
    /// Price expected at the end of the horizon. Projected from the basket's
    /// expected growth when absent.
    #[serde(default)]
    pub expected_price: Option<f64>,
    /// Total portfolio value used for the allocation check.
    #[serde(default)]
    pub portfolio_value: Option<f64>,
    #[serde(default)]
    pub currently_held: bool,
}

impl InvestmentInputs {
    pub const MAX_HORIZON_YEARS: u32 = 100;

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.investment_amount > 0.0) || !self.investment_amount.is_finite() {
            return Err(ValidationError::NonPositiveAmount(self.investment_amount));
        }
        if self.horizon_years == 0 {
            return Err(ValidationError::ZeroHorizon);
        }
        if self.horizon_years > Self::MAX_HORIZON_YEARS {
            return Err(ValidationError::HorizonTooLong(self.horizon_years));
        }
        if let Some(y) = self.staking_yield {
            if !(0.0..=50.0).contains(&y) {
                return Err(ValidationError::StakingYieldOutOfRange(y));
            }
        }
        if let Some(r) = self.risk_free_rate {
            if !(2.0..=4.0).contains(&r) {
                return Err(ValidationError::RiskFreeRateOutOfRange(r));
            }
        }
        if let Some(p) = self.expected_price {
            if !(p > 0.0) || !p.is_finite() {
                return Err(ValidationError::NonPositiveExpectedPrice(p));
            }
        }
        Ok(())
    }

    pub fn staking_yield_pct(&self) -> f64 {
        self.staking_yield.unwrap_or(0.0)
    }
}

/// Cointime and flow signals. Every field is optional upstream data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OnChainSignals {
    #[serde(default)]
    pub aviv_ratio: Option<f64>,
    #[serde(default)]
    pub active_supply_pct: Option<f64>,
    #[serde(default)]
    pub vaulted_supply_pct: Option<f64>,
    #[serde(default)]
    pub smart_money: Option<SmartMoney>,
}

impl OnChainSignals {
    pub fn is_empty(&self) -> bool {
        self.aviv_ratio.is_none()
            && self.active_supply_pct.is_none()
            && self.vaulted_supply_pct.is_none()
            && self.smart_money.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinSnapshot {
    pub current_price: f64,
    pub basket: BasketType,
    #[serde(default)]
    pub fundamentals_score: Option<f64>,
    #[serde(default)]
    pub on_chain: OnChainSignals,
}

impl CoinSnapshot {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.current_price > 0.0) || !self.current_price.is_finite() {
            return Err(ValidationError::NonPositivePrice(self.current_price));
        }
        if let Some(score) = self.fundamentals_score {
            if !(0.0..=10.0).contains(&score) {
                return Err(ValidationError::FundamentalsOutOfRange(score));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Price history ordered strictly by time. Construction rejects
/// non-positive prices and out-of-order timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PricePoint>", into = "Vec<PricePoint>")]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Minimum number of points for a volatility estimate to count as reliable.
    pub const RELIABLE_SAMPLE: usize = 30;

    pub fn new(points: Vec<PricePoint>) -> Result<Self, ValidationError> {
        for (index, point) in points.iter().enumerate() {
            if !(point.price > 0.0) || !point.price.is_finite() {
                return Err(ValidationError::InvalidPricePoint { index, price: point.price });
            }
            if index > 0 && point.timestamp <= points[index - 1].timestamp {
                return Err(ValidationError::NonIncreasingTimestamp { index });
            }
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    /// Simple period-over-period returns (fractions, not percent).
    pub fn returns(&self) -> Vec<f64> {
        crate::services::statistics::simple_returns(&self.prices())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Elapsed time between the first and last point, in years.
    pub fn span_years(&self) -> f64 {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => {
                (last.timestamp - first.timestamp).num_seconds() as f64 / (365.25 * 86_400.0)
            }
            _ => 0.0,
        }
    }
}

impl TryFrom<Vec<PricePoint>> for PriceSeries {
    type Error = ValidationError;

    fn try_from(points: Vec<PricePoint>) -> Result<Self, Self::Error> {
        PriceSeries::new(points)
    }
}

impl From<PriceSeries> for Vec<PricePoint> {
    fn from(series: PriceSeries) -> Self {
        series.points
    }
}

/// Macro and sentiment snapshot supplied per analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketConditions {
    /// Signed change in the Fed funds rate, in percentage points.
    #[serde(default)]
    pub fed_rate_change: f64,
    #[serde(default)]
    pub bitcoin_market_state: BitcoinMarketState,
    #[serde(default)]
    pub sentiment_score: Option<f64>,
    #[serde(default)]
    pub smart_money: SmartMoney,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStatus {
    Underexposed,
    Optimal,
    Overexposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationAction {
    Increase,
    Maintain,
    Decrease,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationResult {
    pub portfolio_percentage: f64,
    pub basket: BasketType,
    pub status: AllocationStatus,
    pub action: AllocationAction,
    pub allowed_range: TargetRange,
    pub recommended_range: TargetRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Buy,
    BuyLess,
    Hold,
    DoNotBuy,
    Sell,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            Action::Buy => "Buy",
            Action::BuyLess => "Buy Less",
            Action::Hold => "Hold",
            Action::DoNotBuy => "Do Not Buy",
            Action::Sell => "Sell",
        };
        write!(f, "{}", label)
    }
}

/// Which input a reason or warning was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Npv,
    Irr,
    Cagr,
    Volatility,
    AvivRatio,
    Beta,
    LossProbability,
    DataQuality,
    RiskFactor,
    Allocation,
    Market,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub signal: Signal,
    pub message: String,
}

impl Finding {
    pub fn new(signal: Signal, message: impl Into<String>) -> Self {
        Finding { signal, message: message.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub action: Action,
    pub confidence: u8,
    pub reasons: Vec<Finding>,
    pub warnings: Vec<Finding>,
}
