// src/services/recommendation.rs
use crate::models::{
    Action, AllocationResult, AllocationStatus, BitcoinMarketState, Finding, MarketConditions,
    RecommendationResult, Signal, SmartMoney,
};
use super::time_value::IrrResult;

const BASE_CONFIDENCE: i32 = 50;
const IRR_THRESHOLD: f64 = 15.0;
const SELL_NPV_THRESHOLD: f64 = -1000.0;
const SELL_LOSS_PROBABILITY: f64 = 0.6;
const GREED_SENTIMENT: f64 = 70.0;
const FEAR_SENTIMENT: f64 = 30.0;

/// Everything the synthesizer looks at. Optional fields are skipped when absent.
#[derive(Debug, Clone, Default)]
pub struct RecommendationInputs {
    pub npv: f64,
    pub irr: Option<IrrResult>,
    pub hurdle_rate: Option<f64>,
    pub cagr: f64,
    /// Annualized volatility in percent; 0 means not enough history.
    pub volatility: f64,
    pub aviv_ratio: Option<f64>,
    pub beta: Option<f64>,
    pub loss_probability: Option<f64>,
    pub data_quality: Option<f64>,
    pub risk_factor: Option<u8>,
    pub allocation: Option<AllocationResult>,
    pub market: Option<MarketConditions>,
    pub currently_held: bool,
}

struct Tally {
    confidence: i32,
    reasons: Vec<Finding>,
    warnings: Vec<Finding>,
}

impl Tally {
    fn reason(&mut self, signal: Signal, delta: i32, message: String) {
        self.confidence += delta;
        self.reasons.push(Finding::new(signal, message));
    }

    fn warning(&mut self, signal: Signal, delta: i32, message: String) {
        self.confidence += delta;
        self.warnings.push(Finding::new(signal, message));
    }
}

pub fn synthesize(inputs: &RecommendationInputs) -> RecommendationResult {
    let mut tally = Tally { confidence: BASE_CONFIDENCE, reasons: Vec::new(), warnings: Vec::new() };

    if inputs.npv > 0.0 {
        tally.reason(Signal::Npv, 15, format!("Positive NPV of ${:.2}", inputs.npv));
    } else if inputs.npv < 0.0 {
        tally.warning(Signal::Npv, -20, format!("Negative NPV of ${:.2}", inputs.npv));
    }

    let converged_irr = inputs.irr.filter(|irr| irr.converged).map(|irr| irr.rate);
    match inputs.irr {
        Some(irr) if !irr.converged => tally.warning(
            Signal::Irr,
            0,
            format!("IRR estimate did not converge after {} iterations", irr.iterations),
        ),
        Some(irr) if irr.rate > IRR_THRESHOLD => {
            tally.reason(Signal::Irr, 10, format!("IRR of {:.2}% exceeds the {:.0}% threshold", irr.rate, IRR_THRESHOLD))
        }
        Some(irr) => {
            tally.warning(Signal::Irr, -15, format!("IRR of {:.2}% is below the {:.0}% threshold", irr.rate, IRR_THRESHOLD))
        }
        None => {}
    }
    if let (Some(rate), Some(hurdle)) = (converged_irr, inputs.hurdle_rate) {
        if rate > hurdle {
            tally.reason(Signal::Irr, 0, format!("IRR clears the basket hurdle rate of {:.0}%", hurdle));
        }
    }

    if inputs.cagr > 20.0 {
        tally.reason(Signal::Cagr, 10, format!("Strong growth: CAGR of {:.2}%", inputs.cagr));
    } else if inputs.cagr < 0.0 {
        tally.warning(Signal::Cagr, -20, format!("Negative growth: CAGR of {:.2}%", inputs.cagr));
    }

    if inputs.volatility <= 0.0 {
        tally.warning(Signal::Volatility, 0, "Not enough price history to estimate volatility".to_string());
    } else if inputs.volatility < 30.0 {
        tally.reason(Signal::Volatility, 5, format!("Low volatility of {:.1}%", inputs.volatility));
    } else if inputs.volatility > 100.0 {
        tally.warning(Signal::Volatility, -15, format!("Extreme volatility of {:.1}%", inputs.volatility));
    }

    if let Some(aviv) = inputs.aviv_ratio {
        if aviv < 0.8 {
            tally.reason(Signal::AvivRatio, 15, format!("AVIV ratio {:.2} signals undervaluation", aviv));
        } else if aviv > 2.5 {
            tally.warning(Signal::AvivRatio, -15, format!("AVIV ratio {:.2} signals an overheated market", aviv));
        }
    }

    if let Some(beta) = inputs.beta {
        if beta < 1.2 {
            tally.reason(Signal::Beta, 5, format!("Moderate market sensitivity (beta {:.2})", beta));
        } else if beta > 2.5 {
            tally.warning(Signal::Beta, -10, format!("High market sensitivity (beta {:.2})", beta));
        }
    }

    if let Some(p) = inputs.loss_probability {
        if p < 0.2 {
            tally.reason(Signal::LossProbability, 10, format!("Low simulated loss probability ({:.0}%)", p * 100.0));
        } else if p > 0.4 {
            tally.warning(Signal::LossProbability, -20, format!("High simulated loss probability ({:.0}%)", p * 100.0));
        }
    }

    if let Some(quality) = inputs.data_quality {
        if quality > 80.0 {
            tally.reason(Signal::DataQuality, 10, format!("High data quality ({:.0}/100)", quality));
        } else if quality < 50.0 {
            tally.warning(Signal::DataQuality, -15, format!("Limited data quality ({:.0}/100)", quality));
        }
    }

    // The remaining signals are informational and do not move confidence.
    if let Some(score) = inputs.risk_factor {
        if score >= 4 {
            tally.warning(Signal::RiskFactor, 0, format!("Elevated risk factor {}/5", score));
        } else if score <= 2 {
            tally.reason(Signal::RiskFactor, 0, format!("Low risk factor {}/5", score));
        }
    }

    if let Some(allocation) = &inputs.allocation {
        let range = allocation.recommended_range;
        match allocation.status {
            AllocationStatus::Overexposed => tally.warning(
                Signal::Allocation,
                0,
                format!(
                    "{:.1}% of portfolio exceeds the {} cap; target {:.0}-{:.0}%",
                    allocation.portfolio_percentage, allocation.basket, range.min, range.max
                ),
            ),
            AllocationStatus::Underexposed => tally.reason(
                Signal::Allocation,
                0,
                format!(
                    "{} exposure of {:.1}% leaves room to increase toward {:.0}-{:.0}%",
                    allocation.basket, allocation.portfolio_percentage, range.min, range.max
                ),
            ),
            AllocationStatus::Optimal => {}
        }
    }

    if let Some(market) = &inputs.market {
        match market.bitcoin_market_state {
            BitcoinMarketState::Bullish => tally.reason(Signal::Market, 0, "Bitcoin market is bullish".to_string()),
            BitcoinMarketState::Bearish => tally.warning(Signal::Market, 0, "Bitcoin market is bearish".to_string()),
            BitcoinMarketState::Neutral => {}
        }
        if market.fed_rate_change > 0.0 {
            tally.warning(Signal::Market, 0, format!("Fed rate hike of {:.2}pp tightens liquidity", market.fed_rate_change));
        } else if market.fed_rate_change < 0.0 {
            tally.reason(Signal::Market, 0, format!("Fed rate cut of {:.2}pp eases liquidity", -market.fed_rate_change));
        }
        match market.smart_money {
            SmartMoney::Buying => tally.reason(Signal::Market, 0, "Smart money is accumulating".to_string()),
            SmartMoney::Selling => tally.warning(Signal::Market, 0, "Smart money is distributing".to_string()),
            SmartMoney::Neutral => {}
        }
        match market.sentiment_score {
            Some(score) if score > GREED_SENTIMENT => {
                tally.warning(Signal::Market, 0, format!("Market sentiment shows greed ({:.0}/100)", score))
            }
            Some(score) if score < FEAR_SENTIMENT => {
                tally.reason(Signal::Market, 0, format!("Market sentiment shows fear ({:.0}/100)", score))
            }
            _ => {}
        }
    }

    let confidence = tally.confidence.clamp(0, 100);
    let action = decide(inputs, converged_irr, confidence);

    RecommendationResult {
        action,
        confidence: confidence as u8,
        reasons: tally.reasons,
        warnings: tally.warnings,
    }
}

fn decide(inputs: &RecommendationInputs, irr: Option<f64>, confidence: i32) -> Action {
    let irr_clears = irr.is_some_and(|rate| rate > IRR_THRESHOLD);
    let loss_probability = inputs.loss_probability.unwrap_or(0.0);

    if inputs.npv > 0.0 && irr_clears && confidence > 70 {
        Action::Buy
    } else if inputs.npv > 0.0 && confidence > 50 {
        Action::BuyLess
    } else if inputs.npv < SELL_NPV_THRESHOLD || loss_probability > SELL_LOSS_PROBABILITY {
        Action::Sell
    } else if inputs.currently_held {
        Action::Hold
    } else {
        Action::DoNotBuy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converged(rate: f64) -> Option<IrrResult> {
        Some(IrrResult { rate, converged: true, iterations: 4 })
    }

    #[test]
    fn strong_fundamentals_give_buy() {
        let result = synthesize(&RecommendationInputs {
            npv: 5_000.0,
            irr: converged(32.0),
            cagr: 25.0,
            volatility: 55.0,
            aviv_ratio: Some(0.7),
            ..Default::default()
        });
        // 50 + 15 + 10 + 10 + 15
        assert_eq!(result.confidence, 100);
        assert_eq!(result.action, Action::Buy);
        let order: Vec<Signal> = result.reasons.iter().map(|f| f.signal).collect();
        assert_eq!(order, vec![Signal::Npv, Signal::Irr, Signal::Cagr, Signal::AvivRatio]);
    }

    #[test]
    fn positive_npv_with_modest_irr_is_buy_less() {
        let result = synthesize(&RecommendationInputs {
            npv: 200.0,
            irr: converged(12.0),
            cagr: 10.0,
            volatility: 20.0,
            ..Default::default()
        });
        // 50 + 15 - 15 + 5
        assert_eq!(result.confidence, 55);
        assert_eq!(result.action, Action::BuyLess);
    }

    #[test]
    fn deep_negative_npv_is_sell() {
        let result = synthesize(&RecommendationInputs {
            npv: -4_000.0,
            irr: converged(-20.0),
            cagr: -15.0,
            volatility: 140.0,
            loss_probability: Some(0.7),
            ..Default::default()
        });
        assert_eq!(result.confidence, 0);
        assert_eq!(result.action, Action::Sell);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn held_position_without_edge_is_hold() {
        let inputs = RecommendationInputs { npv: -500.0, volatility: 50.0, currently_held: true, ..Default::default() };
        assert_eq!(synthesize(&inputs).action, Action::Hold);
        let fresh = RecommendationInputs { currently_held: false, ..inputs };
        assert_eq!(synthesize(&fresh).action, Action::DoNotBuy);
    }

    #[test]
    fn unconverged_irr_never_supports_buy() {
        let result = synthesize(&RecommendationInputs {
            npv: 5_000.0,
            irr: Some(IrrResult { rate: 40.0, converged: false, iterations: 100 }),
            cagr: 30.0,
            aviv_ratio: Some(0.5),
            volatility: 25.0,
            ..Default::default()
        });
        assert!(result.confidence > 70);
        assert_eq!(result.action, Action::BuyLess);
        assert!(result.warnings.iter().any(|w| w.signal == Signal::Irr));
    }

    fn neutral() -> RecommendationInputs {
        RecommendationInputs { volatility: 50.0, ..Default::default() }
    }

    #[test]
    fn confidence_deltas_per_arm() {
        let cases: Vec<(&str, RecommendationInputs, u8)> = vec![
            ("baseline", neutral(), 50),
            ("low beta", RecommendationInputs { beta: Some(1.0), ..neutral() }, 55),
            ("mid beta", RecommendationInputs { beta: Some(2.0), ..neutral() }, 50),
            ("high beta", RecommendationInputs { beta: Some(3.0), ..neutral() }, 40),
            ("high quality", RecommendationInputs { data_quality: Some(90.0), ..neutral() }, 60),
            ("mid quality", RecommendationInputs { data_quality: Some(65.0), ..neutral() }, 50),
            ("low quality", RecommendationInputs { data_quality: Some(40.0), ..neutral() }, 35),
            ("low loss", RecommendationInputs { loss_probability: Some(0.1), ..neutral() }, 60),
            ("mid loss", RecommendationInputs { loss_probability: Some(0.3), ..neutral() }, 50),
            ("high loss", RecommendationInputs { loss_probability: Some(0.5), ..neutral() }, 30),
        ];

        for (name, inputs, expected) in cases {
            assert_eq!(synthesize(&inputs).confidence, expected, "{}", name);
        }
    }

    #[test]
    fn sell_requires_npv_strictly_below_threshold() {
        let at_threshold = synthesize(&RecommendationInputs { npv: -1000.0, ..neutral() });
        assert_eq!(at_threshold.action, Action::DoNotBuy);

        let below = synthesize(&RecommendationInputs { npv: -1000.01, ..neutral() });
        assert_eq!(below.action, Action::Sell);
    }

    #[test]
    fn sentiment_extremes_are_informational() {
        let market = |score: f64| RecommendationInputs {
            market: Some(MarketConditions { sentiment_score: Some(score), ..Default::default() }),
            ..neutral()
        };

        let greedy = synthesize(&market(85.0));
        assert_eq!(greedy.confidence, 50);
        assert!(greedy.warnings.iter().any(|w| w.signal == Signal::Market && w.message.contains("greed")));

        let fearful = synthesize(&market(15.0));
        assert_eq!(fearful.confidence, 50);
        assert!(fearful.reasons.iter().any(|r| r.signal == Signal::Market && r.message.contains("fear")));

        let calm = synthesize(&market(50.0));
        assert!(calm.reasons.is_empty() && calm.warnings.is_empty());
    }

    #[test]
    fn missing_volatility_is_a_warning_not_a_bonus() {
        let result = synthesize(&RecommendationInputs { volatility: 0.0, ..Default::default() });
        assert_eq!(result.confidence, 50);
        assert_eq!(result.warnings[0].signal, Signal::Volatility);
    }
}
