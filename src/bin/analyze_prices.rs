// src/bin/analyze_prices.rs
use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use csv::Reader;
use dotenv::dotenv;
use log::info;
use serde::Deserialize;
use std::env;
use std::fs::File;

use crypto_valuation::config::EngineConfig;
use crypto_valuation::models::{BasketType, CoinSnapshot, InvestmentInputs, MarketConditions, PricePoint, PriceSeries};
use crypto_valuation::services::analysis::{analyze, AnalysisRequest};

#[derive(Debug, Deserialize)]
struct PriceRow {
    timestamp: String,
    price: f64,
}

// RFC 3339 or unix seconds
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let secs: i64 = raw.parse().with_context(|| format!("unrecognized timestamp {:?}", raw))?;
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| anyhow!("timestamp out of range: {}", secs))
}

fn read_prices(path: &str) -> Result<PriceSeries> {
    let file = File::open(path).with_context(|| format!("opening {}", path))?;
    let mut rdr = Reader::from_reader(file);

    let mut points = Vec::new();
    for (line, row) in rdr.deserialize::<PriceRow>().enumerate() {
        let row = row.with_context(|| format!("reading row {}", line + 1))?;
        points.push(PricePoint {
            timestamp: parse_timestamp(&row.timestamp)?,
            price: row.price,
        });
    }
    info!("Loaded {} price points from {}", points.len(), path);

    Ok(PriceSeries::new(points)?)
}

fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: {} <prices.csv> [amount] [horizon_years] [basket]", args[0]);
    }

    let prices = read_prices(&args[1])?;
    let amount: f64 = args.get(2).map(|s| s.parse()).transpose()?.unwrap_or(10_000.0);
    let horizon_years: u32 = args.get(3).map(|s| s.parse()).transpose()?.unwrap_or(5);
    let basket: BasketType = match args.get(4) {
        Some(s) => s.parse().map_err(|e: String| anyhow!(e))?,
        None => BasketType::Bitcoin,
    };

    let current_price = prices.last().map(|p| p.price).ok_or_else(|| anyhow!("price file is empty"))?;

    let request = AnalysisRequest {
        inputs: InvestmentInputs {
            coin_id: args[1].clone(),
            investment_amount: amount,
            horizon_years,
            staking_yield: None,
            risk_free_rate: None,
            expected_price: None,
            portfolio_value: None,
            currently_held: false,
        },
        coin: CoinSnapshot {
            current_price,
            basket,
            fundamentals_score: None,
            on_chain: Default::default(),
        },
        prices,
        benchmark_prices: None,
        market: MarketConditions::default(),
    };

    let config = EngineConfig::from_env();
    let report = analyze(&request, &config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
