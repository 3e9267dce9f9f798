// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Static exchange-rate table and conversion through the USD reference.

use crate::error::BudgetError;
use crate::models::Currency;
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use std::collections::HashMap;

pub const REFERENCE: &str = "USD";

/// (code, name, symbol, units per USD)
static DEFAULTS: Lazy<Vec<(&str, &str, &str, Decimal)>> = Lazy::new(|| {
    vec![
        ("INR", "Indian Rupee", "₹", Decimal::new(8320, 2)),
        ("USD", "US Dollar", "$", Decimal::ONE),
        ("EUR", "Euro", "€", Decimal::new(91, 2)),
        ("GBP", "British Pound", "£", Decimal::new(78, 2)),
        ("JPY", "Japanese Yen", "¥", Decimal::new(14632, 2)),
        ("CAD", "Canadian Dollar", "C$", Decimal::new(136, 2)),
        ("AUD", "Australian Dollar", "A$", Decimal::new(148, 2)),
        ("CNY", "Chinese Yuan", "¥", Decimal::new(716, 2)),
        ("CHF", "Swiss Franc", "CHF", Decimal::new(87, 2)),
        ("BRL", "Brazilian Real", "R$", Decimal::new(507, 2)),
        ("MXN", "Mexican Peso", "Mex$", Decimal::new(1676, 2)),
    ]
});

pub fn default_currencies() -> Vec<Currency> {
    DEFAULTS
        .iter()
        .map(|(code, name, symbol, rate)| Currency {
            code: code.to_string(),
            name: name.to_string(),
            symbol: symbol.to_string(),
            rate: *rate,
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct RateTable {
    rates: HashMap<String, Decimal>,
}

impl RateTable {
    pub fn from_currencies(currencies: &[Currency]) -> Self {
        let rates = currencies
            .iter()
            .map(|c| (c.code.to_uppercase(), c.rate))
            .collect();
        Self { rates }
    }

    pub fn defaults() -> Self {
        Self::from_currencies(&default_currencies())
    }

    pub fn rate(&self, code: &str) -> Option<Decimal> {
        self.rates.get(&code.to_uppercase()).copied()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rates.contains_key(&code.to_uppercase())
    }

    /// Units of `to` per one unit of `from`. Unknown codes yield 1.
    pub fn exchange_rate(&self, from: &str, to: &str) -> Decimal {
        match (self.rate(from), self.rate(to)) {
            (Some(f), Some(t)) if !f.is_zero() => t / f,
            _ => {
                tracing::warn!(from, to, "no rate for currency pair, using 1");
                Decimal::ONE
            }
        }
    }

    pub fn convert(&self, amount: Decimal, from: &str, to: &str) -> Decimal {
        amount * self.exchange_rate(from, to)
    }
}

pub fn ensure_known(table: &RateTable, code: &str) -> Result<String> {
    let code = code.trim().to_uppercase();
    if table.contains(&code) {
        Ok(code)
    } else {
        Err(BudgetError::UnknownCurrency(code).into())
    }
}

pub fn seed_defaults(conn: &Connection) -> Result<()> {
    for c in default_currencies() {
        conn.execute(
            "INSERT OR IGNORE INTO currencies(code, name, symbol, rate) VALUES (?1,?2,?3,?4)",
            params![c.code, c.name, c.symbol, c.rate.to_string()],
        )?;
    }
    Ok(())
}

pub fn load_currencies(conn: &Connection) -> Result<Vec<Currency>> {
    let mut stmt = conn.prepare("SELECT code, name, symbol, rate FROM currencies ORDER BY code")?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (code, name, symbol, rate_s) = row?;
        let rate = rate_s
            .parse::<Decimal>()
            .with_context(|| format!("Invalid rate '{}' for {}", rate_s, code))?;
        out.push(Currency {
            code,
            name,
            symbol,
            rate,
        });
    }
    Ok(out)
}

pub fn load_table(conn: &Connection) -> Result<RateTable> {
    Ok(RateTable::from_currencies(&load_currencies(conn)?))
}

pub fn set_rate(conn: &Connection, code: &str, rate: Decimal) -> Result<()> {
    if rate <= Decimal::ZERO {
        return Err(BudgetError::InvalidAmount.into());
    }
    let code = code.trim().to_uppercase();
    conn.execute(
        "INSERT INTO currencies(code, name, symbol, rate) VALUES (?1, ?1, ?1, ?2)
         ON CONFLICT(code) DO UPDATE SET rate=excluded.rate",
        params![code, rate.to_string()],
    )?;
    Ok(())
}

/// Symbol-prefixed amount at two decimals, e.g. `€12.50`.
pub fn format_amount(currencies: &[Currency], amount: Decimal, code: &str) -> String {
    let symbol = currencies
        .iter()
        .find(|c| c.code.eq_ignore_ascii_case(code))
        .map(|c| c.symbol.as_str())
        .unwrap_or("");
    format!("{}{:.2}", symbol, amount.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_through_reference() {
        let table = RateTable::defaults();
        let eur = table.convert(Decimal::from(100), "USD", "EUR");
        assert_eq!(format!("{:.2}", eur), "91.00");
        let usd = table.convert(Decimal::new(8320, 0), "INR", "USD");
        assert_eq!(format!("{:.2}", usd.round_dp(2)), "100.00");
    }

    #[test]
    fn unknown_code_leaves_amount_unchanged() {
        let table = RateTable::defaults();
        let v = table.convert(Decimal::from(42), "XYZ", "EUR");
        assert_eq!(v, Decimal::from(42));
    }

    #[test]
    fn format_uses_symbol() {
        let cur = default_currencies();
        assert_eq!(format_amount(&cur, Decimal::new(125, 1), "GBP"), "£12.50");
        assert_eq!(format_amount(&cur, Decimal::new(3, 0), "ZZZ"), "3.00");
    }
}
