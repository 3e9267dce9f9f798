// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::BudgetError;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

const UA: &str = concat!(
    "budgetiq/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/alphavelocity/budgetiq)"
);

pub fn http_client() -> Result<reqwest::blocking::Client> {
    let c = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .user_agent(UA)
        .build()?;
    Ok(c)
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Validates a `YYYY-MM` month and returns it zero-padded ("2025-8" -> "2025-08").
pub fn parse_month(s: &str) -> Result<String> {
    let s = s.trim();
    let d = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))?;
    Ok(d.format("%Y-%m").to_string())
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// Form-style amount: empty is "missing", unparsable or non-positive is "invalid".
pub fn parse_amount(s: &str) -> Result<Decimal, BudgetError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(BudgetError::MissingAmount);
    }
    match s.parse::<Decimal>() {
        Ok(v) if v > Decimal::ZERO => Ok(v),
        _ => Err(BudgetError::InvalidAmount),
    }
}

pub fn decimal_column(s: &str, what: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid {} '{}' in database", what, s))
}

pub fn date_column(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}' in database", s))
}

/// Trimmed value of a string argument, if given and non-empty.
pub fn opt_arg(m: &clap::ArgMatches, id: &str) -> Option<String> {
    m.get_one::<String>(id)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Trimmed value of a string argument; blank counts as missing.
pub fn req_arg(m: &clap::ArgMatches, id: &str) -> Result<String> {
    opt_arg(m, id).ok_or_else(|| BudgetError::MissingFields.into())
}

pub fn id_arg(m: &clap::ArgMatches, id: &str) -> Result<i64> {
    let raw = req_arg(m, id)?;
    raw.parse::<i64>()
        .with_context(|| format!("Invalid id '{}'", raw))
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn clear_setting(conn: &Connection, key: &str) -> Result<()> {
    conn.execute("DELETE FROM settings WHERE key=?1", params![key])?;
    Ok(())
}

pub fn get_base_currency(conn: &Connection) -> Result<String> {
    Ok(get_setting(conn, "base_currency")?.unwrap_or_else(|| "USD".to_string()))
}

pub fn set_base_currency(conn: &Connection, ccy: &str) -> Result<()> {
    set_setting(conn, "base_currency", ccy)
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // arrays stream one element per line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

/// `(json, jsonl)` output flags of a list command.
pub fn output_flags(m: &clap::ArgMatches) -> (bool, bool) {
    (m.get_flag("json"), m.get_flag("jsonl"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_amount_messages() {
        assert_eq!(parse_amount("  "), Err(BudgetError::MissingAmount));
        assert_eq!(parse_amount("abc"), Err(BudgetError::InvalidAmount));
        assert_eq!(parse_amount("-3"), Err(BudgetError::InvalidAmount));
        assert_eq!(parse_amount("0"), Err(BudgetError::InvalidAmount));
        assert_eq!(parse_amount(" 12.5 ").unwrap(), Decimal::new(125, 1));
    }

    #[test]
    fn month_must_be_valid() {
        assert!(parse_month("2024-13").is_err());
        assert_eq!(parse_month(" 2024-03 ").unwrap(), "2024-03");
        assert_eq!(parse_month("2025-8").unwrap(), "2025-08");
    }
}
