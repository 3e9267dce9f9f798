// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Next-month spending forecast from recent complete months.

use crate::commands::reports::month_key;
use crate::commands::transactions::load_all;
use crate::models::{Transaction, TxKind};
use crate::utils::{fmt_money, maybe_print_json, output_flags, pretty_table, today};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Relative change below which the trend is reported as flat (5%).
const FLAT_BAND: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Flat => "flat",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryForecast {
    pub category: String,
    pub predicted: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub months_used: Vec<String>,
    pub categories: Vec<CategoryForecast>,
    pub total: Decimal,
    pub last_month: Decimal,
    pub trend: Trend,
}

/// Mean expense per category over the last `months` complete months that
/// have expenses. The month containing `today` is never used.
pub fn forecast(txs: &[Transaction], today: NaiveDate, months: usize) -> Forecast {
    let current = today.format("%Y-%m").to_string();
    let expenses: Vec<&Transaction> = txs
        .iter()
        .filter(|t| t.kind == TxKind::Expense && month_key(t) < current)
        .collect();

    let all_months: BTreeSet<String> = expenses.iter().map(|t| month_key(t)).collect();
    let used: Vec<String> = all_months.into_iter().rev().take(months.max(1)).collect();

    let mut per_cat: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut last_month = Decimal::ZERO;
    for t in expenses.iter().filter(|t| used.contains(&month_key(t))) {
        let cat = if t.category.is_empty() {
            "(uncategorized)".to_string()
        } else {
            t.category.clone()
        };
        *per_cat.entry(cat).or_insert(Decimal::ZERO) += t.amount;
        if used.first() == Some(&month_key(t)) {
            last_month += t.amount;
        }
    }

    let n = Decimal::from(used.len().max(1));
    let mut categories: Vec<CategoryForecast> = per_cat
        .into_iter()
        .map(|(category, sum)| CategoryForecast {
            category,
            predicted: (sum / n).round_dp(2),
        })
        .collect();
    categories.sort_by(|a, b| b.predicted.cmp(&a.predicted));
    let total: Decimal = categories.iter().map(|c| c.predicted).sum();

    let trend = if total.is_zero() {
        Trend::Flat
    } else {
        let change = (last_month - total) / total;
        if change > FLAT_BAND {
            Trend::Up
        } else if change < -FLAT_BAND {
            Trend::Down
        } else {
            Trend::Flat
        }
    };

    Forecast {
        months_used: used,
        categories,
        total,
        last_month,
        trend,
    }
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(m);
    let months: usize = *m.get_one::<usize>("months").unwrap_or(&3);
    let f = forecast(&load_all(conn)?, today(), months);
    tracing::debug!(months = ?f.months_used, "forecast computed");
    if maybe_print_json(json_flag, jsonl_flag, &f)? {
        return Ok(());
    }
    if f.months_used.is_empty() {
        println!("Not enough history to predict spending yet.");
        return Ok(());
    }
    let rows = f
        .categories
        .iter()
        .map(|c| vec![c.category.clone(), fmt_money(&c.predicted)])
        .collect();
    println!("{}", pretty_table(&["Category", "Predicted"], rows));
    println!(
        "Predicted total: {} (last month {}, trend {})",
        fmt_money(&f.total),
        fmt_money(&f.last_month),
        f.trend.as_str()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exp(amount: i64, date: &str, category: &str) -> Transaction {
        Transaction {
            id: 0,
            title: "t".into(),
            amount: Decimal::from(amount),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            category: category.into(),
            kind: TxKind::Expense,
            payment_method: None,
            notes: None,
        }
    }

    #[test]
    fn averages_complete_months_only() {
        let today = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
        let txs = vec![
            exp(100, "2024-02-05", "Food"),
            exp(200, "2024-03-05", "Food"),
            exp(60, "2024-03-07", "Transport"),
            exp(9999, "2024-04-01", "Food"),
        ];
        let f = forecast(&txs, today, 3);
        assert_eq!(f.months_used, vec!["2024-03", "2024-02"]);
        assert_eq!(f.categories[0].category, "Food");
        assert_eq!(f.categories[0].predicted, Decimal::from(150));
        assert_eq!(f.categories[1].predicted, Decimal::from(30));
        assert_eq!(f.last_month, Decimal::from(260));
        assert_eq!(f.trend, Trend::Up);
    }

    #[test]
    fn empty_history_is_flat() {
        let today = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
        let f = forecast(&[], today, 3);
        assert!(f.months_used.is_empty());
        assert_eq!(f.trend, Trend::Flat);
    }
}
