// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::transactions::load_all;
use crate::models::{Transaction, TxKind};
use crate::utils::{
    fmt_money, maybe_print_json, opt_arg, output_flags, parse_month, pretty_table, req_arg, today,
};
use anyhow::{Result, anyhow};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("monthly", sub)) => monthly(conn, sub)?,
        Some(("categories", sub)) => categories(conn, sub)?,
        Some(("export", sub)) => export(conn, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthSummary {
    pub month: String,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpend {
    pub category: String,
    pub spent: Decimal,
    pub share: Decimal,
}

pub fn month_key(t: &Transaction) -> String {
    t.date.format("%Y-%m").to_string()
}

/// Income and expense totals for the most recent `months` months with data,
/// newest first.
pub fn monthly_summary(txs: &[Transaction], months: usize) -> Vec<MonthSummary> {
    let mut map: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
    for t in txs {
        let entry = map.entry(month_key(t)).or_insert((Decimal::ZERO, Decimal::ZERO));
        match t.kind {
            TxKind::Income => entry.0 += t.amount,
            TxKind::Expense => entry.1 += t.amount,
        }
    }
    map.into_iter()
        .rev()
        .take(months)
        .map(|(month, (income, expense))| MonthSummary {
            month,
            income,
            expense,
            net: income - expense,
        })
        .collect()
}

/// Expense per category in `month`, largest first, with its share of the total.
pub fn category_breakdown(txs: &[Transaction], month: &str) -> Vec<CategorySpend> {
    let mut agg: BTreeMap<String, Decimal> = BTreeMap::new();
    for t in txs
        .iter()
        .filter(|t| t.kind == TxKind::Expense && month_key(t) == month)
    {
        let cat = if t.category.is_empty() {
            "(uncategorized)".to_string()
        } else {
            t.category.clone()
        };
        *agg.entry(cat).or_insert(Decimal::ZERO) += t.amount;
    }
    let total: Decimal = agg.values().copied().sum();
    let mut items: Vec<CategorySpend> = agg
        .into_iter()
        .map(|(category, spent)| CategorySpend {
            share: if total.is_zero() {
                Decimal::ZERO
            } else {
                (spent / total * Decimal::ONE_HUNDRED).round_dp(1)
            },
            category,
            spent,
        })
        .collect();
    items.sort_by(|a, b| b.spent.cmp(&a.spent));
    items
}

fn monthly(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    let months: usize = *sub.get_one::<usize>("months").unwrap_or(&6);
    let data = monthly_summary(&load_all(conn)?, months);
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data
            .iter()
            .map(|s| {
                vec![
                    s.month.clone(),
                    fmt_money(&s.income),
                    fmt_money(&s.expense),
                    fmt_money(&s.net),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Month", "Income", "Expense", "Net"], rows)
        );
    }
    Ok(())
}

fn categories(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    let month = parse_month(&req_arg(sub, "month")?)?;
    let data = category_breakdown(&load_all(conn)?, &month);
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data
            .iter()
            .map(|c| {
                vec![
                    c.category.clone(),
                    fmt_money(&c.spent),
                    format!("{}%", c.share),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Category", "Spent", "Share"], rows));
    }
    Ok(())
}

fn export(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let kind = req_arg(sub, "kind")?.to_lowercase();
    let fmt = req_arg(sub, "format")?.to_lowercase();
    let out = req_arg(sub, "out")?;
    let txs = load_all(conn)?;

    let (headers, rows, json) = match kind.as_str() {
        "monthly" => {
            let months: usize = *sub.get_one::<usize>("months").unwrap_or(&6);
            let data = monthly_summary(&txs, months);
            let rows: Vec<Vec<String>> = data
                .iter()
                .map(|s| {
                    vec![
                        s.month.clone(),
                        s.income.to_string(),
                        s.expense.to_string(),
                        s.net.to_string(),
                    ]
                })
                .collect();
            (
                vec!["month", "income", "expense", "net"],
                rows,
                serde_json::to_value(&data)?,
            )
        }
        "categories" => {
            let month = match opt_arg(sub, "month") {
                Some(m) => parse_month(&m)?,
                None => today().format("%Y-%m").to_string(),
            };
            let data = category_breakdown(&txs, &month);
            let rows: Vec<Vec<String>> = data
                .iter()
                .map(|c| vec![c.category.clone(), c.spent.to_string(), c.share.to_string()])
                .collect();
            (
                vec!["category", "spent", "share"],
                rows,
                serde_json::to_value(&data)?,
            )
        }
        other => {
            return Err(anyhow!(
                "Unknown report '{}' (use monthly|categories)",
                other
            ));
        }
    };

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(&out)?;
            wtr.write_record(&headers)?;
            for r in rows {
                wtr.write_record(&r)?;
            }
            wtr.flush()?;
        }
        "json" => std::fs::write(&out, serde_json::to_string_pretty(&json)?)?,
        other => return Err(anyhow!("Unknown format: {} (use csv|json)", other)),
    }
    println!("Report exported successfully to {}", out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn tx(amount: i64, date: &str, category: &str, kind: TxKind) -> Transaction {
        Transaction {
            id: 0,
            title: "t".into(),
            amount: Decimal::from(amount),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            category: category.into(),
            kind,
            payment_method: None,
            notes: None,
        }
    }

    #[test]
    fn monthly_is_newest_first() {
        let txs = vec![
            tx(100, "2024-02-03", "Food", TxKind::Expense),
            tx(500, "2024-03-01", "Income", TxKind::Income),
            tx(40, "2024-03-09", "Food", TxKind::Expense),
        ];
        let s = monthly_summary(&txs, 6);
        assert_eq!(s[0].month, "2024-03");
        assert_eq!(s[0].net, Decimal::from(460));
        assert_eq!(s[1].expense, Decimal::from(100));
        assert_eq!(monthly_summary(&txs, 1).len(), 1);
    }

    #[test]
    fn category_shares_sum_to_hundred() {
        let txs = vec![
            tx(75, "2024-03-01", "Food", TxKind::Expense),
            tx(25, "2024-03-02", "", TxKind::Expense),
            tx(999, "2024-03-02", "Income", TxKind::Income),
        ];
        let c = category_breakdown(&txs, "2024-03");
        assert_eq!(c[0].category, "Food");
        assert_eq!(c[0].share, Decimal::from(75));
        assert_eq!(c[1].category, "(uncategorized)");
    }
}
