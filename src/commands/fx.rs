// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::currency::{self, REFERENCE, RateTable};
use crate::error::BudgetError;
use crate::models::ForeignTransaction;
use crate::utils::{
    date_column, decimal_column, fmt_money, get_base_currency, http_client, maybe_print_json,
    opt_arg, output_flags, parse_amount, parse_date, pretty_table, req_arg, today,
};
use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("currencies", sub)) => list_currencies(conn, sub)?,
        Some(("convert", sub)) => convert_cmd(conn, sub)?,
        Some(("set-rate", sub)) => {
            let code = req_arg(sub, "currency")?;
            let rate = parse_amount(&req_arg(sub, "rate")?)?;
            currency::set_rate(conn, &code, rate)?;
            println!("Rate for {} set to {} per USD", code.to_uppercase(), rate);
        }
        Some(("fetch", _)) => fetch_rates(conn)?,
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("balances", sub)) => balances_cmd(conn, sub)?,
        Some(("quick", sub)) => quick(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn list_currencies(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    let data = currency::load_currencies(conn)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data
            .iter()
            .map(|c| {
                vec![
                    c.code.clone(),
                    c.name.clone(),
                    c.symbol.clone(),
                    c.rate.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Code", "Name", "Symbol", "Per USD"], rows)
        );
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    pub amount: Decimal,
    pub from: String,
    pub to: String,
    pub rate: Decimal,
    pub result: Decimal,
}

impl Conversion {
    pub fn summary(&self) -> String {
        format!(
            "{} {} = {} {}\n1 {} = {:.4} {}",
            self.amount,
            self.from,
            fmt_money(&self.result),
            self.to,
            self.from,
            self.rate.round_dp(4),
            self.to
        )
    }
}

pub fn convert(table: &RateTable, amount: Decimal, from: &str, to: &str) -> Conversion {
    let from = from.trim().to_uppercase();
    let to = to.trim().to_uppercase();
    Conversion {
        amount,
        rate: table.exchange_rate(&from, &to),
        result: table.convert(amount, &from, &to),
        from,
        to,
    }
}

fn convert_cmd(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let amount = parse_amount(&req_arg(sub, "amount")?)?;
    let from = req_arg(sub, "from")?;
    let to = req_arg(sub, "to")?;
    let table = currency::load_table(conn)?;
    println!("{}", convert(&table, amount, &from, &to).summary());
    Ok(())
}

#[derive(Debug, Deserialize)]
struct Latest {
    rates: HashMap<String, f64>,
    #[serde(rename = "date")]
    _date: String,
}

fn fetch_rates(conn: &Connection) -> Result<()> {
    let known: Vec<String> = currency::load_currencies(conn)?
        .into_iter()
        .map(|c| c.code)
        .filter(|c| c != REFERENCE)
        .collect();
    let url = format!(
        "https://api.frankfurter.dev/v1/latest?base={}&symbols={}",
        REFERENCE,
        known.join(",")
    );
    let client = http_client()?;
    let resp = client.get(url).send()?.error_for_status()?;
    let latest: Latest = resp.json().context("Unexpected Frankfurter response")?;
    let mut updated = 0;
    for (code, rate) in latest.rates {
        match Decimal::try_from(rate) {
            Ok(r) if r > Decimal::ZERO => {
                currency::set_rate(conn, &code, r.round_dp(6))?;
                updated += 1;
            }
            _ => warn!(%code, rate, "skipping unusable rate"),
        }
    }
    info!(updated, "rates refreshed");
    println!("FX rates fetched via Frankfurter (ECB): {} updated.", updated);
    Ok(())
}

pub fn load_foreign(conn: &Connection) -> Result<Vec<ForeignTransaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, description, amount, currency, date, category, amount_in_usd
         FROM foreign_transactions ORDER BY date DESC, id DESC",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
            r.get::<_, String>(6)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, description, amount, ccy, date, category, usd) = row?;
        out.push(ForeignTransaction {
            id,
            description,
            amount: decimal_column(&amount, "amount")?,
            currency: ccy,
            date: date_column(&date)?,
            category,
            amount_in_usd: decimal_column(&usd, "amount_in_usd")?,
        });
    }
    Ok(out)
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let description = req_arg(sub, "description")?;
    let category = req_arg(sub, "category")?;
    let amount = parse_amount(&req_arg(sub, "amount")?)?;
    let table = currency::load_table(conn)?;
    let ccy = currency::ensure_known(&table, &req_arg(sub, "currency")?)?;
    let date = match opt_arg(sub, "date") {
        Some(d) => parse_date(&d)?,
        None => today(),
    };
    let usd = table.convert(amount, &ccy, REFERENCE).round_dp(2);
    conn.execute(
        "INSERT INTO foreign_transactions(description, amount, currency, date, category, amount_in_usd)
         VALUES (?1,?2,?3,?4,?5,?6)",
        params![
            description,
            amount.to_string(),
            ccy,
            date.to_string(),
            category,
            usd.to_string()
        ],
    )?;
    println!(
        "Transaction added successfully: {} {} ({} USD)",
        amount,
        ccy,
        fmt_money(&usd)
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    let data = load_foreign(conn)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let currencies = currency::load_currencies(conn)?;
        let rows = data
            .iter()
            .map(|t| {
                vec![
                    t.id.to_string(),
                    t.date.to_string(),
                    t.description.clone(),
                    t.category.clone(),
                    currency::format_amount(&currencies, t.amount, &t.currency),
                    fmt_money(&t.amount_in_usd),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Description", "Category", "Amount", "USD"],
                rows
            )
        );
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyBalance {
    pub currency: String,
    pub balance: Decimal,
    pub in_base: Decimal,
}

/// Outflow per currency (negated sum of amounts) plus its value in `base`.
pub fn balances(table: &RateTable, txs: &[ForeignTransaction], base: &str) -> Vec<CurrencyBalance> {
    let mut out: Vec<CurrencyBalance> = Vec::new();
    for t in txs {
        match out.iter_mut().find(|b| b.currency == t.currency) {
            Some(b) => b.balance -= t.amount,
            None => out.push(CurrencyBalance {
                currency: t.currency.clone(),
                balance: -t.amount,
                in_base: Decimal::ZERO,
            }),
        }
    }
    for b in &mut out {
        b.in_base = table.convert(b.balance, &b.currency, base).round_dp(2);
    }
    out.sort_by(|a, b| a.currency.cmp(&b.currency));
    out
}

fn balances_cmd(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    let table = currency::load_table(conn)?;
    let base = match opt_arg(sub, "base") {
        Some(b) => currency::ensure_known(&table, &b)?,
        None => get_base_currency(conn)?,
    };
    let data = balances(&table, &load_foreign(conn)?, &base);
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let currencies = currency::load_currencies(conn)?;
        let total: Decimal = data.iter().map(|b| b.in_base).sum();
        let base_col = format!("In {}", base);
        let rows = data
            .iter()
            .map(|b| {
                vec![
                    b.currency.clone(),
                    currency::format_amount(&currencies, b.balance, &b.currency),
                    currency::format_amount(&currencies, b.in_base, &base),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Currency", "Balance", base_col.as_str()], rows)
        );
        println!(
            "Total: {}",
            currency::format_amount(&currencies, total, &base)
        );
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickConversion {
    pub id: i64,
    #[serde(flatten)]
    pub conversion: Conversion,
}

/// Saved conversions, evaluated against the current rate table.
pub fn load_quick(conn: &Connection) -> Result<Vec<QuickConversion>> {
    let table = currency::load_table(conn)?;
    let mut stmt =
        conn.prepare("SELECT id, from_ccy, to_ccy, amount FROM quick_conversions ORDER BY id")?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, from, to, amount) = row?;
        out.push(QuickConversion {
            id,
            conversion: convert(&table, decimal_column(&amount, "amount")?, &from, &to),
        });
    }
    Ok(out)
}

/// Saves a quick conversion; `amount` defaults to 1.
pub fn add_quick(conn: &Connection, from: &str, to: &str, amount: Option<Decimal>) -> Result<i64> {
    let table = currency::load_table(conn)?;
    let from = currency::ensure_known(&table, from)?;
    let to = currency::ensure_known(&table, to)?;
    let amount = amount.unwrap_or(Decimal::ONE);
    conn.execute(
        "INSERT INTO quick_conversions(from_ccy, to_ccy, amount) VALUES (?1,?2,?3)",
        params![from, to, amount.to_string()],
    )?;
    Ok(conn.last_insert_rowid())
}

fn quick(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let amount = opt_arg(sub, "amount").map(|a| parse_amount(&a)).transpose()?;
            let id = add_quick(conn, &req_arg(sub, "from")?, &req_arg(sub, "to")?, amount)?;
            let q = load_quick(conn)?
                .into_iter()
                .find(|q| q.id == id)
                .ok_or_else(|| BudgetError::NotFound(format!("Quick conversion {}", id)))?;
            println!(
                "Quick conversion added: {} {} to {}",
                q.conversion.amount, q.conversion.from, q.conversion.to
            );
        }
        Some(("list", sub)) => {
            let (json_flag, jsonl_flag) = output_flags(sub);
            let data = load_quick(conn)?;
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .iter()
                    .map(|q| {
                        let c = &q.conversion;
                        vec![
                            q.id.to_string(),
                            format!("{} {}", c.amount, c.from),
                            format!("{} {}", fmt_money(&c.result), c.to),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["ID", "From", "To"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ftx(amount: i64, ccy: &str) -> ForeignTransaction {
        ForeignTransaction {
            id: 0,
            description: "x".into(),
            amount: Decimal::from(amount),
            currency: ccy.into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            category: "Travel".into(),
            amount_in_usd: Decimal::ZERO,
        }
    }

    #[test]
    fn summary_shows_four_decimal_rate() {
        let c = convert(&RateTable::defaults(), Decimal::from(832), "inr", "usd");
        assert_eq!(c.result.round_dp(2), Decimal::from(10));
        assert_eq!(c.summary(), "832 INR = 10.00 USD\n1 INR = 0.0120 USD");
    }

    #[test]
    fn balances_group_by_currency() {
        let table = RateTable::defaults();
        let b = balances(&table, &[ftx(100, "EUR"), ftx(50, "EUR"), ftx(10, "USD")], "USD");
        assert_eq!(b.len(), 2);
        assert_eq!(b[0].currency, "EUR");
        assert_eq!(b[0].balance, Decimal::from(-150));
        assert_eq!(b[1].in_base, Decimal::from(-10));
    }
}
