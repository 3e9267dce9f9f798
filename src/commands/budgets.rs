// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::BudgetError;
use crate::models::Budget;
use crate::utils::{
    decimal_column, fmt_money, maybe_print_json, opt_arg, output_flags, parse_amount, parse_month,
    pretty_table, req_arg, today,
};
use anyhow::Result;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let cat = req_arg(sub, "category")?;
            let n = conn.execute("DELETE FROM budgets WHERE category=?1", params![cat])?;
            if n == 0 {
                return Err(BudgetError::NotFound(format!("Budget for {}", cat)).into());
            }
            println!("Budget for {} removed", cat);
        }
        _ => {}
    }
    Ok(())
}

fn set(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let cat = req_arg(sub, "category")?;
    let limit = parse_amount(&req_arg(sub, "limit")?)?;
    upsert(conn, &cat, limit)?;
    println!("Budget set for {} = {}", cat, fmt_money(&limit));
    Ok(())
}

pub fn upsert(conn: &Connection, category: &str, limit: Decimal) -> Result<()> {
    conn.execute(
        "INSERT INTO budgets(category, amount) VALUES (?1,?2)
         ON CONFLICT(category) DO UPDATE SET amount=excluded.amount",
        params![category, limit.to_string()],
    )?;
    Ok(())
}

pub fn load_budgets(conn: &Connection) -> Result<Vec<Budget>> {
    let mut stmt = conn.prepare("SELECT id, category, amount FROM budgets ORDER BY category")?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, category, amount) = row?;
        out.push(Budget {
            id,
            category,
            limit: decimal_column(&amount, "budget")?,
        });
    }
    Ok(out)
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetStatus {
    pub category: String,
    pub limit: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub percent: Decimal,
}

/// Spending against each budget for `month` (`YYYY-MM`).
pub fn budget_status(conn: &Connection, month: &str) -> Result<Vec<BudgetStatus>> {
    let mut stmt = conn.prepare(
        "SELECT amount FROM transactions
         WHERE kind='expense' AND category=?1 AND substr(date,1,7)=?2",
    )?;
    let mut out = Vec::new();
    for b in load_budgets(conn)? {
        let rows = stmt.query_map(params![b.category, month], |r| r.get::<_, String>(0))?;
        let mut spent = Decimal::ZERO;
        for row in rows {
            spent += decimal_column(&row?, "amount")?;
        }
        let percent = if b.limit.is_zero() {
            Decimal::ZERO
        } else {
            (spent / b.limit * Decimal::ONE_HUNDRED).round_dp(0)
        };
        out.push(BudgetStatus {
            category: b.category,
            remaining: b.limit - spent,
            limit: b.limit,
            spent,
            percent,
        });
    }
    Ok(out)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    let month = match opt_arg(sub, "month") {
        Some(m) => parse_month(&m)?,
        None => today().format("%Y-%m").to_string(),
    };
    let data = budget_status(conn, &month)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|s| {
                vec![
                    s.category.clone(),
                    fmt_money(&s.limit),
                    fmt_money(&s.spent),
                    fmt_money(&s.remaining),
                    format!("{}%", s.percent),
                ]
            })
            .collect();
        println!("Budgets for {}", month);
        println!(
            "{}",
            pretty_table(&["Category", "Limit", "Spent", "Remaining", "Used"], rows)
        );
    }
    Ok(())
}
