// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::BudgetError;
use crate::models::{Frequency, RecurringStatus, RecurringTransaction};
use crate::utils::{
    date_column, decimal_column, fmt_money, id_arg, maybe_print_json, output_flags, parse_amount,
    pretty_table, req_arg, today,
};
use anyhow::Result;
use chrono::Duration;
use rusqlite::{Connection, OptionalExtension, params};

/// Days until a newly added recurring transaction is first due.
const FIRST_DUE_DAYS: i64 = 30;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let title = req_arg(sub, "title")?;
            let category = req_arg(sub, "category")?;
            let amount = parse_amount(&req_arg(sub, "amount")?)?;
            let frequency: Frequency = req_arg(sub, "frequency")?.parse()?;
            let next = today() + Duration::days(FIRST_DUE_DAYS);
            conn.execute(
                "INSERT INTO recurring(title, amount, category, frequency, next_date, status)
                 VALUES (?1,?2,?3,?4,?5,'active')",
                params![
                    title,
                    amount.to_string(),
                    category,
                    frequency.as_str(),
                    next.to_string()
                ],
            )?;
            println!(
                "Recurring transaction added: {} {} ({}), next on {}",
                title,
                fmt_money(&amount),
                frequency.as_str(),
                next
            );
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("toggle", sub)) => {
            let id = id_arg(sub, "id")?;
            let status = toggle(conn, id)?;
            println!("Recurring transaction {} is now {}", id, status.as_str());
        }
        Some(("rm", sub)) => {
            let id = id_arg(sub, "id")?;
            let n = conn.execute("DELETE FROM recurring WHERE id=?1", params![id])?;
            if n == 0 {
                return Err(BudgetError::NotFound(format!("Recurring transaction {}", id)).into());
            }
            println!("Recurring transaction deleted successfully");
        }
        _ => {}
    }
    Ok(())
}

/// Flips active/paused and returns the new status.
pub fn toggle(conn: &Connection, id: i64) -> Result<RecurringStatus> {
    let current: Option<String> = conn
        .query_row(
            "SELECT status FROM recurring WHERE id=?1",
            params![id],
            |r| r.get(0),
        )
        .optional()?;
    let current: RecurringStatus = current
        .ok_or_else(|| BudgetError::NotFound(format!("Recurring transaction {}", id)))?
        .parse()?;
    let next = current.toggled();
    conn.execute(
        "UPDATE recurring SET status=?1 WHERE id=?2",
        params![next.as_str(), id],
    )?;
    Ok(next)
}

pub fn load_recurring(conn: &Connection) -> Result<Vec<RecurringTransaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, amount, category, frequency, next_date, status
         FROM recurring ORDER BY next_date, id",
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
        let (id, title, amount, category, frequency, next_date, status) = row?;
        out.push(RecurringTransaction {
            id,
            title,
            amount: decimal_column(&amount, "amount")?,
            category,
            frequency: frequency.parse()?,
            next_date: date_column(&next_date)?,
            status: status.parse()?,
        });
    }
    Ok(out)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    let data = load_recurring(conn)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.title.clone(),
                    fmt_money(&r.amount),
                    r.category.clone(),
                    r.frequency.as_str().to_string(),
                    r.next_date.to_string(),
                    r.status.as_str().to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Title", "Amount", "Category", "Frequency", "Next", "Status"],
                rows
            )
        );
    }
    Ok(())
}
