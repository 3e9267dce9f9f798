// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::rules::categorize;
use crate::error::BudgetError;
use crate::models::{Transaction, TxKind};
use crate::search::{
    self, ALL_CATEGORIES, AmountRange, SortDirection, SortField, TransactionFilter,
};
use crate::utils::{
    date_column, decimal_column, fmt_money, id_arg, maybe_print_json, opt_arg, output_flags,
    parse_amount, parse_date, pretty_table, req_arg, today,
};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::info;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("search", sub)) => search_cmd(conn, sub)?,
        Some(("history", sub)) => history(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => remove(conn, sub)?,
        Some(("export", sub)) => export(conn, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub title: String,
    pub amount: Decimal,
    pub date: chrono::NaiveDate,
    pub category: String,
    pub kind: TxKind,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

pub fn insert(conn: &Connection, t: &NewTransaction) -> Result<i64> {
    conn.execute(
        "INSERT INTO transactions(title, amount, date, category, kind, payment_method, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            t.title,
            t.amount.to_string(),
            t.date.to_string(),
            t.category,
            t.kind.as_str(),
            t.payment_method,
            t.notes
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let title = req_arg(sub, "title")?;
    let amount = parse_amount(&req_arg(sub, "amount")?)?;
    let kind: TxKind = req_arg(sub, "type")?.parse()?;
    let date = match opt_arg(sub, "date") {
        Some(d) => parse_date(&d)?,
        None => today(),
    };
    let category = match opt_arg(sub, "category") {
        Some(c) => c,
        None => categorize(conn, &title)?.unwrap_or_default(),
    };
    let new = NewTransaction {
        title,
        amount,
        date,
        category,
        kind,
        payment_method: opt_arg(sub, "payment-method"),
        notes: opt_arg(sub, "notes"),
    };
    let id = insert(conn, &new)?;
    info!(id, kind = %new.kind, "transaction recorded");
    let label = match new.kind {
        TxKind::Expense => "Expense",
        TxKind::Income => "Income",
    };
    let category = if new.category.is_empty() {
        "uncategorized"
    } else {
        new.category.as_str()
    };
    println!(
        "{} added successfully: {} {} on {} ({})",
        label,
        new.title,
        fmt_money(&new.amount),
        new.date,
        category
    );
    Ok(())
}

fn row_to_tx(r: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, [String; 5], [Option<String>; 2])> {
    Ok((
        r.get(0)?,
        [r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?],
        [r.get(6)?, r.get(7)?],
    ))
}

pub fn load_all(conn: &Connection) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, amount, date, category, kind, payment_method, notes
         FROM transactions ORDER BY date DESC, id DESC",
    )?;
    let rows = stmt.query_map([], row_to_tx)?;
    let mut out = Vec::new();
    for row in rows {
        let (id, [title, amount, date, category, kind], [payment_method, notes]) = row?;
        out.push(Transaction {
            id,
            title,
            amount: decimal_column(&amount, "amount")?,
            date: date_column(&date)?,
            category,
            kind: kind.parse()?,
            payment_method,
            notes,
        });
    }
    Ok(out)
}

pub fn get(conn: &Connection, id: i64) -> Result<Transaction> {
    load_all(conn)?
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| BudgetError::NotFound(format!("Transaction {}", id)).into())
}

fn print_transactions(sub: &clap::ArgMatches, data: &[Transaction]) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|t| {
                vec![
                    t.id.to_string(),
                    t.date.to_string(),
                    t.title.clone(),
                    t.category.clone(),
                    t.kind.to_string(),
                    fmt_money(&t.amount),
                    t.notes.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Title", "Category", "Type", "Amount", "Notes"],
                rows
            )
        );
    }
    Ok(())
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<Transaction>> {
    let mut data = load_all(conn)?;
    if let Some(limit) = sub.get_one::<usize>("limit") {
        data.truncate(*limit);
    }
    Ok(data)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn, sub)?;
    print_transactions(sub, &data)
}

fn parse_kind_filter(raw: Option<String>) -> Result<Option<TxKind>> {
    match raw.as_deref() {
        None | Some("all") => Ok(None),
        Some(k) => Ok(Some(k.parse()?)),
    }
}

/// Filtered, sorted and (optionally) paged result of `tx search`.
pub fn search_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<Transaction>> {
    let filter = TransactionFilter {
        query: opt_arg(sub, "query").unwrap_or_default(),
        category: opt_arg(sub, "category"),
        from: opt_arg(sub, "from").map(|d| parse_date(&d)).transpose()?,
        to: opt_arg(sub, "to").map(|d| parse_date(&d)).transpose()?,
        amount_range: opt_arg(sub, "amount-range")
            .map(|r| r.parse::<AmountRange>())
            .transpose()?
            .unwrap_or_default(),
        kind: parse_kind_filter(opt_arg(sub, "type"))?,
        match_category_text: false,
    };
    let field: SortField = opt_arg(sub, "sort")
        .map(|s| s.parse())
        .transpose()?
        .unwrap_or_default();
    let dir: SortDirection = opt_arg(sub, "dir")
        .map(|s| s.parse())
        .transpose()?
        .unwrap_or_default();

    let all = load_all(conn)?;
    let sorted = search::filter_and_sort(&all, &filter, field, dir);
    tracing::debug!(total = all.len(), matched = sorted.len(), "search applied");
    match sub.get_one::<usize>("page") {
        Some(page) => {
            let per_page = sub.get_one::<usize>("per-page").copied().unwrap_or(10);
            Ok(search::paginate(&sorted, *page, per_page))
        }
        None => Ok(sorted),
    }
}

fn search_cmd(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = search_rows(conn, sub)?;
    print_transactions(sub, &data)
}

pub fn history_rows(
    conn: &Connection,
    sub: &clap::ArgMatches,
    today: chrono::NaiveDate,
) -> Result<Vec<Transaction>> {
    let period = opt_arg(sub, "period").unwrap_or_else(|| "all".into());
    let filter = TransactionFilter {
        query: opt_arg(sub, "query").unwrap_or_default(),
        category: opt_arg(sub, "category").or_else(|| Some(ALL_CATEGORIES.to_string())),
        from: search::period_start(&period, today)?,
        to: None,
        amount_range: AmountRange::Any,
        kind: parse_kind_filter(opt_arg(sub, "type"))?,
        match_category_text: true,
    };
    let all = load_all(conn)?;
    Ok(search::filter_and_sort(
        &all,
        &filter,
        SortField::Date,
        SortDirection::Desc,
    ))
}

fn history(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = history_rows(conn, sub, today())?;
    print_transactions(sub, &data)
}

fn edit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = id_arg(sub, "id")?;
    let mut t = get(conn, id)?;
    if let Some(title) = opt_arg(sub, "title") {
        t.title = title;
    }
    if let Some(a) = opt_arg(sub, "amount") {
        t.amount = parse_amount(&a)?;
    }
    if let Some(c) = opt_arg(sub, "category") {
        t.category = c;
    }
    if let Some(k) = opt_arg(sub, "type") {
        t.kind = k.parse()?;
    }
    if let Some(d) = opt_arg(sub, "date") {
        t.date = parse_date(&d)?;
    }
    if let Some(n) = opt_arg(sub, "notes") {
        t.notes = Some(n);
    }
    conn.execute(
        "UPDATE transactions SET title=?1, amount=?2, date=?3, category=?4, kind=?5, notes=?6 WHERE id=?7",
        params![
            t.title,
            t.amount.to_string(),
            t.date.to_string(),
            t.category,
            t.kind.as_str(),
            t.notes,
            id
        ],
    )?;
    println!("Transaction {} updated", id);
    Ok(())
}

fn remove(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = id_arg(sub, "id")?;
    let n = conn.execute("DELETE FROM transactions WHERE id=?1", params![id])?;
    if n == 0 {
        return Err(BudgetError::NotFound(format!("Transaction {}", id)).into());
    }
    println!("Transaction {} deleted", id);
    Ok(())
}

fn export(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = req_arg(sub, "format")?.to_lowercase();
    let out = req_arg(sub, "out")?;
    let mut data = load_all(conn)?;
    data.reverse();

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(&out)?;
            wtr.write_record([
                "date", "title", "amount", "category", "type", "payment_method", "notes",
            ])?;
            for t in &data {
                wtr.write_record([
                    t.date.to_string(),
                    t.title.clone(),
                    t.amount.to_string(),
                    t.category.clone(),
                    t.kind.to_string(),
                    t.payment_method.clone().unwrap_or_default(),
                    t.notes.clone().unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let items: Vec<_> = data
                .iter()
                .map(|t| {
                    json!({
                        "date": t.date.to_string(), "title": t.title, "amount": t.amount.to_string(),
                        "category": t.category, "type": t.kind, "payment_method": t.payment_method,
                        "notes": t.notes
                    })
                })
                .collect();
            std::fs::write(&out, serde_json::to_string_pretty(&items)?)?;
        }
        other => return Err(anyhow!("Unknown format: {} (use csv|json)", other)),
    }
    println!("Transactions exported successfully to {}", out);
    Ok(())
}
