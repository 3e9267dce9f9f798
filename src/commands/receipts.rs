// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::backend::SubmitPort;
use crate::error::BudgetError;
use crate::models::{Receipt, ReceiptItem};
use crate::utils::{
    date_column, decimal_column, fmt_money, id_arg, maybe_print_json, output_flags, pretty_table,
    req_arg,
};
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use tracing::info;

pub fn handle(conn: &mut Connection, port: &dyn SubmitPort, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("upload", sub)) => {
            let path = req_arg(sub, "path")?;
            let id = upload(conn, port, Path::new(&path))?;
            let r = get(conn, id)?;
            println!(
                "Receipt processed successfully: {} {} ({})",
                r.vendor.unwrap_or_default(),
                fmt_money(&r.amount),
                r.category
            );
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        Some(("rm", sub)) => {
            let id = id_arg(sub, "id")?;
            let n = conn.execute("DELETE FROM receipts WHERE id=?1", params![id])?;
            if n == 0 {
                return Err(BudgetError::NotFound(format!("Receipt {}", id)).into());
            }
            println!("Receipt deleted successfully");
        }
        _ => {}
    }
    Ok(())
}

/// Analyzes the file at `path` and stores it; identical content is rejected.
pub fn upload(conn: &mut Connection, port: &dyn SubmitPort, path: &Path) -> Result<i64> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let detected = port.analyze_receipt(&file_name, &bytes)?;

    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM receipts WHERE fingerprint=?1",
            params![detected.fingerprint],
            |r| r.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Err(BudgetError::DuplicateReceipt(id).into());
    }

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO receipts(name, date, amount, status, category, vendor, subtotal, tax_amount, fingerprint)
         VALUES (?1,?2,?3,'processed',?4,?5,?6,?7,?8)",
        params![
            file_name,
            detected.date.to_string(),
            detected.amount.to_string(),
            detected.category,
            detected.vendor,
            detected.subtotal.to_string(),
            detected.tax_amount.to_string(),
            detected.fingerprint
        ],
    )?;
    let id = tx.last_insert_rowid();
    for item in &detected.items {
        tx.execute(
            "INSERT INTO receipt_items(receipt_id, name, price, quantity) VALUES (?1,?2,?3,?4)",
            params![id, item.name, item.price.to_string(), item.quantity],
        )?;
    }
    tx.commit()?;
    info!(id, file = %file_name, "receipt stored");
    Ok(id)
}

fn opt_decimal(v: Option<String>, what: &str) -> Result<Option<rust_decimal::Decimal>> {
    v.map(|s| decimal_column(&s, what)).transpose()
}

pub fn load_receipts(conn: &Connection) -> Result<Vec<Receipt>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, date, amount, status, category, vendor, subtotal, tax_amount
         FROM receipts ORDER BY date DESC, id DESC",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            (
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, String>(4)?,
                r.get::<_, String>(5)?,
            ),
            (
                r.get::<_, Option<String>>(6)?,
                r.get::<_, Option<String>>(7)?,
                r.get::<_, Option<String>>(8)?,
            ),
        ))
    })?;
    let mut item_stmt = conn.prepare(
        "SELECT name, price, quantity FROM receipt_items WHERE receipt_id=?1 ORDER BY rowid",
    )?;
    let mut out = Vec::new();
    for row in rows {
        let ((id, name, date, amount, status, category), (vendor, subtotal, tax)) = row?;
        let items = item_stmt.query_map(params![id], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, u32>(2)?,
            ))
        })?;
        let mut item_list = Vec::new();
        for it in items {
            let (iname, price, quantity) = it?;
            item_list.push(ReceiptItem {
                name: iname,
                price: decimal_column(&price, "price")?,
                quantity,
            });
        }
        out.push(Receipt {
            id,
            name,
            date: date_column(&date)?,
            amount: decimal_column(&amount, "amount")?,
            status,
            category,
            vendor,
            items: item_list,
            subtotal: opt_decimal(subtotal, "subtotal")?,
            tax_amount: opt_decimal(tax, "tax")?,
        });
    }
    Ok(out)
}

pub fn get(conn: &Connection, id: i64) -> Result<Receipt> {
    load_receipts(conn)?
        .into_iter()
        .find(|r| r.id == id)
        .ok_or_else(|| BudgetError::NotFound(format!("Receipt {}", id)).into())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    let data = load_receipts(conn)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.to_string(),
                    r.name.clone(),
                    r.vendor.clone().unwrap_or_default(),
                    r.category.clone(),
                    fmt_money(&r.amount),
                    r.status.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Name", "Vendor", "Category", "Amount", "Status"],
                rows
            )
        );
    }
    Ok(())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    let r = get(conn, id_arg(sub, "id")?)?;
    if maybe_print_json(json_flag, jsonl_flag, &r)? {
        return Ok(());
    }
    println!(
        "{} | {} | {} | {}",
        r.name,
        r.date,
        r.vendor.as_deref().unwrap_or("-"),
        r.status
    );
    let rows = r
        .items
        .iter()
        .map(|i| vec![i.name.clone(), i.quantity.to_string(), fmt_money(&i.price)])
        .collect();
    println!("{}", pretty_table(&["Item", "Qty", "Price"], rows));
    if let Some(sub) = r.subtotal {
        println!("Subtotal: {}", fmt_money(&sub));
    }
    if let Some(tax) = r.tax_amount {
        println!("Tax: {}", fmt_money(&tax));
    }
    println!("Total: {}", fmt_money(&r.amount));
    Ok(())
}
