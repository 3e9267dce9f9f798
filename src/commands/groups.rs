// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::BudgetError;
use crate::models::{Expense, ExpenseGroup, Share, SplitType};
use crate::split::{self, MemberBalance, Settlement};
use crate::utils::{
    date_column, decimal_column, fmt_money, maybe_print_json, output_flags, parse_amount,
    parse_decimal, pretty_table, req_arg, today,
};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

/// The local user; always the first member of a group.
pub const ME: &str = "Me";

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("group-add", sub)) => {
            let name = sub
                .get_one::<String>("name")
                .map(|s| s.trim().to_string())
                .unwrap_or_default();
            let others: Vec<String> = sub
                .get_many::<String>("member")
                .map(|v| v.cloned().collect())
                .unwrap_or_default();
            let id = create_group(conn, &name, &others)?;
            println!("Group \"{}\" created successfully (#{})", name, id);
        }
        Some(("groups", sub)) => list_groups(conn, sub)?,
        Some(("expense-add", sub)) => add_expense_cmd(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        Some(("settle", sub)) => settle(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// `Me` followed by the non-blank, de-duplicated `others`.
pub fn group_members(others: &[String]) -> Vec<String> {
    let mut members = vec![ME.to_string()];
    for o in others {
        let o = o.trim();
        if !o.is_empty() && !members.iter().any(|m| m == o) {
            members.push(o.to_string());
        }
    }
    members
}

pub fn create_group(conn: &mut Connection, name: &str, others: &[String]) -> Result<i64> {
    let name = name.trim();
    if name.is_empty() {
        return Err(BudgetError::MissingGroupName.into());
    }
    let members = group_members(others);
    if members.len() < 2 {
        return Err(BudgetError::TooFewMembers.into());
    }
    let tx = conn.transaction()?;
    // Names are matched case-insensitively everywhere, including older databases
    // whose column was created without NOCASE.
    let taken: Option<String> = tx
        .query_row(
            "SELECT name FROM expense_groups WHERE name=?1 COLLATE NOCASE",
            params![name],
            |r| r.get(0),
        )
        .optional()?;
    if let Some(existing) = taken {
        return Err(BudgetError::DuplicateGroup(existing).into());
    }
    tx.execute(
        "INSERT INTO expense_groups(name, created_at) VALUES (?1,?2)",
        params![name, today().to_string()],
    )?;
    let gid = tx.last_insert_rowid();
    for (pos, m) in members.iter().enumerate() {
        tx.execute(
            "INSERT INTO group_members(group_id, position, name) VALUES (?1,?2,?3)",
            params![gid, pos as i64, m],
        )?;
    }
    tx.commit()?;
    info!(group = gid, members = members.len(), "group created");
    Ok(gid)
}

fn load_expenses(conn: &Connection, gid: i64) -> Result<Vec<Expense>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, amount, paid_by, date, split_type
         FROM expenses WHERE group_id=?1 ORDER BY date, id",
    )?;
    let rows = stmt.query_map(params![gid], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
        ))
    })?;
    let mut share_stmt =
        conn.prepare("SELECT member, amount FROM expense_shares WHERE expense_id=?1")?;
    let mut out = Vec::new();
    for row in rows {
        let (id, title, amount, paid_by, date, split_type) = row?;
        let shares = share_stmt.query_map(params![id], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
        })?;
        let mut share_list = Vec::new();
        for s in shares {
            let (member, amt) = s?;
            share_list.push(Share {
                member,
                amount: decimal_column(&amt, "share")?,
            });
        }
        out.push(Expense {
            id,
            title,
            amount: decimal_column(&amount, "amount")?,
            paid_by,
            date: date_column(&date)?,
            split_type: split_type.parse()?,
            shares: share_list,
        });
    }
    Ok(out)
}

fn load_group_row(conn: &Connection, gid: i64, name: String, created: String) -> Result<ExpenseGroup> {
    let mut stmt =
        conn.prepare("SELECT name FROM group_members WHERE group_id=?1 ORDER BY position")?;
    let rows = stmt.query_map(params![gid], |r| r.get::<_, String>(0))?;
    let mut members = Vec::new();
    for r in rows {
        members.push(r?);
    }
    Ok(ExpenseGroup {
        id: gid,
        name,
        members,
        expenses: load_expenses(conn, gid)?,
        created_at: date_column(&created)?,
    })
}

pub fn find_group(conn: &Connection, name: &str) -> Result<ExpenseGroup> {
    let row: Option<(i64, String, String)> = conn
        .query_row(
            "SELECT id, name, created_at FROM expense_groups WHERE name=?1 COLLATE NOCASE",
            params![name.trim()],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()?;
    let (gid, name, created) =
        row.ok_or_else(|| BudgetError::NotFound(format!("Group \"{}\"", name.trim())))?;
    load_group_row(conn, gid, name, created)
}

pub fn load_groups(conn: &Connection) -> Result<Vec<ExpenseGroup>> {
    let mut stmt = conn.prepare("SELECT id, name, created_at FROM expense_groups ORDER BY id")?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
        ))
    })?;
    let mut heads = Vec::new();
    for r in rows {
        heads.push(r?);
    }
    heads
        .into_iter()
        .map(|(gid, name, created)| load_group_row(conn, gid, name, created))
        .collect()
}

fn list_groups(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    let groups = load_groups(conn)?;
    if !maybe_print_json(json_flag, jsonl_flag, &groups)? {
        let rows = groups
            .iter()
            .map(|g| {
                let total: Decimal = g.expenses.iter().map(|e| e.amount).sum();
                let mine = split::calculate_balances(&g.members, &g.expenses)
                    .into_iter()
                    .find(|b| b.member == ME)
                    .map(|b| b.describe())
                    .unwrap_or_default();
                vec![
                    g.name.clone(),
                    g.members.join(", "),
                    g.expenses.len().to_string(),
                    fmt_money(&total),
                    mine,
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Group", "Members", "Expenses", "Total", "You"], rows)
        );
    }
    Ok(())
}

/// Parses `MEMBER=AMOUNT` pairs.
pub fn parse_shares(raw: &[String]) -> Result<Vec<Share>> {
    raw.iter()
        .map(|s| {
            let (member, amount) = s
                .split_once('=')
                .ok_or_else(|| anyhow!("Invalid share '{}', expected MEMBER=AMOUNT", s))?;
            Ok(Share {
                member: member.trim().to_string(),
                amount: parse_decimal(amount)?,
            })
        })
        .collect()
}

pub struct NewExpense {
    pub title: String,
    pub amount: Decimal,
    pub paid_by: String,
    pub split_type: SplitType,
    pub shares: Vec<Share>,
}

/// Validates and stores an expense in `group`.
pub fn add_expense(conn: &mut Connection, group: &ExpenseGroup, e: &NewExpense) -> Result<i64> {
    if e.title.trim().is_empty() {
        return Err(BudgetError::MissingFields.into());
    }
    if e.amount <= Decimal::ZERO {
        return Err(BudgetError::InvalidAmount.into());
    }
    if !group.members.iter().any(|m| m == &e.paid_by) {
        return Err(BudgetError::NotAMember(e.paid_by.clone()).into());
    }
    if e.split_type == SplitType::Custom {
        split::validate_shares(&group.members, e.amount, &e.shares)?;
    }

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO expenses(group_id, title, amount, paid_by, date, split_type)
         VALUES (?1,?2,?3,?4,?5,?6)",
        params![
            group.id,
            e.title.trim(),
            e.amount.to_string(),
            e.paid_by,
            today().to_string(),
            e.split_type.as_str()
        ],
    )?;
    let eid = tx.last_insert_rowid();
    if e.split_type == SplitType::Custom {
        for s in &e.shares {
            tx.execute(
                "INSERT INTO expense_shares(expense_id, member, amount) VALUES (?1,?2,?3)",
                params![eid, s.member, s.amount.to_string()],
            )?;
        }
    }
    tx.commit()?;
    Ok(eid)
}

fn add_expense_cmd(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let group = find_group(conn, &req_arg(sub, "group")?)?;
    let title = req_arg(sub, "title")?;
    let amount = parse_amount(&req_arg(sub, "amount")?)?;
    let raw_shares: Vec<String> = sub
        .get_many::<String>("share")
        .map(|v| v.cloned().collect())
        .unwrap_or_default();
    let e = NewExpense {
        title,
        amount,
        paid_by: req_arg(sub, "paid-by")?,
        split_type: req_arg(sub, "split")?.parse()?,
        shares: parse_shares(&raw_shares)?,
    };
    add_expense(conn, &group, &e)?;
    println!(
        "Expense \"{}\" of {} added to {}",
        e.title,
        fmt_money(&e.amount),
        group.name
    );
    Ok(())
}

#[derive(Serialize)]
struct GroupSummary<'a> {
    group: &'a ExpenseGroup,
    balances: Vec<MemberBalance>,
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    let group = find_group(conn, &req_arg(sub, "group")?)?;
    let balances = split::calculate_balances(&group.members, &group.expenses);
    let summary = GroupSummary {
        group: &group,
        balances,
    };
    if maybe_print_json(json_flag, jsonl_flag, &summary)? {
        return Ok(());
    }
    println!("{} ({})", group.name, group.members.join(", "));
    let rows = group
        .expenses
        .iter()
        .map(|e| {
            vec![
                e.date.to_string(),
                e.title.clone(),
                fmt_money(&e.amount),
                e.paid_by.clone(),
                e.split_type.as_str().to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Date", "Expense", "Amount", "Paid by", "Split"], rows)
    );
    let rows = summary
        .balances
        .iter()
        .map(|b| vec![b.member.clone(), b.describe()])
        .collect();
    println!("{}", pretty_table(&["Member", "Balance"], rows));
    Ok(())
}

pub fn settlements(group: &ExpenseGroup) -> Vec<Settlement> {
    split::settle_up(&split::calculate_balances(&group.members, &group.expenses))
}

fn settle(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    let group = find_group(conn, &req_arg(sub, "group")?)?;
    let data = settlements(&group);
    if maybe_print_json(json_flag, jsonl_flag, &data)? {
        return Ok(());
    }
    if data.is_empty() {
        println!("Everyone in {} is settled up", group.name);
        return Ok(());
    }
    for s in &data {
        println!("{} pays {} ${}", s.from, s.to, fmt_money(&s.amount));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn members_start_with_me_and_drop_blanks() {
        let m = group_members(&["Alex".into(), "  ".into(), "Me".into(), "Sam".into()]);
        assert_eq!(m, vec!["Me", "Alex", "Sam"]);
    }

    #[test]
    fn shares_need_equals_sign() {
        assert!(parse_shares(&["Alex 10".into()]).is_err());
        let s = parse_shares(&["Alex=10.5".into()]).unwrap();
        assert_eq!(s[0].amount, Decimal::new(105, 1));
    }
}
