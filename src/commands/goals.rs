// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::BudgetError;
use crate::models::SavingsGoal;
use crate::utils::{
    date_column, decimal_column, fmt_money, id_arg, maybe_print_json, opt_arg, output_flags,
    parse_amount, parse_date, pretty_table, req_arg, today,
};
use anyhow::Result;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let title = req_arg(sub, "title")?;
            let target = parse_amount(&req_arg(sub, "target")?)?;
            let deadline = parse_date(&req_arg(sub, "deadline")?)?;
            let category = opt_arg(sub, "category").unwrap_or_else(|| "General".to_string());
            conn.execute(
                "INSERT INTO goals(title, target_amount, current_amount, deadline, category, created_at)
                 VALUES (?1,?2,'0',?3,?4,?5)",
                params![
                    title,
                    target.to_string(),
                    deadline.to_string(),
                    category,
                    today().to_string()
                ],
            )?;
            println!("New savings goal created successfully: {}", title);
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("deposit", sub)) => {
            let id = id_arg(sub, "id")?;
            let amount = parse_amount(&req_arg(sub, "amount")?)?;
            let goal = deposit(conn, id, amount)?;
            println!(
                "Deposited {} to {} ({} of {}, {}%)",
                fmt_money(&amount),
                goal.title,
                fmt_money(&goal.current_amount),
                fmt_money(&goal.target_amount),
                goal.progress_percent()
            );
        }
        Some(("rm", sub)) => {
            let id = id_arg(sub, "id")?;
            let n = conn.execute("DELETE FROM goals WHERE id=?1", params![id])?;
            if n == 0 {
                return Err(BudgetError::NotFound(format!("Goal {}", id)).into());
            }
            println!("Goal deleted successfully");
        }
        _ => {}
    }
    Ok(())
}

pub fn load_goals(conn: &Connection) -> Result<Vec<SavingsGoal>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, target_amount, current_amount, deadline, category, created_at
         FROM goals ORDER BY deadline, id",
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
        let (id, title, target, current, deadline, category, created) = row?;
        out.push(SavingsGoal {
            id,
            title,
            target_amount: decimal_column(&target, "target")?,
            current_amount: decimal_column(&current, "current")?,
            deadline: date_column(&deadline)?,
            category,
            created_at: date_column(&created)?,
        });
    }
    Ok(out)
}

/// Adds `amount` to a goal and returns the updated goal.
pub fn deposit(conn: &Connection, id: i64, amount: Decimal) -> Result<SavingsGoal> {
    if amount <= Decimal::ZERO {
        return Err(BudgetError::InvalidAmount.into());
    }
    let mut goal = load_goals(conn)?
        .into_iter()
        .find(|g| g.id == id)
        .ok_or_else(|| BudgetError::NotFound(format!("Goal {}", id)))?;
    goal.current_amount += amount;
    conn.execute(
        "UPDATE goals SET current_amount=?1 WHERE id=?2",
        params![goal.current_amount.to_string(), id],
    )?;
    info!(id, current = %goal.current_amount, "goal deposit");
    Ok(goal)
}

#[derive(Serialize)]
struct GoalView<'a> {
    #[serde(flatten)]
    goal: &'a SavingsGoal,
    progress_percent: Decimal,
    days_remaining: i64,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    let goals = load_goals(conn)?;
    let now = today();
    let views: Vec<GoalView> = goals
        .iter()
        .map(|g| GoalView {
            goal: g,
            progress_percent: g.progress_percent(),
            days_remaining: g.days_remaining(now),
        })
        .collect();
    if !maybe_print_json(json_flag, jsonl_flag, &views)? {
        let rows = views
            .iter()
            .map(|v| {
                vec![
                    v.goal.id.to_string(),
                    v.goal.title.clone(),
                    v.goal.category.clone(),
                    format!(
                        "{} / {}",
                        fmt_money(&v.goal.current_amount),
                        fmt_money(&v.goal.target_amount)
                    ),
                    format!("{}%", v.progress_percent),
                    v.goal.deadline.to_string(),
                    format!("{} days", v.days_remaining),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Goal", "Category", "Saved", "Progress", "Deadline", "Left"],
                rows
            )
        );
    }
    Ok(())
}
