// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::BudgetError;
use crate::models::CategoryRule;
use crate::utils::{id_arg, maybe_print_json, output_flags, pretty_table, req_arg};
use anyhow::{Result, anyhow};
use regex::Regex;
use rusqlite::{Connection, params};
use tracing::debug;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let keyword = req_arg(sub, "keyword")?;
            let category = req_arg(sub, "category")?;
            keyword_regex(&keyword)?;
            conn.execute(
                "INSERT INTO rules(keyword, category, active) VALUES (?1,?2,1)",
                params![keyword, category],
            )?;
            println!("New rule added successfully: '{}' -> {}", keyword, category);
        }
        Some(("list", sub)) => {
            let (json_flag, jsonl_flag) = output_flags(sub);
            let rules = load_rules(conn)?;
            if !maybe_print_json(json_flag, jsonl_flag, &rules)? {
                let data: Vec<Vec<String>> = rules
                    .into_iter()
                    .map(|r| {
                        vec![
                            r.id.to_string(),
                            r.keyword,
                            r.category,
                            if r.active { "active" } else { "inactive" }.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Keyword", "Category", "Status"], data)
                );
            }
        }
        Some(("toggle", sub)) => {
            let id = id_arg(sub, "id")?;
            let n = conn.execute(
                "UPDATE rules SET active = 1 - active WHERE id=?1",
                params![id],
            )?;
            if n == 0 {
                return Err(BudgetError::NotFound(format!("Rule {}", id)).into());
            }
            println!("Rule updated successfully");
        }
        Some(("rm", sub)) => {
            let id = id_arg(sub, "id")?;
            let n = conn.execute("DELETE FROM rules WHERE id=?1", params![id])?;
            if n == 0 {
                return Err(BudgetError::NotFound(format!("Rule {}", id)).into());
            }
            println!("Rule deleted successfully");
        }
        Some(("apply", _)) => {
            let n = apply_rules(conn)?;
            println!("Categorization complete! {} transactions categorized", n);
        }
        _ => {}
    }
    Ok(())
}

fn keyword_regex(keyword: &str) -> Result<Regex> {
    Regex::new(&format!("(?i){}", regex::escape(keyword)))
        .map_err(|err| anyhow!("Invalid keyword '{}': {}", keyword, err))
}

pub fn load_rules(conn: &Connection) -> Result<Vec<CategoryRule>> {
    let mut stmt = conn.prepare("SELECT id, keyword, category, active FROM rules ORDER BY id")?;
    let rows = stmt.query_map([], |r| {
        Ok(CategoryRule {
            id: r.get(0)?,
            keyword: r.get(1)?,
            category: r.get(2)?,
            active: r.get::<_, i64>(3)? != 0,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Category of the first active rule whose keyword appears in `text`.
pub fn categorize(conn: &Connection, text: &str) -> Result<Option<String>> {
    for rule in load_rules(conn)?.into_iter().filter(|r| r.active) {
        if keyword_regex(&rule.keyword)?.is_match(text) {
            debug!(rule = rule.id, category = %rule.category, "rule matched");
            return Ok(Some(rule.category));
        }
    }
    Ok(None)
}

/// Fills in the category of uncategorized transactions; returns how many changed.
pub fn apply_rules(conn: &Connection) -> Result<usize> {
    let mut stmt = conn.prepare("SELECT id, title FROM transactions WHERE category=''")?;
    let rows = stmt.query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)))?;
    let mut pending = Vec::new();
    for row in rows {
        pending.push(row?);
    }
    let mut changed = 0;
    for (id, title) in pending {
        if let Some(cat) = categorize(conn, &title)? {
            conn.execute(
                "UPDATE transactions SET category=?1 WHERE id=?2",
                params![cat, id],
            )?;
            changed += 1;
        }
    }
    Ok(changed)
}
