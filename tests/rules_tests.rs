// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use budgetiq::commands::{rules, transactions};
use budgetiq::error::BudgetError;
use budgetiq::{cli, db};
use rusqlite::{Connection, params};

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    for (keyword, category, active) in [
        ("uber", "Transportation", 1),
        ("netflix", "Entertainment", 0),
        ("Grocery", "Food", 1),
    ] {
        conn.execute(
            "INSERT INTO rules(keyword, category, active) VALUES (?1,?2,?3)",
            params![keyword, category, active],
        )
        .unwrap();
    }
    conn
}

fn insert_uncategorized(conn: &Connection, title: &str) {
    conn.execute(
        "INSERT INTO transactions(title, amount, date, kind) VALUES (?1,'10','2024-03-01','expense')",
        params![title],
    )
    .unwrap();
}

#[test]
fn first_active_rule_wins_case_insensitively() {
    let conn = setup();
    assert_eq!(
        rules::categorize(&conn, "UBER *TRIP").unwrap(),
        Some("Transportation".to_string())
    );
    assert_eq!(rules::categorize(&conn, "Netflix.com").unwrap(), None);
    assert_eq!(
        rules::categorize(&conn, "corner grocery").unwrap(),
        Some("Food".to_string())
    );
}

#[test]
fn apply_fills_uncategorized_only() {
    let conn = setup();
    insert_uncategorized(&conn, "Uber Ride");
    insert_uncategorized(&conn, "Netflix");
    insert_uncategorized(&conn, "Bookshop");
    conn.execute(
        "INSERT INTO transactions(title, amount, date, category, kind) VALUES ('Uber Eats','20','2024-03-02','Dining','expense')",
        [],
    )
    .unwrap();

    assert_eq!(rules::apply_rules(&conn).unwrap(), 1);
    let cats: Vec<(String, String)> = transactions::load_all(&conn)
        .unwrap()
        .into_iter()
        .map(|t| (t.title, t.category))
        .collect();
    assert!(cats.contains(&("Uber Ride".into(), "Transportation".into())));
    assert!(cats.contains(&("Uber Eats".into(), "Dining".into())));
    assert!(cats.contains(&("Bookshop".into(), String::new())));
}

fn run_rules(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["budgetiq", "rules"];
    argv.extend_from_slice(args);
    match cli::build_cli().get_matches_from(argv).subcommand() {
        Some(("rules", m)) => rules::handle(conn, m),
        _ => panic!("no rules subcommand"),
    }
}

#[test]
fn rm_unknown_rule_is_not_found() {
    let conn = setup();
    run_rules(&conn, &["rm", "--id", "1"]).unwrap();
    assert_eq!(rules::load_rules(&conn).unwrap().len(), 2);

    let err = run_rules(&conn, &["rm", "--id", "1"]).unwrap_err();
    assert_eq!(
        err.downcast_ref::<BudgetError>(),
        Some(&BudgetError::NotFound("Rule 1".into()))
    );
    run_rules(&conn, &["list", "--json"]).unwrap();
}

#[test]
fn toggle_activates_rule_and_tx_add_uses_it() {
    let conn = setup();
    let matches = cli::build_cli().get_matches_from(["budgetiq", "rules", "toggle", "--id", "2"]);
    if let Some(("rules", m)) = matches.subcommand() {
        rules::handle(&conn, m).unwrap();
    } else {
        panic!("no rules subcommand");
    }
    let matches = cli::build_cli().get_matches_from([
        "budgetiq", "tx", "add", "--title", "Netflix", "--amount", "14.99",
    ]);
    if let Some(("tx", m)) = matches.subcommand() {
        transactions::handle(&conn, m).unwrap();
    } else {
        panic!("no tx subcommand");
    }
    let t = &transactions::load_all(&conn).unwrap()[0];
    assert_eq!(t.category, "Entertainment");
}
