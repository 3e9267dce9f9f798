// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use budgetiq::commands::{budgets, goals, recurring};
use budgetiq::error::BudgetError;
use budgetiq::models::RecurringStatus;
use budgetiq::{cli, db, utils};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    for (title, amount, date, category, kind) in [
        ("Groceries", "120.50", "2025-08-03", "Food", "expense"),
        ("Dinner", "79.50", "2025-08-10", "Food", "expense"),
        ("Refund", "30", "2025-08-11", "Food", "income"),
        ("Lunch", "15", "2025-07-30", "Food", "expense"),
    ] {
        conn.execute(
            "INSERT INTO transactions(title, amount, date, category, kind) VALUES (?1,?2,?3,?4,?5)",
            params![title, amount, date, category, kind],
        )
        .unwrap();
    }
    conn
}

fn run(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["budgetiq"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("budget", m)) => budgets::handle(conn, m),
        Some(("goal", m)) => goals::handle(conn, m),
        Some(("recurring", m)) => recurring::handle(conn, m),
        _ => panic!("unexpected subcommand"),
    }
}

#[test]
fn spent_counts_month_expenses_only() {
    let conn = setup();
    run(&conn, &["budget", "set", "--category", "Food", "--limit", "400"]).unwrap();
    let status = budgets::budget_status(&conn, "2025-08").unwrap();
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].spent, Decimal::from(200));
    assert_eq!(status[0].remaining, Decimal::from(200));
    assert_eq!(status[0].percent, Decimal::from(50));
}

#[test]
fn unpadded_month_matches_stored_dates() {
    let conn = setup();
    run(&conn, &["budget", "set", "--category", "Food", "--limit", "400"]).unwrap();
    let month = utils::parse_month("2025-8").unwrap();
    assert_eq!(month, "2025-08");
    let status = budgets::budget_status(&conn, &month).unwrap();
    assert_eq!(status[0].spent, Decimal::from(200));
    run(&conn, &["budget", "list", "--month", "2025-8"]).unwrap();
}

#[test]
fn set_is_an_upsert_and_rejects_bad_limits() {
    let conn = setup();
    run(&conn, &["budget", "set", "--category", "Food", "--limit", "400"]).unwrap();
    run(&conn, &["budget", "set", "--category", "Food", "--limit", "550"]).unwrap();
    let all = budgets::load_budgets(&conn).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].limit, Decimal::from(550));

    let err = run(&conn, &["budget", "set", "--category", "Food", "--limit", "0"]).unwrap_err();
    assert_eq!(
        err.downcast_ref::<BudgetError>(),
        Some(&BudgetError::InvalidAmount)
    );

    run(&conn, &["budget", "rm", "--category", "Food"]).unwrap();
    assert!(run(&conn, &["budget", "rm", "--category", "Food"]).is_err());
}

#[test]
fn goal_deposits_accumulate() {
    let conn = setup();
    run(
        &conn,
        &[
            "goal",
            "add",
            "--title",
            "Laptop",
            "--target",
            "1500",
            "--deadline",
            "2030-06-30",
        ],
    )
    .unwrap();
    let g = &goals::load_goals(&conn).unwrap()[0];
    assert_eq!(g.category, "General");
    assert_eq!(g.current_amount, Decimal::ZERO);

    goals::deposit(&conn, g.id, Decimal::from(750)).unwrap();
    let updated = goals::deposit(&conn, g.id, Decimal::from(1000)).unwrap();
    assert_eq!(updated.current_amount, Decimal::from(1750));
    assert_eq!(updated.progress_percent(), Decimal::ONE_HUNDRED);

    assert!(goals::deposit(&conn, g.id, Decimal::ZERO).is_err());
    let id = g.id.to_string();
    assert!(run(&conn, &["goal", "deposit", "--id", &id, "--amount", "abc"]).is_err());
}

#[test]
fn recurring_toggle_flips_status() {
    let conn = setup();
    run(
        &conn,
        &[
            "recurring",
            "add",
            "--title",
            "Netflix",
            "--amount",
            "14.99",
            "--category",
            "Entertainment",
        ],
    )
    .unwrap();
    let r = &recurring::load_recurring(&conn).unwrap()[0];
    assert_eq!(r.status, RecurringStatus::Active);
    assert_eq!(
        (r.next_date - budgetiq::utils::today()).num_days(),
        30
    );
    assert_eq!(recurring::toggle(&conn, r.id).unwrap(), RecurringStatus::Paused);
    assert_eq!(recurring::toggle(&conn, r.id).unwrap(), RecurringStatus::Active);
    assert!(recurring::toggle(&conn, 999).is_err());
}
