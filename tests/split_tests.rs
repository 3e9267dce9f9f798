// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use budgetiq::commands::groups::{self, NewExpense};
use budgetiq::error::BudgetError;
use budgetiq::models::{Expense, Share, SplitType};
use budgetiq::split::{calculate_balances, settle_up, share_discrepancy, SETTLE_EPSILON};
use budgetiq::{cli, db};
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn names(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

fn expense(amount: Decimal, paid_by: &str, split_type: SplitType, shares: Vec<Share>) -> Expense {
    Expense {
        id: 0,
        title: "e".into(),
        amount,
        paid_by: paid_by.into(),
        date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        split_type,
        shares,
    }
}

#[test]
fn two_member_equal_split() {
    let members = names(&["Me", "Alex"]);
    let e = expense(Decimal::from(100), "Me", SplitType::Equal, vec![]);
    let b = calculate_balances(&members, &[e]);
    assert_eq!(b[0].member, "Me");
    assert_eq!(b[0].balance, Decimal::from(50));
    assert_eq!(b[1].member, "Alex");
    assert_eq!(b[1].balance, Decimal::from(-50));
    assert_eq!(b[1].describe(), "owes $50.00");
}

#[test]
fn equal_split_sums_to_zero() {
    let members = names(&["Me", "Alex", "Jordan"]);
    for cents in [1, 100, 9_999, 123_457] {
        let e = expense(Decimal::new(cents, 2), "Jordan", SplitType::Equal, vec![]);
        let sum: Decimal = calculate_balances(&members, &[e])
            .iter()
            .map(|b| b.balance)
            .sum();
        assert!(sum.abs() < Decimal::new(1, 20), "sum {sum}");
    }
}

#[test]
fn custom_split_sum_equals_discrepancy() {
    let members = names(&["Me", "Alex"]);
    let shares = vec![
        Share {
            member: "Me".into(),
            amount: Decimal::from(30),
        },
        Share {
            member: "Alex".into(),
            amount: Decimal::from(50),
        },
    ];
    let e = expense(Decimal::from(100), "Me", SplitType::Custom, shares);
    let sum: Decimal = calculate_balances(&members, std::slice::from_ref(&e))
        .iter()
        .map(|b| b.balance)
        .sum();
    assert_eq!(sum, share_discrepancy(&e));
    assert_eq!(sum, Decimal::from(20));
}

#[test]
fn settlements_clear_every_balance() {
    let members = names(&["Me", "Alex", "Jordan", "Taylor"]);
    let expenses = vec![
        expense(Decimal::from(800), "Me", SplitType::Equal, vec![]),
        expense(Decimal::from(120), "Alex", SplitType::Equal, vec![]),
        expense(Decimal::from(200), "Jordan", SplitType::Equal, vec![]),
    ];
    let mut balances = calculate_balances(&members, &expenses);
    for s in settle_up(&balances) {
        for b in balances.iter_mut() {
            if b.member == s.from {
                b.balance += s.amount;
            } else if b.member == s.to {
                b.balance -= s.amount;
            }
        }
    }
    assert!(balances.iter().all(|b| b.balance.abs() < SETTLE_EPSILON));
}

#[test]
fn group_creation_rules() {
    let mut conn = setup();
    let err = groups::create_group(&mut conn, "  ", &names(&["Alex"])).unwrap_err();
    assert_eq!(
        err.downcast_ref::<BudgetError>(),
        Some(&BudgetError::MissingGroupName)
    );
    let err = groups::create_group(&mut conn, "Solo", &names(&["", " "])).unwrap_err();
    assert_eq!(
        err.downcast_ref::<BudgetError>(),
        Some(&BudgetError::TooFewMembers)
    );
    groups::create_group(&mut conn, "Trip", &names(&["Alex", "Sam"])).unwrap();
    let g = groups::find_group(&conn, "trip").unwrap();
    assert_eq!(g.members, vec!["Me", "Alex", "Sam"]);
}

#[test]
fn group_names_differing_only_in_case_collide() {
    let mut conn = setup();
    let first = groups::create_group(&mut conn, "Trip", &names(&["Alex"])).unwrap();
    let err = groups::create_group(&mut conn, "trip", &names(&["Sam"])).unwrap_err();
    assert_eq!(
        err.downcast_ref::<BudgetError>(),
        Some(&BudgetError::DuplicateGroup("Trip".into()))
    );
    assert_eq!(groups::load_groups(&conn).unwrap().len(), 1);

    // The column itself compares without case, so a raw insert is refused too.
    assert!(conn
        .execute(
            "INSERT INTO expense_groups(name, created_at) VALUES ('TRIP', '2024-01-01')",
            [],
        )
        .is_err());

    let g = groups::find_group(&conn, "TRIP").unwrap();
    assert_eq!(g.id, first);
    assert_eq!(g.members, vec!["Me", "Alex"]);
}

#[test]
fn custom_expense_must_add_up() {
    let mut conn = setup();
    groups::create_group(&mut conn, "Flat", &names(&["Sam"])).unwrap();
    let g = groups::find_group(&conn, "Flat").unwrap();

    let bad = NewExpense {
        title: "Internet".into(),
        amount: Decimal::from(80),
        paid_by: "Sam".into(),
        split_type: SplitType::Custom,
        shares: groups::parse_shares(&names(&["Me=30", "Sam=30"])).unwrap(),
    };
    let err = groups::add_expense(&mut conn, &g, &bad).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BudgetError>(),
        Some(BudgetError::ShareMismatch { .. })
    ));

    let stranger = NewExpense {
        paid_by: "Alex".into(),
        split_type: SplitType::Equal,
        shares: vec![],
        ..bad
    };
    let err = groups::add_expense(&mut conn, &g, &stranger).unwrap_err();
    assert_eq!(
        err.downcast_ref::<BudgetError>(),
        Some(&BudgetError::NotAMember("Alex".into()))
    );
}

#[test]
fn expenses_flow_through_cli() {
    let mut conn = setup();
    groups::create_group(&mut conn, "Beach", &names(&["Alex"])).unwrap();
    let matches = cli::build_cli().get_matches_from([
        "budgetiq",
        "split",
        "expense-add",
        "--group",
        "Beach",
        "--title",
        "Dinner",
        "--amount",
        "60",
        "--paid-by",
        "Alex",
        "--split",
        "custom",
        "--share",
        "Me=40",
        "--share",
        "Alex=20",
    ]);
    if let Some(("split", m)) = matches.subcommand() {
        groups::handle(&mut conn, m).unwrap();
    } else {
        panic!("no split subcommand");
    }
    let g = groups::find_group(&conn, "Beach").unwrap();
    assert_eq!(g.expenses.len(), 1);
    assert_eq!(g.expenses[0].shares.len(), 2);
    let s = groups::settlements(&g);
    assert_eq!(s.len(), 1);
    assert_eq!((s[0].from.as_str(), s[0].to.as_str()), ("Me", "Alex"));
    assert_eq!(s[0].amount, Decimal::from(40));
}
