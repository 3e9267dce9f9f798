// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use budgetiq::commands::fx;
use budgetiq::currency::{self, RateTable};
use budgetiq::error::BudgetError;
use budgetiq::{cli, db};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn fx_matches(args: &[&str]) -> clap::ArgMatches {
    let mut argv = vec!["budgetiq", "fx"];
    argv.extend_from_slice(args);
    match cli::build_cli().get_matches_from(argv).subcommand() {
        Some(("fx", m)) => m.clone(),
        _ => panic!("no fx subcommand"),
    }
}

#[test]
fn round_trip_returns_original_amount() {
    let table = RateTable::defaults();
    let tolerance = Decimal::new(1, 9);
    for (from, to) in [("INR", "USD"), ("EUR", "JPY"), ("GBP", "MXN"), ("CHF", "CNY")] {
        let amount = Decimal::new(123_456, 2);
        let there = table.convert(amount, from, to);
        let back = table.convert(there, to, from);
        assert!((back - amount).abs() < tolerance, "{from}->{to}: {back}");
    }
}

#[test]
fn unknown_currency_passes_amount_through() {
    let table = RateTable::defaults();
    let amount = Decimal::from(42);
    assert_eq!(table.convert(amount, "XYZ", "USD"), amount);
}

#[test]
fn seeded_table_has_defaults_and_accepts_overrides() {
    let conn = setup();
    let table = currency::load_table(&conn).unwrap();
    assert_eq!(table.rate("INR"), Some(Decimal::new(8320, 2)));
    assert_eq!(currency::load_currencies(&conn).unwrap().len(), 11);

    let m = fx_matches(&["set-rate", "--currency", "eur", "--rate", "0.95"]);
    fx::handle(&conn, &m).unwrap();
    let table = currency::load_table(&conn).unwrap();
    assert_eq!(table.rate("EUR"), Some(Decimal::new(95, 2)));

    let m = fx_matches(&["set-rate", "--currency", "EUR", "--rate", "0"]);
    assert!(fx::handle(&conn, &m).is_err());
}

#[test]
fn convert_requires_valid_amount() {
    let conn = setup();
    let m = fx_matches(&["convert", "--amount=-5"]);
    let err = fx::handle(&conn, &m).unwrap_err();
    assert_eq!(
        err.downcast_ref::<BudgetError>(),
        Some(&BudgetError::InvalidAmount)
    );
}

#[test]
fn foreign_transactions_store_usd_value() {
    let conn = setup();
    let m = fx_matches(&[
        "add",
        "--description",
        "Hotel",
        "--amount",
        "91",
        "--currency",
        "EUR",
        "--category",
        "Travel",
        "--date",
        "2024-03-15",
    ]);
    fx::handle(&conn, &m).unwrap();
    let rows = fx::load_foreign(&conn).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].amount_in_usd, Decimal::from(100));

    let m = fx_matches(&[
        "add",
        "--description",
        "Mystery",
        "--amount",
        "1",
        "--currency",
        "XYZ",
        "--category",
        "Other",
    ]);
    let err = fx::handle(&conn, &m).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BudgetError>(),
        Some(BudgetError::UnknownCurrency(_))
    ));

    let table = currency::load_table(&conn).unwrap();
    let b = fx::balances(&table, &rows, "USD");
    assert_eq!(b[0].balance, Decimal::from(-91));
    assert_eq!(b[0].in_base, Decimal::from(-100));
}

#[test]
fn quick_conversions_are_seeded_and_default_to_one() {
    let conn = setup();
    let seeded = fx::load_quick(&conn).unwrap();
    let pairs: Vec<(&str, &str, Decimal)> = seeded
        .iter()
        .map(|q| {
            (
                q.conversion.from.as_str(),
                q.conversion.to.as_str(),
                q.conversion.amount,
            )
        })
        .collect();
    let hundred = Decimal::from(100);
    assert_eq!(
        pairs,
        vec![("USD", "EUR", hundred), ("USD", "GBP", hundred), ("USD", "JPY", hundred)]
    );
    assert_eq!(seeded[0].conversion.result, Decimal::from(91));
    assert_eq!(seeded[2].conversion.result, Decimal::from(14632));

    let m = fx_matches(&["quick", "add", "--from", "gbp", "--to", "inr"]);
    fx::handle(&conn, &m).unwrap();
    let all = fx::load_quick(&conn).unwrap();
    assert_eq!(all.len(), 4);
    let added = &all[3].conversion;
    assert_eq!((added.from.as_str(), added.to.as_str()), ("GBP", "INR"));
    assert_eq!(added.amount, Decimal::ONE);

    fx::handle(&conn, &fx_matches(&["quick", "list", "--json"])).unwrap();
}

#[test]
fn quick_conversion_rejects_unknown_currency_and_bad_amount() {
    let conn = setup();
    let m = fx_matches(&["quick", "add", "--from", "USD", "--to", "XYZ"]);
    let err = fx::handle(&conn, &m).unwrap_err();
    assert_eq!(
        err.downcast_ref::<BudgetError>(),
        Some(&BudgetError::UnknownCurrency("XYZ".into()))
    );

    let m = fx_matches(&["quick", "add", "--from", "USD", "--to", "EUR", "--amount", "0"]);
    let err = fx::handle(&conn, &m).unwrap_err();
    assert_eq!(
        err.downcast_ref::<BudgetError>(),
        Some(&BudgetError::InvalidAmount)
    );
    assert_eq!(fx::load_quick(&conn).unwrap().len(), 3);
}
