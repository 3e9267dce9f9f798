// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use budgetiq::backend::{SimulatedBackend, SubmitPort};
use budgetiq::commands::receipts;
use budgetiq::db;
use budgetiq::error::BudgetError;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::io::Write;
use tempfile::TempDir;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn write_file(dir: &TempDir, name: &str, body: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(body).unwrap();
    path
}

#[test]
fn upload_detects_vendor_from_name() {
    let mut conn = setup();
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "Grocery_0407.jpg", b"fake image bytes");
    let backend = SimulatedBackend::instant();

    let id = receipts::upload(&mut conn, &backend, &path).unwrap();
    let r = receipts::get(&conn, id).unwrap();
    assert_eq!(r.vendor.as_deref(), Some("SuperMart Groceries"));
    assert_eq!(r.category, "Food");
    assert_eq!(r.status, "processed");
    assert_eq!(r.items.len(), 3);
    let subtotal = r.subtotal.unwrap();
    let tax = r.tax_amount.unwrap();
    assert!(subtotal >= Decimal::ZERO);
    assert!(tax > Decimal::ZERO);
    assert_eq!(subtotal + tax, r.amount);
}

#[test]
fn detected_subtotal_is_never_negative() {
    let backend = SimulatedBackend::instant();
    for seed in 0u32..6000 {
        let d = backend
            .analyze_receipt("scan.jpg", &seed.to_be_bytes())
            .unwrap();
        assert!(d.subtotal >= Decimal::ZERO, "seed {}", seed);
        assert_eq!(d.subtotal + d.tax_amount, d.amount);
    }
}

#[test]
fn identical_content_is_rejected() {
    let mut conn = setup();
    let dir = TempDir::new().unwrap();
    let first = write_file(&dir, "a.png", b"same");
    let second = write_file(&dir, "Gas.png", b"same");
    let backend = SimulatedBackend::instant();

    let id = receipts::upload(&mut conn, &backend, &first).unwrap();
    let err = receipts::upload(&mut conn, &backend, &second).unwrap_err();
    assert_eq!(
        err.downcast_ref::<BudgetError>(),
        Some(&BudgetError::DuplicateReceipt(id))
    );

    let other = write_file(&dir, "Gas.png", b"different");
    receipts::upload(&mut conn, &backend, &other).unwrap();
    assert_eq!(receipts::load_receipts(&conn).unwrap().len(), 2);
}

#[test]
fn missing_file_is_an_error() {
    let mut conn = setup();
    let dir = TempDir::new().unwrap();
    let backend = SimulatedBackend::instant();
    assert!(receipts::upload(&mut conn, &backend, &dir.path().join("nope.jpg")).is_err());
}
