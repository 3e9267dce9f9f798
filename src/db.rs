// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::AppConfig;
use crate::currency;
use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub fn db_path(cfg: &AppConfig) -> Result<PathBuf> {
    if let Some(p) = &cfg.db_path {
        return Ok(p.clone());
    }
    let proj = AppConfig::project_dirs()?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("budgetiq.sqlite"))
}

pub fn open_or_init(cfg: &AppConfig) -> Result<Connection> {
    let path = db_path(cfg)?;
    open_at(&path)
}

pub fn open_at(path: &Path) -> Result<Connection> {
    let conn =
        Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    debug!(path = %path.display(), "database ready");
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        amount TEXT NOT NULL,
        date TEXT NOT NULL,
        category TEXT NOT NULL DEFAULT '',
        kind TEXT NOT NULL CHECK(kind IN ('income','expense')),
        payment_method TEXT,
        notes TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);

    CREATE TABLE IF NOT EXISTS budgets(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        category TEXT NOT NULL UNIQUE,
        amount TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS recurring(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        amount TEXT NOT NULL,
        category TEXT NOT NULL,
        frequency TEXT NOT NULL CHECK(frequency IN ('daily','weekly','monthly','yearly')),
        next_date TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'active' CHECK(status IN ('active','paused'))
    );

    CREATE TABLE IF NOT EXISTS goals(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        target_amount TEXT NOT NULL,
        current_amount TEXT NOT NULL DEFAULT '0',
        deadline TEXT NOT NULL,
        category TEXT NOT NULL DEFAULT 'General',
        created_at TEXT NOT NULL
    );

    -- units of `code` per one USD
    CREATE TABLE IF NOT EXISTS currencies(
        code TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        symbol TEXT NOT NULL,
        rate TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS foreign_transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        description TEXT NOT NULL,
        amount TEXT NOT NULL,
        currency TEXT NOT NULL,
        date TEXT NOT NULL,
        category TEXT NOT NULL,
        amount_in_usd TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS quick_conversions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        from_ccy TEXT NOT NULL,
        to_ccy TEXT NOT NULL,
        amount TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS expense_groups(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE COLLATE NOCASE,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS group_members(
        group_id INTEGER NOT NULL,
        position INTEGER NOT NULL,
        name TEXT NOT NULL,
        UNIQUE(group_id, name),
        FOREIGN KEY(group_id) REFERENCES expense_groups(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS expenses(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        group_id INTEGER NOT NULL,
        title TEXT NOT NULL,
        amount TEXT NOT NULL,
        paid_by TEXT NOT NULL,
        date TEXT NOT NULL,
        split_type TEXT NOT NULL CHECK(split_type IN ('equal','custom')),
        FOREIGN KEY(group_id) REFERENCES expense_groups(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS expense_shares(
        expense_id INTEGER NOT NULL,
        member TEXT NOT NULL,
        amount TEXT NOT NULL,
        FOREIGN KEY(expense_id) REFERENCES expenses(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS receipts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        date TEXT NOT NULL,
        amount TEXT NOT NULL,
        status TEXT NOT NULL,
        category TEXT NOT NULL,
        vendor TEXT,
        subtotal TEXT,
        tax_amount TEXT,
        fingerprint TEXT UNIQUE
    );

    CREATE TABLE IF NOT EXISTS receipt_items(
        receipt_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        price TEXT NOT NULL,
        quantity INTEGER NOT NULL DEFAULT 1,
        FOREIGN KEY(receipt_id) REFERENCES receipts(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS rules(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        keyword TEXT NOT NULL,
        category TEXT NOT NULL,
        active INTEGER NOT NULL DEFAULT 1
    );
    "#,
    )?;
    currency::seed_defaults(conn)?;
    let quick: i64 = conn.query_row("SELECT COUNT(*) FROM quick_conversions", [], |r| r.get(0))?;
    if quick == 0 {
        for to in ["EUR", "GBP", "JPY"] {
            conn.execute(
                "INSERT INTO quick_conversions(from_ccy, to_ccy, amount) VALUES ('USD', ?1, '100')",
                params![to],
            )?;
        }
    }
    Ok(())
}

/// Loads the demo dataset. Existing rows are kept.
pub fn seed_sample(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;

    let transactions: [(&str, &str, &str, &str, &str, Option<&str>); 12] = [
        ("Grocery Store", "75.50", "2024-04-05", "Food", "expense", Some("Weekly grocery shopping")),
        ("Salary Deposit", "2000", "2024-04-01", "Income", "income", None),
        ("Amazon Purchase", "120.99", "2024-03-29", "Shopping", "expense", Some("New headphones")),
        ("Uber Ride", "24.50", "2024-03-28", "Transport", "expense", None),
        ("Apartment Rent", "1200", "2024-03-27", "Housing", "expense", None),
        ("Movie Tickets", "35.50", "2024-03-25", "Entertainment", "expense", Some("Weekend movie with friends")),
        ("Freelance Payment", "500", "2024-03-23", "Income", "income", Some("Website design project")),
        ("Electricity Bill", "85.26", "2024-03-20", "Utilities", "expense", None),
        ("Doctor Visit", "150", "2024-03-18", "Health", "expense", None),
        ("Online Course", "199.99", "2024-03-15", "Education", "expense", Some("Python programming course")),
        ("Coffee Shop", "4.75", "2024-03-12", "Food", "expense", None),
        ("Gym Membership", "49.99", "2024-03-10", "Health", "expense", None),
    ];
    for (title, amount, date, category, kind, notes) in transactions {
        tx.execute(
            "INSERT INTO transactions(title, amount, date, category, kind, notes) VALUES (?1,?2,?3,?4,?5,?6)",
            params![title, amount, date, category, kind, notes],
        )?;
    }

    for (category, limit) in [
        ("Housing", "1500"),
        ("Food", "550"),
        ("Transport", "400"),
        ("Entertainment", "300"),
        ("Shopping", "400"),
        ("Health", "300"),
    ] {
        tx.execute(
            "INSERT OR IGNORE INTO budgets(category, amount) VALUES (?1,?2)",
            params![category, limit],
        )?;
    }

    for (title, amount, category, next_date) in [
        ("Netflix Subscription", "14.99", "Entertainment", "2024-05-15"),
        ("Rent Payment", "1200", "Housing", "2024-05-01"),
        ("Gym Membership", "49.99", "Fitness", "2024-05-10"),
    ] {
        tx.execute(
            "INSERT INTO recurring(title, amount, category, frequency, next_date, status) VALUES (?1,?2,?3,'monthly',?4,'active')",
            params![title, amount, category, next_date],
        )?;
    }

    for (title, target, current, deadline, category, created) in [
        ("Emergency Fund", "10000", "3500", "2024-12-31", "Emergency", "2024-01-15"),
        ("Vacation to Bali", "5000", "2000", "2024-08-15", "Travel", "2024-02-01"),
        ("New Laptop", "1500", "750", "2024-06-30", "Technology", "2024-03-10"),
    ] {
        tx.execute(
            "INSERT INTO goals(title, target_amount, current_amount, deadline, category, created_at) VALUES (?1,?2,?3,?4,?5,?6)",
            params![title, target, current, deadline, category, created],
        )?;
    }

    let table = currency::load_table(&tx)?;
    for (description, amount, ccy, date, category) in [
        ("Hotel Booking - Paris", 450i64, "EUR", "2024-03-15", "Travel"),
        ("Conference Ticket", 350, "GBP", "2024-03-10", "Business"),
        ("Restaurant - Tokyo", 8500, "JPY", "2024-02-25", "Food"),
        ("Souvenir Shopping", 3500, "INR", "2024-02-20", "Shopping"),
    ] {
        let amount = rust_decimal::Decimal::from(amount);
        let usd = table.convert(amount, ccy, currency::REFERENCE).round_dp(2);
        tx.execute(
            "INSERT INTO foreign_transactions(description, amount, currency, date, category, amount_in_usd) VALUES (?1,?2,?3,?4,?5,?6)",
            params![description, amount.to_string(), ccy, date, category, usd.to_string()],
        )?;
    }

    let groups: [(&str, &str, &[&str], &[(&str, &str, &str, &str)]); 2] = [
        (
            "Beach Trip",
            "2024-03-01",
            &["Me", "Alex", "Jordan", "Taylor"],
            &[
                ("Airbnb Rental", "800", "Me", "2024-03-15"),
                ("Groceries", "120", "Alex", "2024-03-16"),
                ("Dinner Out", "200", "Jordan", "2024-03-17"),
            ],
        ),
        (
            "Roommates",
            "2024-02-15",
            &["Me", "Sam", "Jamie"],
            &[
                ("Electricity Bill", "150", "Me", "2024-04-01"),
                ("Internet", "80", "Sam", "2024-04-05"),
            ],
        ),
    ];
    for (name, created, members, expenses) in groups {
        tx.execute(
            "INSERT INTO expense_groups(name, created_at) VALUES (?1,?2)",
            params![name, created],
        )?;
        let gid = tx.last_insert_rowid();
        for (pos, m) in members.iter().enumerate() {
            tx.execute(
                "INSERT INTO group_members(group_id, position, name) VALUES (?1,?2,?3)",
                params![gid, pos as i64, m],
            )?;
        }
        for (title, amount, paid_by, date) in expenses {
            tx.execute(
                "INSERT INTO expenses(group_id, title, amount, paid_by, date, split_type) VALUES (?1,?2,?3,?4,?5,'equal')",
                params![gid, title, amount, paid_by, date],
            )?;
        }
    }

    type SampleItem<'a> = (&'a str, &'a str, u32);
    let receipts: [(&str, &str, &str, &str, &str, Option<&str>, Option<&str>, Option<&str>, &[SampleItem]); 4] = [
        (
            "Grocery Receipt", "2024-04-07", "1078.45", "processed", "Food",
            Some("SuperMart Groceries"), Some("1026.45"), Some("52.00"),
            &[
                ("Fruits & Vegetables", "320.50", 1),
                ("Bread & Bakery", "150.95", 2),
                ("Dairy Products", "280.00", 1),
                ("Meat & Poultry", "275.00", 1),
            ],
        ),
        (
            "Gas Station", "2024-04-05", "1245.23", "processed", "Transportation",
            Some("QuickFuel Station"), Some("1245.23"), Some("0"),
            &[("Petrol (15L)", "1200.00", 1), ("Car Wash", "45.23", 1)],
        ),
        ("Restaurant Bill", "2024-04-02", "1267.89", "pending", "Dining", None, None, None, &[]),
        ("Office Supplies", "2024-03-28", "2124.56", "processed", "Office", None, None, None, &[]),
    ];
    for (name, date, amount, status, category, vendor, subtotal, tax, items) in receipts {
        tx.execute(
            "INSERT INTO receipts(name, date, amount, status, category, vendor, subtotal, tax_amount) VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
            params![name, date, amount, status, category, vendor, subtotal, tax],
        )?;
        let rid = tx.last_insert_rowid();
        for (iname, price, qty) in items {
            tx.execute(
                "INSERT INTO receipt_items(receipt_id, name, price, quantity) VALUES (?1,?2,?3,?4)",
                params![rid, iname, price, qty],
            )?;
        }
    }

    for (keyword, category) in [
        ("Netflix", "Entertainment"),
        ("Uber", "Transportation"),
        ("Grocery", "Food"),
    ] {
        tx.execute(
            "INSERT INTO rules(keyword, category, active) VALUES (?1,?2,1)",
            params![keyword, category],
        )?;
    }

    tx.commit()?;
    info!("sample data loaded");
    Ok(())
}
