// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use budgetiq::backend::SimulatedBackend;
use budgetiq::config::AppConfig;
use budgetiq::error::BudgetError;
use budgetiq::{cli, commands, db, utils};

fn init_logging(cfg: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.log_level.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let matches = cli::build_cli().get_matches();

    let mut cfg = AppConfig::load()?;
    if let Some(p) = matches.get_one::<String>("db") {
        cfg.db_path = Some(PathBuf::from(p));
    }
    init_logging(&cfg);

    let mut conn = db::open_or_init(&cfg)?;
    if utils::get_setting(&conn, "base_currency")?.is_none() {
        utils::set_base_currency(&conn, &cfg.base_currency.trim().to_uppercase())?;
    }
    let backend = SimulatedBackend::new(cfg.login_latency(), cfg.receipt_latency());

    match matches.subcommand() {
        Some(("init", sub)) => {
            if sub.get_flag("sample") {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))?;
                if count == 0 {
                    db::seed_sample(&mut conn)?;
                    println!("Sample data loaded");
                } else {
                    println!("Database already has data; sample not loaded");
                }
            }
            println!("Database initialized at {}", db::db_path(&cfg)?.display());
        }
        Some(("tx", sub)) => commands::transactions::handle(&conn, sub)?,
        Some(("budget", sub)) => commands::budgets::handle(&conn, sub)?,
        Some(("recurring", sub)) => commands::recurring::handle(&conn, sub)?,
        Some(("goal", sub)) => commands::goals::handle(&conn, sub)?,
        Some(("fx", sub)) => commands::fx::handle(&conn, sub)?,
        Some(("split", sub)) => commands::groups::handle(&mut conn, sub)?,
        Some(("receipt", sub)) => commands::receipts::handle(&mut conn, &backend, sub)?,
        Some(("rules", sub)) => commands::rules::handle(&conn, sub)?,
        Some(("report", sub)) => commands::reports::handle(&conn, sub)?,
        Some(("predict", sub)) => commands::predict::handle(&conn, sub)?,
        Some(("settings", sub)) => {
            commands::settings::handle(&conn, cfg.default_language(), sub)?
        }
        Some(("auth", sub)) => commands::auth::handle(&conn, &backend, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        match err.downcast_ref::<BudgetError>() {
            Some(user) => eprintln!("{}", user),
            None => eprintln!("Error: {:#}", err),
        }
        std::process::exit(1);
    }
}
