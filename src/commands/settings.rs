// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::backend::validate_password_change;
use crate::currency;
use crate::error::BudgetError;
use crate::i18n::{self, Language};
use crate::utils::{get_base_currency, req_arg, set_base_currency};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, default: Language, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("language", sub)) => match sub.subcommand() {
            Some(("set", s)) => {
                let lang: Language = req_arg(s, "code")?.parse()?;
                i18n::save_language(conn, lang)?;
                println!("Language changed to {}", lang.name());
            }
            _ => {
                let lang = i18n::load_language(conn, default)?;
                println!("{} ({})", lang.name(), lang.code());
            }
        },
        Some(("base-currency", sub)) => match sub.subcommand() {
            Some(("set", s)) => {
                let table = currency::load_table(conn)?;
                let ccy = currency::ensure_known(&table, &req_arg(s, "currency")?)?;
                set_base_currency(conn, &ccy)?;
                println!("Base currency set to {}", ccy);
            }
            _ => println!("{}", get_base_currency(conn)?),
        },
        Some(("password", sub)) => {
            let current = sub.get_one::<String>("current").cloned().unwrap_or_default();
            let new = sub.get_one::<String>("new").cloned().unwrap_or_default();
            let confirm = sub.get_one::<String>("confirm").cloned().unwrap_or_default();
            if current.is_empty() {
                return Err(BudgetError::MissingFields.into());
            }
            validate_password_change(&new, &confirm)?;
            println!("Password updated successfully");
        }
        _ => {}
    }
    Ok(())
}
