// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::backend::{LoginRequest, SignupRequest, SubmitPort, validate_login, validate_signup};
use crate::utils::{clear_setting, get_setting, set_setting};
use anyhow::Result;
use rusqlite::Connection;

const CURRENT_USER: &str = "current_user";

fn raw(m: &clap::ArgMatches, id: &str) -> String {
    m.get_one::<String>(id).cloned().unwrap_or_default()
}

pub fn handle(conn: &Connection, port: &dyn SubmitPort, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("login", sub)) => {
            let req = LoginRequest {
                email: raw(sub, "email"),
                password: raw(sub, "password"),
            };
            validate_login(&req)?;
            let session = port.login(&req)?;
            set_setting(conn, CURRENT_USER, &session.user)?;
            println!("Login successful");
        }
        Some(("signup", sub)) => {
            let req = SignupRequest {
                name: raw(sub, "name"),
                email: raw(sub, "email"),
                password: raw(sub, "password"),
                accept_terms: sub.get_flag("accept-terms"),
            };
            validate_signup(&req)?;
            let session = port.signup(&req)?;
            set_setting(conn, CURRENT_USER, &session.user)?;
            println!("Account created successfully");
        }
        Some(("logout", _)) => {
            clear_setting(conn, CURRENT_USER)?;
            println!("Logged out");
        }
        Some(("whoami", _)) => match current_user(conn)? {
            Some(u) => println!("{}", u),
            None => println!("Not signed in"),
        },
        _ => {}
    }
    Ok(())
}

pub fn current_user(conn: &Connection) -> Result<Option<String>> {
    get_setting(conn, CURRENT_USER)
}
