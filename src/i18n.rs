// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::BudgetError;
use crate::utils::{get_setting, set_setting};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

const LANGUAGE_KEY: &str = "language";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
    Ml,
    Kn,
}

impl Language {
    pub const ALL: [Language; 4] = [Language::En, Language::Hi, Language::Ml, Language::Kn];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
            Language::Ml => "ml",
            Language::Kn => "kn",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Hi => "Hindi",
            Language::Ml => "Malayalam",
            Language::Kn => "Kannada",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = BudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_lowercase();
        Language::ALL
            .into_iter()
            .find(|l| l.code() == code)
            .ok_or(BudgetError::InvalidLanguage(code))
    }
}

/// Stored language. `default` applies only when nothing has been stored; an
/// unsupported stored value always resets to English.
pub fn load_language(conn: &Connection, default: Language) -> Result<Language> {
    match get_setting(conn, LANGUAGE_KEY)? {
        Some(v) => match v.parse::<Language>() {
            Ok(lang) => Ok(lang),
            Err(_) => {
                tracing::warn!(stored = %v, "ignoring unsupported stored language");
                Ok(Language::En)
            }
        },
        None => Ok(default),
    }
}

pub fn save_language(conn: &Connection, lang: Language) -> Result<()> {
    set_setting(conn, LANGUAGE_KEY, lang.code())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_allow_list_only() {
        assert_eq!(" HI ".parse::<Language>().unwrap(), Language::Hi);
        assert_eq!(
            "fr".parse::<Language>(),
            Err(BudgetError::InvalidLanguage("fr".into()))
        );
    }
}
