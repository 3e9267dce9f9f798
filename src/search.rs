// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! In-memory filtering and ordering of transactions.

use crate::models::{Transaction, TxKind};
use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::str::FromStr;

pub const ALL_CATEGORIES: &str = "All Categories";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmountRange {
    #[default]
    Any,
    UpTo50,
    From50To100,
    From100To500,
    From500To1000,
    Over1000,
}

impl AmountRange {
    pub fn matches(&self, amount: Decimal) -> bool {
        let n = |v: i64| Decimal::from(v);
        match self {
            AmountRange::Any => true,
            AmountRange::UpTo50 => amount >= Decimal::ZERO && amount <= n(50),
            AmountRange::From50To100 => amount > n(50) && amount <= n(100),
            AmountRange::From100To500 => amount > n(100) && amount <= n(500),
            AmountRange::From500To1000 => amount > n(500) && amount <= n(1000),
            AmountRange::Over1000 => amount > n(1000),
        }
    }
}

impl FromStr for AmountRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let cleaned: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '$')
            .collect::<String>()
            .to_lowercase();
        match cleaned.as_str() {
            "" | "any" | "anyamount" => Ok(AmountRange::Any),
            "0-50" => Ok(AmountRange::UpTo50),
            "50-100" => Ok(AmountRange::From50To100),
            "100-500" => Ok(AmountRange::From100To500),
            "500-1000" => Ok(AmountRange::From500To1000),
            "1000+" => Ok(AmountRange::Over1000),
            _ => Err(anyhow!(
                "Invalid amount range '{}', expected any|0-50|50-100|100-500|500-1000|1000+",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Title,
    Amount,
    #[default]
    Date,
    Category,
}

impl FromStr for SortField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "title" => Ok(SortField::Title),
            "amount" => Ok(SortField::Amount),
            "date" => Ok(SortField::Date),
            "category" => Ok(SortField::Category),
            other => Err(anyhow!(
                "Invalid sort field '{}', expected title|amount|date|category",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(anyhow!("Invalid sort direction '{}', expected asc|desc", other)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub query: String,
    /// `None` or [`ALL_CATEGORIES`] matches every category.
    pub category: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub amount_range: AmountRange,
    /// `None` matches both income and expense.
    pub kind: Option<TxKind>,
    /// History view: the text query also matches the category.
    pub match_category_text: bool,
}

impl TransactionFilter {
    pub fn matches(&self, t: &Transaction) -> bool {
        let q = self.query.to_lowercase();
        let matches_search = q.is_empty()
            || t.title.to_lowercase().contains(&q)
            || t.notes
                .as_deref()
                .unwrap_or("")
                .to_lowercase()
                .contains(&q)
            || (self.match_category_text && t.category.to_lowercase().contains(&q));

        let matches_category = match self.category.as_deref() {
            None | Some(ALL_CATEGORIES) => true,
            Some(c) => t.category == c,
        };
        let matches_from = self.from.is_none_or(|d| t.date >= d);
        let matches_to = self.to.is_none_or(|d| t.date <= d);
        let matches_kind = self.kind.is_none_or(|k| t.kind == k);

        matches_search
            && matches_category
            && matches_from
            && matches_to
            && self.amount_range.matches(t.amount)
            && matches_kind
    }
}

/// The last `days` days up to and including `today`.
pub fn period_start(period: &str, today: NaiveDate) -> Result<Option<NaiveDate>> {
    match period.trim().to_lowercase().as_str() {
        "" | "all" => Ok(None),
        "30days" => Ok(Some(today - chrono::Duration::days(30))),
        "90days" => Ok(Some(today - chrono::Duration::days(90))),
        other => Err(anyhow!("Invalid period '{}', expected all|30days|90days", other)),
    }
}

fn compare(a: &Transaction, b: &Transaction, field: SortField) -> Ordering {
    match field {
        SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortField::Amount => a.amount.cmp(&b.amount),
        SortField::Date => a.date.cmp(&b.date),
        SortField::Category => a.category.to_lowercase().cmp(&b.category.to_lowercase()),
    }
}

pub fn sort_transactions(items: &mut [Transaction], field: SortField, dir: SortDirection) {
    items.sort_by(|a, b| {
        let ord = compare(a, b, field);
        match dir {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

pub fn filter_and_sort(
    items: &[Transaction],
    filter: &TransactionFilter,
    field: SortField,
    dir: SortDirection,
) -> Vec<Transaction> {
    let mut out: Vec<Transaction> = items.iter().filter(|t| filter.matches(t)).cloned().collect();
    sort_transactions(&mut out, field, dir);
    out
}

/// One-based page of `per_page` items; an out-of-range page is empty.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Vec<T> {
    if page == 0 || per_page == 0 {
        return Vec::new();
    }
    items
        .iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_buckets_use_open_lower_bounds() {
        assert!(AmountRange::UpTo50.matches(Decimal::from(50)));
        assert!(!AmountRange::From50To100.matches(Decimal::from(50)));
        assert!(AmountRange::From50To100.matches(Decimal::new(5001, 2)));
        assert!(!AmountRange::Over1000.matches(Decimal::from(1000)));
    }

    #[test]
    fn parses_ui_labels() {
        assert_eq!("$0 - $50".parse::<AmountRange>().unwrap(), AmountRange::UpTo50);
        assert_eq!("$1000+".parse::<AmountRange>().unwrap(), AmountRange::Over1000);
        assert_eq!("Any Amount".parse::<AmountRange>().unwrap(), AmountRange::Any);
        assert!("10-20".parse::<AmountRange>().is_err());
    }

    #[test]
    fn paginate_bounds() {
        let v: Vec<i32> = (1..=5).collect();
        assert_eq!(paginate(&v, 2, 2), vec![3, 4]);
        assert_eq!(paginate(&v, 3, 2), vec![5]);
        assert!(paginate(&v, 4, 2).is_empty());
    }
}
