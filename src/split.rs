// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Balances for shared expenses.
//!
//! A payer is credited with the full amount; every participant is debited
//! their share. Positive balances are owed to the member, negative ones are
//! owed by the member.

use crate::error::BudgetError;
use crate::models::{Expense, Share, SplitType};
use rust_decimal::Decimal;
use serde::Serialize;

/// Balances closer to zero than this are reported as settled.
pub const SETTLE_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberBalance {
    pub member: String,
    pub balance: Decimal,
}

impl MemberBalance {
    pub fn describe(&self) -> String {
        let abs = self.balance.abs().round_dp(2);
        if self.balance.abs() < SETTLE_EPSILON {
            "settled up".to_string()
        } else if self.balance > Decimal::ZERO {
            format!("gets back ${:.2}", abs)
        } else {
            format!("owes ${:.2}", abs)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settlement {
    pub from: String,
    pub to: String,
    pub amount: Decimal,
}

/// Net balance per member, in member order.
pub fn calculate_balances(members: &[String], expenses: &[Expense]) -> Vec<MemberBalance> {
    let mut balances: Vec<MemberBalance> = members
        .iter()
        .map(|m| MemberBalance {
            member: m.clone(),
            balance: Decimal::ZERO,
        })
        .collect();

    fn entry<'a>(balances: &'a mut Vec<MemberBalance>, member: &str) -> &'a mut Decimal {
        if let Some(i) = balances.iter().position(|b| b.member == member) {
            &mut balances[i].balance
        } else {
            // payer or share holder outside the member list still gets a line
            balances.push(MemberBalance {
                member: member.to_string(),
                balance: Decimal::ZERO,
            });
            let last = balances.len() - 1;
            &mut balances[last].balance
        }
    }

    for expense in expenses {
        *entry(&mut balances, &expense.paid_by) += expense.amount;
        match expense.split_type {
            SplitType::Equal => {
                if members.is_empty() {
                    continue;
                }
                let per_person = expense.amount / Decimal::from(members.len());
                for m in members {
                    *entry(&mut balances, m) -= per_person;
                }
            }
            SplitType::Custom => {
                for share in &expense.shares {
                    *entry(&mut balances, &share.member) -= share.amount;
                }
            }
        }
    }
    balances
}

/// `amount - sum(shares)` for custom splits; zero for equal splits.
pub fn share_discrepancy(expense: &Expense) -> Decimal {
    match expense.split_type {
        SplitType::Equal => Decimal::ZERO,
        SplitType::Custom => {
            expense.amount - expense.shares.iter().map(|s| s.amount).sum::<Decimal>()
        }
    }
}

/// Rejects custom shares that name non-members, are negative, or do not
/// cover the expense amount within one cent.
pub fn validate_shares(
    members: &[String],
    amount: Decimal,
    shares: &[Share],
) -> Result<(), BudgetError> {
    for share in shares {
        if !members.iter().any(|m| m == &share.member) {
            return Err(BudgetError::NotAMember(share.member.clone()));
        }
        if share.amount < Decimal::ZERO {
            return Err(BudgetError::InvalidAmount);
        }
    }
    let discrepancy = amount - shares.iter().map(|s| s.amount).sum::<Decimal>();
    if discrepancy.abs() >= SETTLE_EPSILON {
        return Err(BudgetError::ShareMismatch {
            amount,
            discrepancy,
        });
    }
    Ok(())
}

/// Transfers that clear every balance, largest debtor paying largest creditor.
pub fn settle_up(balances: &[MemberBalance]) -> Vec<Settlement> {
    let mut creditors: Vec<(String, Decimal)> = balances
        .iter()
        .filter(|b| b.balance >= SETTLE_EPSILON)
        .map(|b| (b.member.clone(), b.balance))
        .collect();
    let mut debtors: Vec<(String, Decimal)> = balances
        .iter()
        .filter(|b| b.balance <= -SETTLE_EPSILON)
        .map(|b| (b.member.clone(), -b.balance))
        .collect();

    let mut out = Vec::new();
    loop {
        creditors.sort_by(|a, b| b.1.cmp(&a.1));
        debtors.sort_by(|a, b| b.1.cmp(&a.1));
        let (Some(c), Some(d)) = (creditors.first_mut(), debtors.first_mut()) else {
            break;
        };
        let amount = c.1.min(d.1);
        if amount < SETTLE_EPSILON {
            break;
        }
        out.push(Settlement {
            from: d.0.clone(),
            to: c.0.clone(),
            amount: amount.round_dp(2),
        });
        c.1 -= amount;
        d.1 -= amount;
        creditors.retain(|(_, v)| *v >= SETTLE_EPSILON);
        debtors.retain(|(_, v)| *v >= SETTLE_EPSILON);
    }
    out
}
