// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use thiserror::Error;

/// User-facing failures. The display strings are what the CLI prints.
#[derive(Debug, Error, PartialEq)]
pub enum BudgetError {
    #[error("Please fill in all required fields")]
    MissingFields,
    #[error("Please enter an amount")]
    MissingAmount,
    #[error("Please enter a valid amount")]
    InvalidAmount,
    #[error("Please enter a group name")]
    MissingGroupName,
    #[error("Please add at least one other person to your group")]
    TooFewMembers,
    #[error("Group \"{0}\" already exists")]
    DuplicateGroup(String),
    #[error("'{0}' is not a member of this group")]
    NotAMember(String),
    #[error("Custom shares must add up to {amount} (off by {discrepancy})")]
    ShareMismatch {
        amount: Decimal,
        discrepancy: Decimal,
    },
    #[error("Please accept the terms and conditions")]
    TermsNotAccepted,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("New passwords do not match")]
    PasswordMismatch,
    #[error("Unknown currency '{0}'")]
    UnknownCurrency(String),
    #[error("Unsupported language '{0}' (use en|hi|ml|kn)")]
    InvalidLanguage(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Receipt already uploaded as #{0}")]
    DuplicateReceipt(i64),
}
