// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Submit port for account and receipt-analysis requests.
//!
//! Commands only see [`SubmitPort`]. [`SimulatedBackend`] waits a fixed
//! latency and fabricates a successful answer; a networked implementation can
//! be dropped in without touching the command layer.

use crate::error::BudgetError;
use crate::models::ReceiptItem;
use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub accept_terms: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectedReceipt {
    pub vendor: String,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub items: Vec<ReceiptItem>,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub category: String,
    pub fingerprint: String,
}

pub fn validate_login(req: &LoginRequest) -> Result<(), BudgetError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(BudgetError::MissingFields);
    }
    if !req.email.contains('@') {
        return Err(BudgetError::InvalidEmail);
    }
    Ok(())
}

pub fn validate_signup(req: &SignupRequest) -> Result<(), BudgetError> {
    if !req.accept_terms {
        return Err(BudgetError::TermsNotAccepted);
    }
    if req.name.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
        return Err(BudgetError::MissingFields);
    }
    if !req.email.contains('@') {
        return Err(BudgetError::InvalidEmail);
    }
    Ok(())
}

pub fn validate_password_change(new: &str, confirm: &str) -> Result<(), BudgetError> {
    if new.is_empty() {
        return Err(BudgetError::MissingFields);
    }
    if new != confirm {
        return Err(BudgetError::PasswordMismatch);
    }
    Ok(())
}

pub trait SubmitPort {
    fn login(&self, req: &LoginRequest) -> Result<Session>;
    fn signup(&self, req: &SignupRequest) -> Result<Session>;
    fn analyze_receipt(&self, file_name: &str, bytes: &[u8]) -> Result<DetectedReceipt>;
}

#[derive(Debug, Clone, Default)]
pub struct SimulatedBackend {
    pub auth_latency: Duration,
    pub receipt_latency: Duration,
}

impl SimulatedBackend {
    pub fn new(auth_latency: Duration, receipt_latency: Duration) -> Self {
        Self {
            auth_latency,
            receipt_latency,
        }
    }

    /// No waiting; used by tests.
    pub fn instant() -> Self {
        Self::default()
    }

    fn wait(&self, d: Duration) {
        if !d.is_zero() {
            debug!(ms = d.as_millis() as u64, "simulating round trip");
            std::thread::sleep(d);
        }
    }
}

impl SubmitPort for SimulatedBackend {
    fn login(&self, req: &LoginRequest) -> Result<Session> {
        validate_login(req)?;
        self.wait(self.auth_latency);
        info!(email = %req.email, "login accepted");
        Ok(Session {
            user: req.email.trim().to_string(),
        })
    }

    fn signup(&self, req: &SignupRequest) -> Result<Session> {
        validate_signup(req)?;
        self.wait(self.auth_latency);
        info!(email = %req.email, "account created");
        Ok(Session {
            user: req.email.trim().to_string(),
        })
    }

    fn analyze_receipt(&self, file_name: &str, bytes: &[u8]) -> Result<DetectedReceipt> {
        self.wait(self.receipt_latency);
        let digest = Sha256::digest(bytes);
        let word = |i: usize| u64::from(u16::from_be_bytes([digest[i], digest[i + 1]]));

        let (vendor, category) = if file_name.contains("Grocery") {
            ("SuperMart Groceries".to_string(), "Food")
        } else if file_name.contains("Gas") {
            ("QuickFuel Station".to_string(), "Transportation")
        } else {
            (format!("Merchant {}", digest[10] % 100), "Miscellaneous")
        };

        let items = vec![
            ReceiptItem {
                name: "Item 1".into(),
                price: Decimal::from(10 + word(2) % 500),
                quantity: 1,
            },
            ReceiptItem {
                name: "Item 2".into(),
                price: Decimal::from(20 + word(4) % 300),
                quantity: 1,
            },
            ReceiptItem {
                name: "Item 3".into(),
                price: Decimal::from(30 + word(6) % 200),
                quantity: 1,
            },
        ];

        // Total is built from its parts so the subtotal never goes negative.
        let subtotal = Decimal::from(100 + word(0) % 2000);
        let tax_amount = Decimal::from(10 + word(8) % 100);
        let detected = DetectedReceipt {
            vendor,
            date: chrono::Local::now().date_naive(),
            amount: subtotal + tax_amount,
            items,
            subtotal,
            tax_amount,
            category: category.to_string(),
            fingerprint: hex::encode(digest),
        };
        info!(file = file_name, vendor = %detected.vendor, "receipt analyzed");
        Ok(detected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_requires_terms_first() {
        let req = SignupRequest {
            name: String::new(),
            email: String::new(),
            password: String::new(),
            accept_terms: false,
        };
        assert_eq!(validate_signup(&req), Err(BudgetError::TermsNotAccepted));
    }

    #[test]
    fn password_confirmation_must_match() {
        assert_eq!(
            validate_password_change("abc", "abd"),
            Err(BudgetError::PasswordMismatch)
        );
        assert!(validate_password_change("abc", "abc").is_ok());
    }

    #[test]
    fn receipt_detection_is_deterministic_and_bounded() {
        let be = SimulatedBackend::instant();
        let a = be.analyze_receipt("Grocery_april.png", b"abc").unwrap();
        let b = be.analyze_receipt("Grocery_april.png", b"abc").unwrap();
        assert_eq!(a.amount, b.amount);
        assert_eq!(a.vendor, "SuperMart Groceries");
        assert_eq!(a.category, "Food");
        assert!(a.amount >= Decimal::from(100) && a.amount < Decimal::from(2100));
        assert!(a.tax_amount >= Decimal::from(10) && a.tax_amount < Decimal::from(110));
        assert_eq!(a.items.len(), 3);

        let other = be.analyze_receipt("scan.jpg", b"xyz").unwrap();
        assert!(other.vendor.starts_with("Merchant "));
        assert_eq!(other.category, "Miscellaneous");
    }
}
