// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod auth;
pub mod budgets;
pub mod fx;
pub mod goals;
pub mod groups;
pub mod predict;
pub mod receipts;
pub mod recurring;
pub mod reports;
pub mod rules;
pub mod settings;
pub mod transactions;
