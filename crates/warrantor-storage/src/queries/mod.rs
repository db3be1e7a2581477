// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for the registry tables.

pub mod bonuses;
pub mod contacts;
pub mod warranties;
