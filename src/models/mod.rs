// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod rep;
pub mod rollup;
pub mod stats;
pub mod user;

pub use rep::{ExerciseKinds, RepRecord, RepWindow};
pub use rollup::{grand_total, rollup_by_date, Rollup};
pub use stats::{EntityStats, OfficeParticipation, StatValue};
pub use user::{Office, User};
