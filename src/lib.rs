//! Cycle prediction and daily health scoring for PCOS tracking.
//!
//! The pure core lives in [`prediction`] and [`health`]. [`Tracker`] ties it
//! to a [`HealthStore`], either the in-memory [`MemoryStore`] or the
//! encrypted on-device [`VaultStore`].

pub mod activity;
pub mod crypto;
pub mod health;
pub mod models;
pub mod prediction;
pub mod storage;
pub mod store;
pub mod summary;
pub mod tracker;

pub use health::{assess, assess_day, DayInputs, Dimension, HealthAssessment};
pub use models::*;
pub use prediction::{current_phase, cycle_day, predict_next_period};
pub use storage::VaultStore;
pub use store::{HealthStore, MemoryStore, StoreError, StoreResult};
pub use tracker::{Tracker, TrackerError, TrackerResult};
