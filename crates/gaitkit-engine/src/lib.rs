//! Phase-cycle engine for phase-normalized gait data.
//!
//! The engine takes a flat table with one row per phase sample and turns
//! every (subject, task) selection into a block of fixed-length cycles:
//!
//! ```text
//! flat table ──► MetadataIndex ──► get_cycles ──► CycleBlock (cycle, phase, feature)
//!                                      │
//!                    ┌─────────────────┼──────────────────┬────────────────┐
//!                    ▼                 ▼                  ▼                ▼
//!                 summary          validation          outlier        correlation
//! ```
//!
//! Reshaped blocks are memoized in a [`cache::CycleCache`]; the analysis
//! modules only ever read blocks through [`engine::CycleEngine::get_cycles`].
//!
//! # Modules
//!
//! - [`table`]: the in-memory columnar input
//! - [`config`]: column names, cycle length and plausibility thresholds
//! - [`feature`]: name-based feature classification
//! - [`index`]: subjects, tasks, features and row groups
//! - [`cycle_block`]: the three-axis cycle array
//! - [`cache`]: memoization of reshaped blocks
//! - [`engine`]: [`CycleEngine`] construction and the reshaper
//! - [`summary`]: mean/std patterns, range of motion, descriptive summaries
//! - [`validation`]: per-cycle plausibility rules
//! - [`outlier`]: RMSE-based outlier cycles
//! - [`correlation`]: per-phase correlation matrices
//!
//! # Example
//!
//! ```
//! use gaitkit_engine::{
//!     CycleEngine, FeatureSelection,
//!     table::{Column, Table},
//! };
//!
//! // two cycles of a knee angle rising to 1.2 rad and back
//! let points = 150;
//! let knee = (0..2 * points)
//!     .map(|row| {
//!         let t = (row % points) as f64 / (points - 1) as f64;
//!         1.2 * (std::f64::consts::PI * t).sin()
//!     })
//!     .collect::<Vec<_>>();
//! let table = Table::new(vec![
//!     ("subject".into(), Column::Text(vec!["S1".into(); 2 * points])),
//!     ("task".into(), Column::Text(vec!["T1".into(); 2 * points])),
//!     ("knee_flexion_angle_rad".into(), Column::Numeric(knee)),
//! ])
//! .unwrap();
//!
//! let engine = CycleEngine::with_defaults(table).unwrap();
//! let all = FeatureSelection::All;
//! let means = engine.mean_patterns("S1", "T1", all);
//! assert_eq!(means["knee_flexion_angle_rad"].len(), points);
//! assert_eq!(engine.validate_cycles("S1", "T1", all), [true, true]);
//! assert!(engine.find_outlier_cycles("S1", "T1", all, None).is_empty());
//! ```

pub use self::{
    correlation::PhaseCorrelations,
    cycle_block::CycleBlock,
    engine::{CycleEngine, EngineError},
    feature::{FeatureKind, FeatureSelection},
    summary::{FeatureSummary, RangeOfMotion, RomMode},
    validation::{ValidationReport, ValidationRule},
};

pub mod cache;
pub mod config;
pub mod correlation;
pub mod cycle_block;
pub mod engine;
pub mod feature;
pub mod index;
pub mod outlier;
pub mod summary;
pub mod table;
pub mod validation;
