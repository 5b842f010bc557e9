//! Statistical utilities for the gaitkit project.
//!
//! Every reduction in this crate treats non-finite inputs (`NaN`, `±inf`) as
//! missing samples: they are skipped, and a reduction over nothing but
//! missing samples reports `NaN` (or `None`) instead of a misleading zero.
//!
//! # Modules
//!
//! - [`descriptive`]: mean, median, variance and standard deviation
//! - [`percentiles`]: nearest-rank percentiles and quartiles
//! - [`correlation`]: Pearson correlation over complete pairs
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use gaitkit_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::from_finite(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```
//!
//! ## Computing quartiles
//!
//! ```
//! use gaitkit_stats::percentiles::Quartiles;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let quartiles = Quartiles::from_finite(values).unwrap();
//! assert_eq!(quartiles.q50, 3.0);
//! ```

pub mod correlation;
pub mod descriptive;
pub mod percentiles;
