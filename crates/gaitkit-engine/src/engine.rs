//! The phase-cycle engine
//!
//! [`CycleEngine`] owns a flat table, indexes it once at construction and
//! answers per-(subject, task) queries on top of a memoized reshape. All
//! analysis operations ([`summary`](crate::summary),
//! [`validation`](crate::validation), [`outlier`](crate::outlier),
//! [`correlation`](crate::correlation)) go through
//! [`CycleEngine::get_cycles`] and never touch the table directly.
//!
//! # Failure tiers
//!
//! - Structural problems (missing identifier columns, invalid configuration)
//!   fail [`CycleEngine::new`] with an [`EngineError`].
//! - Query-time absence of data (unknown pair, partial cycles, no usable
//!   features, out-of-order phase column) is not an error: the query returns
//!   an empty block and logs a warning, so batch runs over many pairs keep
//!   going.

use std::{
    cmp::Ordering,
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tracing::{debug, info, warn};

use crate::{
    cache::{self, BoxedCycleCache, CacheKey},
    config::{ConfigError, EngineConfig},
    cycle_block::CycleBlock,
    feature::{FeatureKind, FeatureSelection},
    index::{IndexError, MetadataIndex},
    table::Table,
};

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum EngineError {
    #[display("invalid table: {_0}")]
    Index(IndexError),
    #[display("invalid configuration: {_0}")]
    InvalidConfig(ConfigError),
}

#[derive(Debug)]
pub struct CycleEngine {
    table: Table,
    config: EngineConfig,
    index: MetadataIndex,
    cache: Mutex<BoxedCycleCache>,
}

impl CycleEngine {
    /// Indexes `table` and builds an engine with an empty cache.
    ///
    /// # Example
    ///
    /// ```
    /// use gaitkit_engine::{
    ///     config::EngineConfig,
    ///     engine::CycleEngine,
    ///     table::{Column, Table},
    /// };
    ///
    /// let rows = 2 * 150;
    /// let table = Table::new(vec![
    ///     ("subject".into(), Column::Text(vec!["S1".into(); rows])),
    ///     ("task".into(), Column::Text(vec!["walk".into(); rows])),
    ///     ("knee_flexion_angle_rad".into(), Column::Numeric(vec![0.3; rows])),
    /// ])
    /// .unwrap();
    ///
    /// let engine = CycleEngine::new(table, EngineConfig::default()).unwrap();
    /// assert_eq!(engine.subjects(), ["S1"]);
    /// assert_eq!(engine.get_cycles("S1", "walk", &["knee_flexion_angle_rad"]).shape(), (2, 150, 1));
    /// ```
    pub fn new(table: Table, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let index = MetadataIndex::build(&table, &config)?;
        info!(
            rows = table.num_rows(),
            subjects = index.subjects().len(),
            tasks = index.tasks().len(),
            features = index.features().len(),
            "indexed gait table"
        );
        let cache = Mutex::new(cache::cache_for_capacity(config.cache_capacity));
        Ok(Self {
            table,
            config,
            index,
            cache,
        })
    }

    /// Builds an engine with [`EngineConfig::default`].
    pub fn with_defaults(table: Table) -> Result<Self, EngineError> {
        Self::new(table, EngineConfig::default())
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn table(&self) -> &Table {
        &self.table
    }

    #[must_use]
    pub fn subjects(&self) -> &[String] {
        self.index.subjects()
    }

    #[must_use]
    pub fn tasks(&self) -> &[String] {
        self.index.tasks()
    }

    /// Signal features discovered at construction, in table order.
    #[must_use]
    pub fn features(&self) -> &[String] {
        self.index.features()
    }

    /// Category of a usable feature column, `None` if the column is not one.
    #[must_use]
    pub fn feature_kind(&self, name: &str) -> Option<FeatureKind> {
        self.index.kind(name)
    }

    /// Every (subject, task) pair present in the table, sorted.
    #[must_use]
    pub fn subject_task_pairs(&self) -> Vec<(String, String)> {
        self.index
            .pairs()
            .map(|(subject, task)| (subject.to_owned(), task.to_owned()))
            .collect()
    }

    /// Resolves a feature selection against the table.
    ///
    /// Named features that are not usable numeric columns are dropped
    /// silently, as are repeats.
    #[must_use]
    pub fn resolve_features<'f>(&self, features: impl Into<FeatureSelection<'f>>) -> Vec<String> {
        match features.into() {
            FeatureSelection::All => self.index.features().to_vec(),
            FeatureSelection::Named(names) => {
                let mut seen = HashSet::new();
                names
                    .iter()
                    .filter(|name| self.index.kind(name).is_some())
                    .filter(|name| seen.insert(**name))
                    .map(|name| (*name).to_owned())
                    .collect()
            }
        }
    }

    /// Cycles of one (subject, task) selection as `(cycle, phase, feature)`.
    ///
    /// Returns the empty block (shape `(0, points_per_cycle, 0)`) when there
    /// is nothing to reshape; see the module docs for when that happens.
    /// Identical calls return the same `Arc` until the cache is cleared or
    /// the entry is evicted.
    pub fn get_cycles<'f>(
        &self,
        subject: &str,
        task: &str,
        features: impl Into<FeatureSelection<'f>>,
    ) -> Arc<CycleBlock> {
        let points = self.config.points_per_cycle;
        let features = self.resolve_features(features);
        if features.is_empty() {
            warn!(subject, task, "no usable features requested");
            return Arc::new(CycleBlock::empty(points));
        }

        let Some(rows) = self.index.rows(subject, task) else {
            warn!(subject, task, "no rows for subject/task combination");
            return Arc::new(CycleBlock::empty(points));
        };

        let key = CacheKey::new(subject, task, &features);
        if let Some(block) = self.lock_cache().get(&key) {
            debug!(%key, "cycle cache hit");
            return arrange(block, &features);
        }
        debug!(%key, "cycle cache miss");

        if rows.len() % points != 0 {
            warn!(
                subject,
                task,
                rows = rows.len(),
                points_per_cycle = points,
                "row count is not a multiple of the cycle length"
            );
            return Arc::new(CycleBlock::empty(points));
        }
        if let Some(cycle) = self.first_unordered_cycle(rows) {
            warn!(
                subject,
                task,
                cycle,
                phase_column = %self.config.phase_column,
                "phase column does not follow the cycle layout"
            );
            return Arc::new(CycleBlock::empty(points));
        }

        let columns = features
            .iter()
            .filter_map(|name| self.table.numeric_column(name))
            .collect::<Vec<_>>();
        let block = Arc::new(CycleBlock::from_rows(rows, points, features, &columns));

        // another caller may have filled the key while we were reshaping
        let mut cache = self.lock_cache();
        if let Some(existing) = cache.get(&key) {
            return arrange(existing, block.features());
        }
        cache.insert(key, Arc::clone(&block));
        block
    }

    /// Drops every cached block.
    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }

    /// Number of cached blocks.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.lock_cache().len()
    }

    /// A new engine over the rows of the given subjects only.
    ///
    /// The new engine has its own empty cache and shares nothing with `self`.
    pub fn filter_subjects(&self, subjects: &[&str]) -> Result<Self, EngineError> {
        self.filter_by_column(&self.config.subject_column, subjects)
    }

    /// A new engine over the rows of the given tasks only.
    ///
    /// The new engine has its own empty cache and shares nothing with `self`.
    pub fn filter_tasks(&self, tasks: &[&str]) -> Result<Self, EngineError> {
        self.filter_by_column(&self.config.task_column, tasks)
    }

    fn filter_by_column(&self, column: &str, keep: &[&str]) -> Result<Self, EngineError> {
        let values = self
            .table
            .text_column(column)
            .ok_or_else(|| IndexError::MissingColumn {
                column: column.to_owned(),
            })?;
        let mask = values
            .iter()
            .map(|value| keep.contains(&value.as_str()))
            .collect::<Vec<_>>();
        Self::new(self.table.filter_rows(&mask), self.config.clone())
    }

    /// Index of the first cycle that breaks the layout of the phase column,
    /// if the table has one.
    ///
    /// A column that is constant over the first cycle is read as a cycle
    /// index; anything else as phase values.
    fn first_unordered_cycle(&self, rows: &[usize]) -> Option<usize> {
        let column = self.table.numeric_column(&self.config.phase_column)?;
        let cycles = rows
            .chunks(self.config.points_per_cycle)
            .map(|cycle| cycle.iter().map(|&row| column[row]).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        let first = cycles.first()?;

        if first.len() > 1 && is_constant(first) {
            cycles.iter().enumerate().position(|(i, cycle)| {
                !is_constant(cycle) || (i > 0 && is_constant(&[cycles[i - 1][0], cycle[0]]))
            })
        } else {
            cycles
                .iter()
                .position(|cycle| !is_strictly_increasing(cycle))
        }
    }

    fn lock_cache(&self) -> MutexGuard<'_, BoxedCycleCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn is_constant(values: &[f64]) -> bool {
    values
        .windows(2)
        .all(|w| w[0].partial_cmp(&w[1]) == Some(Ordering::Equal))
}

fn is_strictly_increasing(values: &[f64]) -> bool {
    values
        .windows(2)
        .all(|w| w[0].partial_cmp(&w[1]) == Some(Ordering::Less))
}

/// Hands out a cached block in the requested feature order.
///
/// The cache key ignores order, so a hit may hold the same features in a
/// different arrangement; in that case the caller gets a reordered copy and
/// the cached block stays untouched.
fn arrange(block: Arc<CycleBlock>, features: &[String]) -> Arc<CycleBlock> {
    if block.features() == features {
        return block;
    }
    match block.reordered(features) {
        Some(reordered) => Arc::new(reordered),
        None => block,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    const POINTS: usize = 4;

    fn config() -> EngineConfig {
        EngineConfig {
            points_per_cycle: POINTS,
            ..EngineConfig::default()
        }
    }

    /// `cycles` cycles of S1/walk followed by one cycle of S2/run.
    fn table(cycles: usize) -> Table {
        let walk_rows = cycles * POINTS;
        let rows = walk_rows + POINTS;
        let mut subject = vec!["S1".to_string(); walk_rows];
        subject.extend(vec!["S2".to_string(); POINTS]);
        let mut task = vec!["walk".to_string(); walk_rows];
        task.extend(vec!["run".to_string(); POINTS]);
        let phase = (0..rows).map(|r| (r % POINTS) as f64).collect();
        let angle = (0..rows).map(|r| r as f64 * 0.01).collect();
        let moment = (0..rows).map(|r| -(r as f64)).collect();
        Table::new(vec![
            ("subject".into(), Column::Text(subject)),
            ("task".into(), Column::Text(task)),
            ("phase".into(), Column::Numeric(phase)),
            ("knee_angle".into(), Column::Numeric(angle)),
            ("hip_moment".into(), Column::Numeric(moment)),
        ])
        .unwrap()
    }

    #[test]
    fn test_missing_column_fails_construction() {
        let table = Table::new(vec![("task".into(), Column::Text(vec!["walk".into()]))]).unwrap();
        let err = CycleEngine::with_defaults(table).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Index(IndexError::MissingColumn { column }) if column == "subject"
        ));
    }

    #[test]
    fn test_invalid_config_fails_construction() {
        let config = EngineConfig {
            points_per_cycle: 0,
            ..EngineConfig::default()
        };
        let err = CycleEngine::new(table(1), config).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_get_cycles_shape_and_order() {
        let engine = CycleEngine::new(table(3), config()).unwrap();
        let block = engine.get_cycles("S1", "walk", FeatureSelection::All);
        assert_eq!(block.shape(), (3, POINTS, 2));
        assert_eq!(block.features(), ["knee_angle", "hip_moment"]);
        assert_eq!(block.series(1, 1).to_vec(), [-4.0, -5.0, -6.0, -7.0]);
    }

    #[test]
    fn test_cache_returns_same_block() {
        let engine = CycleEngine::new(table(2), config()).unwrap();
        let first = engine.get_cycles("S1", "walk", &["knee_angle"]);
        let second = engine.get_cycles("S1", "walk", &["knee_angle"]);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(engine.cache_len(), 1);

        engine.clear_cache();
        assert_eq!(engine.cache_len(), 0);
        let third = engine.get_cycles("S1", "walk", &["knee_angle"]);
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(*first, *third);
    }

    #[test]
    fn test_cache_hit_respects_requested_order() {
        let engine = CycleEngine::new(table(2), config()).unwrap();
        let forward = engine.get_cycles("S1", "walk", &["knee_angle", "hip_moment"]);
        let backward = engine.get_cycles("S1", "walk", &["hip_moment", "knee_angle"]);
        assert_eq!(engine.cache_len(), 1);
        assert_eq!(backward.features(), ["hip_moment", "knee_angle"]);
        assert_eq!(backward.series(0, 0), forward.series(0, 1));
    }

    #[test]
    fn test_unknown_pair_is_empty() {
        let engine = CycleEngine::new(table(2), config()).unwrap();
        let block = engine.get_cycles("S9", "walk", FeatureSelection::All);
        assert_eq!(block.shape(), (0, POINTS, 0));
        assert!(block.features().is_empty());
        assert_eq!(engine.cache_len(), 0);
    }

    #[test]
    fn test_unusable_features_are_dropped() {
        let engine = CycleEngine::new(table(2), config()).unwrap();
        let block = engine.get_cycles("S1", "walk", &["nope", "knee_angle", "knee_angle"]);
        assert_eq!(block.features(), ["knee_angle"]);
        let block = engine.get_cycles("S1", "walk", &["nope", "subject", "phase"]);
        assert!(block.is_empty());
        assert_eq!(block.shape(), (0, POINTS, 0));
    }

    #[test]
    fn test_partial_cycle_is_empty() {
        let config = EngineConfig {
            points_per_cycle: 3,
            ..EngineConfig::default()
        };
        let engine = CycleEngine::new(table(2), config).unwrap();
        assert!(engine.get_cycles("S1", "walk", FeatureSelection::All).is_empty());
    }

    #[test]
    fn test_unordered_phase_is_empty() {
        let mut columns: Vec<(String, Column)> = vec![
            ("subject".into(), Column::Text(vec!["S1".into(); POINTS])),
            ("task".into(), Column::Text(vec!["walk".into(); POINTS])),
            ("knee_angle".into(), Column::Numeric(vec![0.0; POINTS])),
        ];
        let engine = CycleEngine::new(Table::new(columns.clone()).unwrap(), config()).unwrap();
        assert_eq!(engine.get_cycles("S1", "walk", FeatureSelection::All).num_cycles(), 1);

        columns.push(("phase".into(), Column::Numeric(vec![0.0, 2.0, 1.0, 3.0])));
        let engine = CycleEngine::new(Table::new(columns).unwrap(), config()).unwrap();
        assert!(engine.get_cycles("S1", "walk", FeatureSelection::All).is_empty());
    }

    fn cycle_index_engine(cycle_index: Vec<f64>) -> CycleEngine {
        let rows = cycle_index.len();
        let table = Table::new(vec![
            ("subject".into(), Column::Text(vec!["S1".into(); rows])),
            ("task".into(), Column::Text(vec!["walk".into(); rows])),
            ("cycle".into(), Column::Numeric(cycle_index)),
            ("knee_angle".into(), Column::Numeric(vec![0.0; rows])),
        ])
        .unwrap();
        let config = EngineConfig {
            phase_column: "cycle".into(),
            ..config()
        };
        CycleEngine::new(table, config).unwrap()
    }

    #[test]
    fn test_cycle_index_column_is_accepted() {
        let index = (0..3 * POINTS).map(|r| (r / POINTS) as f64).collect();
        let engine = cycle_index_engine(index);
        assert_eq!(engine.features(), ["knee_angle"]);
        assert_eq!(
            engine.get_cycles("S1", "walk", FeatureSelection::All).shape(),
            (3, POINTS, 1)
        );

        // phase values under the same column name still work
        let phase = (0..3 * POINTS).map(|r| (r % POINTS) as f64).collect();
        let engine = cycle_index_engine(phase);
        assert_eq!(engine.get_cycles("S1", "walk", FeatureSelection::All).num_cycles(), 3);
    }

    #[test]
    fn test_misaligned_cycle_index_is_empty() {
        // index changes in the middle of the second cycle
        let shifted = vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0];
        let engine = cycle_index_engine(shifted);
        assert!(engine.get_cycles("S1", "walk", FeatureSelection::All).is_empty());

        // two chunks share one index, so a cycle spans 2 * POINTS rows
        let stretched = vec![7.0; 2 * POINTS];
        let engine = cycle_index_engine(stretched);
        assert!(engine.get_cycles("S1", "walk", FeatureSelection::All).is_empty());
    }

    #[test]
    fn test_concurrent_queries_share_one_block() {
        let engine = CycleEngine::new(table(3), config()).unwrap();
        let blocks = std::thread::scope(|scope| {
            let handles = (0..8)
                .map(|_| scope.spawn(|| engine.get_cycles("S1", "walk", &["knee_angle"])))
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect::<Vec<_>>()
        });
        assert!(blocks.iter().all(|block| Arc::ptr_eq(block, &blocks[0])));
        assert_eq!(engine.cache_len(), 1);
    }

    #[test]
    fn test_filtered_engine_has_own_cache() {
        let engine = CycleEngine::new(table(2), config()).unwrap();
        let _ = engine.get_cycles("S1", "walk", FeatureSelection::All);

        let only_s2 = engine.filter_subjects(&["S2"]).unwrap();
        assert_eq!(only_s2.subjects(), ["S2"]);
        assert_eq!(only_s2.cache_len(), 0);
        assert_eq!(only_s2.table().num_rows(), POINTS);
        assert_eq!(engine.cache_len(), 1);

        let only_walk = engine.filter_tasks(&["walk"]).unwrap();
        assert_eq!(only_walk.tasks(), ["walk"]);
        assert_eq!(
            only_walk.subject_task_pairs(),
            [("S1".to_string(), "walk".to_string())]
        );
    }

    #[test]
    fn test_lru_capacity_bounds_cache() {
        let config = EngineConfig {
            cache_capacity: Some(1),
            ..config()
        };
        let engine = CycleEngine::new(table(2), config).unwrap();
        let _ = engine.get_cycles("S1", "walk", FeatureSelection::All);
        let _ = engine.get_cycles("S2", "run", FeatureSelection::All);
        assert_eq!(engine.cache_len(), 1);
    }
}
