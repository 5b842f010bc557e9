//! Metadata index built once per table
//!
//! A single pass over the table yields the sorted subject and task lists,
//! the classified feature list, and the source rows of every
//! (subject, task) group. Downstream queries look groups up here instead of
//! rescanning the identifier columns.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::{
    config::EngineConfig,
    feature::{FeatureKind, IDENTIFIER_COLUMNS},
    table::{Column, Table},
};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum IndexError {
    #[display("required column '{column}' is missing from the table")]
    MissingColumn { column: String },
    #[display("column '{column}' must hold text identifiers")]
    NotTextColumn { column: String },
    #[display("column '{column}' must hold numeric values")]
    NotNumericColumn { column: String },
}

#[derive(Debug, Clone)]
pub struct MetadataIndex {
    subjects: Vec<String>,
    tasks: Vec<String>,
    features: Vec<String>,
    kinds: HashMap<String, FeatureKind>,
    groups: BTreeMap<(String, String), Vec<usize>>,
}

impl MetadataIndex {
    /// Scans `table` using the column names from `config`.
    ///
    /// # Errors
    ///
    /// Fails when the subject or task column is missing or not textual, or
    /// when a phase column is present but not numeric.
    pub fn build(table: &Table, config: &EngineConfig) -> Result<Self, IndexError> {
        let subjects_col = require_text(table, &config.subject_column)?;
        let tasks_col = require_text(table, &config.task_column)?;
        if let Some(Column::Text(_)) = table.column(&config.phase_column) {
            return Err(IndexError::NotNumericColumn {
                column: config.phase_column.clone(),
            });
        }

        let mut groups = BTreeMap::<(String, String), Vec<usize>>::new();
        for (row, (subject, task)) in subjects_col.iter().zip(tasks_col).enumerate() {
            groups
                .entry((subject.clone(), task.clone()))
                .or_default()
                .push(row);
        }

        let subjects = groups
            .keys()
            .map(|(subject, _)| subject.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let tasks = groups
            .keys()
            .map(|(_, task)| task.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let reserved = [
            config.subject_column.as_str(),
            config.task_column.as_str(),
            config.phase_column.as_str(),
        ];
        let kinds = table
            .column_names()
            .iter()
            .filter(|name| table.numeric_column(name).is_some())
            .filter(|name| !reserved.contains(&name.as_str()))
            .filter(|name| !IDENTIFIER_COLUMNS.contains(&name.to_ascii_lowercase().as_str()))
            .map(|name| (name.clone(), FeatureKind::classify(name)))
            .collect::<HashMap<_, _>>();
        let features = table
            .column_names()
            .iter()
            .filter(|name| kinds.get(*name).is_some_and(|kind| kind.is_signal()))
            .cloned()
            .collect();

        Ok(Self {
            subjects,
            tasks,
            features,
            kinds,
            groups,
        })
    }

    /// Distinct subjects, sorted.
    #[must_use]
    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    /// Distinct tasks, sorted.
    #[must_use]
    pub fn tasks(&self) -> &[String] {
        &self.tasks
    }

    /// Recognized signal features, in table column order.
    #[must_use]
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// Category of a numeric, non-identifier column.
    ///
    /// Unrecognized numeric columns report [`FeatureKind::Unknown`]; `None`
    /// means the column cannot be used as a feature at all.
    #[must_use]
    pub fn kind(&self, name: &str) -> Option<FeatureKind> {
        self.kinds.get(name).copied()
    }

    /// Source rows of one (subject, task) group, in table order.
    #[must_use]
    pub fn rows(&self, subject: &str, task: &str) -> Option<&[usize]> {
        self.groups
            .get(&(subject.to_owned(), task.to_owned()))
            .map(Vec::as_slice)
    }

    /// Every (subject, task) pair with at least one row, sorted.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.groups
            .keys()
            .map(|(subject, task)| (subject.as_str(), task.as_str()))
    }
}

fn require_text<'a>(table: &'a Table, column: &str) -> Result<&'a [String], IndexError> {
    match table.column(column) {
        Some(Column::Text(values)) => Ok(values),
        Some(Column::Numeric(_)) => Err(IndexError::NotTextColumn {
            column: column.to_owned(),
        }),
        None => Err(IndexError::MissingColumn {
            column: column.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(values: &[&str]) -> Column {
        Column::Text(values.iter().map(ToString::to_string).collect())
    }

    fn sample_table() -> Table {
        Table::new(vec![
            ("subject".into(), text(&["S2", "S1", "S2", "S1"])),
            ("task".into(), text(&["run", "walk", "walk", "walk"])),
            ("phase".into(), Column::Numeric(vec![0.0, 0.0, 0.0, 1.0])),
            ("time".into(), Column::Numeric(vec![0.0; 4])),
            ("hip_moment_Nm".into(), Column::Numeric(vec![1.0; 4])),
            ("knee_flexion_angle_rad".into(), Column::Numeric(vec![0.5; 4])),
            ("marker_x".into(), Column::Numeric(vec![0.0; 4])),
            ("ankle_angle_label".into(), text(&["a", "b", "c", "d"])),
        ])
        .unwrap()
    }

    #[test]
    fn test_subjects_and_tasks_are_sorted_unique() {
        let index = MetadataIndex::build(&sample_table(), &EngineConfig::default()).unwrap();
        assert_eq!(index.subjects(), ["S1", "S2"]);
        assert_eq!(index.tasks(), ["run", "walk"]);
    }

    #[test]
    fn test_features_keep_column_order_and_skip_non_signals() {
        let index = MetadataIndex::build(&sample_table(), &EngineConfig::default()).unwrap();
        assert_eq!(index.features(), ["hip_moment_Nm", "knee_flexion_angle_rad"]);
        assert_eq!(index.kind("marker_x"), Some(FeatureKind::Unknown));
        assert_eq!(index.kind("knee_flexion_angle_rad"), Some(FeatureKind::Angle));
        assert_eq!(index.kind("phase"), None);
        assert_eq!(index.kind("time"), None);
        assert_eq!(index.kind("ankle_angle_label"), None);
    }

    #[test]
    fn test_groups_keep_row_order() {
        let index = MetadataIndex::build(&sample_table(), &EngineConfig::default()).unwrap();
        assert_eq!(index.rows("S1", "walk"), Some(&[1, 3][..]));
        assert_eq!(index.rows("S2", "run"), Some(&[0][..]));
        assert_eq!(index.rows("S1", "run"), None);
        let pairs = index.pairs().collect::<Vec<_>>();
        assert_eq!(pairs, [("S1", "walk"), ("S2", "run"), ("S2", "walk")]);
    }

    #[test]
    fn test_missing_task_column() {
        let table = Table::new(vec![("subject".into(), text(&["S1"]))]).unwrap();
        let err = MetadataIndex::build(&table, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, IndexError::MissingColumn { column } if column == "task"));
    }

    #[test]
    fn test_numeric_subject_column_is_rejected() {
        let table = Table::new(vec![
            ("subject".into(), Column::Numeric(vec![1.0])),
            ("task".into(), text(&["walk"])),
        ])
        .unwrap();
        let err = MetadataIndex::build(&table, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, IndexError::NotTextColumn { column } if column == "subject"));
    }

    #[test]
    fn test_text_phase_column_is_rejected() {
        let table = Table::new(vec![
            ("subject".into(), text(&["S1"])),
            ("task".into(), text(&["walk"])),
            ("phase".into(), text(&["0%"])),
        ])
        .unwrap();
        let err = MetadataIndex::build(&table, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, IndexError::NotNumericColumn { .. }));
    }
}
