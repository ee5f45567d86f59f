//! Graph dataset loading with schema + invariant validation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use rand::Rng;
use serde_json::Value;
use tracing::info;

use crate::core::graph::{GraphInstance, GraphRecord};
use crate::games::GameKind;

const DATASET_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../schemas/graph_dataset/v1.schema.json"
));

/// `<data_dir>/<game folder>/<game prefix>_<param>.json`
pub fn dataset_path(data_dir: &Path, game: GameKind, param: &str) -> PathBuf {
    data_dir
        .join(game.dataset_folder())
        .join(format!("{}_{}.json", game.dataset_prefix(), param))
}

/// Immutable, indexed collection of validated graph instances.
#[derive(Debug, Clone)]
pub struct GraphInstanceStore {
    instances: Vec<GraphInstance>,
    nb_subtask_type: usize,
}

impl GraphInstanceStore {
    /// Load every record of a dataset file.
    ///
    /// Any parse, schema or invariant failure is fatal; every violation is
    /// reported with the index of its record.
    pub fn load(path: &Path, nb_subtask_type: usize) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read dataset {}", path.display()))?;
        let value: Value = serde_json::from_str(&contents)
            .with_context(|| format!("parse dataset {}", path.display()))?;
        validate_schema(&value).with_context(|| format!("validate dataset {}", path.display()))?;
        let records: Vec<GraphRecord> = serde_json::from_value(value)
            .with_context(|| format!("deserialize dataset {}", path.display()))?;

        let store = Self::from_records(records, nb_subtask_type)
            .with_context(|| format!("validate dataset {}", path.display()))?;
        info!(path = %path.display(), count = store.len(), "loaded graph dataset");
        Ok(store)
    }

    /// Build a store from in-memory records, checking graph invariants.
    pub fn from_records(records: Vec<GraphRecord>, nb_subtask_type: usize) -> Result<Self> {
        let mut instances = Vec::with_capacity(records.len());
        let mut errors = Vec::new();
        for (index, record) in records.into_iter().enumerate() {
            match GraphInstance::from_record(record, nb_subtask_type) {
                Ok(graph) => instances.push(graph),
                Err(messages) => errors.extend(
                    messages
                        .into_iter()
                        .map(|msg| format!("graph {}: {}", index, msg)),
                ),
            }
        }
        if !errors.is_empty() {
            return Err(anyhow!("graph invariants failed: {}", errors.join("; ")));
        }
        Ok(Self {
            instances,
            nb_subtask_type,
        })
    }

    /// Size of the subtask-kind id space the records were validated against.
    pub fn nb_subtask_type(&self) -> usize {
        self.nb_subtask_type
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Graph at `index` modulo the store size; `None` only when empty.
    pub fn select(&self, index: usize) -> Option<(usize, &GraphInstance)> {
        if self.instances.is_empty() {
            return None;
        }
        let index = index % self.instances.len();
        Some((index, &self.instances[index]))
    }

    /// Uniformly random graph; `None` only when empty.
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(usize, &GraphInstance)> {
        if self.instances.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.instances.len());
        Some((index, &self.instances[index]))
    }

    pub fn iter(&self) -> impl Iterator<Item = &GraphInstance> {
        self.instances.iter()
    }
}

fn validate_schema(dataset: &Value) -> Result<()> {
    let schema_value: Value =
        serde_json::from_str(DATASET_SCHEMA).context("parse embedded dataset schema")?;
    let compiled =
        validator_for(&schema_value).map_err(|err| anyhow!("invalid schema: {}", err))?;
    if !compiled.is_valid(dataset) {
        let messages = compiled
            .iter_errors(dataset)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!(
            "dataset schema validation failed: {}",
            messages.join("; ")
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::test_support::{flat_record, worked_example_record, write_dataset, write_raw_dataset};

    #[test]
    fn load_reports_count_and_preserves_order() {
        let mut second = flat_record(&[4, 5], 0.5);
        second.reward = vec![0.5, 0.7];
        let dataset = write_dataset(
            GameKind::Mining,
            "train_1",
            &[worked_example_record(), second],
        );
        let store = GraphInstanceStore::load(&dataset.path, 26).expect("load");
        assert_eq!(store.len(), 2);
        let (_, graph) = store.select(1).expect("graph");
        assert_eq!(graph.subtask_ids(), &[4, 5]);
    }

    #[test]
    fn dataset_path_matches_layout() {
        let dataset = write_dataset(GameKind::Playground, "eval", &[worked_example_record()]);
        assert_eq!(
            dataset_path(dataset.data_dir(), GameKind::Playground, "eval"),
            dataset.path
        );
    }

    #[test]
    fn select_wraps_modulo_count() {
        let store = GraphInstanceStore::from_records(
            vec![flat_record(&[0], 1.0), flat_record(&[1], 1.0), flat_record(&[2], 1.0)],
            3,
        )
        .expect("store");
        assert_eq!(store.select(4).map(|(i, _)| i), Some(1));
        assert_eq!(store.select(3).map(|(i, _)| i), Some(0));
        let (_, graph) = store.select(5).expect("graph");
        assert_eq!(graph.subtask_ids(), &[2]);
    }

    #[test]
    fn random_selection_stays_in_range() {
        let store = GraphInstanceStore::from_records(
            vec![flat_record(&[0], 1.0), flat_record(&[1], 1.0)],
            2,
        )
        .expect("store");
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let (index, _) = store.random(&mut rng).expect("graph");
            assert!(index < 2);
        }
    }

    #[test]
    fn empty_store_selects_nothing() {
        let dataset = write_raw_dataset(GameKind::Mining, "empty", "[]");
        let store = GraphInstanceStore::load(&dataset.path, 26).expect("load");
        assert!(store.is_empty());
        assert!(store.select(0).is_none());
        assert!(store.random(&mut StdRng::seed_from_u64(0)).is_none());
    }

    #[test]
    fn missing_file_is_fatal() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = GraphInstanceStore::load(&temp.path().join("none.json"), 26).expect_err("err");
        assert!(format!("{:#}", err).contains("read dataset"));
    }

    #[test]
    fn schema_violation_is_fatal() {
        let dataset = write_raw_dataset(
            GameKind::Mining,
            "bad",
            r#"[{"subtask_ids": [0], "num_or": [1], "num_and": [], "and_mat": [], "or_mat": [[]], "reward": [1.0], "extra": 1}]"#,
        );
        let err = GraphInstanceStore::load(&dataset.path, 26).expect_err("err");
        assert!(format!("{:#}", err).contains("schema validation failed"));
    }

    #[test]
    fn literal_outside_range_fails_schema() {
        let mut record = worked_example_record();
        record.and_mat[0][0] = 3;
        let dataset = write_dataset(GameKind::Mining, "bad", &[record]);
        let err = GraphInstanceStore::load(&dataset.path, 26).expect_err("err");
        assert!(format!("{:#}", err).contains("schema validation failed"));
    }

    #[test]
    fn invariant_violation_names_the_graph() {
        let mut record = worked_example_record();
        record.subtask_ids = vec![0, 1, 40];
        let dataset = write_dataset(
            GameKind::Mining,
            "bad",
            &[worked_example_record(), record],
        );
        let err = GraphInstanceStore::load(&dataset.path, 26).expect_err("err");
        let message = format!("{:#}", err);
        assert!(message.contains("graph 1"), "{message}");
        assert!(message.contains("subtask id 40"), "{message}");
    }
}
