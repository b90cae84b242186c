//! Record storage: file-backed collection loading with a per-store
//! cache.
//!
//! Collections live as flat JSON files on disk, one object per file:
//! - data bag `name` → `<data_bag_root>/<name>/*.json`
//! - nodes → `<node_root>/*.json`
//! - roles → `<role_root>/*.json`
//!
//! Enumeration is non-recursive and restricted to `*.json`; files are
//! visited in name order so repeated loads see the same sequence. A
//! missing collection directory is an empty collection, not an error.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use tracing::debug;

use crate::models::{CollectionRef, Record, StoreError};

/// Pluggable record source consumed by the search engine.
///
/// The engine borrows a source per call; implementations own whatever
/// caching they need for the span of one session or process run, and
/// nothing is assumed fresh across restarts.
pub trait RecordSource {
    /// Load all records of `collection`, in the source's load order.
    fn load(&mut self, collection: &CollectionRef) -> Result<&[Record], StoreError>;
}

/// Filesystem roots consulted for each collection kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding one subdirectory per data bag.
    pub data_bag_root: PathBuf,
    /// Directory holding node record files.
    pub node_root: PathBuf,
    /// Directory holding role record files.
    pub role_root: PathBuf,
}

impl StoreConfig {
    pub fn new(
        data_bag_root: impl Into<PathBuf>,
        node_root: impl Into<PathBuf>,
        role_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            data_bag_root: data_bag_root.into(),
            node_root: node_root.into(),
            role_root: role_root.into(),
        }
    }

    /// Conventional kitchen layout: `data_bags/`, `nodes/`, and
    /// `roles/` under `base`.
    pub fn rooted_at(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self::new(
            base.join("data_bags"),
            base.join("nodes"),
            base.join("roles"),
        )
    }
}

/// File-backed `RecordSource` with a per-collection cache.
///
/// Each collection is scanned and parsed at most once per store
/// lifetime; later loads serve the cached snapshot even if the files
/// change underneath.
pub struct FileStore {
    config: StoreConfig,
    cache: HashMap<CollectionRef, Vec<Record>>,
}

impl FileStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            cache: HashMap::new(),
        }
    }

    /// Record ids of a collection, in load order.
    ///
    /// Records without a string `id` field are skipped.
    pub fn record_ids(&mut self, collection: &CollectionRef) -> Result<Vec<String>, StoreError> {
        Ok(self
            .load(collection)?
            .iter()
            .filter_map(|record| record.id().map(str::to_string))
            .collect())
    }

    fn collection_dir(&self, collection: &CollectionRef) -> PathBuf {
        match collection {
            CollectionRef::Node => self.config.node_root.clone(),
            CollectionRef::Role => self.config.role_root.clone(),
            CollectionRef::DataBag(name) => self.config.data_bag_root.join(name),
        }
    }
}

impl RecordSource for FileStore {
    fn load(&mut self, collection: &CollectionRef) -> Result<&[Record], StoreError> {
        if !self.cache.contains_key(collection) {
            let dir = self.collection_dir(collection);
            // Only data bags carry id-keyed items; nodes and roles are
            // taken as-is.
            let dedup = matches!(collection, CollectionRef::DataBag(_));
            let records = load_dir(&dir, dedup)?;
            debug!(
                collection = %collection,
                dir = %dir.display(),
                count = records.len(),
                "loaded collection"
            );
            self.cache.insert(collection.clone(), records);
        }

        Ok(self
            .cache
            .get(collection)
            .expect("collection just loaded into cache")
            .as_slice())
    }
}

fn load_dir(dir: &Path, dedup_by_id: bool) -> Result<Vec<Record>, StoreError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut records: Vec<Record> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for path in enumerate_record_files(dir) {
        let record = read_record(&path)?;

        if dedup_by_id {
            if let Some(id) = record.id() {
                if let Some(&idx) = positions.get(id) {
                    // A later file with the same id replaces the
                    // earlier record, keeping its original position.
                    records[idx] = record;
                    continue;
                }
                positions.insert(id.to_string(), records.len());
            }
        }

        records.push(record);
    }

    Ok(records)
}

/// Direct children of `dir` matching the record file glob, sorted by
/// path for a reproducible load order.
fn enumerate_record_files(dir: &Path) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(dir)
        .max_depth(Some(1))
        .standard_filters(false)
        .hidden(true)
        .build();

    let mut paths = Vec::new();
    for entry in walker.flatten() {
        let path = entry.path();

        if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }

        let Some(name) = path.file_name() else {
            continue;
        };
        if record_file_glob().is_match(name) {
            paths.push(path.to_path_buf());
        }
    }

    paths.sort();
    paths
}

fn record_file_glob() -> &'static GlobSet {
    static GLOB: OnceLock<GlobSet> = OnceLock::new();
    GLOB.get_or_init(|| {
        let mut builder = GlobSetBuilder::new();
        builder.add(Glob::new("*.json").expect("static glob pattern"));
        builder.build().expect("static glob pattern")
    })
}

fn read_record(path: &Path) -> Result<Record, StoreError> {
    let file = File::open(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        fs::create_dir_all(dir).expect("create dir");
        fs::write(dir.join(name), contents).expect("write record file");
    }

    fn kitchen_store(base: &Path) -> FileStore {
        FileStore::new(StoreConfig::rooted_at(base))
    }

    #[test]
    fn loads_data_bag_records_in_file_name_order() {
        let dir = tempdir().expect("tempdir");
        let bag = dir.path().join("data_bags").join("users");
        write_file(&bag, "bob.json", r#"{"id": "bob"}"#);
        write_file(&bag, "alice.json", r#"{"id": "alice"}"#);
        write_file(&bag, "notes.txt", "not a record");

        let mut store = kitchen_store(dir.path());
        let records = store
            .load(&CollectionRef::DataBag("users".to_string()))
            .expect("load");

        let ids: Vec<_> = records.iter().filter_map(Record::id).collect();
        assert_eq!(ids, vec!["alice", "bob"]);
    }

    #[test]
    fn nodes_and_roles_use_their_own_roots() {
        let dir = tempdir().expect("tempdir");
        write_file(
            &dir.path().join("nodes"),
            "web1.json",
            r#"{"name": "web1.example.com"}"#,
        );
        write_file(
            &dir.path().join("roles"),
            "webserver.json",
            r#"{"name": "webserver"}"#,
        );

        let mut store = kitchen_store(dir.path());

        let nodes = store.load(&CollectionRef::Node).expect("nodes");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].get("name"), Some(&"web1.example.com".into()));

        let roles = store.load(&CollectionRef::Role).expect("roles");
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].get("name"), Some(&"webserver".into()));
    }

    #[test]
    fn missing_collection_directory_is_empty() {
        let dir = tempdir().expect("tempdir");
        let mut store = kitchen_store(dir.path());

        let records = store
            .load(&CollectionRef::DataBag("ghost".to_string()))
            .expect("load");
        assert!(records.is_empty());
    }

    #[test]
    fn duplicate_data_bag_ids_keep_first_position_latest_value() {
        let dir = tempdir().expect("tempdir");
        let bag = dir.path().join("data_bags").join("users");
        write_file(&bag, "a.json", r#"{"id": "alice", "color": "red"}"#);
        write_file(&bag, "b.json", r#"{"id": "bob"}"#);
        write_file(&bag, "c.json", r#"{"id": "alice", "color": "blue"}"#);

        let mut store = kitchen_store(dir.path());
        let records = store
            .load(&CollectionRef::DataBag("users".to_string()))
            .expect("load");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id(), Some("alice"));
        assert_eq!(records[0].get("color"), Some(&"blue".into()));
        assert_eq!(records[1].id(), Some("bob"));
    }

    #[test]
    fn nodes_are_not_deduplicated_by_id() {
        let dir = tempdir().expect("tempdir");
        let nodes = dir.path().join("nodes");
        write_file(&nodes, "a.json", r#"{"id": "twin"}"#);
        write_file(&nodes, "b.json", r#"{"id": "twin"}"#);

        let mut store = kitchen_store(dir.path());
        assert_eq!(store.load(&CollectionRef::Node).expect("load").len(), 2);
    }

    #[test]
    fn malformed_record_file_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let bag = dir.path().join("data_bags").join("users");
        write_file(&bag, "broken.json", "{ not json");

        let mut store = kitchen_store(dir.path());
        let err = store
            .load(&CollectionRef::DataBag("users".to_string()))
            .expect_err("must fail");
        assert!(matches!(err, StoreError::Parse { ref path, .. } if path.ends_with("broken.json")));
    }

    #[test]
    fn non_object_record_file_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let bag = dir.path().join("data_bags").join("users");
        write_file(&bag, "list.json", r#"[1, 2, 3]"#);

        let mut store = kitchen_store(dir.path());
        let err = store
            .load(&CollectionRef::DataBag("users".to_string()))
            .expect_err("must fail");
        assert!(matches!(err, StoreError::Parse { .. }));
    }

    #[test]
    fn cache_serves_the_first_snapshot_for_the_store_lifetime() {
        let dir = tempdir().expect("tempdir");
        let bag = dir.path().join("data_bags").join("users");
        write_file(&bag, "a.json", r#"{"id": "alice"}"#);

        let mut store = kitchen_store(dir.path());
        let collection = CollectionRef::DataBag("users".to_string());
        assert_eq!(store.load(&collection).expect("first load").len(), 1);

        // Changes on disk are invisible to this store instance; a
        // fresh store sees them.
        write_file(&bag, "b.json", r#"{"id": "bob"}"#);
        assert_eq!(store.load(&collection).expect("second load").len(), 1);

        let mut fresh = kitchen_store(dir.path());
        assert_eq!(fresh.load(&collection).expect("fresh load").len(), 2);
    }

    #[test]
    fn record_ids_skip_records_without_an_id() {
        let dir = tempdir().expect("tempdir");
        let nodes = dir.path().join("nodes");
        write_file(&nodes, "a.json", r#"{"id": "web1"}"#);
        write_file(&nodes, "b.json", r#"{"name": "anonymous"}"#);

        let mut store = kitchen_store(dir.path());
        assert_eq!(
            store.record_ids(&CollectionRef::Node).expect("ids"),
            vec!["web1".to_string()]
        );
    }

    #[test]
    fn nested_directories_are_not_scanned() {
        let dir = tempdir().expect("tempdir");
        let bag = dir.path().join("data_bags").join("users");
        write_file(&bag, "a.json", r#"{"id": "alice"}"#);
        write_file(&bag.join("nested"), "b.json", r#"{"id": "bob"}"#);

        let mut store = kitchen_store(dir.path());
        let records = store
            .load(&CollectionRef::DataBag("users".to_string()))
            .expect("load");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id(), Some("alice"));
    }
}
