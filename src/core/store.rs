//! Record store - durable CSV tables behind an explicit transaction boundary
//!
//! Every table is a flat CSV file with a header row. A mutating operation runs
//! inside [`transact`]: the store lock is taken, all tables are loaded into a
//! [`Snapshot`], the operation mutates the snapshot, and only tables it touched
//! are written back. An operation that returns an error leaves the store
//! untouched.
//!
//! [`CsvStore`] commits a batch through a journal: tables are staged as
//! `<table>.csv.tmp`, the journal names them, then the renames run. A batch
//! cut short after the journal is finished by the next [`RecordStore::lock`].

use fs2::FileExt;
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::core::access::User;
use crate::core::entity::Record;
use crate::entities::{
    ConsumableIssue, Department, Item, LedgerEntry, PllEntry, Request, ReturnRecord, Survey,
    WriteOff,
};

/// Name of the advisory lock file inside a CSV data directory
pub const LOCK_FILE: &str = ".dlms.lock";

/// Commit journal listing staged tables while a multi-table write is in flight
pub const JOURNAL_FILE: &str = ".dlms.commit";

/// Fixed table identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableId {
    Users,
    Items,
    Departments,
    Requests,
    Ledger,
    Pll,
    Summary,
    Returns,
    Surveys,
    WriteOffs,
}

impl TableId {
    pub fn all() -> &'static [TableId] {
        &[
            TableId::Users,
            TableId::Items,
            TableId::Departments,
            TableId::Requests,
            TableId::Ledger,
            TableId::Pll,
            TableId::Summary,
            TableId::Returns,
            TableId::Surveys,
            TableId::WriteOffs,
        ]
    }

    /// File name of the table inside a data directory
    pub fn file_name(&self) -> &'static str {
        match self {
            TableId::Users => "users.csv",
            TableId::Items => "items.csv",
            TableId::Departments => "departments.csv",
            TableId::Requests => "s156.csv",
            TableId::Ledger => "ledger.csv",
            TableId::Pll => "pll.csv",
            TableId::Summary => "summary.csv",
            TableId::Returns => "returns.csv",
            TableId::Surveys => "survey.csv",
            TableId::WriteOffs => "writeoff.csv",
        }
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.file_name().trim_end_matches(".csv");
        f.write_str(name)
    }
}

/// Errors raised by the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed {table} table: {message}")]
    Csv { table: TableId, message: String },

    #[error("Could not lock data directory {path}: {source}")]
    Lock { path: PathBuf, source: io::Error },
}

/// Persistence collaborator
///
/// A store hands out raw CSV text per table and accepts a batch of rewritten
/// tables. Callers hold the guard returned by [`RecordStore::lock`] for the
/// whole read-modify-write cycle.
pub trait RecordStore {
    type Guard<'a>
    where
        Self: 'a;

    /// Acquire the store-wide exclusive lock
    fn lock(&self) -> Result<Self::Guard<'_>, StoreError>;

    /// Raw contents of a table, `None` if the table has never been written
    fn read_table(&self, table: TableId) -> Result<Option<String>, StoreError>;

    /// Replace the given tables
    fn write_tables(&self, tables: &[(TableId, String)]) -> Result<(), StoreError>;
}

/// Decode CSV text into rows
pub fn decode_rows<T: Record>(content: &str) -> Result<Vec<T>, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(content.as_bytes());

    reader
        .deserialize()
        .map(|row| {
            row.map_err(|e| StoreError::Csv {
                table: T::TABLE,
                message: e.to_string(),
            })
        })
        .collect()
}

/// Encode rows as CSV text with a header row
pub fn encode_rows<T: Record>(rows: &[T]) -> Result<String, StoreError> {
    let csv_err = |message: String| StoreError::Csv {
        table: T::TABLE,
        message,
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row).map_err(|e| csv_err(e.to_string()))?;
    }
    let bytes = writer.into_inner().map_err(|e| csv_err(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| csv_err(e.to_string()))
}

/// In-memory copy of one table
#[derive(Debug, Clone)]
pub struct Table<T: Record> {
    rows: Vec<T>,
    dirty: bool,
}

impl<T: Record> Default for Table<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: Record> Table<T> {
    pub fn new(rows: Vec<T>) -> Self {
        Self { rows, dirty: false }
    }

    fn load<S: RecordStore + ?Sized>(store: &S) -> Result<Self, StoreError> {
        let rows = match store.read_table(T::TABLE)? {
            Some(content) => decode_rows(&content)?,
            None => Vec::new(),
        };
        trace!(table = %T::TABLE, rows = rows.len(), "loaded table");
        Ok(Self::new(rows))
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether the table was modified since it was loaded
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn find(&self, key: &T::Key) -> Option<&T> {
        self.rows.iter().find(|r| r.key() == *key)
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.find(key).is_some()
    }

    /// Append a row, returning its key
    pub fn append(&mut self, row: T) -> T::Key {
        let key = row.key();
        self.rows.push(row);
        self.dirty = true;
        key
    }

    /// Apply `f` to the row with the given key; returns false if absent
    pub fn update<F>(&mut self, key: &T::Key, f: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        match self.rows.iter_mut().find(|r| r.key() == *key) {
            Some(row) => {
                f(row);
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    fn encode_if_dirty(&self) -> Result<Option<(TableId, String)>, StoreError> {
        if !self.dirty {
            return Ok(None);
        }
        Ok(Some((T::TABLE, encode_rows(&self.rows)?)))
    }
}

/// All tables as loaded at the start of one operation
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub users: Table<User>,
    pub items: Table<Item>,
    pub departments: Table<Department>,
    pub requests: Table<Request>,
    pub ledger: Table<LedgerEntry>,
    pub pll: Table<PllEntry>,
    pub consumables: Table<ConsumableIssue>,
    pub returns: Table<ReturnRecord>,
    pub surveys: Table<Survey>,
    pub write_offs: Table<WriteOff>,
}

impl Snapshot {
    /// Load every table from the store
    pub fn load<S: RecordStore + ?Sized>(store: &S) -> Result<Self, StoreError> {
        Ok(Self {
            users: Table::load(store)?,
            items: Table::load(store)?,
            departments: Table::load(store)?,
            requests: Table::load(store)?,
            ledger: Table::load(store)?,
            pll: Table::load(store)?,
            consumables: Table::load(store)?,
            returns: Table::load(store)?,
            surveys: Table::load(store)?,
            write_offs: Table::load(store)?,
        })
    }

    /// Encoded contents of every modified table
    pub fn dirty_tables(&self) -> Result<Vec<(TableId, String)>, StoreError> {
        let encoded = [
            self.users.encode_if_dirty()?,
            self.items.encode_if_dirty()?,
            self.departments.encode_if_dirty()?,
            self.requests.encode_if_dirty()?,
            self.ledger.encode_if_dirty()?,
            self.pll.encode_if_dirty()?,
            self.consumables.encode_if_dirty()?,
            self.returns.encode_if_dirty()?,
            self.surveys.encode_if_dirty()?,
            self.write_offs.encode_if_dirty()?,
        ];
        Ok(encoded.into_iter().flatten().collect())
    }
}

/// Run `op` as one read-modify-write transaction
///
/// The snapshot is committed only when `op` succeeds.
pub fn transact<S, R, E, F>(store: &S, op: F) -> Result<R, E>
where
    S: RecordStore + ?Sized,
    E: From<StoreError>,
    F: FnOnce(&mut Snapshot) -> Result<R, E>,
{
    let _guard = store.lock()?;
    let mut snapshot = Snapshot::load(store)?;
    debug!("transaction begin");

    let result = match op(&mut snapshot) {
        Ok(result) => result,
        Err(e) => {
            debug!("transaction aborted");
            return Err(e);
        }
    };

    let dirty = snapshot.dirty_tables()?;
    if !dirty.is_empty() {
        store.write_tables(&dirty)?;
    }
    debug!(tables = dirty.len(), "transaction committed");
    Ok(result)
}

/// Run a read-only view against a consistent snapshot
pub fn read<S, R, F>(store: &S, view: F) -> Result<R, StoreError>
where
    S: RecordStore + ?Sized,
    F: FnOnce(&Snapshot) -> R,
{
    let _guard = store.lock()?;
    let snapshot = Snapshot::load(store)?;
    Ok(view(&snapshot))
}

/// Tables stored as CSV files in a directory
#[derive(Debug, Clone)]
pub struct CsvStore {
    root: PathBuf,
}

/// Exclusive advisory lock on a data directory, released on drop
pub struct DirLock {
    file: File,
}

impl Drop for DirLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl CsvStore {
    /// Open a data directory, creating it if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn table_path(&self, table: TableId) -> PathBuf {
        self.root.join(table.file_name())
    }

    /// Whether any table file exists yet
    pub fn is_initialized(&self) -> bool {
        TableId::all().iter().any(|t| self.table_path(*t).exists())
    }
}

impl RecordStore for CsvStore {
    type Guard<'a> = DirLock;

    fn lock(&self) -> Result<Self::Guard<'_>, StoreError> {
        let path = self.root.join(LOCK_FILE);
        let lock_err = |source| StoreError::Lock {
            path: path.clone(),
            source,
        };
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(lock_err)?;
        file.lock_exclusive().map_err(lock_err)?;
        let guard = DirLock { file };
        self.recover()?;
        Ok(guard)
    }

    fn read_table(&self, table: TableId) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.table_path(table)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_tables(&self, tables: &[(TableId, String)]) -> Result<(), StoreError> {
        let mut staged = Vec::with_capacity(tables.len());
        for (table, content) in tables {
            let target = self.table_path(*table);
            let tmp = staging_path(&target);
            if let Err(e) = write_synced(&tmp, content) {
                if tmp.is_file() {
                    let _ = fs::remove_file(&tmp);
                }
                for (tmp, _) in &staged {
                    let _ = fs::remove_file(tmp);
                }
                return Err(e.into());
            }
            staged.push((tmp, target));
        }

        // Once the journal is in place the commit is decided; an interrupted
        // rename loop is finished by the next `lock`
        let manifest: String = tables
            .iter()
            .map(|(table, _)| format!("{}\n", table.file_name()))
            .collect();
        let journal = self.root.join(JOURNAL_FILE);
        let journal_tmp = staging_path(&journal);
        write_synced(&journal_tmp, &manifest)?;
        fs::rename(&journal_tmp, &journal)?;

        for (tmp, target) in staged {
            fs::rename(&tmp, &target)?;
            trace!(path = %target.display(), "table written");
        }
        fs::remove_file(&journal)?;
        Ok(())
    }
}

impl CsvStore {
    /// Finish a commit left behind by an interrupted writer, or discard its
    /// staged files if it never reached the journal
    fn recover(&self) -> Result<(), StoreError> {
        let journal = self.root.join(JOURNAL_FILE);
        let manifest = match fs::read_to_string(&journal) {
            Ok(manifest) => manifest,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                for table in TableId::all() {
                    let tmp = staging_path(&self.table_path(*table));
                    if tmp.is_file() {
                        warn!(path = %tmp.display(), "discarding uncommitted table");
                        fs::remove_file(&tmp)?;
                    }
                }
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        for name in manifest.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let target = self.root.join(name);
            let tmp = staging_path(&target);
            if tmp.is_file() {
                fs::rename(&tmp, &target)?;
                warn!(path = %target.display(), "rolled forward interrupted commit");
            }
        }
        fs::remove_file(&journal)?;
        debug!(root = %self.root.display(), "commit journal replayed");
        Ok(())
    }
}

fn staging_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_synced(path: &Path, content: &str) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()
}

/// Tables held in memory, for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryStore {
    write_lock: Mutex<()>,
    tables: RwLock<HashMap<TableId, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    type Guard<'a> = MutexGuard<'a, ()>;

    fn lock(&self) -> Result<Self::Guard<'_>, StoreError> {
        Ok(self.write_lock.lock())
    }

    fn read_table(&self, table: TableId) -> Result<Option<String>, StoreError> {
        Ok(self.tables.read().get(&table).cloned())
    }

    fn write_tables(&self, tables: &[(TableId, String)]) -> Result<(), StoreError> {
        let mut guard = self.tables.write();
        for (table, content) in tables {
            guard.insert(*table, content.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::ItemType;
    use tempfile::tempdir;

    fn chair(stock: u32) -> Item {
        Item {
            name: "Chair".to_string(),
            ledger_name: "Furniture".to_string(),
            folio_number: "F-12".to_string(),
            item_type: ItemType::Permanent,
            stock,
        }
    }

    #[test]
    fn test_codec_reads_what_it_writes() {
        let rows = vec![chair(10)];
        let text = encode_rows(&rows).unwrap();
        assert!(text.starts_with("name,ledger_name,folio_number,item_type,stock"));
        let back: Vec<Item> = decode_rows(&text).unwrap();
        assert_eq!(back[0].stock, 10);
        assert_eq!(back[0].item_type, ItemType::Permanent);
    }

    #[test]
    fn test_decode_reports_table_on_error() {
        let text = "name,ledger_name,folio_number,item_type,stock\nChair,F,1,Permanent,-3\n";
        let err = decode_rows::<Item>(text).unwrap_err();
        assert!(matches!(err, StoreError::Csv { table: TableId::Items, .. }));
    }

    #[test]
    fn test_missing_table_loads_empty() {
        let store = MemoryStore::new();
        let snapshot = Snapshot::load(&store).unwrap();
        assert!(snapshot.items.is_empty());
        assert!(snapshot.dirty_tables().unwrap().is_empty());
    }

    #[test]
    fn test_table_update_marks_dirty() {
        let mut table = Table::new(vec![chair(10)]);
        assert!(!table.is_dirty());
        assert!(!table.update(&"Desk".to_string(), |i| i.stock = 0));
        assert!(!table.is_dirty());
        assert!(table.update(&"Chair".to_string(), |i| i.stock = 4));
        assert!(table.is_dirty());
        assert_eq!(table.find(&"Chair".to_string()).unwrap().stock, 4);
    }

    #[test]
    fn test_transact_commits_only_on_success() {
        let store = MemoryStore::new();

        let result: Result<(), StoreError> = transact(&store, |snap| {
            snap.items.append(chair(5));
            Ok(())
        });
        result.unwrap();

        let aborted: Result<(), StoreError> = transact(&store, |snap| {
            snap.items.update(&"Chair".to_string(), |i| i.stock = 0);
            Err(StoreError::Io(io::Error::other("boom")))
        });
        assert!(aborted.is_err());

        let stock = read(&store, |snap| snap.items.rows()[0].stock).unwrap();
        assert_eq!(stock, 5);
    }

    #[test]
    fn test_csv_store_persists_tables() {
        let tmp = tempdir().unwrap();
        let store = CsvStore::open(tmp.path().join("data")).unwrap();
        assert!(!store.is_initialized());

        let result: Result<(), StoreError> = transact(&store, |snap| {
            snap.items.append(chair(3));
            Ok(())
        });
        result.unwrap();

        assert!(store.is_initialized());
        let content = fs::read_to_string(store.table_path(TableId::Items)).unwrap();
        assert!(content.contains("Chair,Furniture,F-12,Permanent,3"));
        assert!(!store.table_path(TableId::Requests).exists());

        let reopened = CsvStore::open(store.root()).unwrap();
        let count = read(&reopened, |snap| snap.items.len()).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_codec_keeps_padding_in_free_text() {
        let mut item = chair(2);
        item.folio_number = "  F-12  ".to_string();
        let text = encode_rows(&[item]).unwrap();
        let back: Vec<Item> = decode_rows(&text).unwrap();
        assert_eq!(back[0].folio_number, "  F-12  ");
    }

    fn batch() -> Vec<(TableId, String)> {
        vec![
            (TableId::Requests, "REQ-RECEIVED".to_string()),
            (TableId::Ledger, "LEDGER".to_string()),
            (TableId::Pll, "PLL".to_string()),
        ]
    }

    #[test]
    fn test_interrupted_commit_rolls_forward_on_next_lock() {
        let tmp = tempdir().unwrap();
        let store = CsvStore::open(tmp.path().join("data")).unwrap();

        // A non-empty directory in place of pll.csv makes its rename fail
        let blocker = store.table_path(TableId::Pll);
        fs::create_dir(&blocker).unwrap();
        fs::write(blocker.join("keep"), "x").unwrap();

        assert!(store.write_tables(&batch()).is_err());
        assert!(store.root().join(JOURNAL_FILE).exists());
        assert!(store.table_path(TableId::Pll).is_dir());

        fs::remove_dir_all(&blocker).unwrap();
        drop(store.lock().unwrap());

        assert!(!store.root().join(JOURNAL_FILE).exists());
        assert_eq!(store.read_table(TableId::Requests).unwrap().as_deref(), Some("REQ-RECEIVED"));
        assert_eq!(store.read_table(TableId::Ledger).unwrap().as_deref(), Some("LEDGER"));
        assert_eq!(store.read_table(TableId::Pll).unwrap().as_deref(), Some("PLL"));
        for table in [TableId::Requests, TableId::Ledger, TableId::Pll] {
            assert!(!staging_path(&store.table_path(table)).exists());
        }
    }

    #[test]
    fn test_failed_staging_leaves_originals_and_no_temp_files() {
        let tmp = tempdir().unwrap();
        let store = CsvStore::open(tmp.path().join("data")).unwrap();
        store
            .write_tables(&[
                (TableId::Requests, "REQ-OLD".to_string()),
                (TableId::Ledger, "LEDGER-OLD".to_string()),
            ])
            .unwrap();

        // A directory where the ledger's staging file would go
        fs::create_dir(staging_path(&store.table_path(TableId::Ledger))).unwrap();

        assert!(store.write_tables(&batch()).is_err());
        assert!(!store.root().join(JOURNAL_FILE).exists());
        assert!(!staging_path(&store.table_path(TableId::Requests)).exists());
        assert_eq!(store.read_table(TableId::Requests).unwrap().as_deref(), Some("REQ-OLD"));
        assert_eq!(store.read_table(TableId::Ledger).unwrap().as_deref(), Some("LEDGER-OLD"));
        assert_eq!(store.read_table(TableId::Pll).unwrap(), None);
    }

    #[test]
    fn test_lock_discards_staged_files_without_journal() {
        let tmp = tempdir().unwrap();
        let store = CsvStore::open(tmp.path().join("data")).unwrap();
        store.write_tables(&[(TableId::Items, "OLD".to_string())]).unwrap();
        let staged = staging_path(&store.table_path(TableId::Items));
        fs::write(&staged, "HALF").unwrap();

        drop(store.lock().unwrap());

        assert!(!staged.exists());
        assert_eq!(store.read_table(TableId::Items).unwrap().as_deref(), Some("OLD"));
    }
}
