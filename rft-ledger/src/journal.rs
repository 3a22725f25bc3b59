use bincode;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rft_core::error::LedgerError;
use rft_core::event::LedgerEvent;

/// A single journaled event with its capture time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// The normalized event as the engine emitted it
    pub event: LedgerEvent,

    /// Capture time in milliseconds since the Unix epoch
    pub recorded_at: i64,
}

/// An append-only file journal of ledger events.
///
/// Entries are length-prefixed bincode records. The engine records while
/// holding the arena lock, so journal order is operation order.
pub struct FileEventJournal {
    /// Path to the journal file
    path: Arc<Mutex<PathBuf>>,

    /// File handle for writing
    file: Arc<Mutex<Option<BufWriter<File>>>>,
}

impl FileEventJournal {
    /// Create a journal that is not yet bound to a file
    pub fn new() -> Self {
        Self {
            path: Arc::new(Mutex::new(PathBuf::new())),
            file: Arc::new(Mutex::new(None)),
        }
    }

    /// Create or open the journal file at `path` for appending
    pub fn open(&self, path: &Path) -> Result<(), LedgerError> {
        let mut file_guard = self
            .file
            .lock()
            .map_err(|e| LedgerError::Journal(format!("Failed to acquire lock: {}", e)))?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)
            .map_err(|e| LedgerError::Journal(format!("Failed to open journal file: {}", e)))?;

        let writer = BufWriter::new(file);

        // Store the file writer
        *file_guard = Some(writer);

        // Store the path
        let mut path_guard = self
            .path
            .lock()
            .map_err(|e| LedgerError::Journal(format!("Failed to acquire path lock: {}", e)))?;
        *path_guard = path.to_path_buf();

        Ok(())
    }

    /// Append a batch of events, stamped with the current time.
    ///
    /// The batch is flushed as a unit; nothing is visible to readers until
    /// every event in it has been written.
    pub fn record(&self, events: &[LedgerEvent]) -> Result<(), LedgerError> {
        let mut file_guard = self
            .file
            .lock()
            .map_err(|e| LedgerError::Journal(format!("Failed to acquire lock: {}", e)))?;

        let file = file_guard
            .as_mut()
            .ok_or_else(|| LedgerError::Journal("Journal has not been opened".to_string()))?;

        let recorded_at = Utc::now().timestamp_millis();
        for event in events {
            let entry = JournalEntry {
                event: event.clone(),
                recorded_at,
            };
            let serialized = bincode::serialize(&entry)?;

            // Write the entry length and data
            let entry_len = serialized.len() as u64;
            file.write_all(&entry_len.to_le_bytes())?;
            file.write_all(&serialized)?;
        }
        file.flush()?;

        Ok(())
    }

    /// Iterate over all recorded entries in write order
    pub fn iter_entries(&self) -> Box<dyn Iterator<Item = Result<JournalEntry, LedgerError>> + '_> {
        // Get the path
        let path_guard = match self.path.lock() {
            Ok(guard) => guard,
            Err(_) => return Box::new(std::iter::empty()),
        };
        let path = path_guard.clone();
        drop(path_guard);

        // Create a new file reader
        let result = File::open(&path).map(|file| JournalEntryIterator {
            reader: BufReader::new(file),
        });

        match result {
            Ok(iterator) => Box::new(iterator),
            Err(_) => {
                // Return an empty iterator if we can't open the file
                Box::new(std::iter::empty::<Result<JournalEntry, LedgerError>>())
            }
        }
    }
}

impl Default for FileEventJournal {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over journal entries
struct JournalEntryIterator {
    reader: BufReader<File>,
}

impl Iterator for JournalEntryIterator {
    type Item = Result<JournalEntry, LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        // Read the entry length
        let mut len_buf = [0u8; 8];
        match self.reader.read_exact(&mut len_buf) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                // End of file
                return None;
            }
            Err(e) => {
                return Some(Err(LedgerError::from(e)));
            }
        }

        let entry_len = u64::from_le_bytes(len_buf);

        // Read the entry data
        let mut entry_data = vec![0u8; entry_len as usize];
        if let Err(e) = self.reader.read_exact(&mut entry_data) {
            return Some(Err(LedgerError::from(e)));
        }

        // Deserialize the entry
        match bincode::deserialize(&entry_data) {
            Ok(entry) => Some(Ok(entry)),
            Err(e) => Some(Err(LedgerError::from(e))),
        }
    }
}
