//! On-disk dump/load (spec §6 "Persisted state layout"): an opaque
//! framed snapshot, not meant to survive schema changes across major
//! versions but stable within one.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::entry::{Entry, Millis};
use crate::error::CacheResult;

const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct DumpHeader {
    version: u32,
    entry_count: u64,
}

#[derive(Serialize, Deserialize)]
struct DumpRecord<K, V> {
    key: K,
    touched: Millis,
    ttl_millis: Option<u64>,
    value: V,
}

#[derive(Serialize, Deserialize)]
struct DumpFile<K, V> {
    header: DumpHeader,
    records: Vec<DumpRecord<K, V>>,
}

/// Serialize `entries` to `path` as a framed snapshot (spec §6).
pub fn dump<K, V>(path: &Path, entries: Vec<(K, Entry<V>)>) -> CacheResult<()>
where
    K: Serialize,
    V: Serialize,
{
    let records: Vec<DumpRecord<K, V>> = entries
        .into_iter()
        .map(|(key, entry)| DumpRecord {
            key,
            touched: entry.touched,
            ttl_millis: entry.ttl.map(|d| d.as_millis() as u64),
            value: entry.value,
        })
        .collect();

    let file = DumpFile {
        header: DumpHeader {
            version: FORMAT_VERSION,
            entry_count: records.len() as u64,
        },
        records,
    };

    let bytes = bincode::serialize(&file)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Deserialize a framed snapshot back into `(key, entry)` pairs. Does
/// not itself decide whether to clear the destination cache first —
/// that's the caller's choice (spec §6: "loading is additive... unless
/// the caller requests a prior clear").
pub fn load<K, V>(path: &Path) -> CacheResult<Vec<(K, Entry<V>)>>
where
    K: for<'de> Deserialize<'de>,
    V: for<'de> Deserialize<'de>,
{
    let bytes = std::fs::read(path)?;
    let file: DumpFile<K, V> = bincode::deserialize(&bytes)?;

    Ok(file
        .records
        .into_iter()
        .map(|record| {
            (
                record.key,
                Entry {
                    touched: record.touched,
                    ttl: record.ttl_millis.map(std::time::Duration::from_millis),
                    value: record.value,
                },
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn dump_then_load_roundtrips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.bin");

        let entries = vec![
            ("a".to_string(), Entry::new(1, None, 10)),
            ("b".to_string(), Entry::new(2, Some(std::time::Duration::from_secs(1)), 20)),
        ];

        dump(&path, entries).unwrap();
        let loaded: Vec<(String, Entry<i32>)> = load(&path).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].0, "a");
        assert_eq!(loaded[0].1.value, 1);
        assert_eq!(loaded[1].1.ttl, Some(std::time::Duration::from_secs(1)));
    }
}
