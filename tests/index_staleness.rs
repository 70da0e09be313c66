//! Index acquisition policy: rebuild when stale, load when fresh.

use std::fs::{File, FileTimes};
use std::io::Write as _;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use vartag::IntervalIndex;

const DATA_V1: &str = "chr1\t100\t200\tgeneA\n";
const DATA_V2: &str = "chr1\t100\t200\tgeneA\nchr2\t10\t20\tgeneB\n";

fn write_file(path: &Path, contents: &str) {
    let mut file = File::create(path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
}

fn set_mtime(path: &Path, when: SystemTime) {
    let file = File::options().write(true).open(path).unwrap();
    file.set_times(FileTimes::new().set_modified(when)).unwrap();
}

#[test]
fn test_data_newer_than_index_triggers_rebuild() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("x.bed");
    let sidecar = IntervalIndex::index_path_for(&data);

    // Persist an index for the one-chromosome file, then grow the file and
    // make the sidecar older than the data.
    write_file(&data, DATA_V1);
    IntervalIndex::acquire(&data, b'\t').unwrap();
    write_file(&data, DATA_V2);
    set_mtime(&sidecar, SystemTime::now() - Duration::from_secs(3600));

    assert!(IntervalIndex::is_stale(&sidecar, &data).unwrap());
    let index = IntervalIndex::acquire(&data, b'\t').unwrap();

    // The rebuild picked up chr2, and the refreshed sidecar matches.
    assert_eq!(index.query_blocks("chr2", 10, 20).len(), 1);
    assert!(!IntervalIndex::is_stale(&sidecar, &data).unwrap());
    assert_eq!(IntervalIndex::load(&sidecar).unwrap(), index);
}

#[test]
fn test_index_newer_than_data_loads_without_rescan() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("x.bed");
    let sidecar = IntervalIndex::index_path_for(&data);

    write_file(&data, DATA_V1);
    let built = IntervalIndex::acquire(&data, b'\t').unwrap();

    // Change the data but mark it older than the sidecar: acquisition must
    // load the persisted index, which still describes V1 only.
    write_file(&data, DATA_V2);
    set_mtime(&data, SystemTime::now() - Duration::from_secs(3600));

    assert!(!IntervalIndex::is_stale(&sidecar, &data).unwrap());
    let acquired = IntervalIndex::acquire(&data, b'\t').unwrap();
    assert_eq!(acquired, built);
    assert!(acquired.query_blocks("chr2", 10, 20).is_empty());
}

#[test]
fn test_missing_sidecar_builds_and_persists() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("x.bed");
    let sidecar = IntervalIndex::index_path_for(&data);

    write_file(&data, DATA_V1);
    assert!(!sidecar.exists());

    let index = IntervalIndex::acquire(&data, b'\t').unwrap();
    assert!(sidecar.exists());
    assert_eq!(index.query_blocks("chr1", 150, 150).len(), 1);
}
