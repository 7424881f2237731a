use super::*;
use tempfile::tempdir;

#[test]
fn new_uses_defaults() {
    let cfg = Config::new("/tmp/does-not-matter");
    assert_eq!(cfg.memtable_size_threshold, DEFAULT_MEMTABLE_SIZE_THRESHOLD);
    assert!(cfg.wal_sync);
}

#[test]
fn derived_paths_are_subdirectories_of_data_dir() {
    let cfg = Config::new("/srv/tectonkv");
    assert_eq!(cfg.wal_dir(), PathBuf::from("/srv/tectonkv/wal"));
    assert_eq!(cfg.sstable_dir(), PathBuf::from("/srv/tectonkv/sstables"));
}

#[test]
fn validate_creates_missing_directories() {
    let dir = tempdir().unwrap();
    let data_dir = dir.path().join("fresh");
    let cfg = Config::new(&data_dir);

    cfg.validate().unwrap();

    assert!(cfg.data_dir.exists());
    assert!(cfg.wal_dir().exists());
    assert!(cfg.sstable_dir().exists());
}

#[test]
fn validate_rejects_zero_threshold() {
    let dir = tempdir().unwrap();
    let mut cfg = Config::new(dir.path());
    cfg.memtable_size_threshold = 0;

    let result = cfg.validate();
    assert!(matches!(result, Err(ConfigError::ZeroThreshold)));
}

#[test]
fn validate_is_idempotent_on_existing_directory() {
    let dir = tempdir().unwrap();
    let cfg = Config::new(dir.path());

    cfg.validate().unwrap();
    cfg.validate().unwrap();
}
