use std::fs;
use std::path::Path;

use config::Config;

use crate::Engine;

pub fn count_sst_files(dir: &Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|s| s.to_str())
                .map(|ext| ext == "sst")
                .unwrap_or(false)
        })
        .count()
}

pub fn config_with_threshold(data_dir: &Path, threshold: usize) -> Config {
    Config {
        data_dir: data_dir.to_path_buf(),
        memtable_size_threshold: threshold,
        wal_sync: false,
    }
}

pub fn open_with_threshold(data_dir: &Path, threshold: usize) -> Engine {
    Engine::open(config_with_threshold(data_dir, threshold)).expect("engine should open")
}
