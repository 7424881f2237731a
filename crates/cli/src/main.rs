//! # CLI - TectonKV Interactive Shell
//!
//! A REPL-style command-line interface for the TectonKV storage engine.
//! Reads commands from stdin, executes them against the engine, and prints
//! results to stdout. Designed for both interactive use and scripted testing
//! (pipe commands via stdin).
//!
//! ## Commands
//!
//! ```text
//! PUT key value      Insert or update a key-value pair
//! GET key            Look up a key (prints value or "(nil)")
//! DEL key            Delete a key (writes a tombstone)
//! STATS              Print engine debug info
//! EXIT / QUIT        Shut down gracefully
//! ```
//!
//! ## Configuration
//!
//! All settings are controlled via environment variables:
//!
//! ```text
//! TECTONKV_DATA_DIR    Root data directory     (default: "data")
//! TECTONKV_FLUSH_BYTES Flush threshold in bytes (default: 2097152 = 2 MiB)
//! TECTONKV_WAL_SYNC    fsync every WAL append   (default: "true")
//! ```
//!
//! ## Example
//!
//! ```text
//! $ cargo run -p cli
//! TectonKV started (seq=0, data_dir=data, flush=2097152 bytes, wal_sync=true)
//! > PUT name Alice
//! OK
//! > GET name
//! Alice
//! > STATS
//! seq=1 active_entries=1 sstables=0
//! > EXIT
//! bye
//! ```
use anyhow::Result;
use config::Config;
use engine::Engine;
use std::io::{self, BufRead, Write};

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn main() -> Result<()> {
    let data_dir = env_or("TECTONKV_DATA_DIR", "data");
    let flush_bytes: usize = env_or("TECTONKV_FLUSH_BYTES", "2097152").parse().unwrap_or(2097152);
    let wal_sync: bool = env_or("TECTONKV_WAL_SYNC", "true").parse().unwrap_or(true);

    let config = Config {
        data_dir: data_dir.clone().into(),
        memtable_size_threshold: flush_bytes,
        wal_sync,
    };
    let engine = Engine::open(config)?;

    println!(
        "TectonKV started (seq={}, data_dir={}, flush={} bytes, wal_sync={})",
        engine.current_seq()?,
        data_dir,
        flush_bytes,
        wal_sync,
    );
    println!("Commands: PUT key value | GET key | DEL key | STATS | EXIT");
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        if let Some(cmd) = parts.next() {
            match cmd.to_uppercase().as_str() {
                "PUT" => {
                    if let Some(k) = parts.next() {
                        let v: String = parts.collect::<Vec<&str>>().join(" ");
                        if v.is_empty() {
                            println!("ERR usage: PUT key value");
                        } else {
                            match engine.put(k.as_bytes().to_vec(), v.as_bytes().to_vec()) {
                                Ok(()) => println!("OK"),
                                Err(e) => println!("ERR put failed: {}", e),
                            }
                        }
                    } else {
                        println!("ERR usage: PUT key value");
                    }
                }
                "GET" => {
                    if let Some(k) = parts.next() {
                        match engine.get(k.as_bytes()) {
                            Ok(Some(v)) => println!("{}", String::from_utf8_lossy(&v)),
                            Ok(None) => println!("(nil)"),
                            Err(e) => println!("ERR read failed: {}", e),
                        }
                    } else {
                        println!("ERR usage: GET key");
                    }
                }
                "DEL" => {
                    if let Some(k) = parts.next() {
                        match engine.delete(k.as_bytes().to_vec()) {
                            Ok(()) => println!("OK"),
                            Err(e) => println!("ERR del failed: {}", e),
                        }
                    } else {
                        println!("ERR usage: DEL key");
                    }
                }
                "STATS" => match (engine.current_seq(), engine.sstable_count()) {
                    (Ok(seq), Ok(sstables)) => {
                        let active = engine.debug_active_entries().map(|e| e.len()).unwrap_or(0);
                        println!("seq={} active_entries={} sstables={}", seq, active, sstables);
                    }
                    (Err(e), _) | (_, Err(e)) => println!("ERR stats failed: {}", e),
                },
                "EXIT" | "QUIT" => {
                    println!("bye");
                    break;
                }
                other => {
                    println!("unknown command: {}", other);
                }
            }
        }

        print!("> ");
        io::stdout().flush().ok();
    }

    Ok(())
}
