use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use tempfile::tempdir;
use wal::{WalReader, WalRecord, WalWriter};

const N_RECORDS: u64 = 10_000;

fn append_benchmark(c: &mut Criterion) {
    c.bench_function("wal_append_10k_unsynced", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let path = dir.path().join("bench.wal");
                let writer = WalWriter::create(&path, false).unwrap();
                (dir, writer)
            },
            |(_dir, mut writer)| {
                for seq in 1..=N_RECORDS {
                    writer
                        .append(&WalRecord::Put {
                            seq,
                            key: format!("key{seq}").into_bytes(),
                            value: b"v".to_vec(),
                        })
                        .unwrap();
                }
            },
            BatchSize::SmallInput,
        );
    });
}

fn replay_benchmark(c: &mut Criterion) {
    c.bench_function("wal_replay_10k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let path = dir.path().join("bench.wal");
                let mut writer = WalWriter::create(&path, false).unwrap();
                for seq in 1..=N_RECORDS {
                    writer
                        .append(&WalRecord::Put {
                            seq,
                            key: format!("key{seq}").into_bytes(),
                            value: b"v".to_vec(),
                        })
                        .unwrap();
                }
                drop(writer);
                (dir, path)
            },
            |(_dir, path)| {
                let mut reader = WalReader::open(&path).unwrap();
                let mut count = 0u64;
                reader
                    .replay(0, |_record| {
                        count += 1;
                    })
                    .unwrap();
                assert_eq!(count, N_RECORDS);
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, append_benchmark, replay_benchmark);
criterion_main!(benches);
