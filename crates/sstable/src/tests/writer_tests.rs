use crate::format::{read_footer, MAGIC};
use crate::*;
use memtable::Memtable;
use std::io::{Read, Seek, SeekFrom};
use tempfile::tempdir;

fn make_sample_memtable() -> Memtable {
    let mut m = Memtable::new();
    m.put(b"a".to_vec(), b"apple".to_vec(), 1);
    m.put(b"b".to_vec(), b"banana".to_vec(), 2);
    m.put(b"c".to_vec(), b"".to_vec(), 3); // present but empty value
    m.delete(b"d".to_vec(), 4); // tombstone
    m
}

fn entries(m: &Memtable) -> impl Iterator<Item = (Vec<u8>, memtable::ValueEntry)> + '_ {
    m.iter().map(|(k, v)| (k.to_vec(), v.clone()))
}

#[test]
fn write_empty_entries_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.sst");
    let result = SstableWriter::write(&path, std::iter::empty());
    assert!(matches!(result, Err(SstableError::EmptyInput)));
    assert!(!path.exists(), "no file should be created on empty input");
}

#[test]
fn write_and_inspect_footer() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.sst");

    let mem = make_sample_memtable();
    SstableWriter::write(&path, entries(&mem)).unwrap();

    let meta = std::fs::metadata(&path).unwrap();
    assert!(meta.len() >= FOOTER_BYTES);

    let mut f = std::fs::File::open(&path).unwrap();
    let filesize = f.metadata().unwrap().len();
    let footer = read_footer(&mut f).unwrap();

    assert_eq!(footer.entry_count, 4);
    assert_eq!(footer.max_seq, 4);
    assert!(footer.index_offset < filesize);

    f.seek(SeekFrom::Start(0)).unwrap();
    let mut buf = [0u8; 4];
    let n = f.read(&mut buf).unwrap();
    assert!(n > 0);
    let _ = MAGIC; // magic validated implicitly by read_footer above
}

#[test]
fn no_temp_file_left_behind_on_success() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("clean.sst");

    let mem = make_sample_memtable();
    SstableWriter::write(&path, entries(&mem)).unwrap();

    assert!(path.exists());
    assert!(!path.with_extension("sst.tmp").exists());
}

#[test]
fn writes_tombstone_with_no_value_bytes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tomb.sst");

    let mut mem = Memtable::new();
    mem.delete(b"gone".to_vec(), 1);
    SstableWriter::write(&path, entries(&mem)).unwrap();

    let reader = SstableReader::open(&path).unwrap();
    let entry = reader.get(b"gone").unwrap().unwrap();
    assert_eq!(entry.seq, 1);
    assert_eq!(entry.value, None);
}
