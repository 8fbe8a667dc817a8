use dedup_trace_tools::codec::{CanonicalReader, RecordWriter};
use dedup_trace_tools::decoder::{decode_all, open_decoder, LegacyDecoder, SourceFormat, UbcDecoder};
use dedup_trace_tools::record::FileEntry;
use pretty_assertions::assert_eq;
use std::io::Cursor;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn legacy_chunk(size: u32, fingerprint: [u8; 20]) -> Vec<u8> {
    let mut out = vec![24u8];
    out.extend_from_slice(&size.to_le_bytes());
    out.extend_from_slice(&fingerprint);
    out
}

fn assert_structural(entries: &[FileEntry]) {
    for entry in entries {
        assert_eq!(entry.file.chunk_count as usize, entry.chunks.len());
    }
}

#[test]
fn test_legacy_header_without_chunks() {
    let mut decoder = LegacyDecoder::new(Cursor::new(b"name\t42\n\0".to_vec()));
    let entries = decode_all(&mut decoder).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].file.filename, b"name");
    assert_eq!(entries[0].file.size, 42);
    assert_eq!(entries[0].file.chunk_count, 0);
}

#[test]
fn test_legacy_duplicate_chunks_are_kept() {
    let mut data = b"dup.bin\t4096\n".to_vec();
    let fingerprints: Vec<[u8; 20]> = (1..=4u8).map(|i| [i; 20]).collect();
    for (i, fp) in fingerprints.iter().enumerate() {
        data.extend(legacy_chunk(1000 + i as u32, *fp));
    }
    data.extend(legacy_chunk(1000, fingerprints[0]));
    data.extend(b"\0\n");

    let mut decoder = LegacyDecoder::new(Cursor::new(data));
    let entries = decode_all(&mut decoder).unwrap();

    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.file.chunk_count, 5);
    assert_eq!(entry.chunks[0].fingerprint, entry.chunks[4].fingerprint);
    assert_eq!(entry.chunks[0].size, entry.chunks[4].size);
}

#[test]
fn test_legacy_malformed_length_keeps_previous_chunks() {
    let mut data = b"a\t1\n".to_vec();
    data.extend(legacy_chunk(10, [7; 20]));
    data.push(23);

    let mut decoder = LegacyDecoder::new(Cursor::new(data));
    let entries = decode_all(&mut decoder).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].file.chunk_count, 1);
}

#[test]
fn test_legacy_malformed_length_continues_with_next_header() {
    let mut data = b"a\t1\n".to_vec();
    data.extend(legacy_chunk(10, [7; 20]));
    data.push(23);
    data.extend(b"name\t5\n\0\n");

    let mut decoder = LegacyDecoder::new(Cursor::new(data));
    let entries = decode_all(&mut decoder).unwrap();
    assert_structural(&entries);

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].file.filename, b"a");
    assert_eq!(entries[0].chunks.len(), 1);
    assert_eq!(entries[1].file.filename, b"name");
    assert_eq!(entries[1].file.size, 5);
    assert!(entries[1].chunks.is_empty());
}

#[test]
fn test_legacy_non_utf8_name_reaches_canonical_stream() {
    let mut decoder = LegacyDecoder::new(Cursor::new(b"caf\xe9.txt\t42\n\0\n".to_vec()));
    let entries = decode_all(&mut decoder).unwrap();
    assert_eq!(entries[0].file.filename, b"caf\xe9.txt");

    let mut writer = RecordWriter::new(Vec::new());
    for record in entries[0].clone().into_records() {
        writer.write_record(&record).unwrap();
    }
    let bytes = writer.finish().unwrap();

    let decoded = CanonicalReader::new(Cursor::new(bytes)).next_entry().unwrap().unwrap();
    assert_eq!(decoded, entries[0]);
    assert_eq!(decoded.file.filename, b"caf\xe9.txt");
}

#[test]
fn test_legacy_multiple_entries() {
    let mut data = b"first\t1\ttext\n".to_vec();
    data.extend(legacy_chunk(1, [1; 20]));
    data.extend(b"\0\n");
    data.extend(b"second\t2\n");
    data.extend(legacy_chunk(2, [2; 20]));
    data.extend(legacy_chunk(3, [3; 20]));

    let mut decoder = LegacyDecoder::new(Cursor::new(data));
    let entries = decode_all(&mut decoder).unwrap();
    assert_structural(&entries);

    let names: Vec<&[u8]> = entries.iter().map(|e| e.file.filename.as_slice()).collect();
    assert_eq!(names, vec![b"first".as_slice(), b"second".as_slice()]);
    assert_eq!(entries[0].file.file_type, b"text");
    assert_eq!(entries[1].chunks.len(), 2);
}

#[test]
fn test_ubc_header_tokens() {
    let input = "73e29ea83d:1\na7e8b0dee6:8\nc584233beb:0\n0\n16\n1\n2\n3\n4\n5\n6\n7\n2dc83032b5:16\n\n";
    let mut decoder = UbcDecoder::headerless(Cursor::new(input.as_bytes().to_vec()));
    let entries = decode_all(&mut decoder).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].file.filename, b"73e29ea83da7e8b0dee6c584233beb");
    assert_eq!(entries[0].file.label, "c584233beb");
    assert_eq!(entries[0].file.chunk_count, 1);
}

#[test]
fn test_ubc_fixture() {
    let mut decoder = open_decoder(SourceFormat::Ubc, fixture("ubc_sample.txt")).unwrap();
    let entries = decode_all(&mut decoder).unwrap();
    assert_structural(&entries);

    // The fourth entry is cut off by LOGCOMPLETE and dropped
    assert_eq!(entries.len(), 3);

    assert_eq!(entries[0].file.filename, b"73e29ea83da7e8b0dee6c584233beb");
    assert_eq!(entries[0].file.size, 0);
    assert_eq!(hex::encode(&entries[0].chunks[0].fingerprint), "2dc83032b5");
    assert_eq!(entries[0].chunks[0].size, 204);

    assert_eq!(entries[1].file.filename, b"73e29ea83dec58962838535740fe05");
    assert_eq!(entries[1].file.label, "535740fe05");
    assert_eq!(entries[1].file.size, 144);
    assert_eq!(hex::encode(&entries[1].chunks[0].fingerprint), "73e29ea83d");

    let third = &entries[2];
    assert_eq!(third.file.size, 12599);
    assert_eq!(third.file.chunk_count, 3);
    assert_eq!(third.chunks[1].fingerprint, vec![0u8; 6]);
    let total: u64 = third.chunks.iter().map(|c| u64::from(c.size)).sum();
    assert_eq!(total, third.file.size);
}

#[test]
fn test_ubc_log_complete_drops_partial_entry() {
    let input = "73e29ea83d:1\na7e8b0dee6:8\nc584233beb:0\n0\n16\n1\n2\n3\nLOGCOMPLETE\n";
    let mut decoder = UbcDecoder::headerless(Cursor::new(input.as_bytes().to_vec()));
    let entries = decode_all(&mut decoder).unwrap();
    assert!(entries.is_empty());
}

#[test]
fn test_ubc_eof_inside_chunk_run_ends_entry() {
    let input = "73e29ea83d:1\na7e8b0dee6:8\nc584233beb:0\n0\n16\n1\n2\n3\n4\n5\n6\n7\nabcd:8\nef01:8";
    let mut decoder = UbcDecoder::headerless(Cursor::new(input.as_bytes().to_vec()));
    let entries = decode_all(&mut decoder).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].file.chunk_count, 2);
}

#[test]
fn test_open_decoder_missing_file() {
    assert!(open_decoder(SourceFormat::Legacy, "/nonexistent/trace").is_err());
}
