use byteorder::{LittleEndian, WriteBytesExt};
use vds_common::error::ErrorKind;

use crate::{BlockReader, BlockWriter, ReadOptions, WriteOptions};

fn write_with(block_size: usize, f: impl FnOnce(&mut BlockWriter<Vec<u8>>)) -> Vec<u8> {
    let mut writer = BlockWriter::new(Vec::new(), &WriteOptions { block_size }).unwrap();
    f(&mut writer);
    writer.finish().unwrap()
}

fn reader(data: &[u8], block_size: usize) -> BlockReader<&[u8]> {
    let options = ReadOptions {
        block_size,
        ..Default::default()
    };
    BlockReader::new(data, &options).unwrap().with_name("test")
}

/// Frames `payload` as a single block.
fn raw_block(payload: &[u8]) -> Vec<u8> {
    let bound = lz4::block::compress_bound(payload.len()).unwrap();
    let mut comp = vec![0; bound];
    let n = lz4::block::compress_to_buffer(payload, None, false, &mut comp).unwrap();
    let mut out = Vec::new();
    out.write_i32::<LittleEndian>(n as i32).unwrap();
    out.write_i32::<LittleEndian>(payload.len() as i32).unwrap();
    out.extend_from_slice(&comp[..n]);
    out
}

fn corrupt_offset(err: &vds_common::error::Error) -> u64 {
    match err.kind() {
        ErrorKind::CorruptPartition {
            partition, offset, ..
        } => {
            assert_eq!(partition, "test");
            *offset
        }
        other => panic!("expected corrupt partition, got {other:?}"),
    }
}

#[test]
fn test_varint_round_trip() {
    let ints = [0, 1, 127, 128, 16383, 16384, i32::MAX, -1, i32::MIN];
    let longs = [0, 1, 127, 128, 1 << 35, i64::MAX, -1, i64::MIN];
    let data = write_with(64, |w| {
        for v in ints {
            w.write_int(v).unwrap();
        }
        for v in longs {
            w.write_long(v).unwrap();
        }
    });

    let mut r = reader(&data, 64);
    for v in ints {
        assert_eq!(r.read_int().unwrap(), v);
    }
    for v in longs {
        assert_eq!(r.read_long().unwrap(), v);
    }
}

#[test]
fn test_varint_encodings() {
    let data = write_with(1024, |w| {
        w.write_int(127).unwrap();
        w.write_int(128).unwrap();
        w.write_int(16383).unwrap();
        w.write_int(i32::MAX).unwrap();
    });
    let mut r = reader(&data, 1024);
    let mut bytes = [0u8; 1 + 2 + 2 + 5];
    r.read_bytes(&mut bytes).unwrap();
    assert_eq!(bytes, [0x7f, 0x80, 0x01, 0xff, 0x7f, 0xff, 0xff, 0xff, 0xff, 0x07]);
}

#[test]
fn test_mixed_values() {
    let data = write_with(16, |w| {
        w.write_bool(true).unwrap();
        w.write_byte(0xab).unwrap();
        w.write_float(-1.25).unwrap();
        w.write_double(std::f64::consts::PI).unwrap();
        w.write_bytes(b"hello, blocks").unwrap();
        w.write_bool(false).unwrap();
        // The last 12 bytes are still buffered.
        assert_eq!(w.bytes_written(), 28);
        assert_eq!(w.blocks_written(), 1);
    });

    let mut r = reader(&data, 16);
    assert!(r.read_bool().unwrap());
    assert_eq!(r.read_byte().unwrap(), 0xab);
    assert_eq!(r.read_float().unwrap(), -1.25);
    assert_eq!(r.read_double().unwrap(), std::f64::consts::PI);
    let mut s = [0u8; 13];
    r.read_bytes(&mut s).unwrap();
    assert_eq!(&s, b"hello, blocks");
    assert!(!r.read_bool().unwrap());
    assert_eq!(r.bytes_consumed(), 1 + 1 + 4 + 8 + 13 + 1);
    assert_eq!(r.blocks_read(), 2);
}

#[test]
fn test_values_spanning_boundary_decode_wherever_they_start() {
    let run: Vec<u8> = (0..40u8).collect();
    for start in 0..24 {
        let data = write_with(16, |w| {
            w.write_bytes(&vec![0x55; start]).unwrap();
            w.write_bytes(&run).unwrap();
            w.write_int(300_000).unwrap();
            w.write_double(0.5).unwrap();
        });
        let mut r = reader(&data, 16);
        let mut skip = vec![0u8; start];
        r.read_bytes(&mut skip).unwrap();
        let mut out = vec![0u8; run.len()];
        r.read_bytes(&mut out).unwrap();
        assert_eq!(out, run, "start {start}");
        assert_eq!(r.read_int().unwrap(), 300_000, "start {start}");
        assert_eq!(r.read_double().unwrap(), 0.5, "start {start}");
    }
}

#[test]
fn test_default_block_size_boundary() {
    let block_size = ReadOptions::default().block_size;
    let run = [0xde, 0xad, 0xbe, 0xef, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
    let data = write_with(block_size, |w| {
        w.write_bytes(&vec![7u8; block_size - 3]).unwrap();
        w.write_bytes(&run).unwrap();
        w.write_long(1 << 40).unwrap();
    });

    let mut r = reader(&data, block_size);
    let mut filler = vec![0u8; block_size - 3];
    r.read_bytes(&mut filler).unwrap();
    let mut out = [0u8; 10];
    r.read_bytes(&mut out).unwrap();
    assert_eq!(out, run);
    assert_eq!(r.read_long().unwrap(), 1 << 40);
    assert_eq!(r.blocks_read(), 2);
}

#[test]
fn test_randomized_round_trip() {
    let mut rng = fastrand::Rng::with_seed(0x5eed);
    let ints: Vec<i32> = (0..5000).map(|_| rng.i32(..)).collect();
    let longs: Vec<i64> = (0..5000).map(|_| rng.i64(..)).collect();
    let data = write_with(4096, |w| {
        for (&a, &b) in ints.iter().zip(&longs) {
            w.write_int(a).unwrap();
            w.write_long(b).unwrap();
        }
    });
    let mut r = reader(&data, 4096);
    for (&a, &b) in ints.iter().zip(&longs) {
        assert_eq!(r.read_int().unwrap(), a);
        assert_eq!(r.read_long().unwrap(), b);
    }
}

#[test]
fn test_empty_blocks_are_skipped() {
    let mut data = Vec::new();
    data.write_i32::<LittleEndian>(0).unwrap();
    data.write_i32::<LittleEndian>(0).unwrap();
    data.extend(raw_block(&[42, 43]));

    let mut r = reader(&data, 1024);
    assert_eq!(r.read_byte().unwrap(), 42);
    assert_eq!(r.read_byte().unwrap(), 43);
    assert_eq!(r.blocks_read(), 2);
}

#[test]
fn test_end_of_stream_is_corrupt() {
    let data = raw_block(&[1]);
    let mut r = reader(&data, 1024);
    assert_eq!(r.read_byte().unwrap(), 1);
    let err = r.read_byte().unwrap_err();
    assert!(err.is_corrupt_partition());
    assert_eq!(corrupt_offset(&err), data.len() as u64);
}

#[test]
fn test_truncated_block_is_corrupt() {
    let mut data = raw_block(&[1, 2, 3, 4, 5, 6, 7, 8]);
    data.truncate(data.len() - 2);
    let err = reader(&data, 1024).read_byte().unwrap_err();
    assert_eq!(corrupt_offset(&err), 0);
}

#[test]
fn test_invalid_headers() {
    let mut negative = Vec::new();
    negative.write_i32::<LittleEndian>(-4).unwrap();
    negative.write_i32::<LittleEndian>(4).unwrap();
    assert!(reader(&negative, 1024).read_byte().unwrap_err().is_corrupt_partition());

    let oversized = raw_block(&[9u8; 100]);
    let err = reader(&oversized, 64).read_byte().unwrap_err();
    assert!(err.to_string().contains("exceeds block size"));

    let mut too_long = Vec::new();
    too_long.write_i32::<LittleEndian>(1 << 20).unwrap();
    too_long.write_i32::<LittleEndian>(16).unwrap();
    assert!(reader(&too_long, 1024).read_byte().unwrap_err().is_corrupt_partition());
}

#[test]
fn test_decompressed_length_mismatch() {
    let mut data = raw_block(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
    // Declare two more decompressed bytes than the block holds.
    data[4..8].copy_from_slice(&12i32.to_le_bytes());
    let mut second = raw_block(&[0]);
    data.append(&mut second);
    let err = reader(&data, 1024).read_byte().unwrap_err();
    assert!(err.is_corrupt_partition());
}

#[test]
fn test_overlong_varint_is_corrupt() {
    let data = write_with(1024, |w| {
        w.write_bytes(&[0xff; 6]).unwrap();
        w.write_bytes(&[0x80; 10]).unwrap();
        w.write_byte(0).unwrap();
    });
    let mut r = reader(&data, 1024);
    assert!(r.read_int().unwrap_err().is_corrupt_partition());

    // The slow path, with the varint split across blocks.
    let data = write_with(4, |w| {
        w.write_bytes(&[0x00, 0x00, 0x00]).unwrap();
        w.write_bytes(&[0xff; 6]).unwrap();
    });
    let mut r = reader(&data, 4);
    let mut skip = [0u8; 3];
    r.read_bytes(&mut skip).unwrap();
    assert!(r.read_int().unwrap_err().is_corrupt_partition());
}

#[test]
fn test_open_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("part-0");
    let data = write_with(1024, |w| w.write_int(77).unwrap());
    std::fs::write(&path, data).unwrap();

    let mut r = BlockReader::open(&path, &ReadOptions::default()).unwrap();
    assert_eq!(r.name(), path.display().to_string());
    assert_eq!(r.read_int().unwrap(), 77);

    let err = BlockReader::open(dir.path().join("missing"), &ReadOptions::default()).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Io { .. }));
}
