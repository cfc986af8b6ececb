use assert_cmd::prelude::*;
use std::process::Command;
use std::io::Write;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

const METHODS: [&str;5] = ["huffman","bwt","lzss","lzw","ppmc"];

/// Round trip `data` through the compiled binary for `method`: compress to a
/// temp file, expand it back, and check the result matches the input.
fn round_trip(method: &str, data: &[u8]) -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("in");
    let cmp_path = temp_dir.path().join("cmp");
    let out_path = temp_dir.path().join("out");
    std::fs::File::create(&in_path)?.write_all(data)?;

    Command::cargo_bin("retrocompressor")?
        .arg("compress").arg("-m").arg(method)
        .arg("-i").arg(&in_path).arg("-o").arg(&cmp_path)
        .assert().success();

    Command::cargo_bin("retrocompressor")?
        .arg("expand").arg("-m").arg(method)
        .arg("-i").arg(&cmp_path).arg("-o").arg(&out_path)
        .assert().success();

    let expanded = std::fs::read(&out_path)?;
    assert_eq!(expanded, data, "round trip mismatch for method {}", method);
    Ok(())
}

#[test]
fn empty_file_round_trips_every_method() -> STDRESULT {
    for method in METHODS {
        round_trip(method, &[])?;
    }
    Ok(())
}

#[test]
fn single_byte_round_trips_every_method() -> STDRESULT {
    for method in METHODS {
        round_trip(method, &[0x42])?;
    }
    Ok(())
}

#[test]
fn text_with_repeats_round_trips_every_method() -> STDRESULT {
    let mut data = Vec::new();
    for _ in 0..50 {
        data.extend_from_slice(b"the quick brown fox jumps over the lazy dog\n");
    }
    for method in METHODS {
        round_trip(method, &data)?;
    }
    Ok(())
}

#[test]
fn all_256_byte_values_round_trip_every_method() -> STDRESULT {
    let data: Vec<u8> = (0..=255).collect();
    for method in METHODS {
        round_trip(method, &data)?;
    }
    Ok(())
}

#[test]
fn ppmc_respects_the_order_flag() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("in");
    let cmp_path = temp_dir.path().join("cmp");
    let out_path = temp_dir.path().join("out");
    let mut data = Vec::new();
    for _ in 0..20 {
        data.extend_from_slice(b"mississippi river boats");
    }
    std::fs::File::create(&in_path)?.write_all(&data)?;

    Command::cargo_bin("retrocompressor")?
        .arg("compress").arg("-m").arg("ppmc").arg("--order").arg("1")
        .arg("-i").arg(&in_path).arg("-o").arg(&cmp_path)
        .assert().success();

    Command::cargo_bin("retrocompressor")?
        .arg("expand").arg("-m").arg("ppmc").arg("--order").arg("1")
        .arg("-i").arg(&cmp_path).arg("-o").arg(&out_path)
        .assert().success();

    let expanded = std::fs::read(&out_path)?;
    assert_eq!(expanded, data);
    Ok(())
}
