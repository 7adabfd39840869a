use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*;
use std::path::PathBuf;
use std::process::Command; // Run programs
use tempfile;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

const SAMPLE: &str = "I am Sam. Sam I am. I do not like this Sam I am.\n";

// Write the sample text with the given newline token into the temporary directory.
fn write_sample(temp_dir: &tempfile::TempDir,name: &str,tok: &[u8]) -> Result<PathBuf,Box<dyn std::error::Error>> {
    let mut txt: Vec<u8> = Vec::new();
    for _i in 0..40 {
        txt.append(&mut SAMPLE.trim_end().as_bytes().to_vec());
        txt.append(&mut tok.to_vec());
    }
    let path = temp_dir.path().join(name);
    std::fs::write(&path,txt)?;
    Ok(path)
}

fn round_trip_test(tok: &[u8],tie_break: &str) -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = write_sample(&temp_dir,"sample.txt",tok)?;
    let cmp_path = temp_dir.path().join("sample.hfp");
    let out_path = temp_dir.path().join("expanded.txt");
    Command::cargo_bin("huffpack")?
        .arg("compress")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&cmp_path)
        .arg("-t").arg(tie_break)
        .assert()
        .success()
        .stderr(predicate::str::contains("compressed"));
    Command::cargo_bin("huffpack")?
        .arg("expand")
        .arg("-i").arg(&cmp_path)
        .arg("-o").arg(&out_path)
        .assert()
        .success();
    let original = std::fs::read(in_path)?;
    let compressed = std::fs::read(cmp_path)?;
    let expanded = std::fs::read(out_path)?;
    assert!(compressed.len() < original.len());
    assert_eq!(&compressed[0..4],"HFPK".as_bytes());
    assert_eq!(original,expanded);
    Ok(())
}

#[test]
fn round_trip_lf() -> STDRESULT {
    round_trip_test(&[10],"scan")
}

#[test]
fn round_trip_crlf() -> STDRESULT {
    round_trip_test(&[13,10],"value")
}

#[test]
fn show_table() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("aaab.txt");
    std::fs::write(&in_path,"AAAB")?;
    let cmp_path = temp_dir.path().join("aaab.hfp");
    Command::cargo_bin("huffpack")?
        .arg("compress")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&cmp_path)
        .assert()
        .success();
    Command::cargo_bin("huffpack")?
        .arg("table")
        .arg("-i").arg(&cmp_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("41      1       1\n"))
        .stdout(predicate::str::contains("42      1       0\n"));
    Ok(())
}

#[test]
fn reject_foreign_file() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = write_sample(&temp_dir,"plain.txt",&[10])?;
    let out_path = temp_dir.path().join("out.txt");
    Command::cargo_bin("huffpack")?
        .arg("expand")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&out_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("FileTypeMismatch"));
    Ok(())
}

#[test]
fn reject_empty_file() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("empty.txt");
    std::fs::write(&in_path,"")?;
    let out_path = temp_dir.path().join("empty.hfp");
    Command::cargo_bin("huffpack")?
        .arg("compress")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&out_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("EmptyInput"));
    Ok(())
}
