use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

use svm_base::{
    program::Program,
    runner::{FaultKind, Runner, Signal},
};
use svmc::{assemble_file, format_stack, Error};
use tempfile::TempDir;

fn write_source(dir: &TempDir, name: &str, source: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, source).unwrap();
    path
}

/// Assembles `source` through files and runs it to the end.
fn assemble_and_run(source: &str) -> (Signal, String) {
    let dir = tempfile::tempdir().unwrap();
    let input = write_source(&dir, "prog.asm", source);
    let output = dir.path().join("prog.bin");

    assemble_file(&input, &output).unwrap();

    let mut svm = Runner::new(Program::load_file(&output).unwrap());
    let sig = svm.run_to_end();
    (sig, format_stack(&svm.context.stack))
}

fn svmas(input: &Path, output: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_svmas"))
        .arg(input)
        .arg(output)
        .output()
        .unwrap()
}

fn svmrun(args: &[&Path]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_svmrun"))
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn scenarios() {
    #[rustfmt::skip]
    let cases = [
        ("PUSH 2\nPUSH 3\nADD\nHALT",            Signal::Halted, "5"),
        ("JMP skip\nPUSH 99\nskip: HALT",         Signal::Halted, ""),
        ("CALL f\nHALT\nf: PUSH 7\nRET",          Signal::Halted, "7"),
        ("PUSH 42\nSTORE 0\nLOAD 0",              Signal::EOF,    "42"),
        ("PUSH 1\nPUSH 2\nPUSH 3",                Signal::EOF,    "3 2 1"),
        ("PUSH 3\nPUSH 5\nCMP\nPUSH 5\nPUSH 3\nCMP\nPUSH 4\nPUSH 4\nCMP", Signal::EOF, "0 0 1"),
    ];

    for (source, sig, stack) in cases {
        assert_eq!(assemble_and_run(source), (sig, stack.to_string()), "source: {source:?}");
    }
}

#[test]
fn countdown_loop() {
    let source = "
        ; count 3 down to 0, keep every value
            PUSH 3
        top:
            DUP
            JZ done
            DUP
            PUSH 1
            SUB
            JMP top
        done:
            HALT
    ";

    assert_eq!(assemble_and_run(source), (Signal::Halted, "0 1 2 3".to_string()));
}

#[test]
fn faults_keep_stack() {
    let (sig, stack) = assemble_and_run("PUSH 1\nPOP\nPOP");
    assert!(matches!(sig, Signal::Fault(f) if f.kind == FaultKind::StackUnderflow && f.pc == 6));
    assert_eq!(stack, "");

    let (sig, stack) = assemble_and_run("PUSH 9\nPUSH 5\nPUSH 0\nDIV");
    assert!(matches!(sig, Signal::Fault(f) if f.kind == FaultKind::DivisionByZero && f.pc == 15));
    assert_eq!(stack, "9");
}

#[test]
fn translate_error_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_source(&dir, "bad.asm", "PUSH 1\nJMP nowhere\n");
    let output = dir.path().join("bad.bin");

    let err = assemble_file(&input, &output).unwrap_err();

    assert!(matches!(err, Error::Translate { line: 2, .. }));
    assert!(err.to_string().ends_with(":2: unknown label `nowhere`"));
    assert!(!output.exists());
}

#[test]
fn latin1_comment() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("latin1.asm");
    let output = dir.path().join("latin1.bin");
    fs::write(&input, b"PUSH 1 ; caf\xe9\nHALT\n").unwrap();

    assert_eq!(assemble_file(&input, &output).unwrap(), 6);
    assert_eq!(fs::read(&output).unwrap(), [0x01, 0x01, 0x00, 0x00, 0x00, 0xFF]);

    let out = svmas(&input, &dir.path().join("cli.bin"));
    assert!(out.status.success());
}

#[test]
fn missing_input() {
    let dir = tempfile::tempdir().unwrap();

    let err = assemble_file(&dir.path().join("none.asm"), &dir.path().join("out.bin"))
        .unwrap_err();

    assert!(matches!(err, Error::Read { .. }));
}

#[test]
fn svmas_exit_codes() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_source(&dir, "good.asm", "PUSH 2\nPUSH 3\nADD\nHALT\n");
    let bad = write_source(&dir, "bad.asm", "PUSH 2\nFROB\n");
    let output = dir.path().join("out.bin");

    let out = svmas(&good, &output);
    assert!(out.status.success());
    assert_eq!(
        fs::read(&output).unwrap(),
        [0x01, 0x02, 0x00, 0x00, 0x00, 0x01, 0x03, 0x00, 0x00, 0x00, 0x10, 0xFF]
    );

    let out = svmas(&bad, &dir.path().join("bad.bin"));
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("unknown mnemonic `FROB`"));

    let out = Command::new(env!("CARGO_BIN_EXE_svmas"))
        .arg(&good)
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn svmrun_prints_stack() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("prog.bin");

    fs::write(&bin, [0x01, 0x07, 0x00, 0x00, 0x00, 0x01, 0x08, 0x00, 0x00, 0x00]).unwrap();
    let out = svmrun(&[&bin]);
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout), "8 7\n");

    // runtime fault still exits with 0 and dumps the stack
    fs::write(&bin, [0x01, 0x07, 0x00, 0x00, 0x00, 0x07]).unwrap();
    let out = svmrun(&[&bin]);
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout), "7\n");
    assert!(String::from_utf8_lossy(&out.stderr).contains("unknown opcode 0x07 at pc=5"));
}

#[test]
fn svmrun_load_failure() {
    let dir = tempfile::tempdir().unwrap();

    let out = svmrun(&[&dir.path().join("missing.bin")]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("error: cannot open"));
    assert!(out.stdout.is_empty());

    let out = svmrun(&[]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn svmrun_listing() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("prog.bin");
    fs::write(&bin, [0x20, 0x05, 0x00, 0x00, 0x00, 0xFF]).unwrap();

    let out = svmrun(&[&bin, Path::new("--no-exec")]);

    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout), "0: JMP 5\n5: HALT\n");

    fs::write(&bin, [0x03, 0x07]).unwrap();
    let out = svmrun(&[&bin, Path::new("--no-exec")]);

    assert_eq!(out.status.code(), Some(1));
    assert_eq!(String::from_utf8_lossy(&out.stdout), "0: DUP\n");
    assert!(String::from_utf8_lossy(&out.stderr).contains("cannot decode program"));
}

#[cfg(target_os = "linux")]
#[test]
fn svmrun_unwritable_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("prog.bin");
    fs::write(&bin, [0x01, 0x07, 0x00, 0x00, 0x00]).unwrap();

    let out = Command::new(env!("CARGO_BIN_EXE_svmrun"))
        .arg(&bin)
        .stdout(fs::File::create("/dev/full").unwrap())
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).starts_with("error: "));
}
