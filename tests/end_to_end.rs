//! Drives the crate the way an external consumer would: through the
//! compiled CLI binary, asserting on its captured stdout/stderr and exit
//! code rather than reaching into library internals.
use std::process::{Command, Output};
use std::sync::atomic::{AtomicUsize, Ordering};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

fn run_program(source: &str, engine: &str) -> Output {
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let path = std::env::temp_dir().join(format!("glint_e2e_{}_{id}.lang", std::process::id()));
    std::fs::write(&path, source).expect("failed to write temp source file");

    let output = Command::new(env!("CARGO_BIN_EXE_glint"))
        .arg(&path)
        .arg("--engine")
        .arg(engine)
        .output()
        .expect("failed to run the glint binary");

    let _ = std::fs::remove_file(&path);
    output
}

fn stdout_of(source: &str, engine: &str) -> String {
    let output = run_program(source, engine);
    assert!(
        output.status.success(),
        "program failed on {engine}: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout was not valid utf-8")
}

#[test]
fn compound_assignment_end_to_end() {
    let source = "var x = 1; x += 2; x *= 3; println(x);";
    assert_eq!(stdout_of(source, "interpreter"), "9\n");
    assert_eq!(stdout_of(source, "vm"), "9\n");
}

#[test]
fn function_call_picks_the_larger_argument() {
    let source = "function max(a, b) { if a > b { return a; } else { return b; } } println(max(3, 7));";
    assert_eq!(stdout_of(source, "interpreter"), "7\n");
    assert_eq!(stdout_of(source, "vm"), "7\n");
}

#[test]
fn while_loop_counts_up() {
    let source = "var i = 0; while i < 3 { print(i); i += 1; } println();";
    assert_eq!(stdout_of(source, "interpreter"), "012\n");
    assert_eq!(stdout_of(source, "vm"), "012\n");
}

#[test]
fn for_loop_counts_up_and_down() {
    assert_eq!(stdout_of("for i 0, 3 print(i); println();", "interpreter"), "012\n");
    assert_eq!(stdout_of("for i 3, 0 print(i); println();", "interpreter"), "321\n");
    assert_eq!(stdout_of("for i 0, 3 print(i); println();", "vm"), "012\n");
    assert_eq!(stdout_of("for i 3, 0 print(i); println();", "vm"), "321\n");
}

#[test]
fn recursive_factorial_via_while() {
    let source = "function fact(n) { var p = 1; var i = 2; while i <= n { p = p * i; i += 1; } return p; } println(fact(5));";
    assert_eq!(stdout_of(source, "interpreter"), "120\n");
    assert_eq!(stdout_of(source, "vm"), "120\n");
}

#[test]
fn string_concatenation_and_repetition() {
    let source = "println('a' + 'b' * 3);";
    assert_eq!(stdout_of(source, "interpreter"), "abbb\n");
    assert_eq!(stdout_of(source, "vm"), "abbb\n");
}

#[test]
fn undefined_name_produces_the_documented_diagnostic() {
    let output = run_program("println(x);", "interpreter");
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).expect("stderr was not valid utf-8");
    assert!(stderr.starts_with("Error: no such symbol 'x' referenced at line 1, character 9"));
    assert!(stderr.contains("println(x);"));
    assert!(stderr.trim_end().ends_with('^'));
}

#[test]
fn divide_by_zero_is_a_runtime_error_on_both_engines() {
    for engine in ["interpreter", "vm"] {
        let output = run_program("println(1 / 0);", engine);
        assert!(!output.status.success(), "engine {engine} unexpectedly succeeded");
        let stderr = String::from_utf8(output.stderr).expect("stderr was not valid utf-8");
        assert!(stderr.contains("divide by zero"));
    }
}

#[test]
fn wrong_argument_count_is_rejected_the_same_way_on_both_engines() {
    let source = "function f(a) { } println(f(1, 2, 3));";
    for engine in ["interpreter", "vm"] {
        let output = run_program(source, engine);
        assert!(!output.status.success(), "engine {engine} unexpectedly succeeded");
        let stderr = String::from_utf8(output.stderr).expect("stderr was not valid utf-8");
        assert!(stderr.contains("expects 1 argument"), "engine {engine}: {stderr}");
    }
}

#[test]
fn calling_a_non_function_is_not_callable_on_both_engines() {
    let source = "var x = 1; x();";
    for engine in ["interpreter", "vm"] {
        let output = run_program(source, engine);
        assert!(!output.status.success(), "engine {engine} unexpectedly succeeded");
        let stderr = String::from_utf8(output.stderr).expect("stderr was not valid utf-8");
        assert!(stderr.contains("not callable"), "engine {engine}: {stderr}");
    }
}
