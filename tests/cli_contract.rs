//! Drives the real binary the way an external collector would.

use std::process::Command;

fn fib_bench(args: &[&str]) -> (String, Option<i32>) {
    let output = Command::new(env!("CARGO_BIN_EXE_fib-bench"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap();
    (
        String::from_utf8(output.stdout).unwrap(),
        output.status.code(),
    )
}

#[test]
fn print_dp_five() {
    let (stdout, code) = fib_bench(&["print_dp", "5"]);
    assert_eq!(stdout, "1: 0\n2: 1\n3: 1\n4: 2\n5: 3\nOperations: 5\n");
    assert_eq!(code, Some(0));
}

#[test]
fn print_iter_counts_steps_past_the_first_two() {
    let (stdout, code) = fib_bench(&["print_iter", "10"]);
    assert_eq!(stdout.lines().count(), 11);
    assert!(stdout.contains("10: 34\n"));
    assert!(stdout.ends_with("Operations: 8\n"));
    assert_eq!(code, Some(0));
}

#[test]
fn timing_methods_print_seconds_with_six_decimals() {
    for method in ["iterative", "recursive", "dp"] {
        let (stdout, code) = fib_bench(&[method, "20"]);
        assert_eq!(code, Some(0), "{method}");
        let line = stdout.trim_end();
        assert_eq!(stdout.lines().count(), 1, "{method}");
        let (_, decimals) = line.split_once('.').unwrap();
        assert_eq!(decimals.len(), 6, "{method}");
        assert!(line.parse::<f64>().unwrap() >= 0.0);
    }
}

#[test]
fn invalid_method_does_not_crash() {
    let (stdout, code) = fib_bench(&["quantum", "5"]);
    assert_eq!(stdout, "Invalid method\n");
    assert_eq!(code, Some(0));
}

#[test]
fn missing_arguments_print_usage() {
    let (stdout, code) = fib_bench(&["dp"]);
    assert!(stdout.starts_with("Usage: fib-bench <method> <n>"));
    assert_eq!(code, Some(1));
}

#[test]
fn negative_index_is_an_error() {
    let (stdout, code) = fib_bench(&["iterative", "-3"]);
    assert!(stdout.contains("non-negative"));
    assert_eq!(code, Some(1));
}

#[test]
fn index_past_u64_range_is_an_error() {
    let (stdout, code) = fib_bench(&["iterative", "94"]);
    assert!(stdout.starts_with("Error:"));
    assert_eq!(code, Some(1));
}

#[test]
fn unknown_method_is_reported_before_the_index_range() {
    for n in ["100", "-3"] {
        let (stdout, code) = fib_bench(&["bogus", n]);
        assert_eq!(stdout, "Invalid method\n");
        assert_eq!(code, Some(0));
    }
}

#[test]
fn printers_list_up_to_f93() {
    let (stdout, code) = fib_bench(&["print_iter", "94"]);
    assert_eq!(code, Some(0));
    assert!(stdout.contains("94: 12200160415121876738\n"));
}
