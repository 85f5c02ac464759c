use std::process::{Command, Output};

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cache-sweep"))
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn small_sweep_prints_every_section() {
    let out = run(&[
        "--start",
        "1024",
        "--end",
        "4096",
        "--access-factor",
        "1",
        "--seed",
        "3",
        "--backward",
    ]);
    assert!(out.status.success(), "{:?}", out);
    let stdout = String::from_utf8_lossy(&out.stdout);

    assert!(stdout.starts_with("# Access padding: 0\n#\n"), "{}", stdout);
    for section in [
        "# sequential list forward",
        "# sequential list backward",
        "# random list forward",
    ] {
        assert!(stdout.contains(section), "{}", stdout);
    }

    let sizes: Vec<&str> = stdout
        .lines()
        .filter(|l| !l.starts_with('#') && !l.trim().is_empty())
        .filter_map(|l| l.split_whitespace().nth(1))
        .collect();
    assert_eq!(
        sizes,
        vec!["1024", "2048", "4096", "1024", "2048", "4096", "1024", "2048", "4096"]
    );
}

#[test]
fn threaded_sweep_reports_each_thread() {
    let out = run(&[
        "--start",
        "1024",
        "--end",
        "1024",
        "--access-factor",
        "1",
        "--threads",
        "2",
    ]);
    assert!(out.status.success(), "{:?}", out);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("# random list forward (thread 1)"), "{}", stdout);
}

#[test]
fn empty_range_fails() {
    let out = run(&["--start", "4096", "--end", "1024"]);
    assert!(!out.status.success());
}
