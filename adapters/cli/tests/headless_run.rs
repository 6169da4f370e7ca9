use std::process::{Command, Output};

fn stackrise(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stackrise"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to launch the stackrise binary")
}

fn grid_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|line| line.starts_with('|'))
        .map(str::to_owned)
        .collect()
}

#[test]
fn prints_the_final_grid() {
    let output = stackrise(&["--ticks", "30", "--seed", "5", "--width", "4", "--height", "6"]);
    assert!(output.status.success(), "run failed: {output:?}");

    let grid = grid_lines(&output);
    assert_eq!(grid.len(), 6);
    assert!(grid.iter().all(|line| line.len() == 6));
}

#[test]
fn encoded_layout_restores_the_same_grid() {
    let first = stackrise(&["--ticks", "0", "--seed", "11", "--print-layout"]);
    assert!(first.status.success(), "run failed: {first:?}");
    let stdout = String::from_utf8_lossy(&first.stdout).into_owned();
    let layout = stdout
        .lines()
        .find(|line| line.starts_with("stack:v1:"))
        .expect("layout printed")
        .to_owned();

    let second = stackrise(&["--ticks", "0", "--layout", &layout, "--print-layout"]);
    assert!(second.status.success(), "run failed: {second:?}");
    assert_eq!(grid_lines(&first), grid_lines(&second));
    assert!(String::from_utf8_lossy(&second.stdout).contains(&layout));
}

#[test]
fn short_layout_ignores_the_default_starting_rows() {
    // Four rows leave no room for the four default starting rows.
    let output = stackrise(&["--ticks", "0", "--layout", "stack:v1:3x4:eyJibG9ja3MiOltdfQ"]);
    assert!(output.status.success(), "run failed: {output:?}");
    assert_eq!(grid_lines(&output).len(), 4);
}

#[test]
fn oversized_grid_is_rejected() {
    let output = stackrise(&["--ticks", "0", "--width", "100000", "--height", "100000"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid configuration"));
}

#[test]
fn malformed_swap_is_rejected() {
    let output = stackrise(&["--swap", "1,2:sideways"]);
    assert!(!output.status.success());
}
