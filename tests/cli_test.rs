use anyhow::Result;
use colmutate::access::{Column, Value};
use colmutate::plan::MutateReport;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

const TABLE: &str = r#"{
    "columns": [
        {"name": "g", "type": "varchar", "values": ["A", "A", "B"]},
        {"name": "x", "type": "int32", "values": [1, 2, 10]},
        {"name": "y", "type": "int32", "values": [5, 6, 7]}
    ],
    "group_by": ["g"]
}"#;

fn colmutate() -> Command {
    Command::new(env!("CARGO_BIN_EXE_colmutate"))
}

#[test]
fn test_cli_writes_report() -> Result<()> {
    let dir = tempdir()?;
    let table = dir.path().join("table.json");
    let plan = dir.path().join("plan.json");
    let output = dir.path().join("out.json");
    fs::write(&table, TABLE)?;
    fs::write(
        &plan,
        r#"{
            "expressions": [
                {"name": "m", "expr": {"function_call": {"name": "mean", "args": [{"column": "x"}]}}},
                {"name": "r", "expr": {"function_call": {"name": "sqrt", "args": [
                    {"binary_op": {"op": "sub", "left": {"column": "x"}, "right": {"literal": 2}}}
                ]}}}
            ],
            "keep": "used",
            "placement": {"before": "x"}
        }"#,
    )?;

    let status = colmutate()
        .arg("--table")
        .arg(&table)
        .arg("--plan")
        .arg(&plan)
        .arg("--output")
        .arg(&output)
        .status()?;
    assert!(status.success());

    let report: MutateReport = serde_json::from_str(&fs::read_to_string(&output)?)?;
    let table = report.table.into_table()?;
    assert_eq!(table.column_names(), &["g", "m", "r", "x"]);
    assert_eq!(table.column("m"), Some(&Column::float64([1.5, 1.5, 10.0])));
    assert_eq!(table.column("r").and_then(|c| c.get(1)), Some(&Value::Float64(0.0)));
    assert_eq!(report.used, vec!["x"]);
    assert_eq!(report.warnings.len(), 1);
    Ok(())
}

#[test]
fn test_cli_prints_to_stdout() -> Result<()> {
    let dir = tempdir()?;
    let table = dir.path().join("table.json");
    let plan = dir.path().join("plan.json");
    fs::write(&table, TABLE)?;
    fs::write(
        &plan,
        r#"{"expressions": [{"name": "y", "expr": {"literal": null}}]}"#,
    )?;

    let output = colmutate()
        .args(["--table", table.to_str().unwrap_or_default()])
        .args(["--plan", plan.to_str().unwrap_or_default()])
        .output()?;
    assert!(output.status.success());

    let report: MutateReport = serde_json::from_slice(&output.stdout)?;
    let names: Vec<&str> = report.table.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["g", "x"]);
    assert_eq!(report.table.group_by, vec!["g"]);
    Ok(())
}

#[test]
fn test_cli_reports_failures() -> Result<()> {
    let dir = tempdir()?;
    let table = dir.path().join("table.json");
    let plan = dir.path().join("plan.json");
    fs::write(&table, TABLE)?;
    fs::write(
        &plan,
        r#"{"expressions": [{"name": "bad", "expr": {"function_call": {"name": "c", "args": [{"literal": 1}, {"literal": 2}, {"literal": 3}]}}}]}"#,
    )?;

    let output = colmutate()
        .arg("--table")
        .arg(&table)
        .arg("--plan")
        .arg(&plan)
        .output()?;
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("result must be size 1 or 2, not 3"));
    Ok(())
}
