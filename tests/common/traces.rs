//! Command streams shaped like real tracer output

use serde_json::{json, Value};
use stepviz::Command;

fn cmd(key: &str, method: &str, args: Value) -> Command {
    Command::keyed(key, method, args.as_array().cloned().unwrap_or_default())
}

/// Bubble sort over `values` with an array, a mirrored chart and a log,
/// stacked in a vertical layout. Each comparison and each swap is a step.
pub fn bubble_sort(values: &[i64]) -> Vec<Command> {
    let mut data = values.to_vec();
    let mut commands = vec![
        cmd("chart", "ChartTracer", json!(["Chart"])),
        cmd("array", "Array1DTracer", json!(["Array"])),
        cmd("log", "LogTracer", json!(["Console"])),
        cmd("layout", "VerticalLayout", json!([["chart", "array", "log"]])),
        Command::set_root("layout"),
        cmd("array", "set", json!([data])),
        cmd("chart", "set", json!([data])),
        cmd("array", "chart", json!(["chart"])),
        Command::delay(0),
    ];

    let n = data.len();
    for i in 0..n {
        for j in 0..n.saturating_sub(i + 1) {
            commands.push(cmd("array", "select", json!([j, j + 1])));
            commands.push(cmd(
                "log",
                "printf",
                json!(["compare %d and %d\n", data[j], data[j + 1]]),
            ));
            commands.push(Command::delay(4));
            if data[j] > data[j + 1] {
                data.swap(j, j + 1);
                commands.push(cmd("array", "patch", json!([j, data[j]])));
                commands.push(cmd("array", "patch", json!([j + 1, data[j + 1]])));
                commands.push(Command::delay(6));
                commands.push(cmd("array", "depatch", json!([j])));
                commands.push(cmd("array", "depatch", json!([j + 1])));
            }
            commands.push(cmd("array", "deselect", json!([j, j + 1])));
        }
    }
    commands.push(cmd("log", "println", json!(["sorted"])));
    commands
}

/// Depth-first walk of a small tree, logging visits.
pub fn tree_walk() -> Vec<Command> {
    let mut commands = vec![
        cmd("graph", "GraphTracer", json!(["Tree"])),
        cmd("log", "LogTracer", json!([])),
        cmd("root", "HorizontalLayout", json!([["graph", "log"]])),
        Command::set_root("root"),
        cmd("graph", "log", json!(["log"])),
        cmd(
            "graph",
            "set",
            json!([[
                [0, 1, 1, 0],
                [0, 0, 0, 1],
                [0, 0, 0, 0],
                [0, 0, 0, 0]
            ]]),
        ),
        cmd("graph", "layoutTree", json!([0])),
        Command::delay(1),
    ];
    for (target, source) in [(0, None), (1, Some(0)), (3, Some(1)), (2, Some(0))] {
        let args = match source {
            Some(source) => json!([target, source]),
            None => json!([target]),
        };
        commands.push(cmd("graph", "visit", args));
        commands.push(Command::delay(target as u32 + 2));
    }
    commands
}
