#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tempfile::{TempDir, tempdir};

/// User id used by fixtures that exercise the assignee shorthand.
pub const ALICE: &str = "6f1c2a3b-4d5e-4f60-8a7b-9c0d1e2f3a4b";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Seeds `workspace.json` with a `tasks` database and the given records.
    pub fn seed_tasks(&self, records: Vec<Value>) -> PathBuf {
        let document = json!({
            "databases": [{
                "id": "tasks",
                "title": "Sprint Tasks",
                "properties": {
                    "Name": {"type": "title"},
                    "Status": {"type": "status", "options": ["Todo", "In progress", "Done"]},
                    "Priority": {"type": "select"},
                    "Points": {"type": "number"},
                    "Tags": {"type": "multi_select"},
                    "Done": {"type": "checkbox"},
                    "Due Date": {"type": "date"},
                    "Assignee": {"type": "people"},
                    "Total": {"type": "formula"}
                },
                "records": records
            }]
        });
        self.write(
            "workspace.json",
            &serde_json::to_string_pretty(&document).expect("serialize workspace"),
        )
    }

    /// Records currently stored for `tasks`.
    pub fn stored_records(&self) -> Vec<Value> {
        let raw = std::fs::read_to_string(self.path().join("workspace.json"))
            .expect("read workspace file");
        let document: Value = serde_json::from_str(&raw).expect("parse workspace file");
        document["databases"][0]["records"]
            .as_array()
            .cloned()
            .unwrap_or_default()
    }
}

/// A stored record in the workspace file's JSON shape.
pub fn task(id: &str, name: &str, status: &str, points: f64, assignee: Option<&str>) -> Value {
    let mut properties = json!({
        "Name": {"title": [{"text": {"content": name}}]},
        "Status": {"status": {"name": status}},
        "Points": {"number": points}
    });
    if let Some(user) = assignee {
        properties["Assignee"] = json!({"people": [{"id": user}]});
    }
    json!({
        "id": id,
        "created_time": "2026-01-05T09:30:00Z",
        "properties": properties
    })
}
