#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

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

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path for a file under the workspace that does not exist yet.
    pub fn file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.file(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Address {
    pub city: String,
    pub zip: u32,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Person {
    pub name: String,
    pub age: u8,
    pub score: f64,
    pub active: bool,
    pub address: Address,
    pub contact: Option<Contact>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Contact {
    pub phone: String,
}

rowbind::record!(Address {
    city => column(excel = "City", csv = "city"),
    zip => column(excel = "Zip", csv = "zip"),
});

rowbind::record!(Person {
    name => column(excel = "Name", csv = "name"),
    age => column(excel = "Age", csv = "age"),
    score => column(excel = "Score", csv = "score"),
    active => column(excel = "Active", csv = "active"),
    address => nested,
    contact => nested,
});

rowbind::record!(Contact {
    phone => column(excel = "Phone", csv = "phone"),
});

pub const PERSON_COLUMNS: &[&str] = &["Name", "Age", "Score", "Active", "City", "Zip", "Phone"];

pub fn header() -> Vec<String> {
    PERSON_COLUMNS.iter().map(|c| c.to_string()).collect()
}

pub fn sample_people() -> Vec<Person> {
    vec![
        Person {
            name: "Ada".into(),
            age: 36,
            score: 97.5,
            active: true,
            address: Address {
                city: "London".into(),
                zip: 1815,
            },
            contact: Some(Contact {
                phone: "+44 20 7946 0000".into(),
            }),
        },
        Person {
            name: "Grace".into(),
            age: 85,
            score: 88.25,
            active: true,
            address: Address {
                city: "Arlington".into(),
                zip: 22201,
            },
            contact: Some(Contact {
                phone: "555-0100".into(),
            }),
        },
    ]
}
