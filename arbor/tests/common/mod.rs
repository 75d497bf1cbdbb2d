//! Common test utilities for integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use arbor::{Configuration, YamlSource};

/// Writes `contents` to `name` inside `dir` and returns the path.
#[allow(dead_code)]
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// Opens and loads a YAML-backed configuration.
#[allow(dead_code)]
pub fn load_yaml(path: &Path) -> Configuration {
    let mut config = Configuration::new(YamlSource::from_file(path));
    config.load().unwrap();
    config
}

/// Reads a file back as text.
#[allow(dead_code)]
pub fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}
