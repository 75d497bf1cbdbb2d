//! YAML-backed configuration source.
//!
//! Files are read whole. Leading comment lines form the header, which is
//! kept across load and save. Tabs are expanded to four spaces before
//! parsing so hand-edited files with tab indentation still load. A missing
//! file, an empty document or a document whose top level is not a mapping
//! all load as an empty snapshot.
//!
//! Byte sequences are written as hex text tagged `!bytes` and read back as
//! bytes.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::{Mapping, Value as Yaml};

use crate::error::Result;
use crate::value::{Snapshot, Value, BYTES_TAG};

use super::source::Source;

const COMMENT: char = '#';

#[derive(Debug, Clone)]
enum Origin {
    File(PathBuf),
    Text(Arc<Mutex<String>>),
}

/// A [`Source`] that reads and writes YAML.
///
/// # Examples
///
/// ```
/// use arbor::{Configuration, ValueHolder, YamlSource};
///
/// let source = YamlSource::from_text("# settings\nserver:\n  port: 8080\n");
/// let mut config = Configuration::new(source.clone());
/// config.load().unwrap();
/// assert_eq!(config.get_node("server.port").unwrap().get_int(0), 8080);
///
/// config.save().unwrap();
/// assert!(source.text().starts_with("# settings\n"));
/// ```
#[derive(Debug, Clone)]
pub struct YamlSource {
    origin: Origin,
    header: Vec<String>,
}

impl YamlSource {
    /// A source backed by the file at `path`.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            origin: Origin::File(path.into()),
            header: Vec::new(),
        }
    }

    /// A source backed by an in-memory document. Saving replaces the text.
    ///
    /// Clones share the document.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            origin: Origin::Text(Arc::new(Mutex::new(text.into()))),
            header: Vec::new(),
        }
    }

    /// The current document text, for text-backed sources.
    #[must_use]
    pub fn text(&self) -> String {
        match &self.origin {
            Origin::Text(text) => text.lock().clone(),
            Origin::File(path) => fs::read_to_string(path).unwrap_or_default(),
        }
    }

    /// The header lines, without their comment markers.
    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Replaces the header. A single argument containing newlines is split.
    pub fn set_header<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lines: Vec<String> = lines
            .into_iter()
            .map(|line| line.as_ref().to_string())
            .collect();
        if lines.len() == 1 {
            lines = lines[0].lines().map(str::to_string).collect();
        }
        self.header = lines.iter().map(|line| strip_comment(line)).collect();
    }

    fn read(&self) -> Result<Option<String>> {
        match &self.origin {
            Origin::Text(text) => Ok(Some(text.lock().clone())),
            Origin::File(path) => match fs::read_to_string(path) {
                Ok(contents) => Ok(Some(contents)),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    log::debug!("{} does not exist yet; starting empty", path.display());
                    Ok(None)
                }
                Err(e) => Err(e.into()),
            },
        }
    }

    /// Renders `snapshot` with the current header.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be emitted as YAML.
    pub fn render(&self, snapshot: &Snapshot) -> Result<String> {
        let mut out = String::new();
        if !self.header.is_empty() {
            for line in &self.header {
                out.push(COMMENT);
                out.push(' ');
                out.push_str(line);
                out.push('\n');
            }
            out.push('\n');
        }
        if !snapshot.is_empty() {
            out.push_str(&serde_yaml::to_string(&mapping(snapshot)?)?);
        }
        Ok(out)
    }
}

fn mapping(snapshot: &Snapshot) -> Result<Yaml> {
    let mut map = Mapping::with_capacity(snapshot.len());
    for (key, value) in snapshot {
        map.insert(Yaml::String(key.clone()), to_yaml(value)?);
    }
    Ok(Yaml::Mapping(map))
}

fn to_yaml(value: &Value) -> Result<Yaml> {
    Ok(match value {
        Value::Bytes(bytes) => Yaml::Tagged(Box::new(TaggedValue {
            tag: Tag::new(BYTES_TAG),
            value: Yaml::String(hex::encode(bytes)),
        })),
        Value::List(items) => Yaml::Sequence(items.iter().map(to_yaml).collect::<Result<_>>()?),
        Value::Map(entries) => mapping(entries)?,
        // Shortest f32 text, not the digits of the widened f64
        Value::F32(n) => {
            let widened = n.to_string().parse().unwrap_or(f64::from(*n));
            Yaml::Number(widened.into())
        }
        scalar => serde_yaml::to_value(scalar)?,
    })
}

fn strip_comment(line: &str) -> String {
    let line = line.trim();
    line.strip_prefix(COMMENT)
        .map_or(line, |rest| rest.strip_prefix(' ').unwrap_or(rest))
        .trim()
        .to_string()
}

/// Parses a YAML document into a snapshot and its header lines.
fn parse(contents: &str) -> Result<(Snapshot, Vec<String>)> {
    let header = contents
        .lines()
        .take_while(|line| line.trim().starts_with(COMMENT))
        .map(strip_comment)
        .collect();
    let expanded = contents.replace('\t', "    ");
    if expanded.trim().is_empty() {
        return Ok((Snapshot::new(), header));
    }
    let raw: serde_yaml::Value = serde_yaml::from_str(&expanded)?;
    let snapshot = match Value::from(raw) {
        Value::Map(map) => map,
        Value::Null => Snapshot::new(),
        other => {
            log::warn!(
                "top level of YAML document is a {}, not a mapping; ignoring it",
                other.kind()
            );
            Snapshot::new()
        }
    };
    Ok((snapshot, header))
}

impl Source for YamlSource {
    fn load(&mut self) -> Result<Snapshot> {
        let Some(contents) = self.read()? else {
            return Ok(Snapshot::new());
        };
        let (snapshot, header) = parse(&contents)?;
        if !header.is_empty() {
            self.header = header;
        }
        Ok(snapshot)
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<()> {
        let rendered = self.render(snapshot)?;
        match &self.origin {
            Origin::Text(text) => *text.lock() = rendered,
            Origin::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, rendered)?;
                log::debug!("wrote {}", path.display());
            }
        }
        Ok(())
    }

    fn file(&self) -> Option<&Path> {
        match &self.origin {
            Origin::File(path) => Some(path),
            Origin::Text(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let mut source = YamlSource::from_file("/nonexistent/arbor/config.yml");
        assert!(source.load().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_yaml_fails() {
        let mut source = YamlSource::from_text("invalid: yaml: syntax:");
        assert!(source.load().is_err());
    }

    #[test]
    fn test_non_mapping_top_level_is_empty() {
        let mut source = YamlSource::from_text("- a\n- b\n");
        assert!(source.load().unwrap().is_empty());
        let mut scalar = YamlSource::from_text("just text");
        assert!(scalar.load().unwrap().is_empty());
    }

    #[test]
    fn test_tabs_are_expanded() {
        let mut source = YamlSource::from_text("server:\n\tport: 1\n");
        let snapshot = source.load().unwrap();
        assert_eq!(snapshot["server"], Value::map([("port", 1)]));
    }

    #[test]
    fn test_header_survives_round_trip() {
        let mut source = YamlSource::from_text("# first\n#second\nkey: value\n");
        let snapshot = source.load().unwrap();
        assert_eq!(source.header(), ["first", "second"]);
        source.save(&snapshot).unwrap();
        assert_eq!(source.text(), "# first\n# second\n\nkey: value\n");
    }

    #[test]
    fn test_set_header_splits_single_argument() {
        let mut source = YamlSource::from_text("");
        source.set_header(["# one\ntwo"]);
        assert_eq!(source.header(), ["one", "two"]);
    }

    #[test]
    fn test_bytes_are_tagged_hex() {
        let mut source = YamlSource::from_text("");
        let snapshot: Snapshot = [
            ("raw".to_string(), Value::Bytes(vec![0x00, 0xff, 0x10])),
            ("ints".to_string(), Value::list([0, 255])),
        ]
        .into_iter()
        .collect();
        source.save(&snapshot).unwrap();
        assert!(source.text().contains("raw: !bytes 00ff10"));

        let reloaded = source.load().unwrap();
        assert_eq!(reloaded, snapshot);
        assert_eq!(reloaded["ints"], Value::list([0, 255]));
    }

    #[test]
    fn test_bad_bytes_tag_stays_text() {
        let mut source = YamlSource::from_text("raw: !bytes zz
");
        assert_eq!(source.load().unwrap()["raw"], Value::from("zz"));
    }

    #[test]
    fn test_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.yml");
        let mut source = YamlSource::from_file(&path);
        let snapshot: Snapshot = [
            ("name".to_string(), Value::from("arbor")),
            ("ports".to_string(), Value::list([1, 2])),
        ]
        .into_iter()
        .collect();
        source.save(&snapshot).unwrap();
        assert_eq!(source.file(), Some(path.as_path()));

        let mut reread = YamlSource::from_file(&path);
        assert_eq!(reread.load().unwrap(), snapshot);
    }
}
