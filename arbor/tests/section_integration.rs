//! Integration tests for section binding and key migration on YAML files.

mod common;

use std::path::Path;

use arbor::{
    Binding, Configuration, Migrator, Nested, NewJoinedKey, NewKey, Section,
    SectionConfiguration, ValueHolder, YamlSource,
};
use common::{load_yaml, write_file};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pool {
    size: i32,
    idle: i64,
}

impl Default for Pool {
    fn default() -> Self {
        Self { size: 4, idle: 30 }
    }
}

impl Section for Pool {
    const NAME: &'static str = "pool";

    fn bindings() -> Vec<Binding<Self>> {
        vec![
            Binding::new(["size"], |s: &Self| s.size, |s: &mut Self, v| s.size = v),
            Binding::new(["idle"], |s: &Self| s.idle, |s: &mut Self, v| s.idle = v),
        ]
    }
}

#[derive(Debug, Default)]
struct Database {
    url: String,
    replicas: Vec<String>,
    pool: Nested<Pool>,
}

impl Section for Database {
    const NAME: &'static str = "database";

    fn bindings() -> Vec<Binding<Self>> {
        vec![
            Binding::new(
                ["database", "url"],
                |s: &Self| s.url.clone(),
                |s: &mut Self, v| s.url = v,
            ),
            Binding::new(
                ["database", "replicas"],
                |s: &Self| s.replicas.clone(),
                |s: &mut Self, v| s.replicas = v,
            ),
            Binding::new(
                ["database", "pool"],
                |s: &Self| s.pool.clone(),
                |s: &mut Self, v| s.pool = v,
            ),
        ]
    }
}

fn bind(path: &Path) -> SectionConfiguration<Database> {
    SectionConfiguration::new(Configuration::new(YamlSource::from_file(path)), Database::default())
}

#[test]
fn test_section_loads_and_completes_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        dir.path(),
        "db.yml",
        "database:\n  url: postgres://db\n  pool:\n    size: '16'\n",
    );

    let mut db = bind(&path);
    assert!(!db.is_configured());
    db.load().unwrap();
    assert!(db.is_configured());
    assert_eq!(db.section().url, "postgres://db");
    assert!(db.section().replicas.is_empty());
    assert_eq!(db.section().pool.0, Pool { size: 16, idle: 30 });

    db.section_mut().replicas.push("replica-1".to_string());
    db.save().unwrap();

    let mut reloaded = load_yaml(&path);
    assert_eq!(
        reloaded.get_node("database.replicas").unwrap().get_string_list(),
        ["replica-1"]
    );
    assert_eq!(reloaded.get_node("database.pool.size").unwrap().get_int(0), 16);
    assert_eq!(reloaded.get_node("database.pool.idle").unwrap().get_int(0), 30);
}

#[test]
fn test_section_on_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.yml");
    let mut db = bind(&path);
    db.load().unwrap();
    assert_eq!(db.section().pool.0, Pool::default());
    db.save().unwrap();
    assert!(db.configuration().has_node("database.pool.size"));

    let mut reloaded = load_yaml(&path);
    assert_eq!(reloaded.get_node("database.url").unwrap().get_string().as_deref(), Some(""));
    assert_eq!(reloaded.get_keys(false), ["database"]);
}

#[test]
fn test_migrating_a_file_layout() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        dir.path(),
        "legacy.yml",
        "db_url: postgres://old\npool_size: 8\nobsolete: true\n",
    );

    let mut config = load_yaml(&path);
    let migrator = Migrator::new()
        .when(|config| config.has_node("db_url"))
        .rename(["db_url"], NewKey::new(["database", "url"]))
        .rename(["pool_size"], NewJoinedKey::new("database.pool.%", "."))
        .discard(["obsolete"]);
    assert!(migrator.migrate(&mut config).unwrap());
    assert!(dir.path().join("legacy.yml.old").is_file());

    let mut db = bind(&path);
    db.load().unwrap();
    assert_eq!(db.section().url, "postgres://old");
    assert_eq!(db.section().pool.0.size, 4);
    assert_eq!(
        db.configuration().get_node("database.pool.pool_size").unwrap().get_int(0),
        8
    );
    assert!(!db.configuration().has_node("obsolete"));

    // A second run finds nothing to do
    let mut config = load_yaml(&path);
    assert!(!migrator.migrate(&mut config).unwrap());
}
