//! Integration tests for tree structure: attachment, cycles, separators and
//! handle lifetimes.

use arbor::{Configuration, Error, MapSource, Parent, Shape, Snapshot, Value, ValueHolder};

fn sample() -> Configuration {
    Configuration::from_snapshot(
        [
            (
                "server".to_string(),
                Value::map([("host", Value::from("localhost")), ("port", Value::from(80))]),
            ),
            ("tags".to_string(), Value::list(["a", "b"])),
        ]
        .into_iter()
        .collect(),
    )
}

#[test]
fn test_detached_nodes_attach_on_write() {
    let mut config = sample();
    let mut node = config.get_node("db.pool.size").unwrap();
    assert!(!node.is_attached());
    assert_eq!(node.id(), None);
    node.set_value(8).unwrap();
    assert!(node.is_attached());
    assert!(matches!(node.parent(), Some(Parent::Node(_))));

    assert_eq!(config.get_keys(false), ["server", "tags", "db"]);
    assert_eq!(config.get_node("db").unwrap().shape(), Shape::Mapping);
}

#[test]
fn test_cycles_are_rejected_without_changes() {
    let mut config = sample();
    let server = config.get_node("server").unwrap().id().unwrap();
    let before = config.dump();

    let err = config
        .get_node("server.host")
        .unwrap()
        .add_child(server)
        .unwrap_err();
    assert!(matches!(err, Error::CircularParent { .. }));
    assert!(err.is_programming_error());

    // A detached owner whose future ancestors include the child
    let err = config
        .get_node("server.x.y")
        .unwrap()
        .add_child(server)
        .unwrap_err();
    assert!(matches!(err, Error::CircularParent { .. }));
    assert_eq!(config.dump(), before);
}

#[test]
fn test_writes_through_scalars_and_sequences_fail() {
    let mut config = sample();
    let before = config.dump();

    let err = config.set("server.port.number", 1).unwrap_err();
    assert!(err.is_structural());
    assert!(config.get_node("server.port.number").is_err());

    let err = config.add_node("tags.extra").unwrap_err();
    assert!(err.is_structural());
    assert_eq!(config.dump(), before);
}

#[test]
fn test_moving_a_node_between_parents() {
    let mut config = sample();
    let host = config.get_node("server.host").unwrap().id().unwrap();
    let previous = config.get_node("backup").unwrap().add_child(host).unwrap();
    assert_eq!(previous, None);

    assert!(!config.has_node("server.host"));
    assert!(config.has_node("backup.host"));
    // A moved node keeps the path it was created with
    assert_eq!(config.node(host).unwrap().path_string(), "server.host");
    assert_eq!(config.get_node("backup.host").unwrap().get_string().as_deref(), Some("localhost"));
}

#[test]
fn test_replacing_a_child_detaches_the_old_one() {
    let mut config = sample();
    let old = config.get_node("server.port").unwrap().id().unwrap();
    let fresh = config.create_node(&["port"], 443).unwrap();
    let replaced = config
        .get_node("server")
        .unwrap()
        .add_child(fresh)
        .unwrap();
    assert_eq!(replaced, Some(old));
    assert!(!config.node(old).unwrap().is_attached());
    assert_eq!(config.get_node("server.port").unwrap().get_int(0), 443);
}

#[test]
fn test_sequence_children() {
    let mut config = sample();
    let element = config.create_node(&["c"], "c").unwrap();
    config
        .get_node("tags")
        .unwrap()
        .push_child(element)
        .unwrap();
    assert_eq!(config.get_node("tags").unwrap().get_string_list(), ["a", "b", "c"]);
    assert_eq!(config.get_node("tags.2").unwrap().get_string().as_deref(), Some("c"));

    let mapping = config.create_node(&["m"], 1).unwrap();
    let err = config.get_node("server").unwrap().push_child(mapping).unwrap_err();
    assert!(err.is_structural());
}

#[test]
fn test_custom_separator() {
    let mut config = sample();
    assert!(matches!(config.set_path_separator(""), Err(Error::InvalidSeparator)));
    config.set_path_separator("/").unwrap();
    assert_eq!(config.get_node("server/port").unwrap().get_int(0), 80);
    assert!(config.get_keys(true).contains(&"server/host".to_string()));
    assert!(!config.has_node("server.port"));
}

#[test]
fn test_handles_go_stale_on_reload() {
    let source = MapSource::new([("a".to_string(), Value::from(1))].into_iter().collect());
    let mut config = Configuration::new(source);
    config.load().unwrap();
    let id = config.get_node("a").unwrap().id().unwrap();
    config.load().unwrap();
    assert!(matches!(config.node(id), Err(Error::StaleNode)));
    assert_eq!(config.get_node("a").unwrap().get_int(0), 1);
}

#[test]
fn test_null_clears_children() {
    let mut config = sample();
    let previous = config.set("server", Value::Null).unwrap();
    assert_eq!(
        previous,
        Value::map([("host", Value::from("localhost")), ("port", Value::from(80))])
    );
    let server = config.get_node("server").unwrap();
    assert_eq!(server.shape(), Shape::Null);
    assert!(!server.has_children());
    assert!(config.has_child("server"));
}

#[test]
fn test_remove_and_values() {
    let mut config = sample();
    config.remove("server.host").unwrap();
    assert_eq!(
        config.get_node("server").unwrap().values(),
        [("port".to_string(), Value::from(80))].into_iter().collect::<Snapshot>()
    );
    assert!(config.remove_child("tags").is_some());
    assert_eq!(config.get_keys(false), ["server"]);
}
