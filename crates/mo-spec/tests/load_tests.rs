//! Specification file loading

use mo_spec::{InputError, LoadError, Phase, SpecError, TestSpecification, TopologyType};
use pretty_assertions::assert_eq;
use std::io::Write;

const SHARDED_SPEC: &str = r#"{
    "description": "sharded cluster smoke test",
    "type": "Sharded",
    "initConfig": {
        "id": "shard_cluster_1",
        "shards": [ { "id": "sh01", "shardParams": { "procParams": { "port": 27217 } } } ],
        "routers": [ { "port": 27017 } ],
        "configsvrs": [ { "port": 27117 } ]
    },
    "phases": [
        { "MOOperation": { "method": "POST", "uri": "/v1/sharded_clusters/shard_cluster_1/shards/sh01", "payload": { "action": "restart" } } },
        { "clientOperation": { "operation": "insertOne", "document": { "_id": 1 }, "outcome": { "result": { "insertedId": 1 } } } }
    ]
}"#;

fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_from_file() {
    let file = write_temp(SHARDED_SPEC);

    let spec = TestSpecification::load(file.path()).unwrap();

    assert_eq!(spec.description, "sharded cluster smoke test");
    assert_eq!(spec.topology, TopologyType::Sharded);
    assert_eq!(spec.deployment_id().unwrap(), "shard_cluster_1");
    assert_eq!(spec.phases.len(), 2);

    let kinds: Vec<_> = spec
        .phases
        .iter()
        .enumerate()
        .map(|(i, p)| Phase::parse(i, p).unwrap().kind())
        .collect();
    assert_eq!(kinds, vec!["MOOperation", "clientOperation"]);
}

#[test]
fn test_missing_file_is_input_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = TestSpecification::load(dir.path().join("absent.json")).unwrap_err();

    assert!(matches!(err, LoadError::Input(InputError::Io { .. })));
}

#[test]
fn test_invalid_json_is_input_error() {
    let file = write_temp("{ \"description\": ");
    let err = TestSpecification::load(file.path()).unwrap_err();

    assert!(matches!(err, LoadError::Input(InputError::InvalidJson { .. })));
}

#[test]
fn test_missing_init_config_is_spec_error() {
    let err = TestSpecification::from_json_str(
        r#"{ "description": "d", "type": "Standalone" }"#,
        "inline",
    )
    .unwrap_err();

    assert!(matches!(err, LoadError::Spec(SpecError::MissingField("initConfig"))));
}
