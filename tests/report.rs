use strata::{analyze, AnalysisInput, Granularity, StrataConfig, StrataError};

// 2024-01-01T00:00:00Z, a Monday; one tick per day.
const SNAPSHOT: &str = r#"{
    "tickDurationNs": 86400000000000,
    "repoStartEpochS": 1704067200,
    "categories": ["alice", "bob"],
    "records": [
        { "tick": 0, "entityId": 0, "deltaAdded": 100 },
        { "tick": 10, "entityId": 1, "deltaAdded": 50 },
        { "tick": 40, "entityId": 0, "deltaRemoved": 30 }
    ],
    "ownershipSnapshots": {
        "0": [100],
        "40": [70, 50]
    },
    "fileOwnership": [
        { "path": "src/lib.rs", "author": 0, "lines": 70 },
        { "path": "src/net/client.rs", "author": 1, "lines": 50 }
    ],
    "riskFactors": [
        { "path": "src/lib.rs", "size": 70, "churn": 2, "couplingDegree": 1, "ownershipGini": 0.0 },
        { "path": "src/net/client.rs", "size": 50, "churn": 1, "couplingDegree": 1, "ownershipGini": 0.0 }
    ],
    "fileEdits": [
        { "path": "src/lib.rs", "author": 0, "tick": 0 },
        { "path": "src/lib.rs", "author": 1, "tick": 1 },
        { "path": "src/net/client.rs", "author": 1, "tick": 40 }
    ],
    "tickChanges": [
        { "tick": 0, "totalChanges": 10, "renames": 5 },
        { "tick": 1, "totalChanges": 10, "renames": 0 }
    ]
}"#;

const CONFIG: &str = r#"
[knowledge]
max_silos = 1

[timeline]
granularity = "week"
"#;

#[test]
fn snapshot_and_config_from_disk_produce_full_report() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("snapshot.json");
    let config_path = dir.path().join(".strata.toml");
    std::fs::write(&input_path, SNAPSHOT).unwrap();
    std::fs::write(&config_path, CONFIG).unwrap();

    let input = AnalysisInput::from_file(&input_path).unwrap();
    let config = StrataConfig::from_file(&config_path).unwrap();
    let report = analyze(&input, &config).unwrap();

    assert_eq!(report.bus_factor.current, 2);
    assert_eq!(report.bus_factor.timeline.len(), 2);
    assert_eq!(report.ownership.subsystems.len(), 2);

    let timeline = report.timeline.as_ref().unwrap();
    assert_eq!(timeline.granularity, Granularity::Week);
    // Mondays 1 Jan to 5 Feb; the removal on 10 Feb is after the last boundary.
    assert_eq!(timeline.periods.len(), 6);
    assert_eq!(timeline.matrix.column(0).collect::<Vec<_>>(), vec![100; 6]);
    assert_eq!(timeline.matrix.column(1).collect::<Vec<_>>(), vec![0, 0, 50, 50, 50, 50]);
    assert!(timeline.matrix.is_monotonic());

    // 6 months of one-day ticks.
    assert_eq!(report.knowledge.diffusion.window_ticks, 182);
    assert_eq!(report.knowledge.diffusion.silos.len(), 1);
    assert_eq!(report.knowledge.diffusion.silos[0].path, "src/net/client.rs");

    assert_eq!(report.refactoring.refactoring_ticks, 1);
    assert_eq!(report.refactoring.feature_ticks, 1);
}

#[test]
fn report_json_uses_camel_case_keys() {
    let input = AnalysisInput::from_json(SNAPSHOT).unwrap();
    let config = StrataConfig::from_toml(CONFIG).unwrap();
    let report = analyze(&input, &config).unwrap();

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["busFactor"]["health"], "low");
    assert_eq!(json["risk"]["windowDays"], 90);
    assert_eq!(json["risk"]["totalFiles"], 2);
    assert_eq!(json["knowledge"]["windowMonths"], 6);
    assert!(json["knowledge"]["silos"].is_array());
    assert_eq!(json["activity"]["heatmapCommits"].as_array().unwrap().len(), 7);
    assert_eq!(json["timeline"]["axis"]["kind"], "dates");
    assert_eq!(json["timeline"]["axis"]["values"][0], "2024-01-01");
    assert_eq!(json["timeline"]["attempted"][0], "week");
}

#[test]
fn missing_snapshot_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = AnalysisInput::from_file(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, StrataError::FileNotFound(_)));
}

#[test]
fn malformed_snapshot_is_reported() {
    let err = AnalysisInput::from_json("{ \"records\": 3 }").unwrap_err();
    assert!(matches!(err, StrataError::Serialization(_)));
}
