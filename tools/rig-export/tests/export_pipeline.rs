//! Integration tests for rig-export
//!
//! Tests the full pipeline: write a rig document -> run the CLI -> read the output back

use rig_common::{BallJoint, SkinFile};
use serde_json::json;
use std::path::Path;
use tempfile::tempdir;

/// Hips with two legs and a foot, one weighted triangle per leg
fn biped_rig() -> serde_json::Value {
    let hips = json!([{ "group": "mixamorig:Hips", "weight": 1.0 }]);
    let left = json!([
        { "group": "mixamorig:Hips", "weight": 0.5 },
        { "group": "mixamorig:LeftLeg", "weight": 0.5 },
    ]);
    let foot = json!([{ "group": "mixamorig:RightFoot", "weight": 1.0 }]);

    json!({
        "armature": {
            "name": "Biped",
            "prepared": true,
            "bones": [
                { "name": "mixamorig:Hips", "head": [0, 0, 100], "tail": [0, 0, 110] },
                { "name": "mixamorig:RightLeg", "parent": "mixamorig:Hips",
                  "head": [-10, 0, 100], "tail": [-10, 0, 50] },
                { "name": "mixamorig:LeftLeg", "parent": "mixamorig:Hips",
                  "head": [10, 0, 100], "tail": [10, 0, 50] },
                { "name": "mixamorig:RightFoot", "parent": "mixamorig:RightLeg",
                  "head": [-10, 0, 50], "tail": [-10, -10, 0] },
            ]
        },
        "mesh": {
            "name": "Body",
            "prepared": true,
            "vertices": [
                { "position": [0, 0, 100], "normal": [0, -1, 0], "groups": hips },
                { "position": [10, 0, 100], "normal": [0, -1, 0], "groups": left },
                { "position": [10, 0, 50], "normal": [0, -1, 0], "groups": left },
                { "position": [-10, 0, 0], "normal": [0, -1, 0], "groups": foot },
            ],
            "faces": [[0, 1, 2], [0, 2, 3]]
        }
    })
}

fn write_rig(path: &Path, rig: &serde_json::Value) {
    let text = serde_json::to_string_pretty(rig).expect("Failed to serialize rig");
    std::fs::write(path, text).expect("Failed to write rig document");
}

// Helper to run a rig-export subcommand, returning whether it succeeded
fn rig_export(args: &[&str]) -> bool {
    std::process::Command::new(env!("CARGO_BIN_EXE_rig-export"))
        .args(args)
        .status()
        .expect("Failed to run rig-export")
        .success()
}

/// Test rig document -> .skel + .skin via the build command
#[test]
fn test_build_writes_matching_pair() {
    let dir = tempdir().expect("Failed to create temp dir");
    let rig_path = dir.path().join("biped.json");
    write_rig(&rig_path, &biped_rig());

    assert!(rig_export(&["build", rig_path.to_str().unwrap()]));

    let skel = std::fs::read_to_string(dir.path().join("biped.skel")).expect("Missing .skel");
    let skin = std::fs::read_to_string(dir.path().join("biped.skin")).expect("Missing .skin");

    assert!(skel.starts_with("balljoint Hips {\r\n"));
    assert!(skel.ends_with("}\r\n"));
    assert!(!skel.replace("\r\n", "").contains('\n'), "bare LF in .skel");

    let root = BallJoint::parse(&skel).expect("Failed to parse .skel");
    assert_eq!(
        root.depth_first_names(),
        vec!["Hips", "RightLeg", "RightFoot", "LeftLeg"]
    );
    assert_eq!(root.offset, [0.0, 1.0, -1.0]);

    let skin = SkinFile::parse(&skin).expect("Failed to parse .skin");
    skin.validate(Some(root.joint_count()))
        .expect("Skin inconsistent with skeleton");
    assert_eq!(skin.positions.len(), 4);
    assert_eq!(skin.triangles, vec![[0, 1, 2], [0, 2, 3]]);

    // Vertex groups remapped through the depth-first table
    assert_eq!(skin.skin_weights[1][1].bone, 3);
    assert_eq!(skin.skin_weights[3][0].bone, 2);

    // Bindings follow the same table: RightFoot head is third
    let foot = skin.bindings[2];
    assert!((foot[9] + 0.1).abs() < 1e-5);
    assert!((foot[10] - 0.5).abs() < 1e-5);
    assert!((foot[11] + 1.0).abs() < 1e-5);
}

/// Test single-file commands with explicit outputs and a config file
#[test]
fn test_skel_and_skin_commands() {
    let dir = tempdir().expect("Failed to create temp dir");
    let rig_path = dir.path().join("rig.json");
    let skel_path = dir.path().join("out.skel");
    let skin_path = dir.path().join("out.skin");
    let config_path = dir.path().join("export.toml");
    write_rig(&rig_path, &biped_rig());
    std::fs::write(&config_path, "scale = 0.02\nname_prefix_len = 0\n")
        .expect("Failed to write config");

    let config = config_path.to_str().unwrap();
    assert!(rig_export(&[
        "--config",
        config,
        "skel",
        rig_path.to_str().unwrap(),
        "-o",
        skel_path.to_str().unwrap(),
    ]));
    assert!(rig_export(&[
        "--config",
        config,
        "skin",
        rig_path.to_str().unwrap(),
        "-o",
        skin_path.to_str().unwrap(),
    ]));

    let root = BallJoint::parse(&std::fs::read_to_string(&skel_path).unwrap()).unwrap();
    assert_eq!(root.name, "mixamorig:Hips");
    assert_eq!(root.offset, [0.0, 2.0, -1.0]);

    let skin = SkinFile::parse(&std::fs::read_to_string(&skin_path).unwrap()).unwrap();
    assert_eq!(skin.positions[3], [-0.2, 0.0, -1.0]);
}

/// Test that check validates without writing anything
#[test]
fn test_check_writes_nothing() {
    let dir = tempdir().expect("Failed to create temp dir");
    let rig_path = dir.path().join("rig.json");
    write_rig(&rig_path, &biped_rig());

    assert!(rig_export(&["check", rig_path.to_str().unwrap()]));
    assert!(rig_export(&["bones", rig_path.to_str().unwrap()]));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

/// Test that a rejected export leaves any previous output untouched
#[test]
fn test_failed_export_keeps_previous_output() {
    let dir = tempdir().expect("Failed to create temp dir");
    let rig_path = dir.path().join("rig.json");
    let skin_path = dir.path().join("rig.skin");
    std::fs::write(&skin_path, "previous").unwrap();

    let mut rig = biped_rig();
    rig["mesh"]["faces"] = json!([[0, 1, 2, 3]]);
    write_rig(&rig_path, &rig);

    assert!(!rig_export(&["skin", rig_path.to_str().unwrap()]));
    assert_eq!(std::fs::read_to_string(&skin_path).unwrap(), "previous");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
}

/// Test that unprepared input is refused before any output exists
#[test]
fn test_unprepared_rig_writes_nothing() {
    let dir = tempdir().expect("Failed to create temp dir");
    let rig_path = dir.path().join("rig.json");

    let mut rig = biped_rig();
    rig["armature"]["prepared"] = json!(false);
    write_rig(&rig_path, &rig);

    assert!(!rig_export(&["build", rig_path.to_str().unwrap()]));
    assert!(!dir.path().join("rig.skel").exists());
    assert!(!dir.path().join("rig.skin").exists());
}

/// Test the library entry point against the CLI output
#[test]
fn test_library_matches_cli() {
    let dir = tempdir().expect("Failed to create temp dir");
    let rig_path = dir.path().join("rig.json");
    write_rig(&rig_path, &biped_rig());

    let config = rig_export::ExportConfig::default();
    let outputs = rig_export::convert_rig(&rig_path, None, &config).expect("Export failed");
    assert_eq!(outputs.joint_count, 4);
    assert_eq!(outputs.vertex_count, 4);
    assert_eq!(outputs.triangle_count, 2);

    let skeleton = rig_export::convert_skeleton_to_memory(&rig_path, &config).unwrap();
    assert_eq!(
        std::fs::read_to_string(&outputs.skeleton_path).unwrap(),
        skeleton.to_text()
    );
    let skin = rig_export::convert_skin_to_memory(&rig_path, &config).unwrap();
    assert_eq!(
        std::fs::read_to_string(&outputs.skin_path).unwrap(),
        skin.to_text()
    );
}
