use std::fs;

use approx::assert_relative_eq;
use bop_onepose::PoseError;
use bop_onepose::data_loader::{
    load_ground_truth, load_intrinsics, rendered_frame_paths, write_camera_json,
    write_ground_truth,
};
use bop_onepose::types::{CameraIntrinsics, FrameRecord, SceneGroundTruth};
use nalgebra as na;
use tempfile::tempdir;

const IDENTITY: &str = "[1, 0, 0, 0, 1, 0, 0, 0, 1]";

#[test]
fn test_load_ground_truth() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scene_gt.json");
    let json = format!(
        r#"{{
            "1": [{{"cam_R_m2c": {id}, "cam_t_m2c": [0, 0, 2], "obj_id": 1}}],
            "0": [{{"cam_R_m2c": {id}, "cam_t_m2c": [0, 0, 1], "obj_id": 1}},
                  {{"cam_R_m2c": {id}, "cam_t_m2c": [9, 9, 9], "obj_id": 2}}],
            "10": [{{"cam_R_m2c": {id}, "cam_t_m2c": [0, 0, 3], "obj_id": 1}}]
        }}"#,
        id = IDENTITY
    );
    fs::write(&path, json).unwrap();
    let scene = load_ground_truth(&path).unwrap();
    assert_eq!(scene.len(), 3);
    let order: Vec<u32> = scene.records().map(|r| r.frame_index).collect();
    assert_eq!(order, vec![0, 1, 10]);
    // Second object of frame 0 is ignored.
    assert_eq!(scene.get(0).unwrap().translation, na::Vector3::new(0.0, 0.0, 1.0));
    assert_eq!(scene.get(10).unwrap().translation, na::Vector3::new(0.0, 0.0, 3.0));
}

#[test]
fn test_row_major_rotation() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scene_gt.json");
    fs::write(
        &path,
        r#"{"0": [{"cam_R_m2c": [0, -1, 0, 1, 0, 0, 0, 0, 1], "cam_t_m2c": [1, 2, 3]}]}"#,
    )
    .unwrap();
    let scene = load_ground_truth(&path).unwrap();
    let record = scene.get(0).unwrap();
    assert_eq!(record.rotation[(0, 1)], -1.0);
    assert_eq!(record.rotation[(1, 0)], 1.0);
    assert!(record.is_valid_rotation());
}

#[test]
fn test_malformed_frames() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scene_gt.json");
    let cases = [
        r#"{"0": [{"cam_t_m2c": [0, 0, 1]}]}"#.to_string(),
        format!(r#"{{"0": [{{"cam_R_m2c": {}}}]}}"#, IDENTITY),
        r#"{"0": [{"cam_R_m2c": [1, 0, 0, 0, 1, 0, 0, 0], "cam_t_m2c": [0, 0, 1]}]}"#.to_string(),
        format!(r#"{{"0": [{{"cam_R_m2c": {}, "cam_t_m2c": [0, 1]}}]}}"#, IDENTITY),
        r#"{"0": []}"#.to_string(),
        format!(r#"{{"first": [{{"cam_R_m2c": {}, "cam_t_m2c": [0, 0, 1]}}]}}"#, IDENTITY),
        "not json".to_string(),
    ];
    for case in cases {
        fs::write(&path, &case).unwrap();
        assert!(
            matches!(load_ground_truth(&path), Err(PoseError::Parse { .. })),
            "accepted {}",
            case
        );
    }
}

#[test]
fn test_missing_inputs() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        load_ground_truth(&dir.path().join("scene_gt.json")),
        Err(PoseError::NotFound { .. })
    ));
    assert!(matches!(
        load_intrinsics(&dir.path().join("camera.json")),
        Err(PoseError::NotFound { .. })
    ));
    assert!(matches!(
        rendered_frame_paths(&dir.path().join("rgb")),
        Err(PoseError::NotFound { .. })
    ));
}

#[test]
fn test_load_intrinsics() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("camera.json");
    fs::write(
        &path,
        r#"{"cx": 320.0, "cy": 240.0, "depth_scale": 0.1, "fx": 600.0, "fy": 601.0, "height": 480, "width": 640}"#,
    )
    .unwrap();
    let intrinsics = load_intrinsics(&path).unwrap();
    assert_eq!(intrinsics, CameraIntrinsics::new(600.0, 601.0, 320.0, 240.0));

    fs::write(&path, r#"{"fx": 600.0, "fy": 601.0, "cx": 320.0}"#).unwrap();
    assert!(matches!(load_intrinsics(&path), Err(PoseError::Parse { .. })));
    fs::write(&path, r#"{"fx": 0.0, "fy": 601.0, "cx": 320.0, "cy": 240.0}"#).unwrap();
    assert!(matches!(load_intrinsics(&path), Err(PoseError::Validation(_))));
}

#[test]
fn test_write_then_load() {
    let dir = tempdir().unwrap();
    let r = na::Rotation3::from_euler_angles(0.1, 0.2, 0.3).into_inner();
    let scene: SceneGroundTruth = (0..5)
        .map(|i| FrameRecord::new(i, r, na::Vector3::new(0.0, i as f64, 1.0)))
        .collect();
    let path = dir.path().join("train_pbr").join("000000").join("scene_gt.json");
    write_ground_truth(&path, &scene, 1).unwrap();
    let loaded = load_ground_truth(&path).unwrap();
    assert_eq!(loaded.len(), 5);
    for (a, b) in loaded.records().zip(scene.records()) {
        assert_eq!(a.frame_index, b.frame_index);
        assert_relative_eq!(a.rotation, b.rotation, epsilon = 1e-12);
        assert_relative_eq!(a.translation, b.translation, epsilon = 1e-12);
    }

    let camera = dir.path().join("camera.json");
    let intrinsics = CameraIntrinsics::new(500.0, 500.0, 320.0, 240.0);
    write_camera_json(&camera, &intrinsics, 640, 480).unwrap();
    assert_eq!(load_intrinsics(&camera).unwrap(), intrinsics);
}

#[test]
fn test_ensure_frames() {
    let scene: SceneGroundTruth = [0, 1, 2]
        .into_iter()
        .map(|i| FrameRecord::new(i, na::Matrix3::identity(), na::Vector3::zeros()))
        .collect();
    assert!(scene.ensure_frames(3).is_ok());
    assert!(matches!(scene.ensure_frames(4), Err(PoseError::Parse { .. })));
    assert!(matches!(scene.ensure_frames(2), Err(PoseError::Parse { .. })));

    assert!(matches!(
        scene.ensure_frames(u32::MAX as usize + 1),
        Err(PoseError::Validation(_))
    ));

    let gap: SceneGroundTruth = [0, 2]
        .into_iter()
        .map(|i| FrameRecord::new(i, na::Matrix3::identity(), na::Vector3::zeros()))
        .collect();
    assert!(matches!(gap.ensure_frames(2), Err(PoseError::Parse { .. })));
}

#[test]
fn test_rendered_frame_paths() {
    let dir = tempdir().unwrap();
    for name in ["000002.png", "000000.png", "000001.jpg", "notes.txt"] {
        fs::write(dir.path().join(name), b"").unwrap();
    }
    let paths = rendered_frame_paths(dir.path()).unwrap();
    let names: Vec<_> = paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["000000.png", "000001.jpg", "000002.png"]);
}

#[test]
fn test_ground_truth_file_is_reproducible() {
    let dir = tempdir().unwrap();
    let scene: SceneGroundTruth = (0..12)
        .rev()
        .map(|i| FrameRecord::new(i, na::Matrix3::identity(), na::Vector3::new(0.0, 0.0, 1.0)))
        .collect();
    let first = dir.path().join("a.json");
    let second = dir.path().join("b.json");
    write_ground_truth(&first, &scene, 1).unwrap();
    write_ground_truth(&second, &scene, 1).unwrap();
    let text = fs::read_to_string(&first).unwrap();
    assert_eq!(text, fs::read_to_string(&second).unwrap());

    // Keys come out in frame order, 9 before 10.
    let positions: Vec<usize> = (0..12)
        .map(|i| text.find(&format!("\"{}\":", i)).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}
