use approx::assert_relative_eq;
use bop_onepose::PoseError;
use bop_onepose::rotation::{
    is_rotation_matrix, quaternion_to_rotation_matrix, quaternion_wxyz,
    rotation_matrix_to_quaternion, unit_quaternion_from_wxyz,
};
use nalgebra as na;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn random_rotation(rng: &mut ChaCha8Rng) -> na::Matrix3<f64> {
    let axis = na::Vector3::new(
        rng.random_range(-1.0..1.0),
        rng.random_range(-1.0..1.0),
        rng.random_range(-1.0..1.0),
    );
    let angle = rng.random_range(-std::f64::consts::PI..std::f64::consts::PI);
    na::Rotation3::from_axis_angle(&na::Unit::new_normalize(axis), angle).into_inner()
}

#[test]
fn test_matrix_quaternion_round_trip() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for _ in 0..500 {
        let m = random_rotation(&mut rng);
        let q = rotation_matrix_to_quaternion(&m);
        assert_relative_eq!(q.norm(), 1.0, epsilon = 1e-12);
        assert!(q.w >= 0.0);
        let back = quaternion_to_rotation_matrix(&q);
        assert_relative_eq!(back, m, epsilon = 1e-6);
    }
}

#[test]
fn test_half_turns_use_every_branch() {
    // Trace is -1 for each of these, so the diagonal branches are taken.
    let half_turns = [
        na::Matrix3::from_diagonal(&na::Vector3::new(1.0, -1.0, -1.0)),
        na::Matrix3::from_diagonal(&na::Vector3::new(-1.0, 1.0, -1.0)),
        na::Matrix3::from_diagonal(&na::Vector3::new(-1.0, -1.0, 1.0)),
    ];
    let expected = [
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ];
    for (m, wxyz) in half_turns.iter().zip(expected) {
        let q = rotation_matrix_to_quaternion(m);
        let got = quaternion_wxyz(&q);
        for (g, e) in got.iter().zip(wxyz) {
            assert_relative_eq!(g.abs(), e, epsilon = 1e-12);
        }
        assert_relative_eq!(quaternion_to_rotation_matrix(&q), *m, epsilon = 1e-12);
    }
}

#[test]
fn test_identity_quaternion() {
    let q = rotation_matrix_to_quaternion(&na::Matrix3::identity());
    assert_eq!(quaternion_wxyz(&q), [1.0, 0.0, 0.0, 0.0]);
}

#[test]
fn test_matches_nalgebra() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    for _ in 0..50 {
        let m = random_rotation(&mut rng);
        let ours = rotation_matrix_to_quaternion(&m);
        let theirs =
            na::UnitQuaternion::from_rotation_matrix(&na::Rotation3::from_matrix_unchecked(m));
        assert!(ours.angle_to(&theirs) < 1e-9);
    }
}

#[test]
fn test_is_rotation_matrix() {
    assert!(is_rotation_matrix(&na::Matrix3::identity()));
    let reflection = na::Matrix3::from_diagonal(&na::Vector3::new(1.0, 1.0, -1.0));
    assert!(!is_rotation_matrix(&reflection));
    let scaled = na::Matrix3::identity() * 1.01;
    assert!(!is_rotation_matrix(&scaled));
    let mut nan = na::Matrix3::identity();
    nan[(0, 1)] = f64::NAN;
    assert!(!is_rotation_matrix(&nan));
}

#[test]
fn test_unit_quaternion_validation() {
    assert!(unit_quaternion_from_wxyz([1.0, 0.0, 0.0, 0.0]).is_ok());
    let h = std::f64::consts::FRAC_1_SQRT_2;
    assert!(unit_quaternion_from_wxyz([h, h, 0.0, 0.0]).is_ok());
    assert!(matches!(
        unit_quaternion_from_wxyz([0.0, 0.2, 0.0, 0.0]),
        Err(PoseError::Validation(_))
    ));
    assert!(matches!(
        unit_quaternion_from_wxyz([f64::NAN, 0.0, 0.0, 0.0]),
        Err(PoseError::Validation(_))
    ));
}
