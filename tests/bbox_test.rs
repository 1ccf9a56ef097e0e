use approx::assert_relative_eq;
use bop_onepose::PoseError;
use bop_onepose::bbox::{BOX_EDGES, CENTER_INDEX, OrientedBoundingBox};
use bop_onepose::transform::RigidTransform;
use nalgebra as na;

#[test]
fn test_unit_box_corner_order() {
    let bbox = OrientedBoundingBox::new([0.0; 3], [2.0; 3], [1.0, 0.0, 0.0, 0.0]);
    let corners = bbox.corners(false);
    let expected = [
        [-1.0, -1.0, -1.0],
        [1.0, -1.0, -1.0],
        [1.0, -1.0, 1.0],
        [-1.0, -1.0, 1.0],
        [-1.0, 1.0, -1.0],
        [1.0, 1.0, -1.0],
        [1.0, 1.0, 1.0],
        [-1.0, 1.0, 1.0],
    ];
    assert_eq!(corners.len(), 8);
    for (c, e) in corners.iter().zip(expected) {
        assert_eq!(*c, na::Vector3::from(e));
    }
}

#[test]
fn test_center_is_appended() {
    let bbox = OrientedBoundingBox::default();
    let points = bbox.corners(true);
    assert_eq!(points.len(), 9);
    assert_eq!(points[CENTER_INDEX], na::Vector3::new(0.05, 0.05, 0.05));
    assert_eq!(&points[..8], bbox.corners(false).as_slice());
}

#[test]
fn test_extents_are_full_lengths() {
    let bbox = OrientedBoundingBox::default();
    let corners = bbox.corners(false);
    let span = corners[6] - corners[0];
    assert_relative_eq!(span, na::Vector3::new(0.2, 0.82, 0.32), epsilon = 1e-12);
}

#[test]
fn test_edges_connect_neighbors() {
    let bbox = OrientedBoundingBox::new([0.0; 3], [2.0; 3], [1.0, 0.0, 0.0, 0.0]);
    let corners = bbox.corners(false);
    for (a, b) in BOX_EDGES {
        let d = corners[a] - corners[b];
        let moved = d.iter().filter(|v| v.abs() > 1e-12).count();
        assert_eq!(moved, 1, "edge ({}, {}) is not axis aligned", a, b);
    }
}

#[test]
fn test_validate() {
    assert!(OrientedBoundingBox::default().validate().is_ok());
    let flat = OrientedBoundingBox::new([0.0; 3], [1.0, 0.0, 1.0], [1.0, 0.0, 0.0, 0.0]);
    assert!(matches!(flat.validate(), Err(PoseError::Validation(_))));
    let negative = OrientedBoundingBox::new([0.0; 3], [1.0, -1.0, 1.0], [1.0, 0.0, 0.0, 0.0]);
    assert!(matches!(negative.validate(), Err(PoseError::Validation(_))));
    let unnormalized = OrientedBoundingBox::new([0.0; 3], [1.0; 3], [2.0, 0.0, 0.0, 0.0]);
    assert!(matches!(unnormalized.validate(), Err(PoseError::Validation(_))));
}

#[test]
fn test_object_to_world() {
    let bbox = OrientedBoundingBox::default();
    assert!(
        bbox.object_to_world()
            .unwrap()
            .approx_eq(&RigidTransform::identity(), 1e-12)
    );

    // Quarter turn about z keeps the center in place.
    let h = std::f64::consts::FRAC_1_SQRT_2;
    let turned = OrientedBoundingBox::new([1.0, 2.0, 3.0], [1.0; 3], [h, 0.0, 0.0, h]);
    let o2w = turned.object_to_world().unwrap();
    assert_relative_eq!(
        o2w.transform_point(&turned.center()),
        turned.center(),
        epsilon = 1e-12
    );
    let corner = turned.corners(false)[1] - turned.center();
    let moved = o2w.transform_point(&turned.corners(false)[1]) - turned.center();
    assert_relative_eq!(moved, na::Vector3::new(-corner.y, corner.x, corner.z), epsilon = 1e-12);
}

#[test]
fn test_descriptor() {
    let bbox = OrientedBoundingBox::default();
    assert_eq!(
        bbox.descriptor(),
        [0.05, 0.05, 0.05, 0.2, 0.82, 0.32, 1.0, 0.0, 0.0, 0.0]
    );
    assert_eq!(OrientedBoundingBox::from_descriptor(&bbox.descriptor()), bbox);
}
