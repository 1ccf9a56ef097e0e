use bop_onepose::bbox::OrientedBoundingBox;
use bop_onepose::projection::project_visible;
use bop_onepose::trajectory::{CameraTrajectory, OrbitParams};
use bop_onepose::transform::object_to_camera;
use bop_onepose::types::CameraIntrinsics;
use bop_onepose::visualization::{OverlayStyle, draw_box};
use image::{Rgb, RgbImage};

fn main() {
    env_logger::init();
    let intrinsics = CameraIntrinsics::new(500.0, 500.0, 320.0, 240.0);
    let trajectory = CameraTrajectory::Orbit(OrbitParams {
        frames_per_level: 8,
        ..Default::default()
    });
    let bbox = OrientedBoundingBox::default();
    let object_to_world = bbox.object_to_world().unwrap();
    let points = bbox.corners(true);

    std::fs::create_dir_all("output").unwrap();
    for (i, camera_to_world) in trajectory.poses().unwrap().iter().enumerate() {
        // Orbit poses look down -z, projection wants the image-plane axes.
        let pose = object_to_camera(&camera_to_world.with_adapted_axes(), &object_to_world);
        let projected: Vec<_> = project_visible(&intrinsics, &pose, &points)
            .into_iter()
            .map(|p| p.map(|p| glam::Vec2::new(p.x as f32, p.y as f32)))
            .collect();
        let mut img = RgbImage::from_pixel(640, 480, Rgb([32, 32, 32]));
        draw_box(&mut img, &projected, &OverlayStyle::default());
        img.save(format!("output/box_{:02}.png", i)).unwrap();
        println!("{} {:?}", i, projected[8]);
    }
}
