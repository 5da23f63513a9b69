pub mod camera;
pub mod transform;
pub mod viewport;
