pub mod formats;
pub mod inputs;
pub mod math;
pub mod node;
pub mod physics;
pub mod registry;
pub mod stage;
pub mod texture;
pub mod tree;
pub mod undo;

pub use formats::project::PROJECT_VERSION;
