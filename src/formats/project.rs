use std::fs;
use std::io;
use std::path::Path;

use tracing::{info, warn};

use super::{IStrm, LoadError, OStrm};
use crate::registry::Registry;
use crate::tree::NodeTree;

/// Version written at the head of every project file.
pub const PROJECT_VERSION: u32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
	#[error("Could not access project file: {0}")]
	Io(#[from] io::Error),
	#[error("Project version {found} is not supported (expected {expected})")]
	VersionMismatch { expected: u32, found: u32 },
	#[error("Could not load project: {0}")]
	Load(#[from] LoadError),
}

pub fn encode_project(tree: &NodeTree) -> Vec<u8> {
	let mut strm = OStrm::new();
	strm.write(&PROJECT_VERSION);
	tree.save_all(&mut strm);
	strm.into_bytes()
}

pub fn decode_project(registry: &Registry, bytes: &[u8]) -> Result<NodeTree, ProjectError> {
	let mut strm = IStrm::new(bytes);
	let found = strm.read::<u32>().map_err(LoadError::from)?;
	if found != PROJECT_VERSION {
		return Err(ProjectError::VersionMismatch {
			expected: PROJECT_VERSION,
			found,
		});
	}
	let tree = NodeTree::load_all(registry, &mut strm)?;
	if !strm.is_empty() {
		warn!("{} trailing bytes after project data", strm.remaining());
	}
	Ok(tree)
}

pub fn save_project(tree: &NodeTree, path: &Path) -> Result<(), ProjectError> {
	fs::write(path, encode_project(tree))?;
	info!("Saved project to {}", path.display());
	Ok(())
}

pub fn load_project(registry: &Registry, path: &Path) -> Result<NodeTree, ProjectError> {
	let bytes = fs::read(path)?;
	let tree = decode_project(registry, &bytes)?;
	info!("Loaded project from {}", path.display());
	Ok(tree)
}

/// Loads the project, falling back to an empty scene on any failure.
///
/// The failure is handed back unless the file simply doesn't exist yet.
pub fn load_or_fresh(registry: &Registry, path: &Path) -> (NodeTree, Option<ProjectError>) {
	match load_project(registry, path) {
		Ok(tree) => (tree, None),
		Err(ProjectError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
			info!("No project at {}, starting fresh", path.display());
			(NodeTree::fresh(), None)
		}
		Err(e) => {
			warn!("{e}, starting fresh");
			(NodeTree::fresh(), Some(e))
		}
	}
}
