use crate::formats::{DecodeError, IStrm, OStrm};
use crate::node::{NodeClass, NodeKind};

/// Top of every scene. Has no extent and no fields of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct Root;

impl NodeClass for Root {
	const CLASS_NAME: &'static str = "Root";
}

impl NodeKind for Root {
	fn class_name(&self) -> &'static str {
		Self::CLASS_NAME
	}

	fn save(&self, _strm: &mut OStrm) {}

	fn load(&mut self, _strm: &mut IStrm, _version: u16) -> Result<(), DecodeError> {
		Ok(())
	}

	any_kind!();
}
