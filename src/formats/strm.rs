//! Type-tagged-by-position byte stream.
//!
//! There is no schema in the bytes: a reader must request exactly the
//! sequence of types the writer emitted. Integers and floats are fixed-width
//! little-endian, `bool` is one byte, strings and collections carry a `u32`
//! length prefix.

use std::collections::BTreeMap;

use glam::{Vec2, Vec3};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
	#[error("Unexpected end of stream: needed {needed} bytes, {remaining} remaining")]
	UnexpectedEof { needed: usize, remaining: usize },
	#[error("String is not valid UTF-8")]
	InvalidUtf8,
	#[error("Invalid bool byte {0}")]
	InvalidBool(u8),
}

/// Output stream.
#[derive(Debug, Default, Clone)]
pub struct OStrm {
	buf: Vec<u8>,
}

impl OStrm {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn write<T: Ser + ?Sized>(&mut self, value: &T) {
		value.ser(self);
	}

	pub fn write_bytes(&mut self, bytes: &[u8]) {
		self.buf.extend_from_slice(bytes);
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.buf
	}

	pub fn into_bytes(self) -> Vec<u8> {
		self.buf
	}
}

/// Input stream, a cursor over a borrowed buffer.
#[derive(Debug, Clone)]
pub struct IStrm<'a> {
	data: &'a [u8],
	pos: usize,
}

impl<'a> IStrm<'a> {
	pub fn new(data: &'a [u8]) -> Self {
		Self { data, pos: 0 }
	}

	pub fn read<T: Deser>(&mut self) -> Result<T, DecodeError> {
		T::deser(self)
	}

	pub fn remaining(&self) -> usize {
		self.data.len() - self.pos
	}

	pub fn is_empty(&self) -> bool {
		self.remaining() == 0
	}

	pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
		if n > self.remaining() {
			return Err(DecodeError::UnexpectedEof {
				needed: n,
				remaining: self.remaining(),
			});
		}
		let bytes = &self.data[self.pos..self.pos + n];
		self.pos += n;
		Ok(bytes)
	}

	#[inline]
	fn read_n<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
		let mut buf = [0_u8; N];
		buf.copy_from_slice(self.read_bytes(N)?);
		Ok(buf)
	}

	fn read_len(&mut self) -> Result<usize, DecodeError> {
		let len = self.read::<u32>()? as usize;
		// a length can never exceed what is left, so fail early instead of allocating
		if len > self.remaining() {
			return Err(DecodeError::UnexpectedEof {
				needed: len,
				remaining: self.remaining(),
			});
		}
		Ok(len)
	}
}

pub trait Ser {
	fn ser(&self, strm: &mut OStrm);
}

pub trait Deser: Sized {
	fn deser(strm: &mut IStrm) -> Result<Self, DecodeError>;
}

macro_rules! le_primitive {
	($($ty:ty),*) => {
		$(
			impl Ser for $ty {
				#[inline]
				fn ser(&self, strm: &mut OStrm) {
					strm.write_bytes(&self.to_le_bytes());
				}
			}

			impl Deser for $ty {
				#[inline]
				fn deser(strm: &mut IStrm) -> Result<Self, DecodeError> {
					Ok(<$ty>::from_le_bytes(strm.read_n()?))
				}
			}
		)*
	};
}

le_primitive!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl Ser for bool {
	fn ser(&self, strm: &mut OStrm) {
		strm.write(&u8::from(*self));
	}
}

impl Deser for bool {
	fn deser(strm: &mut IStrm) -> Result<Self, DecodeError> {
		match strm.read::<u8>()? {
			0 => Ok(false),
			1 => Ok(true),
			n => Err(DecodeError::InvalidBool(n)),
		}
	}
}

impl Ser for str {
	fn ser(&self, strm: &mut OStrm) {
		strm.write(&(self.len() as u32));
		strm.write_bytes(self.as_bytes());
	}
}

impl Ser for String {
	fn ser(&self, strm: &mut OStrm) {
		self.as_str().ser(strm);
	}
}

impl Deser for String {
	fn deser(strm: &mut IStrm) -> Result<Self, DecodeError> {
		let len = strm.read_len()?;
		let bytes = strm.read_bytes(len)?;
		String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8)
	}
}

impl<T: Ser> Ser for [T] {
	fn ser(&self, strm: &mut OStrm) {
		strm.write(&(self.len() as u32));
		for item in self {
			strm.write(item);
		}
	}
}

impl<T: Ser> Ser for Vec<T> {
	fn ser(&self, strm: &mut OStrm) {
		self.as_slice().ser(strm);
	}
}

impl<T: Deser> Deser for Vec<T> {
	fn deser(strm: &mut IStrm) -> Result<Self, DecodeError> {
		let len = strm.read_len()?;
		(0..len).map(|_| strm.read()).collect()
	}
}

impl<K: Ser, V: Ser> Ser for BTreeMap<K, V> {
	fn ser(&self, strm: &mut OStrm) {
		strm.write(&(self.len() as u32));
		for (key, value) in self {
			strm.write(key);
			strm.write(value);
		}
	}
}

impl<K: Deser + Ord, V: Deser> Deser for BTreeMap<K, V> {
	fn deser(strm: &mut IStrm) -> Result<Self, DecodeError> {
		let len = strm.read_len()?;
		let mut map = BTreeMap::new();
		for _ in 0..len {
			let key = strm.read()?;
			let value = strm.read()?;
			map.insert(key, value);
		}
		Ok(map)
	}
}

impl Ser for Vec2 {
	fn ser(&self, strm: &mut OStrm) {
		strm.write(&self.x);
		strm.write(&self.y);
	}
}

impl Deser for Vec2 {
	fn deser(strm: &mut IStrm) -> Result<Self, DecodeError> {
		Ok(Vec2::new(strm.read()?, strm.read()?))
	}
}

impl Ser for Vec3 {
	fn ser(&self, strm: &mut OStrm) {
		strm.write(&self.x);
		strm.write(&self.y);
		strm.write(&self.z);
	}
}

impl Deser for Vec3 {
	fn deser(strm: &mut IStrm) -> Result<Self, DecodeError> {
		Ok(Vec3::new(strm.read()?, strm.read()?, strm.read()?))
	}
}
