use bytemuck::{Pod, Zeroable};

use crate::driver::{RESOLUTION_UNIFORM, TIME_UNIFORM};
use crate::types::UniformValue;

/// CPU mirror of the fragment stage's `Params` block (std140).
///
/// `r` sits at offset 0, `t` at offset 8, padded to 16 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub(crate) struct ProgramUniforms {
    pub r: [f32; 2],
    pub t: f32,
    pub _padding: f32,
}

impl ProgramUniforms {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;
}

/// Byte offset and payload for a named uniform write, or `None` when the
/// name is unknown or the value has the wrong shape.
pub(crate) fn uniform_write(name: &str, value: UniformValue) -> Option<(u64, Vec<u8>)> {
    match (name, value) {
        (RESOLUTION_UNIFORM, UniformValue::Vec2(resolution)) => {
            Some((0, bytemuck::cast_slice(&resolution).to_vec()))
        }
        (TIME_UNIFORM, UniformValue::Float(seconds)) => {
            Some((8, bytemuck::bytes_of(&seconds).to_vec()))
        }
        _ => None,
    }
}
