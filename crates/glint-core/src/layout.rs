//! std140-style uniform buffer layout tables

use crate::types::DataType;

impl DataType {
    /// Byte size of the type inside a uniform buffer
    pub fn size(&self) -> u32 {
        match self {
            DataType::Void | DataType::Struct => 0,
            DataType::Bool | DataType::Int | DataType::UInt | DataType::Float => 4,
            DataType::BVec2 | DataType::IVec2 | DataType::UVec2 | DataType::Vec2 => 8,
            DataType::BVec3 | DataType::IVec3 | DataType::UVec3 | DataType::Vec3 => 12,
            DataType::BVec4 | DataType::IVec4 | DataType::UVec4 | DataType::Vec4 => 16,
            DataType::Mat2 => 32,
            DataType::Mat3 => 48,
            DataType::Mat4 => 64,
            _ => 16, // samplers
        }
    }

    /// Byte alignment of the type inside a uniform buffer.
    ///
    /// Three component vectors are 12 bytes wide but aligned like four
    /// component ones.
    pub fn alignment(&self) -> u32 {
        match self {
            DataType::Void | DataType::Struct => 0,
            DataType::Bool | DataType::Int | DataType::UInt | DataType::Float => 4,
            DataType::BVec2 | DataType::IVec2 | DataType::UVec2 | DataType::Vec2 => 8,
            _ => 16,
        }
    }
}

/// Round `offset` up to the next multiple of `alignment`.
/// A zero alignment leaves the offset untouched.
pub fn align_to(offset: u32, alignment: u32) -> u32 {
    if alignment == 0 {
        return offset;
    }
    let rem = offset % alignment;
    if rem == 0 {
        offset
    } else {
        offset + alignment - rem
    }
}

/// Round a buffer size up to a multiple of 16 bytes
pub fn round_up_16(size: u32) -> u32 {
    align_to(size, 16)
}
