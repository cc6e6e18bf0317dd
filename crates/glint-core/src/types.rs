//! Shading language data types, qualifiers and operators

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Every data type the shading language knows about
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataType {
    Void,
    Bool,
    BVec2,
    BVec3,
    BVec4,
    Int,
    IVec2,
    IVec3,
    IVec4,
    UInt,
    UVec2,
    UVec3,
    UVec4,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
    Sampler2D,
    ISampler2D,
    USampler2D,
    Sampler2DArray,
    ISampler2DArray,
    USampler2DArray,
    Sampler3D,
    ISampler3D,
    USampler3D,
    SamplerCube,
    SamplerExt,
    Struct,
}

impl DataType {
    pub const ALL: [DataType; 32] = [
        DataType::Void,
        DataType::Bool,
        DataType::BVec2,
        DataType::BVec3,
        DataType::BVec4,
        DataType::Int,
        DataType::IVec2,
        DataType::IVec3,
        DataType::IVec4,
        DataType::UInt,
        DataType::UVec2,
        DataType::UVec3,
        DataType::UVec4,
        DataType::Float,
        DataType::Vec2,
        DataType::Vec3,
        DataType::Vec4,
        DataType::Mat2,
        DataType::Mat3,
        DataType::Mat4,
        DataType::Sampler2D,
        DataType::ISampler2D,
        DataType::USampler2D,
        DataType::Sampler2DArray,
        DataType::ISampler2DArray,
        DataType::USampler2DArray,
        DataType::Sampler3D,
        DataType::ISampler3D,
        DataType::USampler3D,
        DataType::SamplerCube,
        DataType::SamplerExt,
        DataType::Struct,
    ];

    /// GLSL spelling of the type
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Void => "void",
            DataType::Bool => "bool",
            DataType::BVec2 => "bvec2",
            DataType::BVec3 => "bvec3",
            DataType::BVec4 => "bvec4",
            DataType::Int => "int",
            DataType::IVec2 => "ivec2",
            DataType::IVec3 => "ivec3",
            DataType::IVec4 => "ivec4",
            DataType::UInt => "uint",
            DataType::UVec2 => "uvec2",
            DataType::UVec3 => "uvec3",
            DataType::UVec4 => "uvec4",
            DataType::Float => "float",
            DataType::Vec2 => "vec2",
            DataType::Vec3 => "vec3",
            DataType::Vec4 => "vec4",
            DataType::Mat2 => "mat2",
            DataType::Mat3 => "mat3",
            DataType::Mat4 => "mat4",
            DataType::Sampler2D => "sampler2D",
            DataType::ISampler2D => "isampler2D",
            DataType::USampler2D => "usampler2D",
            DataType::Sampler2DArray => "sampler2DArray",
            DataType::ISampler2DArray => "isampler2DArray",
            DataType::USampler2DArray => "usampler2DArray",
            DataType::Sampler3D => "sampler3D",
            DataType::ISampler3D => "isampler3D",
            DataType::USampler3D => "usampler3D",
            DataType::SamplerCube => "samplerCube",
            DataType::SamplerExt => "samplerExternalOES",
            DataType::Struct => "struct",
        }
    }

    /// Look a type up by its shading language spelling
    pub fn from_name(name: &str) -> Option<DataType> {
        DataType::ALL
            .iter()
            .copied()
            .find(|ty| *ty != DataType::Struct && ty.name() == name)
    }

    pub fn is_sampler(&self) -> bool {
        matches!(
            self,
            DataType::Sampler2D
                | DataType::ISampler2D
                | DataType::USampler2D
                | DataType::Sampler2DArray
                | DataType::ISampler2DArray
                | DataType::USampler2DArray
                | DataType::Sampler3D
                | DataType::ISampler3D
                | DataType::USampler3D
                | DataType::SamplerCube
                | DataType::SamplerExt
        )
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            DataType::Bool | DataType::Int | DataType::UInt | DataType::Float
        )
    }

    pub fn is_matrix(&self) -> bool {
        matches!(self, DataType::Mat2 | DataType::Mat3 | DataType::Mat4)
    }

    /// Types that may be built with a constructor call (`vec3(...)`)
    pub fn is_constructible(&self) -> bool {
        !matches!(self, DataType::Void | DataType::Struct) && !self.is_sampler()
    }

    /// Scalar type of a scalar, vector or matrix type
    pub fn scalar_type(&self) -> Option<DataType> {
        match self {
            DataType::Bool | DataType::BVec2 | DataType::BVec3 | DataType::BVec4 => {
                Some(DataType::Bool)
            }
            DataType::Int | DataType::IVec2 | DataType::IVec3 | DataType::IVec4 => {
                Some(DataType::Int)
            }
            DataType::UInt | DataType::UVec2 | DataType::UVec3 | DataType::UVec4 => {
                Some(DataType::UInt)
            }
            DataType::Float
            | DataType::Vec2
            | DataType::Vec3
            | DataType::Vec4
            | DataType::Mat2
            | DataType::Mat3
            | DataType::Mat4 => Some(DataType::Float),
            _ => None,
        }
    }

    /// Number of scalar components (matrices count every cell)
    pub fn component_count(&self) -> usize {
        match self {
            DataType::Bool | DataType::Int | DataType::UInt | DataType::Float => 1,
            DataType::BVec2 | DataType::IVec2 | DataType::UVec2 | DataType::Vec2 => 2,
            DataType::BVec3 | DataType::IVec3 | DataType::UVec3 | DataType::Vec3 => 3,
            DataType::BVec4 | DataType::IVec4 | DataType::UVec4 | DataType::Vec4 => 4,
            DataType::Mat2 => 4,
            DataType::Mat3 => 9,
            DataType::Mat4 => 16,
            _ => 0,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for DataType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Precision qualifier
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    #[default]
    Default,
    Lowp,
    Mediump,
    Highp,
}

impl Precision {
    /// Keyword followed by a space, empty for the default precision
    pub fn keyword(&self) -> &'static str {
        match self {
            Precision::Default => "",
            Precision::Lowp => "lowp ",
            Precision::Mediump => "mediump ",
            Precision::Highp => "highp ",
        }
    }

    pub fn from_name(name: &str) -> Option<Precision> {
        match name {
            "lowp" => Some(Precision::Lowp),
            "mediump" => Some(Precision::Mediump),
            "highp" => Some(Precision::Highp),
            _ => None,
        }
    }
}

/// Varying interpolation qualifier
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    #[default]
    Smooth,
    Flat,
}

impl Interpolation {
    pub fn keyword(&self) -> &'static str {
        match self {
            Interpolation::Smooth => "",
            Interpolation::Flat => "flat ",
        }
    }

    pub fn from_name(name: &str) -> Option<Interpolation> {
        match name {
            "smooth" => Some(Interpolation::Smooth),
            "flat" => Some(Interpolation::Flat),
            _ => None,
        }
    }
}

/// Function argument qualifier
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentQualifier {
    #[default]
    In,
    Out,
    InOut,
}

impl ArgumentQualifier {
    pub fn keyword(&self) -> &'static str {
        match self {
            ArgumentQualifier::In => "",
            ArgumentQualifier::Out => "out ",
            ArgumentQualifier::InOut => "inout ",
        }
    }

    pub fn from_name(name: &str) -> Option<ArgumentQualifier> {
        match name {
            "in" => Some(ArgumentQualifier::In),
            "out" => Some(ArgumentQualifier::Out),
            "inout" => Some(ArgumentQualifier::InOut),
            _ => None,
        }
    }
}

/// The kind of shader being compiled
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShaderMode {
    CanvasItem,
    Spatial,
    Particles,
}

impl ShaderMode {
    pub const ALL: [ShaderMode; 3] = [
        ShaderMode::CanvasItem,
        ShaderMode::Spatial,
        ShaderMode::Particles,
    ];

    /// Name used by `shader_type` declarations
    pub fn name(&self) -> &'static str {
        match self {
            ShaderMode::CanvasItem => "canvas_item",
            ShaderMode::Spatial => "spatial",
            ShaderMode::Particles => "particles",
        }
    }
}

impl fmt::Display for ShaderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShaderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShaderMode::ALL
            .iter()
            .copied()
            .find(|mode| mode.name() == s)
            .ok_or_else(|| {
                format!(
                    "unknown shader mode '{}'; valid values: canvas_item, spatial, particles",
                    s
                )
            })
    }
}

/// Expression operators
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
    Not,
    Negate,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    ShiftLeft,
    ShiftRight,
    Assign,
    AssignAdd,
    AssignSub,
    AssignMul,
    AssignDiv,
    AssignMod,
    AssignShiftLeft,
    AssignShiftRight,
    AssignBitAnd,
    AssignBitOr,
    AssignBitXor,
    BitAnd,
    BitOr,
    BitXor,
    BitInvert,
    Increment,
    Decrement,
    SelectIf,
    SelectElse,
    PostIncrement,
    PostDecrement,
    Call,
    Construct,
    Struct,
    Index,
}

impl Operator {
    /// GLSL spelling of the operator
    pub fn text(&self) -> &'static str {
        match self {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::Less => "<",
            Operator::LessEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterEqual => ">=",
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Not => "!",
            Operator::Negate => "-",
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Mod => "%",
            Operator::ShiftLeft => "<<",
            Operator::ShiftRight => ">>",
            Operator::Assign => "=",
            Operator::AssignAdd => "+=",
            Operator::AssignSub => "-=",
            Operator::AssignMul => "*=",
            Operator::AssignDiv => "/=",
            Operator::AssignMod => "%=",
            Operator::AssignShiftLeft => "<<=",
            Operator::AssignShiftRight => ">>=",
            Operator::AssignBitAnd => "&=",
            Operator::AssignBitOr => "|=",
            Operator::AssignBitXor => "^=",
            Operator::BitAnd => "&",
            Operator::BitOr => "|",
            Operator::BitXor => "^",
            Operator::BitInvert => "~",
            Operator::Increment => "++",
            Operator::Decrement => "--",
            Operator::SelectIf => "?",
            Operator::SelectElse => ":",
            Operator::PostIncrement => "++",
            Operator::PostDecrement => "--",
            Operator::Call => "()",
            Operator::Construct => "construct",
            Operator::Struct => "struct",
            Operator::Index => "[]",
        }
    }

    pub fn is_assignment(&self) -> bool {
        matches!(
            self,
            Operator::Assign
                | Operator::AssignAdd
                | Operator::AssignSub
                | Operator::AssignMul
                | Operator::AssignDiv
                | Operator::AssignMod
                | Operator::AssignShiftLeft
                | Operator::AssignShiftRight
                | Operator::AssignBitAnd
                | Operator::AssignBitOr
                | Operator::AssignBitXor
        )
    }
}
