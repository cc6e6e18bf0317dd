//! Constant literal formatting

use crate::error::{Result, ShaderError};
use crate::types::DataType;
use serde::Serialize;

/// A single scalar component of a constant
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConstantValue {
    Bool(bool),
    Int(i32),
    UInt(u32),
    Float(f32),
}

impl ConstantValue {
    pub fn as_bool(&self) -> bool {
        match *self {
            ConstantValue::Bool(b) => b,
            ConstantValue::Int(i) => i != 0,
            ConstantValue::UInt(u) => u != 0,
            ConstantValue::Float(f) => f != 0.0,
        }
    }

    pub fn as_int(&self) -> i32 {
        match *self {
            ConstantValue::Bool(b) => b as i32,
            ConstantValue::Int(i) => i,
            ConstantValue::UInt(u) => u as i32,
            ConstantValue::Float(f) => f as i32,
        }
    }

    pub fn as_uint(&self) -> u32 {
        match *self {
            ConstantValue::Bool(b) => b as u32,
            ConstantValue::Int(i) => i as u32,
            ConstantValue::UInt(u) => u,
            ConstantValue::Float(f) => f as u32,
        }
    }

    pub fn as_float(&self) -> f32 {
        match *self {
            ConstantValue::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            ConstantValue::Int(i) => i as f32,
            ConstantValue::UInt(u) => u as f32,
            ConstantValue::Float(f) => f,
        }
    }

    /// Scalar type this value carries
    pub fn data_type(&self) -> DataType {
        match self {
            ConstantValue::Bool(_) => DataType::Bool,
            ConstantValue::Int(_) => DataType::Int,
            ConstantValue::UInt(_) => DataType::UInt,
            ConstantValue::Float(_) => DataType::Float,
        }
    }
}

// Magnitudes outside this window are written in exponent form.
const SCIENTIFIC_ABOVE: f32 = 1e16;
const SCIENTIFIC_BELOW: f32 = 1e-4;

/// Format a float as the shortest text that reads back to the same value,
/// always recognisable as a float literal by GLSL.
pub fn format_float(value: f32) -> String {
    let magnitude = value.abs();
    let mut text = if magnitude != 0.0
        && magnitude.is_finite()
        && !(SCIENTIFIC_BELOW..SCIENTIFIC_ABOVE).contains(&magnitude)
    {
        format!("{:e}", value)
    } else {
        format!("{}", value)
    };
    if !text.contains('.') && !text.contains('e') {
        text.push_str(".0");
    }
    text
}

fn scalar_text(ty: DataType, value: &ConstantValue) -> Result<String> {
    Ok(match ty {
        DataType::Bool => {
            if value.as_bool() {
                "true".to_string()
            } else {
                "false".to_string()
            }
        }
        DataType::Int => value.as_int().to_string(),
        DataType::UInt => format!("{}u", value.as_uint()),
        _ => {
            let value = value.as_float();
            // GLSL has no literal for inf or NaN
            if !value.is_finite() {
                return Err(ShaderError::UnsupportedType(format!(
                    "non-finite float constant {}",
                    value
                )));
            }
            format_float(value)
        }
    })
}

/// GLSL literal expression for a scalar, vector or matrix constant
pub fn constant_text(ty: DataType, values: &[ConstantValue]) -> Result<String> {
    let scalar = ty.scalar_type().ok_or_else(|| {
        ShaderError::UnsupportedType(format!("no literal form for {}", ty.name()))
    })?;

    if ty.is_scalar() {
        let value = values.first().ok_or_else(|| {
            ShaderError::BadNodeShape(format!("{} constant without a value", ty.name()))
        })?;
        return scalar_text(ty, value);
    }

    let parts = values
        .iter()
        .map(|v| scalar_text(scalar, v))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("{}({})", ty.name(), parts.join(",")))
}
