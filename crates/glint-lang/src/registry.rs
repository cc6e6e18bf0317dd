//! Registry of what each shader mode exposes to shader code
//!
//! For every [`ShaderMode`] this records the entry functions with their
//! built-in variables, the render modes a shader may request, and the
//! list of built-in functions shared by all modes.

use glint_core::{DataType, ShaderMode};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Pseudo function whose built-ins are visible everywhere
pub const GLOBAL_FUNCTION: &str = "global";

/// A built-in variable visible inside a function
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuiltInInfo {
    pub datatype: DataType,
    pub constant: bool,
}

/// What an entry function (or the `global` scope) provides
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FunctionInfo {
    pub built_ins: BTreeMap<String, BuiltInInfo>,
    pub can_discard: bool,
}

/// Everything registered for one shader mode
#[derive(Clone, Debug, Default)]
pub struct ModeInfo {
    pub functions: BTreeMap<String, FunctionInfo>,
    pub render_modes: Vec<String>,
}

/// Registry for all shader modes
#[derive(Debug)]
pub struct ShaderTypes {
    modes: HashMap<ShaderMode, ModeInfo>,
    types: BTreeSet<String>,
}

type BuiltInTable = &'static [(&'static str, DataType, bool)];

use DataType::*;

const CANVAS_GLOBAL: BuiltInTable = &[("TIME", Float, true)];

const CANVAS_VERTEX: BuiltInTable = &[
    ("VERTEX", Vec2, false),
    ("UV", Vec2, false),
    ("COLOR", Vec4, false),
    ("MODULATE", Vec4, true),
    ("POINT_SIZE", Float, false),
    ("WORLD_MATRIX", Mat4, false),
    ("PROJECTION_MATRIX", Mat4, false),
    ("EXTRA_MATRIX", Mat4, false),
    ("INSTANCE_CUSTOM", Vec4, true),
    ("AT_LIGHT_PASS", Bool, true),
    ("TEXTURE_PIXEL_SIZE", Vec2, true),
    ("INSTANCE_ID", Int, true),
    ("VERTEX_ID", Int, true),
];

const CANVAS_FRAGMENT: BuiltInTable = &[
    ("FRAGCOORD", Vec4, true),
    ("NORMAL", Vec3, false),
    ("NORMALMAP", Vec3, false),
    ("NORMALMAP_DEPTH", Float, false),
    ("UV", Vec2, true),
    ("COLOR", Vec4, false),
    ("MODULATE", Vec4, true),
    ("TEXTURE", Sampler2D, true),
    ("TEXTURE_PIXEL_SIZE", Vec2, true),
    ("NORMAL_TEXTURE", Sampler2D, true),
    ("SCREEN_UV", Vec2, true),
    ("SCREEN_PIXEL_SIZE", Vec2, true),
    ("SCREEN_TEXTURE", Sampler2D, true),
    ("POINT_COORD", Vec2, true),
    ("AT_LIGHT_PASS", Bool, true),
];

const CANVAS_LIGHT: BuiltInTable = &[
    ("FRAGCOORD", Vec4, true),
    ("NORMAL", Vec3, true),
    ("UV", Vec2, true),
    ("COLOR", Vec4, true),
    ("MODULATE", Vec4, true),
    ("TEXTURE", Sampler2D, true),
    ("TEXTURE_PIXEL_SIZE", Vec2, true),
    ("SCREEN_UV", Vec2, true),
    ("LIGHT_VEC", Vec2, true),
    ("SHADOW_VEC", Vec2, false),
    ("LIGHT_HEIGHT", Float, true),
    ("LIGHT_COLOR", Vec4, true),
    ("LIGHT_UV", Vec2, true),
    ("LIGHT", Vec4, false),
    ("SHADOW_COLOR", Vec4, false),
    ("POINT_COORD", Vec2, true),
];

const CANVAS_RENDER_MODES: &[&str] = &[
    "blend_mix",
    "blend_add",
    "blend_sub",
    "blend_mul",
    "blend_premul_alpha",
    "blend_disabled",
    "unshaded",
    "light_only",
    "skip_vertex_transform",
];

const SPATIAL_GLOBAL: BuiltInTable = &[("TIME", Float, true)];

const SPATIAL_VERTEX: BuiltInTable = &[
    ("VERTEX", Vec3, false),
    ("NORMAL", Vec3, false),
    ("TANGENT", Vec3, false),
    ("BINORMAL", Vec3, false),
    ("POSITION", Vec4, false),
    ("UV", Vec2, false),
    ("UV2", Vec2, false),
    ("COLOR", Vec4, false),
    ("POINT_SIZE", Float, false),
    ("INSTANCE_ID", Int, true),
    ("INSTANCE_CUSTOM", Vec4, true),
    ("VERTEX_ID", Int, true),
    ("ROUGHNESS", Float, false),
    ("WORLD_MATRIX", Mat4, false),
    ("INV_CAMERA_MATRIX", Mat4, true),
    ("CAMERA_MATRIX", Mat4, true),
    ("PROJECTION_MATRIX", Mat4, false),
    ("INV_PROJECTION_MATRIX", Mat4, true),
    ("MODELVIEW_MATRIX", Mat4, false),
    ("VIEWPORT_SIZE", Vec2, true),
    ("OUTPUT_IS_SRGB", Bool, true),
    ("NODE_POSITION_WORLD", Vec3, true),
    ("CAMERA_POSITION_WORLD", Vec3, true),
    ("CAMERA_DIRECTION_WORLD", Vec3, true),
    ("NODE_POSITION_VIEW", Vec3, true),
    ("VIEW_INDEX", Int, true),
    ("VIEW_MONO_LEFT", Int, true),
    ("VIEW_RIGHT", Int, true),
];

const SPATIAL_FRAGMENT: BuiltInTable = &[
    ("VERTEX", Vec3, true),
    ("FRAGCOORD", Vec4, true),
    ("FRONT_FACING", Bool, true),
    ("NORMAL", Vec3, false),
    ("TANGENT", Vec3, false),
    ("BINORMAL", Vec3, false),
    ("NORMALMAP", Vec3, false),
    ("NORMALMAP_DEPTH", Float, false),
    ("UV", Vec2, true),
    ("UV2", Vec2, true),
    ("COLOR", Vec4, true),
    ("ALBEDO", Vec3, false),
    ("ALPHA", Float, false),
    ("METALLIC", Float, false),
    ("SPECULAR", Float, false),
    ("ROUGHNESS", Float, false),
    ("RIM", Float, false),
    ("RIM_TINT", Float, false),
    ("CLEARCOAT", Float, false),
    ("CLEARCOAT_GLOSS", Float, false),
    ("ANISOTROPY", Float, false),
    ("ANISOTROPY_FLOW", Vec2, false),
    ("SSS_STRENGTH", Float, false),
    ("TRANSMISSION", Vec3, false),
    ("AO", Float, false),
    ("AO_LIGHT_AFFECT", Float, false),
    ("EMISSION", Vec3, false),
    ("SCREEN_TEXTURE", Sampler2D, true),
    ("DEPTH_TEXTURE", Sampler2D, true),
    ("DEPTH", Float, false),
    ("SCREEN_UV", Vec2, true),
    ("POINT_COORD", Vec2, true),
    ("ALPHA_SCISSOR", Float, false),
    ("WORLD_MATRIX", Mat4, true),
    ("INV_CAMERA_MATRIX", Mat4, true),
    ("CAMERA_MATRIX", Mat4, true),
    ("PROJECTION_MATRIX", Mat4, true),
    ("INV_PROJECTION_MATRIX", Mat4, true),
    ("VIEWPORT_SIZE", Vec2, true),
    ("OUTPUT_IS_SRGB", Bool, true),
    ("NODE_POSITION_WORLD", Vec3, true),
    ("CAMERA_POSITION_WORLD", Vec3, true),
    ("CAMERA_DIRECTION_WORLD", Vec3, true),
    ("NODE_POSITION_VIEW", Vec3, true),
    ("VIEW_INDEX", Int, true),
    ("VIEW_MONO_LEFT", Int, true),
    ("VIEW_RIGHT", Int, true),
];

const SPATIAL_LIGHT: BuiltInTable = &[
    ("WORLD_MATRIX", Mat4, true),
    ("INV_CAMERA_MATRIX", Mat4, true),
    ("CAMERA_MATRIX", Mat4, true),
    ("PROJECTION_MATRIX", Mat4, true),
    ("INV_PROJECTION_MATRIX", Mat4, true),
    ("VIEWPORT_SIZE", Vec2, true),
    ("FRAGCOORD", Vec4, true),
    ("NORMAL", Vec3, true),
    ("UV", Vec2, true),
    ("UV2", Vec2, true),
    ("VIEW", Vec3, true),
    ("LIGHT", Vec3, true),
    ("LIGHT_COLOR", Vec3, true),
    ("ATTENUATION", Vec3, true),
    ("ALBEDO", Vec3, true),
    ("TRANSMISSION", Vec3, true),
    ("METALLIC", Float, true),
    ("ROUGHNESS", Float, true),
    ("DIFFUSE_LIGHT", Vec3, false),
    ("SPECULAR_LIGHT", Vec3, false),
    ("ALPHA", Float, false),
    ("OUTPUT_IS_SRGB", Bool, true),
];

const SPATIAL_RENDER_MODES: &[&str] = &[
    "blend_mix",
    "blend_add",
    "blend_sub",
    "blend_mul",
    "depth_draw_opaque",
    "depth_draw_always",
    "depth_draw_never",
    "depth_draw_alpha_prepass",
    "depth_test_disable",
    "cull_front",
    "cull_back",
    "cull_disabled",
    "unshaded",
    "diffuse_lambert",
    "diffuse_lambert_wrap",
    "diffuse_oren_nayar",
    "diffuse_burley",
    "diffuse_toon",
    "specular_schlick_ggx",
    "specular_blinn",
    "specular_phong",
    "specular_toon",
    "specular_disabled",
    "skip_vertex_transform",
    "world_vertex_coords",
    "ensure_correct_normals",
    "shadows_disabled",
    "ambient_light_disabled",
    "shadow_to_opacity",
    "vertex_lighting",
];

const PARTICLES_GLOBAL: BuiltInTable = &[("TIME", Float, true)];

const PARTICLES_VERTEX: BuiltInTable = &[
    ("COLOR", Vec4, false),
    ("VELOCITY", Vec3, false),
    ("MASS", Float, false),
    ("ACTIVE", Bool, false),
    ("RESTART", Bool, true),
    ("CUSTOM", Vec4, false),
    ("TRANSFORM", Mat4, false),
    ("LIFETIME", Float, true),
    ("DELTA", Float, true),
    ("NUMBER", UInt, true),
    ("INDEX", Int, true),
    ("GRAVITY", Vec3, true),
    ("EMISSION_TRANSFORM", Mat4, true),
    ("RANDOM_SEED", UInt, true),
];

const PARTICLES_RENDER_MODES: &[&str] = &["disable_force", "disable_velocity", "keep_data"];

/// Built-in functions callable from every mode; they are emitted verbatim
pub const BUILTIN_FUNCTIONS: &[&str] = &[
    "radians", "degrees", "sin", "cos", "tan", "asin", "acos", "atan", "sinh", "cosh", "tanh",
    "asinh", "acosh", "atanh", "pow", "exp", "log", "exp2", "log2", "sqrt", "inversesqrt", "abs",
    "sign", "floor", "trunc", "round", "roundEven", "ceil", "fract", "mod", "modf", "min", "max",
    "clamp", "mix", "step", "smoothstep", "isnan", "isinf", "floatBitsToInt", "floatBitsToUint",
    "intBitsToFloat", "uintBitsToFloat", "packHalf2x16", "unpackHalf2x16", "packUnorm2x16",
    "unpackUnorm2x16", "packSnorm2x16", "unpackSnorm2x16", "length", "distance", "dot", "cross",
    "normalize", "reflect", "refract", "faceforward", "matrixCompMult", "outerProduct",
    "transpose", "determinant", "inverse", "lessThan", "greaterThan", "lessThanEqual",
    "greaterThanEqual", "equal", "notEqual", "any", "all", "not", "textureSize", "texture",
    "textureProj", "textureLod", "textureProjLod", "textureGrad", "textureProjGrad", "texelFetch",
    "dFdx", "dFdy", "fwidth",
];

fn function_info(table: BuiltInTable, can_discard: bool) -> FunctionInfo {
    FunctionInfo {
        built_ins: table
            .iter()
            .map(|(name, datatype, constant)| {
                (
                    name.to_string(),
                    BuiltInInfo {
                        datatype: *datatype,
                        constant: *constant,
                    },
                )
            })
            .collect(),
        can_discard,
    }
}

fn mode_info(functions: &[(&str, BuiltInTable, bool)], render_modes: &[&str]) -> ModeInfo {
    ModeInfo {
        functions: functions
            .iter()
            .map(|(name, table, can_discard)| (name.to_string(), function_info(table, *can_discard)))
            .collect(),
        render_modes: render_modes.iter().map(|s| s.to_string()).collect(),
    }
}

impl ShaderTypes {
    /// Create the registry with every mode populated
    pub fn new() -> Self {
        let mut modes = HashMap::new();

        modes.insert(
            ShaderMode::CanvasItem,
            mode_info(
                &[
                    (GLOBAL_FUNCTION, CANVAS_GLOBAL, false),
                    ("vertex", CANVAS_VERTEX, false),
                    ("fragment", CANVAS_FRAGMENT, true),
                    ("light", CANVAS_LIGHT, true),
                ],
                CANVAS_RENDER_MODES,
            ),
        );

        modes.insert(
            ShaderMode::Spatial,
            mode_info(
                &[
                    (GLOBAL_FUNCTION, SPATIAL_GLOBAL, false),
                    ("vertex", SPATIAL_VERTEX, false),
                    ("fragment", SPATIAL_FRAGMENT, true),
                    ("light", SPATIAL_LIGHT, true),
                ],
                SPATIAL_RENDER_MODES,
            ),
        );

        modes.insert(
            ShaderMode::Particles,
            mode_info(
                &[
                    (GLOBAL_FUNCTION, PARTICLES_GLOBAL, false),
                    ("vertex", PARTICLES_VERTEX, false),
                ],
                PARTICLES_RENDER_MODES,
            ),
        );

        let types = ShaderMode::ALL.iter().map(|m| m.name().to_string()).collect();

        Self { modes, types }
    }

    fn mode(&self, mode: ShaderMode) -> &ModeInfo {
        // every mode is inserted by `new`
        &self.modes[&mode]
    }

    /// Entry functions (plus `global`) of a mode
    pub fn functions(&self, mode: ShaderMode) -> &BTreeMap<String, FunctionInfo> {
        &self.mode(mode).functions
    }

    /// Render modes a shader of this mode may request
    pub fn modes(&self, mode: ShaderMode) -> &[String] {
        &self.mode(mode).render_modes
    }

    /// Names accepted by `shader_type`
    pub fn types(&self) -> &BTreeSet<String> {
        &self.types
    }

    pub fn builtin_funcs(&self) -> &'static [&'static str] {
        BUILTIN_FUNCTIONS
    }
}

impl Default for ShaderTypes {
    fn default() -> Self {
        Self::new()
    }
}
