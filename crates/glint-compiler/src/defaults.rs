//! Per-mode identifier tables
//!
//! Built-in names are renamed to the identifiers the engine's GLSL
//! templates declare, and certain names or render modes switch on
//! `#define`s in those templates.

use crate::config::CompilerConfig;
use glint_core::ShaderMode;
use std::collections::HashMap;

type Table = &'static [(&'static str, &'static str)];

const CANVAS_RENAMES: Table = &[
    ("VERTEX", "outvec.xy"),
    ("UV", "uv"),
    ("POINT_SIZE", "point_size"),
    ("WORLD_MATRIX", "modelview_matrix"),
    ("PROJECTION_MATRIX", "projection_matrix"),
    ("EXTRA_MATRIX", "extra_matrix"),
    ("TIME", "time"),
    ("AT_LIGHT_PASS", "at_light_pass"),
    ("INSTANCE_CUSTOM", "instance_custom"),
    ("COLOR", "color"),
    ("MODULATE", "final_modulate_alias"),
    ("NORMAL", "normal"),
    ("NORMALMAP", "normal_map"),
    ("NORMALMAP_DEPTH", "normal_depth"),
    ("TEXTURE", "color_texture"),
    ("TEXTURE_PIXEL_SIZE", "color_texpixel_size"),
    ("NORMAL_TEXTURE", "normal_texture"),
    ("SCREEN_UV", "screen_uv"),
    ("SCREEN_TEXTURE", "screen_texture"),
    ("SCREEN_PIXEL_SIZE", "screen_pixel_size"),
    ("FRAGCOORD", "gl_FragCoord"),
    ("POINT_COORD", "gl_PointCoord"),
    ("INSTANCE_ID", "gl_InstanceID"),
    ("VERTEX_ID", "gl_VertexID"),
    ("LIGHT_VEC", "light_vec"),
    ("LIGHT_HEIGHT", "light_height"),
    ("LIGHT_COLOR", "light_color"),
    ("LIGHT_UV", "light_uv"),
    ("LIGHT", "light"),
    ("SHADOW_COLOR", "shadow_color"),
    ("SHADOW_VEC", "shadow_vec"),
];

const CANVAS_USAGES: Table = &[
    ("COLOR", "#define COLOR_USED\n"),
    ("MODULATE", "#define MODULATE_USED\n"),
    ("SCREEN_TEXTURE", "#define SCREEN_TEXTURE_USED\n"),
    ("SCREEN_UV", "#define SCREEN_UV_USED\n"),
    ("SCREEN_PIXEL_SIZE", "@SCREEN_UV"),
    ("NORMAL", "#define NORMAL_USED\n"),
    ("NORMALMAP", "#define NORMALMAP_USED\n"),
    ("LIGHT", "#define USE_LIGHT_SHADER_CODE\n"),
    ("SHADOW_VEC", "#define SHADOW_VEC_USED\n"),
];

const CANVAS_RENDER_MODES: Table = &[("skip_vertex_transform", "#define SKIP_TRANSFORM_USED\n")];

const SPATIAL_RENAMES: Table = &[
    ("WORLD_MATRIX", "world_transform"),
    ("INV_CAMERA_MATRIX", "camera_inverse_matrix"),
    ("CAMERA_MATRIX", "camera_matrix"),
    ("PROJECTION_MATRIX", "projection_matrix"),
    ("INV_PROJECTION_MATRIX", "inv_projection_matrix"),
    ("MODELVIEW_MATRIX", "modelview"),
    ("VIEW_INDEX", "view_index"),
    ("VIEW_MONO_LEFT", "0"),
    ("VIEW_RIGHT", "1"),
    ("VERTEX", "vertex.xyz"),
    ("NORMAL", "normal"),
    ("TANGENT", "tangent"),
    ("BINORMAL", "binormal"),
    ("POSITION", "position"),
    ("UV", "uv_interp"),
    ("UV2", "uv2_interp"),
    ("COLOR", "color_interp"),
    ("POINT_SIZE", "point_size"),
    ("INSTANCE_ID", "gl_InstanceID"),
    ("VERTEX_ID", "gl_VertexID"),
    ("TIME", "time"),
    ("VIEWPORT_SIZE", "viewport_size"),
    ("FRAGCOORD", "gl_FragCoord"),
    ("FRONT_FACING", "gl_FrontFacing"),
    ("NORMALMAP", "normalmap"),
    ("NORMALMAP_DEPTH", "normaldepth"),
    ("ALBEDO", "albedo"),
    ("ALPHA", "alpha"),
    ("METALLIC", "metallic"),
    ("SPECULAR", "specular"),
    ("ROUGHNESS", "roughness"),
    ("RIM", "rim"),
    ("RIM_TINT", "rim_tint"),
    ("CLEARCOAT", "clearcoat"),
    ("CLEARCOAT_GLOSS", "clearcoat_gloss"),
    ("ANISOTROPY", "anisotropy"),
    ("ANISOTROPY_FLOW", "anisotropy_flow"),
    ("SSS_STRENGTH", "sss_strength"),
    ("TRANSMISSION", "transmission"),
    ("AO", "ao"),
    ("AO_LIGHT_AFFECT", "ao_light_affect"),
    ("EMISSION", "emission"),
    ("POINT_COORD", "gl_PointCoord"),
    ("INSTANCE_CUSTOM", "instance_custom"),
    ("SCREEN_UV", "screen_uv"),
    ("SCREEN_TEXTURE", "screen_texture"),
    ("DEPTH_TEXTURE", "depth_buffer"),
    ("DEPTH", "gl_FragDepth"),
    ("ALPHA_SCISSOR", "alpha_scissor"),
    ("OUTPUT_IS_SRGB", "SHADER_IS_SRGB"),
    ("NODE_POSITION_WORLD", "world_transform[3].xyz"),
    ("CAMERA_POSITION_WORLD", "camera_matrix[3].xyz"),
    ("CAMERA_DIRECTION_WORLD", "camera_inverse_matrix[3].xyz"),
    ("NODE_POSITION_VIEW", "(world_transform * camera_inverse_matrix)[3].xyz"),
    // light
    ("VIEW", "view"),
    ("LIGHT_COLOR", "light_color"),
    ("LIGHT", "light"),
    ("ATTENUATION", "attenuation"),
    ("DIFFUSE_LIGHT", "diffuse_light"),
    ("SPECULAR_LIGHT", "specular_light"),
];

const SPATIAL_USAGES: Table = &[
    ("TANGENT", "#define ENABLE_TANGENT_INTERP\n"),
    ("BINORMAL", "@TANGENT"),
    ("RIM", "#define LIGHT_USE_RIM\n"),
    ("RIM_TINT", "@RIM"),
    ("CLEARCOAT", "#define LIGHT_USE_CLEARCOAT\n"),
    ("CLEARCOAT_GLOSS", "@CLEARCOAT"),
    ("ANISOTROPY", "#define LIGHT_USE_ANISOTROPY\n"),
    ("ANISOTROPY_FLOW", "@ANISOTROPY"),
    ("AO", "#define ENABLE_AO\n"),
    ("AO_LIGHT_AFFECT", "#define ENABLE_AO\n"),
    ("UV", "#define ENABLE_UV_INTERP\n"),
    ("UV2", "#define ENABLE_UV2_INTERP\n"),
    ("NORMALMAP", "#define ENABLE_NORMALMAP\n"),
    ("NORMALMAP_DEPTH", "@NORMALMAP"),
    ("COLOR", "#define ENABLE_COLOR_INTERP\n"),
    ("INSTANCE_CUSTOM", "#define ENABLE_INSTANCE_CUSTOM\n"),
    ("ALPHA_SCISSOR", "#define ALPHA_SCISSOR_USED\n"),
    ("POSITION", "#define OVERRIDE_POSITION\n"),
    ("SSS_STRENGTH", "#define ENABLE_SSS\n"),
    ("TRANSMISSION", "#define TRANSMISSION_USED\n"),
    ("SCREEN_TEXTURE", "#define SCREEN_TEXTURE_USED\n"),
    ("SCREEN_UV", "#define SCREEN_UV_USED\n"),
    ("DIFFUSE_LIGHT", "#define USE_LIGHT_SHADER_CODE\n"),
    ("SPECULAR_LIGHT", "#define USE_LIGHT_SHADER_CODE\n"),
];

const SPATIAL_RENDER_MODES: Table = &[
    ("skip_vertex_transform", "#define SKIP_TRANSFORM_USED\n"),
    ("world_vertex_coords", "#define VERTEX_WORLD_COORDS_USED\n"),
    ("ensure_correct_normals", "#define ENSURE_CORRECT_NORMALS\n"),
    ("cull_front", "#define DO_SIDE_CHECK\n"),
    ("cull_disabled", "#define DO_SIDE_CHECK\n"),
    ("diffuse_oren_nayar", "#define DIFFUSE_OREN_NAYAR\n"),
    ("diffuse_lambert_wrap", "#define DIFFUSE_LAMBERT_WRAP\n"),
    ("diffuse_toon", "#define DIFFUSE_TOON\n"),
    ("specular_blinn", "#define SPECULAR_BLINN\n"),
    ("specular_phong", "#define SPECULAR_PHONG\n"),
    ("specular_toon", "#define SPECULAR_TOON\n"),
    ("specular_disabled", "#define SPECULAR_DISABLED\n"),
    ("shadows_disabled", "#define SHADOWS_DISABLED\n"),
    ("ambient_light_disabled", "#define AMBIENT_LIGHT_DISABLED\n"),
    ("shadow_to_opacity", "#define USE_SHADOW_TO_OPACITY\n"),
];

const PARTICLES_RENAMES: Table = &[
    ("COLOR", "out_color"),
    ("VELOCITY", "out_velocity_active.xyz"),
    ("MASS", "mass"),
    ("ACTIVE", "shader_active"),
    ("RESTART", "restart"),
    ("CUSTOM", "out_custom"),
    ("TRANSFORM", "xform"),
    ("TIME", "time"),
    ("LIFETIME", "lifetime"),
    ("DELTA", "local_delta"),
    ("NUMBER", "particle_number"),
    ("INDEX", "index"),
    ("GRAVITY", "current_gravity"),
    ("EMISSION_TRANSFORM", "emission_transform"),
    ("RANDOM_SEED", "random_seed"),
];

const PARTICLES_RENDER_MODES: Table = &[
    ("disable_force", "#define DISABLE_FORCE\n"),
    ("disable_velocity", "#define DISABLE_VELOCITY\n"),
    ("keep_data", "#define ENABLE_KEEP_DATA\n"),
];

fn to_map(table: Table) -> HashMap<String, String> {
    table
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Identifier tables for one shader mode. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct DefaultIdentifierActions {
    /// Built-in name to emitted GLSL text; takes precedence over mangling
    pub renames: HashMap<String, String>,
    /// Name to `#define` line, or `@OTHER` to reuse the define of `OTHER`
    pub usage_defines: HashMap<String, String>,
    pub render_mode_defines: HashMap<String, String>,
}

impl DefaultIdentifierActions {
    pub fn for_mode(mode: ShaderMode, config: &CompilerConfig) -> Self {
        match mode {
            ShaderMode::CanvasItem => Self {
                renames: to_map(CANVAS_RENAMES),
                usage_defines: to_map(CANVAS_USAGES),
                render_mode_defines: to_map(CANVAS_RENDER_MODES),
            },
            ShaderMode::Spatial => {
                let mut render_mode_defines = to_map(SPATIAL_RENDER_MODES);
                if !config.force_lambert_over_burley {
                    render_mode_defines.insert(
                        "diffuse_burley".to_string(),
                        "#define DIFFUSE_BURLEY\n".to_string(),
                    );
                }
                let ggx = if config.force_blinn_over_ggx {
                    "#define SPECULAR_BLINN\n"
                } else {
                    "#define SPECULAR_SCHLICK_GGX\n"
                };
                render_mode_defines.insert("specular_schlick_ggx".to_string(), ggx.to_string());

                Self {
                    renames: to_map(SPATIAL_RENAMES),
                    usage_defines: to_map(SPATIAL_USAGES),
                    render_mode_defines,
                }
            }
            ShaderMode::Particles => Self {
                renames: to_map(PARTICLES_RENAMES),
                usage_defines: HashMap::new(),
                render_mode_defines: to_map(PARTICLES_RENDER_MODES),
            },
        }
    }

    /// Resolve the define for a referenced name, following one `@` alias
    pub fn usage_define(&self, name: &str) -> Option<&str> {
        let define = self.usage_defines.get(name)?;
        match define.strip_prefix('@') {
            Some(alias) => self.usage_defines.get(alias).map(String::as_str),
            None => Some(define.as_str()),
        }
    }
}
