//! Callbacks the emitter uses to report what a shader uses
//!
//! The renderer registers interest in render modes, built-in reads and
//! writes, and receives every uniform the shader declares.

use glint_lang::Uniform;
use std::collections::BTreeMap;

/// Receiver for facts discovered while emitting a shader.
///
/// Every method defaults to a no-op so adapters only implement what they
/// care about.
pub trait ActionsAdapter {
    /// A render mode listed by the shader
    fn on_render_mode(&mut self, _name: &str) {}

    /// First read or write of an identifier (or `DISCARD`) in this compile
    fn on_usage_flag(&mut self, _name: &str) {}

    /// An identifier appeared on the left of an assignment
    fn on_write_flag(&mut self, _name: &str) {}

    fn on_uniform_seen(&mut self, _name: &str, _uniform: &Uniform) {}
}

/// Adapter that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoActions;

impl ActionsAdapter for NoActions {}

/// Map backed adapter.
///
/// Flags start out `false` and only flip for names registered up front;
/// unregistered names are ignored. `render_mode_values` maps a render mode
/// to the `(slot, value)` written into `values` when the mode is used.
#[derive(Debug, Default, Clone)]
pub struct IdentifierActions {
    pub render_mode_flags: BTreeMap<String, bool>,
    pub render_mode_values: BTreeMap<String, (String, i32)>,
    pub values: BTreeMap<String, i32>,
    pub usage_flags: BTreeMap<String, bool>,
    pub write_flags: BTreeMap<String, bool>,
    pub uniforms: BTreeMap<String, Uniform>,
}

impl IdentifierActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_render_mode_flag(mut self, name: &str) -> Self {
        self.render_mode_flags.insert(name.to_string(), false);
        self
    }

    pub fn with_render_mode_value(mut self, name: &str, slot: &str, value: i32) -> Self {
        self.render_mode_values
            .insert(name.to_string(), (slot.to_string(), value));
        self
    }

    pub fn with_usage_flag(mut self, name: &str) -> Self {
        self.usage_flags.insert(name.to_string(), false);
        self
    }

    pub fn with_write_flag(mut self, name: &str) -> Self {
        self.write_flags.insert(name.to_string(), false);
        self
    }

    pub fn render_mode_set(&self, name: &str) -> bool {
        self.render_mode_flags.get(name).copied().unwrap_or(false)
    }

    pub fn used(&self, name: &str) -> bool {
        self.usage_flags.get(name).copied().unwrap_or(false)
    }

    pub fn written(&self, name: &str) -> bool {
        self.write_flags.get(name).copied().unwrap_or(false)
    }
}

impl ActionsAdapter for IdentifierActions {
    fn on_render_mode(&mut self, name: &str) {
        if let Some(flag) = self.render_mode_flags.get_mut(name) {
            *flag = true;
        }
        if let Some((slot, value)) = self.render_mode_values.get(name) {
            self.values.insert(slot.clone(), *value);
        }
    }

    fn on_usage_flag(&mut self, name: &str) {
        if let Some(flag) = self.usage_flags.get_mut(name) {
            *flag = true;
        }
    }

    fn on_write_flag(&mut self, name: &str) {
        if let Some(flag) = self.write_flags.get_mut(name) {
            *flag = true;
        }
    }

    fn on_uniform_seen(&mut self, name: &str, uniform: &Uniform) {
        self.uniforms.insert(name.to_string(), uniform.clone());
    }
}
