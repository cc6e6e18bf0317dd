//! Per-compile emission state

use std::collections::HashSet;

pub const VERTEX_NAME: &str = "vertex";
pub const FRAGMENT_NAME: &str = "fragment";
pub const LIGHT_NAME: &str = "light";
pub const TIME_NAME: &str = "TIME";

/// Bookkeeping for one emission pass. A fresh value is created for every
/// compile, so nothing carries over between shaders.
#[derive(Debug, Default, Clone)]
pub struct EmissionContext {
    /// Names whose usage define was already pushed
    pub used_name_defines: HashSet<String>,
    /// Render modes whose define was already pushed
    pub used_rmode_defines: HashSet<String>,
    /// Names already reported through `on_usage_flag`
    pub used_flag_pointers: HashSet<String>,
    /// Varyings routed through the `frag_to_light` struct
    pub fragment_varyings: HashSet<String>,
    /// Function whose body is being emitted
    pub current_function: Option<String>,
}

impl EmissionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_function(&self, name: &str) -> bool {
        self.current_function.as_deref() == Some(name)
    }

    pub fn in_vertex(&self) -> bool {
        self.in_function(VERTEX_NAME)
    }

    /// Fragment and light share the fragment stage
    pub fn in_fragment_stage(&self) -> bool {
        self.in_function(FRAGMENT_NAME) || self.in_function(LIGHT_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_function_checks() {
        let mut ctx = EmissionContext::new();
        assert!(!ctx.in_vertex());
        assert!(!ctx.in_fragment_stage());

        ctx.current_function = Some(VERTEX_NAME.to_string());
        assert!(ctx.in_vertex());

        ctx.current_function = Some(LIGHT_NAME.to_string());
        assert!(ctx.in_fragment_stage());

        ctx.current_function = Some("helper".to_string());
        assert!(!ctx.in_vertex());
        assert!(!ctx.in_fragment_stage());
    }
}
