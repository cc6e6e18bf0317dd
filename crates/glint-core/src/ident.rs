//! User identifier mangling

const PREFIX: &str = "m_";
const DOUBLE_UNDERSCORE: &str = "__";
const DOUBLE_UNDERSCORE_ESCAPE: &str = "_dus_";

/// Mangle a user identifier for GLSL output.
///
/// GLSL reserves identifiers containing `__`, so every occurrence is
/// rewritten to `_dus_` after the `m_` prefix is added.
pub fn mangle(name: &str) -> String {
    format!("{}{}", PREFIX, name).replace(DOUBLE_UNDERSCORE, DOUBLE_UNDERSCORE_ESCAPE)
}

/// Reverse of [`mangle`]. Returns `None` if `id` lacks the `m_` prefix.
///
/// Exact for names that do not start with `_`, contain no run of three or
/// more underscores and no literal `_dus_`.
pub fn unmangle(id: &str) -> Option<String> {
    let rest = id.strip_prefix(PREFIX)?;
    Some(rest.replace(DOUBLE_UNDERSCORE_ESCAPE, DOUBLE_UNDERSCORE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mangle_plain() {
        assert_eq!(mangle("albedo_col"), "m_albedo_col");
        assert_eq!(mangle("x"), "m_x");
    }

    #[test]
    fn test_mangle_double_underscore() {
        assert_eq!(mangle("a__b"), "m_a_dus_b");
        // the prefix takes part in the rewrite
        assert_eq!(mangle("__tmp"), "m_dus__tmp");
        assert_eq!(mangle("a____b"), "m_a_dus__dus_b");
    }

    #[test]
    fn test_unmangle_round_trip() {
        for name in ["uv2", "a__b", "foo_bar", "x__y__z", "trail__"] {
            let mangled = mangle(name);
            assert_eq!(unmangle(&mangled).as_deref(), Some(name), "{}", mangled);
        }
    }

    #[test]
    fn test_unmangle_rejects_foreign_names() {
        assert_eq!(unmangle("albedo"), None);
        assert_eq!(unmangle("gl_FragCoord"), None);
    }
}
