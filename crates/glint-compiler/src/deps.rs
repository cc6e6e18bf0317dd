//! Emission of user functions ahead of the entry point that calls them

use glint_core::{mangle, DataType, Result, ShaderError};
use glint_lang::{FunctionNode, ShaderNode};
use std::collections::{HashMap, HashSet};

/// Append to `out` every function reachable from `entry`, callees first,
/// each at most once per `added` set. `function_code` holds the emitted
/// body of every function.
pub fn emit_function_deps(
    shader: &ShaderNode,
    entry: &str,
    function_code: &HashMap<String, String>,
    out: &mut String,
    added: &mut HashSet<String>,
) -> Result<()> {
    let mut stack = Vec::new();
    visit(shader, entry, function_code, out, added, &mut stack)
}

fn visit(
    shader: &ShaderNode,
    name: &str,
    function_code: &HashMap<String, String>,
    out: &mut String,
    added: &mut HashSet<String>,
    stack: &mut Vec<String>,
) -> Result<()> {
    let function = shader
        .find_function(name)
        .ok_or_else(|| ShaderError::MissingFunction(name.to_string()))?;

    stack.push(name.to_string());

    for callee in &function.uses_function {
        if added.contains(callee) {
            continue;
        }
        if stack.contains(callee) {
            let mut chain = stack.clone();
            chain.push(callee.clone());
            return Err(ShaderError::CyclicDependency(chain.join(" -> ")));
        }

        visit(shader, callee, function_code, out, added, stack)?;

        let callee_node = shader
            .find_function(callee)
            .ok_or_else(|| ShaderError::MissingFunction(callee.clone()))?;
        let body = function_code
            .get(callee)
            .ok_or_else(|| ShaderError::MissingFunction(callee.clone()))?;

        out.push('\n');
        out.push_str(&function_header(&callee_node.function)?);
        out.push_str(body);

        added.insert(callee.clone());
    }

    stack.pop();
    Ok(())
}

/// `ret name(args)\n` for a user function
pub fn function_header(function: &FunctionNode) -> Result<String> {
    let return_type = if function.return_type == DataType::Struct {
        struct_type_name(function.return_struct_name.as_deref(), &function.name)?
    } else {
        function.return_type.name().to_string()
    };

    let mut args = Vec::with_capacity(function.arguments.len());
    for arg in &function.arguments {
        let mut text = String::new();
        if arg.is_const {
            text.push_str("const ");
        }
        text.push_str(arg.qualifier.keyword());
        if arg.datatype == DataType::Struct {
            text.push_str(&struct_type_name(arg.type_name.as_deref(), &arg.name)?);
        } else {
            text.push_str(arg.precision.keyword());
            text.push_str(arg.datatype.name());
        }
        text.push(' ');
        text.push_str(&mangle(&arg.name));
        args.push(text);
    }

    Ok(format!(
        "{} {}({})\n",
        return_type,
        mangle(&function.name),
        args.join(", ")
    ))
}

/// Mangled name of a struct type, which must be present
pub(crate) fn struct_type_name(name: Option<&str>, owner: &str) -> Result<String> {
    name.map(mangle).ok_or_else(|| {
        ShaderError::BadNodeShape(format!("struct typed '{}' without a struct name", owner))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_core::{ArgumentQualifier, Precision};
    use glint_lang::{Argument, BlockNode, Function};

    fn function(name: &str, uses: &[&str]) -> Function {
        Function {
            name: name.to_string(),
            uses_function: uses.iter().map(|s| s.to_string()).collect(),
            function: FunctionNode {
                name: name.to_string(),
                return_type: DataType::Void,
                return_struct_name: None,
                arguments: vec![],
                body: BlockNode::default(),
            },
        }
    }

    fn code_for(shader: &ShaderNode) -> HashMap<String, String> {
        shader
            .functions
            .iter()
            .map(|f| (f.name.clone(), format!("{{ /* {} */ }}\n", f.name)))
            .collect()
    }

    #[test]
    fn test_callees_emitted_first_and_once() {
        let shader = ShaderNode {
            functions: vec![
                function("leaf", &[]),
                function("mid", &["leaf"]),
                function("fragment", &["mid", "leaf"]),
            ],
            ..Default::default()
        };
        let mut out = String::new();
        let mut added = HashSet::new();
        emit_function_deps(&shader, "fragment", &code_for(&shader), &mut out, &mut added).unwrap();

        let leaf = out.find("void m_leaf()").unwrap();
        let mid = out.find("void m_mid()").unwrap();
        assert!(leaf < mid);
        assert_eq!(out.matches("void m_leaf()").count(), 1);
        assert!(!out.contains("m_fragment"));
        assert_eq!(added.len(), 2);
    }

    #[test]
    fn test_shared_added_set_skips_emitted_functions() {
        let shader = ShaderNode {
            functions: vec![
                function("helper", &[]),
                function("fragment", &["helper"]),
                function("light", &["helper"]),
            ],
            ..Default::default()
        };
        let code = code_for(&shader);
        let mut out = String::new();
        let mut added = HashSet::new();
        emit_function_deps(&shader, "fragment", &code, &mut out, &mut added).unwrap();
        emit_function_deps(&shader, "light", &code, &mut out, &mut added).unwrap();
        assert_eq!(out.matches("m_helper").count(), 1);
    }

    #[test]
    fn test_cycle_is_reported() {
        let shader = ShaderNode {
            functions: vec![
                function("a", &["b"]),
                function("b", &["a"]),
                function("vertex", &["a"]),
            ],
            ..Default::default()
        };
        let mut out = String::new();
        let err = emit_function_deps(&shader, "vertex", &code_for(&shader), &mut out, &mut HashSet::new())
            .unwrap_err();
        match err {
            ShaderError::CyclicDependency(chain) => assert_eq!(chain, "vertex -> a -> b -> a"),
            other => panic!("Expected cyclic dependency, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_function_is_reported() {
        let shader = ShaderNode {
            functions: vec![function("fragment", &["ghost"])],
            ..Default::default()
        };
        let mut out = String::new();
        let err = emit_function_deps(&shader, "fragment", &code_for(&shader), &mut out, &mut HashSet::new())
            .unwrap_err();
        assert!(matches!(err, ShaderError::MissingFunction(name) if name == "ghost"));
    }

    #[test]
    fn test_function_header() {
        let node = FunctionNode {
            name: "shade".to_string(),
            return_type: DataType::Struct,
            return_struct_name: Some("Surface".to_string()),
            arguments: vec![
                Argument {
                    is_const: true,
                    qualifier: ArgumentQualifier::In,
                    precision: Precision::Highp,
                    datatype: DataType::Vec3,
                    type_name: None,
                    name: "n".to_string(),
                },
                Argument {
                    is_const: false,
                    qualifier: ArgumentQualifier::InOut,
                    precision: Precision::Default,
                    datatype: DataType::Struct,
                    type_name: Some("Surface".to_string()),
                    name: "s".to_string(),
                },
            ],
            body: BlockNode::default(),
        };
        assert_eq!(
            function_header(&node).unwrap(),
            "m_Surface m_shade(const highp vec3 m_n, inout m_Surface m_s)\n"
        );
    }
}
