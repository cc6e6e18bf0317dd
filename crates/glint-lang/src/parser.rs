//! Shading language parser
//!
//! Source text is matched by the pest grammar, expressions are folded by
//! the Pratt parser in [`syntax`](crate::syntax), and the result is lowered
//! into a [`ShaderNode`] while names are resolved against the registry of
//! the shader mode being compiled.

use crate::ast::{
    Argument, ArrayConstructNode, ArrayDeclaration, ArrayDeclarationNode, ArrayNode, BlockNode,
    Constant, ConstantNode, Declaration, FlowOperation, Function, FunctionNode, MemberNode, Node,
    ShaderHint, ShaderNode, Struct, StructMember, StructNode, Uniform, Varying,
    VariableDeclarationNode, VaryingStage,
};
use crate::registry::{FunctionInfo, BUILTIN_FUNCTIONS, GLOBAL_FUNCTION};
use crate::syntax::{
    first_inner, line_of, next_str, parse_float, parse_int, parse_size, ExprParser, GrammarParser,
    RawExpr, RawKind, Rule,
};
use glint_core::{
    ArgumentQualifier, ConstantValue, DataType, Interpolation, Operator, Precision,
};
use pest::error::LineColLocation;
use pest::iterators::Pair;
use pest::Parser;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use thiserror::Error;

/// Parse failure with the 1-based line it was detected on
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {text}")]
pub struct ParseError {
    pub line: usize,
    pub text: String,
}

impl ParseError {
    pub fn new(line: usize, text: impl Into<String>) -> Self {
        Self {
            line,
            text: text.into(),
        }
    }
}

type Result<T> = std::result::Result<T, ParseError>;

/// Front end consumed by the compiler.
///
/// `functions` maps entry function names (plus `global`) to the built-ins
/// they expose, `render_modes` lists the render modes the shader may
/// request and `types` the names accepted by `shader_type`.
pub trait ShaderParser {
    fn parse(
        &self,
        code: &str,
        functions: &BTreeMap<String, FunctionInfo>,
        render_modes: &[String],
        types: &BTreeSet<String>,
    ) -> Result<ShaderNode>;
}

/// Parser for the engine's shading language
pub struct ShaderLanguageParser {
    exprs: ExprParser,
}

impl ShaderLanguageParser {
    pub fn new() -> Self {
        Self {
            exprs: ExprParser::new(),
        }
    }

    /// Read the `shader_type` declaration without parsing the rest
    pub fn shader_type(code: &str) -> Option<String> {
        let head = GrammarParser::parse(Rule::shader_head, code).ok()?.next()?;
        let decl = head
            .into_inner()
            .find(|p| p.as_rule() == Rule::shader_type_decl)?;
        decl.into_inner()
            .find(|p| p.as_rule() == Rule::identifier)
            .map(|p| p.as_str().to_string())
    }
}

impl Default for ShaderLanguageParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderParser for ShaderLanguageParser {
    fn parse(
        &self,
        code: &str,
        functions: &BTreeMap<String, FunctionInfo>,
        render_modes: &[String],
        types: &BTreeSet<String>,
    ) -> Result<ShaderNode> {
        let mut pairs = GrammarParser::parse(Rule::shader, code).map_err(grammar_error)?;
        let root = pairs
            .next()
            .ok_or_else(|| ParseError::new(1, "Expected shader_type declaration"))?;

        Builder::new(&self.exprs, functions, render_modes, types).lower_shader(root)
    }
}

fn grammar_error(error: pest::error::Error<Rule>) -> ParseError {
    let line = match error.line_col {
        LineColLocation::Pos((line, _)) => line,
        LineColLocation::Span((line, _), _) => line,
    };
    let error = error.renamed_rules(|rule| {
        let name = format!("{:?}", rule);
        match name.strip_prefix("kw_") {
            Some(keyword) => format!("'{}'", keyword),
            None => name.replace('_', " "),
        }
    });
    ParseError::new(line, error.variant.message().to_string())
}

fn is_keyword(pair: &Pair<Rule>) -> bool {
    matches!(
        pair.as_rule(),
        Rule::kw_shader_type
            | Rule::kw_render_mode
            | Rule::kw_uniform
            | Rule::kw_varying
            | Rule::kw_const
            | Rule::kw_struct
            | Rule::kw_if
            | Rule::kw_else
            | Rule::kw_for
            | Rule::kw_while
            | Rule::kw_do
            | Rule::kw_switch
            | Rule::kw_case
            | Rule::kw_default
            | Rule::kw_return
            | Rule::kw_discard
            | Rule::kw_break
            | Rule::kw_continue
    )
}

fn required<'i>(pair: Option<Pair<'i, Rule>>, line: usize) -> Result<Pair<'i, Rule>> {
    pair.ok_or_else(|| ParseError::new(line, "Unexpected end of statement"))
}

fn fail<T>(line: usize, text: impl Into<String>) -> Result<T> {
    Err(ParseError::new(line, text))
}

fn parse_precision(pair: &Pair<Rule>) -> Precision {
    Precision::from_name(pair.as_str()).unwrap_or_default()
}

fn parse_case_label(text: &str, line: usize) -> Result<i32> {
    match text.strip_prefix('-') {
        Some(digits) => Ok(parse_int(digits, line)?.wrapping_neg()),
        None => parse_int(text, line),
    }
}

/// Explicit size of an `array_size` pair, `None` for `[]`
fn explicit_size(pair: Pair<Rule>, line: usize) -> Result<Option<u32>> {
    match pair.into_inner().next() {
        Some(size) => Ok(Some(parse_size(size.as_str(), line)?)),
        None => Ok(None),
    }
}

/// Root identifier written by an assignment to `node`
fn assign_root(node: &Node) -> Option<String> {
    match node {
        Node::Variable(v) => Some(v.name.clone()),
        Node::Array(a) if a.call_expression.is_none() => Some(a.name.clone()),
        Node::Member(m) => assign_root(&m.owner),
        Node::Operator(op) if op.op == Operator::Index => {
            op.arguments.first().and_then(assign_root)
        }
        _ => None,
    }
}

/// Negation of a numeric literal, folded into the literal
fn fold_negate(node: &Node) -> Option<Node> {
    let Node::Constant(c) = node else {
        return None;
    };
    if c.array_size > 0 || !matches!(c.datatype.scalar_type()?, DataType::Int | DataType::Float) {
        return None;
    }
    let values = c
        .values
        .iter()
        .map(|v| match *v {
            ConstantValue::Int(i) => ConstantValue::Int(i.wrapping_neg()),
            ConstantValue::Float(f) => ConstantValue::Float(-f),
            other => other,
        })
        .collect();
    Some(Node::constant(c.datatype, values))
}

/// Constructor whose arguments are all scalar literals of the matching type
fn fold_construct(ty: DataType, args: &[Node]) -> Option<Node> {
    let scalar = ty.scalar_type()?;
    let values: Vec<ConstantValue> = args
        .iter()
        .map(|arg| match arg {
            Node::Constant(c) if c.array_size == 0 && c.datatype == scalar && c.values.len() == 1 => {
                Some(c.values[0])
            }
            _ => None,
        })
        .collect::<Option<_>>()?;

    let count = ty.component_count();
    if values.len() == count {
        return Some(Node::constant(ty, values));
    }
    if values.len() != 1 {
        return None;
    }

    let value = values[0];
    if ty.is_matrix() {
        let dim = match ty {
            DataType::Mat2 => 2,
            DataType::Mat3 => 3,
            _ => 4,
        };
        let zero = ConstantValue::Float(0.0);
        let cells = (0..count)
            .map(|i| if i / dim == i % dim { value } else { zero })
            .collect();
        return Some(Node::constant(ty, cells));
    }
    Some(Node::constant(ty, vec![value; count]))
}

#[derive(Clone, Copy)]
struct LocalInfo {
    is_const: bool,
    is_array: bool,
}

enum Symbol {
    Local(LocalInfo),
    BuiltIn { constant: bool },
    Constant { is_array: bool },
    Uniform,
    Varying { is_array: bool },
}

/// Per-function lowering state
struct FunctionScope {
    name: String,
    return_type: DataType,
    can_discard: bool,
    frames: Vec<HashMap<String, LocalInfo>>,
    uses_function: Vec<String>,
    loop_depth: usize,
    switch_depth: usize,
}

#[derive(Default)]
struct VaryingAccess {
    written_in: HashSet<String>,
    read_in: HashSet<String>,
}

struct Builder<'a> {
    exprs: &'a ExprParser,
    functions: &'a BTreeMap<String, FunctionInfo>,
    render_modes: &'a [String],
    types: &'a BTreeSet<String>,
    shader: ShaderNode,
    scope: Option<FunctionScope>,
    // inside a global const initializer or a uniform default
    const_context: bool,
    varying_access: HashMap<String, VaryingAccess>,
}

impl<'a> Builder<'a> {
    fn new(
        exprs: &'a ExprParser,
        functions: &'a BTreeMap<String, FunctionInfo>,
        render_modes: &'a [String],
        types: &'a BTreeSet<String>,
    ) -> Self {
        Self {
            exprs,
            functions,
            render_modes,
            types,
            shader: ShaderNode::default(),
            scope: None,
            const_context: false,
            varying_access: HashMap::new(),
        }
    }

    fn lower_shader(mut self, root: Pair<Rule>) -> Result<ShaderNode> {
        for item in root.into_inner() {
            match item.as_rule() {
                Rule::shader_type_decl => self.lower_shader_type(item)?,
                Rule::render_mode_decl => self.lower_render_modes(item)?,
                Rule::struct_decl => self.lower_struct(item)?,
                Rule::uniform_decl => self.lower_uniform(item)?,
                Rule::varying_decl => self.lower_varying(item)?,
                Rule::const_decl => self.lower_constant(item)?,
                Rule::function_decl => self.lower_function(item)?,
                _ => {}
            }
        }
        self.assign_varying_stages();
        Ok(self.shader)
    }

    // ---- declarations ----

    fn lower_shader_type(&mut self, pair: Pair<Rule>) -> Result<()> {
        let line = line_of(&pair);
        let name = next_str(&mut pair.into_inner().filter(|p| !is_keyword(p)), line)?;
        if !self.types.contains(&name) {
            return fail(line, format!("Invalid shader type: '{}'", name));
        }
        self.shader.shader_type = name;
        Ok(())
    }

    fn lower_render_modes(&mut self, pair: Pair<Rule>) -> Result<()> {
        for mode in pair.into_inner().filter(|p| p.as_rule() == Rule::identifier) {
            let line = line_of(&mode);
            let name = mode.as_str().to_string();
            if !self.render_modes.contains(&name) {
                return fail(line, format!("Invalid render mode: '{}'", name));
            }
            if self.shader.render_modes.contains(&name) {
                return fail(line, format!("Duplicate render mode: '{}'", name));
            }
            self.shader.render_modes.push(name);
        }
        Ok(())
    }

    fn lower_struct(&mut self, pair: Pair<Rule>) -> Result<()> {
        let line = line_of(&pair);
        let mut inner = pair.into_inner().filter(|p| !is_keyword(p));
        let name = next_str(&mut inner, line)?;
        self.check_global_name(&name, line)?;

        let mut members: Vec<StructMember> = Vec::new();
        for member in inner {
            let line = line_of(&member);
            let mut precision = Precision::Default;
            let mut type_name = None;
            let mut member_name = None;
            let mut array_size = 0;
            for p in member.into_inner() {
                match p.as_rule() {
                    Rule::precision => precision = parse_precision(&p),
                    Rule::type_ref => type_name = Some(p.as_str().to_string()),
                    Rule::identifier => member_name = Some(p.as_str().to_string()),
                    Rule::array_size => {
                        array_size = explicit_size(p, line)?.ok_or_else(|| {
                            ParseError::new(line, "Array size must be specified")
                        })?;
                    }
                    _ => {}
                }
            }
            let type_name = type_name.ok_or_else(|| ParseError::new(line, "Expected type"))?;
            let member_name =
                member_name.ok_or_else(|| ParseError::new(line, "Expected member name"))?;
            let (datatype, struct_name) = self.resolve_type(&type_name, line)?;
            if datatype == DataType::Void || datatype.is_sampler() {
                return fail(line, format!("Invalid struct member type: '{}'", type_name));
            }
            if members.iter().any(|m| m.name == member_name) {
                return fail(line, format!("Redefinition of member '{}'", member_name));
            }
            members.push(StructMember {
                name: member_name,
                datatype,
                struct_name,
                precision,
                array_size,
            });
        }

        self.shader.structs.push(Struct {
            name,
            shader_struct: StructNode { members },
        });
        Ok(())
    }

    fn lower_uniform(&mut self, pair: Pair<Rule>) -> Result<()> {
        let line = line_of(&pair);
        let mut precision = Precision::Default;
        let mut datatype = DataType::Void;
        let mut name = String::new();
        let mut hint = ShaderHint::None;
        let mut default_expr = None;

        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::precision => precision = parse_precision(&p),
                Rule::type_name => {
                    datatype = DataType::from_name(p.as_str()).ok_or_else(|| {
                        ParseError::new(line, format!("Unknown type '{}'", p.as_str()))
                    })?;
                }
                Rule::identifier => name = p.as_str().to_string(),
                Rule::hint => hint = Self::lower_hint(p)?,
                Rule::expression => default_expr = Some(p),
                _ => {}
            }
        }

        if datatype == DataType::Void {
            return fail(line, "Uniforms cannot be of type 'void'");
        }
        self.check_global_name(&name, line)?;

        if hint.is_texture_hint() && !datatype.is_sampler() {
            return fail(line, format!("Hint '{}' is only valid on samplers", hint));
        }
        if hint == ShaderHint::Color && !matches!(datatype, DataType::Vec3 | DataType::Vec4) {
            return fail(line, "Color hint is only valid on vec3 and vec4 uniforms");
        }
        if matches!(hint, ShaderHint::Range { .. })
            && !matches!(datatype, DataType::Float | DataType::Int)
        {
            return fail(line, "Range hint is only valid on float and int uniforms");
        }

        let mut default_value = Vec::new();
        if let Some(expr) = default_expr {
            if datatype.is_sampler() {
                return fail(line, "Samplers cannot have default values");
            }
            self.const_context = true;
            let value = self.expression(expr)?;
            self.const_context = false;
            match value {
                Node::Constant(c) if c.array_size == 0 && c.datatype == datatype => {
                    default_value = c.values;
                }
                _ => {
                    return fail(
                        line,
                        format!("Expected constant of type '{}' as default value", datatype),
                    )
                }
            }
        }

        let is_sampler = datatype.is_sampler();
        let slot = self
            .shader
            .uniforms
            .values()
            .filter(|u| u.is_sampler() == is_sampler)
            .count();
        let (order, texture_order) = if is_sampler { (0, slot) } else { (slot, 0) };

        self.shader.uniforms.insert(
            name,
            Uniform {
                datatype,
                precision,
                order,
                texture_order,
                hint,
                default_value,
            },
        );
        Ok(())
    }

    fn lower_hint(pair: Pair<Rule>) -> Result<ShaderHint> {
        let line = line_of(&pair);
        let hint = first_inner(pair)?;
        if hint.as_rule() != Rule::hint_range {
            return ShaderHint::from_name(hint.as_str())
                .ok_or_else(|| ParseError::new(line, format!("Unknown hint '{}'", hint.as_str())));
        }

        let mut numbers = Vec::new();
        for number in hint.into_inner() {
            numbers.push(parse_float(number.as_str(), line)?);
        }
        match numbers[..] {
            [min, max] => Ok(ShaderHint::Range { min, max, step: 1.0 }),
            [min, max, step] => Ok(ShaderHint::Range { min, max, step }),
            _ => fail(line, "hint_range expects a minimum and a maximum"),
        }
    }

    fn lower_varying(&mut self, pair: Pair<Rule>) -> Result<()> {
        let line = line_of(&pair);
        let mut varying = Varying {
            datatype: DataType::Void,
            precision: Precision::Default,
            interpolation: Interpolation::Smooth,
            array_size: 0,
            stage: VaryingStage::VertexToFragment,
        };
        let mut name = String::new();

        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::interpolation => {
                    varying.interpolation = Interpolation::from_name(p.as_str()).unwrap_or_default()
                }
                Rule::precision => varying.precision = parse_precision(&p),
                Rule::type_name => {
                    varying.datatype = DataType::from_name(p.as_str()).unwrap_or(DataType::Void)
                }
                Rule::identifier => name = p.as_str().to_string(),
                Rule::array_size => {
                    varying.array_size = explicit_size(p, line)?.ok_or_else(|| {
                        ParseError::new(line, "Array size must be specified")
                    })?;
                }
                _ => {}
            }
        }

        if varying.datatype == DataType::Void || varying.datatype.is_sampler() {
            return fail(line, format!("Invalid varying type for '{}'", name));
        }
        self.check_global_name(&name, line)?;
        self.shader.varyings.insert(name, varying);
        Ok(())
    }

    fn lower_constant(&mut self, pair: Pair<Rule>) -> Result<()> {
        let line = line_of(&pair);
        let mut precision = Precision::Default;
        let mut type_name = String::new();
        let mut name = String::new();
        let mut size = None;
        let mut initializer = None;

        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::precision => precision = parse_precision(&p),
                Rule::type_ref => type_name = p.as_str().to_string(),
                Rule::identifier => name = p.as_str().to_string(),
                Rule::array_size => size = Some(explicit_size(p, line)?),
                Rule::initializer => initializer = Some(first_inner(p)?),
                _ => {}
            }
        }

        let (datatype, struct_name) = self.resolve_type(&type_name, line)?;
        if datatype == DataType::Void || datatype.is_sampler() {
            return fail(line, format!("Invalid constant type: '{}'", type_name));
        }
        self.check_global_name(&name, line)?;
        let initializer = initializer.ok_or_else(|| {
            ParseError::new(line, format!("Expected initialization of constant '{}'", name))
        })?;

        self.const_context = true;
        let is_array = size.is_some() || initializer.as_rule() == Rule::init_list;
        let (array_size, initializer) = if is_array {
            let elements = self.array_elements(initializer, line)?;
            if elements.iter().any(|e| !matches!(e, Node::Constant(_))) {
                return fail(line, "Expected constant expression");
            }
            let array_size = Self::array_length(size.flatten(), &elements, line)?;
            let node = Node::Constant(ConstantNode {
                datatype,
                struct_name: struct_name.clone(),
                values: Vec::new(),
                array_size,
                array_elements: elements,
            });
            (array_size, node)
        } else {
            (0, self.expression(initializer)?)
        };
        self.const_context = false;

        self.shader.constants.push(Constant {
            name,
            datatype,
            type_name: struct_name,
            precision,
            array_size,
            initializer,
        });
        Ok(())
    }

    fn lower_function(&mut self, pair: Pair<Rule>) -> Result<()> {
        let line = line_of(&pair);
        let mut return_type = None;
        let mut name = String::new();
        let mut params = Vec::new();
        let mut body = None;

        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::type_ref => return_type = Some(p.as_str().to_string()),
                Rule::identifier => name = p.as_str().to_string(),
                Rule::param => params.push(p),
                Rule::block => body = Some(p),
                _ => {}
            }
        }

        let return_type = return_type.ok_or_else(|| ParseError::new(line, "Expected type"))?;
        let (return_type, return_struct_name) = self.resolve_type(&return_type, line)?;
        if BUILTIN_FUNCTIONS.contains(&name.as_str()) {
            return fail(line, format!("Cannot redefine built-in function '{}'", name));
        }
        self.check_global_name(&name, line)?;

        let mut arguments: Vec<Argument> = Vec::new();
        let mut frame = HashMap::new();
        for param in params {
            let argument = self.lower_param(param)?;
            if frame.contains_key(&argument.name) {
                return fail(line, format!("Redefinition of argument '{}'", argument.name));
            }
            frame.insert(
                argument.name.clone(),
                LocalInfo {
                    is_const: argument.is_const,
                    is_array: false,
                },
            );
            arguments.push(argument);
        }

        let is_entry = name != GLOBAL_FUNCTION && self.functions.contains_key(&name);
        if is_entry && (return_type != DataType::Void || !arguments.is_empty()) {
            return fail(
                line,
                format!("Function '{}' must return void and take no arguments", name),
            );
        }

        self.scope = Some(FunctionScope {
            name: name.clone(),
            return_type,
            can_discard: self.functions.get(&name).map_or(true, |f| f.can_discard),
            frames: vec![frame],
            uses_function: Vec::new(),
            loop_depth: 0,
            switch_depth: 0,
        });
        let body = self.lower_block(required(body, line)?)?;
        let uses_function = self
            .scope
            .take()
            .map(|scope| scope.uses_function)
            .unwrap_or_default();

        self.shader.functions.push(Function {
            name: name.clone(),
            uses_function,
            function: FunctionNode {
                name,
                return_type,
                return_struct_name,
                arguments,
                body,
            },
        });
        Ok(())
    }

    fn lower_param(&self, pair: Pair<Rule>) -> Result<Argument> {
        let line = line_of(&pair);
        let mut argument = Argument {
            is_const: false,
            qualifier: ArgumentQualifier::In,
            precision: Precision::Default,
            datatype: DataType::Void,
            type_name: None,
            name: String::new(),
        };
        let mut type_name = String::new();

        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::kw_const => argument.is_const = true,
                Rule::qualifier => {
                    argument.qualifier = ArgumentQualifier::from_name(p.as_str()).unwrap_or_default()
                }
                Rule::precision => argument.precision = parse_precision(&p),
                Rule::type_ref => type_name = p.as_str().to_string(),
                Rule::identifier => argument.name = p.as_str().to_string(),
                _ => {}
            }
        }

        let (datatype, struct_name) = self.resolve_type(&type_name, line)?;
        if datatype == DataType::Void {
            return fail(line, "Arguments cannot be of type 'void'");
        }
        argument.datatype = datatype;
        argument.type_name = struct_name;
        Ok(argument)
    }

    fn check_global_name(&self, name: &str, line: usize) -> Result<()> {
        let taken = self.shader.structs.iter().any(|s| s.name == name)
            || self.shader.uniforms.contains_key(name)
            || self.shader.varyings.contains_key(name)
            || self.shader.constants.iter().any(|c| c.name == name)
            || self.shader.find_function(name).is_some()
            || self
                .functions
                .values()
                .any(|f| f.built_ins.contains_key(name));
        if taken {
            return fail(line, format!("Redefinition of '{}'", name));
        }
        Ok(())
    }

    fn resolve_type(&self, name: &str, line: usize) -> Result<(DataType, Option<String>)> {
        if let Some(ty) = DataType::from_name(name) {
            return Ok((ty, None));
        }
        if self.shader.structs.iter().any(|s| s.name == name) {
            return Ok((DataType::Struct, Some(name.to_string())));
        }
        fail(line, format!("Unknown type '{}'", name))
    }

    fn assign_varying_stages(&mut self) {
        for (name, varying) in self.shader.varyings.iter_mut() {
            let access = self.varying_access.get(name);
            let written = |f: &str| access.map_or(false, |a| a.written_in.contains(f));
            let read = |f: &str| access.map_or(false, |a| a.read_in.contains(f));

            varying.stage = if written("vertex") || !written("fragment") {
                VaryingStage::VertexToFragment
            } else if read("light") {
                VaryingStage::FragmentToLight
            } else {
                VaryingStage::Fragment
            };
        }
    }

    // ---- statements ----

    fn function_scope(&mut self, line: usize) -> Result<&mut FunctionScope> {
        self.scope
            .as_mut()
            .ok_or_else(|| ParseError::new(line, "Statement outside of a function"))
    }

    fn push_frame(&mut self) {
        if let Some(scope) = self.scope.as_mut() {
            scope.frames.push(HashMap::new());
        }
    }

    fn pop_frame(&mut self) {
        if let Some(scope) = self.scope.as_mut() {
            scope.frames.pop();
        }
    }

    fn declare_local(&mut self, name: &str, info: LocalInfo, line: usize) -> Result<()> {
        let frame = self
            .function_scope(line)?
            .frames
            .last_mut()
            .ok_or_else(|| ParseError::new(line, "Declaration outside of a block"))?;
        if frame.contains_key(name) {
            return fail(line, format!("Redefinition of '{}'", name));
        }
        frame.insert(name.to_string(), info);
        Ok(())
    }

    fn lower_block(&mut self, pair: Pair<Rule>) -> Result<BlockNode> {
        self.push_frame();
        let mut statements = Vec::new();
        for statement in pair.into_inner() {
            if let Some(node) = self.lower_statement(statement)? {
                statements.push(node);
            }
        }
        self.pop_frame();
        Ok(BlockNode::new(statements))
    }

    /// Body of a control flow statement; unbraced bodies become
    /// single-statement blocks
    fn lower_body(&mut self, pair: Pair<Rule>) -> Result<BlockNode> {
        if pair.as_rule() == Rule::block {
            return self.lower_block(pair);
        }
        self.push_frame();
        let statement = self.lower_statement(pair)?;
        self.pop_frame();
        Ok(match statement {
            Some(node) => BlockNode::single(node),
            None => BlockNode::default(),
        })
    }

    fn lower_loop_body(&mut self, pair: Pair<Rule>, line: usize) -> Result<BlockNode> {
        self.function_scope(line)?.loop_depth += 1;
        let body = self.lower_body(pair)?;
        self.function_scope(line)?.loop_depth -= 1;
        Ok(body)
    }

    fn lower_statement(&mut self, pair: Pair<Rule>) -> Result<Option<Node>> {
        let line = line_of(&pair);
        let node = match pair.as_rule() {
            Rule::block => Node::Block(self.lower_block(pair)?),
            Rule::if_stmt => {
                let mut inner = pair.into_inner().filter(|p| !is_keyword(p));
                let condition = self.expression(required(inner.next(), line)?)?;
                let mut blocks = vec![self.lower_body(required(inner.next(), line)?)?];
                if let Some(otherwise) = inner.next() {
                    blocks.push(self.lower_body(otherwise)?);
                }
                Node::flow(FlowOperation::If, vec![condition], blocks)
            }
            Rule::while_stmt => {
                let mut inner = pair.into_inner().filter(|p| !is_keyword(p));
                let condition = self.expression(required(inner.next(), line)?)?;
                let body = self.lower_loop_body(required(inner.next(), line)?, line)?;
                Node::flow(FlowOperation::While, vec![condition], vec![body])
            }
            Rule::do_stmt => {
                let mut inner = pair.into_inner().filter(|p| !is_keyword(p));
                let body = self.lower_loop_body(required(inner.next(), line)?, line)?;
                let condition = self.expression(required(inner.next(), line)?)?;
                Node::flow(FlowOperation::Do, vec![condition], vec![body])
            }
            Rule::for_stmt => {
                let mut inner = pair.into_inner().filter(|p| !is_keyword(p));
                self.push_frame();
                let init = match required(inner.next(), line)?.into_inner().next() {
                    Some(statement) => self.lower_statement(statement)?,
                    None => None,
                }
                .ok_or_else(|| ParseError::new(line, "Missing 'for' loop initializer"))?;
                let condition = required(inner.next(), line)?
                    .into_inner()
                    .next()
                    .ok_or_else(|| ParseError::new(line, "Missing 'for' loop condition"))?;
                let condition = self.expression(condition)?;
                let step = required(inner.next(), line)?
                    .into_inner()
                    .next()
                    .ok_or_else(|| ParseError::new(line, "Missing 'for' loop step"))?;
                let step = self.expression(step)?;
                let body = self.lower_loop_body(required(inner.next(), line)?, line)?;
                self.pop_frame();
                Node::flow(
                    FlowOperation::For,
                    vec![condition, step],
                    vec![BlockNode::single(init), body],
                )
            }
            Rule::switch_stmt => self.lower_switch(pair)?,
            Rule::return_stmt => {
                let value = match pair.into_inner().find(|p| p.as_rule() == Rule::expression) {
                    Some(expr) => Some(self.expression(expr)?),
                    None => None,
                };
                let return_type = self.function_scope(line)?.return_type;
                match (&value, return_type) {
                    (Some(_), DataType::Void) => {
                        return fail(line, "Void function cannot return a value")
                    }
                    (None, ty) if ty != DataType::Void => {
                        return fail(line, format!("Expected return value of type '{}'", ty))
                    }
                    _ => {}
                }
                Node::flow(FlowOperation::Return, value.into_iter().collect(), Vec::new())
            }
            Rule::discard_stmt => {
                let scope = self.function_scope(line)?;
                if !scope.can_discard {
                    return fail(line, format!("'discard' is not allowed in '{}'", scope.name));
                }
                Node::flow(FlowOperation::Discard, Vec::new(), Vec::new())
            }
            Rule::break_stmt => {
                let scope = self.function_scope(line)?;
                if scope.loop_depth == 0 && scope.switch_depth == 0 {
                    return fail(line, "'break' is only allowed inside a loop or switch");
                }
                Node::flow(FlowOperation::Break, Vec::new(), Vec::new())
            }
            Rule::continue_stmt => {
                if self.function_scope(line)?.loop_depth == 0 {
                    return fail(line, "'continue' is only allowed inside a loop");
                }
                Node::flow(FlowOperation::Continue, Vec::new(), Vec::new())
            }
            Rule::var_decl => self.lower_var_decl(pair)?,
            Rule::expr_stmt => self.expression(first_inner(pair)?)?,
            Rule::empty_stmt => return Ok(None),
            rule => return fail(line, format!("Unexpected statement: {:?}", rule)),
        };
        Ok(Some(node))
    }

    fn lower_switch(&mut self, pair: Pair<Rule>) -> Result<Node> {
        let line = line_of(&pair);
        let mut inner = pair.into_inner().filter(|p| !is_keyword(p));
        let value = self.expression(required(inner.next(), line)?)?;

        self.function_scope(line)?.switch_depth += 1;
        let mut labels = HashSet::new();
        let mut has_default = false;
        let mut cases = Vec::new();
        for case in inner {
            let line = line_of(&case);
            let mut parts = case.into_inner();
            let is_default = parts
                .next()
                .map_or(false, |p| p.as_rule() == Rule::kw_default);

            let label = if is_default {
                if has_default {
                    return fail(line, "Duplicate default case");
                }
                has_default = true;
                None
            } else {
                let label = parse_case_label(required(parts.next(), line)?.as_str(), line)?;
                if !labels.insert(label) {
                    return fail(line, format!("Duplicate case label: {}", label));
                }
                Some(label)
            };

            self.push_frame();
            let mut statements = Vec::new();
            for statement in parts {
                if let Some(node) = self.lower_statement(statement)? {
                    statements.push(node);
                }
            }
            self.pop_frame();

            let body = BlockNode::new(statements);
            cases.push(match label {
                Some(label) => Node::flow(FlowOperation::Case, vec![Node::int(label)], vec![body]),
                None => Node::flow(FlowOperation::Default, Vec::new(), vec![body]),
            });
        }
        self.function_scope(line)?.switch_depth -= 1;

        Ok(Node::flow(
            FlowOperation::Switch,
            vec![value],
            vec![BlockNode::new(cases)],
        ))
    }

    fn lower_var_decl(&mut self, pair: Pair<Rule>) -> Result<Node> {
        let line = line_of(&pair);
        let mut is_const = false;
        let mut precision = Precision::Default;
        let mut type_name = String::new();
        let mut items = Vec::new();

        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::kw_const => is_const = true,
                Rule::precision => precision = parse_precision(&p),
                Rule::type_ref => type_name = p.as_str().to_string(),
                Rule::var_item => items.push(p),
                _ => {}
            }
        }

        let (datatype, struct_name) = self.resolve_type(&type_name, line)?;
        if datatype == DataType::Void {
            return fail(line, "Variables cannot be of type 'void'");
        }

        let mut scalars = Vec::new();
        let mut arrays = Vec::new();
        for item in items {
            let line = line_of(&item);
            let mut inner = item.into_inner();
            let name = next_str(&mut inner, line)?;
            let mut size = None;
            let mut init = None;
            for p in inner {
                match p.as_rule() {
                    Rule::array_size => size = Some(explicit_size(p, line)?),
                    Rule::initializer => init = Some(first_inner(p)?),
                    _ => {}
                }
            }

            let is_array = size.is_some() || matches!(&init, Some(p) if p.as_rule() == Rule::init_list);
            if is_const && init.is_none() {
                return fail(line, format!("Expected initialization of constant '{}'", name));
            }

            if is_array {
                let elements = match init {
                    Some(init) => self.array_elements(init, line)?,
                    None => Vec::new(),
                };
                let size = Self::array_length(size.flatten(), &elements, line)?;
                self.declare_local(&name, LocalInfo { is_const, is_array: true }, line)?;
                arrays.push(ArrayDeclaration {
                    name,
                    size,
                    initializer: elements,
                });
            } else {
                let initializer = match init {
                    Some(init) => Some(Box::new(self.expression(init)?)),
                    None => None,
                };
                self.declare_local(&name, LocalInfo { is_const, is_array: false }, line)?;
                scalars.push(Declaration { name, initializer });
            }
        }

        if !scalars.is_empty() && !arrays.is_empty() {
            return fail(line, "Cannot mix array and non-array declarations");
        }
        if !arrays.is_empty() {
            return Ok(Node::ArrayDeclaration(ArrayDeclarationNode {
                is_const,
                precision,
                datatype,
                struct_name,
                declarations: arrays,
            }));
        }
        Ok(Node::VariableDeclaration(VariableDeclarationNode {
            is_const,
            precision,
            datatype,
            struct_name,
            declarations: scalars,
        }))
    }

    /// Elements of an `{...}` list or of an array constructor
    fn array_elements(&mut self, init: Pair<Rule>, line: usize) -> Result<Vec<Node>> {
        if init.as_rule() == Rule::init_list {
            let mut elements = Vec::new();
            for expr in init.into_inner() {
                elements.push(self.expression(expr)?);
            }
            return Ok(elements);
        }
        match self.expression(init)? {
            Node::ArrayConstruct(construct) => Ok(construct.initializer),
            _ => fail(line, "Expected array initializer"),
        }
    }

    fn array_length(declared: Option<u32>, elements: &[Node], line: usize) -> Result<u32> {
        match declared {
            Some(size) if !elements.is_empty() && elements.len() != size as usize => fail(
                line,
                format!(
                    "Array size mismatch: expected {} elements, found {}",
                    size,
                    elements.len()
                ),
            ),
            Some(size) => Ok(size),
            None if !elements.is_empty() => Ok(elements.len() as u32),
            None => fail(line, "Array size must be specified"),
        }
    }

    // ---- expressions ----

    fn expression(&mut self, pair: Pair<Rule>) -> Result<Node> {
        let raw = self.exprs.parse(pair)?;
        self.lower_expr(raw)
    }

    fn lower_all(&mut self, exprs: Vec<RawExpr>) -> Result<Vec<Node>> {
        exprs.into_iter().map(|e| self.lower_expr(e)).collect()
    }

    fn lower_expr(&mut self, expr: RawExpr) -> Result<Node> {
        let line = expr.line;
        match expr.kind {
            RawKind::Literal(value) => Ok(Node::constant(value.data_type(), vec![value])),
            RawKind::Ident(name) => self.lower_ident(name, line),
            RawKind::Call { callee, args } => self.lower_call(callee, args, line),
            RawKind::ArrayCtor {
                type_name,
                size,
                elements,
            } => {
                let (datatype, struct_name) = self.resolve_type(&type_name, line)?;
                if let Some(size) = size {
                    if size as usize != elements.len() {
                        return fail(
                            line,
                            format!(
                                "Array size mismatch: expected {} elements, found {}",
                                size,
                                elements.len()
                            ),
                        );
                    }
                }
                let initializer = self.lower_all(elements)?;
                Ok(Node::ArrayConstruct(ArrayConstructNode {
                    datatype,
                    struct_name,
                    initializer,
                }))
            }
            RawKind::Prefix { op, operand } => {
                let operand = self.lower_expr(*operand)?;
                if matches!(op, Operator::Increment | Operator::Decrement) {
                    self.check_assignable(&operand, line)?;
                }
                if op == Operator::Negate {
                    if let Some(folded) = fold_negate(&operand) {
                        return Ok(folded);
                    }
                }
                Ok(Node::op(op, vec![operand]))
            }
            RawKind::Postfix { op, operand } => {
                let operand = self.lower_expr(*operand)?;
                self.check_assignable(&operand, line)?;
                Ok(Node::op(op, vec![operand]))
            }
            RawKind::Index { base, index } => {
                let base = self.lower_expr(*base)?;
                let index = self.lower_expr(*index)?;
                match base {
                    Node::Array(mut array)
                        if array.index_expression.is_none() && array.call_expression.is_none() =>
                    {
                        array.index_expression = Some(Box::new(index));
                        Ok(Node::Array(array))
                    }
                    base => Ok(Node::op(Operator::Index, vec![base, index])),
                }
            }
            RawKind::Member { base, name } => Ok(Node::Member(MemberNode {
                owner: Box::new(self.lower_expr(*base)?),
                name,
                index_expression: None,
                assign_expression: None,
            })),
            RawKind::MethodCall { base, name, args } => match self.lower_expr(*base)? {
                Node::Array(mut array)
                    if name == "length"
                        && args.is_empty()
                        && array.index_expression.is_none()
                        && array.call_expression.is_none() =>
                {
                    array.call_expression = Some(Box::new(Node::call("length", Vec::new())));
                    Ok(Node::Array(array))
                }
                _ => fail(line, format!("Unknown method '{}'", name)),
            },
            RawKind::Binary { op, lhs, rhs } => {
                let lhs = self.lower_expr(*lhs)?;
                let rhs = self.lower_expr(*rhs)?;
                if op.is_assignment() {
                    self.check_assignable(&lhs, line)?;
                }
                Ok(Node::op(op, vec![lhs, rhs]))
            }
            RawKind::Ternary {
                condition,
                then_expr,
                else_expr,
            } => {
                let condition = self.lower_expr(*condition)?;
                let then_expr = self.lower_expr(*then_expr)?;
                let else_expr = self.lower_expr(*else_expr)?;
                Ok(Node::op(
                    Operator::SelectIf,
                    vec![condition, then_expr, else_expr],
                ))
            }
        }
    }

    fn resolve(&self, name: &str) -> Option<Symbol> {
        if let Some(scope) = &self.scope {
            for frame in scope.frames.iter().rev() {
                if let Some(info) = frame.get(name) {
                    return Some(Symbol::Local(*info));
                }
            }
            for function in [scope.name.as_str(), GLOBAL_FUNCTION] {
                let built_in = self
                    .functions
                    .get(function)
                    .and_then(|f| f.built_ins.get(name));
                if let Some(built_in) = built_in {
                    return Some(Symbol::BuiltIn {
                        constant: built_in.constant,
                    });
                }
            }
        }
        if let Some(constant) = self.shader.constants.iter().find(|c| c.name == name) {
            return Some(Symbol::Constant {
                is_array: constant.array_size > 0,
            });
        }
        if self.shader.uniforms.contains_key(name) {
            return Some(Symbol::Uniform);
        }
        self.shader.varyings.get(name).map(|v| Symbol::Varying {
            is_array: v.array_size > 0,
        })
    }

    fn note_varying(&mut self, name: &str, write: bool) {
        let Some(function) = self.scope.as_ref().map(|s| s.name.clone()) else {
            return;
        };
        let access = self.varying_access.entry(name.to_string()).or_default();
        if write {
            access.written_in.insert(function);
        } else {
            access.read_in.insert(function);
        }
    }

    fn lower_ident(&mut self, name: String, line: usize) -> Result<Node> {
        let Some(symbol) = self.resolve(&name) else {
            if self.shader.find_function(&name).is_some() || BUILTIN_FUNCTIONS.contains(&name.as_str()) {
                return fail(line, format!("Function '{}' used as a value", name));
            }
            return fail(line, format!("Unknown identifier in expression: {}", name));
        };
        if self.const_context && !matches!(symbol, Symbol::Constant { .. }) {
            return fail(line, format!("Expected constant expression, found '{}'", name));
        }

        let array_or = |is_array: bool, is_local: bool, name: String| {
            if is_array {
                Node::Array(ArrayNode::new(name, is_local))
            } else if is_local {
                Node::local(name)
            } else {
                Node::variable(name)
            }
        };

        Ok(match symbol {
            Symbol::Local(info) => array_or(info.is_array, true, name),
            Symbol::BuiltIn { .. } | Symbol::Uniform => Node::variable(name),
            Symbol::Constant { is_array } => array_or(is_array, false, name),
            Symbol::Varying { is_array } => {
                self.note_varying(&name, false);
                array_or(is_array, false, name)
            }
        })
    }

    fn check_assignable(&mut self, target: &Node, line: usize) -> Result<()> {
        let Some(root) = assign_root(target) else {
            return fail(line, "Invalid assignment target");
        };
        match self.resolve(&root) {
            Some(Symbol::Local(LocalInfo { is_const: true, .. }))
            | Some(Symbol::BuiltIn { constant: true })
            | Some(Symbol::Constant { .. }) => fail(line, "Constants cannot be modified."),
            Some(Symbol::Uniform) => fail(line, "Uniforms cannot be modified."),
            Some(Symbol::Varying { .. }) => {
                let function = self.scope.as_ref().map(|s| s.name.as_str()).unwrap_or_default();
                if function != "vertex" && function != "fragment" {
                    return fail(
                        line,
                        format!(
                            "Varyings can only be written in 'vertex' or 'fragment', not '{}'",
                            function
                        ),
                    );
                }
                self.note_varying(&root, true);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn lower_call(&mut self, callee: String, args: Vec<RawExpr>, line: usize) -> Result<Node> {
        let mut arguments = self.lower_all(args)?;

        if let Some(ty) = DataType::from_name(&callee) {
            if !ty.is_constructible() {
                return fail(line, format!("Invalid constructor type '{}'", callee));
            }
            if let Some(folded) = fold_construct(ty, &arguments) {
                return Ok(folded);
            }
            arguments.insert(0, Node::variable(callee));
            return Ok(Node::op(Operator::Construct, arguments));
        }

        if self.shader.structs.iter().any(|s| s.name == callee) {
            arguments.insert(0, Node::variable(callee));
            return Ok(Node::op(Operator::Struct, arguments));
        }

        if BUILTIN_FUNCTIONS.contains(&callee.as_str()) {
            return Ok(Node::call(callee, arguments));
        }

        if self.const_context {
            return fail(line, format!("Expected constant expression, found call to '{}'", callee));
        }
        if callee != GLOBAL_FUNCTION && self.functions.contains_key(&callee) {
            return fail(line, format!("Entry function '{}' cannot be called", callee));
        }

        let declared = self.shader.find_function(&callee).is_some();
        let scope = self.function_scope(line)?;
        if scope.name == callee {
            return fail(line, format!("Recursion is not allowed: '{}'", callee));
        }
        if !declared {
            return fail(line, format!("Unknown function: '{}'", callee));
        }
        if !scope.uses_function.contains(&callee) {
            scope.uses_function.push(callee.clone());
        }
        Ok(Node::call(callee, arguments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ShaderTypes;
    use glint_core::ShaderMode;

    fn parse(mode: ShaderMode, code: &str) -> Result<ShaderNode> {
        let types = ShaderTypes::new();
        ShaderLanguageParser::new().parse(
            code,
            types.functions(mode),
            types.modes(mode),
            types.types(),
        )
    }

    fn parse_spatial(code: &str) -> ShaderNode {
        parse(ShaderMode::Spatial, code).unwrap()
    }

    fn body<'s>(shader: &'s ShaderNode, name: &str) -> &'s BlockNode {
        &shader.find_function(name).unwrap().function.body
    }

    #[test]
    fn test_minimal_shader() {
        let shader = parse(ShaderMode::CanvasItem, "shader_type canvas_item;").unwrap();
        assert_eq!(shader.shader_type, "canvas_item");
        assert!(shader.functions.is_empty());
        assert!(shader.uniforms.is_empty());
    }

    #[test]
    fn test_shader_type_lookup() {
        assert_eq!(
            ShaderLanguageParser::shader_type("// header\nshader_type spatial;\nvoid f() {}"),
            Some("spatial".to_string())
        );
        assert_eq!(ShaderLanguageParser::shader_type("uniform float x;"), None);
    }

    #[test]
    fn test_invalid_shader_type() {
        let err = parse(ShaderMode::Spatial, "shader_type voxel;").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.text.contains("voxel"));
    }

    #[test]
    fn test_render_modes() {
        let shader = parse_spatial("shader_type spatial;\nrender_mode unshaded, specular_blinn;");
        assert_eq!(shader.render_modes, vec!["unshaded", "specular_blinn"]);

        let err = parse(ShaderMode::Spatial, "shader_type spatial;\nrender_mode bogus;").unwrap_err();
        assert_eq!(err.line, 2);

        let err = parse(
            ShaderMode::Spatial,
            "shader_type spatial;\nrender_mode unshaded, unshaded;",
        )
        .unwrap_err();
        assert!(err.text.contains("Duplicate"));
    }

    #[test]
    fn test_uniform_ordering() {
        let shader = parse_spatial(
            "shader_type spatial;
            uniform float roughness;
            uniform sampler2D albedo_tex : hint_albedo;
            uniform vec4 tint : hint_color = vec4(1.0, 1.0, 1.0, 1.0);
            uniform sampler2D normal_tex : hint_normal;
            uniform float amount : hint_range(0, 2, 0.1);",
        );
        let u = &shader.uniforms;
        assert_eq!(u["roughness"].order, 0);
        assert_eq!(u["tint"].order, 1);
        assert_eq!(u["amount"].order, 2);
        assert_eq!(u["albedo_tex"].texture_order, 0);
        assert_eq!(u["normal_tex"].texture_order, 1);
        assert_eq!(u["albedo_tex"].hint, ShaderHint::Albedo);
        assert_eq!(
            u["amount"].hint,
            ShaderHint::Range {
                min: 0.0,
                max: 2.0,
                step: 0.1
            }
        );
        assert_eq!(u["tint"].default_value.len(), 4);
    }

    #[test]
    fn test_uniform_hint_validation() {
        let err = parse(
            ShaderMode::Spatial,
            "shader_type spatial;\nuniform float x : hint_albedo;",
        )
        .unwrap_err();
        assert!(err.text.contains("samplers"));

        let err = parse(
            ShaderMode::Spatial,
            "shader_type spatial;\nuniform vec2 x : hint_color;",
        )
        .unwrap_err();
        assert_eq!(err.line, 2);

        assert!(parse(
            ShaderMode::Spatial,
            "shader_type spatial;\nuniform float x = y;",
        )
        .is_err());
    }

    #[test]
    fn test_assignment_resolves_builtins_and_uniforms() {
        let shader = parse_spatial(
            "shader_type spatial;
            uniform vec3 albedo_col;
            void fragment() {
                ALBEDO = albedo_col;
            }",
        );
        let block = body(&shader, "fragment");
        assert_eq!(
            block.statements,
            vec![Node::assign(
                Node::variable("ALBEDO"),
                Node::variable("albedo_col")
            )]
        );
    }

    #[test]
    fn test_unknown_identifier() {
        let err = parse(
            ShaderMode::Spatial,
            "shader_type spatial;\nvoid fragment() {\n\tALBEDO = missing;\n}",
        )
        .unwrap_err();
        assert_eq!(err.line, 3);
        assert!(err.text.contains("missing"));
    }

    #[test]
    fn test_builtins_are_per_function() {
        // ALBEDO is not visible in vertex
        assert!(parse(
            ShaderMode::Spatial,
            "shader_type spatial;\nvoid vertex() { ALBEDO = vec3(1.0); }",
        )
        .is_err());
        assert!(parse(
            ShaderMode::Spatial,
            "shader_type spatial;\nvoid vertex() { VERTEX.x += TIME; }",
        )
        .is_ok());
    }

    #[test]
    fn test_write_validation() {
        let cases = [
            "shader_type spatial;\nuniform float u;\nvoid fragment() { u = 1.0; }",
            "shader_type spatial;\nconst float C = 1.0;\nvoid fragment() { C = 2.0; }",
            "shader_type spatial;\nvoid fragment() { TIME = 2.0; }",
            "shader_type spatial;\nvoid fragment() { const float k = 1.0; k += 1.0; }",
            "shader_type spatial;\nvarying float v;\nvoid light() { v = 1.0; }",
        ];
        for code in cases {
            assert!(parse(ShaderMode::Spatial, code).is_err(), "{}", code);
        }
    }

    #[test]
    fn test_control_flow_placement() {
        assert!(parse(
            ShaderMode::Spatial,
            "shader_type spatial;\nvoid vertex() { discard; }",
        )
        .is_err());
        assert!(parse(
            ShaderMode::Spatial,
            "shader_type spatial;\nvoid fragment() { discard; }",
        )
        .is_ok());
        assert!(parse(
            ShaderMode::Spatial,
            "shader_type spatial;\nvoid fragment() { break; }",
        )
        .is_err());
        assert!(parse(
            ShaderMode::Spatial,
            "shader_type spatial;\nvoid fragment() { switch (1) { case 0: continue; } }",
        )
        .is_err());
        assert!(parse(
            ShaderMode::Spatial,
            "shader_type spatial;\nvoid fragment() { switch (1) { case 0: break; default: break; } }",
        )
        .is_ok());
    }

    #[test]
    fn test_entry_signature() {
        let err = parse(
            ShaderMode::Spatial,
            "shader_type spatial;\nfloat fragment() { return 1.0; }",
        )
        .unwrap_err();
        assert!(err.text.contains("must return void"));
    }

    #[test]
    fn test_function_calls() {
        let shader = parse_spatial(
            "shader_type spatial;
            float a(float x) { return x * 2.0; }
            float b(float x) { return a(x) + 1.0; }
            float c() { return b(1.0) + a(2.0) + b(3.0); }
            void fragment() { ALBEDO = vec3(c()); }",
        );
        assert_eq!(shader.find_function("c").unwrap().uses_function, vec!["b", "a"]);
        assert_eq!(shader.find_function("fragment").unwrap().uses_function, vec!["c"]);

        let args = &shader.find_function("a").unwrap().function.arguments;
        assert_eq!(args.len(), 1);
        assert_eq!(args[0].qualifier, ArgumentQualifier::In);
    }

    #[test]
    fn test_call_errors() {
        let err = parse(
            ShaderMode::Spatial,
            "shader_type spatial;\nfloat f() { return f(); }",
        )
        .unwrap_err();
        assert!(err.text.contains("Recursion"));

        let err = parse(
            ShaderMode::Spatial,
            "shader_type spatial;\nvoid fragment() { g(); }\nvoid g() {}",
        )
        .unwrap_err();
        assert!(err.text.contains("Unknown function"));
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_varying_stages() {
        let shader = parse_spatial(
            "shader_type spatial;
            varying vec2 uv2;
            varying vec3 col;
            varying float mask;
            varying float unused;
            void vertex() { uv2 = UV; }
            void fragment() {
                col = vec3(uv2, 0.0);
                mask = 1.0;
                ALBEDO = col * mask;
            }
            void light() { DIFFUSE_LIGHT += col; }",
        );
        let v = &shader.varyings;
        assert_eq!(v["uv2"].stage, VaryingStage::VertexToFragment);
        assert_eq!(v["col"].stage, VaryingStage::FragmentToLight);
        assert_eq!(v["mask"].stage, VaryingStage::Fragment);
        assert_eq!(v["unused"].stage, VaryingStage::VertexToFragment);
    }

    #[test]
    fn test_varying_write_in_helper_rejected() {
        let err = parse(
            ShaderMode::Spatial,
            "shader_type spatial;
varying vec3 v;
void set_v(vec3 p) { v = p; }
void vertex() { set_v(VERTEX); }",
        )
        .unwrap_err();
        assert_eq!(err.line, 3);
        assert!(err.text.contains("'set_v'"), "{}", err.text);

        // Reading from a helper stays legal
        let shader = parse_spatial(
            "shader_type spatial;
varying vec3 v;
vec3 get_v() { return v; }
void vertex() { v = VERTEX; }
void fragment() { ALBEDO = get_v(); }",
        );
        assert_eq!(shader.varyings["v"].stage, VaryingStage::VertexToFragment);
    }

    #[test]
    fn test_unbraced_bodies_are_single_statements() {
        let shader = parse_spatial(
            "shader_type spatial;
            void fragment() {
                if (TIME > 1.0)
                    ALBEDO = vec3(1.0);
                else {
                    ALBEDO = vec3(0.0);
                }
                for (int i = 0; i < 4; i++)
                    ALBEDO.x += 0.1;
            }",
        );
        let block = body(&shader, "fragment");
        let Node::ControlFlow(if_node) = &block.statements[0] else {
            panic!("Expected if");
        };
        assert!(if_node.blocks[0].single_statement);
        assert!(!if_node.blocks[1].single_statement);

        let Node::ControlFlow(for_node) = &block.statements[1] else {
            panic!("Expected for");
        };
        assert_eq!(for_node.flow_op, FlowOperation::For);
        assert!(for_node.blocks[0].single_statement);
        assert!(matches!(
            for_node.blocks[0].statements[0],
            Node::VariableDeclaration(_)
        ));
        assert!(for_node.blocks[1].single_statement);
    }

    #[test]
    fn test_for_requires_every_clause() {
        let cases = [
            ("void fragment() {\n\tint i = 0;\n\tfor (; i < 4; i++) {}\n}", "initializer"),
            ("void fragment() {\n\tint i = 0;\n\tfor (i = 0; ; i++) {}\n}", "condition"),
            ("void fragment() {\n\tint i = 0;\n\tfor (i = 0; i < 4; ) {}\n}", "step"),
        ];
        for (code, clause) in cases {
            let err = parse(ShaderMode::Spatial, &format!("shader_type spatial;\n{}", code)).unwrap_err();
            assert_eq!(err.line, 4, "{}", code);
            assert_eq!(err.text, format!("Missing 'for' loop {}", clause));
        }

        let shader = parse_spatial(
            "shader_type spatial;\nvoid fragment() { int i; for (i = 0; i < 4; i++) {} }",
        );
        let Node::ControlFlow(for_node) = &body(&shader, "fragment").statements[1] else {
            panic!("Expected for");
        };
        assert_eq!(for_node.expressions.len(), 2);
        assert!(matches!(for_node.blocks[0].statements[0], Node::Operator(_)));
    }

    #[test]
    fn test_constant_folding() {
        let shader = parse_spatial(
            "shader_type spatial;
            void fragment() {
                ALBEDO = vec3(1.0, 0.5, 0.0);
                ALPHA = -1.0;
                ALBEDO = vec3(0.25);
                ALBEDO = vec3(ALPHA);
            }",
        );
        let block = body(&shader, "fragment");
        let rhs = |i: usize| match &block.statements[i] {
            Node::Operator(op) => op.arguments[1].clone(),
            other => panic!("Expected assignment, got {:?}", other),
        };

        assert_eq!(
            rhs(0),
            Node::constant(
                DataType::Vec3,
                vec![
                    ConstantValue::Float(1.0),
                    ConstantValue::Float(0.5),
                    ConstantValue::Float(0.0)
                ]
            )
        );
        assert_eq!(rhs(1), Node::float(-1.0));
        assert_eq!(
            rhs(2),
            Node::constant(DataType::Vec3, vec![ConstantValue::Float(0.25); 3])
        );
        assert!(matches!(rhs(3), Node::Operator(ref op) if op.op == Operator::Construct));
    }

    #[test]
    fn test_matrix_diagonal() {
        let Some(Node::Constant(c)) = fold_construct(DataType::Mat2, &[Node::float(2.0)]) else {
            panic!("Expected folded matrix");
        };
        let cells: Vec<f32> = c.values.iter().map(|v| v.as_float()).collect();
        assert_eq!(cells, vec![2.0, 0.0, 0.0, 2.0]);
    }

    #[test]
    fn test_local_arrays() {
        let shader = parse_spatial(
            "shader_type spatial;
            void fragment() {
                float weights[] = {0.25, 0.5, 0.25};
                float other[2] = float[2](1.0, 2.0);
                ALPHA = weights[1] + float(weights.length());
            }",
        );
        let block = body(&shader, "fragment");
        let Node::ArrayDeclaration(decl) = &block.statements[0] else {
            panic!("Expected array declaration");
        };
        assert_eq!(decl.declarations[0].size, 3);
        let Node::ArrayDeclaration(decl) = &block.statements[1] else {
            panic!("Expected array declaration");
        };
        assert_eq!(decl.declarations[0].initializer.len(), 2);

        let Node::Operator(assign) = &block.statements[2] else {
            panic!("Expected assignment");
        };
        let Node::Operator(add) = &assign.arguments[1] else {
            panic!("Expected addition");
        };
        let Node::Array(indexed) = &add.arguments[0] else {
            panic!("Expected array reference");
        };
        assert!(indexed.is_local);
        assert_eq!(indexed.index_expression.as_deref(), Some(&Node::int(1)));
    }

    #[test]
    fn test_array_errors() {
        assert!(parse(
            ShaderMode::Spatial,
            "shader_type spatial;\nvoid fragment() { float a[]; }",
        )
        .is_err());
        assert!(parse(
            ShaderMode::Spatial,
            "shader_type spatial;\nvoid fragment() { float a[2] = {1.0}; }",
        )
        .is_err());
        assert!(parse(
            ShaderMode::Spatial,
            "shader_type spatial;\nvoid fragment() { float a[2], b; }",
        )
        .is_err());
    }

    #[test]
    fn test_structs_and_constants() {
        let shader = parse_spatial(
            "shader_type spatial;
            struct Light { vec3 dir; highp float power[2]; };
            const float SCALE = 2.0;
            const int LUT[3] = {1, 2, 3};
            void fragment() {
                Light l = Light(vec3(0.0), float[2](1.0, 2.0));
                ALPHA = l.power[0] * SCALE + float(LUT[1]);
            }",
        );
        assert_eq!(shader.structs[0].name, "Light");
        assert_eq!(shader.structs[0].shader_struct.members[1].array_size, 2);
        assert_eq!(shader.constants[1].array_size, 3);

        let block = body(&shader, "fragment");
        let Node::VariableDeclaration(decl) = &block.statements[0] else {
            panic!("Expected declaration");
        };
        assert_eq!(decl.datatype, DataType::Struct);
        assert_eq!(decl.struct_name.as_deref(), Some("Light"));
    }

    #[test]
    fn test_switch_labels() {
        let shader = parse_spatial(
            "shader_type spatial;
            void fragment() {
                int k = 1;
                switch (k) {
                    case -1:
                    case 2: ALPHA = 0.5; break;
                    default: ALPHA = 1.0;
                }
            }",
        );
        let Node::ControlFlow(switch) = &body(&shader, "fragment").statements[1] else {
            panic!("Expected switch");
        };
        let cases = &switch.blocks[0].statements;
        assert_eq!(cases.len(), 3);
        let Node::ControlFlow(first) = &cases[0] else {
            panic!("Expected case");
        };
        assert_eq!(first.expressions[0], Node::int(-1));

        let err = parse(
            ShaderMode::Spatial,
            "shader_type spatial;\nvoid fragment() { switch (1) { case 1: break; case 1: break; } }",
        )
        .unwrap_err();
        assert!(err.text.contains("Duplicate case label"));
    }

    #[test]
    fn test_redefinitions() {
        assert!(parse(
            ShaderMode::Spatial,
            "shader_type spatial;\nuniform float a;\nvarying float a;",
        )
        .is_err());
        assert!(parse(
            ShaderMode::Spatial,
            "shader_type spatial;\nvoid fragment() { float x; float x; }",
        )
        .is_err());
        assert!(parse(
            ShaderMode::Spatial,
            "shader_type spatial;\nfloat sin(float x) { return x; }",
        )
        .is_err());
    }

    #[test]
    fn test_syntax_error_line() {
        let err = parse(
            ShaderMode::Spatial,
            "shader_type spatial;\n\nvoid fragment() {\n\tALBEDO = ;\n}",
        )
        .unwrap_err();
        assert_eq!(err.line, 4);
    }

    #[test]
    fn test_float_overflow_rejected() {
        let err = parse(
            ShaderMode::Spatial,
            "shader_type spatial;\nvoid fragment() {\n\tALPHA = 1e50;\n}",
        )
        .unwrap_err();
        assert_eq!(err.line, 3);
        assert!(err.text.contains("1e50"), "{}", err.text);

        assert!(parse(
            ShaderMode::Spatial,
            "shader_type spatial;\nuniform float u : hint_range(0, 1e50);",
        )
        .is_err());
    }
}
