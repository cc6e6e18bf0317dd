//! GLSL emission for a parsed shader
//!
//! [`NodeEmitter`] walks the tree once. Expressions and statements come
//! back as strings; declarations at shader scope are appended straight
//! into the sections of [`GeneratedCode`].

use crate::actions::ActionsAdapter;
use crate::context::{EmissionContext, FRAGMENT_NAME, LIGHT_NAME, TIME_NAME, VERTEX_NAME};
use crate::defaults::DefaultIdentifierActions;
use crate::deps::{emit_function_deps, struct_type_name};
use crate::output::GeneratedCode;
use glint_core::{
    align_to, constant_text, mangle, round_up_16, DataType, Operator, Precision, Result,
    ShaderError,
};
use glint_lang::{
    ArrayDeclarationNode, ArrayNode, BlockNode, ConstantNode, ControlFlowNode, FlowOperation,
    MemberNode, Node, OperatorNode, ShaderHint, ShaderNode, VariableDeclarationNode, VaryingStage,
};
use std::collections::{HashMap, HashSet};

const USE_MATERIAL_DEFINE: &str = "#define USE_MATERIAL\n";

fn tab(level: usize) -> String {
    "\t".repeat(level)
}

fn type_text(datatype: DataType, struct_name: Option<&str>, owner: &str) -> Result<String> {
    if datatype == DataType::Struct {
        struct_type_name(struct_name, owner)
    } else {
        Ok(datatype.name().to_string())
    }
}

/// Precision and type, or the mangled struct name for struct types
fn declared_type(
    precision: Precision,
    datatype: DataType,
    struct_name: Option<&str>,
    owner: &str,
) -> Result<String> {
    if datatype == DataType::Struct {
        struct_type_name(struct_name, owner)
    } else {
        Ok(format!("{}{}", precision.keyword(), datatype.name()))
    }
}

fn array_suffix(size: u32) -> String {
    if size > 0 {
        format!("[{}]", size)
    } else {
        String::new()
    }
}

fn argument<'n>(node: &'n OperatorNode, index: usize) -> Result<&'n Node> {
    node.arguments.get(index).ok_or_else(|| {
        ShaderError::BadNodeShape(format!(
            "operator '{}' is missing operand {}",
            node.op.text(),
            index
        ))
    })
}

fn expression<'n>(node: &'n ControlFlowNode, index: usize) -> Result<&'n Node> {
    node.expressions.get(index).ok_or_else(|| {
        ShaderError::BadNodeShape(format!("{:?} is missing expression {}", node.flow_op, index))
    })
}

fn block<'n>(node: &'n ControlFlowNode, index: usize) -> Result<&'n BlockNode> {
    node.blocks.get(index).ok_or_else(|| {
        ShaderError::BadNodeShape(format!("{:?} is missing block {}", node.flow_op, index))
    })
}

/// Emitter for one compile. Owns the output and the emission context;
/// the tree, the tables and the actions are borrowed for its lifetime.
pub struct NodeEmitter<'a> {
    shader: &'a ShaderNode,
    defaults: &'a DefaultIdentifierActions,
    internal_functions: &'a HashSet<String>,
    actions: &'a mut dyn ActionsAdapter,
    ctx: EmissionContext,
    code: GeneratedCode,
}

impl<'a> NodeEmitter<'a> {
    pub fn new(
        shader: &'a ShaderNode,
        defaults: &'a DefaultIdentifierActions,
        internal_functions: &'a HashSet<String>,
        actions: &'a mut dyn ActionsAdapter,
    ) -> Self {
        Self {
            shader,
            defaults,
            internal_functions,
            actions,
            ctx: EmissionContext::new(),
            code: GeneratedCode::default(),
        }
    }

    pub fn finish(self) -> GeneratedCode {
        self.code
    }

    fn push_define(&mut self, define: &str) {
        if !self.code.defines.iter().any(|d| d == define) {
            self.code.defines.push(define.to_string());
        }
    }

    /// Emit the shader root at `level`; function bodies go one level deeper
    pub fn emit_shader(&mut self, level: usize) -> Result<()> {
        let shader = self.shader;
        let defaults = self.defaults;

        for render_mode in &shader.render_modes {
            if let Some(define) = defaults.render_mode_defines.get(render_mode) {
                if self.ctx.used_rmode_defines.insert(render_mode.clone()) {
                    self.push_define(define);
                }
            }
            self.actions.on_render_mode(render_mode);
        }

        self.emit_structs()?;
        self.emit_uniforms()?;
        self.emit_varyings();
        self.emit_constants(level)?;
        self.emit_functions(level)
    }

    fn emit_structs(&mut self) -> Result<()> {
        for st in &self.shader.structs {
            let mut code = format!("struct {} {{\n", mangle(&st.name));
            for member in &st.shader_struct.members {
                code.push_str(&declared_type(
                    member.precision,
                    member.datatype,
                    member.struct_name.as_deref(),
                    &member.name,
                )?);
                code.push(' ');
                code.push_str(&member.name);
                code.push_str(&array_suffix(member.array_size));
                code.push_str(";\n");
            }
            code.push_str("};\n");

            self.code.vertex_global.push_str(&code);
            self.code.fragment_global.push_str(&code);
        }
        Ok(())
    }

    fn emit_uniforms(&mut self) -> Result<()> {
        let shader = self.shader;
        let texture_count = shader.uniforms.values().filter(|u| u.is_sampler()).count();
        let uniform_count = shader.uniforms.len() - texture_count;

        let mut textures: Vec<Option<(String, ShaderHint, DataType)>> = vec![None; texture_count];
        let mut slots: Vec<Option<(String, DataType)>> = vec![None; uniform_count];

        for (name, uniform) in &shader.uniforms {
            let id = mangle(name);
            let decl = format!(
                "{}{} {};\n",
                uniform.precision.keyword(),
                uniform.datatype.name(),
                id
            );

            if uniform.is_sampler() {
                let decl = format!("uniform {}", decl);
                self.code.vertex_global.push_str(&decl);
                self.code.fragment_global.push_str(&decl);

                let slot = textures.get_mut(uniform.texture_order).ok_or_else(|| {
                    ShaderError::BadNodeShape(format!(
                        "texture order {} of '{}' is out of range",
                        uniform.texture_order, name
                    ))
                })?;
                if slot.is_some() {
                    return Err(ShaderError::BadNodeShape(format!(
                        "texture order {} is used twice",
                        uniform.texture_order
                    )));
                }
                *slot = Some((id, uniform.hint, uniform.datatype));
            } else {
                self.push_define(USE_MATERIAL_DEFINE);

                let slot = slots.get_mut(uniform.order).ok_or_else(|| {
                    ShaderError::BadNodeShape(format!(
                        "uniform order {} of '{}' is out of range",
                        uniform.order, name
                    ))
                })?;
                if slot.is_some() {
                    return Err(ShaderError::BadNodeShape(format!(
                        "uniform order {} is used twice",
                        uniform.order
                    )));
                }
                *slot = Some((decl, uniform.datatype));
            }

            self.actions.on_uniform_seen(name, uniform);
        }

        // every slot is filled: counts match and orders are unique and in range
        for (id, hint, datatype) in textures.into_iter().flatten() {
            self.code.texture_uniforms.push(id);
            self.code.texture_hints.push(hint);
            self.code.texture_types.push(datatype);
        }

        let mut offset = 0;
        for (decl, datatype) in slots.into_iter().flatten() {
            self.code.uniforms.push_str(&decl);
            offset = align_to(offset, datatype.alignment());
            self.code.uniform_offsets.push(offset);
            offset += datatype.size();
        }
        self.code.uniform_total_size = round_up_16(offset);

        Ok(())
    }

    fn emit_varyings(&mut self) {
        let mut frag_to_light = String::new();

        for (name, varying) in &self.shader.varyings {
            let id = mangle(name);
            let decl = format!(
                "{}{} {}{};\n",
                varying.precision.keyword(),
                varying.datatype.name(),
                id,
                array_suffix(varying.array_size)
            );

            match varying.stage {
                VaryingStage::Fragment | VaryingStage::FragmentToLight => {
                    self.ctx.fragment_varyings.insert(name.clone());
                    frag_to_light.push('\t');
                    frag_to_light.push_str(&decl);
                }
                VaryingStage::VertexToFragment => {
                    let interp = varying.interpolation.keyword();
                    self.code.vertex_global.push_str(&format!("{}out {}", interp, decl));
                    self.code.fragment_global.push_str(&format!("{}in {}", interp, decl));
                }
            }
        }

        if !frag_to_light.is_empty() {
            self.code.fragment_global.push_str("\n\nstruct {\n");
            self.code.fragment_global.push_str(&frag_to_light);
            self.code.fragment_global.push_str("} frag_to_light;\n");
        }
    }

    fn emit_constants(&mut self, level: usize) -> Result<()> {
        let shader = self.shader;
        for constant in &shader.constants {
            let ty = declared_type(
                constant.precision,
                constant.datatype,
                constant.type_name.as_deref(),
                &constant.name,
            )?;
            let init = self.emit(&constant.initializer, level, false, true)?;
            let code = format!(
                "const {} {}{} = {};\n",
                ty,
                mangle(&constant.name),
                array_suffix(constant.array_size),
                init
            );
            self.code.vertex_global.push_str(&code);
            self.code.fragment_global.push_str(&code);
        }
        Ok(())
    }

    fn emit_functions(&mut self, level: usize) -> Result<()> {
        let shader = self.shader;
        let mut function_code = HashMap::new();

        for f in &shader.functions {
            self.ctx.current_function = Some(f.name.clone());
            let body = self.emit_block(&f.function.body, level + 1)?;
            function_code.insert(f.name.clone(), body);
        }
        self.ctx.current_function = None;

        let mut added_vertex = HashSet::new();
        // fragment and light share one section
        let mut added_fragment = HashSet::new();

        for f in &shader.functions {
            let name = f.name.as_str();
            let Some(body) = function_code.get(name) else {
                continue;
            };
            if name == VERTEX_NAME {
                emit_function_deps(
                    shader,
                    name,
                    &function_code,
                    &mut self.code.vertex_global,
                    &mut added_vertex,
                )?;
                self.code.vertex = body.clone();
            } else if name == FRAGMENT_NAME || name == LIGHT_NAME {
                emit_function_deps(
                    shader,
                    name,
                    &function_code,
                    &mut self.code.fragment_global,
                    &mut added_fragment,
                )?;
                if name == FRAGMENT_NAME {
                    self.code.fragment = body.clone();
                } else {
                    self.code.light = body.clone();
                }
            }
        }
        Ok(())
    }

    fn emit_block(&mut self, block: &BlockNode, level: usize) -> Result<String> {
        let mut code = String::new();
        if block.single_statement {
            for statement in &block.statements {
                code.push_str(&self.emit_statement(statement, level)?);
            }
            return Ok(code);
        }

        code.push_str(&tab(level.saturating_sub(1)));
        code.push_str("{\n");
        for statement in &block.statements {
            code.push_str(&self.emit_statement(statement, level)?);
        }
        code.push_str(&tab(level.saturating_sub(1)));
        code.push_str("}\n");
        Ok(code)
    }

    /// A statement as complete lines
    fn emit_statement(&mut self, statement: &Node, level: usize) -> Result<String> {
        match statement {
            Node::ControlFlow(_) => self.emit(statement, level, false, true),
            Node::Block(inner) => self.emit_block(inner, level + 1),
            _ => Ok(format!(
                "{}{};\n",
                tab(level),
                self.emit(statement, level, false, true)?
            )),
        }
    }

    /// Emit a statement or expression node.
    ///
    /// `assigning` marks the left side of an assignment; `use_scope`
    /// wraps binary operators in parentheses.
    pub fn emit(
        &mut self,
        node: &Node,
        level: usize,
        assigning: bool,
        use_scope: bool,
    ) -> Result<String> {
        match node {
            Node::Block(b) => self.emit_block(b, level),
            Node::VariableDeclaration(decl) => self.emit_variable_declaration(decl, level),
            Node::Variable(var) => Ok(self.identifier(&var.name, var.is_local, assigning, false)),
            Node::ArrayDeclaration(decl) => self.emit_array_declaration(decl, level),
            Node::Array(array) => self.emit_array(array, level, assigning),
            Node::ArrayConstruct(construct) => {
                let ty = type_text(
                    construct.datatype,
                    construct.struct_name.as_deref(),
                    "array constructor",
                )?;
                let elements = self.emit_list(&construct.initializer, level, ", ")?;
                Ok(format!("{}[{}]({})", ty, construct.initializer.len(), elements))
            }
            Node::Constant(constant) => self.emit_constant(constant, level),
            Node::Operator(op) => self.emit_operator(op, level, assigning, use_scope),
            Node::ControlFlow(flow) => self.emit_control_flow(flow, level),
            Node::Member(member) => self.emit_member(member, level, assigning),
        }
    }

    fn emit_list(&mut self, nodes: &[Node], level: usize, separator: &str) -> Result<String> {
        let mut parts = Vec::with_capacity(nodes.len());
        for node in nodes {
            parts.push(self.emit(node, level, false, true)?);
        }
        Ok(parts.join(separator))
    }

    /// Reference to a named value; handles varying routing, defines,
    /// usage and write reporting, and renames
    fn identifier(&mut self, name: &str, is_local: bool, assigning: bool, force_varying: bool) -> String {
        let use_fragment_varying = !is_local
            && !self.ctx.in_vertex()
            && (force_varying
                || (assigning && self.shader.varyings.contains_key(name))
                || (!assigning && self.ctx.fragment_varyings.contains(name)));

        if assigning {
            self.actions.on_write_flag(name);
        }

        if !self.ctx.used_name_defines.contains(name) {
            let defaults = self.defaults;
            if let Some(define) = defaults.usage_define(name) {
                self.push_define(define);
                self.ctx.used_name_defines.insert(name.to_string());
            }
        }

        if self.ctx.used_flag_pointers.insert(name.to_string()) {
            self.actions.on_usage_flag(name);
        }

        // Only entry point bodies count; helper bodies are emitted before
        // their calling stage is known and set neither flag.
        if name == TIME_NAME {
            if self.ctx.in_vertex() {
                self.code.uses_vertex_time = true;
            }
            if self.ctx.in_fragment_stage() {
                self.code.uses_fragment_time = true;
            }
        }

        if let Some(renamed) = self.defaults.renames.get(name) {
            renamed.clone()
        } else if use_fragment_varying {
            format!("frag_to_light.{}", mangle(name))
        } else {
            mangle(name)
        }
    }

    fn emit_variable_declaration(
        &mut self,
        decl: &VariableDeclarationNode,
        level: usize,
    ) -> Result<String> {
        let mut code = String::new();
        if decl.is_const {
            code.push_str("const ");
        }
        code.push_str(&declared_type(
            decl.precision,
            decl.datatype,
            decl.struct_name.as_deref(),
            "variable declaration",
        )?);
        code.push(' ');

        let mut items = Vec::with_capacity(decl.declarations.len());
        for d in &decl.declarations {
            let mut item = mangle(&d.name);
            if let Some(init) = &d.initializer {
                item.push_str(" = ");
                item.push_str(&self.emit(init, level, false, true)?);
            }
            items.push(item);
        }
        code.push_str(&items.join(", "));
        Ok(code)
    }

    fn emit_array_declaration(
        &mut self,
        decl: &ArrayDeclarationNode,
        level: usize,
    ) -> Result<String> {
        let mut code = String::new();
        if decl.is_const {
            code.push_str("const ");
        }
        code.push_str(&declared_type(
            decl.precision,
            decl.datatype,
            decl.struct_name.as_deref(),
            "array declaration",
        )?);
        code.push(' ');

        let element_type = type_text(decl.datatype, decl.struct_name.as_deref(), "array declaration")?;
        let mut items = Vec::with_capacity(decl.declarations.len());
        for d in &decl.declarations {
            let mut item = format!("{}[{}]", mangle(&d.name), d.size);
            if !d.initializer.is_empty() {
                let elements = self.emit_list(&d.initializer, level, ", ")?;
                item.push_str(&format!(
                    " = {}[{}]({})",
                    element_type,
                    d.initializer.len(),
                    elements
                ));
            }
            items.push(item);
        }
        code.push_str(&items.join(", "));
        Ok(code)
    }

    fn emit_array(&mut self, array: &ArrayNode, level: usize, assigning: bool) -> Result<String> {
        let mut code = self.identifier(
            &array.name,
            array.is_local,
            assigning,
            array.assign_expression.is_some(),
        );

        if let Some(call) = &array.call_expression {
            code.push('.');
            code.push_str(&self.emit(call, level, false, false)?);
        } else if let Some(index) = &array.index_expression {
            code.push('[');
            code.push_str(&self.emit(index, level, false, true)?);
            code.push(']');
        } else if let Some(value) = &array.assign_expression {
            code.push_str(" = ");
            code.push_str(&self.emit(value, level, false, false)?);
        }
        Ok(code)
    }

    fn emit_constant(&mut self, constant: &ConstantNode, level: usize) -> Result<String> {
        if constant.array_size == 0 {
            return constant_text(constant.datatype, &constant.values);
        }

        let ty = type_text(constant.datatype, constant.struct_name.as_deref(), "array constant")?;
        let elements = self.emit_list(&constant.array_elements, level, ",")?;
        Ok(format!("{}[{}]({})", ty, constant.array_size, elements))
    }

    fn emit_operator(
        &mut self,
        node: &OperatorNode,
        level: usize,
        assigning: bool,
        use_scope: bool,
    ) -> Result<String> {
        let op = node.op;
        if op.is_assignment() {
            let lhs = self.emit(argument(node, 0)?, level, true, true)?;
            let rhs = self.emit(argument(node, 1)?, level, assigning, true)?;
            return Ok(format!("{} {} {}", lhs, op.text(), rhs));
        }

        match op {
            Operator::BitInvert
            | Operator::Negate
            | Operator::Not
            | Operator::Increment
            | Operator::Decrement => {
                let operand = self.emit(argument(node, 0)?, level, assigning, true)?;
                Ok(format!("{}{}", op.text(), operand))
            }
            Operator::PostIncrement | Operator::PostDecrement => {
                let operand = self.emit(argument(node, 0)?, level, assigning, true)?;
                Ok(format!("{}{}", operand, op.text()))
            }
            Operator::Call | Operator::Struct | Operator::Construct => {
                let Node::Variable(callee) = argument(node, 0)? else {
                    return Err(ShaderError::BadNodeShape(format!(
                        "'{}' operator must start with the callee name",
                        op.text()
                    )));
                };

                let name = match op {
                    Operator::Struct => mangle(&callee.name),
                    Operator::Construct => callee.name.clone(),
                    _ => {
                        if self.internal_functions.contains(&callee.name) {
                            callee.name.clone()
                        } else if let Some(renamed) = self.defaults.renames.get(&callee.name) {
                            renamed.clone()
                        } else {
                            mangle(&callee.name)
                        }
                    }
                };

                let mut args = Vec::with_capacity(node.arguments.len().saturating_sub(1));
                for arg in &node.arguments[1..] {
                    args.push(self.emit(arg, level, assigning, true)?);
                }
                Ok(format!("{}({})", name, args.join(", ")))
            }
            Operator::Index => {
                let base = self.emit(argument(node, 0)?, level, assigning, true)?;
                let index = self.emit(argument(node, 1)?, level, assigning, true)?;
                Ok(format!("{}[{}]", base, index))
            }
            Operator::SelectIf => {
                let condition = self.emit(argument(node, 0)?, level, assigning, true)?;
                let then_expr = self.emit(argument(node, 1)?, level, assigning, true)?;
                let else_expr = self.emit(argument(node, 2)?, level, assigning, true)?;
                Ok(format!("({} ? {} : {})", condition, then_expr, else_expr))
            }
            _ => {
                let lhs = self.emit(argument(node, 0)?, level, assigning, true)?;
                let rhs = self.emit(argument(node, 1)?, level, assigning, true)?;
                if use_scope {
                    Ok(format!("({} {} {})", lhs, op.text(), rhs))
                } else {
                    Ok(format!("{} {} {}", lhs, op.text(), rhs))
                }
            }
        }
    }

    fn emit_control_flow(&mut self, node: &ControlFlowNode, level: usize) -> Result<String> {
        let indent = tab(level);
        let code = match node.flow_op {
            FlowOperation::If => {
                let condition = self.emit(expression(node, 0)?, level, false, true)?;
                let mut code = format!("{}if ({})\n", indent, condition);
                code.push_str(&self.emit_block(block(node, 0)?, level + 1)?);
                if let Some(otherwise) = node.blocks.get(1) {
                    code.push_str(&indent);
                    code.push_str("else\n");
                    code.push_str(&self.emit_block(otherwise, level + 1)?);
                }
                code
            }
            FlowOperation::Switch => {
                let value = self.emit(expression(node, 0)?, level, false, true)?;
                let mut code = format!("{}switch ({})\n", indent, value);
                code.push_str(&self.emit_block(block(node, 0)?, level + 1)?);
                code
            }
            FlowOperation::Case => {
                let label = self.emit(expression(node, 0)?, level, false, true)?;
                let mut code = format!("{}case {}:\n", indent, label);
                code.push_str(&self.emit_block(block(node, 0)?, level + 1)?);
                code
            }
            FlowOperation::Default => {
                let mut code = format!("{}default:\n", indent);
                code.push_str(&self.emit_block(block(node, 0)?, level + 1)?);
                code
            }
            FlowOperation::Do => {
                let mut code = format!("{}do\n", indent);
                code.push_str(&self.emit_block(block(node, 0)?, level + 1)?);
                let condition = self.emit(expression(node, 0)?, level, false, true)?;
                code.push_str(&format!("{}while ({});\n", indent, condition));
                code
            }
            FlowOperation::While => {
                let condition = self.emit(expression(node, 0)?, level, false, true)?;
                let mut code = format!("{}while ({})\n", indent, condition);
                code.push_str(&self.emit_block(block(node, 0)?, level + 1)?);
                code
            }
            FlowOperation::For => {
                let init_block = block(node, 0)?;
                let init = match init_block.statements.first() {
                    Some(statement) => self.emit(statement, level, false, true)?,
                    None => String::new(),
                };
                let condition = self.emit(expression(node, 0)?, level, false, true)?;
                let step = self.emit(expression(node, 1)?, level, false, true)?;
                let mut code = format!("{}for ({}; {}; {})\n", indent, init, condition, step);
                code.push_str(&self.emit_block(block(node, 1)?, level + 1)?);
                code
            }
            FlowOperation::Return => match node.expressions.first() {
                Some(value) => {
                    let value = self.emit(value, level, false, true)?;
                    format!("{}return {};\n", indent, value)
                }
                None => format!("{}return;\n", indent),
            },
            FlowOperation::Discard => {
                if self.ctx.used_flag_pointers.insert("DISCARD".to_string()) {
                    self.actions.on_usage_flag("DISCARD");
                }
                format!("{}discard;\n", indent)
            }
            FlowOperation::Continue => format!("{}continue;\n", indent),
            FlowOperation::Break => format!("{}break;\n", indent),
        };
        Ok(code)
    }

    fn emit_member(&mut self, member: &MemberNode, level: usize, assigning: bool) -> Result<String> {
        let owner = self.emit(&member.owner, level, assigning, true)?;
        let mut code = format!("{}.{}", owner, member.name);
        if let Some(index) = &member.index_expression {
            code.push('[');
            code.push_str(&self.emit(index, level, false, true)?);
            code.push(']');
        } else if let Some(value) = &member.assign_expression {
            code.push_str(" = ");
            code.push_str(&self.emit(value, level, false, false)?);
        }
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{IdentifierActions, NoActions};
    use crate::config::CompilerConfig;
    use glint_core::{ConstantValue, Interpolation, ShaderMode};
    use glint_lang::{Declaration, Uniform, Varying, BUILTIN_FUNCTIONS};

    fn spatial() -> DefaultIdentifierActions {
        DefaultIdentifierActions::for_mode(ShaderMode::Spatial, &CompilerConfig::default())
    }

    fn internal() -> HashSet<String> {
        BUILTIN_FUNCTIONS.iter().map(|s| s.to_string()).collect()
    }

    fn varying(stage: VaryingStage) -> Varying {
        Varying {
            datatype: DataType::Vec3,
            precision: Precision::Default,
            interpolation: Interpolation::Smooth,
            array_size: 0,
            stage,
        }
    }

    fn uniform(datatype: DataType, order: usize, texture_order: usize) -> Uniform {
        Uniform {
            datatype,
            precision: Precision::Default,
            order,
            texture_order,
            hint: ShaderHint::None,
            default_value: vec![],
        }
    }

    #[test]
    fn test_binary_operator_scope() {
        let shader = ShaderNode::default();
        let defaults = spatial();
        let internal = internal();
        let mut actions = NoActions;
        let mut emitter = NodeEmitter::new(&shader, &defaults, &internal, &mut actions);

        let sum = Node::op(
            Operator::Add,
            vec![
                Node::local("a"),
                Node::op(Operator::Mul, vec![Node::local("b"), Node::float(2.0)]),
            ],
        );
        assert_eq!(emitter.emit(&sum, 1, false, true).unwrap(), "(m_a + (m_b * 2.0))");
        assert_eq!(emitter.emit(&sum, 1, false, false).unwrap(), "m_a + (m_b * 2.0)");

        let select = Node::op(
            Operator::SelectIf,
            vec![Node::local("c"), Node::int(1), Node::int(2)],
        );
        assert_eq!(emitter.emit(&select, 1, false, false).unwrap(), "(m_c ? 1 : 2)");

        let assign = Node::op(Operator::AssignAdd, vec![Node::local("x"), Node::local("y")]);
        assert_eq!(emitter.emit(&assign, 1, false, true).unwrap(), "m_x += m_y");

        let neg = Node::op(Operator::Negate, vec![Node::local("x")]);
        assert_eq!(emitter.emit(&neg, 1, false, true).unwrap(), "-m_x");
        let post = Node::op(Operator::PostIncrement, vec![Node::local("i")]);
        assert_eq!(emitter.emit(&post, 1, false, true).unwrap(), "m_i++");
    }

    #[test]
    fn test_infinite_constant_fails() {
        let shader = ShaderNode::default();
        let defaults = spatial();
        let internal = internal();
        let mut actions = NoActions;
        let mut emitter = NodeEmitter::new(&shader, &defaults, &internal, &mut actions);

        let assign = Node::assign(Node::variable("ALPHA"), Node::float(f32::INFINITY));
        assert!(matches!(
            emitter.emit(&assign, 1, false, false),
            Err(ShaderError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_call_name_resolution() {
        let shader = ShaderNode::default();
        let defaults = spatial();
        let internal = internal();
        let mut actions = NoActions;
        let mut emitter = NodeEmitter::new(&shader, &defaults, &internal, &mut actions);

        let builtin = Node::call("sin", vec![Node::local("x")]);
        assert_eq!(emitter.emit(&builtin, 1, false, true).unwrap(), "sin(m_x)");

        let user = Node::call("wobble", vec![Node::local("x"), Node::float(0.5)]);
        assert_eq!(emitter.emit(&user, 1, false, true).unwrap(), "m_wobble(m_x, 0.5)");

        let construct = Node::op(
            Operator::Construct,
            vec![Node::variable("vec2"), Node::local("x"), Node::local("y")],
        );
        assert_eq!(emitter.emit(&construct, 1, false, true).unwrap(), "vec2(m_x, m_y)");

        let st = Node::op(Operator::Struct, vec![Node::variable("Light"), Node::float(1.0)]);
        assert_eq!(emitter.emit(&st, 1, false, true).unwrap(), "m_Light(1.0)");
    }

    #[test]
    fn test_call_without_callee_is_bad_shape() {
        let shader = ShaderNode::default();
        let defaults = spatial();
        let internal = internal();
        let mut actions = NoActions;
        let mut emitter = NodeEmitter::new(&shader, &defaults, &internal, &mut actions);

        let bad = Node::op(Operator::Call, vec![Node::float(1.0)]);
        let err = emitter.emit(&bad, 1, false, true).unwrap_err();
        assert!(matches!(err, ShaderError::BadNodeShape(_)));

        let empty = Node::op(Operator::Add, vec![Node::float(1.0)]);
        assert!(matches!(
            emitter.emit(&empty, 1, false, true),
            Err(ShaderError::BadNodeShape(_))
        ));
    }

    #[test]
    fn test_renames_and_usage_defines() {
        let shader = ShaderNode::default();
        let defaults = spatial();
        let internal = internal();
        let mut actions = IdentifierActions::new()
            .with_usage_flag("BINORMAL")
            .with_write_flag("ALBEDO");
        {
            let mut emitter = NodeEmitter::new(&shader, &defaults, &internal, &mut actions);
            emitter.ctx.current_function = Some(FRAGMENT_NAME.to_string());

            let stmt = Node::assign(Node::variable("ALBEDO"), Node::variable("BINORMAL"));
            assert_eq!(emitter.emit(&stmt, 1, false, true).unwrap(), "albedo = binormal");
            emitter.emit(&Node::variable("TANGENT"), 1, false, true).unwrap();

            let code = emitter.finish();
            assert_eq!(code.defines, vec!["#define ENABLE_TANGENT_INTERP\n".to_string()]);
        }
        assert!(actions.used("BINORMAL"));
        assert!(actions.written("ALBEDO"));
    }

    #[test]
    fn test_time_flags_follow_current_function() {
        let shader = ShaderNode::default();
        let defaults = spatial();
        let internal = internal();
        let mut actions = NoActions;
        let mut emitter = NodeEmitter::new(&shader, &defaults, &internal, &mut actions);

        emitter.ctx.current_function = Some("helper".to_string());
        assert_eq!(emitter.emit(&Node::variable("TIME"), 1, false, true).unwrap(), "time");
        assert!(!emitter.code.uses_vertex_time && !emitter.code.uses_fragment_time);

        emitter.ctx.current_function = Some(LIGHT_NAME.to_string());
        emitter.emit(&Node::variable("TIME"), 1, false, true).unwrap();
        assert!(emitter.code.uses_fragment_time);
        assert!(!emitter.code.uses_vertex_time);
    }

    #[test]
    fn test_array_assignment_forces_frag_to_light() {
        let mut shader = ShaderNode::default();
        shader
            .varyings
            .insert("trail".to_string(), varying(VaryingStage::VertexToFragment));
        let defaults = spatial();
        let internal = internal();
        let mut actions = NoActions;
        let mut emitter = NodeEmitter::new(&shader, &defaults, &internal, &mut actions);
        emitter.ctx.current_function = Some(FRAGMENT_NAME.to_string());

        let mut array = ArrayNode::new("trail", false);
        array.assign_expression = Some(Box::new(Node::float(1.0)));
        assert_eq!(
            emitter.emit(&Node::Array(array.clone()), 1, false, true).unwrap(),
            "frag_to_light.m_trail = 1.0"
        );

        emitter.ctx.current_function = Some(VERTEX_NAME.to_string());
        assert_eq!(
            emitter.emit(&Node::Array(array), 1, false, true).unwrap(),
            "m_trail = 1.0"
        );

        let mut indexed = ArrayNode::new("weights", true);
        indexed.index_expression = Some(Box::new(Node::int(2)));
        assert_eq!(
            emitter.emit(&Node::Array(indexed), 1, false, true).unwrap(),
            "m_weights[2]"
        );

        let mut length = ArrayNode::new("weights", true);
        length.call_expression = Some(Box::new(Node::op(
            Operator::Construct,
            vec![Node::variable("length")],
        )));
        assert_eq!(
            emitter.emit(&Node::Array(length), 1, false, true).unwrap(),
            "m_weights.length()"
        );
    }

    #[test]
    fn test_declarations_and_constants() {
        let shader = ShaderNode::default();
        let defaults = spatial();
        let internal = internal();
        let mut actions = NoActions;
        let mut emitter = NodeEmitter::new(&shader, &defaults, &internal, &mut actions);

        let decl = Node::VariableDeclaration(VariableDeclarationNode {
            is_const: true,
            precision: Precision::Highp,
            datatype: DataType::Float,
            struct_name: None,
            declarations: vec![
                Declaration {
                    name: "a".to_string(),
                    initializer: Some(Box::new(Node::float(1.0))),
                },
                Declaration {
                    name: "b".to_string(),
                    initializer: None,
                },
            ],
        });
        assert_eq!(
            emitter.emit(&decl, 1, false, true).unwrap(),
            "const highp float m_a = 1.0, m_b"
        );

        let array_decl = Node::ArrayDeclaration(ArrayDeclarationNode {
            is_const: false,
            precision: Precision::Default,
            datatype: DataType::Int,
            struct_name: None,
            declarations: vec![glint_lang::ArrayDeclaration {
                name: "ids".to_string(),
                size: 2,
                initializer: vec![Node::int(3), Node::int(4)],
            }],
        });
        assert_eq!(
            emitter.emit(&array_decl, 1, false, true).unwrap(),
            "int m_ids[2] = int[2](3, 4)"
        );

        let vector = Node::constant(
            DataType::Vec2,
            vec![ConstantValue::Float(1.0), ConstantValue::Float(0.5)],
        );
        assert_eq!(emitter.emit(&vector, 1, false, true).unwrap(), "vec2(1.0,0.5)");

        let array_constant = Node::Constant(ConstantNode {
            datatype: DataType::Float,
            struct_name: None,
            values: vec![],
            array_size: 2,
            array_elements: vec![Node::float(1.0), Node::float(2.0)],
        });
        assert_eq!(
            emitter.emit(&array_constant, 1, false, true).unwrap(),
            "float[2](1.0,2.0)"
        );
    }

    #[test]
    fn test_control_flow_layout() {
        let shader = ShaderNode::default();
        let defaults = spatial();
        let internal = internal();
        let mut actions = IdentifierActions::new().with_usage_flag("DISCARD");
        {
            let mut emitter = NodeEmitter::new(&shader, &defaults, &internal, &mut actions);

            let if_node = Node::flow(
                FlowOperation::If,
                vec![Node::local("c")],
                vec![
                    BlockNode::single(Node::flow(FlowOperation::Discard, vec![], vec![])),
                    BlockNode::new(vec![Node::assign(Node::local("x"), Node::int(1))]),
                ],
            );
            let body = BlockNode::new(vec![if_node]);
            assert_eq!(
                emitter.emit_block(&body, 2).unwrap(),
                "\t{\n\t\tif (m_c)\n\t\t\tdiscard;\n\t\telse\n\t\t{\n\t\t\tm_x = 1;\n\t\t}\n\t}\n"
            );

            let for_node = Node::flow(
                FlowOperation::For,
                vec![
                    Node::op(Operator::Less, vec![Node::local("i"), Node::int(4)]),
                    Node::op(Operator::PostIncrement, vec![Node::local("i")]),
                ],
                vec![
                    BlockNode::single(Node::VariableDeclaration(VariableDeclarationNode {
                        is_const: false,
                        precision: Precision::Default,
                        datatype: DataType::Int,
                        struct_name: None,
                        declarations: vec![Declaration {
                            name: "i".to_string(),
                            initializer: Some(Box::new(Node::int(0))),
                        }],
                    })),
                    BlockNode::single(Node::flow(FlowOperation::Break, vec![], vec![])),
                ],
            );
            assert_eq!(
                emitter.emit(&for_node, 1, false, true).unwrap(),
                "\tfor (int m_i = 0; (m_i < 4); m_i++)\n\t\tbreak;\n"
            );

            let do_node = Node::flow(
                FlowOperation::Do,
                vec![Node::local("c")],
                vec![BlockNode::new(vec![])],
            );
            assert_eq!(
                emitter.emit(&do_node, 1, false, true).unwrap(),
                "\tdo\n\t{\n\t}\n\twhile (m_c);\n"
            );

            let switch = Node::flow(
                FlowOperation::Switch,
                vec![Node::local("k")],
                vec![BlockNode::new(vec![
                    Node::flow(
                        FlowOperation::Case,
                        vec![Node::int(1)],
                        vec![BlockNode::new(vec![Node::flow(FlowOperation::Break, vec![], vec![])])],
                    ),
                    Node::flow(FlowOperation::Default, vec![], vec![BlockNode::new(vec![])]),
                ])],
            );
            assert_eq!(
                emitter.emit(&switch, 1, false, true).unwrap(),
                "\tswitch (m_k)\n\t{\n\t\tcase 1:\n\t\t{\n\t\t\tbreak;\n\t\t}\n\t\tdefault:\n\t\t{\n\t\t}\n\t}\n"
            );

            let ret = Node::flow(FlowOperation::Return, vec![Node::local("x")], vec![]);
            assert_eq!(emitter.emit(&ret, 2, false, true).unwrap(), "\t\treturn m_x;\n");
        }
        assert!(actions.used("DISCARD"));
    }

    #[test]
    fn test_member_access() {
        let shader = ShaderNode::default();
        let defaults = spatial();
        let internal = internal();
        let mut actions = NoActions;
        let mut emitter = NodeEmitter::new(&shader, &defaults, &internal, &mut actions);

        let member = Node::Member(MemberNode {
            owner: Box::new(Node::local("light")),
            name: "color".to_string(),
            index_expression: None,
            assign_expression: None,
        });
        assert_eq!(emitter.emit(&member, 1, false, true).unwrap(), "m_light.color");

        let swizzle = Node::Member(MemberNode {
            owner: Box::new(Node::variable("ALBEDO")),
            name: "rg".to_string(),
            index_expression: None,
            assign_expression: Some(Box::new(Node::local("v"))),
        });
        assert_eq!(emitter.emit(&swizzle, 1, false, true).unwrap(), "albedo.rg = m_v");
    }

    #[test]
    fn test_uniform_layout_and_textures() {
        let mut shader = ShaderNode::default();
        shader.uniforms.insert("a".to_string(), uniform(DataType::Float, 0, 0));
        shader.uniforms.insert("b".to_string(), uniform(DataType::Vec3, 1, 0));
        shader.uniforms.insert("z_tex".to_string(), uniform(DataType::Sampler2D, 0, 1));
        shader.uniforms.insert("y_tex".to_string(), uniform(DataType::SamplerCube, 0, 0));
        let defaults = spatial();
        let internal = internal();
        let mut actions = IdentifierActions::new();
        let code = {
            let mut emitter = NodeEmitter::new(&shader, &defaults, &internal, &mut actions);
            emitter.emit_shader(1).unwrap();
            emitter.finish()
        };

        assert_eq!(code.uniforms, "float m_a;\nvec3 m_b;\n");
        assert_eq!(code.uniform_offsets, vec![0, 16]);
        assert_eq!(code.uniform_total_size, 32);
        assert_eq!(code.defines, vec![USE_MATERIAL_DEFINE.to_string()]);
        assert_eq!(code.texture_uniforms, vec!["m_y_tex".to_string(), "m_z_tex".to_string()]);
        assert_eq!(code.texture_types, vec![DataType::SamplerCube, DataType::Sampler2D]);
        assert!(code.fragment_global.contains("uniform sampler2D m_z_tex;\n"));
        assert!(code.vertex_global.contains("uniform samplerCube m_y_tex;\n"));
        assert_eq!(actions.uniforms.len(), 4);
    }

    #[test]
    fn test_duplicate_uniform_order_is_bad_shape() {
        let mut shader = ShaderNode::default();
        shader.uniforms.insert("a".to_string(), uniform(DataType::Float, 0, 0));
        shader.uniforms.insert("b".to_string(), uniform(DataType::Float, 0, 0));
        let defaults = spatial();
        let internal = internal();
        let mut actions = NoActions;
        let mut emitter = NodeEmitter::new(&shader, &defaults, &internal, &mut actions);
        assert!(matches!(
            emitter.emit_shader(1),
            Err(ShaderError::BadNodeShape(_))
        ));
    }

    #[test]
    fn test_varying_sections() {
        let mut shader = ShaderNode::default();
        let mut flat = varying(VaryingStage::VertexToFragment);
        flat.interpolation = Interpolation::Flat;
        flat.array_size = 2;
        shader.varyings.insert("ids".to_string(), flat);
        shader
            .varyings
            .insert("col".to_string(), varying(VaryingStage::FragmentToLight));
        let defaults = spatial();
        let internal = internal();
        let mut actions = NoActions;
        let code = {
            let mut emitter = NodeEmitter::new(&shader, &defaults, &internal, &mut actions);
            emitter.emit_shader(1).unwrap();
            emitter.finish()
        };

        assert_eq!(code.vertex_global, "flat out vec3 m_ids[2];\n");
        assert_eq!(
            code.fragment_global,
            "flat in vec3 m_ids[2];\n\n\nstruct {\n\tvec3 m_col;\n} frag_to_light;\n"
        );
    }
}
