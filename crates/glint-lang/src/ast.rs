//! Typed syntax tree handed from the parser to the compiler
//!
//! Statements and expressions are a single tagged enum ([`Node`]); the
//! shader root, functions and structs are plain structs owned by
//! [`ShaderNode`].

use glint_core::{
    ArgumentQualifier, ConstantValue, DataType, Interpolation, Operator, Precision,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Discriminator for every kind of node in the tree
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Shader,
    Function,
    Struct,
    Block,
    VariableDeclaration,
    Variable,
    ArrayDeclaration,
    Array,
    ArrayConstruct,
    Constant,
    Operator,
    ControlFlow,
    Member,
}

/// Control flow statement kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOperation {
    If,
    Switch,
    Case,
    Default,
    Do,
    While,
    For,
    Return,
    Discard,
    Continue,
    Break,
}

/// Statement or expression node
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Block(BlockNode),
    VariableDeclaration(VariableDeclarationNode),
    Variable(VariableNode),
    ArrayDeclaration(ArrayDeclarationNode),
    Array(ArrayNode),
    ArrayConstruct(ArrayConstructNode),
    Constant(ConstantNode),
    Operator(OperatorNode),
    ControlFlow(ControlFlowNode),
    Member(MemberNode),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Block(_) => NodeKind::Block,
            Node::VariableDeclaration(_) => NodeKind::VariableDeclaration,
            Node::Variable(_) => NodeKind::Variable,
            Node::ArrayDeclaration(_) => NodeKind::ArrayDeclaration,
            Node::Array(_) => NodeKind::Array,
            Node::ArrayConstruct(_) => NodeKind::ArrayConstruct,
            Node::Constant(_) => NodeKind::Constant,
            Node::Operator(_) => NodeKind::Operator,
            Node::ControlFlow(_) => NodeKind::ControlFlow,
            Node::Member(_) => NodeKind::Member,
        }
    }

    /// Reference to a global (non-local) identifier
    pub fn variable(name: impl Into<String>) -> Node {
        Node::Variable(VariableNode {
            name: name.into(),
            is_local: false,
        })
    }

    /// Reference to a local variable or function argument
    pub fn local(name: impl Into<String>) -> Node {
        Node::Variable(VariableNode {
            name: name.into(),
            is_local: true,
        })
    }

    pub fn constant(ty: DataType, values: Vec<ConstantValue>) -> Node {
        Node::Constant(ConstantNode {
            datatype: ty,
            struct_name: None,
            values,
            array_size: 0,
            array_elements: Vec::new(),
        })
    }

    pub fn float(value: f32) -> Node {
        Node::constant(DataType::Float, vec![ConstantValue::Float(value)])
    }

    pub fn int(value: i32) -> Node {
        Node::constant(DataType::Int, vec![ConstantValue::Int(value)])
    }

    pub fn op(op: Operator, arguments: Vec<Node>) -> Node {
        Node::Operator(OperatorNode { op, arguments })
    }

    /// Shorthand for a `lhs = rhs` operator node
    pub fn assign(lhs: Node, rhs: Node) -> Node {
        Node::op(Operator::Assign, vec![lhs, rhs])
    }

    /// Shorthand for a call; the callee travels as the first argument
    pub fn call(callee: impl Into<String>, args: Vec<Node>) -> Node {
        let mut arguments = vec![Node::variable(callee)];
        arguments.extend(args);
        Node::op(Operator::Call, arguments)
    }

    pub fn flow(flow_op: FlowOperation, expressions: Vec<Node>, blocks: Vec<BlockNode>) -> Node {
        Node::ControlFlow(ControlFlowNode {
            flow_op,
            expressions,
            blocks,
        })
    }
}

/// `{ ... }` sequence of statements
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlockNode {
    pub statements: Vec<Node>,
    /// Body written without braces (or the init clause of a `for`)
    pub single_statement: bool,
}

impl BlockNode {
    pub fn new(statements: Vec<Node>) -> Self {
        Self {
            statements,
            single_statement: false,
        }
    }

    pub fn single(statement: Node) -> Self {
        Self {
            statements: vec![statement],
            single_statement: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub initializer: Option<Box<Node>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VariableDeclarationNode {
    pub is_const: bool,
    pub precision: Precision,
    pub datatype: DataType,
    pub struct_name: Option<String>,
    pub declarations: Vec<Declaration>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VariableNode {
    pub name: String,
    pub is_local: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArrayDeclaration {
    pub name: String,
    pub size: u32,
    pub initializer: Vec<Node>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArrayDeclarationNode {
    pub is_const: bool,
    pub precision: Precision,
    pub datatype: DataType,
    pub struct_name: Option<String>,
    pub declarations: Vec<ArrayDeclaration>,
}

/// Reference to an array identifier, optionally with one postfix
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayNode {
    pub name: String,
    pub is_local: bool,
    pub call_expression: Option<Box<Node>>,
    pub index_expression: Option<Box<Node>>,
    pub assign_expression: Option<Box<Node>>,
}

impl ArrayNode {
    pub fn new(name: impl Into<String>, is_local: bool) -> Self {
        Self {
            name: name.into(),
            is_local,
            call_expression: None,
            index_expression: None,
            assign_expression: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArrayConstructNode {
    pub datatype: DataType,
    pub struct_name: Option<String>,
    pub initializer: Vec<Node>,
}

/// Literal value. Scalars, vectors and matrices keep their components in
/// `values`; arrays (`array_size > 0`) keep one node per element.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstantNode {
    pub datatype: DataType,
    pub struct_name: Option<String>,
    pub values: Vec<ConstantValue>,
    pub array_size: u32,
    pub array_elements: Vec<Node>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OperatorNode {
    pub op: Operator,
    pub arguments: Vec<Node>,
}

/// Control flow statement.
///
/// Shapes by operation:
/// - `If`: expressions `[cond]`, blocks `[then]` or `[then, else]`
/// - `Switch`: expressions `[value]`, blocks `[cases]`
/// - `Case`: expressions `[label]`, blocks `[body]`; `Default`: blocks `[body]`
/// - `Do` / `While`: expressions `[cond]`, blocks `[body]`
/// - `For`: expressions `[cond, step]`, blocks `[init, body]`
/// - `Return`: expressions `[]` or `[value]`
#[derive(Clone, Debug, PartialEq)]
pub struct ControlFlowNode {
    pub flow_op: FlowOperation,
    pub expressions: Vec<Node>,
    pub blocks: Vec<BlockNode>,
}

/// Member access (`owner.name`), used for struct fields and swizzles
#[derive(Clone, Debug, PartialEq)]
pub struct MemberNode {
    pub owner: Box<Node>,
    pub name: String,
    pub index_expression: Option<Box<Node>>,
    pub assign_expression: Option<Box<Node>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Argument {
    pub is_const: bool,
    pub qualifier: ArgumentQualifier,
    pub precision: Precision,
    pub datatype: DataType,
    pub type_name: Option<String>,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionNode {
    pub name: String,
    pub return_type: DataType,
    pub return_struct_name: Option<String>,
    pub arguments: Vec<Argument>,
    pub body: BlockNode,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub name: String,
    /// User functions called from this one, in first-call order
    pub uses_function: Vec<String>,
    pub function: FunctionNode,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructMember {
    pub name: String,
    pub datatype: DataType,
    pub struct_name: Option<String>,
    pub precision: Precision,
    pub array_size: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructNode {
    pub members: Vec<StructMember>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Struct {
    pub name: String,
    pub shader_struct: StructNode,
}

/// Editor hint attached to a uniform
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(into = "String")]
pub enum ShaderHint {
    #[default]
    None,
    Color,
    Range { min: f32, max: f32, step: f32 },
    Albedo,
    BlackAlbedo,
    Normal,
    Black,
    White,
    Aniso,
}

impl ShaderHint {
    pub fn from_name(name: &str) -> Option<ShaderHint> {
        match name {
            "hint_color" => Some(ShaderHint::Color),
            "hint_albedo" => Some(ShaderHint::Albedo),
            "hint_black_albedo" => Some(ShaderHint::BlackAlbedo),
            "hint_normal" => Some(ShaderHint::Normal),
            "hint_black" => Some(ShaderHint::Black),
            "hint_white" => Some(ShaderHint::White),
            "hint_aniso" => Some(ShaderHint::Aniso),
            _ => None,
        }
    }

    /// Hints that only make sense on samplers
    pub fn is_texture_hint(&self) -> bool {
        matches!(
            self,
            ShaderHint::Albedo
                | ShaderHint::BlackAlbedo
                | ShaderHint::Normal
                | ShaderHint::Black
                | ShaderHint::White
                | ShaderHint::Aniso
        )
    }
}

impl fmt::Display for ShaderHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderHint::None => f.write_str("none"),
            ShaderHint::Color => f.write_str("hint_color"),
            ShaderHint::Range { min, max, step } => {
                write!(f, "hint_range({}, {}, {})", min, max, step)
            }
            ShaderHint::Albedo => f.write_str("hint_albedo"),
            ShaderHint::BlackAlbedo => f.write_str("hint_black_albedo"),
            ShaderHint::Normal => f.write_str("hint_normal"),
            ShaderHint::Black => f.write_str("hint_black"),
            ShaderHint::White => f.write_str("hint_white"),
            ShaderHint::Aniso => f.write_str("hint_aniso"),
        }
    }
}

impl From<ShaderHint> for String {
    fn from(hint: ShaderHint) -> Self {
        hint.to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Uniform {
    #[serde(rename = "type")]
    pub datatype: DataType,
    pub precision: Precision,
    /// Slot inside the material uniform buffer (non-samplers)
    pub order: usize,
    /// Binding slot among samplers
    pub texture_order: usize,
    pub hint: ShaderHint,
    pub default_value: Vec<ConstantValue>,
}

impl Uniform {
    pub fn is_sampler(&self) -> bool {
        self.datatype.is_sampler()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VaryingStage {
    #[default]
    VertexToFragment,
    FragmentToLight,
    Fragment,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Varying {
    pub datatype: DataType,
    pub precision: Precision,
    pub interpolation: Interpolation,
    pub array_size: u32,
    pub stage: VaryingStage,
}

/// Global `const` declaration
#[derive(Clone, Debug, PartialEq)]
pub struct Constant {
    pub name: String,
    pub datatype: DataType,
    pub type_name: Option<String>,
    pub precision: Precision,
    pub array_size: u32,
    pub initializer: Node,
}

/// Root of a parsed shader
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShaderNode {
    pub shader_type: String,
    pub render_modes: Vec<String>,
    pub structs: Vec<Struct>,
    pub uniforms: BTreeMap<String, Uniform>,
    pub varyings: BTreeMap<String, Varying>,
    pub constants: Vec<Constant>,
    pub functions: Vec<Function>,
}

impl ShaderNode {
    pub fn kind(&self) -> NodeKind {
        NodeKind::Shader
    }

    pub fn find_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }
}
