//! Glint Lang - the shading language front end
//!
//! Provides the typed syntax tree consumed by the compiler, the registry of
//! built-ins per shader mode, and a pest-based reference parser.

pub mod ast;
pub mod parser;
pub mod registry;
mod syntax;

pub use ast::{
    Argument, ArrayConstructNode, ArrayDeclaration, ArrayDeclarationNode, ArrayNode, BlockNode,
    Constant, ConstantNode, ControlFlowNode, Declaration, FlowOperation, Function, FunctionNode,
    MemberNode, Node, NodeKind, OperatorNode, ShaderHint, ShaderNode, Struct, StructMember,
    StructNode, Uniform, VariableDeclarationNode, VariableNode, Varying, VaryingStage,
};
pub use parser::{ParseError, ShaderLanguageParser, ShaderParser};
pub use registry::{BuiltInInfo, FunctionInfo, ModeInfo, ShaderTypes, BUILTIN_FUNCTIONS, GLOBAL_FUNCTION};
