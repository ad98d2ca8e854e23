//! The IR node model: a closed tagged union of node variants, each carrying
//! a stable id, an optional syntax-tree back reference, a display name, a
//! graph back reference, a parent, and ordered children.

use crate::ir::graph_set::GraphId;
use crate::surface::ast::SyntaxRef;

/// Stable, monotonically assigned node id — unique only within its graph
/// (ids double as small dense indices into [`crate::ir::graph::IrGraph`]'s
/// arena).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The closed set of IR node variants.
#[derive(Debug, Clone)]
pub enum NodeKind {
    // -- Regular (pass-through) --
    Function,
    LocalFunction,
    LocalAssign,
    GlobalAssign,
    Semicolon,
    Do,
    Call,

    // -- Async --
    AsyncCall,
    AsyncAssign,

    // -- Control --
    /// `is_else` marks an arm with no source condition — either a real
    /// `else` arm or one synthesized by the linearizer.
    Conditional { is_else: bool },
    Break,
    Return,
    Goto,
    Label,

    // -- Loop --
    While,
    Repeat,
    ForIn,
    ForNum,

    // -- Generated --
    Block,
    /// `has_source_else` records whether the original `If` had an explicit
    /// else arm.
    Branch { has_source_else: bool },
    Link {
        target: GraphId,
        is_async: bool,
        link_id: Box<str>,
    },
    FunctionStub {
        function_name: Box<str>,
    },
    /// Placeholder for a synthesized, empty `else` arm.
    ElseStub,
    SetEventPointer {
        link_id: Box<str>,
    },
}

impl NodeKind {
    /// Display label used for diagnostics and the debug graph dump.
    pub fn label(&self) -> String {
        match self {
            NodeKind::Function => "Function".into(),
            NodeKind::LocalFunction => "LocalFunction".into(),
            NodeKind::LocalAssign => "LocalAssign".into(),
            NodeKind::GlobalAssign => "GlobalAssign".into(),
            NodeKind::Semicolon => "Semicolon".into(),
            NodeKind::Do => "Do".into(),
            NodeKind::Call => "Call".into(),
            NodeKind::AsyncCall => "AsyncCall (A)".into(),
            NodeKind::AsyncAssign => "AsyncAssign (A)".into(),
            NodeKind::Conditional { is_else: true } => "Conditional (else)".into(),
            NodeKind::Conditional { is_else: false } => "Conditional".into(),
            NodeKind::Break => "Break".into(),
            NodeKind::Return => "Return".into(),
            NodeKind::Goto => "Goto".into(),
            NodeKind::Label => "Label".into(),
            NodeKind::While => "While".into(),
            NodeKind::Repeat => "Repeat".into(),
            NodeKind::ForIn => "ForIn".into(),
            NodeKind::ForNum => "ForNum".into(),
            NodeKind::Block => "Block (G)".into(),
            NodeKind::Branch { .. } => "Branch (G)".into(),
            NodeKind::Link { is_async, link_id, .. } => {
                format!("Link {} ({}) (G)", link_id, if *is_async { "A" } else { "S" })
            }
            NodeKind::FunctionStub { function_name } => format!("Function {function_name} (G)"),
            NodeKind::ElseStub => "Else (G)".into(),
            NodeKind::SetEventPointer { link_id } => format!("SetEventPointer {link_id}"),
        }
    }

    pub fn is_async_boundary(&self) -> bool {
        matches!(self, NodeKind::AsyncCall | NodeKind::AsyncAssign)
    }

    pub fn as_link(&self) -> Option<(GraphId, bool, &str)> {
        match self {
            NodeKind::Link { target, is_async, link_id } => Some((*target, *is_async, link_id)),
            _ => None,
        }
    }
}

/// One node in an [`crate::ir::graph::IrGraph`]'s arena.
#[derive(Debug, Clone)]
pub struct IrNode {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Optional back reference to the originating syntax-tree node. `None`
    /// for most Generated nodes.
    pub syntax: Option<SyntaxRef>,
    pub name: String,
    pub graph: GraphId,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl IrNode {
    pub fn new(kind: NodeKind, syntax: Option<SyntaxRef>) -> Self {
        let name = kind.label();
        Self {
            // Placeholder id/graph; `IrGraph::add_node` assigns the real
            // values at insertion time.
            id: NodeId(u32::MAX),
            kind,
            syntax,
            name,
            graph: GraphId(u32::MAX),
            parent: None,
            children: Vec::new(),
        }
    }
}
