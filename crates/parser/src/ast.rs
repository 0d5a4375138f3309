use crate::node::Node;
use wisp_lexer::Span;

/// An index into an [`Ast`]'s node arena.
///
/// Indices are only meaningful relative to the `Ast` that produced them;
/// mixing indices from two different `Ast`s is a logic error.
pub type AstIndex = usize;

/// A node paired with the span of source it was parsed from.
#[derive(Clone, Debug, PartialEq)]
pub struct AstNode {
    /// The parsed node
    pub node: Node,
    /// Where in the source this node came from
    pub span: Span,
}

/// The tree produced by the parser: a flat arena of [`AstNode`]s plus the
/// index of the top-level [`Node::Program`].
///
/// `Ast` is cheap to share: `wisp_runtime`'s frames hold an `Rc<Ast>` plus
/// `AstIndex`/`Vec<AstIndex>` pointers into it, so re-entering a loop body or
/// retiring a function frame never re-allocates AST data.
#[derive(Clone, Debug, Default)]
pub struct Ast {
    nodes: Vec<AstNode>,
    root: AstIndex,
}

impl Ast {
    /// Creates an empty AST; [`Ast::set_root`] should be called once parsing
    /// completes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node to the arena, returning its index.
    pub fn push(&mut self, node: Node, span: Span) -> AstIndex {
        self.nodes.push(AstNode { node, span });
        self.nodes.len() - 1
    }

    /// Sets the index of the top-level [`Node::Program`] node.
    pub fn set_root(&mut self, root: AstIndex) {
        self.root = root;
    }

    /// The index of the top-level [`Node::Program`] node.
    pub fn root(&self) -> AstIndex {
        self.root
    }

    /// Looks up a node by index.
    ///
    /// # Panics
    /// Panics if `index` wasn't produced by this `Ast`.
    pub fn node(&self, index: AstIndex) -> &AstNode {
        &self.nodes[index]
    }

    /// The number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
