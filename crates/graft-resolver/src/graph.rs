//! Declaration tree construction, exclusion pruning, and traversal.
//!
//! Every declaration reached during expansion is its own node, so the same
//! module appears once per path that requests it. The parent edge of a node
//! is its ancestry; removing a node removes only the children reached through
//! it, while other paths to the same module survive.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use graft_core::dependency::{DeclarationSource, DependencyDeclaration, ExclusionRule, ModuleId};
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::resolver::ResolvedGraph;

/// A single declaration in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationNode {
    pub group: String,
    pub module: String,
    /// Constraint as requested, or the platform-managed version.
    pub constraint: String,
    pub source: DeclarationSource,
    /// Exclusions applying to everything below this node.
    pub exclusions: Vec<ExclusionRule>,
    /// The constraint was supplied by a platform.
    pub managed: bool,
    /// Expansion stopped here because the same coordinate was already on the path.
    pub truncated: bool,
}

impl DeclarationNode {
    pub fn from_declaration(decl: DependencyDeclaration) -> Self {
        Self {
            group: decl.group,
            module: decl.module,
            constraint: decl.version_constraint,
            source: decl.source,
            exclusions: decl.exclusions,
            managed: false,
            truncated: false,
        }
    }

    /// `group:module` identifier (without version).
    pub fn key(&self) -> String {
        format!("{}:{}", self.group, self.module)
    }

    pub fn module_id(&self) -> ModuleId {
        ModuleId::new(&self.group, &self.module)
    }
}

impl fmt::Display for DeclarationNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.constraint.is_empty() {
            write!(f, "{}:{}", self.group, self.module)
        } else {
            write!(f, "{}:{}:{}", self.group, self.module, self.constraint)
        }
    }
}

/// The tree of declarations reachable from a project's direct dependencies.
pub struct DeclarationGraph {
    graph: StableDiGraph<DeclarationNode, ()>,
    root: NodeIndex,
    root_label: String,
}

impl DeclarationGraph {
    pub fn new(root_label: impl Into<String>) -> Self {
        let root_label = root_label.into();
        let mut graph = StableDiGraph::new();
        let root = graph.add_node(DeclarationNode {
            group: String::new(),
            module: root_label.clone(),
            constraint: String::new(),
            source: DeclarationSource::Direct,
            exclusions: Vec::new(),
            managed: false,
            truncated: false,
        });
        Self {
            graph,
            root,
            root_label,
        }
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// Add a declaration requested by `parent`.
    pub fn add_declaration(&mut self, parent: NodeIndex, node: DeclarationNode) -> NodeIndex {
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, ());
        idx
    }

    pub fn node(&self, idx: NodeIndex) -> &DeclarationNode {
        &self.graph[idx]
    }

    pub fn mark_truncated(&mut self, idx: NodeIndex) {
        if let Some(node) = self.graph.node_weight_mut(idx) {
            node.truncated = true;
        }
    }

    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .next()
            .map(|e| e.source())
    }

    /// Ancestors of `idx`, nearest first, excluding the root.
    pub fn ancestors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut current = self.parent(idx);
        while let Some(p) = current {
            if p == self.root {
                break;
            }
            out.push(p);
            current = self.parent(p);
        }
        out
    }

    /// Declarations from the direct dependency down to `idx`, as `g:m:constraint`.
    pub fn ancestry(&self, idx: NodeIndex) -> Vec<String> {
        let mut chain: Vec<String> = self
            .ancestors(idx)
            .into_iter()
            .rev()
            .map(|a| self.graph[a].to_string())
            .collect();
        chain.push(self.graph[idx].to_string());
        chain
    }

    /// Children of `idx` in the order they were declared.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| e.target())
            .collect();
        children.sort();
        children
    }

    /// All declarations (excluding root) in insertion order.
    pub fn declarations(&self) -> impl Iterator<Item = (NodeIndex, &DeclarationNode)> + '_ {
        self.graph
            .node_indices()
            .filter(move |&idx| idx != self.root)
            .map(move |idx| (idx, &self.graph[idx]))
    }

    /// Number of declarations of `module` left in the tree.
    pub fn occurrences(&self, module: &ModuleId) -> usize {
        self.declarations()
            .filter(|(_, n)| n.group == module.group && n.module == module.module)
            .count()
    }

    /// Remove every declaration matched by a global rule or by a rule carried
    /// on one of its ancestors, then everything no longer reachable from the
    /// root. Returns the number of nodes removed.
    pub fn apply_exclusions(&mut self, global: &[ExclusionRule]) -> usize {
        let excluded: Vec<NodeIndex> = self
            .declarations()
            .filter(|(idx, node)| self.is_excluded(*idx, node, global))
            .map(|(idx, _)| idx)
            .collect();
        if excluded.is_empty() {
            return 0;
        }
        for idx in &excluded {
            tracing::debug!("excluding {}", self.graph[*idx]);
            self.graph.remove_node(*idx);
        }

        let mut reachable = HashSet::new();
        let mut queue = VecDeque::from([self.root]);
        while let Some(idx) = queue.pop_front() {
            if reachable.insert(idx) {
                queue.extend(self.graph.neighbors_directed(idx, Direction::Outgoing));
            }
        }
        let orphans: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|idx| !reachable.contains(idx))
            .collect();
        for idx in &orphans {
            self.graph.remove_node(*idx);
        }
        excluded.len() + orphans.len()
    }

    fn is_excluded(&self, idx: NodeIndex, node: &DeclarationNode, global: &[ExclusionRule]) -> bool {
        let matches = |rule: &ExclusionRule| rule.matches(&node.group, &node.module);
        global.iter().any(matches)
            || self
                .ancestors(idx)
                .into_iter()
                .any(|a| self.graph[a].exclusions.iter().any(matches))
    }

    /// Every ancestry chain that reaches a module.
    ///
    /// Accepts either `group:module` or just `module` (partial match).
    pub fn paths_to(&self, target_key: &str) -> Vec<Vec<String>> {
        let exact: Vec<NodeIndex> = self
            .declarations()
            .filter(|(_, n)| n.key() == target_key)
            .map(|(idx, _)| idx)
            .collect();
        let matches = if exact.is_empty() {
            self.declarations()
                .filter(|(_, n)| n.module == target_key)
                .map(|(idx, _)| idx)
                .collect()
        } else {
            exact
        };
        matches.into_iter().map(|idx| self.ancestry(idx)).collect()
    }

    /// Print the declaration tree, annotating each node with its resolved version.
    pub fn print_tree(&self, resolved: &ResolvedGraph, max_depth: Option<usize>) -> String {
        let mut output = format!("{}\n", self.root_label);
        let children = self.children(self.root);
        let count = children.len();
        for (i, idx) in children.into_iter().enumerate() {
            self.print_subtree(&mut output, resolved, idx, "", i == count - 1, 1, max_depth);
        }
        output
    }

    #[allow(clippy::too_many_arguments)]
    fn print_subtree(
        &self,
        output: &mut String,
        resolved: &ResolvedGraph,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        depth: usize,
        max_depth: Option<usize>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        let node = &self.graph[idx];
        output.push_str(&format!("{prefix}{connector}{node}"));
        if let Some(version) = resolved.get(&node.group, &node.module) {
            if version != node.constraint {
                output.push_str(&format!(" -> {version}"));
            }
        }
        if node.managed {
            output.push_str(" (platform)");
        }
        if node.truncated {
            output.push_str(" (*)");
        }
        output.push('\n');

        if max_depth.is_some_and(|max| depth >= max) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let children = self.children(idx);
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            self.print_subtree(
                output,
                resolved,
                child,
                &child_prefix,
                i == count - 1,
                depth + 1,
                max_depth,
            );
        }
    }

    /// Number of declarations (excluding root).
    pub fn len(&self) -> usize {
        self.graph.node_count().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
