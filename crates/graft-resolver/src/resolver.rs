//! Core resolution algorithm: breadth-first expansion with a path cycle guard,
//! exclusion pruning, platform-managed versions, force rules, and
//! highest-version-wins conflict resolution.

use std::collections::{BTreeMap, VecDeque};

use graft_core::dependency::{
    Coordinate, DeclarationSource, DependencyDeclaration, ExclusionRule, ForceRule, ModuleId,
};
use petgraph::stable_graph::NodeIndex;
use serde::Serialize;

use crate::cache::ExpansionCache;
use crate::conflict::{ConflictKind, ConflictReport, ConflictingRequest};
use crate::graph::{DeclarationGraph, DeclarationNode};
use crate::source::DependencySource;
use crate::version::{Version, VersionConstraint};

/// How modules requested at differing constraints are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictStrategy {
    /// Pick the highest version satisfying every request.
    #[default]
    HighestWins,
    /// Report any module requested at more than one constraint unless forced.
    Fail,
}

/// Everything a single resolution needs besides the dependency source.
#[derive(Debug, Clone, Default)]
pub struct ResolutionRequest {
    /// Label of the tree root, usually the project name.
    pub root: String,
    pub direct: Vec<DependencyDeclaration>,
    pub exclusions: Vec<ExclusionRule>,
    pub forces: Vec<ForceRule>,
    pub platforms: Vec<Coordinate>,
    pub strategy: ConflictStrategy,
}

impl ResolutionRequest {
    pub fn new(direct: Vec<DependencyDeclaration>) -> Self {
        Self {
            root: "root".to_string(),
            direct,
            ..Self::default()
        }
    }

    pub fn root(mut self, label: impl Into<String>) -> Self {
        self.root = label.into();
        self
    }

    pub fn exclude(mut self, rule: ExclusionRule) -> Self {
        self.exclusions.push(rule);
        self
    }

    pub fn force(mut self, rule: ForceRule) -> Self {
        self.forces.push(rule);
        self
    }

    pub fn platform(mut self, coord: Coordinate) -> Self {
        self.platforms.push(coord);
        self
    }

    pub fn strategy(mut self, strategy: ConflictStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// How a module's final version was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Selection {
    /// A force rule pinned it; constraints were not checked.
    Forced,
    /// Every request named the same version.
    Agreed,
    /// Requests differed; the highest version satisfying all of them won.
    HighestWins,
    /// No requested version satisfied all requests; chosen from published versions.
    Available,
}

/// The final version of one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedModule {
    pub group: String,
    pub module: String,
    pub version: String,
    pub selection: Selection,
    /// Distinct constraints requested, in first-seen order.
    pub requested: Vec<String>,
}

/// Exactly one resolved version per `group:module`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedGraph {
    entries: BTreeMap<ModuleId, ResolvedModule>,
}

impl ResolvedGraph {
    pub fn get(&self, group: &str, module: &str) -> Option<&str> {
        self.entries
            .get(&ModuleId::new(group, module))
            .map(|m| m.version.as_str())
    }

    pub fn entry(&self, id: &ModuleId) -> Option<&ResolvedModule> {
        self.entries.get(id)
    }

    /// Resolved modules ordered by `group:module`.
    pub fn modules(&self) -> impl Iterator<Item = &ResolvedModule> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, id: ModuleId, module: ResolvedModule) {
        self.entries.insert(id, module);
    }

    #[cfg(test)]
    pub(crate) fn insert_for_test(&mut self, group: &str, module: &str, version: &str) {
        self.insert(
            ModuleId::new(group, module),
            ResolvedModule {
                group: group.to_string(),
                module: module.to_string(),
                version: version.to_string(),
                selection: Selection::Agreed,
                requested: vec![version.to_string()],
            },
        );
    }
}

/// The output of dependency resolution.
pub struct Resolution {
    pub resolved: ResolvedGraph,
    /// Declarations that survived exclusion, for tree and path queries.
    pub graph: DeclarationGraph,
}

/// Resolve `request` against `source`.
///
/// Pure apart from logging: the same request and source always produce the
/// same result. Stops at the first module that cannot be resolved.
pub fn resolve<S>(request: &ResolutionRequest, source: &S) -> Result<Resolution, ConflictReport>
where
    S: DependencySource + ?Sized,
{
    let forces = index_forces(&request.forces);
    let managed = collect_managed(&request.platforms, source);
    let mut cache = ExpansionCache::new();
    let mut graph = DeclarationGraph::new(request.root.clone());

    let mut queue: VecDeque<NodeIndex> = VecDeque::new();
    for decl in &request.direct {
        let mut decl = decl.clone();
        decl.source = DeclarationSource::Direct;
        let idx = graph.add_declaration(graph.root(), declaration_node(decl, &managed));
        queue.push_back(idx);
    }

    while let Some(idx) = queue.pop_front() {
        let node = graph.node(idx);
        let Some(version) = expansion_version(node, &forces) else {
            tracing::debug!("not expanding versionless {}", node.key());
            continue;
        };
        let revisited = graph.ancestors(idx).into_iter().any(|a| {
            let ancestor = graph.node(a);
            ancestor.group == node.group
                && ancestor.module == node.module
                && expansion_version(ancestor, &forces).as_deref() == Some(version.as_str())
        });
        if revisited {
            tracing::trace!("cycle at {}:{}:{version}, truncating", node.group, node.module);
            graph.mark_truncated(idx);
            continue;
        }

        let (group, module) = (node.group.clone(), node.module.clone());
        for mut child in cache.expand(source, &group, &module, &version) {
            child.source = DeclarationSource::Transitive;
            let child_idx = graph.add_declaration(idx, declaration_node(child, &managed));
            queue.push_back(child_idx);
        }
    }
    tracing::debug!(
        "expanded {} declarations ({} lookups, {} cache hits)",
        graph.len(),
        cache.len(),
        cache.hits()
    );

    let removed = graph.apply_exclusions(&request.exclusions);
    if removed > 0 {
        tracing::debug!("exclusions removed {removed} declarations");
    }

    let mut by_module: BTreeMap<ModuleId, Vec<NodeIndex>> = BTreeMap::new();
    for (idx, node) in graph.declarations() {
        by_module.entry(node.module_id()).or_default().push(idx);
    }

    let mut resolved = ResolvedGraph::default();
    for (id, nodes) in &by_module {
        let requested = distinct_constraints(&graph, nodes);
        let (version, selection) = match forces.get(id) {
            Some(rule) => (rule.version.clone(), Selection::Forced),
            None => select_version(id, &graph, nodes, &requested, source, request.strategy)?,
        };
        tracing::debug!("{id} = {version} ({selection:?})");
        resolved.insert(
            id.clone(),
            ResolvedModule {
                group: id.group.clone(),
                module: id.module.clone(),
                version,
                selection,
                requested,
            },
        );
    }

    Ok(Resolution { resolved, graph })
}

/// First force rule per module wins.
fn index_forces(rules: &[ForceRule]) -> BTreeMap<ModuleId, &ForceRule> {
    let mut index: BTreeMap<ModuleId, &ForceRule> = BTreeMap::new();
    for rule in rules {
        match index.get(&rule.module_id()) {
            Some(existing) if existing.version != rule.version => {
                tracing::warn!("ignoring force {rule}: {existing} was declared first");
            }
            Some(_) => {}
            None => {
                index.insert(rule.module_id(), rule);
            }
        }
    }
    index
}

/// Versions managed by the requested platforms; the first platform managing a
/// module wins.
fn collect_managed<S>(platforms: &[Coordinate], source: &S) -> BTreeMap<ModuleId, String>
where
    S: DependencySource + ?Sized,
{
    let mut managed = BTreeMap::new();
    for platform in platforms {
        let entries = source.platform(&platform.group, &platform.module, &platform.version);
        if entries.is_empty() {
            tracing::warn!("platform {platform} manages no modules");
        }
        for (id, version) in entries {
            managed.entry(id).or_insert(version);
        }
    }
    managed
}

fn declaration_node(
    decl: DependencyDeclaration,
    managed: &BTreeMap<ModuleId, String>,
) -> DeclarationNode {
    let mut node = DeclarationNode::from_declaration(decl);
    if node.constraint.is_empty() {
        if let Some(version) = managed.get(&node.module_id()) {
            node.constraint = version.clone();
            node.managed = true;
        }
    }
    node
}

/// The version a node is expanded at: its forced version, else its constraint.
fn expansion_version(
    node: &DeclarationNode,
    forces: &BTreeMap<ModuleId, &ForceRule>,
) -> Option<String> {
    if let Some(rule) = forces.get(&node.module_id()) {
        return Some(rule.version.clone());
    }
    (!node.constraint.is_empty()).then(|| node.constraint.clone())
}

fn distinct_constraints(graph: &DeclarationGraph, nodes: &[NodeIndex]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for idx in nodes {
        let constraint = &graph.node(*idx).constraint;
        if !constraint.is_empty() && !out.contains(constraint) {
            out.push(constraint.clone());
        }
    }
    out
}

/// Interval brackets, comparators, `=`, a `+` suffix or a comma mark a
/// string as a constraint rather than an opaque version label.
fn has_constraint_syntax(text: &str) -> bool {
    let s = text.trim();
    s.starts_with(['[', '(', '>', '<', '='])
        || s.ends_with(['+', ']', ')'])
        || s.contains(',')
}

fn select_version<S>(
    id: &ModuleId,
    graph: &DeclarationGraph,
    nodes: &[NodeIndex],
    requested: &[String],
    source: &S,
    strategy: ConflictStrategy,
) -> Result<(String, Selection), ConflictReport>
where
    S: DependencySource + ?Sized,
{
    let report = |kind: ConflictKind| {
        let mut report = ConflictReport::new(id.clone(), kind);
        for idx in nodes {
            let node = graph.node(*idx);
            report.add(ConflictingRequest {
                constraint: node.constraint.clone(),
                source: node.source,
                ancestry: graph.ancestry(*idx),
            });
        }
        report
    };

    match requested {
        [] => return Err(report(ConflictKind::MissingVersion)),
        [only] if !has_constraint_syntax(only) && VersionConstraint::parse(only).is_err() => {
            return Ok((only.clone(), Selection::Agreed));
        }
        [_, _, ..] if strategy == ConflictStrategy::Fail => {
            return Err(report(ConflictKind::VersionConflict));
        }
        _ => {}
    }

    let mut constraints = Vec::with_capacity(requested.len());
    for text in requested {
        match VersionConstraint::parse(text) {
            Ok(c) => constraints.push(c),
            Err(e) => {
                tracing::debug!("{id}: {e}");
                return Err(report(ConflictKind::MalformedVersionString));
            }
        }
    }
    let satisfies_all = |v: &Version| constraints.iter().all(|c| c.allows(v));

    let named = constraints
        .iter()
        .flat_map(|c| c.named_versions())
        .filter(|v| satisfies_all(*v))
        .max();
    if let Some(best) = named {
        let selection = if requested.len() == 1 {
            Selection::Agreed
        } else {
            Selection::HighestWins
        };
        return Ok((best.to_string(), selection));
    }

    let available = source
        .available_versions(&id.group, &id.module)
        .iter()
        .filter_map(|s| Version::parse(s).ok())
        .filter(|v| satisfies_all(v))
        .max();
    match available {
        Some(best) => Ok((best.to_string(), Selection::Available)),
        None => Err(report(ConflictKind::UnsatisfiableConstraint)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::NoTransitives;

    fn resolve_direct(direct: Vec<DependencyDeclaration>) -> Result<Resolution, ConflictReport> {
        resolve(&ResolutionRequest::new(direct), &NoTransitives)
    }

    #[test]
    fn identical_requests_agree() {
        let res = resolve_direct(vec![
            DependencyDeclaration::direct("org.a", "a", "1.0"),
            DependencyDeclaration::direct("org.a", "a", "1.0"),
        ])
        .unwrap();
        let entry = res.resolved.entry(&ModuleId::new("org.a", "a")).unwrap();
        assert_eq!(entry.version, "1.0");
        assert_eq!(entry.selection, Selection::Agreed);
        assert_eq!(entry.requested, vec!["1.0"]);
    }

    #[test]
    fn highest_requested_version_wins() {
        let res = resolve_direct(vec![
            DependencyDeclaration::direct("org.a", "a", "1.2"),
            DependencyDeclaration::direct("org.a", "a", "1.10"),
            DependencyDeclaration::direct("org.a", "a", "1.9"),
        ])
        .unwrap();
        let entry = res.resolved.entry(&ModuleId::new("org.a", "a")).unwrap();
        assert_eq!(entry.version, "1.10");
        assert_eq!(entry.selection, Selection::HighestWins);
    }

    #[test]
    fn release_beats_prerelease_of_same_number() {
        let res = resolve_direct(vec![
            DependencyDeclaration::direct("org.a", "a", "2.0-rc1"),
            DependencyDeclaration::direct("org.a", "a", "2.0"),
        ])
        .unwrap();
        assert_eq!(res.resolved.get("org.a", "a"), Some("2.0"));
    }

    #[test]
    fn range_narrows_upgradeable_requests() {
        let res = resolve_direct(vec![
            DependencyDeclaration::direct("org.a", "a", "1.0"),
            DependencyDeclaration::direct("org.a", "a", "1.5"),
            DependencyDeclaration::direct("org.a", "a", "[1.0,1.4]"),
        ]);
        let report = res.err().unwrap();
        assert_eq!(report.kind, ConflictKind::UnsatisfiableConstraint);

        let res = resolve_direct(vec![
            DependencyDeclaration::direct("org.a", "a", "1.0"),
            DependencyDeclaration::direct("org.a", "a", "[1.0,1.4]"),
        ])
        .unwrap();
        assert_eq!(res.resolved.get("org.a", "a"), Some("1.4"));
    }

    #[test]
    fn single_unparseable_version_is_kept_verbatim() {
        let res = resolve_direct(vec![DependencyDeclaration::direct(
            "org.a",
            "a",
            "latest-internal",
        )])
        .unwrap();
        assert_eq!(res.resolved.get("org.a", "a"), Some("latest-internal"));
    }

    #[test]
    fn single_malformed_range_is_rejected() {
        for text in ["[1.0,2.0", ">=abc", "=", "1.0,2.0", "x.+"] {
            let report = resolve_direct(vec![DependencyDeclaration::direct("org.a", "a", text)])
                .err()
                .unwrap();
            assert_eq!(report.kind, ConflictKind::MalformedVersionString, "{text}");
            assert_eq!(report.constraints(), vec![text]);
        }
    }

    #[test]
    fn numbered_prerelease_ranks_by_qualifier() {
        let res = resolve_direct(vec![
            DependencyDeclaration::direct("org.a", "a", "1.0-rc"),
            DependencyDeclaration::direct("org.a", "a", "1.0-beta1"),
        ])
        .unwrap();
        assert_eq!(res.resolved.get("org.a", "a"), Some("1.0-rc"));
    }

    #[test]
    fn differing_unparseable_versions_conflict() {
        let report = resolve_direct(vec![
            DependencyDeclaration::direct("org.a", "a", "1.0"),
            DependencyDeclaration::direct("org.a", "a", "nightly"),
        ])
        .err()
        .unwrap();
        assert_eq!(report.kind, ConflictKind::MalformedVersionString);
        assert_eq!(report.constraints(), vec!["1.0", "nightly"]);
    }

    #[test]
    fn versionless_without_platform_is_missing() {
        let report = resolve_direct(vec![DependencyDeclaration::direct("org.a", "a", "")])
            .err()
            .unwrap();
        assert_eq!(report.kind, ConflictKind::MissingVersion);
    }

    #[test]
    fn versionless_defers_to_other_requests() {
        let res = resolve_direct(vec![
            DependencyDeclaration::direct("org.a", "a", ""),
            DependencyDeclaration::direct("org.a", "a", "3.0"),
        ])
        .unwrap();
        assert_eq!(res.resolved.get("org.a", "a"), Some("3.0"));
    }

    #[test]
    fn strict_strategy_rejects_differing_requests() {
        let request = ResolutionRequest::new(vec![
            DependencyDeclaration::direct("org.a", "a", "1.0"),
            DependencyDeclaration::direct("org.a", "a", "1.1"),
        ])
        .strategy(ConflictStrategy::Fail);
        let report = resolve(&request, &NoTransitives).err().unwrap();
        assert_eq!(report.kind, ConflictKind::VersionConflict);

        let forced = request.force(ForceRule::new("org.a", "a", "1.1"));
        let res = resolve(&forced, &NoTransitives).unwrap();
        assert_eq!(res.resolved.get("org.a", "a"), Some("1.1"));
    }

    #[test]
    fn first_force_rule_wins() {
        let request = ResolutionRequest::new(vec![DependencyDeclaration::direct("org.a", "a", "1.0")])
            .force(ForceRule::new("org.a", "a", "2.0"))
            .force(ForceRule::new("org.a", "a", "3.0"));
        let res = resolve(&request, &NoTransitives).unwrap();
        let entry = res.resolved.entry(&ModuleId::new("org.a", "a")).unwrap();
        assert_eq!(entry.version, "2.0");
        assert_eq!(entry.selection, Selection::Forced);
    }

    #[test]
    fn forced_module_expanded_at_forced_version() {
        let source = |group: &str, _: &str, version: &str| {
            if group == "org.a" && version == "2.0" {
                vec![DependencyDeclaration::transitive("org.b", "b", "5.0")]
            } else {
                Vec::new()
            }
        };
        let request = ResolutionRequest::new(vec![DependencyDeclaration::direct("org.a", "a", "1.0")])
            .force(ForceRule::new("org.a", "a", "2.0"));
        let res = resolve(&request, &source).unwrap();
        assert_eq!(res.resolved.get("org.b", "b"), Some("5.0"));
    }

    #[test]
    fn transitive_declarations_are_marked_transitive() {
        let source = |group: &str, _: &str, _: &str| {
            if group == "org.a" {
                vec![DependencyDeclaration::direct("org.b", "b", "1.0")]
            } else {
                Vec::new()
            }
        };
        let request = ResolutionRequest::new(vec![DependencyDeclaration::direct("org.a", "a", "1.0")]);
        let res = resolve(&request, &source).unwrap();
        let sources: Vec<DeclarationSource> = res.graph.declarations().map(|(_, n)| n.source).collect();
        assert_eq!(
            sources,
            vec![DeclarationSource::Direct, DeclarationSource::Transitive]
        );
    }
}
