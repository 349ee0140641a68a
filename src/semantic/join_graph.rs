//! Join graph - routing over the model's join topology.
//!
//! Primary joins form an undirected graph used for shortest-path routing
//! (joins are traversable from either side) plus a directed projection
//! used only for cycle detection. Secondary joins sit in a side table
//! keyed by (source, target, path name) and are substituted into steps
//! when a query activates them via `usePathNames`.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use crate::model::{JoinKind, SemanticModel};
use crate::semantic::error::{CompileError, CompileResult, ErrorCode};
use crate::sql::expr::{table_col, Expr, ExprExt};

/// Data carried on each primary edge (declared direction preserved).
#[derive(Debug, Clone)]
pub struct JoinEdgeInfo {
    pub source: String,
    pub target: String,
    pub source_columns: Vec<String>,
    pub target_columns: Vec<String>,
    pub kind: JoinKind,
    pub path_name: Option<String>,
}

/// One join emitted by the router, oriented in traversal order.
///
/// `reversed` means the underlying edge was declared in the opposite
/// direction: a many-to-one edge walked reversed enters the "many" side
/// and multiplies rows.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinStep {
    pub from_object: String,
    pub to_object: String,
    /// Column display names on the `from` side, traversal orientation.
    pub from_columns: Vec<String>,
    pub to_columns: Vec<String>,
    pub kind: JoinKind,
    pub reversed: bool,
    pub path_name: Option<String>,
}

impl JoinStep {
    /// Does walking this step multiply rows?
    pub fn causes_fanout(&self) -> bool {
        self.kind.causes_fanout(self.reversed)
    }
}

/// Active secondary-join overrides, keyed by (source, target).
pub type PathOverrides = HashMap<(String, String), String>;

/// Graph representation of a model's join topology.
#[derive(Debug, Clone)]
pub struct JoinGraph {
    graph: UnGraph<String, JoinEdgeInfo>,
    node_indices: HashMap<String, NodeIndex>,
    directed: DiGraph<String, ()>,
    directed_indices: HashMap<String, NodeIndex>,
    secondary: HashMap<(String, String, String), JoinEdgeInfo>,
}

impl JoinGraph {
    /// Build the graph from a model's data objects and joins.
    pub fn from_model(model: &SemanticModel) -> CompileResult<Self> {
        let mut graph = UnGraph::new_undirected();
        let mut node_indices = HashMap::new();
        let mut directed = DiGraph::new();
        let mut directed_indices = HashMap::new();

        for object in &model.data_objects {
            let idx = graph.add_node(object.name.clone());
            node_indices.insert(object.name.clone(), idx);
            let didx = directed.add_node(object.name.clone());
            directed_indices.insert(object.name.clone(), didx);
        }

        // Collect primary edges and sort them lexicographically so BFS
        // traversal order (and therefore emitted SQL) is stable.
        let mut primary: Vec<JoinEdgeInfo> = Vec::new();
        let mut secondary = HashMap::new();

        for object in &model.data_objects {
            for join in &object.joins {
                let info = JoinEdgeInfo {
                    source: object.name.clone(),
                    target: join.join_to.clone(),
                    source_columns: join.join_columns.clone(),
                    target_columns: join.target_columns.clone(),
                    kind: join.join_type,
                    path_name: join.path_name.clone(),
                };
                if !node_indices.contains_key(&join.join_to) {
                    return Err(CompileError::new(
                        ErrorCode::UnknownJoinTarget,
                        format!(
                            "Join on '{}' targets unknown data object '{}'",
                            object.name, join.join_to
                        ),
                    )
                    .with_related(&join.join_to));
                }
                if join.secondary {
                    let key = (
                        info.source.clone(),
                        info.target.clone(),
                        info.path_name.clone().unwrap_or_default(),
                    );
                    secondary.insert(key, info);
                } else {
                    primary.push(info);
                }
            }
        }

        primary.sort_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));

        for info in primary {
            let from = node_indices[&info.source];
            let to = node_indices[&info.target];
            directed.add_edge(
                directed_indices[&info.source],
                directed_indices[&info.target],
                (),
            );
            graph.add_edge(from, to, info);
        }

        Ok(Self {
            graph,
            node_indices,
            directed,
            directed_indices,
            secondary,
        })
    }

    fn node(&self, name: &str) -> CompileResult<NodeIndex> {
        self.node_indices
            .get(name)
            .copied()
            .ok_or_else(|| CompileError::unknown_data_object(name))
    }

    /// Find the shortest join path between two objects via BFS.
    ///
    /// Fails with `AMBIGUOUS_JOIN` when two distinct shortest paths reach
    /// the target. A direct edge is always strictly shorter than any
    /// alternative, so the canonical direct-edge exception falls out of
    /// shortest-path counting.
    pub fn find_path(
        &self,
        from: &str,
        to: &str,
        overrides: &PathOverrides,
    ) -> CompileResult<Vec<JoinStep>> {
        if from == to {
            return Ok(vec![]);
        }

        let from_idx = self.node(from)?;
        let to_idx = self.node(to)?;

        // BFS with parent pointers; `shortest_paths` counts distinct
        // minimum-length routes into each node for ambiguity detection.
        let mut dist: HashMap<NodeIndex, usize> = HashMap::new();
        let mut shortest_paths: HashMap<NodeIndex, usize> = HashMap::new();
        let mut parents: HashMap<NodeIndex, (NodeIndex, EdgeIndex)> = HashMap::new();
        let mut queue: VecDeque<NodeIndex> = VecDeque::new();

        dist.insert(from_idx, 0);
        shortest_paths.insert(from_idx, 1);
        queue.push_back(from_idx);

        while let Some(current) = queue.pop_front() {
            let current_dist = dist[&current];

            // Deterministic neighbor order: sort incident edges by the
            // (source, target) of their stored join declaration.
            let mut edges: Vec<_> = self.graph.edges(current).collect();
            edges.sort_by(|a, b| {
                let wa = a.weight();
                let wb = b.weight();
                (&wa.source, &wa.target).cmp(&(&wb.source, &wb.target))
            });

            for edge_ref in edges {
                let neighbor = edge_ref.target();
                match dist.get(&neighbor) {
                    None => {
                        dist.insert(neighbor, current_dist + 1);
                        shortest_paths.insert(neighbor, shortest_paths[&current]);
                        parents.insert(neighbor, (current, edge_ref.id()));
                        queue.push_back(neighbor);
                    }
                    Some(&d) if d == current_dist + 1 => {
                        *shortest_paths.entry(neighbor).or_insert(0) +=
                            shortest_paths[&current];
                    }
                    Some(_) => {}
                }
            }
        }

        if !dist.contains_key(&to_idx) {
            return Err(CompileError::no_path(from, to));
        }
        if shortest_paths.get(&to_idx).copied().unwrap_or(0) > 1 {
            return Err(CompileError::ambiguous_join(from, to));
        }

        // Reconstruct from parent pointers, then orient and apply overrides.
        let mut steps = Vec::new();
        let mut current = to_idx;
        while current != from_idx {
            let (parent, edge_idx) = parents[&current];
            let info = &self.graph[edge_idx];
            steps.push(self.orient_step(info, &self.graph[parent], overrides)?);
            current = parent;
        }
        steps.reverse();
        Ok(steps)
    }

    /// Orient an edge so the step runs from `from_name`, substituting an
    /// active secondary override when one targets this pair.
    fn orient_step(
        &self,
        info: &JoinEdgeInfo,
        from_name: &str,
        overrides: &PathOverrides,
    ) -> CompileResult<JoinStep> {
        let key = (info.source.clone(), info.target.clone());
        let effective = match overrides.get(&key) {
            Some(path_name) => {
                let skey = (info.source.clone(), info.target.clone(), path_name.clone());
                self.secondary.get(&skey).ok_or_else(|| {
                    CompileError::new(
                        ErrorCode::UnknownPathName,
                        format!(
                            "No secondary join '{}' between '{}' and '{}'",
                            path_name, info.source, info.target
                        ),
                    )
                    .with_related(path_name)
                })?
            }
            None => info,
        };

        let reversed = effective.source != from_name;
        let step = if reversed {
            JoinStep {
                from_object: effective.target.clone(),
                to_object: effective.source.clone(),
                from_columns: effective.target_columns.clone(),
                to_columns: effective.source_columns.clone(),
                kind: effective.kind,
                reversed: true,
                path_name: effective.path_name.clone(),
            }
        } else {
            JoinStep {
                from_object: effective.source.clone(),
                to_object: effective.target.clone(),
                from_columns: effective.source_columns.clone(),
                to_columns: effective.target_columns.clone(),
                kind: effective.kind,
                reversed: false,
                path_name: effective.path_name.clone(),
            }
        };
        Ok(step)
    }

    /// Compute a minimum-edge join tree connecting `base` to every target.
    ///
    /// Targets are routed in the order given; steps already emitted for an
    /// earlier target are not repeated.
    pub fn find_join_tree(
        &self,
        base: &str,
        targets: &[String],
        overrides: &PathOverrides,
    ) -> CompileResult<Vec<JoinStep>> {
        let mut steps: Vec<JoinStep> = Vec::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();

        for target in targets {
            if target == base {
                continue;
            }
            for step in self.find_path(base, target, overrides)? {
                let pair = (step.from_object.clone(), step.to_object.clone());
                if seen.insert(pair) {
                    steps.push(step);
                }
            }
        }

        Ok(steps)
    }

    /// Build the ON condition for a step: an AND chain equating each
    /// column pair, with display names mapped to physical codes.
    pub fn build_on_condition(step: &JoinStep, model: &SemanticModel) -> CompileResult<Expr> {
        let from_object = model
            .data_object(&step.from_object)
            .ok_or_else(|| CompileError::unknown_data_object(&step.from_object))?;
        let to_object = model
            .data_object(&step.to_object)
            .ok_or_else(|| CompileError::unknown_data_object(&step.to_object))?;

        let mut condition: Option<Expr> = None;
        for (from_col, to_col) in step.from_columns.iter().zip(&step.to_columns) {
            let from_code = &from_object
                .column(from_col)
                .ok_or_else(|| CompileError::unknown_column(&step.from_object, from_col))?
                .code;
            let to_code = &to_object
                .column(to_col)
                .ok_or_else(|| CompileError::unknown_column(&step.to_object, to_col))?
                .code;

            let pair = table_col(&step.from_object, from_code)
                .eq(table_col(&step.to_object, to_code));
            condition = Some(match condition {
                Some(existing) => existing.and(pair),
                None => pair,
            });
        }

        condition.ok_or_else(|| {
            CompileError::new(
                ErrorCode::InvalidModel,
                format!(
                    "Join from '{}' to '{}' declares no columns",
                    step.from_object, step.to_object
                ),
            )
        })
    }

    /// Detect a cycle in the directed projection of the primary joins.
    ///
    /// Returns the cycle as an object-name path when one exists.
    pub fn detect_cycle(&self) -> Option<Vec<String>> {
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut names: Vec<&String> = self.directed_indices.keys().collect();
        names.sort();

        for name in names {
            let start = self.directed_indices[name.as_str()];
            let mut path: Vec<NodeIndex> = Vec::new();
            if let Some(cycle) = self.cycle_dfs(start, &mut visited, &mut path) {
                return Some(cycle);
            }
        }
        None
    }

    fn cycle_dfs(
        &self,
        node: NodeIndex,
        visited: &mut HashSet<NodeIndex>,
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<String>> {
        if let Some(pos) = path.iter().position(|n| *n == node) {
            let mut cycle: Vec<String> =
                path[pos..].iter().map(|n| self.directed[*n].clone()).collect();
            cycle.push(self.directed[node].clone());
            return Some(cycle);
        }
        if visited.contains(&node) {
            return None;
        }
        visited.insert(node);
        path.push(node);

        let mut neighbors: Vec<NodeIndex> =
            self.directed.neighbors(node).collect();
        neighbors.sort_by(|a, b| self.directed[*a].cmp(&self.directed[*b]));
        for next in neighbors {
            if let Some(cycle) = self.cycle_dfs(next, visited, path) {
                return Some(cycle);
            }
        }

        path.pop();
        None
    }

    /// Enumerate all simple paths between two objects (bounded depth),
    /// used by the validator's diamond check.
    pub fn all_simple_paths(&self, from: &str, to: &str, max_depth: usize) -> Vec<Vec<JoinStep>> {
        let (Ok(from_idx), Ok(to_idx)) = (self.node(from), self.node(to)) else {
            return vec![];
        };

        let overrides = PathOverrides::new();
        let mut results = Vec::new();
        let mut stack: Vec<(NodeIndex, Vec<JoinStep>, HashSet<NodeIndex>)> = Vec::new();
        let mut initial_visited = HashSet::new();
        initial_visited.insert(from_idx);
        stack.push((from_idx, vec![], initial_visited));

        while let Some((current, path, visited)) = stack.pop() {
            if path.len() >= max_depth {
                continue;
            }
            for edge_ref in self.graph.edges(current) {
                let neighbor = edge_ref.target();
                if visited.contains(&neighbor) {
                    continue;
                }
                let step = match self.orient_step(
                    edge_ref.weight(),
                    &self.graph[current],
                    &overrides,
                ) {
                    Ok(step) => step,
                    Err(_) => continue,
                };
                let mut new_path = path.clone();
                new_path.push(step);
                if neighbor == to_idx {
                    results.push(new_path);
                } else {
                    let mut new_visited = visited.clone();
                    new_visited.insert(neighbor);
                    stack.push((neighbor, new_path, new_visited));
                }
            }
        }

        results
    }

    /// Object names, sorted, for pairwise sweeps.
    pub fn object_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.node_indices.keys().cloned().collect();
        names.sort();
        names
    }
}
