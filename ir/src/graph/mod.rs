//! Arena-owned node graph.
//!
//! Nodes live in an append-only arena and refer to their operands by
//! [`NodeId`]. Because an operand must exist before its consumer is built, every
//! edge points from a newer handle to an older one and the graph is acyclic by
//! construction. Unreachable nodes are reclaimed by [`Graph::collect_garbage`],
//! a mark-and-sweep pass run at graph-finalization boundaries.
//!
//! # Deduplication
//!
//! [`Graph::create_node`] hashes the candidate, looks up existing nodes with the
//! same structural hash and confirms equality field by field. On a match the
//! candidate is discarded and the canonical handle is returned.
//!
//! # Concurrency
//!
//! Construction takes `&mut self`. Finalized nodes are only read through `&self`
//! and never mutate, so a `Graph` can be shared between readers. Callers that
//! build one graph from several threads wrap it in a lock.

pub mod dedup;

use std::collections::HashSet;

use smallvec::SmallVec;
use snafu::{OptionExt, ResultExt, ensure};

use crate::config::GraphConfig;
use crate::error::*;
use crate::hash::HashValue;
use crate::infer::{ShapeInference, StandardShapeInference};
use crate::node::{self, Node, NodeId, Output};
use crate::op::{Metadata, OpKind};
use crate::shape::Shape;

pub use dedup::CacheStats;

pub struct Graph {
    slots: Vec<Option<Node>>,
    cache: dedup::DedupCache,
    inference: Box<dyn ShapeInference>,
    config: GraphConfig,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.slots.len())
            .field("live", &self.live_count())
            .field("config", &self.config)
            .finish()
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    pub fn with_config(config: GraphConfig) -> Self {
        Self::with_inference(config, StandardShapeInference)
    }

    pub fn with_inference<I: ShapeInference + 'static>(config: GraphConfig, inference: I) -> Self {
        Self { slots: Vec::new(), cache: dedup::DedupCache::default(), inference: Box::new(inference), config }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Build a node, or return the canonical instance of an equal one.
    ///
    /// Output shapes come from the shape-inference collaborator. On failure the
    /// graph is left untouched.
    pub fn create_node<I>(&mut self, op: OpKind, operands: I, metadata: Metadata) -> Result<NodeId>
    where
        I: IntoIterator<Item = Output>,
    {
        self.insert(op, operands.into_iter().collect(), metadata)
    }

    /// Rebuild `id` over `new_operands`, keeping its opcode and metadata.
    ///
    /// Shapes and the structural hash are recomputed from the new operands; the
    /// original node is not modified.
    pub fn clone_node<I>(&mut self, id: NodeId, new_operands: I) -> Result<NodeId>
    where
        I: IntoIterator<Item = Output>,
    {
        let original = self.node(id)?;
        let operands: SmallVec<[Output; 4]> = new_operands.into_iter().collect();
        ensure!(
            operands.len() == original.operands.len(),
            OperandArityMismatchSnafu {
                op: original.op.clone(),
                expected: original.operands.len(),
                actual: operands.len()
            }
        );
        let (op, metadata) = (original.op.clone(), original.metadata.clone());
        self.insert(op, operands, metadata)
    }

    fn insert(&mut self, op: OpKind, operands: SmallVec<[Output; 4]>, metadata: Metadata) -> Result<NodeId> {
        let mut operand_hashes: SmallVec<[HashValue; 4]> = SmallVec::with_capacity(operands.len());
        // Operand shapes borrow the arena; they must be gone before it is touched mutably.
        let shapes = {
            let mut operand_shapes: SmallVec<[&Shape; 4]> = SmallVec::with_capacity(operands.len());
            for operand in &operands {
                let producer = self.node(operand.node)?;
                let shape = producer.output_shape(operand.index).context(OutputIndexOutOfRangeSnafu {
                    id: operand.node,
                    index: operand.index,
                    num_outputs: producer.num_outputs(),
                })?;
                operand_shapes.push(shape);
                operand_hashes.push(node::operand_hash(producer.hash, operand.index));
            }

            self.inference
                .infer(&op, &operand_shapes, &metadata)
                .and_then(|shapes| if shapes.is_empty() { NoOutputsSnafu.fail() } else { Ok(shapes) })
                .context(ShapeInferenceSnafu { op: op.clone() })?
        };
        let hash = node::structural_hash(&op, &metadata, &shapes, &operand_hashes);

        if self.config.dedup {
            let slots = &self.slots;
            let existing = self.cache.find(hash, |candidate| {
                slots[candidate.0]
                    .as_ref()
                    .is_some_and(|n| n.matches(&op, &metadata, &shapes, &operand_hashes, &operands))
            });
            if let Some(existing) = existing {
                tracing::trace!(node.id = %existing, op = %op, "dedup hit");
                return Ok(existing);
            }
        }

        let id = NodeId(self.slots.len());
        let node = Node { id, op, operands, operand_hashes, metadata, shapes, hash };
        tracing::trace!(node.id = %id, node = %node, "created node");
        self.slots.push(Some(node));
        self.cache.insert(hash, id);

        if self.config.verify {
            self.verify_node(id)?;
        }
        Ok(id)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.slots.get(id.0).and_then(Option::as_ref).context(DanglingNodeSnafu { id })
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_ok()
    }

    /// Checked operand edge reading output `index` of `id`.
    pub fn output(&self, id: NodeId, index: usize) -> Result<Output> {
        let node = self.node(id)?;
        ensure!(
            index < node.num_outputs(),
            OutputIndexOutOfRangeSnafu { id, index, num_outputs: node.num_outputs() }
        );
        Ok(Output::new(id, index))
    }

    /// Operand edge for a single-output node.
    ///
    /// Fails on multi-output nodes, which must be read through [`Graph::output`].
    pub fn single(&self, id: NodeId) -> Result<Output> {
        let node = self.node(id)?;
        ensure!(node.num_outputs() == 1, AmbiguousOutputSnafu { id, num_outputs: node.num_outputs() });
        Ok(Output::new(id, 0))
    }

    /// Diagnostic rendering of one node: shapes, opcode, operand handles, metadata.
    pub fn node_to_string(&self, id: NodeId) -> Result<String> {
        Ok(self.node(id)?.to_string())
    }

    /// Total number of handles ever allocated.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Post-order of everything reachable from `roots`: operands precede consumers.
    pub fn toposort(&self, roots: &[NodeId]) -> Result<Vec<NodeId>> {
        let mut visited = HashSet::new();
        let mut result = Vec::new();
        let mut stack: Vec<(NodeId, bool)> = roots.iter().rev().map(|&id| (id, false)).collect();

        while let Some((id, processed)) = stack.pop() {
            if visited.contains(&id) {
                continue;
            }

            if processed {
                visited.insert(id);
                result.push(id);
            } else {
                let node = self.node(id)?;
                stack.push((id, true));
                for operand in node.operands.iter().rev() {
                    if !visited.contains(&operand.node) {
                        stack.push((operand.node, false));
                    }
                }
            }
        }

        Ok(result)
    }

    /// Free every node not reachable from `roots`. Returns the number freed.
    ///
    /// Collected handles become dangling and are never handed out again.
    pub fn collect_garbage(&mut self, roots: &[NodeId]) -> Result<usize> {
        let live: HashSet<NodeId> = self.toposort(roots)?.into_iter().collect();

        let mut freed = 0;
        for slot in &mut self.slots {
            if let Some(node) = slot.as_ref()
                && !live.contains(&node.id)
            {
                self.cache.remove(node.hash, node.id);
                *slot = None;
                freed += 1;
            }
        }

        tracing::debug!(freed, live = live.len(), "collected unreachable nodes");
        Ok(freed)
    }

    /// Check every live node's operand edges.
    pub fn verify(&self) -> Result<()> {
        self.nodes().try_for_each(|node| self.verify_node(node.id))
    }

    fn verify_node(&self, id: NodeId) -> Result<()> {
        let node = self.node(id)?;
        for operand in &node.operands {
            ensure!(operand.node < id, CycleDetectedSnafu { id, operand: operand.node });
            self.output(operand.node, operand.index)?;
        }
        Ok(())
    }

    /// Compact ASCII tree of `root`; shared operands are printed once.
    pub fn tree(&self, root: NodeId) -> Result<String> {
        crate::tree::render_tree(self, root)
    }

    /// One line per reachable node, in topological order.
    pub fn dump(&self, roots: &[NodeId]) -> Result<String> {
        use std::fmt::Write;

        let mut out = String::new();
        for id in self.toposort(roots)? {
            let _ = writeln!(out, "{id} = {}", self.node(id)?);
        }
        Ok(out)
    }
}
