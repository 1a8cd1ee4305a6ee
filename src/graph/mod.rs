//! # Data-Flow Graph Export
//!
//! Builds the forward def-use subgraph rooted at a memory access (the
//! inverse of the closure's backward walk) and hands it to a pluggable
//! graph sink for serialization. Also computes the opcode-frequency
//! histogram used in reports. Pure reporting: nothing here feeds back into
//! the analysis.

pub mod dot;

use std::collections::{BTreeMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::analysis::closure::AccessKind;
use crate::analysis::def_use::DefUseIndex;
use crate::error::Result;
use crate::ir::{Function, OpId, Opcode};

pub use dot::{DotConfig, DotWriter, GraphSink};

/// Forward def-use subgraph rooted at one access
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataFlowGraph {
    /// The memory access the BFS started from
    pub root: OpId,
    /// Definer → users adjacency, keyed by operation id
    pub adjacency: BTreeMap<OpId, Vec<OpId>>,
}

impl DataFlowGraph {
    /// Total node count
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Total edge count
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }
}

/// Builder and serializer for per-access def-use subgraphs
pub struct DataFlowGraphExporter<'a> {
    function: &'a Function,
    index: &'a DefUseIndex,
}

impl<'a> DataFlowGraphExporter<'a> {
    /// Create an exporter over one function scope
    pub fn new(function: &'a Function, index: &'a DefUseIndex) -> Self {
        Self { function, index }
    }

    /// Forward BFS over user edges from `root`
    pub fn build(&self, root: OpId) -> DataFlowGraph {
        let mut adjacency: BTreeMap<OpId, Vec<OpId>> = BTreeMap::new();
        let mut queue: VecDeque<OpId> = VecDeque::new();
        let mut seen: HashSet<OpId> = HashSet::new();
        queue.push_back(root);
        seen.insert(root);

        while let Some(id) = queue.pop_front() {
            let op = self.function.op(id);
            let users: Vec<OpId> = match &op.name {
                Some(name) => self.index.users(name).to_vec(),
                None => Vec::new(),
            };
            for &user in &users {
                if seen.insert(user) {
                    queue.push_back(user);
                }
            }
            adjacency.insert(id, users);
        }
        DataFlowGraph { root, adjacency }
    }

    /// Serialize a graph through a sink
    ///
    /// The root node's label carries the access's minimum stride-run size
    /// when available (`"<opcode>;<run>"`), and the access classification is
    /// attached to the root as an annotation.
    pub fn export<S: GraphSink>(
        &self,
        graph: &DataFlowGraph,
        sink: &mut S,
        kind: Option<AccessKind>,
        min_run: Option<usize>,
    ) -> Result<()> {
        sink.begin(&self.function.name)?;
        for (&id, users) in &graph.adjacency {
            let op = self.function.op(id);
            let label = if id == graph.root {
                match min_run {
                    Some(run) => format!("{};{}", op.opcode.mnemonic(), run),
                    None => op.opcode.mnemonic().to_string(),
                }
            } else {
                op.opcode.mnemonic().to_string()
            };
            let annotation = (id == graph.root).then(|| kind).flatten();
            sink.node(id, &label, annotation.map(|k| k.to_string()).as_deref())?;
            for &user in users {
                sink.edge(id, user)?;
            }
        }
        sink.finish()
    }

    /// Opcode-frequency histogram of a graph
    ///
    /// Call operations are specialized by callee name when available
    /// (`"call:<callee>"`).
    pub fn opcode_histogram(&self, graph: &DataFlowGraph) -> BTreeMap<String, usize> {
        let mut histogram: BTreeMap<String, usize> = BTreeMap::new();
        for &id in graph.adjacency.keys() {
            let op = self.function.op(id);
            let key = match (&op.opcode, &op.callee) {
                (Opcode::Call, Some(callee)) => format!("call:{callee}"),
                (opcode, _) => opcode.mnemonic().to_string(),
            };
            *histogram.entry(key).or_insert(0) += 1;
        }
        histogram
    }
}
