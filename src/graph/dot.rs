//! Graph sink trait and DOT (Graphviz) writer.
//!
//! The exporter talks to a [`GraphSink`] so that downstream collaborators
//! can serialize to whatever graph-description format they want; the
//! [`DotWriter`] provided here emits a plain digraph renderable with
//! `dot -Tpng graph.dot -o graph.png`.

use std::io::Write;

use crate::error::Result;
use crate::ir::OpId;

/// Receiver for serialized graph nodes and edges
pub trait GraphSink {
    /// Start a graph with the given name
    fn begin(&mut self, name: &str) -> Result<()>;
    /// Emit one node; `annotation` carries the access classification for
    /// root nodes
    fn node(&mut self, id: OpId, label: &str, annotation: Option<&str>) -> Result<()>;
    /// Emit one directed edge from definer to user
    fn edge(&mut self, from: OpId, to: OpId) -> Result<()>;
    /// Finish the graph
    fn finish(&mut self) -> Result<()>;
}

/// Configuration options for DOT output
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Shape for ordinary nodes (default: "box")
    pub node_shape: &'static str,
    /// Shape for the annotated root node (default: "doubleoctagon")
    pub root_shape: &'static str,
    /// Layout direction (default: "TB")
    pub rankdir: &'static str,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            node_shape: "box",
            root_shape: "doubleoctagon",
            rankdir: "TB",
        }
    }
}

/// [`GraphSink`] writing Graphviz DOT
pub struct DotWriter<W: Write> {
    out: W,
    config: DotConfig,
}

impl<W: Write> DotWriter<W> {
    /// Create a writer with default configuration
    pub fn new(out: W) -> Self {
        Self::with_config(out, DotConfig::default())
    }

    /// Create a writer with explicit configuration
    pub fn with_config(out: W, config: DotConfig) -> Self {
        Self { out, config }
    }

    /// Consume the writer, returning the underlying output
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> GraphSink for DotWriter<W> {
    fn begin(&mut self, name: &str) -> Result<()> {
        writeln!(self.out, "digraph \"{}\" {{", escape(name))?;
        writeln!(self.out, "  rankdir={};", self.config.rankdir)?;
        writeln!(self.out, "  node [shape={}];", self.config.node_shape)?;
        Ok(())
    }

    fn node(&mut self, id: OpId, label: &str, annotation: Option<&str>) -> Result<()> {
        match annotation {
            Some(kind) => writeln!(
                self.out,
                "  n{} [label=\"{}\\n{}\", shape={}];",
                id,
                escape(label),
                escape(kind),
                self.config.root_shape
            )?,
            None => writeln!(self.out, "  n{} [label=\"{}\"];", id, escape(label))?,
        }
        Ok(())
    }

    fn edge(&mut self, from: OpId, to: OpId) -> Result<()> {
        writeln!(self.out, "  n{from} -> n{to};")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        writeln!(self.out, "}}")?;
        self.out.flush()?;
        Ok(())
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
