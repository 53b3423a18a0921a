//! Call-graph construction from a stack-trace dump.
//!
//! The converter makes one pass over the input lines, pairing each
//! file-location record with the call record that follows it into a graph
//! node, then serializes the node chain as Graphviz DOT or as JSON records.
//!
//! # Example
//!
//! ```no_run
//! use stackgraph::graph::GraphConverter;
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! let input = BufReader::new(File::open("stack.txt").unwrap());
//!
//! let mut converter = GraphConverter::new();
//! converter.parse(input).unwrap();
//!
//! let mut dot = Vec::new();
//! converter.write_dot(&mut dot, None).unwrap();
//! ```

use crate::trace::{StackCall, StackFrame};
use serde::Serialize;
use std::io::{BufRead, BufReader, Read, Write};
use thiserror::Error;

/// Errors that can occur while building a call graph from a dump.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed frame record at line {line}: {content}")]
    MalformedFrame { line: usize, content: String },

    #[error("malformed call record at line {line}: {content}")]
    MalformedCall { line: usize, content: String },

    #[error("call record with no preceding frame record at line {line}: {content}")]
    UnpairedCall { line: usize, content: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for graph conversion operations.
pub type Result<T> = std::result::Result<T, ConvertError>;

/// One node of the call graph: a file location fused with the call made
/// there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
}

#[derive(Serialize)]
struct EdgeRecord<'a> {
    from: &'a str,
    to: &'a str,
}

/// Converter from a stack-trace dump to a call-graph description.
pub struct GraphConverter {
    nodes: Vec<GraphNode>,
}

impl GraphConverter {
    /// Create a new converter.
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Parse a stack-trace dump from a reader.
    ///
    /// Lines alternate between frame and call records by raw line index:
    /// frame records on even indices, call records on odd. Blank lines are
    /// skipped but still count toward the index, so a stray blank shifts the
    /// role of every following line. Any record that fails its grammar
    /// aborts the whole build with the offending line index and content.
    pub fn parse<R: Read>(&mut self, reader: R) -> Result<()> {
        let buf_reader = BufReader::new(reader);
        let mut pending: Option<StackFrame> = None;

        for (index, line_result) in buf_reader.lines().enumerate() {
            let line = line_result?;
            if line.is_empty() {
                continue;
            }

            if index % 2 == 0 {
                match StackFrame::parse(&line) {
                    Some(frame) => pending = Some(frame),
                    None => {
                        return Err(ConvertError::MalformedFrame {
                            line: index,
                            content: line,
                        });
                    }
                }
            } else {
                let call = StackCall::parse(&line).ok_or_else(|| ConvertError::MalformedCall {
                    line: index,
                    content: line.clone(),
                })?;
                let frame = pending.as_ref().ok_or_else(|| ConvertError::UnpairedCall {
                    line: index,
                    content: line.clone(),
                })?;

                let id = format!("N{}", self.nodes.len());
                let label = node_label(frame, &call);
                self.nodes.push(GraphNode { id, label });
            }
        }

        // A trailing frame record with no call record after it is dropped
        // rather than reported.
        Ok(())
    }

    /// Nodes in input order.
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Edges as `(predecessor, successor)` pairs in node order.
    pub fn edges(&self) -> impl Iterator<Item = (&GraphNode, &GraphNode)> {
        self.nodes.windows(2).map(|pair| (&pair[0], &pair[1]))
    }

    /// Write the graph as a Graphviz DOT description.
    ///
    /// Nodes render as boxes labelled with the file location over the
    /// caller; edges carry `dir=back` so the arrowhead points from each
    /// frame to the frame discovered before it, putting the outermost frame
    /// at the origin of the rendered chain. Title and labels are substituted
    /// verbatim; Graphviz metacharacters in them pass through unescaped.
    pub fn write_dot<W: Write>(&self, mut writer: W, title: Option<&str>) -> Result<()> {
        writeln!(writer, "digraph {{")?;
        if let Some(title) = title.filter(|t| !t.is_empty()) {
            writeln!(writer, "\tlabelloc=\"t\"")?;
            writeln!(writer, "\tlabel=\"{}\"", title)?;
        }
        for node in &self.nodes {
            writeln!(writer, "\t{} [label=\"{}\",shape=box];", node.id, node.label)?;
        }
        for (prev, curr) in self.edges() {
            writeln!(writer, "\t{} -> {} [weight=1,dir=back];", prev.id, curr.id)?;
        }
        writeln!(writer, "}}")?;
        Ok(())
    }

    /// Write the graph as JSON records, one object per line.
    ///
    /// Each record carries a `type` field: `"node"` records hold `id` and
    /// `label`, `"edge"` records hold `from` and `to`. Records appear in
    /// node order, nodes before edges.
    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<()> {
        for node in &self.nodes {
            self.write_record(&mut writer, "node", node)?;
        }
        for (prev, curr) in self.edges() {
            let edge = EdgeRecord {
                from: &prev.id,
                to: &curr.id,
            };
            self.write_record(&mut writer, "edge", &edge)?;
        }
        Ok(())
    }

    fn write_record<W: Write, T: Serialize>(
        &self,
        writer: &mut W,
        record_type: &str,
        data: &T,
    ) -> Result<()> {
        let mut value = serde_json::to_value(data)?;
        if let serde_json::Value::Object(ref mut obj) = value {
            obj.insert(
                "type".to_string(),
                serde_json::Value::String(record_type.to_string()),
            );
        }
        writeln!(writer, "{}", serde_json::to_string(&value)?)?;
        Ok(())
    }
}

/// Build the display label for a node: the file location over the caller,
/// with the directory reduced to the last segment of the file's parent.
fn node_label(frame: &StackFrame, call: &StackCall) -> String {
    let (dirs, file) = split_last_slash(&frame.path);
    let (_, dir) = split_last_slash(dirs.trim_end_matches(['/', '\\']));
    format!("{}/{}:{}\n{}", dir, file, frame.line, call.caller())
}

/// Split a path at its final `/`, keeping the separator on the left half.
fn split_last_slash(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(idx) => path.split_at(idx + 1),
        None => ("", path),
    }
}
