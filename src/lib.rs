//! Stack-trace dumps rendered as call graphs.
//!
//! This crate parses textual stack-trace dumps and converts them to a
//! directed call-graph description for the Graphviz `dot` renderer.
//!
//! A dump alternates file-location lines with call lines:
//!
//! ```text
//! /src/server/handler.go:212 (0x4bb1a0)
//! (Server).handleConn: readRequest
//! /src/server/request.go:88 (0x4b9f37)
//! readRequest: parseHeader
//! ```
//!
//! Each pair fuses into one graph node. Consecutive nodes are chained with
//! reverse-arrow edges, so the first frame in the dump (the innermost call)
//! renders as the target of the chain and the outermost frame as its origin.
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
//! converter.write_dot(&mut dot, Some("crash in handler")).unwrap();
//! ```

pub mod graph;
pub mod render;
pub mod trace;
