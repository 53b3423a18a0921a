//! Record grammars for stack-trace dumps.
//!
//! A dump is a sequence of alternating lines: a file-location line of the
//! form `<path>:<line> (0x<address>)`, followed by a call line of the form
//! `(<type>).<func>: <callee>` or `<func>: <callee>`. This module parses the
//! two line forms; pairing them into graph nodes happens in [`crate::graph`].

use std::ops::Range;

/// A parsed file-location record.
///
/// `path` is empty when the location names a bare file with no directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub path: String,
    pub line: u32,
    pub address: u64,
}

/// Byte ranges of one location's captures within a line.
struct Location {
    path: Range<usize>,
    line: Range<usize>,
    address: Range<usize>,
    end: usize,
}

impl StackFrame {
    /// Parse a file-location line.
    ///
    /// The location may sit anywhere in the line, but a line containing more
    /// than one location is rejected. Returns `None` when the line does not
    /// contain exactly one location or when a numeric field fails to parse.
    pub fn parse(s: &str) -> Option<StackFrame> {
        let first = Self::find_location(s, 0)?;
        if Self::find_location(s, first.end).is_some() {
            return None;
        }
        let Location { path, line, address, .. } = first;
        Some(StackFrame {
            path: s[path].to_string(),
            line: s[line].parse().ok()?,
            address: u64::from_str_radix(&s[address], 16).ok()?,
        })
    }

    /// Find the leftmost location at or after `from`.
    ///
    /// The path capture must start with `/` or be empty, and is greedy: it
    /// runs to the last `:` whose tail still completes the location.
    fn find_location(s: &str, from: usize) -> Option<Location> {
        let bytes = s.as_bytes();
        for start in from..bytes.len() {
            match bytes[start] {
                b'/' => {
                    let mut last = None;
                    for colon in start + 1..bytes.len() {
                        if bytes[colon] == b':' {
                            if let Some((line, address, end)) = Self::location_tail(bytes, colon) {
                                last = Some(Location { path: start..colon, line, address, end });
                            }
                        }
                    }
                    if last.is_some() {
                        return last;
                    }
                }
                b':' => {
                    if let Some((line, address, end)) = Self::location_tail(bytes, start) {
                        return Some(Location { path: start..start, line, address, end });
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Match `:<digits> (0x<hex>)` at the `:` at `colon`, returning the digit
    /// and hex capture ranges and the offset past the closing parenthesis.
    /// The digit run may be empty; the hex run may not.
    fn location_tail(bytes: &[u8], colon: usize) -> Option<(Range<usize>, Range<usize>, usize)> {
        let mut i = colon + 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        let line = colon + 1..i;
        if !bytes[i..].starts_with(b" (0x") {
            return None;
        }
        let hex_start = i + 4;
        let mut j = hex_start;
        while j < bytes.len() && bytes[j].is_ascii_hexdigit() {
            j += 1;
        }
        if j == hex_start || bytes.get(j) != Some(&b')') {
            return None;
        }
        Some((line, hex_start..j, j + 1))
    }
}

/// A parsed caller/callee record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackCall {
    pub caller_type: Option<String>,
    pub caller_func: String,
    pub callee: String,
}

impl StackCall {
    /// Parse a call line. The method form is tried before the free-function
    /// form; a line matching neither is rejected.
    pub fn parse(s: &str) -> Option<StackCall> {
        Self::parse_method(s).or_else(|| Self::parse_free(s))
    }

    /// Method form: `(<type>).<func>: <callee>`.
    ///
    /// The receiver type runs from the first `(` to the last `).` still
    /// followed by a `": "`; the function runs to the last `": "` after
    /// that. The type may be empty.
    fn parse_method(s: &str) -> Option<StackCall> {
        let open = s.find('(')?;
        let mut close = None;
        let mut search = open + 1;
        while let Some(found) = s[search..].find(").") {
            let pos = search + found;
            if s[pos + 2..].contains(": ") {
                close = Some(pos);
            }
            search = pos + 1;
        }
        let close = close?;
        let func_start = close + 2;
        let colon = func_start + s[func_start..].rfind(": ")?;
        Some(StackCall {
            caller_type: Some(s[open + 1..close].to_string()),
            caller_func: s[func_start..colon].to_string(),
            callee: s[colon + 2..].to_string(),
        })
    }

    /// Free-function form: `<func>: <callee>`, leading spaces ignored. The
    /// function runs to the last `": "` in the line.
    fn parse_free(s: &str) -> Option<StackCall> {
        let body = s.trim_start_matches(' ');
        let colon = body.rfind(": ")?;
        Some(StackCall {
            caller_type: None,
            caller_func: body[..colon].to_string(),
            callee: body[colon + 2..].to_string(),
        })
    }

    /// Display form of the caller: `<type>.<func>` for method calls, the
    /// bare function name otherwise.
    pub fn caller(&self) -> String {
        match &self.caller_type {
            Some(t) if !t.is_empty() => format!("{}.{}", t, self.caller_func),
            _ => self.caller_func.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_frame_with_directory_path() {
        let frame = StackFrame::parse("/a/b/c.go:10 (0x4bb1a0)").unwrap();

        assert_eq!(frame.path, "/a/b/c.go");
        assert_eq!(frame.line, 10);
        assert_eq!(frame.address, 0x4bb1a0);
    }

    #[test]
    fn parse_frame_bare_filename_has_empty_path() {
        // `c.go` carries no leading slash, so only the `:line (0xaddr)` tail
        // is captured and the path comes back empty.
        let frame = StackFrame::parse("c.go:10 (0x1)").unwrap();

        assert_eq!(frame.path, "");
        assert_eq!(frame.line, 10);
        assert_eq!(frame.address, 1);
    }

    #[test]
    fn parse_frame_relative_prefix_is_dropped() {
        // The path capture starts at the first slash.
        let frame = StackFrame::parse("foo/a.go:1 (0x2)").unwrap();

        assert_eq!(frame.path, "/a.go");
        assert_eq!(frame.line, 1);
    }

    #[test]
    fn parse_frame_greedy_path_takes_last_location_tail() {
        let frame = StackFrame::parse("/a/b:1 (0x1):2 (0x2)").unwrap();

        assert_eq!(frame.path, "/a/b:1 (0x1)");
        assert_eq!(frame.line, 2);
        assert_eq!(frame.address, 2);
    }

    #[test]
    fn parse_frame_trailing_text_ignored() {
        let frame = StackFrame::parse("/a.go:1 (0x2) extra").unwrap();

        assert_eq!(frame.path, "/a.go");
        assert_eq!(frame.address, 2);
    }

    #[test]
    fn parse_frame_rejects_two_locations() {
        assert!(StackFrame::parse("a:1 (0x1) b:2 (0x2)").is_none());
    }

    #[test]
    fn parse_frame_requires_line_number() {
        // Syntactically a location, but the empty digit run fails numeric
        // parsing.
        assert!(StackFrame::parse("/a/b.go: (0x1)").is_none());
    }

    #[test]
    fn parse_frame_rejects_garbage() {
        assert!(StackFrame::parse("bad-line").is_none());
        assert!(StackFrame::parse("").is_none());
        assert!(StackFrame::parse("/a/b/c.go:10").is_none());
    }

    #[test]
    fn parse_frame_hex_address_mixed_case() {
        let frame = StackFrame::parse("/x.c:3 (0xDeadBEEF)").unwrap();

        assert_eq!(frame.address, 0xdead_beef);
    }

    #[test]
    fn parse_call_method_form() {
        let call = StackCall::parse("(T).F: G").unwrap();

        assert_eq!(call.caller_type.as_deref(), Some("T"));
        assert_eq!(call.caller_func, "F");
        assert_eq!(call.callee, "G");
        assert_eq!(call.caller(), "T.F");
    }

    #[test]
    fn parse_call_free_form() {
        let call = StackCall::parse("H: I").unwrap();

        assert_eq!(call.caller_type, None);
        assert_eq!(call.caller_func, "H");
        assert_eq!(call.callee, "I");
        assert_eq!(call.caller(), "H");
    }

    #[test]
    fn parse_call_free_form_strips_leading_spaces() {
        let call = StackCall::parse("   runtime.goexit: main.main").unwrap();

        assert_eq!(call.caller_func, "runtime.goexit");
        assert_eq!(call.callee, "main.main");
    }

    #[test]
    fn parse_call_empty_receiver_type() {
        let call = StackCall::parse("().init: doInit").unwrap();

        assert_eq!(call.caller_type.as_deref(), Some(""));
        // An empty type does not contribute to the display form.
        assert_eq!(call.caller(), "init");
    }

    #[test]
    fn parse_call_parenthesized_free_function() {
        // Parentheses without a `).` separator fall through to the
        // free-function form.
        let call = StackCall::parse("func(x): y").unwrap();

        assert_eq!(call.caller_type, None);
        assert_eq!(call.caller_func, "func(x)");
        assert_eq!(call.callee, "y");
    }

    #[test]
    fn parse_call_last_separator_wins() {
        let call = StackCall::parse("start: middle: end").unwrap();

        assert_eq!(call.caller_func, "start: middle");
        assert_eq!(call.callee, "end");
    }

    #[test]
    fn parse_call_method_func_may_contain_dots() {
        let call = StackCall::parse("(T).a.b: c").unwrap();

        assert_eq!(call.caller_type.as_deref(), Some("T"));
        assert_eq!(call.caller_func, "a.b");
        assert_eq!(call.caller(), "T.a.b");
    }

    #[test]
    fn parse_call_requires_space_after_colon() {
        assert!(StackCall::parse("H:I").is_none());
        assert!(StackCall::parse("no-colon-here").is_none());
    }

    #[test]
    fn parse_call_empty_callee() {
        let call = StackCall::parse("H: ").unwrap();

        assert_eq!(call.caller_func, "H");
        assert_eq!(call.callee, "");
    }
}
