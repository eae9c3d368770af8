//! Decoder for the text trace document.
//!
//! The counterpart of the writer, used by tests and offline tools to
//! reconstruct the call sequence. Strict about framing: exactly one header,
//! one trailer, and well-formed call blocks in between.

use crate::models::error::CaptureError;
use crate::models::value::unescape;

/// A decoded parameter entry: name, type tag, and the literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedParam {
    pub name: String,
    pub type_tag: String,
    pub literal: String,
}

/// A decoded call block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCall {
    pub no: u64,
    pub name: String,
    pub args: Vec<ParsedParam>,
    pub outs: Vec<ParsedParam>,
    pub ret: Option<ParsedParam>,
}

/// A fully decoded trace document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceDocument {
    pub version: u32,
    pub calls: Vec<ParsedCall>,
}

impl TraceDocument {
    /// Parse a complete document from its serialized bytes.
    pub fn parse(data: &[u8]) -> Result<Self, CaptureError> {
        let text = std::str::from_utf8(data)
            .map_err(|e| CaptureError::MalformedTrace(format!("not utf-8: {e}")))?;
        let mut lines = text.lines();

        let header = lines
            .next()
            .ok_or_else(|| CaptureError::MalformedTrace("empty document".into()))?;
        let version = attr(header, "version")
            .filter(|_| header.starts_with("<trace "))
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| CaptureError::MalformedTrace(format!("bad header: {header}")))?;

        let mut calls = Vec::new();
        let mut saw_trailer = false;
        while let Some(line) = lines.next() {
            if line == "</trace>" {
                saw_trailer = true;
                break;
            }
            calls.push(parse_call(line, &mut lines)?);
        }
        if !saw_trailer {
            return Err(CaptureError::MalformedTrace("missing trailer".into()));
        }
        if let Some(extra) = lines.next() {
            return Err(CaptureError::MalformedTrace(format!(
                "content after trailer: {extra}"
            )));
        }

        Ok(Self { version, calls })
    }
}

fn parse_call<'a>(
    open: &str,
    lines: &mut impl Iterator<Item = &'a str>,
) -> Result<ParsedCall, CaptureError> {
    if !open.starts_with("<call ") {
        return Err(CaptureError::MalformedTrace(format!(
            "expected call block, got: {open}"
        )));
    }
    let no = attr(open, "no")
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| CaptureError::MalformedTrace(format!("call without number: {open}")))?;
    let name = attr(open, "name")
        .map(|n| unescape(&n))
        .ok_or_else(|| CaptureError::MalformedTrace(format!("call without name: {open}")))?;

    let mut call = ParsedCall {
        no,
        name,
        args: Vec::new(),
        outs: Vec::new(),
        ret: None,
    };

    for line in lines {
        if line == "</call>" {
            return Ok(call);
        }
        if let Some(param) = parse_entry(line, "arg")? {
            call.args.push(param);
        } else if let Some(param) = parse_entry(line, "out")? {
            call.outs.push(param);
        } else if let Some(param) = parse_entry(line, "ret")? {
            if call.ret.is_some() {
                return Err(CaptureError::MalformedTrace(format!(
                    "call {} has two return values",
                    call.no
                )));
            }
            call.ret = Some(param);
        } else {
            return Err(CaptureError::MalformedTrace(format!(
                "unexpected line in call {}: {line}",
                call.no
            )));
        }
    }

    Err(CaptureError::MalformedTrace(format!(
        "call {} is not closed",
        call.no
    )))
}

/// Parse one `<kind ...>literal</kind>` entry, or `None` if the line opens a
/// different tag.
fn parse_entry(line: &str, kind: &str) -> Result<Option<ParsedParam>, CaptureError> {
    let open = format!("<{kind} ");
    let open_ret = format!("<{kind} type=");
    if !line.starts_with(open.as_str()) && !line.starts_with(open_ret.as_str()) {
        return Ok(None);
    }
    let close = format!("</{kind}>");
    let body_end = line
        .strip_suffix(close.as_str())
        .ok_or_else(|| CaptureError::MalformedTrace(format!("unterminated entry: {line}")))?;
    let gt = body_end
        .find('>')
        .ok_or_else(|| CaptureError::MalformedTrace(format!("malformed entry: {line}")))?;
    let (head, literal) = body_end.split_at(gt + 1);

    let type_tag = attr(head, "type")
        .ok_or_else(|| CaptureError::MalformedTrace(format!("entry without type: {line}")))?;
    let name = attr(head, "name").map(|n| unescape(&n)).unwrap_or_default();

    Ok(Some(ParsedParam {
        name,
        type_tag,
        literal: unescape(literal),
    }))
}

/// Extract a `key="value"` attribute out of a tag line.
fn attr(line: &str, key: &str) -> Option<String> {
    let marker = format!("{key}=\"");
    let start = line.find(&marker)? + marker.len();
    let rest = &line[start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "<trace version=\"1\">\n\
        <call no=\"1\" name=\"Direct3DCreate8\">\n\
        <arg name=\"SDKVersion\" type=\"uint\">220</arg>\n\
        <ret type=\"handle\">0x1</ret>\n\
        </call>\n\
        <call no=\"2\" name=\"IDirect3D8::GetAdapterCount\">\n\
        <arg name=\"this\" type=\"handle\">0x1</arg>\n\
        <ret type=\"uint\">1</ret>\n\
        </call>\n\
        </trace>\n";

    #[test]
    fn parses_well_formed_document() {
        let doc = TraceDocument::parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(doc.version, 1);
        assert_eq!(doc.calls.len(), 2);
        assert_eq!(doc.calls[0].name, "Direct3DCreate8");
        assert_eq!(doc.calls[0].args[0].name, "SDKVersion");
        assert_eq!(doc.calls[0].args[0].literal, "220");
        assert_eq!(doc.calls[1].no, 2);
        assert_eq!(doc.calls[1].ret.as_ref().unwrap().type_tag, "uint");
    }

    #[test]
    fn rejects_missing_trailer() {
        let truncated = SAMPLE.trim_end_matches("</trace>\n");
        let err = TraceDocument::parse(truncated.as_bytes()).unwrap_err();
        assert!(matches!(err, CaptureError::MalformedTrace(_)));
    }

    #[test]
    fn rejects_unclosed_call_block() {
        let input = "<trace version=\"1\">\n<call no=\"1\" name=\"X\">\n</trace>\n";
        let err = TraceDocument::parse(input.as_bytes()).unwrap_err();
        assert!(matches!(err, CaptureError::MalformedTrace(_)));
    }

    #[test]
    fn rejects_bad_header() {
        let err = TraceDocument::parse(b"<call no=\"1\" name=\"X\">\n").unwrap_err();
        assert!(matches!(err, CaptureError::MalformedTrace(_)));
    }

    #[test]
    fn unescapes_names_and_literals() {
        let input = "<trace version=\"1\">\n\
            <call no=\"1\" name=\"F\">\n\
            <arg name=\"s\" type=\"string\">a&lt;b &amp; c</arg>\n\
            </call>\n\
            </trace>\n";
        let doc = TraceDocument::parse(input.as_bytes()).unwrap();
        assert_eq!(doc.calls[0].args[0].literal, "a<b & c");
    }
}
