use super::guid::{self, Guid};

/// A type-tagged trace value.
///
/// Every argument, output, and return value in a call record is encoded as
/// one of these so a decoder can reconstruct the call stream without any
/// external schema. Values the recorder cannot encode degrade to `Opaque`
/// instead of losing the whole record.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    UInt(u64),
    SInt(i64),
    Float(f64),
    Str(String),
    /// Stable object identity: a wrapper's trace id, or a raw pointer value
    /// for objects the capture layer does not manage.
    Handle(u64),
    /// A flag word broken into the names of its set bits. `bits` keeps the
    /// residue so unnamed bits survive round-tripping.
    Flags { bits: u64, names: Vec<&'static str> },
    /// A named constant out of an enumerated type, with its numeric value.
    Enum(&'static str, i64),
    Uuid(Guid),
    Struct(Vec<(&'static str, Value)>),
    Array(Vec<Value>),
    /// A value the recorder does not know how to encode.
    Opaque,
}

impl Value {
    /// The tag written into the trace document for this value.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::UInt(_) => "uint",
            Value::SInt(_) => "sint",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Handle(_) => "handle",
            Value::Flags { .. } => "flags",
            Value::Enum(..) => "enum",
            Value::Uuid(_) => "uuid",
            Value::Struct(_) => "struct",
            Value::Array(_) => "array",
            Value::Opaque => "opaque",
        }
    }

    /// Render the literal form used by the text document.
    pub fn render(&self, out: &mut String) {
        match self {
            Value::Null => out.push_str("null"),
            Value::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
            Value::UInt(v) => out.push_str(&v.to_string()),
            Value::SInt(v) => out.push_str(&v.to_string()),
            Value::Float(v) => out.push_str(&v.to_string()),
            Value::Str(s) => escape_into(s, out),
            Value::Handle(h) => out.push_str(&format!("{h:#x}")),
            Value::Flags { bits, names } => render_flags(*bits, names, out),
            Value::Enum(name, _) => out.push_str(name),
            Value::Uuid(g) => out.push_str(&guid::name_for(g)),
            Value::Struct(fields) => {
                out.push('{');
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(name);
                    out.push_str(" = ");
                    value.render(out);
                }
                out.push('}');
            }
            Value::Array(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.render(out);
                }
                out.push(']');
            }
            Value::Opaque => out.push('?'),
        }
    }
}

fn render_flags(bits: u64, names: &[&'static str], out: &mut String) {
    if names.is_empty() {
        out.push_str(&format!("{bits:#x}"));
        return;
    }
    out.push_str(&names.join(" | "));
    if bits != 0 {
        out.push_str(&format!(" | {bits:#x}"));
    }
}

/// Escape the characters that would break the document markup.
pub(crate) fn escape_into(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

pub(crate) fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(value: Value) -> String {
        let mut out = String::new();
        value.render(&mut out);
        out
    }

    #[test]
    fn scalar_literals() {
        assert_eq!(rendered(Value::UInt(42)), "42");
        assert_eq!(rendered(Value::SInt(-7)), "-7");
        assert_eq!(rendered(Value::Bool(true)), "true");
        assert_eq!(rendered(Value::Handle(0x10)), "0x10");
        assert_eq!(rendered(Value::Null), "null");
        assert_eq!(rendered(Value::Opaque), "?");
    }

    #[test]
    fn strings_are_escaped() {
        assert_eq!(
            rendered(Value::Str("a<b & \"c\"".into())),
            "a&lt;b &amp; &quot;c&quot;"
        );
        assert_eq!(unescape("a&lt;b &amp; &quot;c&quot;"), "a<b & \"c\"");
    }

    #[test]
    fn flags_join_names_and_residue() {
        assert_eq!(
            rendered(Value::Flags {
                bits: 0x8,
                names: vec!["D3DCLEAR_TARGET", "D3DCLEAR_ZBUFFER"],
            }),
            "D3DCLEAR_TARGET | D3DCLEAR_ZBUFFER | 0x8"
        );
        assert_eq!(rendered(Value::Flags { bits: 0, names: vec![] }), "0x0");
    }

    #[test]
    fn nested_structs_and_arrays() {
        let value = Value::Struct(vec![
            ("Width", Value::UInt(640)),
            ("Rects", Value::Array(vec![Value::SInt(0), Value::SInt(480)])),
        ]);
        assert_eq!(rendered(value), "{Width = 640, Rects = [0, 480]}");
    }
}
