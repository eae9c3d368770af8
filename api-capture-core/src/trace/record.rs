use crate::models::value::Value;

/// One named, encoded parameter of a call record.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: &'static str,
    pub value: Value,
}

/// The complete record of one intercepted call, immutable once emitted.
///
/// `no` is the issuance-order sequence number assigned at `begin_call`;
/// `args` are the inputs encoded before the real call was delegated, `outs`
/// the outputs encoded after it returned.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord {
    pub no: u64,
    pub name: &'static str,
    pub args: Vec<Param>,
    pub outs: Vec<Param>,
    pub ret: Option<Value>,
}

impl CallRecord {
    pub(crate) fn new(no: u64, name: &'static str) -> Self {
        Self {
            no,
            name,
            args: Vec::new(),
            outs: Vec::new(),
            ret: None,
        }
    }
}
