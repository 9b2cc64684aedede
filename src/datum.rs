//! The tagged value a cell carries when it isn't a sublist reference
//! (spec §3).

/// A fully-resolved user-data value: the class name it was parsed under,
/// plus whatever the registered parser produced. The parser itself is
/// looked up by name through the registry (§4.3) and is not stored here.
#[derive(Clone, Debug, PartialEq)]
pub struct UserData {
    pub class_name: String,
    /// Opaque payload the registered parser produced. The textual I/O
    /// core never interprets this; it only carries it through.
    pub payload: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Datum {
    Bool(bool),
    I8(i8),
    U8(u8),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F64(f64),
    Str(String),
    UserData(UserData),
}

impl Datum {
    pub fn type_name(&self) -> &'static str {
        match self {
            Datum::Bool(_) => "bool",
            Datum::I8(_) => "i8",
            Datum::U8(_) => "u8",
            Datum::I32(_) => "i32",
            Datum::U32(_) => "u32",
            Datum::I64(_) => "i64",
            Datum::U64(_) => "u64",
            Datum::F64(_) => "f64",
            Datum::Str(_) => "string",
            Datum::UserData(u) => {
                // class names are dynamic; callers needing the name use
                // `class_name()` below. This arm exists so match stays total.
                let _ = u;
                "user-data"
            }
        }
    }

    pub fn class_name(&self) -> Option<&str> {
        match self {
            Datum::UserData(u) => Some(&u.class_name),
            _ => None,
        }
    }
}
