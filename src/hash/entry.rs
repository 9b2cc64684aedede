//! Hash entry and its lifecycle state machine (spec §3 "Hash entry", §4.2).

use std::rc::Rc;

use crate::list::HeaderId;

/// A registered user-data parser: takes the cells parsed inside
/// `ClassName( ... )` and produces the datum that replaces the whole node
/// (spec §4.6 `userCall`).
pub type ParseFn = Rc<dyn Fn(&[crate::list::Cell]) -> Result<crate::datum::Datum, String>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    /// Keyed on a textual name (user-data parsers, named lists).
    Ascii,
    /// Keyed on a header handle (output-side "have I named this sublist
    /// already" lookup).
    Binary,
    /// Synthetic entry for an unnamed list on a descriptor forward-
    /// reference chain. Has no independent identity beyond its position
    /// on the chain.
    Anonymous,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Illegal,
    UserData,
    Referenced,
    Defined,
    RAndD,
}

/// The transition table of spec §4.2. Returns the resulting state, or
/// `Err` for the cells marked "error" (raise a diagnostic, reject the
/// attempt without mutating state).
pub fn transition(current: State, incoming: State) -> Result<State, &'static str> {
    use State::*;
    match (current, incoming) {
        (_, Illegal) => Ok(Illegal),
        (Illegal, s) => Ok(s),

        (UserData, UserData) => Ok(UserData),
        (UserData, Referenced) | (UserData, Defined) => Err("user-data name reused as a list"),

        (Referenced, Referenced) => Ok(Referenced),
        (Referenced, Defined) => Ok(RAndD),
        (Referenced, UserData) => Err("list name reused as user-data"),

        (Defined, Referenced) => Ok(RAndD),
        (Defined, Defined) => Err("redefinition"),
        (Defined, UserData) => Err("list name reused as user-data"),

        (RAndD, Referenced) => Ok(RAndD),
        (RAndD, Defined) => Err("redefinition"),
        (RAndD, UserData) => Err("list name reused as user-data"),
    }
}

#[derive(Clone)]
pub struct Entry {
    pub kind: EntryKind,
    pub name: Option<String>,
    /// For `Ascii` entries in a list state: the (possibly placeholder)
    /// header. For `Binary` entries: the generated output name.
    pub handle: Option<HeaderId>,
    pub output_name: Option<String>,
    pub parser: Option<ParseFn>,
    pub state: State,
    /// Hosts whose descriptor slot should receive a copy of this entry's
    /// list once it becomes complete (spec §4.4). Each element is the
    /// host header directly; the original's "Anonymous entry that deletes
    /// itself after resolving" has no separate identity to manage here —
    /// an anonymous host is just a `HeaderId` with no name attached.
    pub descriptor_chain: Vec<HeaderId>,
    pub complete: bool,
    pub debug: bool,
}

impl Entry {
    pub fn user_data(name: impl Into<String>, parser: ParseFn) -> Self {
        Entry {
            kind: EntryKind::Ascii,
            name: Some(name.into()),
            handle: None,
            output_name: None,
            parser: Some(parser),
            state: State::UserData,
            descriptor_chain: Vec::new(),
            complete: true,
            debug: false,
        }
    }

    /// An Ascii/UserData entry with no parser attached — the writer posts
    /// one of these per distinct user-data class name it encounters during
    /// pass 1 (spec §4.7), purely so the name shows up once in the `user`
    /// declaration; it is never looked up for its (absent) parser.
    pub fn user_data_marker(name: impl Into<String>) -> Self {
        Entry {
            kind: EntryKind::Ascii,
            name: Some(name.into()),
            handle: None,
            output_name: None,
            parser: None,
            state: State::UserData,
            descriptor_chain: Vec::new(),
            complete: true,
            debug: false,
        }
    }

    pub fn referenced(name: impl Into<String>, handle: HeaderId) -> Self {
        Entry {
            kind: EntryKind::Ascii,
            name: Some(name.into()),
            handle: Some(handle),
            output_name: None,
            parser: None,
            state: State::Referenced,
            descriptor_chain: Vec::new(),
            complete: false,
            debug: false,
        }
    }

    pub fn binary(handle: HeaderId, output_name: impl Into<String>) -> Self {
        Entry {
            kind: EntryKind::Binary,
            name: None,
            handle: Some(handle),
            output_name: Some(output_name.into()),
            parser: None,
            state: State::RAndD,
            descriptor_chain: Vec::new(),
            complete: true,
            debug: false,
        }
    }

    pub fn key_matches_name(&self, name: &str) -> bool {
        self.kind == EntryKind::Ascii && self.name.as_deref() == Some(name)
    }

    pub fn key_matches_handle(&self, handle: HeaderId) -> bool {
        self.kind == EntryKind::Binary && self.handle == Some(handle)
    }
}
