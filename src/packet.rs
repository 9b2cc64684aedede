//! Description packet (spec §3, §4.6, §9): the value parser actions pass
//! up one level and that is consumed exactly once, by one of three
//! disposal kinds. Modeled as a linear value — `Packet::dispose` takes
//! `self` by value, so the compiler enforces "consumed exactly once" for
//! any path that doesn't simply let it flow upward into a parent list.

use crate::datum::Datum;
use crate::list::{Cell, HeaderId, ListStore};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PacketKind {
    /// An anonymous list literal — the parser owns it until it's pushed
    /// into a parent or discarded on error.
    Anonymous,
    /// A named-list definition — ownership belongs to the registry once
    /// registered; disposal is a no-op.
    Named,
    /// A single datum, not a list.
    Data,
}

#[derive(Clone, Debug)]
pub enum Payload {
    List(HeaderId),
    Data(Datum),
}

#[derive(Clone, Debug)]
pub struct Packet {
    pub kind: PacketKind,
    pub payload: Payload,
    pub name: Option<String>,
    /// The packet's own descriptor-list packet, if a `description` was
    /// attached to it (spec grammar `listDef := '(' mark? description? ...`).
    pub descriptor: Option<Box<Packet>>,
    pub debug: bool,
}

impl Packet {
    pub fn data(datum: Datum) -> Self {
        Packet {
            kind: PacketKind::Data,
            payload: Payload::Data(datum),
            name: None,
            descriptor: None,
            debug: false,
        }
    }

    pub fn anonymous_list(header: HeaderId) -> Self {
        Packet {
            kind: PacketKind::Anonymous,
            payload: Payload::List(header),
            name: None,
            descriptor: None,
            debug: false,
        }
    }

    pub fn named_list(name: impl Into<String>, header: HeaderId) -> Self {
        Packet {
            kind: PacketKind::Named,
            payload: Payload::List(header),
            name: Some(name.into()),
            descriptor: None,
            debug: false,
        }
    }

    pub fn as_list(&self) -> Option<HeaderId> {
        match self.payload {
            Payload::List(id) => Some(id),
            Payload::Data(_) => None,
        }
    }

    pub fn into_cell(self) -> Cell {
        match self.payload {
            Payload::Data(d) => Cell::Data(d),
            Payload::List(id) => Cell::Sublist(id),
        }
    }

    /// Push this packet's value into `parent`, then release the
    /// reference the packet itself was holding: `ListStore::push`
    /// retains the sublist on the parent's behalf, so the packet's own
    /// (now redundant) hold is given up rather than leaked.
    pub fn push_into(self, parent: HeaderId, store: &mut impl ListStore) {
        let list_id = self.as_list();
        store.push(parent, self.into_cell());
        if let Some(id) = list_id {
            store.release(id);
        }
    }

    /// Dispose of a packet on an error path, per the kind-matched
    /// discipline spec §4.6 requires: `Data` frees the datum (a no-op in
    /// Rust — it simply drops), `Anonymous` releases the list it owns,
    /// `Named` disposes of nothing (the registry already owns the list).
    pub fn dispose(self, store: &mut impl ListStore) {
        match (self.kind, self.payload) {
            (PacketKind::Anonymous, Payload::List(id)) => {
                store.delete(id);
            }
            (PacketKind::Data, Payload::Data(_)) => {}
            (PacketKind::Named, Payload::List(_)) => {}
            _ => unreachable!("packet kind/payload mismatch"),
        }
    }
}
