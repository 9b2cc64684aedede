//! Registry (spec §3 "Registry", §4.3, §4.4): the façade over one hash
//! table that enforces the entry lifecycle and resolves forward
//! references for named lists, sublists, and descriptor lists.

pub mod entry;
pub mod table;

use entry::{Entry, EntryKind, ParseFn, State};
use table::{HashTable, InsertStatus};

use crate::error::SlipError;
use crate::list::{HeaderId, ListStore};

pub struct Registry {
    table: HashTable,
}

fn binary_key(id: HeaderId) -> Vec<u8> {
    id.0.to_le_bytes().to_vec()
}

impl Registry {
    pub fn new(initial_capacity: usize, max_probes: u32) -> Self {
        Registry {
            table: HashTable::new(initial_capacity, max_probes),
        }
    }

    /// §4.3 register-user-data. Rejects a redefinition with a different
    /// parser; accepts a repeat registration with the same class name as
    /// a no-op (spec §8 idempotence: "second call is a no-op").
    pub fn register_user_data(
        &mut self,
        class_name: &str,
        parser: ParseFn,
    ) -> Result<(), &'static str> {
        if let Some(existing) = self.table.search_mut(class_name.as_bytes()) {
            return if existing.state == State::UserData {
                Ok(())
            } else {
                Err("name already registered as a list")
            };
        }
        let entry = Entry::user_data(class_name, parser);
        let (_, status) = self.table.insert(class_name.as_bytes().to_vec(), entry);
        match status {
            InsertStatus::Inserted | InsertStatus::Found => Ok(()),
            InsertStatus::Full => Err("hash table exhausted"),
        }
    }

    pub fn get_parse(&self, class_name: &str) -> Option<ParseFn> {
        let (_, entry) = self.table.search(class_name.as_bytes());
        entry.and_then(|e| e.parser.clone())
    }

    /// §4.3 register-sublist-reference / get-sublist-handle: insert-or-
    /// find an Ascii entry in state `Referenced`, pre-populating an empty
    /// header so `{name}` can point at it before the definition is seen.
    ///
    /// Returns a reference the *caller* owns — the parser releases it
    /// once the resulting cell has been pushed into a parent list, since
    /// `push` takes its own retain. The table itself never holds a
    /// strong reference of its own: a named list's refcount reflects
    /// exactly its structural references, matching spec §8's worked
    /// examples (e.g. a twice-referenced list has refcount 2, not 3).
    pub fn get_sublist_handle(
        &mut self,
        name: &str,
        store: &mut impl ListStore,
    ) -> Result<HeaderId, &'static str> {
        if let Some(existing) = self.table.search_mut(name.as_bytes()) {
            if existing.state == State::UserData {
                return Err("name already registered as user-data");
            }
            let handle = existing.handle.expect("list-state entry always has a handle");
            store.retain(handle);
            return Ok(handle);
        }
        let handle = store.create_header();
        store.retain(handle); // caller's transient hold
        let entry = Entry::referenced(name, handle);
        let (_, status) = self.table.insert(name.as_bytes().to_vec(), entry);
        match status {
            InsertStatus::Inserted | InsertStatus::Found => Ok(handle),
            InsertStatus::Full => Err("hash table exhausted"),
        }
    }

    /// `'list' name (',' name)* ';'` (spec §6.1): pre-declare names
    /// without taking a caller-owned reference (nothing is pushed
    /// anywhere on the caller's behalf).
    pub fn declare_name(&mut self, name: &str, store: &mut impl ListStore) -> Result<(), String> {
        if self.table.search(name.as_bytes()).1.is_some() {
            return Ok(());
        }
        let handle = store.create_header();
        let entry = Entry::referenced(name, handle);
        let (_, status) = self.table.insert(name.as_bytes().to_vec(), entry);
        if status == InsertStatus::Full {
            return Err("hash table exhausted".to_string());
        }
        Ok(())
    }

    /// §4.3 register-sublist-definition. Moves `packet_header`'s contents
    /// into the pre-existing placeholder header (so every `{name}`
    /// reference already created sees the definition by identity), then
    /// drains the descriptor forward-reference chain (§4.4).
    pub fn register_sublist_definition(
        &mut self,
        name: &str,
        packet_header: HeaderId,
        store: &mut impl ListStore,
    ) -> Result<HeaderId, String> {
        let existed = self.table.search_mut(name.as_bytes()).is_some();
        let target = if existed {
            let existing = self.table.search_mut(name.as_bytes()).unwrap();
            let existing_handle = existing.handle.expect("list-state entry always has a handle");
            // `packet_header` is ordinarily a distinct transient header;
            // only reclaim it here if it actually differs from the name's
            // own handle; a caller that already built straight into
            // `existing_handle` would otherwise have that live definition
            // destroyed by a failed re-registration attempt.
            if existing.state == State::UserData {
                if packet_header != existing_handle {
                    store.delete(packet_header);
                }
                return Err(format!("'{name}' is registered as user-data, not a list"));
            }
            let current = existing.state;
            let next = match entry::transition(current, State::Defined) {
                Ok(next) => next,
                Err(reason) => {
                    if packet_header != existing_handle {
                        store.delete(packet_header);
                    }
                    return Err(format!("'{name}': {reason}"));
                }
            };
            existing.state = next;
            existing.complete = true;
            existing_handle
        } else {
            let handle = store.create_header();
            let mut e = Entry::referenced(name, handle);
            e.state = State::Defined;
            e.complete = true;
            let (_, status) = self.table.insert(name.as_bytes().to_vec(), e);
            if status == InsertStatus::Full {
                store.delete(packet_header);
                return Err("hash table exhausted".to_string());
            }
            handle
        };
        // `packet_header` is ordinarily a distinct, transient body header
        // whose contents get moved into `target` and then reclaimed; skip
        // the copy/delete only in the degenerate case where a caller
        // already built the body directly into `target` itself.
        if packet_header != target {
            store.copy_into(packet_header, target);
            store.delete(packet_header);
        }
        self.resolve_descriptor_chain(name, store)?;
        Ok(target)
    }

    /// §4.4 descriptor-list forward reference. `source_name` is not yet
    /// complete; chain `host` onto it so `resolve_descriptor_chain` fills
    /// `host`'s descriptor slot once `source_name` is defined.
    pub fn chain_descriptor_reference(
        &mut self,
        source_name: &str,
        host: HeaderId,
        store: &mut impl ListStore,
    ) -> Result<(), String> {
        if let Some(existing) = self.table.search_mut(source_name.as_bytes()) {
            if existing.complete {
                let src = existing.handle.expect("complete entry has a handle");
                store.copy_into(src, store.descriptor_slot(host));
                return Ok(());
            }
            existing.descriptor_chain.push(host);
            return Ok(());
        }
        let handle = store.create_header();
        let mut e = Entry::referenced(source_name, handle);
        e.descriptor_chain.push(host);
        let (_, status) = self.table.insert(source_name.as_bytes().to_vec(), e);
        if status == InsertStatus::Full {
            return Err("hash table exhausted".to_string());
        }
        Ok(())
    }

    /// Drains `name`'s descriptor chain head-to-tail once it becomes
    /// complete (spec §4.4 resolution protocol). Each chained host gets
    /// an independent copy of the now-defined list in its descriptor
    /// slot; when the host is itself a named list, its own descriptor
    /// chain is drained too (step 3: "recursively resolve C's own
    /// descriptor chain") in case something was queued on it in the
    /// meantime.
    fn resolve_descriptor_chain(
        &mut self,
        name: &str,
        store: &mut impl ListStore,
    ) -> Result<(), String> {
        let (handle, chain) = {
            let entry = self
                .table
                .search_mut(name.as_bytes())
                .expect("resolve called on a just-registered entry");
            let handle = entry.handle.expect("list entry has a handle");
            let chain = std::mem::take(&mut entry.descriptor_chain);
            (handle, chain)
        };
        for host in chain {
            if host == handle {
                return Err(format!("descriptor-list cycle on '{name}'"));
            }
            let slot = store.descriptor_slot(host);
            store.copy_into(handle, slot);
            if let Some(host_name) = self.name_for_handle(host) {
                self.resolve_descriptor_chain(&host_name, store)?;
            }
        }
        Ok(())
    }

    /// Reverse lookup for [`resolve_descriptor_chain`]'s recursion: the
    /// name of the Ascii list entry whose handle is `handle`, if any.
    fn name_for_handle(&self, handle: HeaderId) -> Option<String> {
        self.table
            .iter()
            .find(|e| e.kind == EntryKind::Ascii && e.handle == Some(handle))
            .and_then(|e| e.name.clone())
    }

    /// §4.3 register-output-list: post a `Binary` entry keyed by `handle`.
    /// Rejects duplicates (a header is only ever named once per write).
    pub fn register_output_list(
        &mut self,
        handle: HeaderId,
        generated_name: String,
    ) -> Result<(), SlipError> {
        let key = binary_key(handle);
        let (_, found) = {
            let (status, entry) = self.table.search(&key);
            (status, entry.is_some())
        };
        if found {
            return Err(SlipError::TableFull {
                reason: "header already named on output".to_string(),
            });
        }
        let (_, status) = self.table.insert(key, Entry::binary(handle, generated_name));
        match status {
            InsertStatus::Inserted | InsertStatus::Found => Ok(()),
            InsertStatus::Full => Err(SlipError::TableFull {
                reason: "output registry exhausted".to_string(),
            }),
        }
    }

    pub fn get_sublist_name(&self, handle: HeaderId) -> Option<&str> {
        let (_, entry) = self.table.search(&binary_key(handle));
        entry.and_then(|e| e.output_name.as_deref())
    }

    /// Writer pass 1 (spec §4.7): note that `class_name` was seen on a
    /// user-data datum. Returns `true` the first time a given name is
    /// seen, so the caller can count distinct classes for the
    /// `entriesPerLine` line-fitting math (spec §6.4).
    pub fn note_user_data_class(&mut self, class_name: &str) -> bool {
        if self.table.search(class_name.as_bytes()).1.is_some() {
            return false;
        }
        let (_, status) = self
            .table
            .insert(class_name.as_bytes().to_vec(), Entry::user_data_marker(class_name));
        status == InsertStatus::Inserted
    }

    /// Binary (sublist) entries in table-scan order (spec §4.7 pass 2:
    /// "a post-pass renumbering, not a resort of the table").
    pub fn binary_entries(&self) -> impl Iterator<Item = &Entry> {
        self.table.iter().filter(|e| e.kind == EntryKind::Binary)
    }

    /// Distinct user-data class names noted during pass 1, in table-scan
    /// order.
    pub fn user_data_classes(&self) -> impl Iterator<Item = &Entry> {
        self.table
            .iter()
            .filter(|e| e.kind == EntryKind::Ascii && e.state == State::UserData)
    }

    /// Writer pass 2 (spec §4.7): rename every registered sublist to
    /// `list1..listK` by table-scan order. A post-pass renumbering, not a
    /// resort — the temporary names assigned during pass 1's discovery
    /// order are discarded in favor of whatever order the hash table's
    /// slots happen to land in.
    pub fn renumber_output_lists(&mut self) {
        let mut i = 0usize;
        for entry in self.table.iter_mut() {
            if entry.kind == EntryKind::Binary {
                i += 1;
                entry.output_name = Some(format!("list{i}"));
            }
        }
    }

    /// Entries whose `complete` flag never became true by end of parse —
    /// spec §7 "referenced but not defined", reported at close of parse.
    pub fn unresolved_names(&self) -> Vec<String> {
        self.table
            .iter()
            .filter(|e| e.kind == EntryKind::Ascii && e.state != State::UserData && !e.complete)
            .filter_map(|e| e.name.clone())
            .collect()
    }

    /// Named lists registered but never referenced by any `{name}` or
    /// descriptor chain — spec §7 "named list defined but never used"
    /// (a warning, not an error). Conservatively approximated here as
    /// `Defined`-only entries (never touched by a `Referenced` event).
    pub fn unused_names(&self) -> Vec<String> {
        self.table
            .iter()
            .filter(|e| e.kind == EntryKind::Ascii && e.state == State::Defined)
            .filter_map(|e| e.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::{Arena, Cell};
    use crate::datum::Datum;

    #[test]
    fn sublist_reference_then_definition_share_identity() {
        let mut registry = Registry::new(16, 10);
        let mut arena = Arena::new();

        let placeholder = registry.get_sublist_handle("list1", &mut arena).unwrap();

        let body = arena.create_header();
        arena.retain(body);
        arena.push(body, Cell::Data(Datum::I64(1)));
        arena.push(body, Cell::Data(Datum::I64(2)));
        registry
            .register_sublist_definition("list1", body, &mut arena)
            .unwrap();

        assert_eq!(arena.cells(placeholder).len(), 2);
    }

    #[test]
    fn descriptor_forward_reference_resolves_to_independent_copy() {
        let mut registry = Registry::new(16, 10);
        let mut arena = Arena::new();

        let host = arena.create_header();
        arena.retain(host);
        registry
            .chain_descriptor_reference("list2", host, &mut arena)
            .unwrap();

        let def = arena.create_header();
        arena.retain(def);
        arena.push(def, Cell::Data(Datum::I64(3)));
        arena.push(def, Cell::Data(Datum::I64(4)));
        registry
            .register_sublist_definition("list2", def, &mut arena)
            .unwrap();

        let slot = arena.descriptor(host).unwrap();
        assert_eq!(arena.cells(slot).len(), 2);

        let list2_handle = registry.get_sublist_handle("list2", &mut arena).unwrap();
        arena.push(list2_handle, Cell::Data(Datum::I64(5)));
        assert_eq!(arena.cells(slot).len(), 2);
    }

    #[test]
    fn redefinition_is_rejected() {
        let mut registry = Registry::new(16, 10);
        let mut arena = Arena::new();
        let body1 = arena.create_header();
        arena.retain(body1);
        registry
            .register_sublist_definition("list1", body1, &mut arena)
            .unwrap();

        let body2 = arena.create_header();
        arena.retain(body2);
        assert!(registry
            .register_sublist_definition("list1", body2, &mut arena)
            .is_err());
    }

    #[test]
    fn renumber_output_lists_is_sequential_in_table_order() {
        let mut registry = Registry::new(16, 10);
        registry.register_output_list(HeaderId(5), "tmp_a".to_string()).unwrap();
        registry.register_output_list(HeaderId(9), "tmp_b".to_string()).unwrap();
        registry.renumber_output_lists();
        let names: Vec<&str> = registry.binary_entries().map(|e| e.output_name.as_deref().unwrap()).collect();
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|n| n.starts_with("list")));
        assert_ne!(names[0], names[1]);
    }

    #[test]
    fn note_user_data_class_is_true_once() {
        let mut registry = Registry::new(16, 10);
        assert!(registry.note_user_data_class("COORD"));
        assert!(!registry.note_user_data_class("COORD"));
        assert_eq!(registry.user_data_classes().count(), 1);
    }
}
