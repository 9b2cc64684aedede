use super::{Cell, HeaderId, ListStore, Mark};

struct Slot {
    cells: Vec<Cell>,
    descriptor: Option<HeaderId>,
    mark: Mark,
    refcount: u32,
    visited: bool,
}

impl Slot {
    fn empty() -> Self {
        Slot {
            cells: Vec::new(),
            descriptor: None,
            mark: 0,
            refcount: 0,
            visited: false,
        }
    }
}

/// Arena-indexed list store. Slots are never physically removed once
/// allocated (spec §9's reclaim note is satisfied by dropping a slot's
/// contents in place; the index itself stays valid so stale `HeaderId`s
/// fail loudly rather than aliasing a later list).
#[derive(Default)]
pub struct Arena {
    slots: Vec<Option<Slot>>,
}

impl Arena {
    pub fn new() -> Self {
        Arena { slots: Vec::new() }
    }

    fn slot(&self, id: HeaderId) -> &Slot {
        self.slots[id.0 as usize]
            .as_ref()
            .expect("use of reclaimed header")
    }

    fn slot_mut(&mut self, id: HeaderId) -> &mut Slot {
        self.slots[id.0 as usize]
            .as_mut()
            .expect("use of reclaimed header")
    }

    fn reclaim(&mut self, id: HeaderId) {
        let sublists: Vec<HeaderId> = self
            .slot(id)
            .cells
            .iter()
            .filter_map(Cell::as_sublist)
            .collect();
        let descriptor = self.slot(id).descriptor;
        self.slots[id.0 as usize] = None;
        for child in sublists {
            self.delete(child);
        }
        if let Some(d) = descriptor {
            self.delete(d);
        }
    }
}

impl ListStore for Arena {
    fn create_header(&mut self) -> HeaderId {
        self.slots.push(Some(Slot::empty()));
        HeaderId((self.slots.len() - 1) as u32)
    }

    fn retain(&mut self, id: HeaderId) -> u32 {
        let slot = self.slot_mut(id);
        slot.refcount += 1;
        slot.refcount
    }

    fn release(&mut self, id: HeaderId) -> u32 {
        let slot = self.slot_mut(id);
        slot.refcount = slot.refcount.saturating_sub(1);
        slot.refcount
    }

    fn delete(&mut self, id: HeaderId) -> u32 {
        let count = self.release(id);
        if count == 0 {
            self.reclaim(id);
        }
        count
    }

    fn refcount(&self, id: HeaderId) -> u32 {
        self.slot(id).refcount
    }

    fn push(&mut self, id: HeaderId, cell: Cell) {
        if let Cell::Sublist(child) = &cell {
            self.retain(*child);
        }
        self.slot_mut(id).cells.push(cell);
    }

    fn cells(&self, id: HeaderId) -> &[Cell] {
        &self.slot(id).cells
    }

    fn set_mark(&mut self, id: HeaderId, mark: Mark) {
        self.slot_mut(id).mark = mark;
    }

    fn mark(&self, id: HeaderId) -> Mark {
        self.slot(id).mark
    }

    fn descriptor_slot(&mut self, id: HeaderId) -> HeaderId {
        if let Some(d) = self.slot(id).descriptor {
            return d;
        }
        let d = self.create_header();
        self.retain(d);
        self.slot_mut(id).descriptor = Some(d);
        d
    }

    fn descriptor(&self, id: HeaderId) -> Option<HeaderId> {
        self.slot(id).descriptor
    }

    fn clear_descriptor(&mut self, id: HeaderId) {
        if let Some(d) = self.slot_mut(id).descriptor.take() {
            self.delete(d);
        }
    }

    fn copy_into(&mut self, src: HeaderId, dst: HeaderId) {
        let cells = self.slot(src).cells.clone();
        let mark = self.slot(src).mark;
        for cell in &cells {
            if let Cell::Sublist(child) = cell {
                self.retain(*child);
            }
        }
        let dst_slot = self.slot_mut(dst);
        dst_slot.cells = cells;
        dst_slot.mark = mark;
    }

    fn visited(&self, id: HeaderId) -> bool {
        self.slot(id).visited
    }

    fn set_visited(&mut self, id: HeaderId, visited: bool) {
        self.slot_mut(id).visited = visited;
    }
}
