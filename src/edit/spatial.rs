use thiserror::Error;

use crate::{
    error::IpError,
    ipcore::{AddressBlock, FieldDecl, RegisterDecl, REG_BYTES},
};

/// Size of an address block without explicit range nor registers
pub const DEFAULT_BLOCK_RANGE: u64 = 0x1000;

#[derive(Error, Clone, Debug, PartialEq)]
pub enum InsertError {
    #[error("outside register bounds")]
    OutOfBounds,
    #[error("negative offset")]
    NegativeOffset,
    #[error("already occupied")]
    Occupied,
    #[error("no item selected")]
    NoSelection,
    #[error("selected item {0} does not exist")]
    InvalidSelection(usize),
}

impl From<InsertError> for IpError {
    fn from(e: InsertError) -> IpError {
        match e {
            InsertError::OutOfBounds | InsertError::NegativeOffset => IpError::BoundsViolation(e.to_string()),
            InsertError::Occupied => IpError::CollisionUnresolvable(e.to_string()),
            InsertError::NoSelection | InsertError::InvalidSelection(_) => IpError::NotFound(e.to_string()),
        }
    }
}

/// Item with a fixed extent along a placement axis
pub trait Placed: Clone {
    /// Name stem of new items
    const KIND: &'static str;
    fn name(&self) -> &str;
    fn start(&self) -> u64;
    fn footprint(&self) -> u64;
    fn set_start(&mut self, start: u64);
    /// Item created by an insertion
    fn create(name: String, start: u64) -> Self;

    fn end(&self) -> u64 {
        self.start().saturating_add(self.footprint())
    }
}

impl Placed for FieldDecl {
    const KIND: &'static str = "field";

    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self) -> u64 {
        self.bit_span().offset as u64
    }

    fn footprint(&self) -> u64 {
        self.bit_span().width as u64
    }

    fn set_start(&mut self, start: u64) {
        self.set_bit_offset(u32::try_from(start).unwrap_or(u32::MAX));
    }

    fn create(name: String, start: u64) -> Self {
        FieldDecl::new(name, start, 1)
    }
}

impl Placed for RegisterDecl {
    const KIND: &'static str = "reg";

    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self) -> u64 {
        self.offset
    }

    fn footprint(&self) -> u64 {
        RegisterDecl::footprint(self)
    }

    fn set_start(&mut self, start: u64) {
        self.offset = start;
    }

    fn create(name: String, start: u64) -> Self {
        RegisterDecl::new(name, start)
    }
}

impl Placed for AddressBlock {
    const KIND: &'static str = "block";

    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self) -> u64 {
        self.base_address
    }

    fn footprint(&self) -> u64 {
        match self.range {
            Some(r) if r > 0 => r,
            _ if !self.registers.is_empty() => self.registers.len() as u64 * REG_BYTES,
            _ => DEFAULT_BLOCK_RANGE,
        }
    }

    fn set_start(&mut self, start: u64) {
        self.base_address = start;
    }

    fn create(name: String, start: u64) -> Self {
        AddressBlock {
            name,
            base_address: start,
            ..Default::default()
        }
    }
}

/// Placement axis: bit positions inside a register are bounded, byte offsets are not
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Axis {
    pub limit: Option<u64>,
}

impl Axis {
    pub fn bounded(limit: u64) -> Self {
        Axis { limit: Some(limit) }
    }

    pub fn unbounded() -> Self {
        Axis { limit: None }
    }

    fn fits(&self, end: u64) -> bool {
        self.limit.map(|l| end <= l).unwrap_or(true)
    }
}

/// Result of an insertion. On error `items` is the original collection and `new_index` is None.
#[derive(Clone, Debug, PartialEq)]
pub struct Insertion<T> {
    pub items: Vec<T>,
    pub new_index: Option<usize>,
    pub error: Option<InsertError>,
}

impl<T: Clone> Insertion<T> {
    fn failed(items: &[T], error: InsertError) -> Self {
        log::debug!("Insertion failed: {error}");
        Insertion { items: items.to_vec(), new_index: None, error: Some(error) }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<(Vec<T>, usize), InsertError> {
        match (self.error, self.new_index) {
            (None, Some(i)) => Ok((self.items, i)),
            (Some(e), _) => Err(e),
            (None, None) => Err(InsertError::NoSelection),
        }
    }
}

/// Next free `<kind><N>` name, N being one more than the highest existing suffix
pub fn next_name<T: Placed>(items: &[T]) -> String {
    let n = items.iter()
        .filter_map(|i| i.name().strip_prefix(T::KIND))
        .filter_map(|s| s.parse::<u64>().ok())
        .max()
        .map(|n| n + 1)
        .unwrap_or(1);
    format!("{}{n}", T::KIND)
}

/// Items sorted by position, with the position of the selected item in that order
fn sorted_with_ref<T: Placed>(items: &[T], selected: usize) -> Result<(Vec<T>, usize), InsertError> {
    if selected >= items.len() {
        return Err(InsertError::InvalidSelection(selected));
    }
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by_key(|i| items[*i].start());
    let pos = order.iter().position(|i| *i == selected).unwrap_or(selected);
    Ok((order.into_iter().map(|i| items[i].clone()).collect(), pos))
}

/// Insert a new item right after the selected one (the last one when nothing is selected).
/// Following items overlapping the new one are pushed forward.
pub fn insert_after<T: Placed>(items: &[T], selected: Option<usize>, axis: Axis) -> Insertion<T> {
    let new_item = T::create(next_name(items), 0);
    let new_fp = new_item.footprint();

    if items.is_empty() {
        if let Some(s) = selected {
            return Insertion::failed(items, InsertError::InvalidSelection(s));
        }
        if !axis.fits(new_fp) {
            return Insertion::failed(items, InsertError::OutOfBounds);
        }
        return Insertion { items: vec![new_item], new_index: Some(0), error: None };
    }

    let (mut work, r) = match sorted_with_ref(items, selected.unwrap_or(items.len() - 1)) {
        Ok(v) => v,
        Err(e) => return Insertion::failed(items, e),
    };

    let pos = work[r].end();
    if !axis.fits(pos.saturating_add(new_fp)) {
        return Insertion::failed(items, InsertError::OutOfBounds);
    }

    let mut new_item = new_item;
    new_item.set_start(pos);
    let mut cursor = new_item.end();
    work.insert(r + 1, new_item);

    for item in work.iter_mut().skip(r + 2) {
        if item.start() >= cursor {
            break;
        }
        let end = cursor.saturating_add(item.footprint());
        if !axis.fits(end) {
            return Insertion::failed(items, InsertError::OutOfBounds);
        }
        item.set_start(cursor);
        cursor = end;
    }

    Insertion { items: work, new_index: Some(r + 1), error: None }
}

/// Insert a new item right before the selected one.
/// Preceding items overlapping the new one are pushed backward.
pub fn insert_before<T: Placed>(items: &[T], selected: Option<usize>, _axis: Axis) -> Insertion<T> {
    let Some(selected) = selected else {
        return Insertion::failed(items, InsertError::NoSelection);
    };
    let (mut work, r) = match sorted_with_ref(items, selected) {
        Ok(v) => v,
        Err(e) => return Insertion::failed(items, e),
    };

    let mut new_item = T::create(next_name(items), 0);
    let new_fp = new_item.footprint();
    let Some(pos) = work[r].start().checked_sub(new_fp) else {
        return Insertion::failed(items, InsertError::NegativeOffset);
    };
    new_item.set_start(pos);
    work.insert(r, new_item);

    let mut cursor = pos;
    for item in work[..r].iter_mut().rev() {
        if item.end() <= cursor {
            break;
        }
        let Some(start) = cursor.checked_sub(item.footprint()) else {
            return Insertion::failed(items, InsertError::Occupied);
        };
        item.set_start(start);
        cursor = start;
    }

    Insertion { items: work, new_index: Some(r), error: None }
}

pub fn insert_field_after(fields: &[FieldDecl], selected: Option<usize>, reg_width: u32) -> Insertion<FieldDecl> {
    insert_after(fields, selected, Axis::bounded(reg_width as u64))
}

pub fn insert_field_before(fields: &[FieldDecl], selected: Option<usize>, reg_width: u32) -> Insertion<FieldDecl> {
    insert_before(fields, selected, Axis::bounded(reg_width as u64))
}

pub fn insert_register_after(regs: &[RegisterDecl], selected: Option<usize>) -> Insertion<RegisterDecl> {
    insert_after(regs, selected, Axis::unbounded())
}

pub fn insert_register_before(regs: &[RegisterDecl], selected: Option<usize>) -> Insertion<RegisterDecl> {
    insert_before(regs, selected, Axis::unbounded())
}

pub fn insert_block_after(blocks: &[AddressBlock], selected: Option<usize>) -> Insertion<AddressBlock> {
    insert_after(blocks, selected, Axis::unbounded())
}

pub fn insert_block_before(blocks: &[AddressBlock], selected: Option<usize>) -> Insertion<AddressBlock> {
    insert_before(blocks, selected, Axis::unbounded())
}
