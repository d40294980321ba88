use ipcgen::{
    edit::{
        insert_block_after, insert_block_before, insert_field_after, insert_field_before,
        insert_register_after, insert_register_before, InsertError,
    },
    error::{IpError, IpErrorKind},
    ipcore::{AddressBlock, FieldDecl, RegisterDecl},
};

fn field(name: &str, bits: &str) -> FieldDecl {
    FieldDecl {
        name: name.to_owned(),
        bits: Some(bits.to_owned()),
        ..Default::default()
    }
}

#[test]
fn test_field_after_sole_field() {
    let fields = vec![FieldDecl::new("en", 0, 1)];
    let res = insert_field_after(&fields, Some(0), 32);
    assert!(res.is_ok());
    assert_eq!(res.new_index, Some(1));
    assert_eq!(res.items.len(), 2);
    assert_eq!(res.items[1].bit_span().offset, 1);
    assert_eq!(res.items[1].bit_span().width, 1);
}

#[test]
fn test_field_after_last_bit_fails() {
    let fields = vec![FieldDecl::new("msb", 31, 1)];
    let res = insert_field_after(&fields, Some(0), 32);
    assert_eq!(res.error, Some(InsertError::OutOfBounds));
    assert_eq!(res.error.as_ref().map(|e| e.to_string()).as_deref(), Some("outside register bounds"));
    assert_eq!(res.items, fields);
    assert_eq!(res.new_index, None);
}

#[test]
fn test_field_after_wide_follower_fails() {
    let fields = vec![FieldDecl::new("a", 0, 1), field("b", "[4294967295:0]")];
    let res = insert_field_after(&fields, Some(0), 32);
    assert_eq!(res.error, Some(InsertError::OutOfBounds));
    assert_eq!(res.items, fields);
    assert_eq!(res.items[1].bits.as_deref(), Some("[4294967295:0]"));
}

#[test]
fn test_register_after_array() {
    let mut arr = RegisterDecl::new("lut", 0);
    arr.count = Some(4);
    arr.stride = Some(8);
    let res = insert_register_after(&[arr], Some(0));
    assert!(res.is_ok());
    assert_eq!(res.items[1].offset, 32);
    assert_eq!(res.items[1].name, "reg1");
}

#[test]
fn test_insert_after_without_selection_uses_last() {
    let regs = vec![RegisterDecl::new("reg1", 0), RegisterDecl::new("reg4", 0x10)];
    let res = insert_register_after(&regs, None);
    assert_eq!(res.new_index, Some(2));
    assert_eq!(res.items[2].offset, 0x14);
    assert_eq!(res.items[2].name, "reg5");

    let res = insert_register_after(&[], None);
    assert_eq!(res.new_index, Some(0));
    assert_eq!(res.items[0].offset, 0);
    assert_eq!(res.items[0].name, "reg1");
}

#[test]
fn test_insert_before_requires_selection() {
    let regs = vec![RegisterDecl::new("a", 0x10)];
    let res = insert_register_before(&regs, None);
    assert_eq!(res.error, Some(InsertError::NoSelection));
    assert_eq!(res.items, regs);
}

#[test]
fn test_register_repack_forward() {
    let regs = vec![
        RegisterDecl::new("a", 0),
        RegisterDecl::new("b", 4),
        RegisterDecl::new("c", 8),
        RegisterDecl::new("d", 0x20),
    ];
    let res = insert_register_after(&regs, Some(0));
    let offsets: Vec<u64> = res.items.iter().map(|r| r.offset).collect();
    assert_eq!(offsets, vec![0, 4, 8, 12, 0x20]);
    let names: Vec<&str> = res.items.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["a", "reg1", "b", "c", "d"]);
}

#[test]
fn test_field_notation_rewritten() {
    let fields = vec![field("a", "[3:0]"), field("b", "[5:4]"), field("c", "[31]")];
    let res = insert_field_after(&fields, Some(0), 32);
    assert!(res.is_ok());
    assert_eq!(res.items[2].name, "b");
    assert_eq!(res.items[2].bits.as_deref(), Some("[6:5]"));
    assert_eq!(res.items[3].bits.as_deref(), Some("[31]"));
}

#[test]
fn test_field_before_backward_repack() {
    let fields = vec![field("a", "[1:0]"), field("b", "[2]"), field("c", "[8]")];
    let res = insert_field_before(&fields, Some(2), 32);
    assert!(res.is_ok());
    assert_eq!(res.new_index, Some(2));
    assert_eq!(res.items[2].bit_span().offset, 7);

    let tight = vec![field("a", "[1:0]"), field("b", "[2]")];
    let res = insert_field_before(&tight, Some(1), 32);
    assert_eq!(res.error, Some(InsertError::Occupied));
    assert_eq!(res.items, tight);

    let res = insert_field_before(&tight, Some(0), 32);
    assert_eq!(res.error, Some(InsertError::NegativeOffset));
}

#[test]
fn test_blocks() {
    let mut regs_block = AddressBlock { name: "regs".to_owned(), ..Default::default() };
    regs_block.registers = vec![RegisterDecl::new("a", 0), RegisterDecl::new("b", 4), RegisterDecl::new("c", 8)];
    let mem = AddressBlock { name: "mem".to_owned(), base_address: 0x1000, range: Some(0x800), ..Default::default() };

    let res = insert_block_after(&[regs_block.clone(), mem.clone()], Some(0));
    assert!(res.is_ok());
    assert_eq!(res.items[1].base_address, 12);
    assert_eq!(res.items[1].name, "block1");
    // New block is 0x1000 wide and pushes the next one
    assert_eq!(res.items[2].base_address, 12 + 0x1000);

    let res = insert_block_before(&[regs_block, mem], Some(1));
    assert_eq!(res.error, Some(InsertError::Occupied));
}

#[test]
fn test_insert_error_kinds() {
    let e: IpError = InsertError::OutOfBounds.into();
    assert_eq!(e.kind(), IpErrorKind::BoundsViolation);
    let e: IpError = InsertError::NegativeOffset.into();
    assert_eq!(e.kind(), IpErrorKind::BoundsViolation);
    let e: IpError = InsertError::Occupied.into();
    assert_eq!(e.kind(), IpErrorKind::CollisionUnresolvable);
}
