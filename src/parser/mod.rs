pub mod parser_common;
pub mod parser_bits;
pub mod parser_entity;
pub mod classify;

pub use {
    parser_common::*,
    parser_bits::*,
    parser_entity::*,
    classify::*,
};
