pub mod value;
pub mod descriptor;
pub mod bus;
pub mod memory_map;
pub mod loader;
pub mod order_dict;

pub use {value::*, descriptor::*, bus::*, memory_map::*, loader::*};
