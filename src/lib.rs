pub mod error;
pub mod ipcore;
pub mod parser;
pub mod comp;
pub mod edit;
