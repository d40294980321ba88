pub mod bus_library;
pub mod bus_expand;
pub mod reg_flatten;
pub mod validate;
pub mod render_ctx;
pub mod reverse;

pub use {
    bus_library::{BusLibrary, BusLibraryCache},
    bus_expand::{expand, BusPortSets, ExpandOptions, ExpandedBusInterface, ResolvedBusPort},
    reg_flatten::{flatten, FlatField, FlatRegister},
    validate::{validate, Diagnostic, DiagnosticKind},
    render_ctx::{CompileOptions, Compiler, RenderContext},
    reverse::to_descriptor,
};
