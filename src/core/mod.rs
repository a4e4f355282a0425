use crate::error::JSError;
use crate::js_array::initialize_array;
use crate::js_boolean::initialize_boolean;
use crate::js_console::initialize_console_object;
use crate::js_date::initialize_date;
use crate::js_error_types::initialize_error_constructors;
use crate::js_function::initialize_function;
use crate::js_global::initialize_global_functions;
use crate::js_json::initialize_json;
use crate::js_math::initialize_math;
use crate::js_number::initialize_number_module;
use crate::js_object::initialize_object_module;
use crate::js_regexp::initialize_regexp;
use crate::js_string::initialize_string;
pub(crate) use gc_arena::Mutation as MutationContext;
pub(crate) use gc_arena::collect::Trace as GcTrace;
pub(crate) use gc_arena::lock::RefLock as GcCell;
pub(crate) use gc_arena::{Collect, Gc};
pub(crate) type GcPtr<'gc, T> = Gc<'gc, GcCell<T>>;

#[inline]
pub fn new_gc_cell_ptr<'gc, T: 'gc + Collect<'gc>>(mc: &MutationContext<'gc>, value: T) -> GcPtr<'gc, T> {
    Gc::new(mc, GcCell::new(value))
}

mod value;
pub use value::*;

mod descriptor;
pub use descriptor::*;

mod property_key;
pub use property_key::*;

mod statement;
pub use statement::*;

mod expr;
pub use expr::*;

mod token;
pub use token::*;

pub(crate) mod number;

mod parser;
pub use parser::*;

pub(crate) mod scope;
pub use scope::resolve_program;

pub(crate) mod optimizer;
pub use optimizer::optimize_program;

pub(crate) mod bytecode;
pub use bytecode::{CodeKind, FunctionCode, Op};

mod compiler;
pub use compiler::compile_program;

mod object;
pub use object::*;

pub(crate) mod realm;
pub use realm::Realm;

pub mod js_error;
pub use js_error::*;

mod operations;
pub use operations::*;

mod vm;
pub use vm::*;

/// Everything the garbage collector keeps alive between host calls.
#[derive(Collect)]
#[collect(no_drop)]
pub struct JsRoot<'gc> {
    pub realm: Realm<'gc>,
}

impl<'gc> JsRoot<'gc> {
    /// A root with bare intrinsics; [`new_js_arena`] fills in the built-ins.
    pub fn new(mc: &MutationContext<'gc>) -> Self {
        JsRoot { realm: Realm::new(mc) }
    }
}

pub type JsArena = gc_arena::Arena<gc_arena::Rootable!['gc => JsRoot<'gc>]>;

/// Creates a heap holding a fresh realm with every built-in installed.
pub fn new_js_arena() -> Result<JsArena, JSError> {
    let arena = JsArena::new(|mc| JsRoot::new(mc));
    arena.mutate(|mc, root| initialize_global_constructors(mc, &root.realm))?;
    Ok(arena)
}

/// Installs every built-in constructor, namespace object and global function
/// into the realm. Prototype objects already exist; this fills them in.
pub fn initialize_global_constructors<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) -> Result<(), JSError> {
    initialize_object_module(mc, realm)?;
    initialize_function(mc, realm)?;
    initialize_error_constructors(mc, realm)?;
    initialize_array(mc, realm)?;
    initialize_string(mc, realm)?;
    initialize_number_module(mc, realm)?;
    initialize_boolean(mc, realm)?;
    initialize_math(mc, realm)?;
    initialize_json(mc, realm)?;
    initialize_date(mc, realm)?;
    initialize_regexp(mc, realm)?;

    let console = initialize_console_object(mc, realm)?;
    realm.define_global(mc, "console", Value::Object(console));

    initialize_global_functions(mc, realm)?;
    log::trace!("global object initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_root_has_no_built_ins_until_initialized() {
        let bare = JsArena::new(|mc| JsRoot::new(mc));
        bare.mutate(|_, root| assert!(object_get_key_value(&root.realm.global, "JSON").is_none()));

        let arena = new_js_arena().unwrap();
        arena.mutate(|_, root| {
            for name in ["Object", "Array", "JSON", "Math", "console", "parseInt"] {
                assert!(object_get_key_value(&root.realm.global, name).is_some(), "{name} missing");
            }
        });
    }
}
