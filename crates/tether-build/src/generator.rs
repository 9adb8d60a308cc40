//! Rust binding generation from declarations
//!
//! Renders an ordered list of declarations into one Rust module. Every stub
//! knows its native signature statically, so dispatch is a direct function
//! pointer cast rather than a runtime-described call.
//!
//! Tag lowering:
//! - `int` / `float` / `double` → `c_int` / `c_float` / `c_double`
//! - `bool` → `bool`
//! - text (`const char*`, `char*`) → `*const c_char`
//! - any other pointer → `*mut c_void`
//! - `void` → no value (return position only)

use crate::error::{BuildError, BuildResult};
use std::collections::HashSet;
use std::fmt::{self, Write};
use tether_contracts::{is_identifier, Declaration, Param, ScalarKind, TagKind, TypeTag};

/// Names the generated module imports from the runtime crate
pub const RUNTIME_IMPORTS: [&str; 6] = [
    "expect_tag",
    "BindingError",
    "BindingResult",
    "LibraryHandle",
    "Marshalled",
    "NativeValue",
];

/// Name of the generated function list
pub const FUNCTIONS_CONST: &str = "FUNCTIONS";

// clippy::too_many_arguments fires above this many inputs
const ARGUMENT_LINT_LIMIT: usize = 7;

/// Options shaping the generated module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Path the generated code uses to name the runtime crate
    pub runtime_path: String,
    /// Name of the generated binding-set struct
    pub struct_name: String,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            runtime_path: "::tether_runtime".to_string(),
            struct_name: "Bindings".to_string(),
        }
    }
}

impl GeneratorOptions {
    pub fn new(runtime_path: impl Into<String>, struct_name: impl Into<String>) -> Self {
        Self {
            runtime_path: runtime_path.into(),
            struct_name: struct_name.into(),
        }
    }

    pub fn validate(&self) -> BuildResult<()> {
        let path = self
            .runtime_path
            .strip_prefix("::")
            .unwrap_or(&self.runtime_path);
        let valid_path = !path.is_empty()
            && path.split("::").all(|segment| {
                matches!(segment, "crate" | "self" | "super") || is_identifier(segment)
            });
        if !valid_path {
            return Err(BuildError::invalid_option(
                "runtime_path",
                format!("'{}' is not a Rust path", self.runtime_path),
            ));
        }

        if !is_identifier(&self.struct_name)
            || RUNTIME_IMPORTS.contains(&self.struct_name.as_str())
            || self.struct_name == FUNCTIONS_CONST
        {
            return Err(BuildError::invalid_option(
                "struct_name",
                format!("'{}' cannot name the binding set", self.struct_name),
            ));
        }
        Ok(())
    }
}

/// How a value of one tag crosses the boundary in generated code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NativeSlot {
    rust_type: &'static str,
    accessor: &'static str,
    variant: &'static str,
}

impl NativeSlot {
    const fn new(rust_type: &'static str, accessor: &'static str, variant: &'static str) -> Self {
        Self {
            rust_type,
            accessor,
            variant,
        }
    }
}

/// Lower a tag to its native slot; `Ok(None)` is void
fn native_slot(tag: &TypeTag) -> Result<Option<NativeSlot>, String> {
    let slot = match tag.kind() {
        None => return Err(format!("unrecognized type tag '{}'", tag)),
        Some(TagKind::Void) => return Ok(None),
        Some(TagKind::Scalar(ScalarKind::Int)) => {
            NativeSlot::new("::std::os::raw::c_int", "as_int", "Int")
        }
        Some(TagKind::Scalar(ScalarKind::Float)) => {
            NativeSlot::new("::std::os::raw::c_float", "as_float", "Float")
        }
        Some(TagKind::Scalar(ScalarKind::Double)) => {
            NativeSlot::new("::std::os::raw::c_double", "as_double", "Double")
        }
        Some(TagKind::Scalar(ScalarKind::Bool)) => NativeSlot::new("bool", "as_bool", "Bool"),
        Some(TagKind::Text) => {
            NativeSlot::new("*const ::std::os::raw::c_char", "as_char_ptr", "CharPtr")
        }
        Some(TagKind::Pointer { .. }) => {
            NativeSlot::new("*mut ::std::os::raw::c_void", "as_ptr", "Ptr")
        }
    };
    Ok(Some(slot))
}

/// One declaration with every tag lowered
struct StubPlan<'a> {
    decl: &'a Declaration,
    params: Vec<(&'a Param, NativeSlot)>,
    ret: Option<NativeSlot>,
}

impl<'a> StubPlan<'a> {
    fn new(decl: &'a Declaration) -> BuildResult<Self> {
        let mut params = Vec::with_capacity(decl.params().len());
        for param in decl.params() {
            match native_slot(&param.tag) {
                Ok(Some(slot)) => params.push((param, slot)),
                Ok(None) => {
                    return Err(BuildError::generation(
                        decl.name(),
                        format!("parameter '{}' has type void", param.name),
                    ))
                }
                Err(reason) => return Err(BuildError::generation(decl.name(), reason)),
            }
        }
        let ret = native_slot(decl.return_type())
            .map_err(|reason| BuildError::generation(decl.name(), reason))?;
        Ok(Self { decl, params, ret })
    }

    fn function_type(&self) -> String {
        let params: Vec<&str> = self.params.iter().map(|(_, slot)| slot.rust_type).collect();
        match self.ret {
            Some(slot) => format!(
                "unsafe extern \"C\" fn({}) -> {}",
                params.join(", "),
                slot.rust_type
            ),
            None => format!("unsafe extern \"C\" fn({})", params.join(", ")),
        }
    }
}

/// Renders declarations into a Rust binding module
#[derive(Debug, Clone, Default)]
pub struct Generator {
    options: GeneratorOptions,
}

impl Generator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Render the module text for `declarations`, in order
    pub fn render(&self, declarations: &[Declaration]) -> BuildResult<String> {
        self.options.validate()?;

        let mut seen = HashSet::new();
        let mut plans = Vec::with_capacity(declarations.len());
        for decl in declarations {
            if !seen.insert(decl.name()) {
                return Err(BuildError::generation(decl.name(), "declared more than once"));
            }
            plans.push(StubPlan::new(decl)?);
        }

        let mut out = String::new();
        self.write_module(&mut out, &plans)
            .map_err(|e| BuildError::generation(&self.options.struct_name, e))?;
        Ok(out)
    }

    fn write_module(&self, out: &mut String, plans: &[StubPlan<'_>]) -> fmt::Result {
        let rt = &self.options.runtime_path;
        let name = &self.options.struct_name;

        writeln!(out, "// @generated by tether-build from annotated native contracts.")?;
        writeln!(out, "// Do not edit by hand; regenerate from the native sources.")?;
        writeln!(out)?;
        writeln!(out, "#[allow(unused_imports)]")?;
        writeln!(out, "use {}::{{{}}};", rt, RUNTIME_IMPORTS.join(", "))?;
        writeln!(out)?;

        let names: Vec<String> = plans
            .iter()
            .map(|plan| format!("{:?}", plan.decl.name()))
            .collect();
        writeln!(out, "/// Native functions bound by [`{}`], in declaration order", name)?;
        writeln!(out, "pub const {}: &[&str] = &[{}];", FUNCTIONS_CONST, names.join(", "))?;
        writeln!(out)?;

        writeln!(out, "/// Typed wrappers for the native functions in [`{}`]", FUNCTIONS_CONST)?;
        writeln!(out, "///")?;
        writeln!(out, "/// Attach a library handle before calling any wrapper.")?;
        writeln!(out, "#[derive(Debug, Default)]")?;
        writeln!(out, "pub struct {} {{", name)?;
        writeln!(out, "    library: Option<LibraryHandle>,")?;
        writeln!(out, "}}")?;
        writeln!(out)?;
        writeln!(out, "impl {} {{", name)?;
        out.push_str(SLOT_METHODS);
        for plan in plans {
            writeln!(out)?;
            write_stub(out, plan)?;
        }
        writeln!(out, "}}")?;
        Ok(())
    }
}

const SLOT_METHODS: &str = "    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a library handle, returning the one it replaces
    pub fn attach(&mut self, library: LibraryHandle) -> Option<LibraryHandle> {
        self.library.replace(library)
    }

    pub fn detach(&mut self) -> Option<LibraryHandle> {
        self.library.take()
    }

    pub fn is_attached(&self) -> bool {
        self.library.is_some()
    }

    pub fn library(&self) -> BindingResult<&LibraryHandle> {
        self.library.as_ref().ok_or(BindingError::NotAttached)
    }

    pub fn library_mut(&mut self) -> BindingResult<&mut LibraryHandle> {
        self.library.as_mut().ok_or(BindingError::NotAttached)
    }
";

fn write_stub(out: &mut String, plan: &StubPlan<'_>) -> fmt::Result {
    let decl = plan.decl;
    let function = decl.name();
    let return_tag = decl.return_type().as_str();

    writeln!(out, "    /// `{}`", decl.signature())?;
    writeln!(out, "    ///")?;
    writeln!(out, "    /// Declared at {}.", decl.origin())?;
    if plan.params.len() + 2 > ARGUMENT_LINT_LIMIT {
        writeln!(out, "    #[allow(clippy::too_many_arguments)]")?;
    }
    writeln!(out, "    pub fn {}(", function)?;
    writeln!(out, "        &mut self,")?;
    for (param, _) in &plan.params {
        writeln!(out, "        {}: &Marshalled,", param.name)?;
    }
    writeln!(out, "        allocated_object: bool,")?;
    writeln!(out, "    ) -> BindingResult<Marshalled> {{")?;

    for (param, _) in &plan.params {
        writeln!(
            out,
            "        expect_tag({:?}, {:?}, {}, {:?})?;",
            function,
            param.name,
            param.name,
            param.tag.as_str()
        )?;
    }
    for (param, slot) in &plan.params {
        writeln!(
            out,
            "        let __arg_{} = {}.native().{}()?;",
            param.name, param.name, slot.accessor
        )?;
    }

    let args: Vec<String> = plan
        .params
        .iter()
        .map(|(param, _)| format!("__arg_{}", param.name))
        .collect();

    writeln!(out, "        let __library = self.library_mut()?;")?;
    writeln!(out, "        let __symbol = __library.resolve({:?})?;", function)?;
    writeln!(out, "        // SAFETY: the symbol is declared with this signature at {}", decl.origin())?;
    match plan.ret {
        Some(_) => writeln!(out, "        let __raw = unsafe {{")?,
        None => writeln!(out, "        unsafe {{")?,
    }
    writeln!(out, "            let __function = ::std::mem::transmute::<")?;
    writeln!(out, "                *const (),")?;
    writeln!(out, "                {},", plan.function_type())?;
    writeln!(out, "            >(__symbol);")?;
    match plan.ret {
        Some(slot) => {
            writeln!(out, "            __function({})", args.join(", "))?;
            writeln!(out, "        }};")?;
            writeln!(
                out,
                "        let mut __output = Marshalled::returned({:?}, NativeValue::{}(__raw))?;",
                return_tag, slot.variant
            )?;
        }
        None => {
            writeln!(out, "            __function({});", args.join(", "))?;
            writeln!(out, "        }}")?;
            writeln!(
                out,
                "        let mut __output = Marshalled::returned({:?}, NativeValue::Void)?;",
                return_tag
            )?;
        }
    }
    writeln!(out, "        if allocated_object {{")?;
    writeln!(
        out,
        "            __output.mark_owned(__library.ledger_mut().register({:?}));",
        function
    )?;
    writeln!(out, "        }}")?;
    writeln!(out, "        Ok(__output)")?;
    writeln!(out, "    }}")?;
    Ok(())
}
