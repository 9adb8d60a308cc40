//! Typed marshallers
//!
//! Every marshaller reports an exact type tag, holds a native representation
//! and, where it owns storage, can produce a pointer to that storage for use as
//! a native out-parameter. Storage is boxed so such pointers stay valid when
//! the marshaller moves.
//!
//! `Marshalled` is the envelope generated stubs accept and return: one of the
//! closed set of marshallers plus its ledger ownership.
//!
//! # Example
//!
//! ```
//! use tether_runtime::Marshalled;
//!
//! let mut length = Marshalled::int(0);
//! let out = length.pointer_to().unwrap();
//! assert_eq!(out.type_tag(), "int*");
//! ```

use crate::error::{BindingError, BindingResult};
use crate::ledger::AllocationId;
use crate::native::{MarshalError, MarshalResult, NativeValue};
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_double, c_float, c_int, c_void};
use std::ptr;
use tether_contracts::{ScalarKind, TagKind, TypeTag};

/// Capabilities shared by every marshaller
pub trait Marshal {
    /// Exact tag compared against declared parameter types
    fn type_tag(&self) -> &str;

    /// Representation passed to a native call
    fn native(&self) -> NativeValue;

    /// Pointer to this value's storage, tagged `<tag>*`
    fn pointer_to(&mut self) -> Option<Pointer>;
}

/// Check a value's tag against a declared parameter type
pub fn expect_tag<M: Marshal + ?Sized>(
    function: &str,
    param: &str,
    value: &M,
    expected: &str,
) -> BindingResult<()> {
    if value.type_tag() == expected {
        return Ok(());
    }
    tracing::debug!(function, param, expected, got = value.type_tag(), "argument type mismatch");
    Err(BindingError::TypeMismatch {
        function: function.to_string(),
        param: param.to_string(),
        expected: expected.to_string(),
        got: value.type_tag().to_string(),
    })
}

/// Fixed-width scalar with host-owned storage
#[derive(Debug)]
pub enum Scalar {
    Int(Box<c_int>),
    Float(Box<c_float>),
    Double(Box<c_double>),
    Bool(Box<bool>),
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Int(_) => ScalarKind::Int,
            Scalar::Float(_) => ScalarKind::Float,
            Scalar::Double(_) => ScalarKind::Double,
            Scalar::Bool(_) => ScalarKind::Bool,
        }
    }

    fn from_native(kind: ScalarKind, value: NativeValue) -> MarshalResult<Self> {
        match (kind, value) {
            (ScalarKind::Int, NativeValue::Int(v)) => Ok(Scalar::Int(Box::new(v))),
            (ScalarKind::Float, NativeValue::Float(v)) => Ok(Scalar::Float(Box::new(v))),
            (ScalarKind::Double, NativeValue::Double(v)) => Ok(Scalar::Double(Box::new(v))),
            (ScalarKind::Bool, NativeValue::Bool(v)) => Ok(Scalar::Bool(Box::new(v))),
            (kind, other) => Err(MarshalError::representation(kind.display_name(), &other)),
        }
    }

    fn address(&mut self) -> *mut c_void {
        match self {
            Scalar::Int(v) => &mut **v as *mut c_int as *mut c_void,
            Scalar::Float(v) => &mut **v as *mut c_float as *mut c_void,
            Scalar::Double(v) => &mut **v as *mut c_double as *mut c_void,
            Scalar::Bool(v) => &mut **v as *mut bool as *mut c_void,
        }
    }
}

impl Marshal for Scalar {
    fn type_tag(&self) -> &str {
        self.kind().tag()
    }

    fn native(&self) -> NativeValue {
        match self {
            Scalar::Int(v) => NativeValue::Int(**v),
            Scalar::Float(v) => NativeValue::Float(**v),
            Scalar::Double(v) => NativeValue::Double(**v),
            Scalar::Bool(v) => NativeValue::Bool(**v),
        }
    }

    fn pointer_to(&mut self) -> Option<Pointer> {
        let tag = TypeTag::from(self.kind()).pointer_to();
        Some(Pointer::new(tag, self.address()))
    }
}

/// Opaque pointer typed by its pointee
#[derive(Debug)]
pub struct Pointer {
    tag: TypeTag,
    slot: Box<*mut c_void>,
}

impl Pointer {
    pub fn new(tag: impl Into<TypeTag>, address: *mut c_void) -> Self {
        Self {
            tag: tag.into(),
            slot: Box::new(address),
        }
    }

    /// A null pointer, typically filled in by a native out-parameter
    pub fn null(tag: impl Into<TypeTag>) -> Self {
        Self::new(tag, ptr::null_mut())
    }

    pub fn address(&self) -> *mut c_void {
        *self.slot
    }

    pub fn is_null(&self) -> bool {
        self.slot.is_null()
    }

    /// Tag of the value pointed at
    pub fn pointee(&self) -> Option<&str> {
        match self.tag.kind() {
            Some(TagKind::Pointer { pointee }) => Some(pointee),
            _ => None,
        }
    }
}

impl Marshal for Pointer {
    fn type_tag(&self) -> &str {
        self.tag.as_str()
    }

    fn native(&self) -> NativeValue {
        NativeValue::Ptr(*self.slot)
    }

    fn pointer_to(&mut self) -> Option<Pointer> {
        let address = &mut *self.slot as *mut *mut c_void as *mut c_void;
        Some(Pointer::new(self.tag.pointer_to(), address))
    }
}

/// Null-terminated text, either host-owned or borrowed from native code
#[derive(Debug)]
pub struct Text {
    tag: TypeTag,
    buffer: Option<CString>,
    slot: Box<*const c_char>,
}

impl Text {
    /// Copy `text` into an owned C string tagged `const char*`
    pub fn new(text: &str) -> MarshalResult<Self> {
        let buffer = CString::new(text).map_err(|e| MarshalError::InvalidString(e.to_string()))?;
        let slot = Box::new(buffer.as_ptr());
        Ok(Self {
            tag: TypeTag::new("const char*"),
            buffer: Some(buffer),
            slot,
        })
    }

    /// Wrap a pointer owned by native code
    pub fn borrowed(tag: impl Into<TypeTag>, pointer: *const c_char) -> Self {
        Self {
            tag: tag.into(),
            buffer: None,
            slot: Box::new(pointer),
        }
    }

    pub fn is_null(&self) -> bool {
        self.slot.is_null()
    }

    pub fn is_owned(&self) -> bool {
        self.buffer.is_some()
    }

    /// Copy the text out
    ///
    /// A borrowed pointer must still point at a live, nul-terminated string.
    pub fn to_str(&self) -> MarshalResult<String> {
        if let Some(buffer) = &self.buffer {
            return buffer
                .to_str()
                .map(str::to_string)
                .map_err(|e| MarshalError::InvalidString(e.to_string()));
        }
        if self.slot.is_null() {
            return Err(MarshalError::NullPointer);
        }
        // SAFETY: non-null, and native code promises nul termination for text tags
        let text = unsafe { CStr::from_ptr(*self.slot) };
        text.to_str()
            .map(str::to_string)
            .map_err(|e| MarshalError::InvalidString(e.to_string()))
    }
}

impl Marshal for Text {
    fn type_tag(&self) -> &str {
        self.tag.as_str()
    }

    fn native(&self) -> NativeValue {
        NativeValue::CharPtr(*self.slot)
    }

    fn pointer_to(&mut self) -> Option<Pointer> {
        let address = &mut *self.slot as *mut *const c_char as *mut c_void;
        Some(Pointer::new(self.tag.pointer_to(), address))
    }
}

/// Unowned, bounds-checked view over a native scalar buffer
///
/// Accesses outside `[0, len)`, on a null base, or with a value of another
/// scalar kind do nothing: `get` returns `None` and `set` returns `false`.
#[derive(Debug)]
pub struct ArrayView {
    element: ScalarKind,
    tag: TypeTag,
    slot: Box<*mut c_void>,
    len: usize,
}

impl ArrayView {
    /// An empty view whose base is usually filled in by a native out-parameter
    pub fn new(element: ScalarKind) -> Self {
        Self {
            element,
            tag: TypeTag::from(element).pointer_to(),
            slot: Box::new(ptr::null_mut()),
            len: 0,
        }
    }

    /// View `len` elements starting at `base`
    ///
    /// # Safety
    ///
    /// `base` must point at `len` initialized elements of `element`, valid for
    /// reads and writes for as long as the view is used.
    pub unsafe fn from_raw(element: ScalarKind, base: *mut c_void, len: usize) -> Self {
        let mut view = Self::new(element);
        *view.slot = base;
        view.len = len;
        view
    }

    /// Set the element count after a native call filled in the base
    ///
    /// # Safety
    ///
    /// Same contract as `from_raw` for the current base.
    pub unsafe fn set_len(&mut self, len: usize) {
        self.len = len;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn element(&self) -> ScalarKind {
        self.element
    }

    pub fn base(&self) -> *mut c_void {
        *self.slot
    }

    fn in_bounds(&self, index: usize) -> bool {
        index < self.len && !self.slot.is_null()
    }

    pub fn get(&self, index: usize) -> Option<NativeValue> {
        if !self.in_bounds(index) {
            return None;
        }
        let base = *self.slot;
        // SAFETY: index < len and the base covers len elements of this kind
        let value = unsafe {
            match self.element {
                ScalarKind::Int => NativeValue::Int(*(base as *const c_int).add(index)),
                ScalarKind::Float => NativeValue::Float(*(base as *const c_float).add(index)),
                ScalarKind::Double => NativeValue::Double(*(base as *const c_double).add(index)),
                ScalarKind::Bool => NativeValue::Bool(*(base as *const bool).add(index)),
            }
        };
        Some(value)
    }

    pub fn set(&mut self, index: usize, value: NativeValue) -> bool {
        if !self.in_bounds(index) {
            return false;
        }
        let base = *self.slot;
        // SAFETY: index < len and the base covers len elements of this kind
        unsafe {
            match (self.element, value) {
                (ScalarKind::Int, NativeValue::Int(v)) => *(base as *mut c_int).add(index) = v,
                (ScalarKind::Float, NativeValue::Float(v)) => {
                    *(base as *mut c_float).add(index) = v
                }
                (ScalarKind::Double, NativeValue::Double(v)) => {
                    *(base as *mut c_double).add(index) = v
                }
                (ScalarKind::Bool, NativeValue::Bool(v)) => *(base as *mut bool).add(index) = v,
                _ => return false,
            }
        }
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = NativeValue> + '_ {
        (0..self.len).filter_map(move |index| self.get(index))
    }
}

impl Marshal for ArrayView {
    fn type_tag(&self) -> &str {
        self.tag.as_str()
    }

    fn native(&self) -> NativeValue {
        NativeValue::Ptr(*self.slot)
    }

    fn pointer_to(&mut self) -> Option<Pointer> {
        let address = &mut *self.slot as *mut *mut c_void as *mut c_void;
        Some(Pointer::new(self.tag.pointer_to(), address))
    }
}

/// The return-only "no value"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Void;

impl Marshal for Void {
    fn type_tag(&self) -> &str {
        tether_contracts::VOID_TAG
    }

    fn native(&self) -> NativeValue {
        NativeValue::Void
    }

    fn pointer_to(&mut self) -> Option<Pointer> {
        None
    }
}

/// Closed set of marshaller variants
#[derive(Debug)]
pub enum Repr {
    Scalar(Scalar),
    Text(Text),
    Pointer(Pointer),
    Array(ArrayView),
    Void(Void),
}

impl Marshal for Repr {
    fn type_tag(&self) -> &str {
        match self {
            Repr::Scalar(v) => v.type_tag(),
            Repr::Text(v) => v.type_tag(),
            Repr::Pointer(v) => v.type_tag(),
            Repr::Array(v) => v.type_tag(),
            Repr::Void(v) => v.type_tag(),
        }
    }

    fn native(&self) -> NativeValue {
        match self {
            Repr::Scalar(v) => v.native(),
            Repr::Text(v) => v.native(),
            Repr::Pointer(v) => v.native(),
            Repr::Array(v) => v.native(),
            Repr::Void(v) => v.native(),
        }
    }

    fn pointer_to(&mut self) -> Option<Pointer> {
        match self {
            Repr::Scalar(v) => v.pointer_to(),
            Repr::Text(v) => v.pointer_to(),
            Repr::Pointer(v) => v.pointer_to(),
            Repr::Array(v) => v.pointer_to(),
            Repr::Void(v) => v.pointer_to(),
        }
    }
}

/// Whether a value's native resource must be released through the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Registered under this allocation id
    Owned(AllocationId),
    Borrowed,
}

/// A marshaller plus its ledger ownership
#[derive(Debug)]
pub struct Marshalled {
    repr: Repr,
    ownership: Ownership,
}

impl Marshalled {
    fn borrowed(repr: Repr) -> Self {
        Self {
            repr,
            ownership: Ownership::Borrowed,
        }
    }

    pub fn int(value: c_int) -> Self {
        Self::borrowed(Repr::Scalar(Scalar::Int(Box::new(value))))
    }

    pub fn float(value: c_float) -> Self {
        Self::borrowed(Repr::Scalar(Scalar::Float(Box::new(value))))
    }

    pub fn double(value: c_double) -> Self {
        Self::borrowed(Repr::Scalar(Scalar::Double(Box::new(value))))
    }

    pub fn boolean(value: bool) -> Self {
        Self::borrowed(Repr::Scalar(Scalar::Bool(Box::new(value))))
    }

    /// Host-owned `const char*` text
    pub fn text(value: &str) -> MarshalResult<Self> {
        Text::new(value).map(|text| Self::borrowed(Repr::Text(text)))
    }

    /// Null pointer tagged `tag`
    pub fn pointer(tag: impl Into<TypeTag>) -> Self {
        Self::borrowed(Repr::Pointer(Pointer::null(tag)))
    }

    /// Empty array view over `element` scalars, tagged `<element>*`
    pub fn array(element: ScalarKind) -> Self {
        Self::borrowed(Repr::Array(ArrayView::new(element)))
    }

    pub fn void() -> Self {
        Self::borrowed(Repr::Void(Void))
    }

    /// Pointer to any marshaller's storage
    pub fn address_of<M: Marshal + ?Sized>(value: &mut M) -> MarshalResult<Self> {
        match value.pointer_to() {
            Some(pointer) => Ok(Self::from(pointer)),
            None => Err(MarshalError::NoAddress {
                tag: value.type_tag().to_string(),
            }),
        }
    }

    /// Pointer to this value's storage, for native out-parameters
    pub fn pointer_to(&mut self) -> MarshalResult<Self> {
        Self::address_of(&mut self.repr)
    }

    /// Wrap a raw native result in the variant its tag names
    pub fn returned(tag: &str, value: NativeValue) -> MarshalResult<Self> {
        let tag = TypeTag::new(tag);
        let repr = match tag.kind() {
            None => return Err(MarshalError::UnrecognizedTag(tag.to_string())),
            Some(TagKind::Scalar(kind)) => Repr::Scalar(Scalar::from_native(kind, value)?),
            Some(TagKind::Void) => match value {
                NativeValue::Void => Repr::Void(Void),
                other => return Err(MarshalError::representation("c_void", &other)),
            },
            Some(TagKind::Text) => match value {
                NativeValue::CharPtr(pointer) => Repr::Text(Text::borrowed(tag.clone(), pointer)),
                other => return Err(MarshalError::representation("c_char_ptr", &other)),
            },
            Some(TagKind::Pointer { .. }) => match value {
                NativeValue::Ptr(address) => Repr::Pointer(Pointer::new(tag.clone(), address)),
                other => return Err(MarshalError::representation("c_void_ptr", &other)),
            },
        };
        Ok(Self::borrowed(repr))
    }

    pub fn type_tag(&self) -> &str {
        self.repr.type_tag()
    }

    pub fn native(&self) -> NativeValue {
        self.repr.native()
    }

    pub fn repr(&self) -> &Repr {
        &self.repr
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    pub fn mark_owned(&mut self, id: AllocationId) {
        self.ownership = Ownership::Owned(id);
    }

    pub fn allocation_id(&self) -> Option<AllocationId> {
        match self.ownership {
            Ownership::Owned(id) => Some(id),
            Ownership::Borrowed => None,
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self.ownership, Ownership::Owned(_))
    }

    pub fn as_int(&self) -> MarshalResult<c_int> {
        self.native().as_int()
    }

    pub fn as_float(&self) -> MarshalResult<c_float> {
        self.native().as_float()
    }

    pub fn as_double(&self) -> MarshalResult<c_double> {
        self.native().as_double()
    }

    pub fn as_bool(&self) -> MarshalResult<bool> {
        self.native().as_bool()
    }

    pub fn as_ptr(&self) -> MarshalResult<*mut c_void> {
        self.native().as_ptr()
    }

    /// Copy out text held by a text-tagged value
    pub fn to_text(&self) -> MarshalResult<String> {
        match &self.repr {
            Repr::Text(text) => text.to_str(),
            other => Err(MarshalError::representation("c_char_ptr", &other.native())),
        }
    }

    pub fn as_array(&self) -> Option<&ArrayView> {
        match &self.repr {
            Repr::Array(view) => Some(view),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut ArrayView> {
        match &mut self.repr {
            Repr::Array(view) => Some(view),
            _ => None,
        }
    }
}

impl Marshal for Marshalled {
    fn type_tag(&self) -> &str {
        Marshalled::type_tag(self)
    }

    fn native(&self) -> NativeValue {
        Marshalled::native(self)
    }

    fn pointer_to(&mut self) -> Option<Pointer> {
        self.repr.pointer_to()
    }
}

impl From<Pointer> for Marshalled {
    fn from(pointer: Pointer) -> Self {
        Self::borrowed(Repr::Pointer(pointer))
    }
}

impl From<ArrayView> for Marshalled {
    fn from(view: ArrayView) -> Self {
        Self::borrowed(Repr::Array(view))
    }
}

impl From<Text> for Marshalled {
    fn from(text: Text) -> Self {
        Self::borrowed(Repr::Text(text))
    }
}
