//! Typed containers over generated bindings
//!
//! `IntVector` is a native `std::vector<int>` driven entirely through the
//! generated `int_vector` stubs: construction is ledger-tracked, elements are
//! read and written through an `ArrayView` over the vector's buffer.

use crate::bindings::IntVectorBindings;
use crate::error::{BindingError, BindingResult};
use crate::ledger::AllocationId;
use crate::marshal::{ArrayView, Marshalled};
use crate::native::{MarshalError, NativeValue};
use std::os::raw::c_int;
use tether_contracts::{ScalarKind, TypeTag};

/// Tag of the native collection
pub const VECTOR_TYPE: &str = "std::vector<int>";

const CONTAINER: &str = "IntVector";

/// Fail unless a native call reported status 0
fn check_status(function: &'static str, status: &Marshalled) -> BindingResult<()> {
    match status.as_int()? {
        0 => Ok(()),
        status => Err(BindingError::NativeStatus { function, status }),
    }
}

/// Resizable integer sequence living in native memory
///
/// Every operation takes the binding set the vector was created with. The
/// vector is not freed on drop; call `delete`, or the allocation shows up in
/// the handle's leak report.
#[derive(Debug, Default)]
pub struct IntVector {
    handle: Option<Marshalled>,
}

impl IntVector {
    /// A vector with no native storage; every query fails with `NotAllocated`
    pub fn unallocated() -> Self {
        Self::default()
    }

    /// Allocate an empty native vector
    pub fn new(bindings: &mut IntVectorBindings) -> BindingResult<Self> {
        let mut handle = Marshalled::pointer(TypeTag::new(VECTOR_TYPE).pointer_to());
        let status = bindings.new_int_vector(&handle.pointer_to()?, true)?;
        if let Some(id) = status.allocation_id() {
            handle.mark_owned(id);
        }

        if let Err(error) = check_status("new_int_vector", &status) {
            bindings.library_mut()?.release(&handle)?;
            return Err(error);
        }
        if handle.as_ptr()?.is_null() {
            bindings.library_mut()?.release(&handle)?;
            return Err(MarshalError::NullPointer.into());
        }
        tracing::trace!(id = ?handle.allocation_id(), "allocated {}", VECTOR_TYPE);
        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Allocate a native vector holding `values`
    pub fn from_slice(bindings: &mut IntVectorBindings, values: &[c_int]) -> BindingResult<Self> {
        let mut vector = Self::new(bindings)?;
        if let Err(error) = vector.assign(bindings, values) {
            vector.delete(bindings)?;
            return Err(error);
        }
        Ok(vector)
    }

    pub fn is_allocated(&self) -> bool {
        self.handle.is_some()
    }

    pub fn allocation_id(&self) -> Option<AllocationId> {
        self.handle.as_ref().and_then(Marshalled::allocation_id)
    }

    fn handle(&self) -> BindingResult<&Marshalled> {
        self.handle.as_ref().ok_or(BindingError::NotAllocated {
            container: CONTAINER,
        })
    }

    pub fn len(&self, bindings: &mut IntVectorBindings) -> BindingResult<usize> {
        let handle = self.handle()?;
        let mut length = Marshalled::int(0);
        let status = bindings.get_int_vector_length(handle, &length.pointer_to()?, false)?;
        check_status("get_int_vector_length", &status)?;

        let length = length.as_int()?;
        usize::try_from(length).map_err(|_| {
            MarshalError::OutOfRange {
                value: length.to_string(),
                target: "usize",
            }
            .into()
        })
    }

    pub fn is_empty(&self, bindings: &mut IntVectorBindings) -> BindingResult<bool> {
        Ok(self.len(bindings)? == 0)
    }

    /// View over the current buffer; valid until the next resize
    fn view(&self, bindings: &mut IntVectorBindings) -> BindingResult<ArrayView> {
        let len = self.len(bindings)?;
        let handle = self.handle()?;
        let mut view = ArrayView::new(ScalarKind::Int);
        let status =
            bindings.get_int_vector_array_ptr(handle, &Marshalled::address_of(&mut view)?, false)?;
        check_status("get_int_vector_array_ptr", &status)?;
        // SAFETY: the vector's buffer holds `len` ints until it is resized
        unsafe { view.set_len(len) };
        Ok(view)
    }

    /// Element at `index`, or `None` past the end
    pub fn get(&self, bindings: &mut IntVectorBindings, index: usize) -> BindingResult<Option<c_int>> {
        let view = self.view(bindings)?;
        Ok(view.get(index).and_then(|value| value.as_int().ok()))
    }

    /// Overwrite the element at `index`; returns false past the end
    pub fn set(
        &mut self,
        bindings: &mut IntVectorBindings,
        index: usize,
        value: c_int,
    ) -> BindingResult<bool> {
        let mut view = self.view(bindings)?;
        Ok(view.set(index, NativeValue::Int(value)))
    }

    /// Last element, or `None` when empty
    pub fn back(&self, bindings: &mut IntVectorBindings) -> BindingResult<Option<c_int>> {
        match self.len(bindings)? {
            0 => Ok(None),
            len => self.get(bindings, len - 1),
        }
    }

    /// Resize, zero-filling new elements
    pub fn resize(&mut self, bindings: &mut IntVectorBindings, len: usize) -> BindingResult<()> {
        let handle = self.handle()?;
        let len = c_int::try_from(len).map_err(|_| MarshalError::OutOfRange {
            value: len.to_string(),
            target: "c_int",
        })?;
        let status = bindings.resize_int_vector(handle, &Marshalled::int(len), false)?;
        check_status("resize_int_vector", &status)
    }

    /// Replace the contents with `values`
    pub fn assign(&mut self, bindings: &mut IntVectorBindings, values: &[c_int]) -> BindingResult<()> {
        self.resize(bindings, values.len())?;
        let mut view = self.view(bindings)?;
        for (index, value) in values.iter().enumerate() {
            view.set(index, NativeValue::Int(*value));
        }
        Ok(())
    }

    /// Copy the contents out
    pub fn to_vec(&self, bindings: &mut IntVectorBindings) -> BindingResult<Vec<c_int>> {
        let view = self.view(bindings)?;
        Ok(view.iter().filter_map(|value| value.as_int().ok()).collect())
    }

    /// Free the native vector and deregister its allocation
    ///
    /// Calling this again after the handle is cleared does nothing. On a
    /// native failure the vector stays allocated and tracked.
    pub fn delete(&mut self, bindings: &mut IntVectorBindings) -> BindingResult<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        let deleted = bindings
            .delete_int_vector(&handle, false)
            .and_then(|status| check_status("delete_int_vector", &status));
        if let Err(error) = deleted {
            self.handle = Some(handle);
            return Err(error);
        }
        if handle.is_owned() {
            bindings.library_mut()?.release(&handle)?;
        }
        Ok(())
    }
}
