//! In-process stand-ins for the bundled native contracts
//!
//! Each function matches the signature its contract declares, with every
//! pointer parameter taken as `*mut c_void` exactly as generated stubs pass it.
#![allow(dead_code)]

use std::ffi::CStr;
use std::os::raw::{c_char, c_double, c_float, c_int, c_void};
use tether_runtime::{IntVectorBindings, LibraryHandle, SymbolTable};

pub extern "C" fn add(a: c_int, b: c_int) -> c_int {
    a + b
}

pub extern "C" fn sub(a: c_int, b: c_int) -> c_int {
    a - b
}

pub extern "C" fn scale(value: c_double, factor: c_float) -> c_double {
    value * factor as c_double
}

/// Length of "Hello, <name>" plus one for the "!" when shouting
pub unsafe extern "C" fn greeting_length(name: *const c_char, shout: bool) -> c_int {
    let name = CStr::from_ptr(name).to_bytes().len();
    ("Hello, ".len() + name + usize::from(shout)) as c_int
}

pub unsafe extern "C" fn reset_counter(counter: *mut c_void) {
    *(counter as *mut c_int) = 0;
}

pub fn arithmetic_table() -> SymbolTable {
    SymbolTable::new("arithmetic")
        .with("add", add as *const ())
        .with("sub", sub as *const ())
        .with("scale", scale as *const ())
        .with("greeting_length", greeting_length as *const ())
        .with("reset_counter", reset_counter as *const ())
}

type Vector = Vec<c_int>;

pub unsafe extern "C" fn new_int_vector(out_vec: *mut c_void) -> c_int {
    *(out_vec as *mut *mut Vector) = Box::into_raw(Box::new(Vector::new()));
    0
}

pub unsafe extern "C" fn delete_int_vector(vec: *mut c_void) -> c_int {
    drop(Box::from_raw(vec as *mut Vector));
    0
}

pub unsafe extern "C" fn get_int_vector_length(vec: *mut c_void, out_length: *mut c_void) -> c_int {
    *(out_length as *mut c_int) = (*(vec as *const Vector)).len() as c_int;
    0
}

pub unsafe extern "C" fn resize_int_vector(vec: *mut c_void, length: c_int) -> c_int {
    (*(vec as *mut Vector)).resize(length as usize, 0);
    0
}

pub unsafe extern "C" fn get_int_vector_array_ptr(vec: *mut c_void, out_array: *mut c_void) -> c_int {
    *(out_array as *mut *mut c_int) = (*(vec as *mut Vector)).as_mut_ptr();
    0
}

pub fn int_vector_table() -> SymbolTable {
    SymbolTable::new("int_vector")
        .with("new_int_vector", new_int_vector as *const ())
        .with("delete_int_vector", delete_int_vector as *const ())
        .with("get_int_vector_length", get_int_vector_length as *const ())
        .with("resize_int_vector", resize_int_vector as *const ())
        .with("get_int_vector_array_ptr", get_int_vector_array_ptr as *const ())
}

/// Status every failing double reports
pub const FAILURE_STATUS: c_int = -1;

pub unsafe extern "C" fn failing_new_int_vector(_out_vec: *mut c_void) -> c_int {
    FAILURE_STATUS
}

pub unsafe extern "C" fn failing_resize_int_vector(_vec: *mut c_void, _length: c_int) -> c_int {
    FAILURE_STATUS
}

/// Leaves the vector in place, as a native delete that failed would
pub unsafe extern "C" fn failing_delete_int_vector(_vec: *mut c_void) -> c_int {
    FAILURE_STATUS
}

pub unsafe extern "C" fn failing_get_int_vector_length(
    _vec: *mut c_void,
    _out_length: *mut c_void,
) -> c_int {
    FAILURE_STATUS
}

/// Int vector bindings with `symbol` replaced by `address`
pub fn int_vector_bindings_with(symbol: &str, address: *const ()) -> IntVectorBindings {
    let mut bindings = IntVectorBindings::new();
    bindings.attach(LibraryHandle::new(int_vector_table().with(symbol, address)));
    bindings
}

/// Binding set attached to the in-process int vector
pub fn int_vector_bindings() -> IntVectorBindings {
    let mut bindings = IntVectorBindings::new();
    bindings.attach(LibraryHandle::new(int_vector_table()));
    bindings
}
