//! C layout of the point-function object exported by formula libraries.

use std::ffi::{c_double, c_int, c_void};
use std::ptr;

use crate::core::data::formula_param::FormulaParam;

pub const PARAM_INT: c_int = 0;
pub const PARAM_FLOAT: c_int = 1;

pub const FATE_INSIDE: c_int = 0x20;
pub const FATE_DIRECT: c_int = 0x40;
pub const FATE_SOLID: c_int = 0x80;
pub const FATE_UNKNOWN: c_int = 255;

pub const PF_NEW_SYMBOL: &[u8] = b"pf_new\0";
pub const PF_CONCURRENCY_SYMBOL: &[u8] = b"pf_concurrency\0";

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct SParam {
    pub t: c_int,
    pub intval: c_int,
    pub doubleval: c_double,
    pub gradient: *mut c_void,
    pub image: *mut c_void,
}

impl From<&FormulaParam> for SParam {
    fn from(param: &FormulaParam) -> Self {
        let (t, intval, doubleval) = match *param {
            FormulaParam::Int(value) => (PARAM_INT, value, 0.0),
            FormulaParam::Real(value) => (PARAM_FLOAT, 0, value),
        };

        Self {
            t,
            intval,
            doubleval,
            gradient: ptr::null_mut(),
            image: ptr::null_mut(),
        }
    }
}

pub type PfNewFn = unsafe extern "C" fn() -> *mut PfObj;

pub type PfConcurrencyFn = unsafe extern "C" fn() -> c_int;

pub type GetDefaultsFn =
    unsafe extern "C" fn(p: *mut PfObj, pos_params: *mut c_double, params: *mut SParam, nparams: c_int);

pub type InitFn =
    unsafe extern "C" fn(p: *mut PfObj, pos_params: *mut c_double, params: *mut SParam, nparams: c_int);

pub type CalcFn = unsafe extern "C" fn(
    p: *mut PfObj,
    params: *const c_double,
    n_iters: c_int,
    warp_param: c_int,
    min_period_iter: c_int,
    period_tolerance: c_double,
    x: c_int,
    y: c_int,
    aa: c_int,
    out_iters: *mut c_int,
    out_fate: *mut c_int,
    out_dist: *mut c_double,
    out_solid: *mut c_int,
    out_direct_colour: *mut c_int,
    out_colours: *mut c_double,
);

pub type KillFn = unsafe extern "C" fn(p: *mut PfObj);

#[repr(C)]
#[derive(Debug)]
pub struct PfVtable {
    pub get_defaults: Option<GetDefaultsFn>,
    pub init: Option<InitFn>,
    pub calc: Option<CalcFn>,
    pub kill: Option<KillFn>,
}

#[repr(C)]
#[derive(Debug)]
pub struct PfObj {
    pub vtbl: *const PfVtable,
}
