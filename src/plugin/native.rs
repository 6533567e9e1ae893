use std::ffi::{c_double, c_int};
use std::ptr::NonNull;
use std::sync::Arc;

use libloading::Library;
use tracing::debug;

use crate::core::actions::calculate::errors::{EvaluateError, PluginInitError};
use crate::core::actions::calculate::ports::computation_plugin::{ComputationPlugin, Concurrency};
use crate::core::data::formula_param::{FormulaParam, ParameterSpec};
use crate::core::data::image_buffer::PixelResult;
use crate::core::data::point::Point;
use crate::core::data::position_params::{N_PARAMS, PositionParams};
use crate::core::util::pixel_to_view_coords::Point4;
use crate::plugin::abi::{
    CalcFn, FATE_INSIDE, FATE_UNKNOWN, InitFn, KillFn, PfNewFn, PfObj, SParam,
};
use crate::plugin::errors::PluginLoadError;

const PERIOD_TOLERANCE: c_double = 1.0e-9;
const NO_WARP: c_int = -1;

#[derive(Debug, Copy, Clone)]
struct Entries {
    init: InitFn,
    calc: CalcFn,
    kill: KillFn,
}

/// Creates an object through `factory` and checks its vtable.
fn instantiate(factory: PfNewFn) -> Result<(NonNull<PfObj>, Entries), PluginLoadError> {
    // SAFETY: `factory` was resolved from the formula library, which outlives
    // every object it creates.
    let object = NonNull::new(unsafe { factory() }).ok_or(PluginLoadError::NullObject)?;

    // SAFETY: a non-null object returned by `pf_new` starts with its vtable pointer.
    let vtbl = unsafe { object.as_ref().vtbl };
    // SAFETY: checked for null before dereferencing.
    let vtbl = unsafe { vtbl.as_ref() }.ok_or(PluginLoadError::NullVtable("vtbl"))?;

    let entries = Entries {
        init: vtbl.init.ok_or(PluginLoadError::NullVtable("init"))?,
        calc: vtbl.calc.ok_or(PluginLoadError::NullVtable("calc"))?,
        kill: vtbl.kill.ok_or(PluginLoadError::NullVtable("kill"))?,
    };

    Ok((object, entries))
}

fn pixel_result(fate: c_int, iterations: c_int, max_iterations: u32) -> Result<PixelResult, EvaluateError> {
    if fate == FATE_UNKNOWN {
        return Err(EvaluateError::Plugin("formula left the fate unknown".to_string()));
    }

    if fate & FATE_INSIDE != 0 {
        Ok(PixelResult::inside(max_iterations))
    } else {
        Ok(PixelResult::escaped(u32::try_from(iterations).unwrap_or(0)))
    }
}

/// Point function living in a dynamically loaded formula library.
pub struct NativePlugin {
    name: String,
    spec: ParameterSpec,
    concurrency: Concurrency,
    factory: PfNewFn,
    object: Option<(NonNull<PfObj>, Entries)>,
    // Field order matters: the formula library is unloaded before the
    // support library it links against.
    _formula: Library,
    _support: Option<Arc<Library>>,
}

// SAFETY: the object pointer is only used through the formula's `init`,
// `calc` and `kill` entries. `init` and `kill` take `&mut self`; concurrent
// `calc` calls happen only when the library declared itself reentrant, and
// libraries that did not are driven from a single worker.
unsafe impl Send for NativePlugin {}
unsafe impl Sync for NativePlugin {}

impl std::fmt::Debug for NativePlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativePlugin")
            .field("name", &self.name)
            .field("concurrency", &self.concurrency)
            .field("live", &self.object.is_some())
            .finish()
    }
}

impl NativePlugin {
    pub(crate) fn new(
        name: String,
        spec: ParameterSpec,
        concurrency: Concurrency,
        factory: PfNewFn,
        formula: Library,
        support: Option<Arc<Library>>,
    ) -> Result<Self, PluginLoadError> {
        let object = instantiate(factory)?;

        Ok(Self {
            name,
            spec,
            concurrency,
            factory,
            object: Some(object),
            _formula: formula,
            _support: support,
        })
    }

    fn kill(&mut self) {
        if let Some((object, entries)) = self.object.take() {
            // SAFETY: the object is live and no `calc` call is in flight,
            // since this takes `&mut self`.
            unsafe { (entries.kill)(object.as_ptr()) };
            debug!(plugin = %self.name, "formula object killed");
        }
    }
}

impl ComputationPlugin for NativePlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameter_spec(&self) -> &ParameterSpec {
        &self.spec
    }

    fn concurrency(&self) -> Concurrency {
        self.concurrency
    }

    fn initialize(
        &mut self,
        position: &PositionParams,
        params: &[FormulaParam],
    ) -> Result<(), PluginInitError> {
        let (object, entries) = match self.object {
            Some(live) => live,
            None => {
                let live = instantiate(self.factory)
                    .map_err(|err| PluginInitError::Rejected(err.to_string()))?;
                self.object = Some(live);
                live
            }
        };

        let mut pos_params: [c_double; N_PARAMS] = *position.as_array();
        let mut raw_params: Vec<SParam> = params.iter().map(SParam::from).collect();
        let nparams = c_int::try_from(raw_params.len())
            .map_err(|_| PluginInitError::Rejected("too many parameters".to_string()))?;

        // SAFETY: both arrays are valid for the duration of the call and
        // `nparams` matches the parameter array's length.
        unsafe {
            (entries.init)(
                object.as_ptr(),
                pos_params.as_mut_ptr(),
                raw_params.as_mut_ptr(),
                nparams,
            );
        }

        Ok(())
    }

    fn evaluate(
        &self,
        point: Point4,
        pixel: Point,
        max_iterations: u32,
    ) -> Result<PixelResult, EvaluateError> {
        let (object, entries) = self.object.ok_or(EvaluateError::NotInitialized)?;
        let max = c_int::try_from(max_iterations).unwrap_or(c_int::MAX);

        let mut iterations: c_int = 0;
        let mut fate: c_int = FATE_UNKNOWN;
        let mut dist: c_double = 0.0;
        let mut solid: c_int = 0;
        let mut direct_colour: c_int = 0;
        let mut colours: [c_double; 4] = [0.0; 4];

        // SAFETY: the object is live while `&self` is borrowed and every out
        // pointer refers to a local that outlives the call.
        unsafe {
            (entries.calc)(
                object.as_ptr(),
                point.as_ptr(),
                max,
                NO_WARP,
                max,
                PERIOD_TOLERANCE,
                c_int::try_from(pixel.x).unwrap_or(c_int::MAX),
                c_int::try_from(pixel.y).unwrap_or(c_int::MAX),
                0,
                &mut iterations,
                &mut fate,
                &mut dist,
                &mut solid,
                &mut direct_colour,
                colours.as_mut_ptr(),
            );
        }

        pixel_result(fate, iterations, max_iterations)
    }

    fn teardown(&mut self) {
        self.kill();
    }
}

impl Drop for NativePlugin {
    fn drop(&mut self) {
        self.kill();
    }
}
