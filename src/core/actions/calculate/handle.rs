use std::fmt;

use tracing::{debug, info};

use crate::core::actions::calculate::errors::{EvaluateError, PluginInitError};
use crate::core::actions::calculate::ports::computation_plugin::{ComputationPlugin, Concurrency};
use crate::core::data::formula_param::{FormulaParam, ParameterSpec};
use crate::core::data::image_buffer::PixelResult;
use crate::core::data::point::Point;
use crate::core::data::position_params::PositionParams;
use crate::core::util::pixel_to_view_coords::Point4;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HandleState {
    Loaded,
    Initialized,
    TornDown,
}

/// An instantiated plugin and where it is in its lifecycle.
///
/// `evaluate` is only reachable between a successful `initialize` and the
/// matching `teardown`. A torn-down handle can be initialized again for the
/// next job. Dropping an initialized handle tears it down.
pub struct ComputationHandle {
    plugin: Box<dyn ComputationPlugin>,
    state: HandleState,
}

impl fmt::Debug for ComputationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputationHandle")
            .field("plugin", &self.plugin.name())
            .field("state", &self.state)
            .finish()
    }
}

impl ComputationHandle {
    #[must_use]
    pub fn new(plugin: Box<dyn ComputationPlugin>) -> Self {
        Self {
            plugin,
            state: HandleState::Loaded,
        }
    }

    #[must_use]
    pub fn state(&self) -> HandleState {
        self.state
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state == HandleState::Initialized
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.plugin.name()
    }

    #[must_use]
    pub fn parameter_spec(&self) -> &ParameterSpec {
        self.plugin.parameter_spec()
    }

    #[must_use]
    pub fn concurrency(&self) -> Concurrency {
        self.plugin.concurrency()
    }

    /// Checks `position` and `params`, then hands them to the plugin.
    ///
    /// Nothing reaches the plugin when validation fails.
    pub fn initialize(
        &mut self,
        position: &PositionParams,
        params: &[FormulaParam],
    ) -> Result<(), PluginInitError> {
        if self.state == HandleState::Initialized {
            return Err(PluginInitError::AlreadyInitialized);
        }

        position.validate()?;
        self.plugin.parameter_spec().validate(params)?;
        self.plugin.initialize(position, params)?;
        self.state = HandleState::Initialized;

        info!(plugin = self.plugin.name(), params = params.len(), "plugin initialized");
        Ok(())
    }

    #[inline]
    pub fn evaluate(
        &self,
        point: Point4,
        pixel: Point,
        max_iterations: u32,
    ) -> Result<PixelResult, EvaluateError> {
        if self.state != HandleState::Initialized {
            return Err(EvaluateError::NotInitialized);
        }

        self.plugin.evaluate(point, pixel, max_iterations)
    }

    /// Returns whether the plugin was live and has now been torn down.
    pub fn teardown(&mut self) -> bool {
        if self.state != HandleState::Initialized {
            return false;
        }

        self.plugin.teardown();
        self.state = HandleState::TornDown;
        debug!(plugin = self.plugin.name(), "plugin torn down");
        true
    }
}

impl Drop for ComputationHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}
