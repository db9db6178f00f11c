use crate::error::ClientError;

/// Sun/shade trade-off weight, always within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Beta(f64);

impl Beta {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 1.0;
    pub const DEFAULT: f64 = 0.5;

    /// Clamps finite input into `[0, 1]`; non-finite input is rejected.
    pub fn new(value: f64) -> Result<Self, ClientError> {
        if !value.is_finite() {
            return Err(ClientError::InvalidBeta(value));
        }
        Ok(Self(value.clamp(Self::MIN, Self::MAX)))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Beta {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Scalar route parameters: β and the selected time index.
///
/// Pure state. Refresh signalling and index validation happen in
/// [`crate::session::Session`], which owns this store next to the shade
/// catalog.
#[derive(Debug, Default, Clone)]
pub struct ParameterStore {
    beta: Beta,
    time_index: Option<usize>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn beta(&self) -> Beta {
        self.beta
    }

    /// Stores the clamped value and returns it.
    pub fn set_beta(&mut self, value: f64) -> Result<Beta, ClientError> {
        self.beta = Beta::new(value)?;
        Ok(self.beta)
    }

    pub fn time_index(&self) -> Option<usize> {
        self.time_index
    }

    pub(crate) fn set_time_index(&mut self, index: usize) {
        self.time_index = Some(index);
    }
}
