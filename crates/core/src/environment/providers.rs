//! Environment provider implementations

use super::{EnvironmentField, EnvironmentSample};
use crate::core_types::units::Seconds;
use crate::error::EnvironmentError;

/// Supplies the environment field for each tick
///
/// `tick` is the zero-based index of the tick about to run and `start` the
/// simulation time at which it starts. Returning an error halts the run at
/// the previous tick.
pub trait EnvironmentProvider {
    /// Materialize the field for `tick`
    ///
    /// # Errors
    /// Any provider failure; the scheduler reports it as
    /// `EnvironmentUnavailable`.
    fn field(&mut self, tick: u64, start: Seconds) -> Result<EnvironmentField, EnvironmentError>;
}

impl<F> EnvironmentProvider for F
where
    F: FnMut(u64, Seconds) -> Result<EnvironmentField, EnvironmentError>,
{
    fn field(&mut self, tick: u64, start: Seconds) -> Result<EnvironmentField, EnvironmentError> {
        self(tick, start)
    }
}

/// The same field for every tick
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantEnvironment {
    field: EnvironmentField,
}

impl ConstantEnvironment {
    /// Constant field
    #[must_use]
    pub fn new(field: EnvironmentField) -> Self {
        Self { field }
    }

    /// Same sample everywhere, every tick
    #[must_use]
    pub fn uniform(sample: EnvironmentSample) -> Self {
        Self::new(EnvironmentField::Uniform(sample))
    }
}

impl EnvironmentProvider for ConstantEnvironment {
    fn field(&mut self, _tick: u64, _start: Seconds) -> Result<EnvironmentField, EnvironmentError> {
        Ok(self.field.clone())
    }
}

/// A pre-recorded sequence of fields indexed by tick
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceEnvironment {
    fields: Vec<EnvironmentField>,
    hold_last: bool,
}

impl SequenceEnvironment {
    /// Sequence that fails once exhausted
    #[must_use]
    pub fn new(fields: Vec<EnvironmentField>) -> Self {
        Self {
            fields,
            hold_last: false,
        }
    }

    /// Keep returning the last field once the sequence is exhausted
    #[must_use]
    pub fn holding_last(mut self) -> Self {
        self.hold_last = true;
        self
    }

    /// Number of recorded fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the sequence is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl EnvironmentProvider for SequenceEnvironment {
    fn field(&mut self, tick: u64, _start: Seconds) -> Result<EnvironmentField, EnvironmentError> {
        let exhausted = || EnvironmentError::Exhausted {
            tick,
            available: self.fields.len(),
        };
        let index = usize::try_from(tick).map_err(|_| exhausted())?;
        match self.fields.get(index) {
            Some(field) => Ok(field.clone()),
            None if self.hold_last => self.fields.last().cloned().ok_or_else(exhausted),
            None => Err(exhausted()),
        }
    }
}
