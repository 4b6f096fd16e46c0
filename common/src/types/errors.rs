use std::fmt;
use std::fmt::Formatter;
use crate::types::StopKey;

#[derive(thiserror::Error, Debug)]
pub struct UnknownStopError(pub StopKey);

impl fmt::Display for UnknownStopError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown stop '{}'", self.0)
    }
}
