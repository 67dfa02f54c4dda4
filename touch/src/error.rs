use core::fmt;

use crate::PadId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchError {
    /// The pad does not exist on this controller
    InvalidPad(PadId),
    /// A software-triggered measurement did not complete
    Timeout,
    /// A filtered count was requested before the filter was started
    FilterNotStarted,
    /// The filter has not seen a sample for this pad yet
    NotReady,
    /// The periodic timer driving the filter could not be started
    FilterTimer,
}

impl fmt::Display for TouchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TouchError::InvalidPad(pad) => write!(f, "invalid touch pad {}", pad),
            TouchError::Timeout => f.write_str("touch measurement timed out"),
            TouchError::FilterNotStarted => f.write_str("touch filter not started"),
            TouchError::NotReady => f.write_str("touch filter has no sample yet"),
            TouchError::FilterTimer => f.write_str("touch filter timer did not start"),
        }
    }
}
