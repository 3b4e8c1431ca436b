mod command;
mod error;
mod event;
mod state;
mod units;

pub use command::{Command, Request, RequestId};
pub use error::EngineError;
pub use event::{Event, Reply, ReplyValue, SpectrumFrame};
pub use state::{DeviceKind, Subsystem};
pub use units::{Hertz, Milliseconds};
