//! Rotating-token attendance core: meeting sessions, token rotation, scan
//! validation and the attendance ledger.

pub mod attendance;
pub mod clock;
pub mod error;
pub mod events;
pub mod policy;
pub mod roles;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod token;

#[cfg(test)]
mod test_support;

pub use attendance::{AttendanceRecorder, ScanReceipt};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::AttendanceError;
pub use roles::{Actor, Capability, Role};
pub use scheduler::RotationScheduler;
pub use session::{ActiveToken, SessionManager, StartedSession};
pub use settings::AttendanceSettings;
