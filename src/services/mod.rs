pub mod attendance;
pub mod registry;
pub mod scheduling;
pub mod stats;

pub use attendance::AttendanceRecorder;
pub use registry::Registry;
pub use scheduling::Scheduler;
pub use stats::TeacherReports;
