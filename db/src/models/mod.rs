pub mod attendance_record;
pub mod group;
pub mod group_member;
pub mod meeting_session;
pub mod rotation_ledger;
pub mod user;

pub use attendance_record::Entity as AttendanceRecord;
pub use group::Entity as Group;
pub use group_member::Entity as GroupMember;
pub use meeting_session::Entity as MeetingSession;
pub use rotation_ledger::Entity as RotationLedger;
pub use user::Entity as User;
