pub mod m202510010001_create_users;
pub mod m202510010002_create_groups;
pub mod m202510010003_create_meeting_sessions;
pub mod m202510010004_create_rotation_ledger;
pub mod m202510010005_create_attendance_records;
