pub mod schedule_view;

pub use schedule_view::{AbsenceView, EmployeeView, EntryView, ScheduleView, ShiftView};
