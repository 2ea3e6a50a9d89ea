pub mod absence;
pub mod configuration;
pub mod employee;
pub mod holiday;
pub mod schedule;
pub mod shift;

pub use absence::Absence;
pub use configuration::{GeneratorParameters, HourLimit, LaborLawRule, StaffingTemplate};
pub use employee::{Employee, Role};
pub use holiday::Holiday;
pub use schedule::{MonthlySchedule, ScheduleEntry};
pub use shift::Shift;
