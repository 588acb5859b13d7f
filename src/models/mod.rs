// Data models for the loan agency API

pub mod application;
pub mod user;

pub use application::{ApplicationGuarantor, LoanApplicationData, MaritalStatus};
pub use user::{
    ApplicationState, ProfileSummary, RepaymentScheduleItem, RepaymentStatus, UserFilters,
    UserProfile,
};
