//! 报表活动：编排器调用的无状态工作单元

pub mod artifacts;
pub mod handlers;
pub mod report_activity;

pub use report_activity::ReportActivity;
