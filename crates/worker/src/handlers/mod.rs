//! 各类报表作业的处理函数

pub mod discovery;
pub mod fund_report;
pub mod peer_summary;
pub mod period_attribution;
