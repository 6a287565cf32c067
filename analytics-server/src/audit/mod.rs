//! Consistency audit
//!
//! - [`service`] - independent recomputation and severity classification
//! - [`alert`] - sinks for critical drift alerts
//! - [`scheduler`] - periodic audit over a trailing window

pub mod alert;
pub mod scheduler;
pub mod service;

pub use alert::{AlertSink, BroadcastAlertSink, FanoutAlertSink, TracingAlertSink};
pub use scheduler::AuditScheduler;
pub use service::ConsistencyAuditor;
