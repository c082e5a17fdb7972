pub mod dto;
pub mod gate;
pub mod reset;
pub mod service;

pub use dto::{ConsumeResponse, Remaining, ResetResponse, UsageCheckResponse, UsageStatsResponse};
pub use gate::{authorize, Allowance, EntitlementDecision, GUEST_ALLOWANCE};
pub use reset::DailyResetPolicy;
pub use service::{ConsumeOutcome, UsageCheck, UsageService};
