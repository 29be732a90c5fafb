pub mod attendance_logger;
pub mod ledger;
pub mod presence_verifier;
