// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const USER_REGISTERED: &str = "auth.register";
pub const LOGIN_SUCCESS: &str = "auth.login.success";
pub const LOGIN_FAILURE: &str = "auth.login.failure";
pub const GUARD_REJECTED: &str = "auth.guard.rejected";
pub const DEVICE_CREATED: &str = "device.created";
pub const DEVICE_REMOVED: &str = "device.removed";
