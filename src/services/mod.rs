pub mod click;
pub mod commission;
pub mod leveling;
pub mod notification;
pub mod payment;
pub mod withdrawal;
