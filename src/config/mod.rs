//! The household's budget, member roster and cleanup bookkeeping.

mod domain;
mod store;

pub use domain::{Configuration, Member, MemberId, MemberName, UNKNOWN_MEMBER_NAME};
pub use store::{CONFIG_KEY, ConfigStore};
