pub mod add_command;
pub mod pool_options;
pub mod query_commands;
pub mod spend_command;

pub use self::{add_command::*, pool_options::*, query_commands::*, spend_command::*};
