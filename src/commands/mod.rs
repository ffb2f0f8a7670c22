//! Command implementations

pub mod base;
pub mod ls;
pub mod publish;
pub mod validators;

pub use base::{Command, CommandContext};
pub use ls::ListCommand;
pub use publish::{PublishCommand, RepositoryChoice};
