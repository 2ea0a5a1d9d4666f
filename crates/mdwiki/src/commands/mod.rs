//! CLI command implementations.

mod build;
mod check;
mod normalize;

pub(crate) use build::BuildArgs;
pub(crate) use check::CheckArgs;
pub(crate) use normalize::NormalizeArgs;
