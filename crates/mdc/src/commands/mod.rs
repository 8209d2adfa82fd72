//! CLI command implementations.

pub(crate) mod convert;
pub(crate) mod styles;

pub(crate) use convert::ConvertArgs;
pub(crate) use styles::StylesArgs;
