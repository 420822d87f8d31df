// src/config/mod.rs
//! Run configuration: credentials from the environment, ranking tables and sources from TOML.

pub mod digest;
pub mod env;

pub use digest::{
    AnnotationMode, CategoryRule, DigestConfig, DigestSection, FilterMode, SourceCfg, Templates,
};
pub use env::{Settings, SmtpSettings};
