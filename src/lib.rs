#![allow(clippy::result_large_err)]

pub mod cli;
pub mod config;
pub mod error;
pub mod java;
pub mod migrate;
pub mod report;
