//! Test helper utilities for aozora-build

#![allow(dead_code)]

pub mod archive;
pub mod db_utils;

pub use archive::{ArchiveBuilder, WorkFixture};
pub use db_utils::{execute_on_output, get_table_columns, get_table_names, open_output, ColumnInfo};
