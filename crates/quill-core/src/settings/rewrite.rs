//! Find/replace stage settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::rewrite::RewriteOptions;

/// Settings for the deterministic text-transform stage.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RewriteSettings {
    /// Rules file: `.json` for the structured format, anything else for
    /// newline-delimited `find,replace` pairs
    #[serde(default)]
    pub rules_file: Option<PathBuf>,

    #[serde(default)]
    pub remove_trailing_period: bool,

    #[serde(default)]
    pub add_trailing_space: bool,

    #[serde(default)]
    pub remove_capitalization: bool,
}

impl RewriteSettings {
    pub fn options(&self) -> RewriteOptions {
        RewriteOptions {
            remove_trailing_period: self.remove_trailing_period,
            add_trailing_space: self.add_trailing_space,
            remove_capitalization: self.remove_capitalization,
        }
    }
}
