//! Binding profiles stored as YAML.
//!
//! A profile carries everything needed to build a [`Converter`]:
//!
//! ```yaml
//! columns: [Name, Age, City]
//! annotation_key: excel
//! template_mode: strict
//! lookahead: 8
//! encoding: windows-1252
//! delimiter: pipe
//! ```
//!
//! Only `columns` is required.

use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    converter::{Converter, DEFAULT_ANNOTATION_KEY, Options},
    error::{BindError, Result},
    sheet,
    template::{DEFAULT_LOOKAHEAD, TemplateMode},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    pub columns: Vec<String>,
    #[serde(default = "default_annotation_key")]
    pub annotation_key: String,
    #[serde(default)]
    pub template_mode: TemplateMode,
    #[serde(default = "default_lookahead")]
    pub lookahead: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// Delimiter for text files whose extension does not imply one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
}

fn default_annotation_key() -> String {
    DEFAULT_ANNOTATION_KEY.to_string()
}

fn default_lookahead() -> usize {
    DEFAULT_LOOKAHEAD
}

impl Profile {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            annotation_key: default_annotation_key(),
            template_mode: TemplateMode::default(),
            lookahead: default_lookahead(),
            encoding: None,
            delimiter: None,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|err| BindError::io(path, err))?;
        serde_yaml::from_reader(BufReader::new(file)).map_err(|err| BindError::Config {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    pub fn options(&self) -> Result<Options> {
        Ok(Options {
            annotation_key: self.annotation_key.clone(),
            template_mode: self.template_mode,
            lookahead: self.lookahead,
            encoding: sheet::resolve_encoding(self.encoding.as_deref())?,
            delimiter: self
                .delimiter
                .as_deref()
                .map(sheet::parse_delimiter)
                .transpose()?,
        })
    }

    /// Builds a converter; a repeated column is reported, not panicked on.
    pub fn converter(&self) -> Result<Converter> {
        Converter::try_with_options(self.columns.iter().cloned(), self.options()?)
    }
}
