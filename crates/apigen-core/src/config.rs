//! Configuration types

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// APIGen configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Marker tokens recognised in the header
    pub markers: MarkerConfig,

    /// Function-to-type association settings
    pub association: AssociationConfig,
}

impl Config {
    /// Parse a YAML configuration document
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Parse a JSON configuration document
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load a configuration file; `.json` files are read as JSON, anything else as YAML
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }
}

/// Marker macros that annotate the public header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// Prefix of an exported single-line function declaration
    pub export_function: String,

    /// Start of an exported enum block
    pub enum_start: String,

    /// Start of an exported struct block
    pub struct_start: String,

    /// Private/opaque handle declaration, name given in parentheses
    pub private_type: String,

    /// Immutability qualifier
    pub const_qualifier: String,

    /// Reference wrapper, `ref(type)`
    pub reference: String,

    /// Array wrapper, `ref_arr(type)`
    pub array: String,

    /// Default-value wrapper following a parameter name, `default(value)`
    pub default_value: String,

    /// Variadic parameter
    pub variadic: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            export_function: "SK_API".into(),
            enum_start: "typedef enum".into(),
            struct_start: "typedef struct".into(),
            private_type: "SK_DeclarePrivateType".into(),
            const_qualifier: "const".into(),
            reference: "sk_ref".into(),
            array: "sk_ref_arr".into(),
            default_value: "sk_default".into(),
            variadic: "...".into(),
        }
    }
}

/// Function-to-type association settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssociationConfig {
    /// Name of the pseudo-type that owns ungrouped functions
    pub global_type: String,

    /// Handle-type suffix; a type name ending with it loses its final
    /// character before prefix comparison (`mesh_t` matches `mesh_*`)
    pub handle_suffix: String,
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self {
            global_type: "sk".into(),
            handle_suffix: "_t".into(),
        }
    }
}
