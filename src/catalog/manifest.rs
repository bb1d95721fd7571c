//! Catalog manifests: declarative family metadata loaded from TOML
//!
//! A catalog declares every element family the registry will service: which
//! more-general family it extends, which built-in behavior table drives it,
//! and the packing properties its children carry. The built-in catalog covers
//! the standard families; applications may load their own.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::model::{PropertyValue, ValueKind};

use super::CatalogError;

/// Built-in capability tables a family can bind to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Leaf element, refuses children
    Widget,
    /// Generic container: one placeholder slot when empty
    Container,
    /// Linear container ordered by a `position` packing property
    LinearBox,
    /// Two-axis container addressed by attach/span packing properties
    Grid,
    /// Two-slot split container
    Paned,
    /// Page container with tab special children
    Notebook,
    /// Typed item list (menu shells, column hosts); no placeholders
    ItemHost,
}

impl Behavior {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "widget" => Some(Behavior::Widget),
            "container" => Some(Behavior::Container),
            "box" => Some(Behavior::LinearBox),
            "grid" => Some(Behavior::Grid),
            "paned" => Some(Behavior::Paned),
            "notebook" => Some(Behavior::Notebook),
            "item-host" => Some(Behavior::ItemHost),
            _ => None,
        }
    }
}

/// One declared packing property
#[derive(Debug, Clone)]
pub struct PackingDecl {
    pub name: String,
    pub kind: ValueKind,
    pub default: PropertyValue,
    /// Whether the value is copied forward when a child is replaced in its
    /// slot; transient state is declared `transfer = false`
    pub transfer: bool,
}

/// Internal child built by a family when an element is created
#[derive(Debug, Clone)]
pub struct InternalChildDecl {
    pub role: String,
    pub family: String,
}

/// One family declaration, as read from the manifest (inheritance not yet
/// resolved; the registry merges chains)
#[derive(Debug, Clone)]
pub struct FamilyDecl {
    pub name: String,
    pub extends: Option<String>,
    pub behavior: Behavior,
    pub uses_placeholders: Option<bool>,
    pub toplevel: Option<bool>,
    pub locks_children: Option<bool>,
    pub accepts: Option<Vec<String>>,
    pub capacity_property: Option<String>,
    pub special_child_type: Option<String>,
    pub internal_child: Option<InternalChildDecl>,
    pub packing: Vec<PackingDecl>,
}

/// A parsed catalog: the family declarations in manifest order
#[derive(Debug, Clone)]
pub struct Catalog {
    pub families: Vec<FamilyDecl>,
}

/// TOML structures for deserializing catalogs
#[derive(Deserialize)]
struct TomlCatalog {
    #[serde(default)]
    family: Vec<TomlFamily>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct TomlFamily {
    name: String,
    extends: Option<String>,
    behavior: String,
    uses_placeholders: Option<bool>,
    toplevel: Option<bool>,
    locks_children: Option<bool>,
    accepts: Option<Vec<String>>,
    capacity_property: Option<String>,
    special_child_type: Option<String>,
    internal_child: Option<TomlInternalChild>,
    #[serde(default)]
    packing: Vec<TomlPacking>,
}

#[derive(Deserialize)]
struct TomlInternalChild {
    role: String,
    family: String,
}

#[derive(Deserialize)]
struct TomlPacking {
    name: String,
    kind: String,
    default: toml::Value,
    #[serde(default = "transfer_default")]
    transfer: bool,
}

fn transfer_default() -> bool {
    true
}

/// The standard catalog shipped with the crate
const STANDARD_CATALOG: &str = r#"
[[family]]
name = "widget"
behavior = "widget"

[[family]]
name = "button"
extends = "widget"
behavior = "widget"

[[family]]
name = "label"
extends = "widget"
behavior = "widget"

[[family]]
name = "menu-item"
extends = "widget"
behavior = "widget"

[[family]]
name = "cell"
extends = "widget"
behavior = "widget"

[[family]]
name = "container"
extends = "widget"
behavior = "container"
uses-placeholders = true

[[family]]
name = "window"
extends = "container"
behavior = "container"
toplevel = true

[[family]]
name = "dialog"
extends = "window"
behavior = "container"
internal-child = { role = "content", family = "box" }

[[family]]
name = "box"
extends = "container"
behavior = "box"
capacity-property = "size"

[[family.packing]]
name = "position"
kind = "int"
default = 0

[[family]]
name = "grid"
extends = "container"
behavior = "grid"

[[family.packing]]
name = "left-attach"
kind = "int"
default = 0

[[family.packing]]
name = "top-attach"
kind = "int"
default = 0

[[family.packing]]
name = "width"
kind = "int"
default = 1

[[family.packing]]
name = "height"
kind = "int"
default = 1

[[family]]
name = "paned"
extends = "container"
behavior = "paned"

[[family.packing]]
name = "pane"
kind = "token"
default = "start"

[[family]]
name = "notebook"
extends = "container"
behavior = "notebook"
capacity-property = "pages"
special-child-type = "tab"

[[family.packing]]
name = "position"
kind = "int"
default = 0

[[family.packing]]
name = "detachable"
kind = "bool"
default = false
transfer = false

[[family]]
name = "menu-bar"
extends = "container"
behavior = "item-host"
uses-placeholders = false
accepts = ["menu-item"]

[[family.packing]]
name = "position"
kind = "int"
default = 0

[[family]]
name = "column-view"
extends = "container"
behavior = "item-host"
uses-placeholders = false
locks-children = true
accepts = ["column"]

[[family.packing]]
name = "position"
kind = "int"
default = 0

[[family]]
name = "column"
extends = "container"
behavior = "item-host"
uses-placeholders = false
accepts = ["cell"]

[[family.packing]]
name = "position"
kind = "int"
default = 0
"#;

impl Catalog {
    /// Load a catalog from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load a catalog from a TOML string
    pub fn from_str(content: &str) -> Result<Self, CatalogError> {
        let parsed: TomlCatalog = toml::from_str(content)?;

        let mut seen: HashMap<String, ()> = HashMap::new();
        let mut families = Vec::with_capacity(parsed.family.len());
        for raw in parsed.family {
            if seen.insert(raw.name.clone(), ()).is_some() {
                return Err(CatalogError::DuplicateFamily { name: raw.name });
            }
            families.push(convert_family(raw)?);
        }

        Ok(Catalog { families })
    }

    /// The catalog of standard families
    pub fn standard() -> Self {
        Self::from_str(STANDARD_CATALOG).expect("Standard catalog should be valid TOML")
    }

    pub fn family(&self, name: &str) -> Option<&FamilyDecl> {
        self.families.iter().find(|f| f.name == name)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn convert_family(raw: TomlFamily) -> Result<FamilyDecl, CatalogError> {
    let behavior =
        Behavior::from_name(&raw.behavior).ok_or_else(|| CatalogError::InvalidManifest {
            family: raw.name.clone(),
            message: format!("unknown behavior '{}'", raw.behavior),
        })?;

    let mut packing = Vec::with_capacity(raw.packing.len());
    for p in raw.packing {
        packing.push(convert_packing(&raw.name, p)?);
    }

    Ok(FamilyDecl {
        name: raw.name,
        extends: raw.extends,
        behavior,
        uses_placeholders: raw.uses_placeholders,
        toplevel: raw.toplevel,
        locks_children: raw.locks_children,
        accepts: raw.accepts,
        capacity_property: raw.capacity_property,
        special_child_type: raw.special_child_type,
        internal_child: raw.internal_child.map(|i| InternalChildDecl {
            role: i.role,
            family: i.family,
        }),
        packing,
    })
}

fn convert_packing(family: &str, raw: TomlPacking) -> Result<PackingDecl, CatalogError> {
    let kind = ValueKind::from_name(&raw.kind).ok_or_else(|| CatalogError::InvalidManifest {
        family: family.to_string(),
        message: format!("unknown value kind '{}' for packing '{}'", raw.kind, raw.name),
    })?;

    let default = match (kind, raw.default) {
        (ValueKind::Int, toml::Value::Integer(v)) => PropertyValue::Int(v as i32),
        (ValueKind::Bool, toml::Value::Boolean(v)) => PropertyValue::Bool(v),
        (ValueKind::Text, toml::Value::String(v)) => PropertyValue::Text(v),
        (ValueKind::Token, toml::Value::String(v)) => PropertyValue::Token(v),
        (_, other) => {
            return Err(CatalogError::InvalidManifest {
                family: family.to_string(),
                message: format!(
                    "default {:?} does not match kind '{}' for packing '{}'",
                    other, raw.kind, raw.name
                ),
            })
        }
    };

    Ok(PackingDecl {
        name: raw.name,
        kind,
        default,
        transfer: raw.transfer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_parses() {
        let catalog = Catalog::standard();
        assert!(catalog.family("box").is_some());
        assert!(catalog.family("grid").is_some());
        assert!(catalog.family("notebook").is_some());
        assert!(catalog.family("gizmo").is_none());
    }

    #[test]
    fn test_standard_box_declares_position() {
        let catalog = Catalog::standard();
        let boxed = catalog.family("box").expect("Should have box");
        assert_eq!(boxed.extends.as_deref(), Some("container"));
        assert_eq!(boxed.behavior, Behavior::LinearBox);
        assert_eq!(boxed.packing.len(), 1);
        assert_eq!(boxed.packing[0].name, "position");
        assert_eq!(boxed.packing[0].default, PropertyValue::Int(0));
        assert!(boxed.packing[0].transfer);
    }

    #[test]
    fn test_notebook_detachable_is_not_transferred() {
        let catalog = Catalog::standard();
        let notebook = catalog.family("notebook").expect("Should have notebook");
        let detachable = notebook
            .packing
            .iter()
            .find(|p| p.name == "detachable")
            .expect("Should declare detachable");
        assert!(!detachable.transfer);
    }

    #[test]
    fn test_duplicate_family_rejected() {
        let toml_str = r#"
[[family]]
name = "box"
behavior = "widget"

[[family]]
name = "box"
behavior = "widget"
"#;
        let result = Catalog::from_str(toml_str);
        assert!(matches!(result, Err(CatalogError::DuplicateFamily { .. })));
    }

    #[test]
    fn test_unknown_behavior_rejected() {
        let toml_str = r#"
[[family]]
name = "mystery"
behavior = "teleporter"
"#;
        let result = Catalog::from_str(toml_str);
        assert!(matches!(result, Err(CatalogError::InvalidManifest { .. })));
    }

    #[test]
    fn test_mismatched_default_rejected() {
        let toml_str = r#"
[[family]]
name = "box"
behavior = "box"

[[family.packing]]
name = "position"
kind = "int"
default = "zero"
"#;
        let result = Catalog::from_str(toml_str);
        assert!(matches!(result, Err(CatalogError::InvalidManifest { .. })));
    }

    #[test]
    fn test_invalid_toml_error() {
        let result = Catalog::from_str("this is not valid toml {{{{");
        assert!(matches!(result, Err(CatalogError::Parse(_))));
    }
}
