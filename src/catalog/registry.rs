//! Adaptor registry: resolves type identifiers to capability tables
//!
//! Construction walks the family graph in dependency order so that every
//! family's more-general adaptor exists before the family itself is built.
//! The registry is immutable once constructed.

use std::collections::HashMap;
use std::sync::Arc;

use crate::adaptor::{
    container::ContainerAdaptor, grid::GridAdaptor, item_host::ItemHostAdaptor,
    linear::BoxAdaptor, notebook::NotebookAdaptor, paned::PanedAdaptor, widget::WidgetAdaptor,
    ArcAdaptor,
};

use super::manifest::{Behavior, Catalog, FamilyDecl, InternalChildDecl, PackingDecl};
use super::CatalogError;

/// Fully resolved family metadata: the manifest declaration with inherited
/// values merged down the extension chain.
#[derive(Debug, Clone)]
pub struct FamilySpec {
    pub name: String,
    pub behavior: Behavior,
    pub uses_placeholders: bool,
    pub toplevel: bool,
    pub locks_children: bool,
    /// Families this container accepts as children; `None` accepts any
    pub accepts: Option<Vec<String>>,
    /// Element property holding the declared capacity, when the family has one
    pub capacity_property: Option<String>,
    /// Attribute name for special child slots ("tab" children etc.)
    pub special_child_type: Option<String>,
    pub internal_child: Option<InternalChildDecl>,
    /// Declared packing properties, inherited entries first
    pub packing: Vec<PackingDecl>,
    /// Ancestry, self first, most general last
    pub chain: Vec<String>,
}

impl FamilySpec {
    pub fn packing_decl(&self, name: &str) -> Option<&PackingDecl> {
        self.packing.iter().find(|p| p.name == name)
    }

    /// Whether this family is or extends `ancestor`
    pub fn is_a(&self, ancestor: &str) -> bool {
        self.chain.iter().any(|n| n == ancestor)
    }
}

/// Maps type identifiers to adaptors and resolved family metadata
pub struct AdaptorRegistry {
    specs: HashMap<String, Arc<FamilySpec>>,
    adaptors: HashMap<String, ArcAdaptor>,
}

impl AdaptorRegistry {
    /// Build a registry from a catalog. Fails on cycles, on `extends`
    /// references to undeclared families, and on behaviors declared without
    /// the general family they require.
    pub fn from_catalog(catalog: &Catalog) -> Result<Self, CatalogError> {
        let mut registry = AdaptorRegistry {
            specs: HashMap::new(),
            adaptors: HashMap::new(),
        };

        let decls: HashMap<&str, &FamilyDecl> = catalog
            .families
            .iter()
            .map(|f| (f.name.as_str(), f))
            .collect();

        for decl in &catalog.families {
            let mut stack = Vec::new();
            registry.build_family(&decl.name, &decls, &mut stack)?;
        }

        for spec in registry.specs.values() {
            if let Some(internal) = &spec.internal_child {
                if !registry.adaptors.contains_key(internal.family.as_str()) {
                    return Err(CatalogError::InvalidManifest {
                        family: spec.name.clone(),
                        message: format!(
                            "internal child names undeclared family '{}'",
                            internal.family
                        ),
                    });
                }
            }
        }

        Ok(registry)
    }

    /// Registry over the standard catalog
    pub fn standard() -> Result<Self, CatalogError> {
        Self::from_catalog(&Catalog::standard())
    }

    fn build_family(
        &mut self,
        name: &str,
        decls: &HashMap<&str, &FamilyDecl>,
        stack: &mut Vec<String>,
    ) -> Result<(), CatalogError> {
        if self.specs.contains_key(name) {
            return Ok(());
        }
        if stack.iter().any(|n| n == name) {
            let mut chain = stack.clone();
            chain.push(name.to_string());
            return Err(CatalogError::CyclicFamilyGraph { chain });
        }

        let decl = decls
            .get(name)
            .copied()
            .ok_or_else(|| CatalogError::unknown_type(name))?;

        let general_spec = match &decl.extends {
            Some(parent) => {
                stack.push(name.to_string());
                self.build_family(parent, decls, stack)?;
                stack.pop();
                Some(self.specs[parent.as_str()].clone())
            }
            None => None,
        };

        let spec = Arc::new(merge_spec(decl, general_spec.as_deref()));
        let general = decl
            .extends
            .as_ref()
            .map(|parent| self.adaptors[parent.as_str()].clone());

        let adaptor = instantiate(decl, general)?;
        self.specs.insert(name.to_string(), spec);
        self.adaptors.insert(name.to_string(), adaptor);
        Ok(())
    }

    /// Resolve the adaptor servicing a type identifier
    pub fn resolve(&self, type_identifier: &str) -> Result<&ArcAdaptor, CatalogError> {
        self.adaptors
            .get(type_identifier)
            .ok_or_else(|| CatalogError::unknown_type(type_identifier))
    }

    /// Resolved metadata for a family
    pub fn spec(&self, type_identifier: &str) -> Result<&Arc<FamilySpec>, CatalogError> {
        self.specs
            .get(type_identifier)
            .ok_or_else(|| CatalogError::unknown_type(type_identifier))
    }

    pub fn contains(&self, type_identifier: &str) -> bool {
        self.adaptors.contains_key(type_identifier)
    }

    /// Whether `family` is or extends `ancestor`
    pub fn is_a(&self, family: &str, ancestor: &str) -> bool {
        self.specs.get(family).map_or(false, |s| s.is_a(ancestor))
    }

    pub fn family_names(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(|s| s.as_str())
    }
}

fn merge_spec(decl: &FamilyDecl, general: Option<&FamilySpec>) -> FamilySpec {
    let mut packing = general.map(|g| g.packing.clone()).unwrap_or_default();
    for own in &decl.packing {
        match packing.iter_mut().find(|p| p.name == own.name) {
            Some(inherited) => *inherited = own.clone(),
            None => packing.push(own.clone()),
        }
    }

    let mut chain = vec![decl.name.clone()];
    if let Some(g) = general {
        chain.extend(g.chain.iter().cloned());
    }

    FamilySpec {
        name: decl.name.clone(),
        behavior: decl.behavior,
        uses_placeholders: decl
            .uses_placeholders
            .or(general.map(|g| g.uses_placeholders))
            .unwrap_or(false),
        toplevel: decl.toplevel.or(general.map(|g| g.toplevel)).unwrap_or(false),
        locks_children: decl
            .locks_children
            .or(general.map(|g| g.locks_children))
            .unwrap_or(false),
        accepts: decl
            .accepts
            .clone()
            .or_else(|| general.and_then(|g| g.accepts.clone())),
        capacity_property: decl
            .capacity_property
            .clone()
            .or_else(|| general.and_then(|g| g.capacity_property.clone())),
        special_child_type: decl
            .special_child_type
            .clone()
            .or_else(|| general.and_then(|g| g.special_child_type.clone())),
        internal_child: decl
            .internal_child
            .clone()
            .or_else(|| general.and_then(|g| g.internal_child.clone())),
        packing,
        chain,
    }
}

fn instantiate(decl: &FamilyDecl, general: Option<ArcAdaptor>) -> Result<ArcAdaptor, CatalogError> {
    let require_general = |general: Option<ArcAdaptor>| {
        general.ok_or_else(|| CatalogError::InvalidManifest {
            family: decl.name.clone(),
            message: format!("behavior {:?} requires an 'extends' family", decl.behavior),
        })
    };

    let adaptor: ArcAdaptor = match decl.behavior {
        Behavior::Widget => Arc::new(WidgetAdaptor::new(general)),
        Behavior::Container => Arc::new(ContainerAdaptor::new(require_general(general)?)),
        Behavior::LinearBox => Arc::new(BoxAdaptor::new(require_general(general)?)),
        Behavior::Grid => Arc::new(GridAdaptor::new(require_general(general)?)),
        Behavior::Paned => Arc::new(PanedAdaptor::new(require_general(general)?)),
        Behavior::Notebook => Arc::new(NotebookAdaptor::new(require_general(general)?)),
        Behavior::ItemHost => Arc::new(ItemHostAdaptor::new(require_general(general)?)),
    };
    Ok(adaptor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_resolves_families() {
        let registry = AdaptorRegistry::standard().expect("Should build");
        assert!(registry.resolve("box").is_ok());
        assert!(registry.resolve("grid").is_ok());
        assert!(registry.resolve("window").is_ok());
        assert!(matches!(
            registry.resolve("gizmo"),
            Err(CatalogError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_chain_resolution() {
        let registry = AdaptorRegistry::standard().expect("Should build");
        assert!(registry.is_a("box", "container"));
        assert!(registry.is_a("box", "widget"));
        assert!(registry.is_a("dialog", "window"));
        assert!(!registry.is_a("button", "container"));
    }

    #[test]
    fn test_cycle_detected() {
        let catalog = Catalog::from_str(
            r#"
[[family]]
name = "a"
extends = "b"
behavior = "widget"

[[family]]
name = "b"
extends = "a"
behavior = "widget"
"#,
        )
        .expect("Should parse");
        let result = AdaptorRegistry::from_catalog(&catalog);
        assert!(matches!(
            result,
            Err(CatalogError::CyclicFamilyGraph { .. })
        ));
    }

    #[test]
    fn test_missing_extends_is_unknown_type() {
        let catalog = Catalog::from_str(
            r#"
[[family]]
name = "orphan"
extends = "nowhere"
behavior = "widget"
"#,
        )
        .expect("Should parse");
        let result = AdaptorRegistry::from_catalog(&catalog);
        assert!(matches!(result, Err(CatalogError::UnknownType { .. })));
    }

    #[test]
    fn test_packing_decls_inherited_and_merged() {
        let registry = AdaptorRegistry::standard().expect("Should build");
        let grid = registry.spec("grid").expect("Should resolve");
        let names: Vec<&str> = grid.packing.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["left-attach", "top-attach", "width", "height"]);

        let dialog = registry.spec("dialog").expect("Should resolve");
        assert!(dialog.uses_placeholders);
        assert!(dialog.toplevel);
        assert!(dialog.internal_child.is_some());
    }
}
