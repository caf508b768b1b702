//! Function-to-type association
//!
//! Every function is attached to the first type, in declaration order, whose
//! name it starts with. This is a first-match policy, not longest-prefix:
//! with types `foo` and `foo_bar` declared in that order, `foo_bar_init`
//! belongs to `foo`. Functions matching no type go to the global pseudo-type.

use apigen_core::{AssociationConfig, Function, FunctionId, TypeDef};
use tracing::debug;

/// Links parsed functions to their owning types
pub struct AssociationResolver<'a> {
    config: &'a AssociationConfig,
}

impl<'a> AssociationResolver<'a> {
    pub fn new(config: &'a AssociationConfig) -> Self {
        Self { config }
    }

    /// Name prefix a type's functions share; handle types drop the final
    /// character of their suffix (`mesh_t` -> `mesh_`)
    pub fn prefix<'t>(&self, type_name: &'t str) -> &'t str {
        let suffix = &self.config.handle_suffix;
        if !suffix.is_empty() && type_name.len() > suffix.len() && type_name.ends_with(suffix.as_str()) {
            let last = type_name.char_indices().last().map_or(0, |(i, _)| i);
            &type_name[..last]
        } else {
            type_name
        }
    }

    /// Index of the type `function_name` belongs to by prefix, if any
    pub fn owner(&self, types: &[TypeDef], function_name: &str) -> Option<usize> {
        types
            .iter()
            .position(|ty| function_name.starts_with(self.prefix(&ty.name)))
    }

    /// Attach every function to a type and set its instance binding
    pub fn resolve(&self, types: &mut [TypeDef], functions: &mut [Function]) {
        let global = types.iter().position(|t| t.is_global);

        for (index, function) in functions.iter_mut().enumerate() {
            let Some(owner) = self.owner(types, &function.name).or(global) else {
                debug!("No type for function {}", function.name);
                continue;
            };
            let ty = &mut types[owner];

            function.is_instance_bound = function
                .parameters
                .first()
                .and_then(|p| p.type_name())
                .is_some_and(|name| name == ty.name);
            ty.functions.push(FunctionId(index));

            debug!(
                "Attached {} to {} ({})",
                function.name,
                ty.name,
                if function.is_instance_bound { "instance" } else { "static" }
            );
        }
    }
}
