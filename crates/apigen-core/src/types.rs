//! IR type definitions
//!
//! The IR is built once per header by the parser and handed to backends
//! read-only. Functions live in one flat list; types refer to the functions
//! attached to them by [`FunctionId`].

use crate::location::Location;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One declared value: a function argument or a return value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Parameter {
    /// A plain typed value
    Primitive(PrimitiveParam),
    /// A callback, described by its own signature
    FunctionPointer(Box<Function>),
    /// The `...` parameter
    Variadic,
}

impl Parameter {
    /// Parameter name; the callback name for function pointers, empty for `...`
    pub fn name(&self) -> &str {
        match self {
            Parameter::Primitive(p) => &p.name,
            Parameter::FunctionPointer(f) => &f.name,
            Parameter::Variadic => "",
        }
    }

    /// Base type name, only present on primitive parameters
    pub fn type_name(&self) -> Option<&str> {
        self.as_primitive().map(|p| p.type_name.as_str())
    }

    pub fn as_primitive(&self) -> Option<&PrimitiveParam> {
        match self {
            Parameter::Primitive(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_function_pointer(&self) -> Option<&Function> {
        match self {
            Parameter::FunctionPointer(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_variadic(&self) -> bool {
        matches!(self, Parameter::Variadic)
    }
}

/// A parameter with a plain type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveParam {
    /// Base type name with qualifiers, wrappers and pointer stars removed
    pub type_name: String,
    /// Identifier, empty for unnamed parameters
    pub name: String,
    /// Default value text, present only when the default marker was used
    pub default_value: Option<String>,
    /// Declared with the const qualifier
    pub is_const: bool,
    /// Wrapped in the reference marker
    pub is_reference: bool,
    /// One per trailing `*` plus one for the array marker
    pub array_depth: u32,
}

impl PrimitiveParam {
    pub fn new(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Index of a function in [`Ir::functions`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionId(pub usize);

/// One declared callable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    /// Function name
    pub name: String,
    /// Return value; its name is the function name
    pub return_value: Parameter,
    /// Parameters in declaration order
    pub parameters: Vec<Parameter>,
    /// First parameter is the owning type
    pub is_instance_bound: bool,
    /// Declaration text the function was parsed from
    pub source: String,
}

impl Function {
    /// Not bound to an instance of its owning type
    pub fn is_static(&self) -> bool {
        !self.is_instance_bound
    }

    /// Return type name, `None` when the return value is not a plain type
    pub fn return_type(&self) -> Option<&str> {
        self.return_value.type_name()
    }
}

/// A struct field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Base type name with qualifiers and pointer stars removed
    pub type_name: String,
    pub name: String,
    pub is_const: bool,
    pub array_depth: u32,
}

impl Field {
    pub fn new(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}

/// An exported struct, private handle type, or the global pseudo-type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: String,
    /// Declared as a private handle with no field list
    pub is_opaque: bool,
    /// The pseudo-type owning ungrouped functions
    pub is_global: bool,
    /// Fields in declaration order
    pub fields: Vec<Field>,
    /// Attached functions in association order
    pub functions: Vec<FunctionId>,
    /// Where the type was declared; `None` for the global pseudo-type
    pub location: Option<Location>,
}

impl TypeDef {
    /// A struct with a field list
    pub fn aggregate(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            is_opaque: false,
            is_global: false,
            fields: Vec::new(),
            functions: Vec::new(),
            location: Some(location),
        }
    }

    /// A private handle type
    pub fn opaque(name: impl Into<String>, location: Location) -> Self {
        Self {
            is_opaque: true,
            ..Self::aggregate(name, location)
        }
    }

    /// The pseudo-type for functions with no owning type
    pub fn global(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_opaque: false,
            is_global: true,
            fields: Vec::new(),
            functions: Vec::new(),
            location: None,
        }
    }
}

impl fmt::Display for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.name)?;
        for field in &self.fields {
            let stars = "*".repeat(field.array_depth as usize);
            let constness = if field.is_const { "const " } else { "" };
            writeln!(f, "\t{}{}{} {}", constness, field.type_name, stars, field.name)?;
        }
        Ok(())
    }
}

/// Classified form of an enum constant's explicit value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EnumExprKind {
    /// Integer literal, shift of literals, or or-ed literals
    Integer(i64),
    /// Or of named constants, kept unresolved
    BitOr(Vec<String>),
    /// Anything else, kept as text only
    Unresolved,
}

/// Explicit value of an enum constant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumExpr {
    /// Expression text as written
    pub text: String,
    pub kind: EnumExprKind,
}

/// One enum constant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumConstant {
    pub name: String,
    pub value: Option<EnumExpr>,
}

impl EnumConstant {
    /// Explicit value text, if any
    pub fn expression(&self) -> Option<&str> {
        self.value.as_ref().map(|v| v.text.as_str())
    }
}

/// An exported enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enum {
    pub name: String,
    /// Constants in declaration order
    pub constants: Vec<EnumConstant>,
    pub location: Location,
}

impl Enum {
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            constants: Vec::new(),
            location,
        }
    }

    /// Numeric value of every constant, in declaration order.
    ///
    /// Implicit constants follow the previous value (the first is 0). `BitOr`
    /// values combine earlier siblings; a reference that cannot be resolved
    /// gives `None`, and implicit constants following a `None` are `None` too.
    /// An implicit value past `i64::MAX` is `None`.
    pub fn resolve(&self) -> Vec<Option<i64>> {
        let mut values: Vec<Option<i64>> = Vec::with_capacity(self.constants.len());
        let mut previous: Option<i64> = Some(-1);

        for constant in &self.constants {
            let value = match &constant.value {
                None => previous.and_then(|v| v.checked_add(1)),
                Some(expr) => match &expr.kind {
                    EnumExprKind::Integer(v) => Some(*v),
                    EnumExprKind::BitOr(names) => names.iter().try_fold(0i64, |acc, name| {
                        self.constants
                            .iter()
                            .zip(&values)
                            .find(|(c, _)| &c.name == name)
                            .and_then(|(_, v)| *v)
                            .map(|v| acc | v)
                    }),
                    EnumExprKind::Unresolved => None,
                },
            };
            values.push(value);
            previous = value;
        }

        values
    }
}

impl fmt::Display for Enum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.name)?;
        for constant in &self.constants {
            match constant.expression() {
                Some(expr) => writeln!(f, "\t{} = {}", constant.name, expr)?,
                None => writeln!(f, "\t{}", constant.name)?,
            }
        }
        Ok(())
    }
}

/// The public API surface of one header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ir {
    /// Enums in declaration order
    pub enums: Vec<Enum>,
    /// Types in declaration order, the global pseudo-type first
    pub types: Vec<TypeDef>,
    /// Every exported function in declaration order
    pub functions: Vec<Function>,
}

impl Ir {
    pub fn function(&self, id: FunctionId) -> Option<&Function> {
        self.functions.get(id.0)
    }

    /// Functions attached to a type, in association order
    pub fn functions_of<'a>(&'a self, ty: &'a TypeDef) -> impl Iterator<Item = &'a Function> + 'a {
        ty.functions.iter().filter_map(move |id| self.function(*id))
    }

    pub fn function_named(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn type_named(&self, name: &str) -> Option<&TypeDef> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn enum_named(&self, name: &str) -> Option<&Enum> {
        self.enums.iter().find(|e| e.name == name)
    }

    /// The pseudo-type owning ungrouped functions
    pub fn global_type(&self) -> Option<&TypeDef> {
        self.types.iter().find(|t| t.is_global)
    }

    /// The type a function is attached to
    pub fn owner_of(&self, id: FunctionId) -> Option<&TypeDef> {
        self.types.iter().find(|t| t.functions.contains(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn constant(name: &str, value: Option<(&str, EnumExprKind)>) -> EnumConstant {
        EnumConstant {
            name: name.into(),
            value: value.map(|(text, kind)| EnumExpr {
                text: text.into(),
                kind,
            }),
        }
    }

    fn sample_enum(constants: Vec<EnumConstant>) -> Enum {
        Enum {
            name: "e_".into(),
            constants,
            location: Location::line_start("api.h", 1),
        }
    }

    #[test]
    fn test_resolve_implicit_values() {
        let e = sample_enum(vec![
            constant("a", None),
            constant("b", None),
            constant("c", Some(("10", EnumExprKind::Integer(10)))),
            constant("d", None),
        ]);
        assert_eq!(e.resolve(), vec![Some(0), Some(1), Some(10), Some(11)]);
    }

    #[test]
    fn test_resolve_bit_or_references() {
        let e = sample_enum(vec![
            constant("a", Some(("1 << 0", EnumExprKind::Integer(1)))),
            constant("b", Some(("1 << 2", EnumExprKind::Integer(4)))),
            constant("ab", Some(("a | b", EnumExprKind::BitOr(vec!["a".into(), "b".into()])))),
            constant("next", None),
        ]);
        assert_eq!(e.resolve(), vec![Some(1), Some(4), Some(5), Some(6)]);
    }

    #[test]
    fn test_resolve_unknown_reference_poisons_implicit_followers() {
        let e = sample_enum(vec![
            constant("a", Some(("other | a", EnumExprKind::BitOr(vec!["other".into()])))),
            constant("b", None),
            constant("c", Some(("sizeof(int)", EnumExprKind::Unresolved))),
            constant("d", Some(("7", EnumExprKind::Integer(7)))),
            constant("e", None),
        ]);
        assert_eq!(e.resolve(), vec![None, None, None, Some(7), Some(8)]);
    }

    #[test]
    fn test_resolve_forward_reference_is_unknown() {
        let e = sample_enum(vec![
            constant("all", Some(("x", EnumExprKind::BitOr(vec!["x".into()])))),
            constant("x", Some(("2", EnumExprKind::Integer(2)))),
        ]);
        assert_eq!(e.resolve(), vec![None, Some(2)]);
    }

    #[test]
    fn test_resolve_implicit_overflow_is_unknown() {
        let e = sample_enum(vec![
            constant("max", Some(("0x7FFFFFFFFFFFFFFF", EnumExprKind::Integer(i64::MAX)))),
            constant("past", None),
            constant("reset", Some(("0", EnumExprKind::Integer(0)))),
            constant("next", None),
        ]);
        assert_eq!(e.resolve(), vec![Some(i64::MAX), None, Some(0), Some(1)]);
    }

    #[test]
    fn test_display_matches_dump_format() {
        let e = sample_enum(vec![
            constant("a", None),
            constant("b", Some(("4", EnumExprKind::Integer(4)))),
        ]);
        assert_eq!(e.to_string(), "e_:\n\ta\n\tb = 4\n");

        let mut ty = TypeDef::aggregate("settings_t", Location::line_start("api.h", 4));
        ty.fields.push(Field {
            type_name: "char".into(),
            name: "app_name".into(),
            is_const: true,
            array_depth: 1,
        });
        ty.fields.push(Field::new("float", "scale"));
        assert_eq!(ty.to_string(), "settings_t:\n\tconst char* app_name\n\tfloat scale\n");
    }

    #[test]
    fn test_parameter_serializes_tagged() {
        let param = Parameter::Primitive(PrimitiveParam::new("float", "x"));
        let json = serde_json::to_value(&param).unwrap();
        assert_eq!(json["kind"], "primitive");
        assert_eq!(json["type_name"], "float");

        let json = serde_json::to_value(&Parameter::Variadic).unwrap();
        assert_eq!(json["kind"], "variadic");
    }
}
