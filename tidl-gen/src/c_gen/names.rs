//! Symbol prefixes for everything the C backend declares.

use crate::caser::{to_snake_case, to_upper_snake_case};

/// Used when a program doesn't declare a namespace.
pub const DEFAULT_NAMESPACE: &str = "Thrift";

/// Prefixes derived once from the program's namespace.
///
/// `tutorial.shared` gives `tutorialshared` for type names, `tutorial_shared_`
/// for functions and `TUTORIAL_SHARED_` for macros.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Namespace {
    prefix: String,
    lower: String,
    upper: String,
}

impl Namespace {
    pub fn new(namespace: &str) -> Self {
        let namespace = if namespace.is_empty() {
            DEFAULT_NAMESPACE
        } else {
            namespace
        };

        let separated = namespace.replace('.', "_");
        Namespace {
            prefix: namespace.replace('.', ""),
            lower: format!("{}_", separated.to_lowercase()),
            upper: format!("{}_", separated.to_uppercase()),
        }
    }

    /// Plain prefix for type names.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Lower-case prefix for functions, ends with `_`.
    pub fn lower(&self) -> &str {
        &self.lower
    }

    /// Upper-case prefix for macros, ends with `_`.
    pub fn upper(&self) -> &str {
        &self.upper
    }

    pub fn type_name(&self, name: &str) -> String {
        format!("{}{name}", self.prefix)
    }

    pub fn constant(&self, name: &str) -> String {
        format!("{}{name}", self.upper)
    }

    pub fn object(&self, name: &str) -> ObjectNames {
        let snake = to_snake_case(name);
        let screaming = to_upper_snake_case(name);
        ObjectNames {
            name: name.to_owned(),
            type_name: self.type_name(name),
            class_name: format!("{}{name}Class", self.prefix),
            function_prefix: format!("{}{snake}_", self.lower),
            cast_macro: format!("{}{screaming}", self.upper),
            type_macro: format!("{}TYPE_{screaming}", self.upper),
            check_macro: format!("{}IS_{screaming}", self.upper),
        }
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Namespace::new("")
    }
}

/// Every symbol generated for one struct or exception.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectNames {
    /// Name in the IDL.
    pub name: String,
    /// `NsPoint`
    pub type_name: String,
    /// `NsPointClass`
    pub class_name: String,
    /// `ns_point_`
    pub function_prefix: String,
    /// `NS_POINT`
    pub cast_macro: String,
    /// `NS_TYPE_POINT`
    pub type_macro: String,
    /// `NS_IS_POINT`
    pub check_macro: String,
}

impl ObjectNames {
    pub fn function(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.function_prefix)
    }
}
