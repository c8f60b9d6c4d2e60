//! Extraction of function and method declarations from extension sources.
//!
//! Declarations are recognised textually by their macro invocation:
//!
//! - `PHP_FUNCTION(name)` / `ZEND_FUNCTION(name)`
//! - `PHP_ME(Class, method, arginfo_..., flags)` / `ZEND_ME(...)`
//!
//! Function arginfo tables are always named `arginfo_<function>` by the
//! generator, so only method entries can carry a diverging identifier.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

use crate::console;

lazy_static! {
    static ref FUNCTION_RE: Regex = Regex::new(r"(?:ZEND|PHP)_FUNCTION\(([^)]+)\)").unwrap();
    static ref METHOD_RE: Regex =
        Regex::new(r"(?:ZEND|PHP)_ME\(([^,]+,[ ]*[^,]+),[ ]*(arginfo_[^,]+)").unwrap();
}

/// A method entry found in a function-entry table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDeclaration {
    pub class_name: String,
    pub method_name: String,
    /// Arginfo identifier as written in the source.
    pub declared_arginfo: String,
}

impl MethodDeclaration {
    /// `Class_method`, the name the generator uses for this method.
    pub fn qualified_name(&self) -> String {
        format!("{}_{}", self.class_name, self.method_name)
    }

    /// `arginfo_class_Class_method`.
    pub fn standard_arginfo(&self) -> String {
        method_arginfo_name(&self.qualified_name())
    }

    pub fn is_standard(&self) -> bool {
        self.declared_arginfo == self.standard_arginfo()
    }
}

/// Everything extracted from one source file.
#[derive(Debug, Clone, Default)]
pub struct Declarations {
    pub functions: Vec<String>,
    pub methods: Vec<MethodDeclaration>,
}

impl Declarations {
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.methods.is_empty()
    }

    /// Unique class names, in order of first appearance.
    pub fn class_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.methods
            .iter()
            .filter(|m| seen.insert(m.class_name.as_str()))
            .map(|m| m.class_name.clone())
            .collect()
    }

    /// `Class_method` names, one per method entry.
    pub fn method_names(&self) -> Vec<String> {
        self.methods.iter().map(|m| m.qualified_name()).collect()
    }

    /// Canonical names of method arginfo tables declared under another name.
    pub fn non_standard_arginfo(&self) -> HashSet<String> {
        self.methods
            .iter()
            .filter(|m| !m.is_standard())
            .map(|m| m.standard_arginfo())
            .collect()
    }

    /// Every arginfo name to refresh: functions first, then methods.
    pub fn arginfo_names(&self) -> Vec<String> {
        self.functions
            .iter()
            .map(|f| function_arginfo_name(f))
            .chain(self.methods.iter().map(MethodDeclaration::standard_arginfo))
            .collect()
    }
}

pub fn function_arginfo_name(function: &str) -> String {
    format!("arginfo_{}", function)
}

pub fn method_arginfo_name(qualified_method: &str) -> String {
    format!("arginfo_class_{}", qualified_method)
}

/// Scan source text for declaration markers.
pub fn extract_declarations(source: &str) -> Declarations {
    let functions = FUNCTION_RE
        .captures_iter(source)
        .map(|cap| cap[1].to_string())
        .collect();

    let methods = METHOD_RE
        .captures_iter(source)
        .map(|cap| {
            let mut parts = cap[1].split(',').map(str::trim);
            MethodDeclaration {
                class_name: parts.next().unwrap_or_default().to_string(),
                method_name: parts.next().unwrap_or_default().to_string(),
                declared_arginfo: cap[2].to_string(),
            }
        })
        .collect();

    Declarations { functions, methods }
}

/// Warn about every method whose arginfo identifier is not the canonical one.
pub fn report_non_standard(declarations: &Declarations) -> usize {
    let mut count = 0;
    for method in declarations.methods.iter().filter(|m| !m.is_standard()) {
        console::warn(format!(
            "Arginfo '{}' is not standard, it should be '{}'",
            method.declared_arginfo,
            method.standard_arginfo()
        ));
        count += 1;
    }
    count
}
