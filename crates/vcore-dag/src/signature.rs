//! Declared function signatures.

use crate::kind::ValueKind;

/// The declared formal-parameter and result kinds of one function.
///
/// For variadic functions `params` holds only the fixed prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<ValueKind>,
    pub results: Vec<ValueKind>,
    pub is_variadic: bool,
}

impl FunctionSignature {
    pub fn new(name: impl Into<String>, params: Vec<ValueKind>, results: Vec<ValueKind>) -> Self {
        FunctionSignature {
            name: name.into(),
            params,
            results,
            is_variadic: false,
        }
    }

    pub fn variadic(mut self) -> Self {
        self.is_variadic = true;
        self
    }
}
