//! Diagnostic codes for categorizing compiler errors and warnings.
//!
//! Codes follow `{prefix}{number}`: `L` lexical, `G` grammar-build, `P`
//! syntactic (parser), `S` semantic, `T` type, `C` codegen, `W` warning.

/// A unique code identifying a diagnostic message.
///
/// ```
/// use mipsc_util::diagnostic::DiagnosticCode;
///
/// let code = DiagnosticCode::new("L", 1);
/// assert_eq!(code.as_str(), "L0001");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagnosticCode {
    pub prefix: &'static str,
    pub number: u32,
}

impl DiagnosticCode {
    #[inline]
    pub const fn new(prefix: &'static str, number: u32) -> Self {
        Self { prefix, number }
    }

    pub fn as_str(&self) -> String {
        format!("{}{:04}", self.prefix, self.number)
    }

    #[inline]
    pub const fn prefix(&self) -> &'static str {
        self.prefix
    }

    #[inline]
    pub const fn number(&self) -> u32 {
        self.number
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Debug for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Lexical
pub const L_UNKNOWN_CHAR: DiagnosticCode = DiagnosticCode::new("L", 1);
pub const L_UNTERMINATED_STRING: DiagnosticCode = DiagnosticCode::new("L", 2);
pub const L_MALFORMED_NUMBER: DiagnosticCode = DiagnosticCode::new("L", 3);

// Grammar build
pub const G_UNKNOWN_SYMBOL: DiagnosticCode = DiagnosticCode::new("G", 1);
pub const G_LL1_CONFLICT: DiagnosticCode = DiagnosticCode::new("G", 2);

// Syntactic
pub const P_EXPECTED_TOKEN: DiagnosticCode = DiagnosticCode::new("P", 1);
pub const P_NO_TABLE_ENTRY: DiagnosticCode = DiagnosticCode::new("P", 2);

// Semantic
pub const S_DUPLICATE_DECL: DiagnosticCode = DiagnosticCode::new("S", 1);
pub const S_UNDECLARED_IDENT: DiagnosticCode = DiagnosticCode::new("S", 2);
pub const S_NOT_A_FUNCTION: DiagnosticCode = DiagnosticCode::new("S", 3);

// Type
pub const T_OPERATOR_MISMATCH: DiagnosticCode = DiagnosticCode::new("T", 1);
pub const T_ASSIGN_INCOMPATIBLE: DiagnosticCode = DiagnosticCode::new("T", 2);
pub const T_NON_BOOL_GUARD: DiagnosticCode = DiagnosticCode::new("T", 3);
pub const T_RETURN_MISMATCH: DiagnosticCode = DiagnosticCode::new("T", 4);

// Codegen (internal)
pub const C_UNSUPPORTED_CONSTRUCT: DiagnosticCode = DiagnosticCode::new("C", 1);

// Warnings
pub const W_NARROWING_ASSIGN: DiagnosticCode = DiagnosticCode::new("W", 1);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_zero_padded() {
        assert_eq!(L_UNKNOWN_CHAR.as_str(), "L0001");
        assert_eq!(T_RETURN_MISMATCH.as_str(), "T0004");
    }
}
