//! Zero-value inference for declared return types.
//!
//! The `?` expansion must supply a structurally valid zero value for every
//! non-error return slot. A wrong guess compiles and then misbehaves, so
//! unrecognized shapes are refused rather than defaulted.

const NUMERIC: &[&str] = &[
    "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16", "uint32", "uint64",
    "uintptr", "byte", "rune", "float32", "float64", "complex64", "complex128",
];

/// The zero-value expression for a host-model type, or a refusal reason.
pub fn zero_value(ty: &str) -> Result<String, String> {
    let ty = ty.trim();
    if ty.is_empty() {
        return Err("empty return type".to_string());
    }

    // nil-valued categories
    if ty.starts_with('*')
        || ty.starts_with("[]")
        || ty.starts_with("map[")
        || ty.starts_with("chan ")
        || ty.starts_with("chan<-")
        || ty.starts_with("<-chan")
        || ty.starts_with("func(")
        || ty.starts_with("func (")
        || ty.starts_with("interface{")
        || ty.starts_with("interface {")
        || ty == "any"
        || ty == "error"
    {
        return Ok("nil".to_string());
    }

    if NUMERIC.contains(&ty) {
        return Ok("0".to_string());
    }
    if ty == "string" {
        return Ok("\"\"".to_string());
    }
    if ty == "bool" {
        return Ok("false".to_string());
    }

    // fixed-size arrays keep their full type in the composite literal
    if ty.starts_with('[') {
        if ty.find(']').is_some_and(|i| i > 1) {
            return Ok(format!("{}{{}}", ty));
        }
        return Err(format!("cannot infer a zero value for '{}'", ty));
    }

    // named (possibly qualified) composite types
    if ty
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '.')
        && ty.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_')
    {
        return Ok(format!("{}{{}}", ty));
    }

    Err(format!("cannot infer a zero value for '{}'", ty))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_zero() {
        assert_eq!(zero_value("int").unwrap(), "0");
        assert_eq!(zero_value("float64").unwrap(), "0");
        assert_eq!(zero_value("byte").unwrap(), "0");
    }

    #[test]
    fn test_string_and_bool() {
        assert_eq!(zero_value("string").unwrap(), "\"\"");
        assert_eq!(zero_value("bool").unwrap(), "false");
    }

    #[test]
    fn test_nil_categories() {
        for ty in [
            "*Config",
            "[]byte",
            "map[string]int",
            "chan int",
            "<-chan int",
            "func(int) error",
            "interface{}",
            "any",
            "error",
        ] {
            assert_eq!(zero_value(ty).unwrap(), "nil", "for {}", ty);
        }
    }

    #[test]
    fn test_named_composite() {
        assert_eq!(zero_value("Config").unwrap(), "Config{}");
        assert_eq!(zero_value("pkg.Options").unwrap(), "pkg.Options{}");
    }

    #[test]
    fn test_array_composite() {
        assert_eq!(zero_value("[4]int").unwrap(), "[4]int{}");
    }

    #[test]
    fn test_unrecognized_refused() {
        assert!(zero_value("").is_err());
        assert!(zero_value("<-weird").is_err());
    }
}
