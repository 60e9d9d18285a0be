//! Generated-name conventions, in one place.
//!
//! Every lowering site and helper that references a discriminant constant
//! or payload field goes through these functions. The `<Union>_<Variant>`
//! constant convention in particular must agree between the union
//! lowering and every match lowering that keys on it.

/// `type <Union>Kind int`
pub fn kind_type(union: &str) -> String {
    format!("{}Kind", union)
}

/// The discriminant constant for one variant: `<Union>_<Variant>`.
pub fn discriminant(union: &str, variant: &str) -> String {
    format!("{}_{}", union, variant)
}

/// The payload struct for a non-unit variant.
pub fn data_struct(union: &str, variant: &str) -> String {
    format!("{}{}Data", union, variant)
}

pub fn constructor(union: &str, variant: &str) -> String {
    format!("New{}{}", union, variant)
}

pub fn predicate(variant: &str) -> String {
    format!("Is{}", variant)
}

pub fn accessor(variant: &str) -> String {
    format!("As{}", variant)
}

/// Exported field name for a declared payload field.
pub fn exported_field(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Deterministic field names for positional payloads. Distinct from every
/// lowering intermediate (`__tmp`, `__err`, `__m`).
pub fn positional_field(index: usize) -> String {
    format!("F{}", index)
}

/// Constructor parameter for a positional payload field.
pub fn positional_param(index: usize) -> String {
    format!("f{}", index)
}

/// Hoisted match-subject temporary.
pub fn subject_temp(index: usize) -> String {
    format!("__m{}", index)
}

/// Method receiver for generated helpers.
pub fn receiver(union: &str) -> String {
    union
        .chars()
        .next()
        .map(|c| c.to_lowercase().to_string())
        .unwrap_or_else(|| "v".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_discriminant_convention() {
        assert_eq!(discriminant("Shape", "Circle"), "Shape_Circle");
    }

    #[test]
    fn test_kind_and_data_names() {
        assert_eq!(kind_type("Shape"), "ShapeKind");
        assert_eq!(data_struct("Shape", "Circle"), "ShapeCircleData");
    }

    #[test]
    fn test_exported_field() {
        assert_eq!(exported_field("radius"), "Radius");
        assert_eq!(exported_field("x"), "X");
        assert_eq!(exported_field("Radius"), "Radius");
    }

    #[test]
    fn test_positional_names_disjoint_from_temps() {
        assert_eq!(positional_field(0), "F0");
        assert_eq!(positional_param(1), "f1");
        assert_eq!(subject_temp(2), "__m2");
    }

    #[test]
    fn test_receiver() {
        assert_eq!(receiver("Shape"), "s");
    }
}
