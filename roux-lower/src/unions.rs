//! Tagged-union lowering.
//!
//! One union declaration lowers to exactly one discriminant type, one
//! constant block, one payload composite, plus per-variant data structs,
//! constructors and helpers. This function returns the declaration list
//! and nothing else appends it — the module lowering owns the single
//! append site, so a union can never be emitted twice.

use crate::naming;
use crate::{HelperLevel, LowerOptions};
use roux_host::ast::{ConstEntry, GoDecl, GoField, GoStmt};
use roux_parser::ast::{UnionDecl, Variant, VariantKind};
use roux_srcmap::Pos;

pub fn lower_union(decl: &UnionDecl, options: &LowerOptions) -> Vec<GoDecl> {
    let mut decls = Vec::new();
    let union = &decl.name;
    let kind_ty = naming::kind_type(union);

    // discriminant type
    decls.push(GoDecl::TypeDef {
        name: kind_ty.clone(),
        underlying: "int".to_string(),
        pos: Some(Pos::new(decl.line, decl.column)),
    });
    decls.push(blank());

    // one constant per variant
    decls.push(GoDecl::ConstBlock {
        ty: kind_ty.clone(),
        entries: decl
            .variants
            .iter()
            .map(|v| ConstEntry {
                name: naming::discriminant(union, &v.name),
                pos: Some(Pos::new(v.line, v.column)),
            })
            .collect(),
    });
    decls.push(blank());

    // payload structs for non-unit variants
    for variant in decl.variants.iter().filter(|v| !v.is_unit()) {
        decls.push(GoDecl::StructDef {
            name: naming::data_struct(union, &variant.name),
            fields: payload_fields(variant),
            pos: Some(Pos::new(variant.line, variant.column)),
        });
        decls.push(blank());
    }

    // the single payload composite: a discriminant plus one optional
    // field per non-unit variant, only the active one populated
    let mut fields = vec![GoField {
        name: "Kind".to_string(),
        ty: kind_ty.clone(),
    }];
    for variant in decl.variants.iter().filter(|v| !v.is_unit()) {
        fields.push(GoField {
            name: variant.name.clone(),
            ty: format!("*{}", naming::data_struct(union, &variant.name)),
        });
    }
    decls.push(GoDecl::StructDef {
        name: union.clone(),
        fields,
        pos: Some(Pos::new(decl.line, decl.column)),
    });
    decls.push(blank());

    for variant in &decl.variants {
        decls.push(constructor(union, variant));
        decls.push(blank());
    }

    for variant in &decl.variants {
        decls.push(predicate(union, variant));
        decls.push(blank());
    }
    if options.helpers == HelperLevel::Exhaustive {
        for variant in decl.variants.iter().filter(|v| !v.is_unit()) {
            decls.push(accessor(union, variant));
            decls.push(blank());
        }
    }

    // drop the trailing separator
    decls.pop();
    decls
}

fn blank() -> GoDecl {
    GoDecl::Raw {
        text: String::new(),
        line: None,
    }
}

/// Field list of a variant's payload struct. Positional payloads get
/// deterministic `F0, F1, …` names; named payloads export the declared
/// names.
fn payload_fields(variant: &Variant) -> Vec<GoField> {
    match &variant.kind {
        VariantKind::Unit => Vec::new(),
        VariantKind::Positional(tys) => tys
            .iter()
            .enumerate()
            .map(|(i, ty)| GoField {
                name: naming::positional_field(i),
                ty: ty.clone(),
            })
            .collect(),
        VariantKind::Named(fields) => fields
            .iter()
            .map(|f| GoField {
                name: naming::exported_field(&f.name),
                ty: f.ty.clone(),
            })
            .collect(),
    }
}

/// Constructor parameter list: declared names for named payloads,
/// `f0, f1, …` for positional ones.
fn constructor_params(variant: &Variant) -> Vec<(String, String)> {
    match &variant.kind {
        VariantKind::Unit => Vec::new(),
        VariantKind::Positional(tys) => tys
            .iter()
            .enumerate()
            .map(|(i, ty)| (naming::positional_param(i), ty.clone()))
            .collect(),
        VariantKind::Named(fields) => fields
            .iter()
            .map(|f| (f.name.clone(), f.ty.clone()))
            .collect(),
    }
}

fn constructor(union: &str, variant: &Variant) -> GoDecl {
    let params = constructor_params(variant);
    let param_list = params
        .iter()
        .map(|(n, t)| format!("{} {}", n, t))
        .collect::<Vec<_>>()
        .join(", ");
    let header = format!(
        "func {}({}) {} {{",
        naming::constructor(union, &variant.name),
        param_list,
        union
    );

    let discriminant = naming::discriminant(union, &variant.name);
    let body = if variant.is_unit() {
        format!("return {}{{Kind: {}}}", union, discriminant)
    } else {
        let field_init = payload_fields(variant)
            .iter()
            .zip(&params)
            .map(|(f, (p, _))| format!("{}: {}", f.name, p))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "return {}{{Kind: {}, {}: &{}{{{}}}}}",
            union,
            discriminant,
            variant.name,
            naming::data_struct(union, &variant.name),
            field_init
        )
    };

    GoDecl::Func {
        header,
        body: vec![GoStmt::raw(body)],
        closer: "}".to_string(),
        line: None,
    }
}

fn predicate(union: &str, variant: &Variant) -> GoDecl {
    let recv = naming::receiver(union);
    GoDecl::Func {
        header: format!(
            "func ({} {}) {}() bool {{",
            recv,
            union,
            naming::predicate(&variant.name)
        ),
        body: vec![GoStmt::raw(format!(
            "return {}.Kind == {}",
            recv,
            naming::discriminant(union, &variant.name)
        ))],
        closer: "}".to_string(),
        line: None,
    }
}

fn accessor(union: &str, variant: &Variant) -> GoDecl {
    let recv = naming::receiver(union);
    GoDecl::Func {
        header: format!(
            "func ({} {}) {}() (*{}, bool) {{",
            recv,
            union,
            naming::accessor(&variant.name),
            naming::data_struct(union, &variant.name)
        ),
        body: vec![GoStmt::raw(format!(
            "return {}.{}, {}.Kind == {}",
            recv,
            variant.name,
            recv,
            naming::discriminant(union, &variant.name)
        ))],
        closer: "}".to_string(),
        line: None,
    }
}
