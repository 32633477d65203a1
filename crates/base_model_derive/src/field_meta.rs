use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::{Attribute, Field, GenericArgument, LitInt, LitStr, PathArguments, Token, Type};

/// Declared scalar of a persisted column, before any storage mapping.
pub(crate) enum ScalarKind {
    Uuid,
    Str,
    Int,
    Bool,
    DateTime,
    Bytes,
    Json,
    Unsupported(String),
}

impl ScalarKind {
    pub(crate) fn shape_expr(&self, schema_path: &syn::Path) -> TokenStream {
        match self {
            ScalarKind::Uuid => quote! { #schema_path::ScalarShape::Uuid },
            ScalarKind::Str => quote! { #schema_path::ScalarShape::Str },
            ScalarKind::Int => quote! { #schema_path::ScalarShape::Int },
            ScalarKind::Bool => quote! { #schema_path::ScalarShape::Bool },
            ScalarKind::DateTime => quote! { #schema_path::ScalarShape::DateTime },
            ScalarKind::Bytes => quote! { #schema_path::ScalarShape::Bytes },
            ScalarKind::Json => quote! { #schema_path::ScalarShape::Json },
            ScalarKind::Unsupported(ty) => {
                quote! { #schema_path::ScalarShape::Unsupported(String::from(#ty)) }
            }
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct FieldSeaOrmAttrs {
    pub(crate) column_name: Option<String>,
    pub(crate) unique: bool,
    pub(crate) unique_key: bool,
    pub(crate) indexed: bool,
    pub(crate) nullable: bool,
}

#[derive(Debug, Default)]
pub(crate) struct SchemaArgs {
    pub(crate) fixed_len: Option<u32>,
    pub(crate) max_len: Option<u32>,
    pub(crate) text: bool,
    pub(crate) requires: Vec<String>,
}

/// Removes every `#[schema(...)]` attribute from `attrs` and folds its keys
/// into a single `SchemaArgs`.
pub(crate) fn take_schema_args(attrs: &mut Vec<Attribute>) -> syn::Result<SchemaArgs> {
    let mut args = SchemaArgs::default();
    let mut kept = Vec::with_capacity(attrs.len());
    for attr in attrs.drain(..) {
        if !attr.path().is_ident("schema") {
            kept.push(attr);
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("fixed_len") {
                let value: LitInt = meta.value()?.parse()?;
                args.fixed_len = Some(value.base10_parse()?);
            } else if meta.path.is_ident("max_len") {
                let value: LitInt = meta.value()?.parse()?;
                args.max_len = Some(value.base10_parse()?);
            } else if meta.path.is_ident("text") {
                args.text = true;
            } else if meta.path.is_ident("requires") {
                let value: LitStr = meta.value()?.parse()?;
                args.requires.push(value.value());
            } else {
                return Err(meta.error("unknown schema attribute key"));
            }
            Ok(())
        })?;
    }
    *attrs = kept;
    Ok(args)
}

pub(crate) fn extract_table_name(attrs: &[Attribute]) -> Option<String> {
    for attr in attrs {
        if !attr.path().is_ident("sea_orm") {
            continue;
        }
        let mut table_name = None;
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table_name") {
                let value: LitStr = meta.value()?.parse()?;
                table_name = Some(value.value());
            } else if meta.input.peek(Token![=]) {
                meta.value()?.parse::<syn::Expr>()?;
            }
            Ok(())
        });
        if table_name.is_some() {
            return table_name;
        }
    }
    None
}

pub(crate) fn parse_field_sea_orm_attrs(attrs: &[Attribute]) -> FieldSeaOrmAttrs {
    let mut out = FieldSeaOrmAttrs::default();
    for attr in attrs {
        if !attr.path().is_ident("sea_orm") {
            continue;
        }
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("column_name") {
                let value: LitStr = meta.value()?.parse()?;
                out.column_name = Some(value.value());
            } else if meta.path.is_ident("unique") {
                out.unique = true;
            } else if meta.path.is_ident("unique_key") {
                out.unique_key = true;
            } else if meta.path.is_ident("indexed") {
                out.indexed = true;
            } else if meta.path.is_ident("nullable") {
                out.nullable = true;
            } else if meta.input.peek(Token![=]) {
                meta.value()?.parse::<syn::Expr>()?;
            }
            Ok(())
        });
    }
    out
}

/// Relation handles (`HasMany`/`HasOne` fields, or fields carrying relation
/// attrs) are not persisted columns.
pub(crate) fn is_relation_field(field: &Field) -> bool {
    if let Some(last) = type_tail(&field.ty) {
        if last == "HasOne" || last == "HasMany" {
            return true;
        }
    }
    for attr in &field.attrs {
        if !attr.path().is_ident("sea_orm") {
            continue;
        }
        let mut is_relation = false;
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("has_many")
                || meta.path.is_ident("has_one")
                || meta.path.is_ident("belongs_to")
            {
                is_relation = true;
            } else if meta.input.peek(Token![=]) {
                meta.value()?.parse::<syn::Expr>()?;
            }
            Ok(())
        });
        if is_relation {
            return true;
        }
    }
    false
}

pub(crate) fn scalar_kind(ty: &Type) -> (ScalarKind, bool) {
    if let Some(inner) = extract_generic_inner(ty, "Option") {
        let (kind, _) = scalar_kind(inner);
        return (kind, true);
    }
    if let Some(inner) = extract_generic_inner(ty, "Vec") {
        let kind = match type_tail(inner).as_deref() {
            Some("u8") => ScalarKind::Bytes,
            _ => ScalarKind::Unsupported(type_to_string(ty)),
        };
        return (kind, false);
    }
    let kind = match type_tail(ty).as_deref() {
        Some("Uuid") => ScalarKind::Uuid,
        Some("String") => ScalarKind::Str,
        Some("i16") | Some("i32") | Some("i64") => ScalarKind::Int,
        Some("bool") => ScalarKind::Bool,
        Some("DateTime") | Some("DateTimeUtc") | Some("DateTimeLocal")
        | Some("DateTimeWithTimeZone") => ScalarKind::DateTime,
        Some("Json") | Some("Value") => ScalarKind::Json,
        _ => ScalarKind::Unsupported(type_to_string(ty)),
    };
    (kind, false)
}

pub(crate) fn normalize_field_name(name: &str) -> String {
    name.strip_prefix("r#").unwrap_or(name).to_string()
}

pub(crate) fn to_pascal_case(value: &str) -> String {
    if !value.contains('_') && !value.contains('-') {
        let has_upper = value.chars().any(|ch| ch.is_uppercase());
        if has_upper {
            return value.to_string();
        }
    }

    let mut out = String::new();
    for part in value.split(|ch| ch == '_' || ch == '-') {
        if part.is_empty() {
            continue;
        }
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            for ch in chars {
                out.extend(ch.to_lowercase());
            }
        }
    }
    out
}

fn type_tail(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string()),
        Type::Reference(reference) => type_tail(&reference.elem),
        Type::Paren(paren) => type_tail(&paren.elem),
        _ => None,
    }
}

fn extract_generic_inner<'a>(ty: &'a Type, ident: &str) -> Option<&'a Type> {
    match ty {
        Type::Path(type_path) => {
            let last = type_path.path.segments.last()?;
            if last.ident != ident {
                return None;
            }
            if let PathArguments::AngleBracketed(args) = &last.arguments {
                for arg in &args.args {
                    if let GenericArgument::Type(inner) = arg {
                        return Some(inner);
                    }
                }
            }
            None
        }
        Type::Reference(reference) => extract_generic_inner(&reference.elem, ident),
        Type::Paren(paren) => extract_generic_inner(&paren.elem, ident),
        _ => None,
    }
}

fn type_to_string(ty: &Type) -> String {
    compact_type_string(ty.to_token_stream().to_string())
}

fn compact_type_string(mut value: String) -> String {
    for (from, to) in [
        (" :: ", "::"),
        (" < ", "<"),
        (" > ", ">"),
        (" , ", ", "),
        (" & ", "&"),
        ("& '", "&'"),
    ] {
        value = value.replace(from, to);
    }
    while value.contains("  ") {
        value = value.replace("  ", " ");
    }
    value
}
