mod field_meta;

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use std::collections::HashSet;
use syn::{
    Expr, ExprLit, Fields, Ident, ItemStruct, Lit, Meta, Path, Token, parse_macro_input, parse_str,
    punctuated::Punctuated,
};

use field_meta::to_pascal_case;

struct BaseModelConfig {
    traits_path: Path,
    schema_path: Path,
    active_model_ident: Ident,
    id_field: Ident,
    created_at_field: Ident,
    updated_at_field: Ident,
    deleted_at_field: Ident,
}

impl Default for BaseModelConfig {
    fn default() -> Self {
        Self {
            traits_path: parse_str("crate::db::repo::base_traits")
                .expect("default traits path should parse"),
            schema_path: parse_str("crate::schema").expect("default schema path should parse"),
            active_model_ident: Ident::new("ActiveModel", Span::call_site()),
            id_field: Ident::new("id", Span::call_site()),
            created_at_field: Ident::new("created_at", Span::call_site()),
            updated_at_field: Ident::new("updated_at", Span::call_site()),
            deleted_at_field: Ident::new("deleted_at", Span::call_site()),
        }
    }
}

/// Marks a sea-orm model as a base-managed entity: injects the shared base
/// columns (id, created_at, updated_at, deleted_at), strips `#[schema(...)]`
/// annotations before the sea-orm derives see them, and records the declared
/// shape so the descriptor builder can reflect over it at runtime.
///
/// Must be listed above `#[sea_orm::model]` and the derives.
#[proc_macro_attribute]
pub fn base_model(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr with Punctuated<Meta, Token![,]>::parse_terminated);
    let mut config = BaseModelConfig::default();
    if let Err(err) = apply_args(&mut config, args) {
        return err.to_compile_error().into();
    }

    let mut input = parse_macro_input!(item as ItemStruct);

    // Entity-level markers ride on a struct-level #[schema(...)] attribute.
    let struct_args = match field_meta::take_schema_args(&mut input.attrs) {
        Ok(args) => args,
        Err(err) => return err.to_compile_error().into(),
    };

    let Some(table_name) = field_meta::extract_table_name(&input.attrs) else {
        return syn::Error::new_spanned(
            &input,
            "base_model requires #[sea_orm(table_name = \"...\")] on the struct",
        )
        .to_compile_error()
        .into();
    };

    let fields = match &mut input.fields {
        Fields::Named(fields) => fields,
        _ => {
            return syn::Error::new_spanned(
                input,
                "base_model requires a struct with named fields",
            )
            .to_compile_error()
            .into();
        }
    };

    let base_names: HashSet<String> = [
        config.id_field.to_string(),
        config.created_at_field.to_string(),
        config.updated_at_field.to_string(),
        config.deleted_at_field.to_string(),
    ]
    .into_iter()
    .collect();

    // Collect the declared shape before the base columns are injected.
    let schema_path = config.schema_path.clone();
    let mut field_stmts: Vec<proc_macro2::TokenStream> = Vec::new();
    for field in fields.named.iter_mut() {
        let schema_args = match field_meta::take_schema_args(&mut field.attrs) {
            Ok(args) => args,
            Err(err) => return err.to_compile_error().into(),
        };
        if field_meta::is_relation_field(field) {
            continue;
        }
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let name = field_meta::normalize_field_name(&ident.to_string());
        if base_names.contains(&name) {
            continue;
        }

        let sea_attrs = field_meta::parse_field_sea_orm_attrs(&field.attrs);
        let column = sea_attrs.column_name.clone().unwrap_or(name);
        let (kind, is_option) = field_meta::scalar_kind(&field.ty);
        let scalar = kind.shape_expr(&schema_path);

        let mut shape_expr = quote! { #schema_path::FieldShape::new(#column, #scalar) };
        if is_option || sea_attrs.nullable {
            shape_expr = quote! { #shape_expr.nullable() };
        }
        if sea_attrs.unique || sea_attrs.unique_key {
            shape_expr = quote! { #shape_expr.unique() };
        }
        if sea_attrs.indexed {
            shape_expr = quote! { #shape_expr.indexed() };
        }
        if let Some(len) = schema_args.fixed_len {
            shape_expr = quote! { #shape_expr.fixed_len(#len) };
        }
        if let Some(len) = schema_args.max_len {
            shape_expr = quote! { #shape_expr.max_len(#len) };
        }
        if schema_args.text {
            shape_expr = quote! { #shape_expr.text() };
        }
        for capability in &schema_args.requires {
            shape_expr = quote! { #shape_expr.requires(#capability) };
        }
        field_stmts.push(quote! { shape.push_field(#shape_expr); });
    }

    let mut marker_stmts = vec![quote! {
        shape.push_marker(#schema_path::ShapeMarker::BaseModel);
    }];
    for capability in &struct_args.requires {
        marker_stmts.push(quote! {
            shape.push_marker(#schema_path::ShapeMarker::RequiresCapability(
                String::from(#capability),
            ));
        });
    }

    let existing: HashSet<String> = fields
        .named
        .iter()
        .filter_map(|field| field.ident.as_ref().map(|ident| ident.to_string()))
        .collect();

    let mut new_fields = Punctuated::new();

    if !existing.contains(&config.id_field.to_string()) {
        let id_ident = config.id_field.clone();
        let id_field: syn::Field = syn::parse_quote! {
            #[sea_orm(primary_key, auto_increment = false)]
            pub #id_ident: uuid::Uuid
        };
        new_fields.push(id_field);
    }

    if !existing.contains(&config.created_at_field.to_string()) {
        let created_ident = config.created_at_field.clone();
        let created_field: syn::Field = syn::parse_quote! {
            #[sea_orm(default_expr = "Expr::current_timestamp()")]
            pub #created_ident: sea_orm::entity::prelude::DateTimeWithTimeZone
        };
        new_fields.push(created_field);
    }

    if !existing.contains(&config.updated_at_field.to_string()) {
        let updated_ident = config.updated_at_field.clone();
        let updated_field: syn::Field = syn::parse_quote! {
            #[sea_orm(default_expr = "Expr::current_timestamp()")]
            pub #updated_ident: sea_orm::entity::prelude::DateTimeWithTimeZone
        };
        new_fields.push(updated_field);
    }

    if !existing.contains(&config.deleted_at_field.to_string()) {
        let deleted_ident = config.deleted_at_field.clone();
        let deleted_field: syn::Field = syn::parse_quote! {
            #[sea_orm(indexed)]
            pub #deleted_ident: Option<sea_orm::entity::prelude::DateTimeWithTimeZone>
        };
        new_fields.push(deleted_field);
    }

    for field in fields.named.iter().cloned() {
        new_fields.push(field);
    }

    fields.named = new_fields;

    let traits_path = config.traits_path;
    let active_model = config.active_model_ident;
    let id_field = config.id_field;
    let created_at_field = config.created_at_field;
    let updated_at_field = config.updated_at_field;
    let deleted_at_field = config.deleted_at_field;
    let created_at_column = Ident::new(
        &to_pascal_case(&created_at_field.to_string()),
        Span::call_site(),
    );
    let deleted_at_column = Ident::new(
        &to_pascal_case(&deleted_at_field.to_string()),
        Span::call_site(),
    );

    let expanded = quote! {
        #input

        impl #traits_path::HasIdActiveModel for #active_model {
            fn set_id(&mut self, id: uuid::Uuid) {
                self.#id_field = sea_orm::ActiveValue::Set(id);
            }

            fn id(&self) -> Option<uuid::Uuid> {
                match &self.#id_field {
                    sea_orm::ActiveValue::Set(value)
                    | sea_orm::ActiveValue::Unchanged(value) => Some(*value),
                    sea_orm::ActiveValue::NotSet => None,
                }
            }
        }

        impl #traits_path::TimestampedActiveModel for #active_model {
            fn set_created_at(
                &mut self,
                ts: sea_orm::entity::prelude::DateTimeWithTimeZone,
            ) {
                self.#created_at_field = sea_orm::ActiveValue::Set(ts);
            }

            fn set_updated_at(
                &mut self,
                ts: sea_orm::entity::prelude::DateTimeWithTimeZone,
            ) {
                self.#updated_at_field = sea_orm::ActiveValue::Set(ts);
            }
        }

        impl #traits_path::SoftDeleteActiveModel for #active_model {
            fn set_deleted_at(
                &mut self,
                ts: Option<sea_orm::entity::prelude::DateTimeWithTimeZone>,
            ) {
                self.#deleted_at_field = sea_orm::ActiveValue::Set(ts);
            }
        }

        impl #traits_path::HasCreatedAtColumn for Entity {
            fn created_at_column() -> Column {
                Column::#created_at_column
            }
        }

        impl #traits_path::HasSoftDeleteColumn for Entity {
            fn deleted_at_column() -> Column {
                Column::#deleted_at_column
            }
        }

        impl #schema_path::HasModelShape for Entity {
            fn model_shape() -> #schema_path::EntityShape {
                let mut shape = #schema_path::EntityShape::new(
                    #schema_path::entity_name_from_module(module_path!()),
                    #table_name,
                );
                #(#marker_stmts)*
                #(#field_stmts)*
                shape
            }
        }
    };

    expanded.into()
}

fn apply_args(
    config: &mut BaseModelConfig,
    args: Punctuated<Meta, Token![,]>,
) -> Result<(), syn::Error> {
    for meta in args {
        let Meta::NameValue(name_value) = meta else {
            return Err(syn::Error::new_spanned(
                meta,
                "expected name-value pair, e.g. traits = \"path::to::traits\"",
            ));
        };

        let Some(ident) = name_value.path.get_ident() else {
            return Err(syn::Error::new_spanned(
                name_value.path,
                "expected simple identifier for attribute key",
            ));
        };

        let value = match name_value.value {
            Expr::Lit(ExprLit {
                lit: Lit::Str(lit_str),
                ..
            }) => lit_str,
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "expected string literal for attribute value",
                ));
            }
        };

        match ident.to_string().as_str() {
            "traits" => {
                config.traits_path = value.parse::<Path>().map_err(|err| {
                    syn::Error::new(value.span(), format!("invalid traits path: {err}"))
                })?;
            }
            "schema" => {
                config.schema_path = value.parse::<Path>().map_err(|err| {
                    syn::Error::new(value.span(), format!("invalid schema path: {err}"))
                })?;
            }
            "active_model" => {
                config.active_model_ident = Ident::new(&value.value(), value.span());
            }
            "id" => {
                config.id_field = Ident::new(&value.value(), value.span());
            }
            "created_at" => {
                config.created_at_field = Ident::new(&value.value(), value.span());
            }
            "updated_at" => {
                config.updated_at_field = Ident::new(&value.value(), value.span());
            }
            "deleted_at" => {
                config.deleted_at_field = Ident::new(&value.value(), value.span());
            }
            _ => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "unknown base_model attribute key",
                ));
            }
        }
    }

    Ok(())
}
