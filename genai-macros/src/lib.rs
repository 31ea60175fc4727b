//! Proc macros for structured model output.
//!
//! Provides `#[derive(Schema)]`, which implements `genai::Schema` by
//! generating a JSON schema from a type definition and its doc comments.
//!
//! # Example
//!
//! ```ignore
//! /// Record the findings of a security audit.
//! #[derive(Schema, Deserialize)]
//! #[schema(name = "record_audit")]
//! #[serde(rename_all = "camelCase")]
//! struct AuditReport {
//!     /// Overall risk rating.
//!     risk_level: RiskLevel,
//!     /// Strength of encryption, 0-100.
//!     #[schema(min = 0, max = 100)]
//!     encryption_strength: u8,
//! }
//! ```
//!
//! Structs with named fields become JSON objects; enums made only of unit
//! variants become string enums. Field and variant names follow
//! `#[serde(rename = "...")]` and `#[serde(rename_all = "...")]` so the schema
//! matches what serde will accept.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::meta::ParseNestedMeta;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Lit, LitStr, Meta, Type};

/// Derive macro implementing `genai::Schema`.
///
/// # Attributes
///
/// - `#[schema(name = "...")]` on the type - Override the schema name
///   (defaults to the snake_case type name)
/// - `#[schema(optional)]` on fields - Leave the field out of `required`
/// - `#[schema(rename = "...")]` on fields - Override the property name
/// - `#[schema(min = N, max = N)]` on numeric fields - Emit `minimum` / `maximum`
#[proc_macro_derive(Schema, attributes(schema))]
pub fn derive_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_schema(input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

fn expand_schema(input: DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let container = ContainerAttrs::parse(&input)?;
    let description = get_doc_comment(&input.attrs);

    let body = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => object_schema(named.named.iter(), &container)?,
            _ => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "Schema derive only supports structs with named fields",
                ));
            }
        },
        Data::Enum(data) => {
            let mut names = Vec::new();
            for variant in &data.variants {
                if !matches!(variant.fields, Fields::Unit) {
                    return Err(syn::Error::new_spanned(
                        variant,
                        "Schema derive only supports enums with unit variants",
                    ));
                }
                let name = serde_rename(&variant.attrs)?.unwrap_or_else(|| {
                    apply_rename_all(&variant.ident.to_string(), container.rename_all.as_deref())
                });
                names.push(name);
            }
            json(quote!({
                "type": "string",
                "enum": [#(#names),*]
            }))
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                ident,
                "Schema derive does not support unions",
            ));
        }
    };

    let name = container.name;

    Ok(quote! {
        impl ::genai::Schema for #ident {
            fn schema_name() -> &'static str {
                #name
            }

            fn schema_description() -> &'static str {
                #description
            }

            fn json_schema() -> ::genai::__private::serde_json::Value {
                #body
            }
        }
    })
}

fn object_schema<'a>(
    fields: impl Iterator<Item = &'a syn::Field>,
    container: &ContainerAttrs,
) -> syn::Result<TokenStream2> {
    let mut property_tokens = Vec::new();
    let mut required_fields = Vec::new();

    for field in fields {
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };
        let attrs = FieldAttrs::parse(field)?;
        let field_name = match attrs.rename.clone() {
            Some(name) => name,
            None => serde_rename(&field.attrs)?.unwrap_or_else(|| {
                apply_rename_all(&field_ident.to_string(), container.rename_all.as_deref())
            }),
        };
        let field_desc = get_doc_comment(&field.attrs);
        let type_schema = type_to_schema(&field.ty);

        let desc_token = (!field_desc.is_empty()).then(|| {
            let value = json(quote!(#field_desc));
            quote! { property["description"] = #value; }
        });
        let min_token = attrs.min.as_ref().map(|min| {
            let value = json(quote!(#min));
            quote! { property["minimum"] = #value; }
        });
        let max_token = attrs.max.as_ref().map(|max| {
            let value = json(quote!(#max));
            quote! { property["maximum"] = #value; }
        });

        property_tokens.push(quote! {
            {
                #[allow(unused_mut)]
                let mut property = #type_schema;
                #desc_token
                #min_token
                #max_token
                properties.insert(#field_name.to_string(), property);
            }
        });

        if !attrs.optional && !is_option_type(&field.ty) {
            required_fields.push(field_name);
        }
    }

    let schema = json(quote!({
        "type": "object",
        "properties": properties,
        "required": required
    }));

    Ok(quote! {
        let mut properties = ::genai::__private::serde_json::Map::new();
        #(#property_tokens)*

        let required: Vec<&str> = vec![#(#required_fields),*];

        #schema
    })
}

struct ContainerAttrs {
    name: String,
    rename_all: Option<String>,
}

impl ContainerAttrs {
    fn parse(input: &DeriveInput) -> syn::Result<Self> {
        let mut name = None;
        let mut rename_all = None;

        for attr in &input.attrs {
            if attr.path().is_ident("schema") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("name") {
                        let value: LitStr = meta.value()?.parse()?;
                        name = Some(value.value());
                        Ok(())
                    } else {
                        Err(meta.error("unsupported schema attribute"))
                    }
                })?;
            } else if attr.path().is_ident("serde") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename_all") {
                        let value: LitStr = meta.value()?.parse()?;
                        rename_all = Some(value.value());
                        Ok(())
                    } else {
                        skip_meta(&meta)
                    }
                })?;
            }
        }

        Ok(Self {
            name: name.unwrap_or_else(|| to_snake_case(&input.ident.to_string())),
            rename_all,
        })
    }
}

#[derive(Default)]
struct FieldAttrs {
    optional: bool,
    rename: Option<String>,
    min: Option<Lit>,
    max: Option<Lit>,
}

impl FieldAttrs {
    fn parse(field: &syn::Field) -> syn::Result<Self> {
        let mut attrs = Self::default();
        for attr in &field.attrs {
            if !attr.path().is_ident("schema") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("optional") {
                    attrs.optional = true;
                } else if meta.path.is_ident("rename") {
                    let value: LitStr = meta.value()?.parse()?;
                    attrs.rename = Some(value.value());
                } else if meta.path.is_ident("min") {
                    attrs.min = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("max") {
                    attrs.max = Some(meta.value()?.parse()?);
                } else {
                    return Err(meta.error("unsupported schema attribute"));
                }
                Ok(())
            })?;
        }
        Ok(attrs)
    }
}

/// Consume a serde option we don't interpret, with or without a value.
fn skip_meta(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(syn::Token![=]) {
        let _: syn::Expr = meta.value()?.parse()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        syn::parenthesized!(content in meta.input);
        let _: TokenStream2 = content.parse()?;
    }
    Ok(())
}

fn serde_rename(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut rename = None;
    for attr in attrs {
        if attr.path().is_ident("serde") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    let value: LitStr = meta.value()?.parse()?;
                    rename = Some(value.value());
                    Ok(())
                } else {
                    skip_meta(&meta)
                }
            })?;
        }
    }
    Ok(rename)
}

fn apply_rename_all(name: &str, rule: Option<&str>) -> String {
    match rule {
        Some("camelCase") => {
            let mut out = String::new();
            let mut upper = false;
            for c in name.chars() {
                if c == '_' {
                    upper = true;
                } else if upper {
                    out.push(c.to_ascii_uppercase());
                    upper = false;
                } else {
                    out.push(c);
                }
            }
            out
        }
        Some("snake_case") => to_snake_case(name),
        Some("lowercase") => name.to_lowercase(),
        Some("UPPERCASE") => name.to_uppercase(),
        Some("kebab-case") => to_snake_case(name).replace('_', "-"),
        _ => name.to_string(),
    }
}

fn get_doc_comment(attrs: &[Attribute]) -> String {
    let mut docs = Vec::new();
    for attr in attrs {
        if attr.path().is_ident("doc") {
            if let Meta::NameValue(nv) = &attr.meta {
                if let syn::Expr::Lit(expr_lit) = &nv.value {
                    if let Lit::Str(s) = &expr_lit.lit {
                        docs.push(s.value().trim().to_string());
                    }
                }
            }
        }
    }
    docs.join(" ")
}

fn is_option_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "Option";
        }
    }
    false
}

fn first_generic(segment: &syn::PathSegment) -> Option<&Type> {
    if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
        if let Some(syn::GenericArgument::Type(inner)) = args.args.first() {
            return Some(inner);
        }
    }
    None
}

/// Wrap JSON tokens in a `json!` call through the re-exported serde_json.
fn json(value: TokenStream2) -> TokenStream2 {
    quote! { ::genai::__private::serde_json::json!(#value) }
}

fn type_to_schema(ty: &Type) -> TokenStream2 {
    let Type::Path(type_path) = ty else {
        return match ty {
            Type::Reference(reference) => type_to_schema(&reference.elem),
            _ => json(quote!({})),
        };
    };
    let Some(segment) = type_path.path.segments.last() else {
        return json(quote!({}));
    };

    match segment.ident.to_string().as_str() {
        "String" | "str" => json(quote!({"type": "string"})),
        "i8" | "i16" | "i32" | "i64" | "isize" => json(quote!({"type": "integer"})),
        "u8" | "u16" | "u32" | "u64" | "usize" => json(quote!({"type": "integer", "minimum": 0})),
        "f32" | "f64" => json(quote!({"type": "number"})),
        "bool" => json(quote!({"type": "boolean"})),
        "Option" => match first_generic(segment) {
            Some(inner) => type_to_schema(inner),
            None => json(quote!({})),
        },
        "Vec" => match first_generic(segment) {
            Some(inner) => {
                let items = type_to_schema(inner);
                json(quote!({"type": "array", "items": #items}))
            }
            None => json(quote!({"type": "array"})),
        },
        // Anything else must describe itself.
        _ => quote! { <#ty as ::genai::Schema>::json_schema() },
    }
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}
