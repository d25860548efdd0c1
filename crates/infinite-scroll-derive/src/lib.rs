//! Derive macro for infinite-scroll item types
//!
//! This crate provides `#[derive(ListItem)]`, which implements
//! `infinite_scroll::ListItem` by cloning one named field as the item identifier.
//!
//! # Usage
//!
//! ```ignore
//! use infinite_scroll::ListItem;
//!
//! #[derive(Clone, ListItem)]
//! struct Post {
//!     id: u64, // used by default
//!     title: String,
//! }
//!
//! #[derive(Clone, ListItem)]
//! #[list_item(id_field = "slug")]
//! struct Article {
//!     slug: String,
//!     body: String,
//! }
//! ```

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Field, Fields, LitStr};

const DEFAULT_ID_FIELD: &str = "id";

/// Implement `ListItem` for a struct with named fields
///
/// # Attributes
///
/// - `#[list_item(id_field = "field_name")]` - The field holding the unique identifier
///   (defaults to `id`). Its type must be `Clone + Eq + Hash + Debug + Send + Sync + 'static`.
#[proc_macro_derive(ListItem, attributes(list_item))]
pub fn derive_list_item(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> Result<proc_macro2::TokenStream, syn::Error> {
    let id_field = parse_id_field(input)?;
    let field = find_field(input, &id_field)?;

    let name = &input.ident;
    let field_ident = &field.ident;
    let field_ty = &field.ty;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::infinite_scroll::ListItem for #name #ty_generics #where_clause {
            type Id = #field_ty;

            fn id(&self) -> Self::Id {
                ::core::clone::Clone::clone(&self.#field_ident)
            }
        }
    })
}

fn parse_id_field(input: &DeriveInput) -> Result<String, syn::Error> {
    let mut id_field = None;
    for attr in &input.attrs {
        if attr.path().is_ident("list_item") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("id_field") {
                    let value: LitStr = meta.value()?.parse()?;
                    id_field = Some(value.value());
                    Ok(())
                } else {
                    Err(meta.error("unknown attribute, expected `id_field`"))
                }
            })?;
        }
    }

    Ok(id_field.unwrap_or_else(|| DEFAULT_ID_FIELD.to_string()))
}

fn find_field<'a>(input: &'a DeriveInput, name: &str) -> Result<&'a Field, syn::Error> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "ListItem can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "ListItem can only be derived for structs",
            ))
        }
    };

    fields
        .iter()
        .find(|field| field.ident.as_ref().is_some_and(|ident| ident == name))
        .ok_or_else(|| {
            syn::Error::new_spanned(
                input,
                format!("no field named `{}`; set #[list_item(id_field = \"...\")]", name),
            )
        })
}
