//! Procedural macros for the mongolayer project.
//!
//! - `#[derive(UpdateSet)]` exposes the public, `bson`-tagged fields of a struct to the
//!   partial-update builder.
//! - `#[derive(IsZero)]` reports a struct as zero when all of its fields are zero.
//!
//! Tags use the `name,omitempty` grammar and are written either as `#[bson = "..."]` or
//! `#[bson("...")]`.

#[allow(unused_extern_crates)]
extern crate self as mongolayer_macros;

use mongolayer_core::tag::FieldTag;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Expr, ExprLit, Field, Fields, Lit, LitStr, Meta, Type,
    Visibility, ext::IdentExt, parse_macro_input, parse_quote, spanned::Spanned,
};

const TAG_ATTRIBUTE: &str = "bson";

/// Derives `mongolayer::update::UpdateSet`.
///
/// Only `pub` fields carrying a `bson` tag take part. Fields tagged `-` are left out, and
/// fields whose tag has the `omitempty` modifier must implement `IsZero`. Enums, unions,
/// tuple structs and unit structs expose no fields.
///
/// ```ignore
/// #[derive(UpdateSet)]
/// pub struct ProfilePatch {
///     #[bson = "username"]
///     pub username: String,
///     #[bson = "profile.bio,omitempty"]
///     pub bio: String,
///     #[bson = "-"]
///     pub password: String,
/// }
/// ```
#[proc_macro_derive(UpdateSet, attributes(bson))]
pub fn derive_update_set(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand_update_set(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Derives `mongolayer::zero::IsZero` for structs: the value is zero when every field is.
#[proc_macro_derive(IsZero)]
pub fn derive_is_zero(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand_is_zero(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

struct TaggedField<'a> {
    field: &'a Field,
    tag: LitStr,
    omit_empty: bool,
}

fn expand_update_set(mut input: DeriveInput) -> syn::Result<TokenStream2> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => tagged_fields(named.named.iter())?,
            _ => Vec::new(),
        },
        Data::Enum(_) | Data::Union(_) => Vec::new(),
    };

    if !input.generics.params.is_empty() {
        let where_clause = input.generics.make_where_clause();
        for tagged in &fields {
            let ty = &tagged.field.ty;
            where_clause
                .predicates
                .push(parse_quote!(#ty: ::mongolayer::update::FieldValue));
            if tagged.omit_empty {
                where_clause
                    .predicates
                    .push(parse_quote!(#ty: ::mongolayer::zero::IsZero));
            }
        }
    }

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    if fields.is_empty() {
        return Ok(quote! {
            impl #impl_generics ::mongolayer::update::UpdateSet for #name #ty_generics #where_clause {}
        });
    }

    let visits = fields.iter().map(|tagged| {
        let member = &tagged.field.ident;
        let ident = member
            .as_ref()
            .map(|ident| ident.unraw().to_string())
            .unwrap_or_default();
        let tag = &tagged.tag;
        let zero_check = tagged
            .omit_empty
            .then(|| quote! { .with_zero_check(&self.#member) });

        quote! {
            visitor.visit_field(
                ::mongolayer::update::FieldRef::new(#ident, ::core::option::Option::Some(#tag), &self.#member)
                    #zero_check
            );
        }
    });

    Ok(quote! {
        impl #impl_generics ::mongolayer::update::UpdateSet for #name #ty_generics #where_clause {
            fn visit_fields(&self, visitor: &mut dyn ::mongolayer::update::FieldVisitor) {
                #(#visits)*
            }
        }
    })
}

fn tagged_fields<'a>(fields: impl Iterator<Item = &'a Field>) -> syn::Result<Vec<TaggedField<'a>>> {
    let mut tagged = Vec::new();

    for field in fields {
        let Some(tag) = field_tag(&field.attrs)? else {
            continue;
        };
        // Unexported fields are never written, whatever their tag says.
        if !matches!(field.vis, Visibility::Public(_)) {
            continue;
        }

        let raw = tag.value();
        if FieldTag::is_excluded(&raw) {
            continue;
        }

        tagged.push(TaggedField {
            field,
            omit_empty: FieldTag::parse(&raw).omit_empty(),
            tag,
        });
    }

    Ok(tagged)
}

fn field_tag(attrs: &[Attribute]) -> syn::Result<Option<LitStr>> {
    let mut found: Option<LitStr> = None;

    for attr in attrs.iter().filter(|attr| attr.path().is_ident(TAG_ATTRIBUTE)) {
        let tag = match &attr.meta {
            Meta::NameValue(meta) => match &meta.value {
                Expr::Lit(ExprLit { lit: Lit::Str(tag), .. }) => tag.clone(),
                other => {
                    return Err(syn::Error::new(
                        other.span(),
                        "expected a string literal, e.g. #[bson = \"name,omitempty\"]",
                    ));
                }
            },
            Meta::List(list) => list.parse_args::<LitStr>()?,
            Meta::Path(path) => {
                return Err(syn::Error::new(
                    path.span(),
                    "expected a tag, e.g. #[bson = \"name,omitempty\"]",
                ));
            }
        };

        if found.is_some() {
            return Err(syn::Error::new(attr.span(), "duplicate bson tag"));
        }
        found = Some(tag);
    }

    Ok(found)
}

fn expand_is_zero(mut input: DeriveInput) -> syn::Result<TokenStream2> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new(
            input.ident.span(),
            "IsZero can only be derived for structs",
        ));
    };

    let (members, types): (Vec<TokenStream2>, Vec<Type>) = match &data.fields {
        Fields::Named(named) => named
            .named
            .iter()
            .map(|field| {
                let ident = &field.ident;
                (quote!(#ident), field.ty.clone())
            })
            .unzip(),
        Fields::Unnamed(unnamed) => unnamed
            .unnamed
            .iter()
            .enumerate()
            .map(|(index, field)| {
                let index = syn::Index::from(index);
                (quote!(#index), field.ty.clone())
            })
            .unzip(),
        Fields::Unit => (Vec::new(), Vec::new()),
    };

    if !input.generics.params.is_empty() {
        let where_clause = input.generics.make_where_clause();
        for ty in &types {
            where_clause
                .predicates
                .push(parse_quote!(#ty: ::mongolayer::zero::IsZero));
        }
    }

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let checks = members.iter().map(|member| {
        quote! { && ::mongolayer::zero::IsZero::is_zero(&self.#member) }
    });

    Ok(quote! {
        impl #impl_generics ::mongolayer::zero::IsZero for #name #ty_generics #where_clause {
            fn is_zero(&self) -> bool {
                true #(#checks)*
            }
        }
    })
}
