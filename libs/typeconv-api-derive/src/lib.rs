use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr};

/// Derive macro for enumerations taking part in the conversion registry.
///
/// Implements `typeconv_api::enumeration::Enumeration` for a unit-only enum:
///
/// - `enum_type()`: runtime description built once, shared through a `OnceLock`.
/// - `ordinal()` / `from_ordinal()`: declaration order.
///
/// The enumeration name defaults to the enum's identifier and member names to the
/// variant identifiers; both can be overridden.
///
/// # Example
///
/// ```ignore
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Enumeration)]
/// #[enumeration(name = "client-kind")]
/// pub enum ClientKind {
///     #[enumeration(rename = "JURIDICAL")]
///     Juridical,
///     #[enumeration(rename = "PHYSICAL")]
///     Physical,
/// }
/// ```
#[proc_macro_derive(Enumeration, attributes(enumeration))]
pub fn derive_enumeration(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn derive_impl(input: &DeriveInput) -> Result<TokenStream2, syn::Error> {
    let ident = &input.ident;

    let variants = match &input.data {
        Data::Enum(data) => &data.variants,
        _ => {
            return Err(syn::Error::new_spanned(
                ident,
                "Enumeration only supports enums",
            ))
        }
    };

    if variants.is_empty() {
        return Err(syn::Error::new_spanned(
            ident,
            "Enumeration requires at least one variant",
        ));
    }

    let enum_name = parse_name_attr(&input.attrs, "name")?.unwrap_or_else(|| ident.to_string());

    let mut member_names = Vec::new();
    let mut ordinal_arms = Vec::new();
    let mut from_ordinal_arms = Vec::new();

    for (ordinal, variant) in variants.iter().enumerate() {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "Enumeration only supports unit variants",
            ));
        }
        let variant_ident = &variant.ident;
        let member = parse_name_attr(&variant.attrs, "rename")?
            .unwrap_or_else(|| variant_ident.to_string());
        if member_names.contains(&member) {
            return Err(syn::Error::new_spanned(
                variant,
                format!("duplicate member name '{member}'"),
            ));
        }
        member_names.push(member);

        ordinal_arms.push(quote! { #ident::#variant_ident => #ordinal });
        from_ordinal_arms.push(quote! { #ordinal => ::core::option::Option::Some(#ident::#variant_ident) });
    }

    let expanded = quote! {
        impl ::typeconv_api::enumeration::Enumeration for #ident {
            fn enum_type() -> ::std::sync::Arc<::typeconv_api::enumeration::EnumType> {
                static __TYPE: ::std::sync::OnceLock<::std::sync::Arc<::typeconv_api::enumeration::EnumType>> =
                    ::std::sync::OnceLock::new();
                __TYPE
                    .get_or_init(|| {
                        ::std::sync::Arc::new(::typeconv_api::enumeration::EnumType::new(
                            #enum_name,
                            [#(#member_names),*],
                        ))
                    })
                    .clone()
            }

            fn ordinal(self) -> usize {
                match self {
                    #(#ordinal_arms),*
                }
            }

            fn from_ordinal(ordinal: usize) -> ::core::option::Option<Self> {
                match ordinal {
                    #(#from_ordinal_arms,)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    };

    Ok(expanded)
}

/// Read `#[enumeration(<key> = "...")]` from a list of attributes.
fn parse_name_attr(attrs: &[syn::Attribute], key: &str) -> Result<Option<String>, syn::Error> {
    let mut found = None;
    for attr in attrs {
        if !attr.path().is_ident("enumeration") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident(key) {
                let value: LitStr = meta.value()?.parse()?;
                found = Some(value.value());
                Ok(())
            } else {
                Err(meta.error(format!("unsupported enumeration attribute (expected '{key}')")))
            }
        })?;
    }
    Ok(found)
}
