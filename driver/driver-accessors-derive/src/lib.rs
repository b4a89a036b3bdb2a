//! # Accessor Derive
//!
//! Derive macro for configuration structs whose fields are private but must
//! be readable and buildable in `const` context (e.g. a `static` bring-up
//! configuration on bare metal).

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Fields, parse_macro_input, spanned::Spanned};

/// Derive `const fn <field>(&self) -> Ty` and `const fn with_<field>(self, Ty) -> Self`
/// for each **named** field.
///
/// Field types must be `Copy`. Doc comments on a field are carried over to
/// its getter.
///
/// - Skipping a field entirely: `#[accessors(skip)]`
/// - Builder only, no getter: `#[accessors(no_get)]`
///
/// # Example
///
/// ```
/// use driver_accessors_derive::Accessors;
///
/// #[derive(Accessors, Default)]
/// struct Limits {
///     /// Maximum number of polls.
///     polls: u32,
///     #[accessors(no_get)]
///     verbose: bool,
///     #[accessors(skip)]
///     _reserved: (),
/// }
///
/// let l = Limits::default().with_polls(8).with_verbose(true);
/// assert_eq!(l.polls(), 8);
/// ```
#[proc_macro_derive(Accessors, attributes(accessors))]
pub fn derive_accessors(input: TokenStream) -> TokenStream {
    let DeriveInput {
        ident,
        generics,
        data,
        ..
    } = parse_macro_input!(input as DeriveInput);

    let fields = match data {
        Data::Struct(s) => match s.fields {
            Fields::Named(n) => n.named,
            other => {
                return syn::Error::new(other.span(), "Accessors requires named fields")
                    .to_compile_error()
                    .into();
            }
        },
        _ => {
            return syn::Error::new(ident.span(), "Accessors can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let mut methods = Vec::new();

    for field in fields {
        let Some(fname) = &field.ident else { continue };
        let options = match FieldOptions::parse(&field.attrs) {
            Ok(o) => o,
            Err(e) => return e.to_compile_error().into(),
        };
        if options.skip {
            continue;
        }

        let ty = &field.ty;
        let with_name = format_ident!("with_{}", fname);
        let with_doc = format!("Returns a copy with `{fname}` replaced.");

        methods.push(quote! {
            #[doc = #with_doc]
            #[inline]
            #[must_use]
            pub const fn #with_name(mut self, value: #ty) -> Self {
                self.#fname = value;
                self
            }
        });

        if options.getter {
            let docs = field.attrs.iter().filter(|a| a.path().is_ident("doc"));
            methods.push(quote! {
                #(#docs)*
                #[inline]
                #[must_use]
                pub const fn #fname(&self) -> #ty {
                    self.#fname
                }
            });
        }
    }

    let expanded = quote! {
        impl #impl_generics #ident #ty_generics #where_clause {
            #(#methods)*
        }
    };

    TokenStream::from(expanded)
}

struct FieldOptions {
    skip: bool,
    getter: bool,
}

impl FieldOptions {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut options = Self {
            skip: false,
            getter: true,
        };

        for attr in attrs {
            if !attr.path().is_ident("accessors") {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    options.skip = true;
                    Ok(())
                } else if meta.path.is_ident("no_get") {
                    options.getter = false;
                    Ok(())
                } else {
                    Err(meta.error("expected `skip` or `no_get`"))
                }
            })?;
        }

        Ok(options)
    }
}
