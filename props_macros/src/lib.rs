extern crate proc_macro;
use heck::ToLowerCamelCase;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::parse::Parse;
use syn::{
    parenthesized, parse_macro_input, Data, DataStruct, DeriveInput, Expr, Field, Fields, LitStr,
    Path, Token,
};

/// Options collected from the `#[property(...)]` attributes of a single field.
#[derive(Default)]
struct FieldOptions {
    skip: bool,
    flatten: bool,
    choice: bool,
    read_only: bool,
    choices: Vec<LitStr>,
    range: Option<(Expr, Expr)>,
    constraints: Option<Path>,
    name: Option<LitStr>,
}

fn parse_options(field: &Field) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("property") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                options.skip = true;
                return Ok(());
            }
            if meta.path.is_ident("flatten") {
                options.flatten = true;
                return Ok(());
            }
            if meta.path.is_ident("read_only") {
                options.read_only = true;
                return Ok(());
            }
            if meta.path.is_ident("choice") {
                options.choice = true;
                return Ok(());
            }
            if meta.path.is_ident("choices") {
                let content;
                parenthesized!(content in meta.input);
                let list = content.parse_terminated(<LitStr as Parse>::parse, Token![,])?;
                options.choices = list.into_iter().collect();
                options.choice = true;
                return Ok(());
            }
            if meta.path.is_ident("range") {
                let content;
                parenthesized!(content in meta.input);
                let min: Expr = content.parse()?;
                content.parse::<Token![,]>()?;
                let max: Expr = content.parse()?;
                options.range = Some((min, max));
                return Ok(());
            }
            if meta.path.is_ident("constraints") {
                let path: LitStr = meta.value()?.parse()?;
                options.constraints = Some(path.parse()?);
                return Ok(());
            }
            if meta.path.is_ident("name") {
                options.name = Some(meta.value()?.parse()?);
                return Ok(());
            }
            Err(meta.error("unsupported property attribute"))
        })?;
    }
    Ok(options)
}

/// Derives `crate::props::HasProperties` for a struct with named fields.
///
/// Every field becomes a property named after the field in lower camel case
/// (`use_negative_cmap` -> `useNegativeCmap`), unless it is marked with
/// `#[property(skip)]`. Fields marked `#[property(flatten)]` must themselves
/// implement `HasProperties`; their properties are exposed as if they were
/// declared on the outer struct.
///
/// Field attributes:
/// - `choice`: the `String` field holds one of a set of choices.
/// - `choices("a", "b")`: static choices, implies `choice`.
/// - `range(min, max)`: static numeric limits.
/// - `constraints = "path::to::fn"`: dynamic constraints, called as `fn(&self)`.
/// - `name = "..."`: explicit property name.
/// - `read_only`: readable, but every assignment fails with `ReadOnly`.
#[proc_macro_derive(Properties, attributes(property))]
pub fn derive_properties(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    match expand(&input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(DataStruct {
            fields: Fields::Named(named),
            ..
        }) => &named.named,
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Properties can only be derived for structs with named fields",
            ))
        }
    };

    let mut names = Vec::new();
    let mut getters = Vec::new();
    let mut setters = Vec::new();
    let mut constraints = Vec::new();
    let mut flattened = Vec::new();

    for field in fields {
        let options = parse_options(field)?;
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        if options.skip {
            continue;
        }
        if options.flatten {
            flattened.push(ident.clone());
            continue;
        }

        let property = options
            .name
            .map(|name| name.value())
            .unwrap_or_else(|| ident.to_string().to_lower_camel_case());
        let ty = &field.ty;
        names.push(property.clone());

        if options.read_only {
            getters.push(quote! {
                #property => ::std::option::Option::Some(
                    crate::props::PropertyValue::from(self.#ident.clone())
                ),
            });
            setters.push(quote! {
                #property => {
                    let _ = value;
                    ::std::result::Result::Err(
                        crate::props::PropertyError::ReadOnly(#property.to_string())
                    )
                }
            });
        } else if options.choice {
            getters.push(quote! {
                #property => ::std::option::Option::Some(
                    crate::props::PropertyValue::Choice(self.#ident.clone())
                ),
            });
            setters.push(quote! {
                #property => {
                    self.#ident = value.into_choice()?;
                    ::std::result::Result::Ok(())
                }
            });
        } else {
            getters.push(quote! {
                #property => ::std::option::Option::Some(
                    crate::props::PropertyValue::from(self.#ident.clone())
                ),
            });
            setters.push(quote! {
                #property => {
                    self.#ident = <#ty as ::std::convert::TryFrom<crate::props::PropertyValue>>::try_from(value)?;
                    ::std::result::Result::Ok(())
                }
            });
        }

        if let Some(path) = options.constraints {
            constraints.push(quote! { #property => #path(self), });
        } else if let Some((min, max)) = options.range {
            constraints.push(quote! {
                #property => crate::props::Constraints::Range {
                    min: (#min) as f64,
                    max: (#max) as f64,
                },
            });
        } else if !options.choices.is_empty() {
            let choices = &options.choices;
            constraints.push(quote! {
                #property => crate::props::Constraints::choices(&[#(#choices),*]),
            });
        }
    }

    let expanded = quote! {
        impl #impl_generics crate::props::HasProperties for #struct_name #ty_generics #where_clause {
            fn property_names(&self) -> ::std::vec::Vec<&'static str> {
                #[allow(unused_mut)]
                let mut names: ::std::vec::Vec<&'static str> = ::std::vec![#(#names),*];
                #(
                    names.extend(crate::props::HasProperties::property_names(&self.#flattened));
                )*
                names
            }

            fn get_property(&self, name: &str) -> ::std::option::Option<crate::props::PropertyValue> {
                match name {
                    #(#getters)*
                    _ => {
                        #(
                            if let ::std::option::Option::Some(value) =
                                crate::props::HasProperties::get_property(&self.#flattened, name)
                            {
                                return ::std::option::Option::Some(value);
                            }
                        )*
                        ::std::option::Option::None
                    }
                }
            }

            fn assign_property(
                &mut self,
                name: &str,
                value: crate::props::PropertyValue,
            ) -> ::std::result::Result<(), crate::props::PropertyError> {
                match name {
                    #(#setters)*
                    _ => {
                        #(
                            if crate::props::HasProperties::has_property(&self.#flattened, name) {
                                return crate::props::HasProperties::assign_property(
                                    &mut self.#flattened,
                                    name,
                                    value,
                                );
                            }
                        )*
                        let _ = value;
                        ::std::result::Result::Err(
                            crate::props::PropertyError::UnknownProperty(name.to_string())
                        )
                    }
                }
            }

            fn static_constraints(&self, name: &str) -> crate::props::Constraints {
                match name {
                    #(#constraints)*
                    _ => {
                        #(
                            if crate::props::HasProperties::has_property(&self.#flattened, name) {
                                return crate::props::HasProperties::static_constraints(
                                    &self.#flattened,
                                    name,
                                );
                            }
                        )*
                        crate::props::Constraints::None
                    }
                }
            }
        }
    };

    Ok(expanded)
}
