//! Reflect derive macro implementation

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse::Result, parse_macro_input, Attribute, Data, DeriveInput, Error, Expr, Fields, Ident,
    Path, Type,
};

/// Main implementation function for the Reflect derive
pub fn derive_reflect_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
struct ContainerOptions {
    annotation: bool,
    init: bool,
    clone: bool,
    no_default: bool,
    provides: Vec<Path>,
}

#[derive(Default)]
struct FieldOptions {
    embed: bool,
    skip: bool,
    readonly: bool,
    tag: Option<Expr>,
}

struct ReflectedField {
    ident: Ident,
    ty: Type,
    index: usize,
    options: FieldOptions,
}

fn expand(input: &DeriveInput) -> Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "#[derive(Reflect)] does not support generic types",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => collect_fields(&data.fields)?,
        _ => {
            return Err(Error::new_spanned(
                &input.ident,
                "#[derive(Reflect)] can only be applied to structs",
            ))
        }
    };
    let options = parse_container_options(&input.attrs)?;

    let name = &input.ident;
    let typed_impl = generate_typed_impl(name, &fields, &options);
    let reflect_impl = generate_reflect_impl(name, &fields, &options);
    let injectable_impl = generate_injectable_impl(name);

    Ok(quote! {
        #typed_impl
        #reflect_impl
        #injectable_impl
    })
}

fn collect_fields(fields: &Fields) -> Result<Vec<ReflectedField>> {
    match fields {
        Fields::Named(named) => {
            let mut reflected = Vec::new();
            for (index, field) in named.named.iter().enumerate() {
                let options = parse_field_options(&field.attrs)?;
                if options.skip {
                    continue;
                }
                if let Some(ident) = &field.ident {
                    reflected.push(ReflectedField {
                        ident: ident.clone(),
                        ty: field.ty.clone(),
                        index,
                        options,
                    });
                }
            }
            Ok(reflected)
        }
        Fields::Unit => Ok(Vec::new()),
        Fields::Unnamed(unnamed) => Err(Error::new_spanned(
            unnamed,
            "#[derive(Reflect)] requires structs with named fields",
        )),
    }
}

fn parse_container_options(attrs: &[Attribute]) -> Result<ContainerOptions> {
    let mut options = ContainerOptions::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("reflect")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("annotation") {
                options.annotation = true;
            } else if meta.path.is_ident("init") {
                options.init = true;
            } else if meta.path.is_ident("clone") {
                options.clone = true;
            } else if meta.path.is_ident("no_default") {
                options.no_default = true;
            } else if meta.path.is_ident("provides") {
                meta.parse_nested_meta(|interface| {
                    options.provides.push(interface.path);
                    Ok(())
                })?;
            } else {
                return Err(meta.error("unsupported reflect attribute, expected one of: annotation, init, clone, no_default, provides(..)"));
            }
            Ok(())
        })?;
    }

    Ok(options)
}

fn parse_field_options(attrs: &[Attribute]) -> Result<FieldOptions> {
    let mut options = FieldOptions::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("reflect")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("embed") {
                options.embed = true;
            } else if meta.path.is_ident("skip") {
                options.skip = true;
            } else if meta.path.is_ident("readonly") {
                options.readonly = true;
            } else if meta.path.is_ident("tag") {
                options.tag = Some(meta.value()?.parse::<Expr>()?);
            } else {
                return Err(meta.error("unsupported reflect field attribute, expected one of: embed, skip, readonly, tag = \"..\""));
            }
            Ok(())
        })?;
    }

    Ok(options)
}

fn generate_typed_impl(
    name: &Ident,
    fields: &[ReflectedField],
    options: &ContainerOptions,
) -> TokenStream2 {
    let name_str = name.to_string();
    let kind = if options.annotation {
        quote! { ::elif_inject::TypeKind::Annotation }
    } else {
        quote! { ::elif_inject::TypeKind::Struct }
    };

    let field_infos = fields.iter().map(|field| {
        let ty = &field.ty;
        let field_name = field.ident.to_string();
        let index = field.index;
        let embedded = field.options.embed.then(|| quote! { .embedded() });
        let readonly = field.options.readonly.then(|| quote! { .readonly() });
        let tagged = field.options.tag.as_ref().map(|tag| quote! { .tagged(#tag) });

        quote! {
            .field(
                ::elif_inject::FieldInfo::new::<#ty>(#field_name, #index)
                    #embedded
                    #readonly
                    #tagged
            )
        }
    });

    let provides = options.provides.iter().map(|interface| {
        let interface_name = interface
            .segments
            .last()
            .map(|segment| segment.ident.to_string())
            .unwrap_or_default();
        quote! {
            .provides::<#name, dyn #interface>(
                #interface_name,
                |this: ::std::sync::Arc<#name>| -> ::std::sync::Arc<dyn #interface> { this },
            )
        }
    });

    let constructible = (!options.no_default).then(|| quote! { .constructible::<#name>() });
    let initializer = options
        .init
        .then(|| quote! { .initializer(::elif_inject::InitMethod::of::<#name>()) });
    let assignable = options.clone.then(|| quote! { .assignable() });

    quote! {
        impl ::elif_inject::Typed for #name {
            fn type_info() -> &'static ::elif_inject::TypeInfo {
                static INFO: ::std::sync::OnceLock<::elif_inject::TypeInfo> =
                    ::std::sync::OnceLock::new();
                INFO.get_or_init(|| {
                    ::elif_inject::TypeInfo::of::<#name>(#name_str, ::std::module_path!(), #kind)
                        #(#field_infos)*
                        #(#provides)*
                        #constructible
                        #initializer
                        #assignable
                })
            }
        }
    }
}

fn generate_reflect_impl(
    name: &Ident,
    fields: &[ReflectedField],
    options: &ContainerOptions,
) -> TokenStream2 {
    let name_str = name.to_string();
    let indices: Vec<_> = fields.iter().map(|field| field.index).collect();
    let idents: Vec<_> = fields.iter().map(|field| &field.ident).collect();

    let assign = options.clone.then(|| {
        quote! {
            fn assign(
                &mut self,
                value: &::elif_inject::Instance,
            ) -> ::std::result::Result<(), ::elif_inject::InjectError> {
                let value: &dyn ::elif_inject::Reflect = &**value;
                match ::elif_inject::Reflect::as_any(value).downcast_ref::<Self>() {
                    ::std::option::Option::Some(same) => {
                        *self = ::std::clone::Clone::clone(same);
                        ::std::result::Result::Ok(())
                    }
                    ::std::option::Option::None => ::std::result::Result::Err(
                        ::elif_inject::InjectError::unsupported(
                            #name_str,
                            ::elif_inject::Reflect::type_info(value).name,
                        ),
                    ),
                }
            }
        }
    });

    quote! {
        impl ::elif_inject::Reflect for #name {
            fn type_info(&self) -> &'static ::elif_inject::TypeInfo {
                <Self as ::elif_inject::Typed>::type_info()
            }

            fn field(&self, index: usize) -> ::std::option::Option<&dyn ::elif_inject::Reflect> {
                match index {
                    #(#indices => ::std::option::Option::Some(&self.#idents as &dyn ::elif_inject::Reflect),)*
                    _ => ::std::option::Option::None,
                }
            }

            fn field_mut(
                &mut self,
                index: usize,
            ) -> ::std::option::Option<&mut dyn ::elif_inject::Reflect> {
                match index {
                    #(#indices => ::std::option::Option::Some(&mut self.#idents as &mut dyn ::elif_inject::Reflect),)*
                    _ => ::std::option::Option::None,
                }
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn into_any(
                self: ::std::sync::Arc<Self>,
            ) -> ::std::sync::Arc<dyn ::std::any::Any + ::std::marker::Send + ::std::marker::Sync> {
                self
            }

            #assign
        }
    }
}

fn generate_injectable_impl(name: &Ident) -> TokenStream2 {
    quote! {
        impl ::elif_inject::Injectable for #name {
            fn from_instance(
                instance: &::elif_inject::Instance,
            ) -> ::std::option::Option<::std::sync::Arc<Self>> {
                ::elif_inject::reflect::downcast_instance::<Self>(instance)
            }

            fn as_reflect(&self) -> ::std::option::Option<&dyn ::elif_inject::Reflect> {
                ::std::option::Option::Some(self)
            }

            fn as_reflect_mut(&mut self) -> ::std::option::Option<&mut dyn ::elif_inject::Reflect> {
                ::std::option::Option::Some(self)
            }
        }
    }
}
