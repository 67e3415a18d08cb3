use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{quote, quote_spanned};
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::token::Comma;
use syn::visit_mut::VisitMut;
use syn::{
    AngleBracketedGenericArguments, Attribute, Error as SynError, Expr, FnArg, GenericArgument,
    Ident, ImplItem, ImplItemFn, ItemImpl, LitStr, Meta, Pat, PatType, PathArguments,
    Result as SynResult, ReturnType, Signature, Type, TypePath,
};

const RETURN_TYPE_ERROR: &str = "a constructor's return type should be `Self` or `Result<Self, E>`";

struct ConstructorData {
    self_type: TypePath,
    identifier: Ident,
    arguments: Vec<ArgumentData>,
    return_type: ReturnTypeData,
}

struct ArgumentData {
    span: Span,
    name: LitStr,
    kind: ArgumentKind,
}

enum ArgumentKind {
    Dependency {
        target: Type,
        qualifier: QualifierData,
    },
    Value {
        ty: Type,
        default: DefaultData,
    },
}

enum QualifierData {
    None,
    Named(TokenStream2),
    Qualified(TokenStream2),
}

enum DefaultData {
    None,
    Default,
    Expr(Expr),
}

enum ReturnTypeData {
    Infallible,
    Result { error_type: Type },
}

struct AttributeRemovalVisitor;

impl AttributeRemovalVisitor {
    fn is_custom_attribute(attr: &Attribute) -> bool {
        attr.path().get_ident().is_some_and(|ident| {
            ident == "inject" || ident == "named" || ident == "qualified" || ident == "default"
        })
    }
}

impl VisitMut for AttributeRemovalVisitor {
    fn visit_impl_item_fn_mut(&mut self, item: &mut ImplItemFn) {
        if !is_annotated_with_inject(&&*item) {
            return;
        }

        item.attrs.retain(|attr| !Self::is_custom_attribute(attr));
        for input in item.sig.inputs.iter_mut() {
            if let FnArg::Typed(arg) = input {
                arg.attrs.retain(|attr| !Self::is_custom_attribute(attr));
            }
        }
    }
}

pub fn expand_implementation(impls: TokenStream) -> SynResult<TokenStream2> {
    let mut impls = match syn::parse::<ItemImpl>(impls) {
        Ok(impls) => impls,
        Err(err) => {
            return Err(SynError::new(
                err.span(),
                "`#[injectable]` should be annotated on the `impl` block",
            ))
        }
    };

    let self_type = get_self_type(&impls)?;
    let signature = get_constructor_signature(&impls.items, impls.span())?;
    let ctor_data = parse_constructor(self_type, signature)?;

    let expanded = expand_injectable_implementation(&ctor_data);
    let registration = expand_catalog_registration(&ctor_data.self_type);

    let mut visitor = AttributeRemovalVisitor;
    visitor.visit_item_impl_mut(&mut impls);

    Ok(quote! {
        #impls
        #expanded
        #registration
    })
}

fn get_self_type(impls: &ItemImpl) -> SynResult<TypePath> {
    if let Some((_, path, _)) = &impls.trait_ {
        return Err(SynError::new(
            path.span(),
            "`#[injectable]` should be annotated on an inherent `impl` block",
        ));
    }
    if !impls.generics.params.is_empty() {
        return Err(SynError::new(
            impls.generics.span(),
            "generic types cannot be registered as classes",
        ));
    }

    if let Type::Path(ty) = impls.self_ty.as_ref() {
        Ok(ty.clone())
    } else {
        Err(SynError::new(impls.self_ty.span(), "invalid self type"))
    }
}

fn get_constructor_signature(items: &[ImplItem], impl_span: Span) -> SynResult<Signature> {
    let ctors: Vec<_> = items
        .iter()
        .filter_map(filter_and_map_item_fn)
        .filter(is_annotated_with_inject)
        .collect();

    let signature = if ctors.len() > 1 {
        return Err(SynError::new(
            impl_span,
            "only one associated function can be annotated with `#[inject]`",
        ));
    } else if let Some(&ctor) = ctors.first() {
        ctor.sig.clone()
    } else {
        return Err(SynError::new(
            impl_span,
            "no associated function is annotated with `#[inject]`",
        ));
    };

    if let Some(FnArg::Receiver(rec)) = signature.inputs.first() {
        return Err(SynError::new(
            rec.span(),
            "method is not allowed to be annotated with `#[inject]`",
        ));
    }
    if !signature.generics.params.is_empty() {
        return Err(SynError::new(
            signature.generics.span(),
            "a constructor annotated with `#[inject]` cannot be generic",
        ));
    }

    Ok(signature)
}

fn filter_and_map_item_fn(item: &ImplItem) -> Option<&ImplItemFn> {
    if let ImplItem::Fn(impl_fn) = item {
        Some(impl_fn)
    } else {
        None
    }
}

fn is_annotated_with_inject(item_fn: &&ImplItemFn) -> bool {
    item_fn
        .attrs
        .iter()
        .any(|attr| matches!(&attr.meta, Meta::Path(path) if path.is_ident("inject")))
}

fn parse_constructor(self_type: TypePath, signature: Signature) -> SynResult<ConstructorData> {
    let identifier = signature.ident;
    let arguments = parse_constructor_arguments(signature.inputs)?;
    let return_type = parse_constructor_return_type(signature.output, &self_type)?;

    Ok(ConstructorData {
        self_type,
        identifier,
        arguments,
        return_type,
    })
}

fn parse_constructor_arguments(inputs: Punctuated<FnArg, Comma>) -> SynResult<Vec<ArgumentData>> {
    inputs
        .into_iter()
        .enumerate()
        .map(|(index, arg)| {
            if let FnArg::Typed(arg) = arg {
                parse_argument(index, arg)
            } else {
                unreachable!("a constructor should not have a receiver argument");
            }
        })
        .collect()
}

fn parse_argument(index: usize, arg: PatType) -> SynResult<ArgumentData> {
    let span = arg.span();
    let name = if let Pat::Ident(pat) = arg.pat.as_ref() {
        LitStr::new(&pat.ident.to_string(), pat.ident.span())
    } else {
        LitStr::new(&format!("arg{index}"), span)
    };
    let (qualifier, default) = parse_argument_attributes(&arg.attrs)?;

    let kind = if let Some(target) = shared_target(&arg.ty) {
        if !matches!(default, DefaultData::None) {
            return Err(SynError::new(
                span,
                "`#[default]` is only allowed on value parameters, `Arc<T>` parameters are resolved by the container",
            ));
        }
        ArgumentKind::Dependency {
            target: target.clone(),
            qualifier,
        }
    } else {
        if !matches!(qualifier, QualifierData::None) {
            return Err(SynError::new(
                span,
                "`#[named(...)]` and `#[qualified(...)]` are only allowed on `Arc<T>` parameters",
            ));
        }
        ArgumentKind::Value {
            ty: *arg.ty,
            default,
        }
    };

    Ok(ArgumentData { span, name, kind })
}

/// Returns `T` if `ty` is `Arc<T>`.
fn shared_target(ty: &Type) -> Option<&Type> {
    let Type::Path(TypePath { qself: None, path }) = ty else {
        return None;
    };
    let segment = path.segments.last()?;
    if segment.ident != "Arc" {
        return None;
    }
    let PathArguments::AngleBracketed(AngleBracketedGenericArguments { args, .. }) =
        &segment.arguments
    else {
        return None;
    };

    match (args.len(), args.first()) {
        (1, Some(GenericArgument::Type(target))) => Some(target),
        _ => None,
    }
}

fn parse_argument_attributes(attrs: &[Attribute]) -> SynResult<(QualifierData, DefaultData)> {
    let mut qualifier = QualifierData::None;
    let mut default = DefaultData::None;

    for attr in attrs {
        let Some(attr_name) = attr.path().get_ident() else {
            continue;
        };

        if attr_name == "named" || attr_name == "qualified" {
            let Meta::List(list) = &attr.meta else {
                return Err(SynError::new(
                    attr.span(),
                    if attr_name == "named" {
                        "expects `#[named(...)]` to receive a `&'static str`"
                    } else {
                        "expects `#[qualified(...)]` to receive a `TypedQualifier` value"
                    },
                ));
            };
            if !matches!(qualifier, QualifierData::None) {
                return Err(SynError::new(
                    list.span(),
                    "only one attribute of `#[named(...)]` or `#[qualified(...)]` is allowed",
                ));
            }
            qualifier = if attr_name == "named" {
                QualifierData::Named(list.tokens.clone())
            } else {
                QualifierData::Qualified(list.tokens.clone())
            };
        } else if attr_name == "default" {
            if !matches!(default, DefaultData::None) {
                return Err(SynError::new(
                    attr.span(),
                    "only one `#[default]` attribute is allowed",
                ));
            }
            default = match &attr.meta {
                Meta::Path(_) => DefaultData::Default,
                Meta::List(list) => DefaultData::Expr(list.parse_args()?),
                Meta::NameValue(nv) => {
                    return Err(SynError::new(
                        nv.span(),
                        "expects `#[default]` or `#[default(...)]`",
                    ))
                }
            };
        }
    }

    Ok((qualifier, default))
}

fn parse_constructor_return_type(
    output: ReturnType,
    self_type: &TypePath,
) -> SynResult<ReturnTypeData> {
    let ReturnType::Type(_, return_type) = output else {
        return Err(SynError::new(output.span(), RETURN_TYPE_ERROR));
    };
    let Type::Path(return_type) = *return_type else {
        return Err(SynError::new(return_type.span(), RETURN_TYPE_ERROR));
    };

    if is_self_type(&return_type, self_type) {
        return Ok(ReturnTypeData::Infallible);
    }

    let segments = &return_type.path.segments;
    let is_result = match segments.len() {
        1 => segments[0].ident == "Result",
        3 => segments[0].ident == "std" && segments[1].ident == "result" && segments[2].ident == "Result",
        _ => false,
    };
    match segments.last() {
        Some(last) if is_result => parse_result_return_type(&last.arguments, self_type),
        _ => Err(SynError::new(return_type.span(), RETURN_TYPE_ERROR)),
    }
}

fn is_self_type(ty: &TypePath, self_type: &TypePath) -> bool {
    ty == self_type || ty.path.is_ident("Self")
}

fn parse_result_return_type(
    type_args: &PathArguments,
    self_type: &TypePath,
) -> SynResult<ReturnTypeData> {
    let PathArguments::AngleBracketed(AngleBracketedGenericArguments { args, .. }) = type_args
    else {
        return Err(SynError::new(type_args.span(), RETURN_TYPE_ERROR));
    };

    match (args.len(), args.first(), args.last()) {
        (
            2,
            Some(GenericArgument::Type(Type::Path(first_type))),
            Some(GenericArgument::Type(error_type)),
        ) if is_self_type(first_type, self_type) => Ok(ReturnTypeData::Result {
            error_type: error_type.clone(),
        }),
        _ => Err(SynError::new(type_args.span(), RETURN_TYPE_ERROR)),
    }
}

fn expand_injectable_implementation(ctor_data: &ConstructorData) -> TokenStream2 {
    let self_type = &ctor_data.self_type;
    let constructor = &ctor_data.identifier;

    let associated_type_error =
        if let ReturnTypeData::Result { error_type } = &ctor_data.return_type {
            quote! { type Error = #error_type; }
        } else {
            quote! { type Error = ::std::convert::Infallible; }
        };

    let parameters = ctor_data
        .arguments
        .iter()
        .map(expand_parameter)
        .collect::<Vec<_>>();

    let take_arg_statements = ctor_data
        .arguments
        .iter()
        .enumerate()
        .map(|(i, arg)| {
            let argument = Ident::new(&format!("arg{i}"), arg.span);
            let name = &arg.name;
            match &arg.kind {
                ArgumentKind::Dependency { target, .. } => {
                    quote! { let #argument = arguments.dependency::<#target>(#name)?; }
                }
                ArgumentKind::Value { ty, .. } => {
                    quote! { let #argument = arguments.value::<#ty>(#name)?; }
                }
            }
        })
        .collect::<TokenStream2>();

    let args = ctor_data
        .arguments
        .iter()
        .enumerate()
        .map(|(i, arg)| {
            let argument = Ident::new(&format!("arg{i}"), arg.span);
            quote! { #argument, }
        })
        .collect::<TokenStream2>();

    let wire_args = if let ReturnTypeData::Infallible = &ctor_data.return_type {
        quote! { ::std::result::Result::Ok(::std::result::Result::Ok(#self_type::#constructor(#args))) }
    } else {
        quote! { ::std::result::Result::Ok(#self_type::#constructor(#args)) }
    };

    quote! {
        impl pixielity::class::Injectable for #self_type {
            #associated_type_error

            fn parameters() -> ::std::vec::Vec<pixielity::class::Parameter> {
                ::std::vec![#(#parameters),*]
            }

            #[allow(unused_variables)]
            fn construct(
                arguments: &mut pixielity::class::Arguments,
            ) -> ::std::result::Result<
                ::std::result::Result<Self, Self::Error>,
                pixielity::container::ContainerError
            > {
                #take_arg_statements
                #wire_args
            }
        }
    }
}

fn expand_parameter(arg: &ArgumentData) -> TokenStream2 {
    let name = &arg.name;
    match &arg.kind {
        ArgumentKind::Dependency { target, qualifier } => {
            let key = match qualifier {
                QualifierData::None => quote! { pixielity::key::of::<#target>() },
                QualifierData::Named(named) => quote! { pixielity::key::named::<#target>(#named) },
                QualifierData::Qualified(qualifier) => {
                    quote! { pixielity::key::qualified::<#target, _>(#qualifier) }
                }
            };
            quote_spanned! { arg.span=> pixielity::class::Parameter::dependency(#name, #key) }
        }
        ArgumentKind::Value { ty, default } => match default {
            DefaultData::None => {
                quote_spanned! { arg.span=> pixielity::class::Parameter::value::<#ty>(#name) }
            }
            DefaultData::Default => quote_spanned! { arg.span=>
                pixielity::class::Parameter::with_default(
                    #name,
                    <#ty as ::std::default::Default>::default,
                )
            },
            DefaultData::Expr(expr) => quote_spanned! { arg.span=>
                pixielity::class::Parameter::with_default(#name, || -> #ty { #expr })
            },
        },
    }
}

fn expand_catalog_registration(self_type: &TypePath) -> TokenStream2 {
    quote! {
        const _: () = {
            #[pixielity::linkme::distributed_slice(pixielity::class::catalog::CLASSES)]
            #[linkme(crate = pixielity::linkme)]
            static CLASS: fn() -> pixielity::class::Class = pixielity::class::Class::of::<#self_type>;
        };
    }
}
