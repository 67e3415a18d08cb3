mod attrs;
mod impls;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use syn::Result as SynResult;

/// Makes the annotated `impl` block's `#[inject]` constructor the way the
/// container builds the type, and registers the type in the class catalog.
///
/// Parameters of type `Arc<T>` are dependencies resolved by `key::of::<T>()`,
/// or by `#[named("...")]` / `#[qualified(...)]` keys. Any other parameter is
/// a value: `#[default]` fills it with `Default::default()` and
/// `#[default(expr)]` with `expr`. A value parameter without a default
/// cannot be resolved.
#[proc_macro_attribute]
pub fn injectable(attr: TokenStream, item: TokenStream) -> TokenStream {
    match injectable_impl(attr, item) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}

fn injectable_impl(attr: TokenStream, item: TokenStream) -> SynResult<TokenStream2> {
    attrs::parse_attributes(attr)?;
    let expanded = impls::expand_implementation(item)?;
    Ok(expanded)
}
