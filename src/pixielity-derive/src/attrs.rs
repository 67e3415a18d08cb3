use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use syn::{spanned::Spanned, Error as SynError, Result as SynResult};

pub fn parse_attributes(attr: TokenStream) -> SynResult<()> {
    if attr.is_empty() {
        return Ok(());
    }

    let tokens = TokenStream2::from(attr);
    Err(SynError::new(
        tokens.span(),
        "`#[injectable]` takes no arguments, bind an interface to the class with `Concrete::upcast` instead",
    ))
}
