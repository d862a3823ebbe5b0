use proc_macro::{Literal, TokenStream, TokenTree};

/// Like stringify!() but also do uppercase.
///
/// # Example
/// ```
/// # use svm_base_proc_upper::upper;
/// assert_eq!(upper!(Push), "PUSH");
/// ```
#[proc_macro]
pub fn upper(stream: TokenStream) -> TokenStream {
    let s = stream.to_string().to_uppercase();

    TokenTree::Literal(Literal::string(&s)).into()
}
