//! Procedural macros shared by the urltile crates.
//!
//! The only macro is [`macro@context`], which attaches a formatted message to every
//! error returned from the annotated function:
//!
//! ```ignore
//! #[context("reading tile file '{}'", path.display())]
//! fn read(path: &Path) -> anyhow::Result<Vec<u8>> {
//! 	Ok(std::fs::read(path)?)
//! }
//! ```
//!
//! The function must return an `anyhow::Result` and may be `async`.

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{ToTokens, quote};
use syn::{Expr, Ident, ItemFn, ReturnType, Stmt, parse_macro_input};

#[proc_macro_attribute]
pub fn context(args: TokenStream, input: TokenStream) -> TokenStream {
	let function = parse_macro_input!(input as ItemFn);
	expand(args.into(), function)
		.unwrap_or_else(syn::Error::into_compile_error)
		.into()
}

/// Runs the original body as an inner block and maps its error.
fn expand(message: TokenStream2, mut function: ItemFn) -> syn::Result<TokenStream2> {
	if message.is_empty() {
		return Err(syn::Error::new(Span::call_site(), "expected a format string"));
	}
	let ReturnType::Type(_, return_type) = &function.sig.output else {
		return Err(syn::Error::new_spanned(&function.sig, "function must return a Result"));
	};

	let body = &function.block;
	let result = Ident::new("result", Span::mixed_site());
	let error = Ident::new("error", Span::mixed_site());
	let inner = if function.sig.asyncness.is_some() {
		quote! { async { #body }.await }
	} else {
		quote! { (|| -> #return_type { #body })() }
	};
	let wrapped = quote! {
		let #result: #return_type = #inner;
		#result.map_err(|#error| #error.context(format!(#message)))
	};
	function.block.stmts = vec![Stmt::Expr(Expr::Verbatim(wrapped), None)];
	Ok(function.into_token_stream())
}

#[cfg(test)]
mod tests {
	use super::*;
	use syn::parse_quote;

	fn expanded(message: TokenStream2, function: ItemFn) -> String {
		expand(message, function).unwrap().to_string().replace(' ', "")
	}

	#[test]
	fn sync_body_runs_in_closure() {
		let output = expanded(
			quote!("opening {}", path),
			parse_quote! {
				fn open(path: &str) -> Result<u8> { Ok(1) }
			},
		);
		assert!(output.contains("(||->Result<u8>{"), "{output}");
		assert!(output.contains(".context(format!(\"opening{}\",path))"), "{output}");
	}

	#[test]
	fn async_body_is_awaited() {
		let output = expanded(
			quote!("loading"),
			parse_quote! {
				async fn load(&self) -> Result<()> { Ok(()) }
			},
		);
		assert!(output.contains("async{"), "{output}");
		assert!(output.contains(".await"), "{output}");
	}

	#[test]
	fn rejects_missing_result() {
		let error = expand(quote!("x"), parse_quote! { fn f() {} }).unwrap_err();
		assert!(error.to_string().contains("must return a Result"));
	}

	#[test]
	fn rejects_empty_message() {
		let error = expand(TokenStream2::new(), parse_quote! { fn f() -> Result<()> { Ok(()) } }).unwrap_err();
		assert!(error.to_string().contains("format string"));
	}
}
