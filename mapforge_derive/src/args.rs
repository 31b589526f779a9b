use proc_macro2::TokenStream as TokenStream2;
use syn::{
	Token,
	parse::{self, Parse, ParseStream},
};

/// Arguments of `#[context(...)]`: an optional leading `move,` followed by `format!` arguments.
#[derive(Debug)]
pub struct Args(pub Option<Token![move]>, pub TokenStream2);

impl Parse for Args {
	fn parse(input: ParseStream<'_>) -> parse::Result<Self> {
		let move_token = if input.peek(Token![move]) {
			let token = input.parse()?;
			input.parse::<Token![,]>()?;
			Some(token)
		} else {
			None
		};
		Ok(Self(move_token, input.parse()?))
	}
}

#[cfg(test)]
mod tests {
	use super::Args;
	use syn::parse_str;

	#[test]
	fn plain_format_string() {
		let args: Args = parse_str("\"fetching layer {}\", name").unwrap();
		assert!(args.0.is_none());
		assert_eq!(args.1.to_string(), "\"fetching layer {}\" , name");
	}

	#[test]
	fn leading_move() {
		let args: Args = parse_str("move, \"writing {path:?}\"").unwrap();
		assert!(args.0.is_some());
		assert_eq!(args.1.to_string(), "\"writing {path:?}\"");
	}

	#[test]
	fn move_without_comma_fails() {
		let err = parse_str::<Args>("move \"oops\"").unwrap_err();
		assert!(err.to_string().contains(','), "expected comma error, got: {err}");
	}
}
