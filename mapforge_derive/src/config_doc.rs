use syn::{Attribute, Type};

/// How a config field is rendered when it carries no `#[config_demo]`.
pub enum FieldClass {
	Primitive,
	Optional,
	List,
	Map,
	Nested,
}

pub fn classify(ty: &Type) -> FieldClass {
	let Some(ident) = path_ident(ty) else {
		return FieldClass::Primitive;
	};
	match ident.to_string().as_str() {
		"Option" => FieldClass::Optional,
		"Vec" => FieldClass::List,
		"HashMap" | "BTreeMap" => FieldClass::Map,
		"bool" | "String" | "PathBuf" | "u8" | "u16" | "u32" | "u64" | "usize" | "i8" | "i16" | "i32" | "i64"
		| "isize" | "f32" | "f64" => FieldClass::Primitive,
		_ => FieldClass::Nested,
	}
}

pub fn collect_doc(attrs: &[Attribute]) -> String {
	let mut lines: Vec<String> = Vec::new();
	for attr in attrs {
		if !attr.path().is_ident("doc") {
			continue;
		}
		if let syn::Meta::NameValue(nv) = &attr.meta {
			if let syn::Expr::Lit(syn::ExprLit {
				lit: syn::Lit::Str(lit), ..
			}) = &nv.value
			{
				lines.push(lit.value().trim().to_string());
			}
		}
	}
	lines.join("\n")
}

pub fn serde_rename(attrs: &[Attribute]) -> Option<String> {
	let mut out: Option<String> = None;
	for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
		let _ = attr.parse_nested_meta(|meta| {
			if meta.path.is_ident("rename") {
				let lit: syn::LitStr = meta.value()?.parse()?;
				out = Some(lit.value());
			} else if meta.input.peek(syn::Token![=]) {
				// skip `default = "..."` and friends
				let _: syn::Expr = meta.value()?.parse()?;
			}
			Ok(())
		});
	}
	out
}

pub fn demo_value(attrs: &[Attribute]) -> Option<String> {
	attrs
		.iter()
		.filter(|a| a.path().is_ident("config_demo"))
		.find_map(|a| a.parse_args::<syn::LitStr>().ok())
		.map(|lit| lit.value())
}

fn path_ident(ty: &Type) -> Option<&syn::Ident> {
	if let Type::Path(tp) = ty {
		tp.path.segments.last().map(|seg| &seg.ident)
	} else {
		None
	}
}
