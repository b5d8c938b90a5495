use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{
    braced, bracketed, parse::Parse, parse_macro_input, spanned::Spanned, token::Comma, Attribute,
    Expr, Field, Generics, Ident, Token, Visibility,
};

/// A `[[...]]` line inside a parsable struct or enum.
///
/// ```text
/// [[magic: Word = 0xF1FA]]
/// [[padding_bytes = 2]]
/// [[param: Word = name_len]]
/// [[limit_buffer = chunk_size as usize - 4]]
/// ```
enum ParsingDirective {
    Magic { typ: syn::Type, val: syn::Expr },
    Ignore { typ: syn::Type },
    Padding { num_bytes: syn::Expr },
    Param { typ: syn::Type, name: syn::Ident },
    LimitBuffer { size: syn::Expr },
}

struct DoubleBracketedInput;

impl DoubleBracketedInput {
    /// Opens `[[ident ...]]` and hands the identifier plus the remaining
    /// inner tokens to `f`. Everything inside the brackets must be consumed.
    fn parse_nested<T>(
        input: syn::parse::ParseStream,
        f: impl FnOnce(&Ident, syn::parse::ParseStream) -> syn::Result<T>,
    ) -> syn::Result<T> {
        let outer;
        bracketed!(outer in input);
        let inner;
        bracketed!(inner in outer);
        if !outer.is_empty() {
            return Err(outer.error("expected `]]`"));
        }

        let ident = inner.parse::<Ident>()?;
        let out = f(&ident, &inner)?;
        if !inner.is_empty() {
            return Err(inner.error("unexpected tokens in directive"));
        }
        Ok(out)
    }
}

impl Parse for ParsingDirective {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        DoubleBracketedInput::parse_nested(input, Self::parse_from_double_brackets)
    }
}

impl ParsingDirective {
    fn parse_from_double_brackets(
        ident: &Ident,
        input: syn::parse::ParseStream,
    ) -> syn::Result<Self> {
        match ident.to_string().as_str() {
            "magic" => {
                input.parse::<Token![:]>()?;
                let typ: syn::Type = input.parse()?;
                input.parse::<Token![=]>()?;
                let val: syn::Expr = input.parse()?;
                Ok(Self::Magic { typ, val })
            }
            "padding_bytes" => {
                input.parse::<Token![=]>()?;
                let num_bytes: syn::Expr = input.parse()?;
                Ok(Self::Padding { num_bytes })
            }
            "ignore" => {
                input.parse::<Token![:]>()?;
                let typ: syn::Type = input.parse()?;
                Ok(Self::Ignore { typ })
            }
            "param" => {
                input.parse::<Token![:]>()?;
                let typ: syn::Type = input.parse()?;
                input.parse::<Token![=]>()?;
                let name: syn::Ident = input.parse()?;
                Ok(Self::Param { typ, name })
            }
            "limit_buffer" => {
                input.parse::<Token![=]>()?;
                let size: syn::Expr = input.parse()?;
                Ok(Self::LimitBuffer { size })
            }
            _ => Err(syn::Error::new(ident.span(), "invalid parsing directive")),
        }
    }

    fn as_tokens(&self, endianess: &proc_macro2::TokenStream) -> proc_macro2::TokenStream {
        match self {
            ParsingDirective::Magic { typ, val } => {
                quote! {
                    {
                        let magic = input.read_type::<#endianess, #typ>()?;
                        if magic != #val {
                            return Err(::parsing::Error::MagicCheckFailed {
                                expected: (#val) as u64,
                                found: magic as u64,
                            });
                        }
                    }
                }
            }
            ParsingDirective::Padding { num_bytes } => {
                quote! {
                    input.read_bytes((#num_bytes) as usize)?;
                }
            }
            ParsingDirective::Param { typ, name } => {
                quote! {
                    let #name = input.read_type::<#endianess, #typ>()?;
                }
            }
            ParsingDirective::Ignore { typ } => {
                quote! {
                    input.read_type::<#endianess, #typ>()?;
                }
            }
            ParsingDirective::LimitBuffer { size } => {
                quote! {
                    #[allow(unused_mut)]
                    let mut input: &[u8] = input.read_bytes((#size) as usize)?;
                }
            }
        }
    }

    fn limits_buffer(&self) -> bool {
        matches!(self, ParsingDirective::LimitBuffer { .. })
    }
}

struct FieldStruct {
    name: Ident,
    read_type: syn::Type,
    option: Option<syn::Expr>,
    e: FieldEnum,
}

enum FieldEnum {
    Normal,
    SizedUtf8String(syn::Expr),
    SizedBuf(syn::Expr),
    RestOfBuf,
    Collection {
        field_ty: syn::Type,
        num_elems: syn::Expr,
    },
}

impl FieldStruct {
    fn normal(name: Ident, ty: syn::Type) -> Self {
        Self {
            name,
            read_type: ty,
            option: None,
            e: FieldEnum::Normal,
        }
    }

    /// Applies one `#[parse(...)]` attribute to this field
    fn apply_attribute(&mut self, attr: &Attribute, field_ty: &syn::Type) -> syn::Result<()> {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("sized_utf8_string") {
                let size = meta.value()?.parse::<Expr>()?;
                self.e = FieldEnum::SizedUtf8String(size);
            } else if meta.path.is_ident("sized_buf") {
                let size = meta.value()?.parse::<Expr>()?;
                self.e = FieldEnum::SizedBuf(size);
            } else if meta.path.is_ident("rest_of_buf") {
                self.e = FieldEnum::RestOfBuf;
            } else if meta.path.is_ident("collection") {
                meta.input.parse::<Token![:]>()?;
                let ty = meta.input.parse::<syn::Type>()?;
                meta.input.parse::<Token![=]>()?;
                let num_elems = meta.input.parse::<Expr>()?;
                self.read_type = ty;
                self.e = FieldEnum::Collection {
                    field_ty: field_ty.clone(),
                    num_elems,
                };
            } else if meta.path.is_ident("option_if") {
                meta.input.parse::<Token![:]>()?;
                let ty = meta.input.parse::<syn::Type>()?;
                meta.input.parse::<Token![=]>()?;
                let if_expr = meta.input.parse::<Expr>()?;
                self.read_type = ty;
                self.option = Some(if_expr);
            } else {
                return Err(meta.error("unsupported parse attribute"));
            }
            Ok(())
        })
    }

    fn as_tokens(&self, endianess: &proc_macro2::TokenStream) -> proc_macro2::TokenStream {
        let read = match &self.e {
            FieldEnum::Normal => {
                let ty = &self.read_type;
                quote! {input.read_type::<#endianess, #ty>()?}
            }
            FieldEnum::SizedUtf8String(size) => {
                quote! {
                    input.read_utf8((#size) as usize)?.into()
                }
            }
            FieldEnum::SizedBuf(size) => {
                quote! {input.read_bytes((#size) as usize)?.into()}
            }
            FieldEnum::RestOfBuf => {
                quote! {input.read_rest().into()}
            }
            FieldEnum::Collection {
                field_ty,
                num_elems,
            } => {
                let item_ty = &self.read_type;
                quote! {
                    {
                        let tmp: ::parsing::Result<#field_ty> = (0..#num_elems)
                            .map(|_| input.read_type::<#endianess, #item_ty>())
                            .collect();
                        tmp?
                    }
                }
            }
        };
        let name = &self.name;
        if let Some(e) = &self.option {
            quote! {
                let #name = if #e {
                    Some(#read)
                } else {
                    None
                };
            }
        } else {
            quote! {
                let #name = #read;
            }
        }
    }
}

enum FieldOrDirective {
    Field(FieldStruct),
    Directive(ParsingDirective),
}

impl FieldOrDirective {
    fn as_tokens(&self, endianess: &proc_macro2::TokenStream) -> proc_macro2::TokenStream {
        match self {
            FieldOrDirective::Directive(thing) => thing.as_tokens(endianess),
            FieldOrDirective::Field(field) => field.as_tokens(endianess),
        }
    }

    fn limits_buffer(&self) -> bool {
        match self {
            FieldOrDirective::Directive(thing) => thing.limits_buffer(),
            FieldOrDirective::Field(_) => false,
        }
    }
}

struct ParsedStruct {
    s: syn::ItemStruct,
    things: Vec<FieldOrDirective>,
}

impl Parse for ParsedStruct {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let struct_attrs = input.call(Attribute::parse_outer)?;
        let vis = input.parse::<Visibility>()?;
        let struct_token = input.parse::<Token![struct]>()?;
        let name = input.parse::<Ident>()?;
        let mut generics = input.parse::<Generics>()?;
        if input.peek(Token![where]) {
            generics.where_clause = Some(input.parse::<syn::WhereClause>()?)
        };

        let braced_input;
        let brace_token = braced!(braced_input in input);
        let input = braced_input;

        let mut fields = syn::punctuated::Punctuated::<Field, Comma>::new();
        let mut parsing_things = Vec::new();

        while !input.is_empty() {
            if input.peek(syn::token::Bracket) {
                let directive = input.parse::<ParsingDirective>()?;
                parsing_things.push(FieldOrDirective::Directive(directive));
                continue;
            }

            let mut field = input.call(Field::parse_named)?;
            let Some(field_name) = field.ident.clone() else {
                return Err(syn::Error::new(field.span(), "expected a named field"));
            };
            let mut field_thing = FieldStruct::normal(field_name, field.ty.clone());

            let (parse_attrs, attrs): (Vec<_>, Vec<_>) = field
                .attrs
                .drain(..)
                .partition(|attr| attr.path().is_ident("parse"));
            field.attrs = attrs;
            for attr in &parse_attrs {
                field_thing.apply_attribute(attr, &field.ty)?;
            }

            parsing_things.push(FieldOrDirective::Field(field_thing));
            fields.push(field);
            if input.peek(Token![,]) {
                input.parse::<Comma>()?;
            } else if !input.is_empty() && !input.peek(syn::token::Bracket) {
                return Err(input.error("expected `,` after field"));
            }
        }

        let fields = syn::FieldsNamed {
            brace_token,
            named: fields,
        };

        let s = syn::ItemStruct {
            attrs: struct_attrs,
            vis,
            struct_token,
            ident: name,
            generics,
            fields: syn::Fields::Named(fields),
            semi_token: None,
        };

        Ok(Self {
            s,
            things: parsing_things,
        })
    }
}

fn add_extra_lifetime_and_bound_generics(
    generics: &syn::Generics,
    lifetime: &syn::Lifetime,
) -> (syn::Generics, syn::Generics) {
    let mut generics_mod = generics.clone();

    generics_mod.params.insert(
        0,
        syn::GenericParam::Lifetime(syn::LifetimeParam::new(lifetime.clone())),
    );

    let mut bounds = syn::punctuated::Punctuated::new();
    for l in generics.lifetimes() {
        bounds.push(l.lifetime.clone());
    }

    if !bounds.is_empty() {
        generics_mod
            .make_where_clause()
            .predicates
            .push(syn::WherePredicate::Lifetime(syn::PredicateLifetime {
                lifetime: lifetime.clone(),
                colon_token: syn::token::Colon::default(),
                bounds,
            }));
    }

    (generics_mod, generics.clone())
}

/// Wraps the body of a parse fn, checking that a limited buffer was used up
fn parse_fn_body(
    steps: &[proc_macro2::TokenStream],
    build: proc_macro2::TokenStream,
    check_consumed: bool,
) -> proc_macro2::TokenStream {
    let check = if check_consumed {
        quote! {
            let remaining = input.remaining();
            if remaining != 0 {
                return Err(::parsing::Error::UnconsumedBytes { remaining });
            }
        }
    } else {
        quote! {}
    };
    quote! {
        #[allow(unused_imports)]
        use ::parsing::ReadBytes as _;
        #(
            #steps
        )*
        let value = #build;
        #check
        Ok(value)
    }
}

fn generate_parse_impl(
    things: &[FieldOrDirective],
    struct_def: &syn::ItemStruct,
) -> proc_macro2::TokenStream {
    let le = quote! {::parsing::LE};
    let be = quote! {::parsing::BE};
    let parsing_le: Vec<_> = things.iter().map(|t| t.as_tokens(&le)).collect();
    let parsing_be: Vec<_> = things.iter().map(|t| t.as_tokens(&be)).collect();
    let check_consumed = things.iter().any(FieldOrDirective::limits_buffer);

    let struct_name = &struct_def.ident;
    let field_names: Vec<_> = struct_def
        .fields
        .iter()
        .filter_map(|f| f.ident.as_ref())
        .collect();
    let build = quote! {
        Self {
            #(
                #field_names
            ),*
        }
    };
    let body_le = parse_fn_body(&parsing_le, build.clone(), check_consumed);
    let body_be = parse_fn_body(&parsing_be, build, check_consumed);

    let parse_lifetime = syn::Lifetime::new("'parse", Span::call_site());
    let (generics_mod, generics) =
        add_extra_lifetime_and_bound_generics(&struct_def.generics, &parse_lifetime);
    let (impl_generics, _, where_clause) = generics_mod.split_for_impl();
    let (_, ty_generics, _) = generics.split_for_impl();

    quote! {
        impl #impl_generics ::parsing::Parse<#parse_lifetime, #le> for #struct_name #ty_generics #where_clause {
            fn parse(input: &mut impl ::parsing::ReadBytes<#parse_lifetime>) -> ::parsing::Result<Self> {
                #body_le
            }
        }

        impl #impl_generics ::parsing::Parse<#parse_lifetime, #be> for #struct_name #ty_generics #where_clause {
            fn parse(input: &mut impl ::parsing::ReadBytes<#parse_lifetime>) -> ::parsing::Result<Self> {
                #body_be
            }
        }
    }
}

/// Derives the Parse trait for a struct
/// allows adding padding and magic numbers
/// ```ignore
/// parsable_struct! {
///     pub struct Header {
///         [[magic: u32 = 0x0401]]
///         pub field1: u16,
///         [[padding_bytes = 4]]
///         pub field2: u8,
///         [[param: u32 = size_of_something]]
///         [[padding_bytes = 40]]
///     }
/// }
/// ```
/// `padding_bytes` will be taken out from the buffer during the parse,
/// but are not part of the struct definition.
/// `magic` is treated the same way as `padding_bytes`, but its value is verified
/// and the parse will fail if it does not match the expected value
/// `[[param: <int type> = <name>]]` will parse an int from the buffer,
/// making it available to future fields, but will not add it to the struct definition
/// mostly intended to be used to hide sizes of buffers and strings from the struct definition
///
/// `[[limit_buffer = <size expr>]]` restricts everything after it to the next
/// `<size expr>` bytes. The parse fails with `UnconsumedBytes` if those bytes
/// are not all read by the end of the struct.
///
/// Parsing sized buffers and strings
///  ```ignore
/// parsable_struct! {
///     pub struct Header<'a> {
///         pub field1: u16,
///         [[param: u8 = buf_size]]
///         pub some_other_field: u32,
///         #[parse(sized_buf = buf_size)]
///         s: &'a [u8],
///     }
/// }
/// ```
/// `.into()` is called on the byte slice, so anything that implements `From<&[u8]>`
/// can be used with `#[parse(sized_buf = <size_param>)]`
///
/// ```ignore
/// parsable_struct! {
///     pub struct Header<'a> {
///         pub field1: u16,
///         [[param: u8 = string_size]]
///         pub some_other_field: u32,
///         #[parse(sized_utf8_string = string_size)]
///         s: &'a str,
///     }
/// }
/// ```
/// `.into()` is called on the string slice, so anything that implements `From<&str>`
/// can be used with `#[parse(sized_utf8_string = <size_param>)]`
///
/// Optional fields are read only when a condition over earlier fields holds
/// ```ignore
/// parsable_struct! {
///     pub struct Layer {
///         pub layer_type: u16,
///         #[parse(option_if: u32 = layer_type == 2)]
///         pub tileset_index: Option<u32>,
///     }
/// }
/// ```
///
/// Collections
/// ```ignore
/// parsing::parsable_struct! {
///     #[derive(Debug)]
///     pub struct Item<'a> {
///         [[param: u8 = buf_size]]
///         #[parse(sized_buf = buf_size)]
///         buf: &'a [u8],
///     }
/// }
/// parsing::parsable_struct! {
///     #[derive(Debug)]
///     pub struct Header<'a> {
///         [[param: u8 = num_items]]
///         something: u32,
///         #[parse(collection: Item = num_items)]
///         items: Vec<Item<'a>>,
///     }
/// }
/// ```
/// Parse a number of variably-sized elements into a collection
/// Does not have to be a Vec, .collect() is called on an iterator.
#[proc_macro]
pub fn parsable_struct(input: TokenStream) -> TokenStream {
    let parsed = parse_macro_input!(input as ParsedStruct);
    let parse_impl = generate_parse_impl(&parsed.things, &parsed.s);
    let struct_def = &parsed.s;
    let expanded = quote! {
        #struct_def
        #parse_impl
    };
    TokenStream::from(expanded)
}

/// A simpler version of parsable_struct! that can be derived
#[proc_macro_derive(Parse)]
pub fn parse_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as syn::ItemStruct);
    let mut things = Vec::new();
    for field in input.fields.iter() {
        let Some(name) = field.ident.clone() else {
            return syn::Error::new(field.span(), "Parse can only be derived for named fields")
                .to_compile_error()
                .into();
        };
        things.push(FieldOrDirective::Field(FieldStruct::normal(
            name,
            field.ty.clone(),
        )));
    }
    TokenStream::from(generate_parse_impl(&things, &input))
}

struct ParsedEnum {
    directives: Vec<ParsingDirective>,
    type_field_name: syn::Expr,
    e: syn::ItemEnum,
}

enum EnumHeaderItem {
    EnumType(syn::Expr),
    Directive(ParsingDirective),
}

impl Parse for ParsedEnum {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let vis = input.parse::<Visibility>()?;
        let enum_token = input.parse::<Token![enum]>()?;
        let ident = input.parse::<Ident>()?;
        let mut generics = input.parse::<Generics>()?;
        generics.where_clause = input.parse()?;

        let content;
        let brace_token = braced!(content in input);
        let input = content;

        let mut type_field_name = None;
        let mut directives = Vec::new();

        // directives come first, then the variants
        while input.peek(syn::token::Bracket) {
            let item = DoubleBracketedInput::parse_nested(&input, |ident, input| {
                if ident == "enum_type" {
                    input.parse::<Token![=]>()?;
                    Ok(EnumHeaderItem::EnumType(input.parse::<syn::Expr>()?))
                } else {
                    ParsingDirective::parse_from_double_brackets(ident, input)
                        .map(EnumHeaderItem::Directive)
                }
            })?;
            match item {
                EnumHeaderItem::EnumType(expr) => type_field_name = Some(expr),
                EnumHeaderItem::Directive(dir) => directives.push(dir),
            }
        }

        let Some(type_field_name) = type_field_name else {
            return Err(input.error("missing enum type directive `[[enum_type = <param>]]`"));
        };

        let variants = input.parse_terminated(syn::Variant::parse, Token![,])?;

        for var in variants.iter() {
            if var.discriminant.is_none() {
                return Err(syn::Error::new(
                    var.ident.span(),
                    "variant missing a discriminant ( ex: = 0x021 )",
                ));
            }
            match &var.fields {
                syn::Fields::Unnamed(fields) => {
                    if fields.unnamed.len() != 1 {
                        return Err(syn::Error::new(
                            fields.span(),
                            "Only 1 unnamed field is allowed",
                        ));
                    }
                }
                syn::Fields::Named(_) | syn::Fields::Unit => {
                    return Err(syn::Error::new(
                        var.fields.span(),
                        "Only 1 unnamed field is allowed",
                    ));
                }
            }
        }

        let e = syn::ItemEnum {
            attrs,
            vis,
            enum_token,
            ident,
            generics,
            brace_token,
            variants,
        };

        Ok(Self {
            directives,
            type_field_name,
            e,
        })
    }
}

/// Parses one of several types selected by a type value read from the buffer.
///
/// Each variant wraps exactly one parsable type and carries the type value
/// as its discriminant. An unmatched type value fails the parse with
/// `EnumTypeValueMatchFailed`.
#[proc_macro]
pub fn parsable_enum(input: TokenStream) -> TokenStream {
    let parsed = parse_macro_input!(input as ParsedEnum);

    let le = quote! {::parsing::LE};
    let be = quote! {::parsing::BE};

    let parsing_le: Vec<_> = parsed.directives.iter().map(|dir| dir.as_tokens(&le)).collect();
    let parsing_be: Vec<_> = parsed.directives.iter().map(|dir| dir.as_tokens(&be)).collect();
    let check_consumed = parsed.directives.iter().any(ParsingDirective::limits_buffer);

    let enum_def = &parsed.e;
    let enum_name = &enum_def.ident;
    let type_name = &parsed.type_field_name;

    let enum_values: Vec<_> = enum_def
        .variants
        .iter()
        .filter_map(|var| var.discriminant.as_ref().map(|(_, value)| value))
        .collect();

    let enum_idents: Vec<_> = enum_def.variants.iter().map(|var| &var.ident).collect();

    let build = |endianess: &proc_macro2::TokenStream| {
        quote! {
            match #type_name {
                #(
                    #enum_values => #enum_name :: #enum_idents(input.read_type::<#endianess, _>()?),
                )*
                _ => {
                    return Err(::parsing::Error::EnumTypeValueMatchFailed((#type_name) as u64));
                }
            }
        }
    };
    let body_le = parse_fn_body(&parsing_le, build(&le), check_consumed);
    let body_be = parse_fn_body(&parsing_be, build(&be), check_consumed);

    let parse_lifetime = syn::Lifetime::new("'parse", Span::call_site());
    let (generics_mod, generics) =
        add_extra_lifetime_and_bound_generics(&enum_def.generics, &parse_lifetime);
    let (impl_generics, _, where_clause) = generics_mod.split_for_impl();
    let (_, ty_generics, _) = generics.split_for_impl();

    let expanded = quote! {
        #enum_def

        impl #impl_generics ::parsing::Parse<#parse_lifetime, #le> for #enum_name #ty_generics #where_clause {
            fn parse(input: &mut impl ::parsing::ReadBytes<#parse_lifetime>) -> ::parsing::Result<Self> {
                #body_le
            }
        }

        impl #impl_generics ::parsing::Parse<#parse_lifetime, #be> for #enum_name #ty_generics #where_clause {
            fn parse(input: &mut impl ::parsing::ReadBytes<#parse_lifetime>) -> ::parsing::Result<Self> {
                #body_be
            }
        }
    };
    TokenStream::from(expanded)
}
