//! Template helper registry.
//!
//! Text helpers (`escape_*`, `literal`, `u32`, `u64`, `ref_id`) write to the template
//! output; predicate and cast helpers (`is_delval`, `is_*_item`, `as_*_item`)
//! return JSON so they can be used as subexpressions in `{{#if}}` and
//! `{{#with}}` blocks.

use handlebars::{
    handlebars_helper, Context, Handlebars, Helper, HelperDef, RenderContext, RenderError,
    RenderErrorReason, ScopedJson,
};
use policygen_types::{ElementKind, Literal};
use serde_json::Value as Json;

use crate::escape;
use crate::literal::{literal, ref_id};

/// Install every policygen helper into `registry`.
pub fn register(registry: &mut Handlebars<'_>) {
    registry.register_helper("escape_type", Box::new(escape_type_helper));
    registry.register_helper("escape_identifier", Box::new(escape_identifier_helper));
    registry.register_helper("escape_namespace", Box::new(escape_namespace_helper));
    registry.register_helper("escape_xmldoc", Box::new(escape_xmldoc_helper));
    registry.register_helper("ref_id", Box::new(ref_id_helper));
    registry.register_helper("literal", Box::new(literal_helper));
    registry.register_helper("u32", Box::new(u32_helper));
    registry.register_helper("u64", Box::new(u64_helper));
    registry.register_helper("is_delval", Box::new(is_delval));

    for kind in ElementKind::ALL {
        registry.register_helper(&format!("is_{}_item", kind.tag()), Box::new(KindPredicate(kind)));
        registry.register_helper(&format!("as_{}_item", kind.tag()), Box::new(KindCast(kind)));
    }
}

// ── Text helpers ───────────────────────────────────────────────────────

macro_rules! text_helper {
    ($name:ident, $transform:path) => {
        fn $name(
            h: &handlebars::Helper,
            _: &Handlebars,
            _: &handlebars::Context,
            _: &mut handlebars::RenderContext,
            out: &mut dyn handlebars::Output,
        ) -> handlebars::HelperResult {
            let param = h.param(0).and_then(|v| v.value().as_str()).unwrap_or("");
            out.write(&$transform(param))?;
            Ok(())
        }
    };
}

text_helper!(escape_type_helper, escape::escape_type);
text_helper!(escape_identifier_helper, escape::escape_identifier);
text_helper!(escape_namespace_helper, escape::escape_namespace);
text_helper!(escape_xmldoc_helper, escape::escape_xmldoc);
text_helper!(ref_id_helper, ref_id);

fn literal_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let param = h
        .param(0)
        .ok_or(RenderErrorReason::ParamNotFoundForIndex("literal", 0))?;
    let value = literal_from_json(param.value()).map_err(RenderErrorReason::Other)?;
    out.write(&literal(&value))?;
    Ok(())
}

macro_rules! unsigned_helper {
    ($name:ident, $helper:literal, $ty:ty, $variant:ident) => {
        fn $name(
            h: &handlebars::Helper,
            _: &Handlebars,
            _: &handlebars::Context,
            _: &mut handlebars::RenderContext,
            out: &mut dyn handlebars::Output,
        ) -> handlebars::HelperResult {
            let param = h
                .param(0)
                .ok_or(RenderErrorReason::ParamNotFoundForIndex($helper, 0))?;
            let n = param
                .value()
                .as_u64()
                .and_then(|n| <$ty>::try_from(n).ok())
                .ok_or_else(|| {
                    RenderErrorReason::Other(format!(
                        "{}: {} is not a {} value",
                        $helper,
                        param.value(),
                        stringify!($ty)
                    ))
                })?;
            out.write(&literal(&Literal::$variant(n)))?;
            Ok(())
        }
    };
}

unsigned_helper!(u32_helper, "u32", u32, U32);
unsigned_helper!(u64_helper, "u64", u64, U64);

/// Interpret a template value as a [`Literal`].
///
/// Tagged objects decode as their literal kind; bare booleans, numbers and
/// strings map to their natural literal; `null` is the delete-sentinel.
pub fn literal_from_json(value: &Json) -> Result<Literal, String> {
    match value {
        Json::Null => Ok(Literal::Delete),
        Json::Bool(b) => Ok(Literal::Bool(*b)),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Literal::Int(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Literal::U64(u))
            } else {
                n.as_f64()
                    .map(Literal::F64)
                    .ok_or_else(|| format!("literal: unrepresentable number {n}"))
            }
        }
        Json::String(s) => Ok(Literal::String(s.clone())),
        Json::Object(_) => serde_json::from_value(value.clone())
            .map_err(|e| format!("literal: {value} is not a literal value ({e})")),
        Json::Array(_) => Err(format!("literal: {value} has no literal form")),
    }
}

// ── Predicates and casts ───────────────────────────────────────────────

handlebars_helper!(is_delval: |v: Json| v.as_str() == Some("delete"));

fn kind_of(value: &Json) -> Option<&str> {
    value.get("kind").and_then(Json::as_str)
}

/// `is_<kind>_item`: whether the argument is an element of one kind.
struct KindPredicate(ElementKind);

impl HelperDef for KindPredicate {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let matches = h
            .param(0)
            .map(|p| kind_of(p.value()) == Some(self.0.tag()))
            .unwrap_or(false);
        Ok(ScopedJson::Derived(Json::Bool(matches)))
    }
}

/// `as_<kind>_item`: checked cast; fails the render on any other kind.
struct KindCast(ElementKind);

impl HelperDef for KindCast {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let param = h
            .param(0)
            .ok_or(RenderErrorReason::ParamNotFoundForIndex("element cast", 0))?;
        let value = param.value();
        match kind_of(value) {
            Some(tag) if tag == self.0.tag() => Ok(ScopedJson::Derived(value.clone())),
            other => Err(RenderErrorReason::Other(format!(
                "cannot cast {} to a {} element",
                other.unwrap_or("a non-element value"),
                self.0
            ))
            .into()),
        }
    }
}
