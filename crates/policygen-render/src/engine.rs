//! Source rendering engine.
//!
//! Produces one C# compilation unit for a whole policy model:
//!
//! ```text
//! banner
//! #pragma warning disable …
//! namespace <Assembly>
//! {
//!     namespace <Policy.Namespace> { usings; class <Policy> : PolicyBase … }   (per policy)
//!     namespace PolicyRuntime { usings; base models … helpers }               (once)
//! }
//! ```

use policygen_types::{CancelToken, ElementItem, Policy, PolicyModel};
use serde_json::{json, Value as Json};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{RenderError, RenderResult};
use crate::escape::{escape_identifier, escape_namespace, escape_type};
use crate::helpers;

const BANNER_TEMPLATE: &str = include_str!("../templates/banner.hbs");
const POLICY_TEMPLATE: &str = include_str!("../templates/policy.hbs");
const SUPPLEMENT_TEMPLATE: &str = include_str!("../templates/supplement.hbs");

/// Fixed runtime support sections, in emission order.
const RUNTIME_SECTIONS: [&str; 6] = [
    include_str!("../templates/runtime/base_models.cs"),
    include_str!("../templates/runtime/base_interfaces.cs"),
    include_str!("../templates/runtime/policy_object.cs"),
    include_str!("../templates/runtime/policy_methods.cs"),
    include_str!("../templates/runtime/interop.cs"),
    include_str!("../templates/runtime/helpers.cs"),
];

/// Namespaces imported by every generated namespace block.
const USING_NAMESPACES: [&str; 6] = [
    "System",
    "System.Collections.Generic",
    "System.ComponentModel",
    "System.Globalization",
    "System.Runtime.InteropServices",
    "System.Text",
];

/// Name of the runtime support namespace, nested under the assembly namespace.
pub const RUNTIME_NAMESPACE: &str = "PolicyRuntime";

const WARNING_PRAGMA: &str = "#pragma warning disable CS0219, CS1591, CS8019";

/// Members every generated policy class declares besides its elements.
static FIXED_MEMBERS: [&str; 4] = ["DisplayName", "ResourceId", "SupportedOn", "Elements"];

/// `using` directives shared by policy and runtime blocks.
pub fn using_references() -> Vec<String> {
    USING_NAMESPACES
        .iter()
        .map(|ns| format!("using global::{ns};"))
        .collect()
}

/// Renders policy models to C# source.
///
/// The handlebars registry is built once; a renderer can be shared and
/// reused across models.
pub struct SourceRenderer {
    registry: handlebars::Handlebars<'static>,
}

impl std::fmt::Debug for SourceRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRenderer").finish_non_exhaustive()
    }
}

impl SourceRenderer {
    /// Build the registry: HTML escaping off, helpers and templates installed.
    pub fn new() -> RenderResult<Self> {
        let mut registry = handlebars::Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        helpers::register(&mut registry);
        registry.register_template_string("banner", BANNER_TEMPLATE)?;
        registry.register_template_string("policy", POLICY_TEMPLATE)?;
        registry.register_template_string("supplement", SUPPLEMENT_TEMPLATE)?;
        Ok(Self { registry })
    }

    /// Render `model` as a single compilation unit into `sink`.
    ///
    /// Policies are rendered in model order. Cancellation is checked before
    /// each policy; a cancelled render leaves partial output in `sink`.
    pub async fn render<M, W>(
        &self,
        model: &M,
        assembly_name: &str,
        sink: &mut W,
        cancel: &CancelToken,
    ) -> RenderResult<()>
    where
        M: PolicyModel + ?Sized,
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        let policies = model.policies()?;
        let root = escape_namespace(assembly_name);
        if root.is_empty() {
            return Err(RenderError::InvalidAssemblyName(assembly_name.to_string()));
        }
        let runtime = format!("global::{root}.{RUNTIME_NAMESPACE}");
        let usings = using_references();

        let banner = self
            .registry
            .render("banner", &json!({ "version": env!("CARGO_PKG_VERSION") }))?;
        sink.write_all(banner.as_bytes()).await?;
        let opening = format!("\n{WARNING_PRAGMA}\n\nnamespace {root}\n{{\n");
        sink.write_all(opening.as_bytes()).await?;

        for policy in policies.iter() {
            cancel.check()?;
            validate(policy)?;
            let context = policy_context(policy, &runtime, &usings)?;
            let source = self.registry.render("policy", &context)?;
            sink.write_all(source.as_bytes()).await?;
            sink.write_all(b"\n").await?;
            tracing::debug!(policy = %policy.name, namespace = %policy.namespace, "Rendered policy");
        }

        cancel.check()?;
        let supplement = self.registry.render(
            "supplement",
            &json!({ "using_references": usings, "sections": RUNTIME_SECTIONS }),
        )?;
        sink.write_all(supplement.as_bytes()).await?;
        sink.write_all(b"}\n").await?;
        sink.flush().await?;

        tracing::info!(assembly = %root, policies = policies.len(), "Rendered policy source");
        Ok(())
    }

    /// Render into an in-memory string.
    pub async fn render_to_string<M>(
        &self,
        model: &M,
        assembly_name: &str,
        cancel: &CancelToken,
    ) -> RenderResult<String>
    where
        M: PolicyModel + ?Sized,
    {
        let mut buffer = Vec::new();
        self.render(model, assembly_name, &mut buffer, cancel).await?;
        String::from_utf8(buffer)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e).into())
    }
}

fn validate(policy: &Policy) -> RenderResult<()> {
    let class = escape_type(&policy.name);
    let reason = if class.is_empty() {
        "name has no identifier characters".to_string()
    } else if escape_namespace(&policy.namespace).is_empty() {
        "namespace has no identifier characters".to_string()
    } else if member_names(policy).any(|member| member == class) {
        format!("class name '{class}' is also the name of one of its members")
    } else {
        return Ok(());
    };
    Err(RenderError::InvalidPolicy {
        name: policy.name.clone(),
        reason,
    })
}

/// Names the policy template declares inside the policy class.
fn member_names(policy: &Policy) -> impl Iterator<Item = String> + '_ {
    let fixed = FIXED_MEMBERS.iter().map(|member| member.to_string());
    let elements = policy.elements.iter().flat_map(|element| {
        let property = format!("{}Element", escape_identifier(element.id()));
        let option = match element {
            ElementItem::Enumeration(e) => Some(format!("{}Option", escape_type(&e.id))),
            _ => None,
        };
        std::iter::once(property).chain(option)
    });
    fixed.chain(elements)
}

/// Template context: the serialized policy with element keys resolved
/// against the policy key, plus the values the template cannot derive.
///
/// Elements carry their own copy of `runtime` so element blocks can name
/// runtime types without reaching back to the root context.
fn policy_context(policy: &Policy, runtime: &str, usings: &[String]) -> RenderResult<Json> {
    let mut context = serde_json::to_value(policy)?;
    if let Json::Object(fields) = &mut context {
        if let Some(Json::Array(elements)) = fields.get_mut("elements") {
            for element in elements.iter_mut().filter_map(Json::as_object_mut) {
                if element.get("key").map_or(true, Json::is_null) {
                    element.insert("key".into(), json!(policy.key));
                }
                element.insert("runtime".into(), json!(runtime));
            }
        }
        fields.insert("class_member".into(), json!(policy.class.member_name()));
        fields.insert("runtime".into(), json!(runtime));
        fields.insert("using_references".into(), json!(usings));
    }
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use policygen_types::{
        BooleanElement, DecimalElement, EnumerationElement, EnumerationItem, ListElement,
        LongDecimalElement, MultiTextElement, PolicyDirectory, PolicyFile, RegistryValue,
        TextElement,
    };

    fn sample_policy() -> Policy {
        let mut policy = Policy::new("DisableThing", "Windows.Components", "Software\\Policies\\Thing");
        policy.display_name = "$(string.DisableThing)".into();
        policy.explain_text = Some("Turns the <thing> off.\nSecond line.".into());
        policy.value_name = Some("Disabled".into());
        policy.enabled_value = Some(RegistryValue::Decimal(1));
        policy.disabled_value = Some(RegistryValue::Delete);
        policy
            .with_element(ElementItem::Boolean(BooleanElement {
                id: "Flag".into(),
                key: None,
                value_name: "Flag".into(),
                true_value: RegistryValue::Decimal(1),
                false_value: RegistryValue::Delete,
            }))
            .with_element(ElementItem::Enumeration(EnumerationElement {
                id: "Mode".into(),
                key: Some("Software\\Policies\\Thing\\Mode".into()),
                value_name: "Mode".into(),
                required: true,
                items: vec![
                    EnumerationItem {
                        id: "fast".into(),
                        display_name: "Fast".into(),
                        value: RegistryValue::Decimal(1),
                    },
                    EnumerationItem {
                        id: "default".into(),
                        display_name: "Default".into(),
                        value: RegistryValue::String("std".into()),
                    },
                ],
            }))
            .with_element(ElementItem::List(ListElement {
                id: "Hosts".into(),
                key: None,
                value_prefix: None,
                additive: false,
                explicit_value: false,
                expandable: false,
            }))
    }

    async fn render(model: &dyn PolicyModel) -> RenderResult<String> {
        SourceRenderer::new()
            .unwrap()
            .render_to_string(model, "Contoso.Policies", &CancelToken::new())
            .await
    }

    #[tokio::test]
    async fn zero_policy_model_renders_runtime_only() {
        let model = PolicyDirectory::from_policies(Vec::new());
        let source = render(&model).await.unwrap();
        assert!(source.starts_with("//---"));
        assert!(source.contains("// <auto-generated>"));
        assert!(source.contains(WARNING_PRAGMA));
        assert!(source.contains("namespace Contoso.Policies\n{"));
        assert!(source.contains("namespace PolicyRuntime"));
        assert!(source.contains("using global::System.Runtime.InteropServices;"));
        assert!(source.contains("public abstract class PolicyBase : IPolicy"));
        assert!(!source.contains(": global::Contoso.Policies.PolicyRuntime.PolicyBase"));
        assert_eq!(source.matches('{').count(), source.matches('}').count());
        assert!(source.ends_with("}\n"));
    }

    #[tokio::test]
    async fn one_policy_renders_class_and_elements() {
        let model = PolicyFile::from_policy(sample_policy());
        let source = render(&model).await.unwrap();

        assert!(source.contains("namespace Windows.Components\n{"));
        assert!(source.contains(
            "public sealed partial class DisableThing : global::Contoso.Policies.PolicyRuntime.PolicyBase"
        ));
        assert!(source.contains(
            "base(global::Contoso.Policies.PolicyRuntime.PolicyClass.Machine, @\"Software\\Policies\\Thing\", @\"Disabled\", 1u, null)"
        ));
        assert!(source.contains("public override string ResourceId => @\"DisableThing\";"));
        assert!(source.contains("/// Turns the &lt;thing&gt; off.\n/// Second line."));
        assert!(source.contains(
            "BooleanElement FlagElement { get; } = new global::Contoso.Policies.PolicyRuntime.BooleanElement(@\"Flag\", @\"Software\\Policies\\Thing\", @\"Flag\", 1u, null);"
        ));
        assert!(source.contains("public enum ModeOption"));
        assert!(source.contains("_default,"));
        assert!(source.contains("{ @\"_default\", @\"std\" },"));
        assert!(source.contains("@\"Software\\Policies\\Thing\\Mode\""));
        assert!(source.contains("ListElement(@\"Hosts\", @\"Software\\Policies\\Thing\", null, false, false, false)"));
        assert!(source.contains("HostsElement,"));
        assert_eq!(source.matches("namespace PolicyRuntime").count(), 1);
    }

    #[tokio::test]
    async fn special_characters_escape_to_identifiers() {
        let policy = Policy::new("9-lives class", "1st.ns-x..class", "K").with_element(
            ElementItem::Text(TextElement {
                id: "for".into(),
                key: None,
                value_name: "V".into(),
                required: false,
                max_length: 10,
                expandable: false,
            }),
        );
        let source = render(&PolicyFile::from_policy(policy)).await.unwrap();
        assert!(source.contains("public sealed partial class _9livesclass :"));
        assert!(source.contains("namespace _1st.nsx._class\n{"));
        assert!(source.contains("TextElement _forElement { get; }"));
    }

    #[tokio::test]
    async fn numeric_and_multi_text_elements_render_constructor_calls() {
        let policy = Policy::new("Limits", "Windows.Components", "Software\\Policies\\Limits")
            .with_element(ElementItem::Decimal(DecimalElement {
                id: "Count".into(),
                key: None,
                value_name: "Count".into(),
                required: true,
                min_value: 0,
                max_value: u32::MAX,
                store_as_text: false,
                soft: false,
            }))
            .with_element(ElementItem::LongDecimal(LongDecimalElement {
                id: "Quota".into(),
                key: Some("Software\\Policies\\Limits\\Quota".into()),
                value_name: "Bytes".into(),
                required: false,
                min_value: 1,
                max_value: u64::MAX,
                store_as_text: true,
                soft: false,
            }))
            .with_element(ElementItem::MultiText(MultiTextElement {
                id: "Hosts".into(),
                key: None,
                value_name: "Hosts".into(),
                required: false,
                max_length: 255,
                max_strings: 10,
            }));
        let source = render(&PolicyFile::from_policy(policy)).await.unwrap();

        let runtime = "global::Contoso.Policies.PolicyRuntime";
        assert!(source.contains(&format!(
            "DecimalElement CountElement {{ get; }} = new {runtime}.DecimalElement(@\"Count\", @\"Software\\Policies\\Limits\", @\"Count\", true, 0u, 4294967295u, false);"
        )));
        assert!(source.contains(&format!(
            "LongDecimalElement QuotaElement {{ get; }} = new {runtime}.LongDecimalElement(@\"Quota\", @\"Software\\Policies\\Limits\\Quota\", @\"Bytes\", false, 1uL, 18446744073709551615uL, true);"
        )));
        assert!(source.contains(&format!(
            "MultiTextElement HostsElement {{ get; }} = new {runtime}.MultiTextElement(@\"Hosts\", @\"Software\\Policies\\Limits\", @\"Hosts\", false, 255u, 10u);"
        )));
        assert!(source.contains("CountElement,\nQuotaElement,\nHostsElement,"));
    }

    #[tokio::test]
    async fn class_named_like_a_member_is_invalid() {
        for (name, element) in [("Elements", "X"), ("SupportedOn", "X"), ("FooElement", "Foo")] {
            let policy = Policy::new(name, "Ns", "K").with_element(ElementItem::Text(TextElement {
                id: element.into(),
                key: None,
                value_name: "V".into(),
                required: false,
                max_length: 10,
                expandable: false,
            }));
            let err = render(&PolicyFile::from_policy(policy)).await.unwrap_err();
            assert!(
                matches!(&err, RenderError::InvalidPolicy { reason, .. } if reason.contains("member")),
                "{name}: {err}"
            );
        }
    }

    #[tokio::test]
    async fn class_named_like_an_option_enum_is_invalid() {
        let policy = Policy::new("ModeOption", "Ns", "K").with_element(ElementItem::Enumeration(
            EnumerationElement {
                id: "Mode".into(),
                key: None,
                value_name: "Mode".into(),
                required: false,
                items: Vec::new(),
            },
        ));
        let err = render(&PolicyFile::from_policy(policy)).await.unwrap_err();
        assert!(matches!(err, RenderError::InvalidPolicy { .. }));
    }

    #[tokio::test]
    async fn rendering_is_deterministic() {
        let model = PolicyFile::from_policy(sample_policy());
        assert_eq!(render(&model).await.unwrap(), render(&model).await.unwrap());
    }

    #[tokio::test]
    async fn unloaded_model_is_rejected() {
        let model = PolicyFile::new("/defs/a.json");
        let err = render(&model).await.unwrap_err();
        assert!(matches!(err, RenderError::Model(_)));
    }

    #[tokio::test]
    async fn blank_policy_name_is_invalid() {
        let model = PolicyFile::from_policy(Policy::new("  ", "Ns", "K"));
        let err = render(&model).await.unwrap_err();
        assert!(matches!(err, RenderError::InvalidPolicy { .. }));
    }

    #[tokio::test]
    async fn blank_assembly_name_is_invalid() {
        let model = PolicyDirectory::from_policies(Vec::new());
        let err = SourceRenderer::new()
            .unwrap()
            .render_to_string(&model, " . ", &CancelToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidAssemblyName(_)));
    }

    #[tokio::test]
    async fn cancellation_before_first_policy() {
        let model = PolicyFile::from_policy(sample_policy());
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut sink = Vec::new();
        let err = SourceRenderer::new()
            .unwrap()
            .render(&model, "Contoso", &mut sink, &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(!String::from_utf8(sink).unwrap().contains("class DisableThing"));
    }

    #[test]
    fn element_keys_fall_back_to_policy_key() {
        let context = policy_context(&sample_policy(), "global::X.PolicyRuntime", &[]).unwrap();
        assert_eq!(context["elements"][0]["key"], "Software\\Policies\\Thing");
        assert_eq!(context["elements"][1]["key"], "Software\\Policies\\Thing\\Mode");
        assert_eq!(context["elements"][2]["runtime"], "global::X.PolicyRuntime");
        assert_eq!(context["class_member"], "Machine");
    }
}
