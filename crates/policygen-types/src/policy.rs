//! Policy definitions.

use serde::{Deserialize, Serialize};

use crate::element::ElementItem;
use crate::value::RegistryValue;

/// Registry hive(s) a policy applies to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyClass {
    User,
    #[default]
    Machine,
    Both,
}

impl PolicyClass {
    /// Member name of the generated `PolicyClass` enumeration.
    pub fn member_name(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Machine => "Machine",
            Self::Both => "Both",
        }
    }
}

/// One administrative policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Identifier, unique within its namespace.
    pub name: String,
    /// Display name; may be a `$(string.Key)` resource reference.
    #[serde(default)]
    pub display_name: String,
    /// Documentation text.
    #[serde(default)]
    pub explain_text: Option<String>,
    /// Dot-separated category path.
    pub namespace: String,
    /// "Supported on" constraint expression.
    #[serde(default)]
    pub supported_on: Option<String>,
    #[serde(default)]
    pub class: PolicyClass,
    /// Registry key the policy writes under.
    pub key: String,
    #[serde(default)]
    pub value_name: Option<String>,
    #[serde(default)]
    pub enabled_value: Option<RegistryValue>,
    #[serde(default)]
    pub disabled_value: Option<RegistryValue>,
    /// Configurable elements, in declaration order.
    #[serde(default)]
    pub elements: Vec<ElementItem>,
}

impl Policy {
    /// A policy with no elements, for programmatic construction.
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            explain_text: None,
            namespace: namespace.into(),
            supported_on: None,
            class: PolicyClass::default(),
            key: key.into(),
            value_name: None,
            enabled_value: None,
            disabled_value: None,
            elements: Vec::new(),
        }
    }

    /// Builder-style element append.
    pub fn with_element(mut self, element: ElementItem) -> Self {
        self.elements.push(element);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::TextElement;

    #[test]
    fn decodes_minimal_yaml() {
        let yaml = r#"
name: DisableThing
namespace: Windows.Components
key: Software\Policies\Thing
elements:
  - kind: text
    id: Path
    value_name: InstallPath
"#;
        let policy: Policy = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(policy.class, PolicyClass::Machine);
        assert_eq!(policy.elements.len(), 1);
        assert!(policy.elements[0].is_text());
        assert!(policy.explain_text.is_none());
    }

    #[test]
    fn builder_keeps_order() {
        let policy = Policy::new("P", "A.B", "Software\\P")
            .with_element(ElementItem::Text(TextElement {
                id: "first".into(),
                key: None,
                value_name: "First".into(),
                required: false,
                max_length: 10,
                expandable: false,
            }))
            .with_element(ElementItem::Text(TextElement {
                id: "second".into(),
                key: None,
                value_name: "Second".into(),
                required: true,
                max_length: 10,
                expandable: false,
            }));
        let ids: Vec<_> = policy.elements.iter().map(|e| e.id()).collect();
        assert_eq!(ids, ["first", "second"]);
        assert_eq!(policy.display_name, "P");
    }

    #[test]
    fn enabled_value_round_trips_through_json() {
        let mut policy = Policy::new("P", "A", "K");
        policy.enabled_value = Some(RegistryValue::Decimal(1));
        policy.disabled_value = Some(RegistryValue::Delete);
        let json = serde_json::to_string(&policy).unwrap();
        let back: Policy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, policy);
    }
}
