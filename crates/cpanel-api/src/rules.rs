// HTTP verbs and argument placement rules
//
// Whether a verb carries its arguments in the URL or in the body is a
// lookup, not a property of the request. Unknown verbs fall through to the
// DEFAULT rule (body).

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::encoder::ArgumentEncoder;

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    Get,
    Head,
    #[default]
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
}

impl HttpVerb {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub fn to_method(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Head => reqwest::Method::HEAD,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
            Self::Connect => reqwest::Method::CONNECT,
            Self::Options => reqwest::Method::OPTIONS,
            Self::Trace => reqwest::Method::TRACE,
            Self::Patch => reqwest::Method::PATCH,
        }
    }
}

// ── Placement ────────────────────────────────────────────────────────

const DEFAULT_LABEL: &str = "DEFAULT";

/// Where a verb's argument data goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgumentRule {
    pub verb: String,
    pub data_in_body: bool,
}

/// Verb label → placement, with a DEFAULT fallback.
#[derive(Debug, Clone)]
pub struct ArgumentSerializationRules {
    map: HashMap<String, ArgumentRule>,
}

impl Default for ArgumentSerializationRules {
    /// GET, DELETE and HEAD put data in the URL. POST, PUT and PATCH use the
    /// body, as does anything unlisted.
    fn default() -> Self {
        let mut rules = Self {
            map: HashMap::new(),
        };
        rules.insert(DEFAULT_LABEL, true);
        for verb in [HttpVerb::Get, HttpVerb::Delete, HttpVerb::Head] {
            rules.insert(verb.as_str(), false);
        }
        for verb in [HttpVerb::Post, HttpVerb::Put, HttpVerb::Patch] {
            rules.insert(verb.as_str(), true);
        }
        rules
    }
}

impl ArgumentSerializationRules {
    /// Add or replace the rule for `verb`. Use `"DEFAULT"` for the fallback.
    pub fn insert(&mut self, verb: &str, data_in_body: bool) -> &mut Self {
        let label = verb.to_ascii_uppercase();
        self.map.insert(
            label.clone(),
            ArgumentRule {
                verb: label,
                data_in_body,
            },
        );
        self
    }

    /// Placement for a verb label, falling back to the DEFAULT rule.
    pub fn get_rule(&self, verb: &str) -> &ArgumentRule {
        self.map
            .get(&verb.to_ascii_uppercase())
            .or_else(|| self.map.get(DEFAULT_LABEL))
            .unwrap_or(&*BODY_RULE)
    }

    pub fn rule_for(&self, verb: HttpVerb) -> &ArgumentRule {
        self.get_rule(verb.as_str())
    }
}

static BODY_RULE: LazyLock<ArgumentRule> = LazyLock::new(|| ArgumentRule {
    verb: DEFAULT_LABEL.to_owned(),
    data_in_body: true,
});

/// Shared default placement table.
pub static DEFAULT_RULES: LazyLock<ArgumentSerializationRules> =
    LazyLock::new(ArgumentSerializationRules::default);

// ── Encoding rule ────────────────────────────────────────────────────

/// Verb plus an optional encoder override for one `generate()` call.
///
/// With no encoder, the request picks JSON or form encoding from its config.
#[derive(Debug, Clone, Default)]
pub struct EncodingRule {
    pub verb: HttpVerb,
    pub encoder: Option<Arc<dyn ArgumentEncoder>>,
}

impl EncodingRule {
    pub fn new(verb: HttpVerb) -> Self {
        Self {
            verb,
            encoder: None,
        }
    }

    pub fn with_encoder(verb: HttpVerb, encoder: Arc<dyn ArgumentEncoder>) -> Self {
        Self {
            verb,
            encoder: Some(encoder),
        }
    }
}

impl From<HttpVerb> for EncodingRule {
    fn from(verb: HttpVerb) -> Self {
        Self::new(verb)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn default_placement_table() {
        let rules = &*DEFAULT_RULES;
        for verb in HttpVerb::iter() {
            let expected = !matches!(verb, HttpVerb::Get | HttpVerb::Head | HttpVerb::Delete);
            assert_eq!(rules.rule_for(verb).data_in_body, expected, "{verb}");
        }
        assert_eq!(rules.rule_for(HttpVerb::Options).verb, "DEFAULT");
        assert_eq!(rules.rule_for(HttpVerb::Get).verb, "GET");
    }

    #[test]
    fn unknown_labels_fall_back_to_default() {
        let rules = ArgumentSerializationRules::default();
        assert!(rules.get_rule("PROPFIND").data_in_body);
        assert!(!rules.get_rule("get").data_in_body);
    }

    #[test]
    fn rules_can_be_overridden() {
        let mut rules = ArgumentSerializationRules::default();
        rules.insert("post", false).insert("DEFAULT", false);
        assert!(!rules.rule_for(HttpVerb::Post).data_in_body);
        assert!(!rules.rule_for(HttpVerb::Trace).data_in_body);
    }

    #[test]
    fn verbs_parse_case_insensitively() {
        assert_eq!("get".parse::<HttpVerb>().unwrap(), HttpVerb::Get);
        assert_eq!(HttpVerb::Patch.to_string(), "PATCH");
        assert_eq!(HttpVerb::default(), HttpVerb::Post);
    }
}
