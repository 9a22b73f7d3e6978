//! Keyword tables shared by the matcher and the synthesizer.
//!
//! Three tables live here: synonym groups (a canonical key plus the
//! colloquial terms providers emit for it), ordered category rules, and
//! hazard terms. All lookups expect normalized (lowercased, trimmed) input.

use serde::{Deserialize, Serialize};

/// A canonical term and the provider labels that mean the same object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynonymGroup {
    pub key: String,
    pub synonyms: Vec<String>,
}

/// Maps labels containing any keyword to a category. Rules are checked in
/// order; the first hit wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lexicon {
    pub groups: Vec<SynonymGroup>,
    pub category_rules: Vec<CategoryRule>,
    pub hazard_terms: Vec<String>,
}

fn group(key: &str, synonyms: &[&str]) -> SynonymGroup {
    SynonymGroup {
        key: key.to_string(),
        synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
    }
}

fn rule(category: &str, keywords: &[&str]) -> CategoryRule {
    CategoryRule {
        category: category.to_string(),
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
    }
}

impl Lexicon {
    pub fn builtin() -> Self {
        Self {
            groups: vec![
                group("mobile phone", &["smartphone", "phone", "cellphone", "mobile"]),
                group("power drill", &["drill", "electric drill", "cordless drill"]),
                group("chef's knife", &["knife", "kitchen knife", "cook's knife"]),
                group("laptop", &["notebook", "notebook computer", "portable computer"]),
                group("bicycle", &["bike", "cycle", "pushbike"]),
                group("handsaw", &["saw", "wood saw", "hand saw"]),
                group("blender", &["mixer", "liquidiser", "smoothie maker"]),
            ],
            // Most specific categories first: "power drill" must resolve
            // before the generic "drill"/"tool" keywords further down.
            category_rules: vec![
                rule(
                    "Safety Equipment",
                    &["goggles", "helmet", "extinguisher", "mask", "glove", "ppe"],
                ),
                rule(
                    "Power Tools",
                    &["power drill", "power tool", "circular saw", "chainsaw", "jigsaw", "sander", "grinder", "drill"],
                ),
                rule(
                    "Hand Tools",
                    &["hammer", "screwdriver", "wrench", "spanner", "saw", "pliers", "chisel", "tool"],
                ),
                rule(
                    "Appliances",
                    &["blender", "toaster", "microwave", "oven", "kettle", "fridge", "refrigerator", "mixer", "appliance"],
                ),
                rule(
                    "Kitchen Tools",
                    &["knife", "skillet", "pan", "pot", "spatula", "whisk", "utensil", "cutting board"],
                ),
                rule(
                    "Electronics",
                    &["phone", "laptop", "computer", "tablet", "camera", "television", "monitor", "headphone", "speaker", "keyboard"],
                ),
                rule(
                    "Plants",
                    &["plant", "succulent", "cactus", "flower", "fern", "herb"],
                ),
                rule(
                    "Sports Equipment",
                    &["racket", "racquet", "bicycle", "bike", "ball", "skateboard", "ski", "dumbbell"],
                ),
            ],
            hazard_terms: vec![
                "knife", "saw", "drill", "blade", "axe", "fire", "torch", "chemical",
                "solvent", "razor",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }

    /// First category whose keyword appears in the label, if any.
    pub fn infer_category(&self, label: &str) -> Option<&str> {
        for rule in &self.category_rules {
            if rule.keywords.iter().any(|k| label.contains(k.as_str())) {
                return Some(&rule.category);
            }
        }
        None
    }

    /// True when the label mentions a term from the hazard table.
    pub fn is_hazardous(&self, label: &str) -> bool {
        self.hazard_terms.iter().any(|t| label.contains(t.as_str()))
    }

    /// The canonical key for a label that is listed as a synonym.
    ///
    /// A label that is itself a group key resolves to `None`: the key is
    /// the canonical term, not an alias of one.
    pub fn canonical_key_for_synonym(&self, label: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|g| g.synonyms.iter().any(|s| s == label))
            .map(|g| g.key.as_str())
    }

    /// Other members of the label's synonym group, key included.
    pub fn related_terms(&self, label: &str) -> Vec<&str> {
        for group in &self.groups {
            if group.key == label || group.synonyms.iter().any(|s| s == label) {
                let mut terms: Vec<&str> = Vec::new();
                if group.key != label {
                    terms.push(&group.key);
                }
                for syn in &group.synonyms {
                    if syn != label {
                        terms.push(syn);
                    }
                }
                return terms;
            }
        }
        Vec::new()
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_rules_are_ordered() {
        let lex = Lexicon::builtin();
        assert_eq!(lex.infer_category("power drill"), Some("Power Tools"));
        assert_eq!(lex.infer_category("saw"), Some("Hand Tools"));
        assert_eq!(lex.infer_category("circular saw"), Some("Power Tools"));
        assert_eq!(lex.infer_category("chef's knife"), Some("Kitchen Tools"));
    }

    #[test]
    fn test_unknown_label_has_no_category() {
        let lex = Lexicon::builtin();
        assert_eq!(lex.infer_category("garden gnome"), None);
    }

    #[test]
    fn test_hazard_terms_match_by_substring() {
        let lex = Lexicon::builtin();
        assert!(lex.is_hazardous("kitchen knife"));
        assert!(lex.is_hazardous("circular saw"));
        assert!(!lex.is_hazardous("tennis racket"));
    }

    #[test]
    fn test_synonym_resolves_to_key_but_key_does_not() {
        let lex = Lexicon::builtin();
        assert_eq!(lex.canonical_key_for_synonym("phone"), Some("mobile phone"));
        assert_eq!(lex.canonical_key_for_synonym("smartphone"), Some("mobile phone"));
        assert_eq!(lex.canonical_key_for_synonym("mobile phone"), None);
        assert_eq!(lex.canonical_key_for_synonym("toaster"), None);
    }

    #[test]
    fn test_related_terms_excludes_the_label_itself() {
        let lex = Lexicon::builtin();
        let related = lex.related_terms("bike");
        assert!(related.contains(&"bicycle"));
        assert!(related.contains(&"cycle"));
        assert!(!related.contains(&"bike"));
    }
}
