//! Deterministic instruction synthesis for objects outside the knowledge base.
//!
//! When no curated entry matches, the top detection still deserves an
//! answer. Synthesis builds one from fixed per-category templates: same
//! detection and same tables always produce the same entry, apart from the
//! generated id and timestamp. Nothing here guesses; unknown categories get
//! the deliberately modest generic template.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::knowledge::{AgeRestriction, Difficulty, InstructionStep, KnowledgeEntry, SafetyLevel};
use crate::lexicon::Lexicon;
use crate::types::Detection;

/// Source marker distinguishing synthesized entries from curated ones.
pub const SYNTHESIZED_SOURCE: &str = "synthesized";

/// Category assigned when no lexicon rule claims the label.
pub const GENERAL_CATEGORY: &str = "General Items";

/// Template fields for one category. `description` may contain a `{name}`
/// placeholder filled with the title-cased label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateRow {
    pub description: String,
    pub difficulty: Difficulty,
    pub time_estimate: String,
    pub safety_level: SafetyLevel,
    pub common_uses: Vec<String>,
    pub materials: Vec<String>,
    pub warnings: Vec<String>,
    pub maintenance: String,
    pub storage: String,
    pub lifespan: String,
    pub age_restriction: Option<AgeRestriction>,
}

/// Per-category template rows plus the generic fallback row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisTemplates {
    pub rows: Vec<(String, TemplateRow)>,
    pub generic: TemplateRow,
}

#[allow(clippy::too_many_arguments)]
fn tpl(
    description: &str,
    difficulty: Difficulty,
    time_estimate: &str,
    safety_level: SafetyLevel,
    common_uses: &[&str],
    materials: &[&str],
    warnings: &[&str],
    maintenance: &str,
    storage: &str,
    lifespan: &str,
    age_restriction: Option<AgeRestriction>,
) -> TemplateRow {
    TemplateRow {
        description: description.to_string(),
        difficulty,
        time_estimate: time_estimate.to_string(),
        safety_level,
        common_uses: common_uses.iter().map(|s| s.to_string()).collect(),
        materials: materials.iter().map(|s| s.to_string()).collect(),
        warnings: warnings.iter().map(|s| s.to_string()).collect(),
        maintenance: maintenance.to_string(),
        storage: storage.to_string(),
        lifespan: lifespan.to_string(),
        age_restriction,
    }
}

impl SynthesisTemplates {
    pub fn builtin() -> Self {
        let rows = vec![
            (
                "Power Tools".to_string(),
                tpl(
                    "A motorised {name} for workshop and construction tasks.",
                    Difficulty::Intermediate,
                    "15-45 minutes per task",
                    SafetyLevel::High,
                    &["Construction", "Renovation", "Workshop projects"],
                    &["Metal", "Plastic housing"],
                    &[
                        "Wear eye and ear protection",
                        "Keep fingers clear of moving parts",
                        "Unplug or remove the battery before adjustments",
                    ],
                    "Keep vents clear of dust and inspect cords and guards before each use.",
                    "Store in a dry case out of children's reach.",
                    "5-15 years",
                    Some(AgeRestriction {
                        minimum_age: 14,
                        supervision_required: true,
                        supervision_age: 18,
                    }),
                ),
            ),
            (
                "Hand Tools".to_string(),
                tpl(
                    "A hand-operated {name} for manual work.",
                    Difficulty::Beginner,
                    "5-20 minutes per task",
                    SafetyLevel::Medium,
                    &["Repairs", "Assembly", "DIY projects"],
                    &["Steel", "Wood or plastic handle"],
                    &[
                        "Keep your free hand clear of the working edge",
                        "Use the right size and type for the job",
                    ],
                    "Wipe clean and lightly oil metal parts to stop rust.",
                    "Toolbox or wall rack, kept dry.",
                    "10-30 years",
                    None,
                ),
            ),
            (
                "Appliances".to_string(),
                tpl(
                    "An electric {name} for household use.",
                    Difficulty::Beginner,
                    "5-30 minutes per use",
                    SafetyLevel::Medium,
                    &["Food preparation", "Household chores"],
                    &["Plastic", "Steel", "Electronic components"],
                    &[
                        "Keep away from water unless rated for it",
                        "Unplug before cleaning",
                        "Do not leave running unattended",
                    ],
                    "Wipe down after use and follow the manual's cleaning schedule.",
                    "On a stable, dry surface with ventilation.",
                    "5-10 years",
                    None,
                ),
            ),
            (
                "Kitchen Tools".to_string(),
                tpl(
                    "A kitchen {name} for preparing food.",
                    Difficulty::Beginner,
                    "5-15 minutes per use",
                    SafetyLevel::Medium,
                    &["Cooking", "Food preparation", "Baking"],
                    &["Stainless steel", "Plastic or wood"],
                    &["Wash before first use", "Handle sharp edges with care"],
                    "Wash and dry promptly after each use.",
                    "Clean and dry, in a drawer or on a rack.",
                    "5-20 years",
                    None,
                ),
            ),
            (
                "Electronics".to_string(),
                tpl(
                    "A consumer electronic {name}.",
                    Difficulty::Beginner,
                    "15-60 minutes to set up",
                    SafetyLevel::Low,
                    &["Communication", "Entertainment", "Work"],
                    &["Plastic", "Metal", "Circuit boards"],
                    &[
                        "Charge only with the supplied or a certified adapter",
                        "Keep away from liquids",
                    ],
                    "Keep software updated and clean with a dry cloth.",
                    "Cool, dry place away from direct sunlight.",
                    "3-7 years",
                    None,
                ),
            ),
            (
                "Plants".to_string(),
                tpl(
                    "A {name} kept as a houseplant or garden plant.",
                    Difficulty::Beginner,
                    "A few minutes of care per week",
                    SafetyLevel::Low,
                    &["Decoration", "Air quality", "Gardening"],
                    &["Living plant", "Pot and soil"],
                    &[
                        "Check toxicity before placing near pets or children",
                        "Do not overwater",
                    ],
                    "Water when the topsoil dries out and remove dead leaves.",
                    "Not applicable; keep in suitable light and temperature.",
                    "Years with proper care",
                    None,
                ),
            ),
            (
                "Sports Equipment".to_string(),
                tpl(
                    "Sports gear: a {name} for training and play.",
                    Difficulty::Beginner,
                    "Sessions of 30-120 minutes",
                    SafetyLevel::Low,
                    &["Exercise", "Competition", "Recreation"],
                    &["Composite materials", "Rubber", "Textile"],
                    &["Warm up before use", "Inspect for damage before each session"],
                    "Clean after use and check fastenings regularly.",
                    "Dry storage away from heat and sunlight.",
                    "3-10 years",
                    None,
                ),
            ),
            (
                "Safety Equipment".to_string(),
                tpl(
                    "Protective equipment: {name}.",
                    Difficulty::Beginner,
                    "Under five minutes to fit",
                    SafetyLevel::Low,
                    &["Personal protection", "Workshop safety", "Site compliance"],
                    &["Polycarbonate", "Textile", "Rubber"],
                    &[
                        "Replace after any significant impact",
                        "Check the fit before relying on it",
                    ],
                    "Inspect for wear before each use and clean per the label.",
                    "Clean pouch or case away from solvents.",
                    "2-5 years",
                    None,
                ),
            ),
        ];

        let generic = tpl(
            "An everyday object: {name}.",
            Difficulty::Beginner,
            "Varies by task",
            SafetyLevel::Low,
            &["General use"],
            &["Unknown"],
            &["Inspect before first use"],
            "Keep clean and dry.",
            "Store in a dry place.",
            "Varies",
            None,
        );

        Self { rows, generic }
    }

    pub fn for_category(&self, category: &str) -> &TemplateRow {
        self.rows
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, row)| row)
            .unwrap_or(&self.generic)
    }
}

impl Default for SynthesisTemplates {
    fn default() -> Self {
        Self::builtin()
    }
}

/// A template-built entry, tagged with its provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesizedEntry {
    pub id: Uuid,
    pub source: String,
    pub synthesized_at: DateTime<Utc>,
    pub detected_as: String,
    /// Provider score mapped to 0-100.
    pub confidence: u8,
    #[serde(flatten)]
    pub entry: KnowledgeEntry,
}

fn title_case(label: &str) -> String {
    label
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build an entry for a detection the knowledge base cannot answer.
pub fn synthesize(
    detection: &Detection,
    templates: &SynthesisTemplates,
    lexicon: &Lexicon,
) -> SynthesizedEntry {
    let label = detection.normalized_label();
    let name = title_case(&label);

    let category = lexicon
        .infer_category(&label)
        .unwrap_or(GENERAL_CATEGORY)
        .to_string();
    let row = templates.for_category(&category);

    let mut tags: Vec<String> = vec![label.clone()];
    for word in label.split_whitespace() {
        if !tags.iter().any(|t| t == word) {
            tags.push(word.to_string());
        }
    }
    for term in lexicon.related_terms(&label) {
        if !tags.iter().any(|t| t == term) {
            tags.push(term.to_string());
        }
    }

    let hazardous = lexicon.is_hazardous(&label);
    let safety_level = if hazardous {
        row.safety_level.max(SafetyLevel::High)
    } else {
        row.safety_level
    };
    let mut warnings = row.warnings.clone();
    if hazardous {
        warnings.push("Treat as hazardous; keep away from children".to_string());
    }

    let instructions = vec![
        InstructionStep {
            title: "Basic Setup".to_string(),
            content: format!(
                "Place the {name} on a stable surface and check it is complete and undamaged."
            ),
        },
        InstructionStep {
            title: "Safe Operation".to_string(),
            content: format!(
                "Use the {name} only for its intended purpose, following any manufacturer guidance."
            ),
        },
    ];

    let entry = KnowledgeEntry {
        name: name.clone(),
        category,
        tags,
        description: row.description.replace("{name}", &name),
        difficulty: row.difficulty,
        time_estimate: row.time_estimate.clone(),
        safety_level,
        common_uses: row.common_uses.clone(),
        materials: row.materials.clone(),
        warnings,
        instructions,
        maintenance: row.maintenance.clone(),
        storage: row.storage.clone(),
        lifespan: row.lifespan.clone(),
        age_restriction: row.age_restriction,
    };

    let confidence = (detection.score * 100.0).round().clamp(0.0, 100.0) as u8;

    SynthesizedEntry {
        id: Uuid::new_v4(),
        source: SYNTHESIZED_SOURCE.to_string(),
        synthesized_at: Utc::now(),
        detected_as: label,
        confidence,
        entry,
    }
}
