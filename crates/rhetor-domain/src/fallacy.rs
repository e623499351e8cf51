//! Fallacy taxonomy and findings

use std::fmt;

/// The ten fallacy categories the analyzer recognizes.
///
/// The set is closed: the model is instructed to answer only with these
/// names, and anything else in a reply is discarded by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FallacyKind {
    /// Attacking the person instead of their argument
    AdHominem,
    /// Presenting only two options when more exist
    FalseDichotomy,
    /// Claiming something is true because an authority said so
    AppealToAuthority,
    /// Misrepresenting an opponent's argument
    Strawman,
    /// A small first step is said to lead to drastic consequences
    SlipperySlope,
    /// Using emotions rather than facts to win an argument
    AppealToEmotion,
    /// Drawing conclusions from insufficient evidence
    HastyGeneralization,
    /// Using the conclusion as a premise
    CircularReasoning,
    /// Something is true because many people believe it
    Bandwagon,
    /// A personal experience stands in for evidence
    Anecdotal,
}

impl FallacyKind {
    /// Every kind, in taxonomy order
    pub const ALL: [FallacyKind; 10] = [
        FallacyKind::AdHominem,
        FallacyKind::FalseDichotomy,
        FallacyKind::AppealToAuthority,
        FallacyKind::Strawman,
        FallacyKind::SlipperySlope,
        FallacyKind::AppealToEmotion,
        FallacyKind::HastyGeneralization,
        FallacyKind::CircularReasoning,
        FallacyKind::Bandwagon,
        FallacyKind::Anecdotal,
    ];

    /// Stable wire name (used in prompts, replies and storage)
    pub fn as_str(&self) -> &'static str {
        match self {
            FallacyKind::AdHominem => "ad_hominem",
            FallacyKind::FalseDichotomy => "false_dichotomy",
            FallacyKind::AppealToAuthority => "appeal_to_authority",
            FallacyKind::Strawman => "strawman",
            FallacyKind::SlipperySlope => "slippery_slope",
            FallacyKind::AppealToEmotion => "appeal_to_emotion",
            FallacyKind::HastyGeneralization => "hasty_generalization",
            FallacyKind::CircularReasoning => "circular_reasoning",
            FallacyKind::Bandwagon => "bandwagon",
            FallacyKind::Anecdotal => "anecdotal",
        }
    }

    /// Human-readable label ("Hasty Generalization")
    pub fn label(&self) -> &'static str {
        match self {
            FallacyKind::AdHominem => "Ad Hominem",
            FallacyKind::FalseDichotomy => "False Dichotomy",
            FallacyKind::AppealToAuthority => "Appeal to Authority",
            FallacyKind::Strawman => "Strawman",
            FallacyKind::SlipperySlope => "Slippery Slope",
            FallacyKind::AppealToEmotion => "Appeal to Emotion",
            FallacyKind::HastyGeneralization => "Hasty Generalization",
            FallacyKind::CircularReasoning => "Circular Reasoning",
            FallacyKind::Bandwagon => "Bandwagon",
            FallacyKind::Anecdotal => "Anecdotal",
        }
    }

    /// One-line description of the reasoning error
    pub fn description(&self) -> &'static str {
        match self {
            FallacyKind::AdHominem => "Attacking the person instead of their argument",
            FallacyKind::FalseDichotomy => "Presenting only two options when more exist",
            FallacyKind::AppealToAuthority => {
                "Claiming something is true because an authority said so"
            }
            FallacyKind::Strawman => "Misrepresenting an opponent's argument",
            FallacyKind::SlipperySlope => {
                "Arguing that a small first step will lead to significant negative consequences"
            }
            FallacyKind::AppealToEmotion => "Using emotions rather than facts to win an argument",
            FallacyKind::HastyGeneralization => "Drawing conclusions from insufficient evidence",
            FallacyKind::CircularReasoning => "Using the conclusion as a premise",
            FallacyKind::Bandwagon => {
                "Arguing that something is true because many people believe it"
            }
            FallacyKind::Anecdotal => {
                "Using a personal experience or isolated example instead of sound reasoning or evidence"
            }
        }
    }

    /// Parse a kind name.
    ///
    /// Case-insensitive; spaces and hyphens are treated as underscores, so
    /// `"Hasty Generalization"`, `"hasty-generalization"` and
    /// `"hasty_generalization"` all parse. Returns `None` for anything outside
    /// the taxonomy.
    ///
    /// # Examples
    ///
    /// ```
    /// use rhetor_domain::FallacyKind;
    ///
    /// assert_eq!(FallacyKind::parse("Bandwagon"), Some(FallacyKind::Bandwagon));
    /// assert_eq!(FallacyKind::parse("straw man"), Some(FallacyKind::Strawman));
    /// assert_eq!(FallacyKind::parse("red_herring"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();

        match normalized.as_str() {
            "ad_hominem" => Some(FallacyKind::AdHominem),
            "false_dichotomy" | "false_dilemma" => Some(FallacyKind::FalseDichotomy),
            "appeal_to_authority" => Some(FallacyKind::AppealToAuthority),
            "strawman" | "straw_man" => Some(FallacyKind::Strawman),
            "slippery_slope" => Some(FallacyKind::SlipperySlope),
            "appeal_to_emotion" => Some(FallacyKind::AppealToEmotion),
            "hasty_generalization" => Some(FallacyKind::HastyGeneralization),
            "circular_reasoning" => Some(FallacyKind::CircularReasoning),
            "bandwagon" => Some(FallacyKind::Bandwagon),
            "anecdotal" => Some(FallacyKind::Anecdotal),
            _ => None,
        }
    }
}

impl fmt::Display for FallacyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected instance of a reasoning error
#[derive(Debug, Clone, PartialEq)]
pub struct FallacyFinding {
    /// Category from the closed taxonomy
    pub kind: FallacyKind,

    /// Span of the input the finding refers to (empty if the model omitted it)
    pub quoted_span: String,

    /// The model's explanation
    pub explanation: String,

    /// Model-reported confidence in [0.0, 1.0], if given
    pub confidence: Option<f64>,
}

impl FallacyFinding {
    /// Create a finding without a confidence score
    pub fn new(kind: FallacyKind, quoted_span: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            kind,
            quoted_span: quoted_span.into(),
            explanation: explanation.into(),
            confidence: None,
        }
    }

    /// Attach a confidence score; values outside [0.0, 1.0] are dropped
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = (0.0..=1.0).contains(&confidence).then_some(confidence);
        self
    }
}
