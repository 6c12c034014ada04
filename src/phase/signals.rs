/*!
 * Phase signal table.
 *
 * Every term the detector reacts to is one row of `(pattern, category, weight)`.
 * The scoring code never names a term; it only reads rows, so alternate tables
 * (other source languages, other crafts) can be swapped in through configuration.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// What a matching term says about the working phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCategory {
    /// Author-stated switch to painting; decides the boundary on its own
    ExplicitTransition,
    /// Term that only occurs once color work has started
    PostContext,
    /// Color or pigment name; implies painting only when used as a material
    ActiveMaterial,
    /// Term that only occurs while sketching
    PreOnly,
    /// Term valid in either phase; never scored, may trigger a review flag
    Ambiguous,
}

impl SignalCategory {
    /// Direction of the category's contribution to a record score
    pub fn sign(&self) -> f64 {
        match self {
            Self::PostContext | Self::ActiveMaterial => 1.0,
            Self::PreOnly => -1.0,
            Self::ExplicitTransition | Self::Ambiguous => 0.0,
        }
    }
}

/// Weights applied per scored category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalWeights {
    pub post_context: f64,
    pub active_material: f64,
    pub pre_only: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            post_context: 1.0,
            active_material: 0.7,
            pre_only: 1.0,
        }
    }
}

impl SignalWeights {
    /// Weight for a category; unscored categories weigh nothing
    pub fn for_category(&self, category: SignalCategory) -> f64 {
        match category {
            SignalCategory::PostContext => self.post_context,
            SignalCategory::ActiveMaterial => self.active_material,
            SignalCategory::PreOnly => self.pre_only,
            SignalCategory::ExplicitTransition | SignalCategory::Ambiguous => 0.0,
        }
    }
}

/// One built-in row: pattern, category, density marker, excluded continuations
struct BuiltinRow {
    pattern: &'static str,
    category: SignalCategory,
    counts_for_density: bool,
    exclude: Option<&'static str>,
}

const fn row(pattern: &'static str, category: SignalCategory) -> BuiltinRow {
    BuiltinRow {
        pattern,
        category,
        counts_for_density: false,
        exclude: None,
    }
}

const fn density_row(pattern: &'static str) -> BuiltinRow {
    BuiltinRow {
        pattern,
        category: SignalCategory::PostContext,
        counts_for_density: true,
        exclude: None,
    }
}

/// Built-in rows for Chinese watercolor lessons.
///
/// 画 (huà) reads as "sketch" or "paint" depending on the phase, which is what
/// the whole detector exists for. Only the unmistakable painting terms count
/// towards the whole-file density fallback; single characters such as 干 or 洗
/// turn up in sketch talk too (擦干净, 干嘛).
const BUILTIN_ROWS: &[BuiltinRow] = &[
    // Explicit switch to color work
    row(r"开始(上色|铺色|涂色|着色|画颜色|用颜色|用水彩)", SignalCategory::ExplicitTransition),
    row(r"(现在|下面|接下来|然后)(我们)?(就)?(可以|准备)(上色|铺色|涂色|着色|画颜色|用颜色|用水彩)", SignalCategory::ExplicitTransition),
    row(r"(铅笔稿|线稿|草稿)(已经)?(画好|完成|打好)了.{0,6}(上色|颜色|水彩)", SignalCategory::ExplicitTransition),
    // Painting context
    density_row(r"颜[料色]"),
    density_row(r"调色"),
    row(r"调和", SignalCategory::PostContext),
    row(r"毛笔", SignalCategory::PostContext),
    density_row(r"水彩"),
    density_row(r"渲染"),
    row(r"晕染", SignalCategory::PostContext),
    density_row(r"上色"),
    density_row(r"涂"),
    row(r"[湿干]", SignalCategory::PostContext),
    row(r"洗", SignalCategory::PostContext),
    row(r"刷", SignalCategory::PostContext),
    row(r"蘸", SignalCategory::PostContext),
    row(r"泡", SignalCategory::PostContext),
    row(r"铺[色底]", SignalCategory::PostContext),
    row(r"叠[加色]", SignalCategory::PostContext),
    // Colors and pigments
    row(r"[红橙黄绿青蓝紫棕褐灰黑白]色", SignalCategory::ActiveMaterial),
    row(r"赭石|群青|土黄|熟褐|生褐|普蓝|佩恩灰|柠檬黄|镉[红黄]|酞[青菁]|胭脂|玫瑰红", SignalCategory::ActiveMaterial),
    // Sketching context
    row(r"铅笔", SignalCategory::PreOnly),
    row(r"橡皮", SignalCategory::PreOnly),
    row(r"轮廓", SignalCategory::PreOnly),
    row(r"构图", SignalCategory::PreOnly),
    row(r"比例", SignalCategory::PreOnly),
    row(r"线[条稿]", SignalCategory::PreOnly),
    row(r"起[稿形]", SignalCategory::PreOnly),
    row(r"草[稿图]", SignalCategory::PreOnly),
    row(r"勾[勒线]", SignalCategory::PreOnly),
    // 画 as a verb; 画面, 画纸, 画板, 画笔 and friends are nouns
    BuiltinRow {
        pattern: r"画",
        category: SignalCategory::Ambiguous,
        counts_for_density: false,
        exclude: Some(r"^画[面纸家板布框笔]"),
    },
];

static BUILTIN_PATTERNS: Lazy<Vec<SignalPattern>> = Lazy::new(|| {
    BUILTIN_ROWS
        .iter()
        .map(|row| SignalPattern {
            pattern: Regex::new(row.pattern).unwrap(),
            category: row.category,
            weight: 0.0,
            counts_for_density: row.counts_for_density,
            exclude: row.exclude.map(|exclude| Regex::new(exclude).unwrap()),
        })
        .collect()
});

/// One row of the signal table
#[derive(Debug, Clone)]
pub struct SignalPattern {
    pub pattern: Regex,
    pub category: SignalCategory,
    pub weight: f64,
    /// Counted by the whole-file density fallback
    pub counts_for_density: bool,
    /// Matches where this anchored pattern also matches are discarded
    pub exclude: Option<Regex>,
}

impl SignalPattern {
    /// Compile a row from a pattern string.
    ///
    /// Post-context rows count towards density unless told otherwise.
    pub fn new(pattern: &str, category: SignalCategory, weight: f64) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            category,
            weight,
            counts_for_density: category == SignalCategory::PostContext,
            exclude: None,
        })
    }

    pub fn with_density(mut self, counts_for_density: bool) -> Self {
        self.counts_for_density = counts_for_density;
        self
    }

    /// Discard matches where `exclude` matches from the same position
    pub fn with_exclusion(mut self, exclude: &str) -> Result<Self, regex::Error> {
        self.exclude = Some(Regex::new(exclude)?);
        Ok(self)
    }

    /// Number of non-overlapping matches in `text`, minus excluded ones
    pub fn count(&self, text: &str) -> usize {
        self.pattern
            .find_iter(text)
            .filter(|m| match &self.exclude {
                Some(exclude) => !exclude.is_match(&text[m.start()..]),
                None => true,
            })
            .count()
    }

    pub fn matches(&self, text: &str) -> bool {
        self.count(text) > 0
    }
}

/// What the table found in one record
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RecordSignals {
    /// Signed weighted score
    pub score: f64,
    /// Matches of scored categories
    pub directional_hits: usize,
    /// Matches of ambiguous terms
    pub ambiguous_hits: usize,
    /// Matches of post-transition context terms only
    pub post_context_hits: usize,
    /// Matches of rows counted by the density fallback
    pub density_hits: usize,
}

impl RecordSignals {
    /// An ambiguous term with nothing around it to decide the phase
    pub fn is_ambiguous_only(&self) -> bool {
        self.ambiguous_hits > 0 && self.directional_hits == 0
    }
}

/// Inspectable table of phase signals
#[derive(Debug, Clone)]
pub struct SignalTable {
    entries: Vec<SignalPattern>,
}

impl SignalTable {
    pub fn new(entries: Vec<SignalPattern>) -> Self {
        Self { entries }
    }

    /// Built-in Chinese watercolor table with the given weights
    pub fn builtin(weights: &SignalWeights) -> Self {
        let entries = BUILTIN_PATTERNS
            .iter()
            .map(|entry| SignalPattern {
                weight: weights.for_category(entry.category),
                ..entry.clone()
            })
            .collect();
        Self { entries }
    }

    /// Append a row
    pub fn push(&mut self, entry: SignalPattern) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[SignalPattern] {
        &self.entries
    }

    /// Rows of a single category
    pub fn entries_in(&self, category: SignalCategory) -> impl Iterator<Item = &SignalPattern> {
        self.entries.iter().filter(move |e| e.category == category)
    }

    /// Whether the text states the switch to painting outright
    pub fn matches_explicit_transition(&self, text: &str) -> bool {
        self.entries_in(SignalCategory::ExplicitTransition)
            .any(|e| e.matches(text))
    }

    /// Score one record's text
    pub fn evaluate(&self, text: &str) -> RecordSignals {
        let mut signals = RecordSignals::default();

        for entry in &self.entries {
            let hits = entry.count(text);
            if hits == 0 {
                continue;
            }
            if entry.counts_for_density {
                signals.density_hits += hits;
            }
            match entry.category {
                SignalCategory::Ambiguous => signals.ambiguous_hits += hits,
                SignalCategory::ExplicitTransition => {}
                category => {
                    signals.directional_hits += hits;
                    signals.score += category.sign() * entry.weight * hits as f64;
                    if category == SignalCategory::PostContext {
                        signals.post_context_hits += hits;
                    }
                }
            }
        }

        signals
    }
}

impl Default for SignalTable {
    fn default() -> Self {
        Self::builtin(&SignalWeights::default())
    }
}
