/*!
 * Heuristic keyword and stopword tables for the content checks.
 *
 * The tables are data, not code: a `Lexicon` can be loaded from a JSON
 * file to swap in a tuned or minimal fixture table, and the built-in
 * default ships as a versioned constant. The scanner borrows a
 * per-language view of the stopword table via `stopwords_for`, which
 * subtracts the curated overlap exclusions so that function words a
 * content language shares with the host language are never counted as
 * leak evidence.
 */

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Built-in lexicon, compiled from the default tables below
static BUILTIN_LEXICON: Lazy<Lexicon> = Lazy::new(Lexicon::default);

/// Version of the built-in tables; bumped whenever a list changes shape
pub const BUILTIN_LEXICON_VERSION: u32 = 1;

/// Swappable heuristic tables for language and quality checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lexicon {
    /// Table version, for audit artifacts
    pub version: u32,
    /// Host-language function words whose density marks a leaked sentence
    pub foreign_stopwords: Vec<String>,
    /// Per-content-language words to drop from `foreign_stopwords`
    /// because the content language uses the same token natively
    pub stopword_overlaps: HashMap<String, Vec<String>>,
    /// Imperative verbs that mark a leaked instruction line when they
    /// open the line
    pub instruction_verbs: Vec<String>,
    /// Keywords that signal worked examples, any language
    pub example_keywords: Vec<String>,
    /// Keywords that signal good/bad or do/don't contrast
    pub contrast_keywords: Vec<String>,
    /// Keywords that signal metrics or success criteria
    pub metric_keywords: Vec<String>,
    /// Keywords that signal definitions or comparisons
    pub definition_keywords: Vec<String>,
}

impl Lexicon {
    /// The built-in table set
    pub fn builtin() -> &'static Lexicon {
        &BUILTIN_LEXICON
    }

    /// Load a replacement lexicon from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Lexicon> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read lexicon file: {}", path.as_ref().display()))?;
        let lexicon: Lexicon = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse lexicon file: {}", path.as_ref().display()))?;
        lexicon.validate()?;
        Ok(lexicon)
    }

    /// Check the table set is usable
    pub fn validate(&self) -> Result<()> {
        if self.version == 0 {
            anyhow::bail!("Lexicon version must be >= 1");
        }
        if self.foreign_stopwords.is_empty() {
            anyhow::bail!("Lexicon must carry at least one foreign stopword");
        }
        if self.instruction_verbs.is_empty() {
            anyhow::bail!("Lexicon must carry at least one instruction verb");
        }
        Ok(())
    }

    /// Foreign stopword set effective for one content language: the
    /// host-language list minus that language's overlap exclusions
    pub fn stopwords_for(&self, language_tag: &str) -> HashSet<&str> {
        let tag = language_tag.trim().to_lowercase();
        let excluded: HashSet<&str> = self
            .stopword_overlaps
            .get(tag.as_str())
            .map(|words| words.iter().map(String::as_str).collect())
            .unwrap_or_default();

        self.foreign_stopwords
            .iter()
            .map(String::as_str)
            .filter(|word| !excluded.contains(word))
            .collect()
    }

    /// Instruction verb set as a lookup table
    pub fn instruction_verb_set(&self) -> HashSet<&str> {
        self.instruction_verbs.iter().map(String::as_str).collect()
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Lexicon {
            version: BUILTIN_LEXICON_VERSION,
            foreign_stopwords: to_strings(&[
                "the", "a", "an", "and", "or", "but", "if", "then", "when", "while",
                "of", "to", "in", "on", "at", "by", "for", "with", "from", "as",
                "is", "are", "was", "were", "be", "been", "this", "that", "these",
                "those", "it", "its", "you", "your", "we", "our", "they", "their",
                "not", "no", "do", "does", "did", "have", "has", "had", "will",
                "would", "can", "could", "should", "what", "which", "how", "all",
                "more", "most", "other", "into", "over", "under", "only", "than",
                "also", "about", "because", "so", "each", "between", "out", "off",
            ]),
            stopword_overlaps: overlap_table(),
            instruction_verbs: to_strings(&[
                "design", "create", "build", "write", "read", "use", "make", "add",
                "remove", "click", "select", "choose", "open", "start", "stop",
                "follow", "review", "check", "learn", "try", "explore", "consider",
                "implement", "define", "describe", "explain", "compare", "list",
                "identify", "apply", "practice", "complete", "answer", "remember",
                "focus", "avoid", "ensure", "keep", "set", "run", "test", "note",
            ]),
            example_keywords: to_strings(&[
                "example", "for instance", "e.g.", "case study",
                "példa", "például",            // Hungarian
                "пример", "например",          // Russian/Bulgarian
                "beispiel", "zum beispiel",    // German
                "exemple", "par exemple",      // French
                "ejemplo", "por ejemplo",      // Spanish
                "esempio", "ad esempio",       // Italian
                "exemplo",                     // Portuguese
                "przykład", "na przykład",     // Polish
                "voorbeeld", "bijvoorbeeld",   // Dutch
                "exemplu", "de exemplu",       // Romanian
                "esimerkki", "esimerkiksi",    // Finnish
                "örnek", "örneğin",            // Turkish
                "مثال",                        // Arabic
                "उदाहरण",                      // Hindi
            ]),
            contrast_keywords: to_strings(&[
                "good", "bad", "don't", "do this", "avoid", "instead of",
                "jó", "rossz", "kerüld",       // Hungarian
                "хорошо", "плохо", "избегайте",// Russian
                "добре", "лошо", "избягвайте", // Bulgarian
                "gut", "schlecht", "vermeide", // German
                "bien", "mal", "évite",        // French
                "bueno", "malo", "evita",      // Spanish
                "buono", "cattivo", "evita",   // Italian
                "bom", "ruim", "evite",        // Portuguese
                "dobrze", "źle", "unikaj",     // Polish
                "goed", "fout", "vermijd",     // Dutch
                "✅", "❌",
            ]),
            metric_keywords: to_strings(&[
                "metric", "measure", "kpi", "criteria", "criterion", "benchmark",
                "target", "threshold", "success",
                "mérőszám", "metrika", "kritérium", "cél",   // Hungarian
                "метрика", "показатель", "критерий", "цель", // Russian
                "показател", "критерии",                     // Bulgarian
                "kennzahl", "kriterium", "ziel",             // German
                "métrique", "critère", "objectif",           // French
                "métrica", "criterio", "objetivo",           // Spanish
                "metrica", "criterio", "obiettivo",          // Italian
                "miernik", "kryterium",                      // Polish
                "maatstaf", "criterium", "doel",             // Dutch
            ]),
            definition_keywords: to_strings(&[
                "definition", "means", "is called", "refers to", "versus", "vs.",
                "difference between", "in other words",
                "definíció", "jelentése", "különbség",          // Hungarian
                "определение", "означает", "разница",           // Russian
                "дефиниция", "означава", "разлика",             // Bulgarian
                "bedeutet", "unterschied",                      // German
                "définition", "signifie", "différence",         // French
                "definición", "significa", "diferencia",        // Spanish
                "definizione", "significa", "differenza",       // Italian
                "definição", "significa", "diferença",          // Portuguese
                "definicja", "oznacza", "różnica",              // Polish
                "definitie", "betekent", "verschil",            // Dutch
            ]),
        }
    }
}

/// Convert a literal table to owned strings
fn to_strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Curated per-language overlap exclusions. Each entry lists host-language
/// stopwords the content language also uses natively, so counting them
/// would flag native sentences.
fn overlap_table() -> HashMap<String, Vec<String>> {
    let mut table = HashMap::new();
    // Hungarian: "a" definite article, "is" = also, "be" = verb prefix
    table.insert("hu".to_string(), to_strings(&["a", "is", "be"]));
    // German: shared function words
    table.insert("de".to_string(), to_strings(&["was", "also", "in", "so"]));
    // Dutch: largely shared function words
    table.insert("nl".to_string(), to_strings(&["is", "in", "was", "of", "over"]));
    // Finnish: "on" = is, "he" = they
    table.insert("fi".to_string(), to_strings(&["on", "he"]));
    // French: "on" pronoun, "a" = has
    table.insert("fr".to_string(), to_strings(&["on", "a"]));
    // Romanian: "a" infinitive marker
    table.insert("ro".to_string(), to_strings(&["a"]));
    // Italian: "a" = to
    table.insert("it".to_string(), to_strings(&["a", "no"]));
    // Spanish: "a" = to, "no" = no
    table.insert("es".to_string(), to_strings(&["a", "no"]));
    // Portuguese: articles and contractions
    table.insert("pt".to_string(), to_strings(&["a", "no", "do", "as"]));
    // Polish: "to" = this/it
    table.insert("pl".to_string(), to_strings(&["to"]));
    // Danish: shared prepositions
    table.insert("da".to_string(), to_strings(&["at", "for", "over", "under"]));
    table
}
