/*!
 * Content checks for lesson language purity and pedagogical quality.
 *
 * This module groups the heuristic classifiers that gate lesson
 * content before quiz work starts:
 *
 * - `markup`: shared markup-stripping preprocessing
 * - `lexicon`: versioned keyword/stopword tables the heuristics consume
 * - `scanner`: line-level script and lexical leak detection
 * - `integrity`: per-language dispatch producing pass/fail reports
 * - `quality`: structural completeness scoring with remediation flags
 */

// Re-export main types for easier usage
pub use self::integrity::{ContentUnit, Finding, IntegrityReport, IntegrityValidator};
pub use self::lexicon::Lexicon;
pub use self::quality::{QualityIssue, QualityReport, QualityScorer, RefineTemplate};
pub use self::scanner::{classify_line, LineScan, ScanProfile};

// Submodules
pub mod integrity;
pub mod lexicon;
pub mod markup;
pub mod quality;
pub mod scanner;
