mod compile;
mod dryrun;
mod error;
mod lexicon;
mod parse;
mod validate;

pub mod engine;
pub mod types;

pub use compile::{DEFAULT_RULE_NAME, compile, compile_with};
pub use dryrun::{DryRunReport, dry_run_rule};
pub use error::GambitError;
pub use lexicon::{AssetLexicon, AssetPair, BuiltinLexicon};
pub use parse::{ParseError, parse_condition};
pub use types::{
    CanonicalIntent, Command, CompareOp, CompileOutput, EvalContext, Expr, Limit, MoveEvent,
    RuleDocument, RuleProgram, Side, UiActionEvent, Value, Verb,
};
pub use validate::{ValidationReport, parse_and_validate, validate};
