mod action;
mod context;
mod document;
mod event;
mod expr;
mod intent;
mod program;
mod value;

pub use action::{KNOWN_VERBS, Verb};
pub use context::EvalContext;
pub use document::{
    ActionStep, Assets, Condition, CooldownSpec, Effect, Logic, Meta, RuleDocument, Scope, Steps,
    Ui, UiAction,
};
pub use event::{MoveEvent, Side, UiActionEvent, events};
pub use expr::{CompareOp, Expr};
pub use intent::{
    CanonicalIntent, CompileOutput, CompilerWarning, Limits, MovementOverride, Targeting,
    TestExpectation,
};
pub use program::{Command, Limit, RuleProgram};
pub use value::Value;
