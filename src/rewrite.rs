use swc_core::{
    common::Mark,
    ecma::{
        ast::*,
        visit::{Visit, VisitMut, VisitMutWith, VisitWith},
    },
};
use tracing::{debug, trace};

use crate::module_map::{resolve, EnvironmentMode, ModuleMap};

// -----------------------------------------------------------------------------
// Call shapes
// -----------------------------------------------------------------------------

const MODULE_LOADER: &str = "require";
const REQUIRE_ACTUAL: &str = "requireActual";
const TEST_FRAMEWORK: &str = "jest";
const MOCK_HELPERS: [&str; 3] = ["dontMock", "mock", "genMockFromModule"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallKind {
    /// `require('x')` or `require.requireActual('x')`
    DirectLoad,
    /// `jest.mock('x')` and friends, possibly at the end of a chain
    MockHelper,
    Other,
}

fn is_ident(expr: &Expr, name: &str) -> bool {
    matches!(expr, Expr::Ident(i) if i.sym.as_ref() == name)
}

fn is_direct_load(callee: &Expr) -> bool {
    match callee {
        Expr::Ident(i) => i.sym.as_ref() == MODULE_LOADER,
        Expr::Member(m) => {
            is_ident(&m.obj, MODULE_LOADER)
                && matches!(&m.prop, MemberProp::Ident(p) if p.sym.as_ref() == REQUIRE_ACTUAL)
        }
        _ => false,
    }
}

fn is_mock_helper(callee: &Expr) -> bool {
    let Expr::Member(m) = callee else {
        return false;
    };
    let MemberProp::Ident(prop) = &m.prop else {
        return false;
    };
    MOCK_HELPERS.contains(&prop.sym.as_ref()) && mentions_test_framework(callee)
}

fn classify(callee: &Callee) -> CallKind {
    let Callee::Expr(callee) = callee else {
        return CallKind::Other;
    };
    if is_direct_load(callee) {
        CallKind::DirectLoad
    } else if is_mock_helper(callee) {
        CallKind::MockHelper
    } else {
        CallKind::Other
    }
}

/// Depth-first search of a callee for the test framework identifier, so that
/// `jest.dontMock('a').dontMock('b')` qualifies at every link of the chain.
struct TestFrameworkFinder {
    found: bool,
}

impl Visit for TestFrameworkFinder {
    fn visit_expr(&mut self, e: &Expr) {
        if self.found {
            return;
        }
        e.visit_children_with(self);
    }

    fn visit_ident(&mut self, i: &Ident) {
        if i.sym.as_ref() == TEST_FRAMEWORK {
            self.found = true;
        }
    }

    fn visit_ident_name(&mut self, i: &IdentName) {
        if i.sym.as_ref() == TEST_FRAMEWORK {
            self.found = true;
        }
    }
}

fn mentions_test_framework(callee: &Expr) -> bool {
    let mut finder = TestFrameworkFinder { found: false };
    callee.visit_with(&mut finder);
    finder.found
}

// -----------------------------------------------------------------------------
// Transform state
// -----------------------------------------------------------------------------

/// Everything the rewriter needs for one pass. Read-only once the pass starts.
#[derive(Debug, Clone, Default)]
pub struct RewriteConfig {
    pub module_map: ModuleMap,
    /// Prepended to unmapped names in normal mode; `./` when absent.
    pub module_prefix: Option<String>,
    pub mode: EnvironmentMode,
}

/// Rewrites module-name literals of `require` calls and jest mock helpers.
///
/// Each call is evaluated once: after classification, whatever the outcome,
/// the rewriter's own `processed` mark is applied to the call's syntax
/// context, and a marked call is never examined again. The mark travels with
/// the node, so copies made before the pass are evaluated independently and
/// copies made after it stay processed.
///
/// Must be created inside `GLOBALS` (always the case under the plugin host).
pub struct RewriteModules {
    config: RewriteConfig,
    processed: Mark,
    processed_count: usize,
}

impl RewriteModules {
    pub fn new(config: RewriteConfig) -> Self {
        Self {
            config,
            processed: Mark::new(),
            processed_count: 0,
        }
    }

    /// Number of calls evaluated so far.
    pub fn processed_count(&self) -> usize {
        self.processed_count
    }

    fn is_processed(&self, call: &CallExpr) -> bool {
        call.ctxt.has_mark(self.processed)
    }

    fn mark_processed(&mut self, call: &mut CallExpr) {
        call.ctxt = call.ctxt.apply_mark(self.processed);
        self.processed_count += 1;
    }

    /// Replace a string-literal first argument with its resolved name.
    /// Returns `(from, to)` when a replacement happened.
    fn rewrite_first_arg(&self, call: &mut CallExpr) -> Option<(String, String)> {
        let first = call.args.first_mut()?;
        if first.spread.is_some() {
            return None;
        }
        let Expr::Lit(Lit::Str(lit)) = &*first.expr else {
            return None;
        };
        let span = lit.span;
        let from = lit.value.to_string();
        let to = resolve(
            &from,
            &self.config.module_map,
            self.config.module_prefix.as_deref(),
            self.config.mode,
        )?;

        // fresh literal; the old node (and its raw text) is dropped
        first.expr = Box::new(Expr::Lit(Lit::Str(Str {
            span,
            value: to.clone().into(),
            raw: None,
        })));
        Some((from, to))
    }
}

impl VisitMut for RewriteModules {
    fn visit_mut_program(&mut self, n: &mut Program) {
        n.visit_mut_children_with(self);
        debug!(processed = self.processed_count, "module rewrite pass finished");
    }

    fn visit_mut_call_expr(&mut self, n: &mut CallExpr) {
        // post-order: inner calls are settled before the enclosing one
        n.visit_mut_children_with(self);

        if self.is_processed(n) {
            trace!(span = ?n.span, "call already processed");
            return;
        }

        let kind = classify(&n.callee);
        if kind != CallKind::Other {
            match self.rewrite_first_arg(n) {
                Some((from, to)) => debug!(?kind, %from, %to, "rewrote module reference"),
                None => trace!(?kind, "module reference left unchanged"),
            }
        }
        self.mark_processed(n);
    }
}
