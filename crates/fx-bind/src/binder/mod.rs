//! The type binder: assigns a static type to every expression node, or a
//! diagnostic where no type exists.
//!
//! A binder session is a pure function of the expression and the resolved
//! operand types: it never throws, never caches, and always returns a
//! complete [`BindResult`]. Any user-triggerable failure becomes an
//! [`ErrorValue`] diagnostic, the offending node's type becomes
//! [`DType::Error`] (which then poisons every enclosing operation), and the
//! overall result reports failure.

pub mod rules;

use fx_model::{DType, ErrorValue, Span};

use crate::ast::{BinaryOp, Expr, ExprKind, Literal, UnaryOp};
use crate::binding::{FunctionSignature, Scope, TablePropagation};

/// Outcome of binding one expression tree.
///
/// `version_hash` is the scope-chain fingerprint observed at bind time;
/// callers that cache bind results use it as their invalidation key (the
/// binder itself caches nothing).
#[derive(Clone, Debug, PartialEq)]
pub struct BindResult {
    pub dtype: DType,
    pub success: bool,
    pub diagnostics: Vec<ErrorValue>,
    pub version_hash: u64,
}

/// A type-checking session over one scope chain.
pub struct Binder {
    scope: Scope,
}

impl Binder {
    pub fn new(scope: Scope) -> Self {
        Self { scope }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn bind(&self, expr: &Expr) -> BindResult {
        let version_hash = self.scope.version_hash();
        let mut diagnostics = Vec::new();
        let dtype = self.bind_node(expr, &mut diagnostics);
        BindResult {
            dtype,
            success: diagnostics.is_empty(),
            diagnostics,
            version_hash,
        }
    }

    fn bind_node(&self, expr: &Expr, diags: &mut Vec<ErrorValue>) -> DType {
        match &expr.kind {
            ExprKind::Literal(lit) => match lit {
                Literal::Number(_) => DType::Number,
                Literal::Text(_) => DType::Text,
                Literal::Boolean(_) => DType::Boolean,
            },
            ExprKind::Ident(name) => match self.scope.lookup(name) {
                Some(binding) => binding.dtype,
                None => {
                    diags.push(ErrorValue::unresolved(name, expr.span));
                    DType::Error
                }
            },
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand,
            } => {
                let operand_ty = self.bind_node(operand, diags);
                if operand_ty.is_error() {
                    return DType::Error;
                }
                let out = rules::negate_result(&operand_ty);
                if out.is_error() {
                    diags.push(ErrorValue::type_mismatch(
                        format!("cannot negate a value of type {operand_ty}"),
                        expr.span,
                    ));
                }
                out
            }
            ExprKind::Binary { op, left, right } => {
                let left_ty = self.bind_node(left, diags);
                let right_ty = self.bind_node(right, diags);
                // Already-poisoned operands carry their own diagnostics.
                if left_ty.is_error() || right_ty.is_error() {
                    return DType::Error;
                }
                let out = match op {
                    BinaryOp::Add => rules::add_result(&left_ty, &right_ty),
                    BinaryOp::Sub => rules::sub_result(&left_ty, &right_ty),
                };
                if out.is_error() {
                    let symbol = match op {
                        BinaryOp::Add => "+",
                        BinaryOp::Sub => "-",
                    };
                    diags.push(ErrorValue::type_mismatch(
                        format!("no overload for {left_ty} {symbol} {right_ty}"),
                        expr.span,
                    ));
                }
                out
            }
            ExprKind::If { arms, else_value } => self.bind_if(expr, arms, else_value, diags),
            ExprKind::Call {
                namespace,
                name,
                args,
            } => self.bind_call(expr, namespace, name, args, diags),
            ExprKind::Field { base, name } => {
                let base_ty = self.bind_node(base, diags);
                match base_ty {
                    DType::Error => DType::Error,
                    DType::Record(shape) => match shape.get(name) {
                        Some(field_ty) => field_ty.clone(),
                        None => {
                            diags.push(ErrorValue::unresolved(name, expr.span));
                            DType::Error
                        }
                    },
                    other => {
                        diags.push(ErrorValue::type_mismatch(
                            format!("cannot access field '{name}' on a value of type {other}"),
                            expr.span,
                        ));
                        DType::Error
                    }
                }
            }
        }
    }

    fn bind_if(
        &self,
        expr: &Expr,
        arms: &[(Expr, Expr)],
        else_value: &Option<Box<Expr>>,
        diags: &mut Vec<ErrorValue>,
    ) -> DType {
        let mut poisoned = false;
        let mut branch_types = Vec::with_capacity(arms.len() + 1);
        for (condition, value) in arms {
            let cond_ty = self.bind_node(condition, diags);
            match cond_ty {
                DType::Boolean | DType::Error => poisoned |= cond_ty.is_error(),
                other => {
                    diags.push(ErrorValue::type_mismatch(
                        format!("condition must be Boolean, got {other}"),
                        condition.span,
                    ));
                    poisoned = true;
                }
            }
            branch_types.push(self.bind_node(value, diags));
        }
        if let Some(else_value) = else_value {
            branch_types.push(self.bind_node(else_value, diags));
        }
        if branch_types.is_empty() {
            diags.push(ErrorValue::invalid_usage(
                "conditional requires at least one value branch",
                expr.span,
            ));
            return DType::Error;
        }
        if poisoned || branch_types.iter().any(DType::is_error) {
            return DType::Error;
        }
        let out = rules::unify_branches(&branch_types);
        if out.is_error() {
            diags.push(ErrorValue::type_mismatch(
                "conditional branches have no common type",
                expr.span,
            ));
        }
        out
    }

    fn bind_call(
        &self,
        expr: &Expr,
        namespace: &str,
        name: &str,
        args: &[Expr],
        diags: &mut Vec<ErrorValue>,
    ) -> DType {
        let arg_types: Vec<DType> = args.iter().map(|arg| self.bind_node(arg, diags)).collect();

        let candidates = self.scope.lookup_functions(namespace, name, true);
        if candidates.is_empty() {
            diags.push(ErrorValue::unresolved(name, expr.span));
            return DType::Error;
        }
        let Some(sig) = candidates
            .iter()
            .find(|sig| sig.param_types.len() == arg_types.len())
        else {
            diags.push(ErrorValue::invalid_usage(
                format!("function '{name}' does not accept {} arguments", args.len()),
                expr.span,
            ));
            return DType::Error;
        };
        if arg_types.iter().any(DType::is_error) {
            return DType::Error;
        }
        self.call_result(sig, &arg_types, expr.span, diags)
    }

    fn call_result(
        &self,
        sig: &FunctionSignature,
        arg_types: &[DType],
        span: Span,
        diags: &mut Vec<ErrorValue>,
    ) -> DType {
        let diags_before = diags.len();
        let out = match &sig.propagation {
            TablePropagation::None => {
                for (index, (arg, param)) in arg_types.iter().zip(&sig.param_types).enumerate() {
                    if !argument_fits(arg, param) {
                        diags.push(ErrorValue::type_mismatch(
                            format!(
                                "argument {} of '{}' expects {param}, got {arg}",
                                index + 1,
                                sig.name
                            ),
                            span,
                        ));
                        return DType::Error;
                    }
                }
                sig.return_type.clone()
            }
            TablePropagation::PreserveRows { arg } => match arg_types.get(*arg) {
                Some(table) => rules::filter_shape(table),
                None => {
                    diags.push(ErrorValue::internal(
                        format!("propagation rule of '{}' references missing argument {arg}", sig.name),
                        span,
                    ));
                    DType::Error
                }
            },
            TablePropagation::LiftColumn { arg } => match arg_types.get(*arg) {
                Some(column) => rules::lift_column(column, &sig.return_type),
                None => {
                    diags.push(ErrorValue::internal(
                        format!("propagation rule of '{}' references missing argument {arg}", sig.name),
                        span,
                    ));
                    DType::Error
                }
            },
            TablePropagation::Broadcast => rules::broadcast_shape(arg_types, &sig.return_type),
        };
        if out.is_error() && diags.len() == diags_before {
            diags.push(ErrorValue::type_mismatch(
                format!("arguments do not match any overload of '{}'", sig.name),
                span,
            ));
        }
        out
    }
}

/// An argument fits a declared parameter when the types match exactly, the
/// parameter accepts anything untyped-shaped, or the argument widens into the
/// parameter along the scalar coercion lattice.
fn argument_fits(arg: &DType, param: &DType) -> bool {
    if arg == param || matches!(param, DType::Untyped) {
        return true;
    }
    matches!(
        (arg, param),
        (DType::Boolean, DType::Number)
            | (DType::Boolean, DType::Text)
            | (DType::Number, DType::Text)
    )
}
