/*!
 * Recursive evaluator for template expressions.
 */

use std::collections::HashMap;

use log::debug;
use url::form_urlencoded;

use crate::errors::TemplateError;

use super::ast::{BinaryOperator, Expr, TemplatePart, Value};
use super::parser::parse_template_all;

/// Variable bindings available to a template
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    vars: HashMap<String, Value>,
}

impl TemplateContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable, builder style
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Bind a variable
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Look up a variable
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }
}

/// A parsed template ready to render any number of times
#[derive(Debug, Clone, PartialEq)]
pub struct UrlTemplate {
    source: String,
    parts: Vec<TemplatePart>,
}

impl UrlTemplate {
    /// Parse `source`
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        Ok(Self {
            source: source.to_string(),
            parts: parse_template_all(source)?,
        })
    }

    /// Original template text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Expand every placeholder against `ctx`
    pub fn render(&self, ctx: &TemplateContext) -> Result<String, TemplateError> {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                TemplatePart::Text(text) => out.push_str(text),
                TemplatePart::Expr(expr) => out.push_str(&evaluate(expr, ctx)?.to_string()),
            }
        }
        debug!("Expanded template '{}' to '{}'", self.source, out);
        Ok(out)
    }
}

/// Evaluate an expression tree
pub fn evaluate(expr: &Expr, ctx: &TemplateContext) -> Result<Value, TemplateError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Identifier(name) => ctx
            .get(name)
            .cloned()
            .ok_or_else(|| TemplateError::UnknownVariable(name.clone())),
        Expr::Call { name, args } => {
            // `default` must tolerate unbound variables in its first argument.
            if name == "default" {
                return call_default(args, ctx);
            }
            let values = args
                .iter()
                .map(|arg| evaluate(arg, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            call_function(name, &values)
        }
        Expr::BinaryOp { op, left, right } => {
            let left = evaluate(left, ctx)?;
            let right = evaluate(right, ctx)?;
            apply_operator(*op, left, right)
        }
    }
}

fn call_default(args: &[Expr], ctx: &TemplateContext) -> Result<Value, TemplateError> {
    if args.len() != 2 {
        return Err(TemplateError::InvalidOperands("default expects 2 arguments".to_string()));
    }
    match evaluate(&args[0], ctx) {
        Ok(value) if !value.is_empty() => Ok(value),
        Ok(_) | Err(TemplateError::UnknownVariable(_)) => evaluate(&args[1], ctx),
        Err(e) => Err(e),
    }
}

fn call_function(name: &str, args: &[Value]) -> Result<Value, TemplateError> {
    let single = |args: &[Value]| -> Result<String, TemplateError> {
        match args {
            [value] => Ok(value.to_string()),
            _ => Err(TemplateError::InvalidOperands(format!("{} expects 1 argument", name))),
        }
    };

    match name {
        "encodeURIComponent" | "encode" => {
            let raw = single(args)?;
            Ok(Value::Str(form_urlencoded::byte_serialize(raw.as_bytes()).collect::<String>().replace('+', "%20")))
        }
        "lower" | "toLowerCase" => Ok(Value::Str(single(args)?.to_lowercase())),
        "upper" | "toUpperCase" => Ok(Value::Str(single(args)?.to_uppercase())),
        "trim" => Ok(Value::Str(single(args)?.trim().to_string())),
        _ => Err(TemplateError::UnknownFunction(name.to_string())),
    }
}

fn apply_operator(op: BinaryOperator, left: Value, right: Value) -> Result<Value, TemplateError> {
    match (op, left, right) {
        (BinaryOperator::Add, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (BinaryOperator::Add, a, b) => Ok(Value::Str(format!("{}{}", a, b))),
        (BinaryOperator::Sub, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
        (BinaryOperator::Mul, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
        (BinaryOperator::Div, Value::Number(_), Value::Number(b)) if b == 0.0 => {
            Err(TemplateError::InvalidOperands("division by zero".to_string()))
        }
        (BinaryOperator::Div, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),
        (op, a, b) => Err(TemplateError::InvalidOperands(format!(
            "{:?} is not defined for '{}' and '{}'",
            op, a, b
        ))),
    }
}
