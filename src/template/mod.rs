/*!
 * URL template language.
 *
 * Templates are plain text with `${expr}` placeholders. Expressions are a
 * tiny language of literals, identifiers, function calls and binary
 * arithmetic, represented as a tagged AST and evaluated recursively:
 *
 * - `ast`: value and expression types
 * - `parser`: template splitting and expression parsing
 * - `eval`: evaluation context, evaluator and `UrlTemplate`
 */

pub mod ast;
pub mod eval;
pub mod parser;

pub use self::ast::{BinaryOperator, Expr, TemplatePart, Value};
pub use self::eval::{evaluate, TemplateContext, UrlTemplate};
pub use self::parser::{parse_expression, parse_template_all};
