//! Rendering of expression trees to query-language text.
//!
//! [`SqlRenderer`] implements [`QueryVisitor`] with `String` output. Literal
//! operands go through [`crate::value::render`]; field names are emitted as-is.

use bson::Bson;

use crate::{
    error::CosmosError,
    query::{CompareOp, Expr, Operand, QueryVisitor},
    value::render,
};

/// Translates filter expressions into WHERE-clause text.
pub struct SqlRenderer;

impl SqlRenderer {
    fn join(&mut self, exprs: &[Expr], keyword: &str) -> Result<String, CosmosError> {
        let parts = exprs
            .iter()
            .map(|expr| self.visit_expr(expr))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(format!("({})", parts.join(keyword)))
    }

    fn operand(operand: &Operand) -> String {
        match operand {
            Operand::Field(path) => path.clone(),
            Operand::Value(value) => render(value),
        }
    }
}

fn negatable(positive: String, holds: bool) -> String {
    if holds { positive } else { positive + " = false" }
}

impl QueryVisitor for SqlRenderer {
    type Output = String;
    type Error = CosmosError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        self.join(exprs, " AND ")
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        self.join(exprs, " OR ")
    }

    fn visit_compare(&mut self, field: &str, op: CompareOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        Ok(format!("{} {} {}", field, op.as_str(), render(value)))
    }

    fn visit_in(&mut self, field: &str, values: &[Bson]) -> Result<Self::Output, Self::Error> {
        Ok(format!(
            "{} IN ({})",
            field,
            values.iter().map(render).collect::<Vec<_>>().join(", "),
        ))
    }

    fn visit_is_null(&mut self, field: &str, is_null: bool) -> Result<Self::Output, Self::Error> {
        Ok(negatable(format!("IS_NULL({})", field), is_null))
    }

    fn visit_is_defined(&mut self, field: &str, is_defined: bool) -> Result<Self::Output, Self::Error> {
        Ok(negatable(format!("IS_DEFINED({})", field), is_defined))
    }

    fn visit_array_contains(
        &mut self,
        container: &Operand,
        value: &Operand,
        partial: bool,
        contains: bool,
    ) -> Result<Self::Output, Self::Error> {
        Ok(negatable(
            format!(
                "ARRAY_CONTAINS({}, {}, {})",
                Self::operand(container),
                Self::operand(value),
                partial,
            ),
            contains,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Filter;

    #[test]
    fn test_comparisons() {
        assert_eq!(Filter::eq("a", 1).to_string(), "a = 1");
        assert_eq!(Filter::ne("a", "x").to_string(), "a != 'x'");
        assert_eq!(Filter::lt("a", 1.5).to_string(), "a < 1.5");
        assert_eq!(Filter::lte("a", "@max").to_string(), "a <= @max");
        assert_eq!(Filter::gt("a", true).to_string(), "a > true");
        assert_eq!(Filter::gte("a", Bson::Null).to_string(), "a >= null");
    }

    #[test]
    fn test_conjunction_and_disjunction() {
        let and = Filter::and([Filter::eq("a", 1), Filter::eq("b", 2)]);
        assert_eq!(and.to_string(), "(a = 1 AND b = 2)");

        let nested = Filter::or([and, Filter::is_null("c")]);
        assert_eq!(nested.to_string(), "((a = 1 AND b = 2) OR IS_NULL(c))");
    }

    #[test]
    fn test_negated_checks() {
        assert_eq!(Filter::is_null("f").to_string(), "IS_NULL(f)");
        assert_eq!(Filter::is_not_null("f").to_string(), "IS_NULL(f) = false");
        assert_eq!(Filter::is_defined("f").to_string(), "IS_DEFINED(f)");
        assert_eq!(Filter::is_not_defined("f").to_string(), "IS_DEFINED(f) = false");
    }

    #[test]
    fn test_membership() {
        assert_eq!(Filter::is_in("c.id", ["a", "b"]).to_string(), "c.id IN ('a', 'b')");
        assert_eq!(Filter::is_in("c.n", [1, 2, 3]).to_string(), "c.n IN (1, 2, 3)");
    }

    #[test]
    fn test_array_contains() {
        let expr = Filter::array_contains(Operand::field("c.tags"), Operand::value("red"));
        assert_eq!(expr.to_string(), "ARRAY_CONTAINS(c.tags, 'red', false)");

        let expr = Filter::array_contains_partial(
            Operand::value("@colors"),
            Operand::value(bson::doc! { "name": "red" }),
        );
        assert_eq!(expr.to_string(), "ARRAY_CONTAINS(@colors, {'name': 'red'}, true)");

        let expr = Filter::array_not_contains(Operand::field("c.tags"), Operand::field("p.tag"));
        assert_eq!(expr.to_string(), "ARRAY_CONTAINS(c.tags, p.tag, false) = false");
    }
}
