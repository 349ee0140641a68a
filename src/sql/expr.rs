//! Expression AST - the core of SQL expression building.
//!
//! A strongly-typed, immutable expression tree with exhaustive pattern
//! matching enforced by the compiler. Construction goes through the free
//! constructor functions and the fluent [`ExprExt`] trait; rendering goes
//! through [`Expr::to_tokens_for_dialect`].

use super::dialect::Dialect;
use super::query::SelectExpr;
use super::token::{Token, TokenStream};

// =============================================================================
// Expression AST
// =============================================================================

/// A SQL expression.
///
/// Every variant must be handled in `to_tokens_for_dialect()`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference: optional_alias.column
    ///
    /// `table` is the owning data object's display name or a CTE name;
    /// `column` is the physical column code. Both are quoted on output.
    Column {
        table: Option<String>,
        column: String,
    },

    /// Literal values
    Literal(Literal),

    /// Binary operation: left op right
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },

    /// Unary operation: op expr
    UnaryOp { op: UnaryOperator, expr: Box<Expr> },

    /// Function call: name(args...)
    Function {
        name: String,
        args: Vec<Expr>,
        distinct: bool,
    },

    /// CASE WHEN... THEN... ELSE... END
    Case {
        operand: Option<Box<Expr>>,
        when_clauses: Vec<(Expr, Expr)>,
        else_clause: Option<Box<Expr>>,
    },

    /// CAST(expr AS type) - the type name is already dialect-resolved.
    Cast { expr: Box<Expr>, ty: String },

    /// Subquery: (SELECT ...)
    Subquery(Box<super::query::Query>),

    /// IN: expr IN (values...)
    InList {
        expr: Box<Expr>,
        values: Vec<Expr>,
        negated: bool,
    },

    /// BETWEEN: expr BETWEEN low AND high
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },

    /// IS NULL / IS NOT NULL
    IsNull { expr: Box<Expr>, negated: bool },

    /// Wildcard: * or alias.*
    Star { table: Option<String> },

    /// Parenthesized expression
    Paren(Box<Expr>),

    /// Window function: function OVER (PARTITION BY ... ORDER BY ...)
    WindowFunction {
        function: Box<Expr>,
        partition_by: Vec<Expr>,
        order_by: Vec<OrderSpec>,
    },

    /// Ordered-set aggregate: function WITHIN GROUP (ORDER BY ...)
    WithinGroup {
        function: Box<Expr>,
        order_by: Vec<OrderSpec>,
    },

    /// Raw SQL fragment passed through without escaping.
    ///
    /// Reserved for pre-rendered dialect fragments (interval arithmetic,
    /// current-date forms). Never route user values through this variant.
    Raw(String),
}

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Null,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Comparison
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    // Logical
    And,
    Or,
    // Arithmetic
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    // String
    Concat,
    Like,
    ILike,
    NotLike,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Minus,
}

/// An ordering entry inside OVER / WITHIN GROUP clauses.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSpec {
    pub expr: Expr,
    pub descending: bool,
}

impl OrderSpec {
    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            descending: false,
        }
    }

    pub fn desc(expr: Expr) -> Self {
        Self {
            expr,
            descending: true,
        }
    }
}

// =============================================================================
// Expression to Tokens
// =============================================================================

impl Expr {
    /// Convert this expression to a token stream for a specific dialect.
    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();

        match self {
            Expr::Column { table, column } => {
                if let Some(t) = table {
                    ts.push(Token::Ident(t.clone()));
                    ts.push(Token::Dot);
                }
                ts.push(Token::Ident(column.clone()));
            }

            Expr::Literal(lit) => {
                ts.push(match lit {
                    Literal::Int(n) => Token::LitInt(*n),
                    Literal::Float(f) => Token::LitFloat(*f),
                    Literal::String(s) => Token::LitString(s.clone()),
                    Literal::Bool(b) => Token::LitBool(*b),
                    Literal::Null => Token::LitNull,
                });
            }

            Expr::BinaryOp { left, op, right } => {
                ts.append(&left.to_tokens_for_dialect(dialect));
                ts.space();
                match op {
                    BinaryOperator::NotLike => {
                        ts.push(Token::Not).space().push(Token::Like);
                    }
                    other => {
                        ts.push(binary_op_to_token(*other));
                    }
                }
                ts.space();
                ts.append(&right.to_tokens_for_dialect(dialect));
            }

            Expr::UnaryOp { op, expr } => {
                ts.push(match op {
                    UnaryOperator::Not => Token::Not,
                    UnaryOperator::Minus => Token::Minus,
                });
                ts.space();
                ts.append(&expr.to_tokens_for_dialect(dialect));
            }

            Expr::Function {
                name,
                args,
                distinct,
            } => {
                ts.push(Token::FunctionName(name.clone()));
                ts.lparen();
                if *distinct {
                    ts.push(Token::Distinct).space();
                }
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.append(&arg.to_tokens_for_dialect(dialect));
                }
                ts.rparen();
            }

            Expr::Case {
                operand,
                when_clauses,
                else_clause,
            } => {
                ts.push(Token::Case);
                if let Some(op) = operand {
                    ts.space().append(&op.to_tokens_for_dialect(dialect));
                }
                for (when, then) in when_clauses {
                    ts.space().push(Token::When).space();
                    ts.append(&when.to_tokens_for_dialect(dialect));
                    ts.space().push(Token::Then).space();
                    ts.append(&then.to_tokens_for_dialect(dialect));
                }
                if let Some(else_expr) = else_clause {
                    ts.space().push(Token::Else).space();
                    ts.append(&else_expr.to_tokens_for_dialect(dialect));
                }
                ts.space().push(Token::End);
            }

            Expr::Cast { expr, ty } => {
                ts.push(Token::Cast).lparen();
                ts.append(&expr.to_tokens_for_dialect(dialect));
                ts.space().push(Token::As).space();
                ts.push(Token::Raw(ty.clone()));
                ts.rparen();
            }

            Expr::Subquery(query) => {
                ts.lparen();
                ts.append(&query.to_tokens_for_dialect(dialect));
                ts.rparen();
            }

            Expr::InList {
                expr,
                values,
                negated,
            } => {
                // "x IN ()" is invalid SQL: fold to a constant instead
                if values.is_empty() {
                    ts.push(if *negated { Token::True } else { Token::False });
                } else {
                    ts.append(&expr.to_tokens_for_dialect(dialect));
                    if *negated {
                        ts.space().push(Token::Not);
                    }
                    ts.space().push(Token::In).space().lparen();
                    for (i, val) in values.iter().enumerate() {
                        if i > 0 {
                            ts.comma().space();
                        }
                        ts.append(&val.to_tokens_for_dialect(dialect));
                    }
                    ts.rparen();
                }
            }

            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                ts.append(&expr.to_tokens_for_dialect(dialect));
                if *negated {
                    ts.space().push(Token::Not);
                }
                ts.space().push(Token::Between).space();
                ts.append(&low.to_tokens_for_dialect(dialect));
                ts.space().push(Token::And).space();
                ts.append(&high.to_tokens_for_dialect(dialect));
            }

            Expr::IsNull { expr, negated } => {
                ts.append(&expr.to_tokens_for_dialect(dialect));
                ts.space();
                ts.push(if *negated {
                    Token::IsNotNull
                } else {
                    Token::IsNull
                });
            }

            Expr::Star { table } => {
                if let Some(t) = table {
                    ts.push(Token::Ident(t.clone()));
                    ts.push(Token::Dot);
                }
                ts.push(Token::Star);
            }

            Expr::Paren(inner) => {
                ts.lparen();
                ts.append(&inner.to_tokens_for_dialect(dialect));
                ts.rparen();
            }

            Expr::WindowFunction {
                function,
                partition_by,
                order_by,
            } => {
                ts.append(&function.to_tokens_for_dialect(dialect));
                ts.space().push(Token::Over).space().lparen();

                let mut need_space = false;
                if !partition_by.is_empty() {
                    ts.push(Token::PartitionBy).space();
                    for (i, expr) in partition_by.iter().enumerate() {
                        if i > 0 {
                            ts.comma().space();
                        }
                        ts.append(&expr.to_tokens_for_dialect(dialect));
                    }
                    need_space = true;
                }

                if !order_by.is_empty() {
                    if need_space {
                        ts.space();
                    }
                    ts.push(Token::OrderBy).space();
                    emit_order_specs(&mut ts, order_by, dialect);
                }

                ts.rparen();
            }

            Expr::WithinGroup { function, order_by } => {
                ts.append(&function.to_tokens_for_dialect(dialect));
                ts.space().push(Token::WithinGroup).space().lparen();
                ts.push(Token::OrderBy).space();
                emit_order_specs(&mut ts, order_by, dialect);
                ts.rparen();
            }

            Expr::Raw(sql) => {
                ts.push(Token::Raw(sql.clone()));
            }
        }

        ts
    }

    /// Render this expression as SQL text for a specific dialect.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens_for_dialect(dialect).serialize(dialect)
    }
}

fn binary_op_to_token(op: BinaryOperator) -> Token {
    match op {
        BinaryOperator::Eq => Token::Eq,
        BinaryOperator::Ne => Token::Ne,
        BinaryOperator::Lt => Token::Lt,
        BinaryOperator::Gt => Token::Gt,
        BinaryOperator::Lte => Token::Lte,
        BinaryOperator::Gte => Token::Gte,
        BinaryOperator::And => Token::And,
        BinaryOperator::Or => Token::Or,
        BinaryOperator::Plus => Token::Plus,
        BinaryOperator::Minus => Token::Minus,
        BinaryOperator::Mul => Token::Mul,
        BinaryOperator::Div => Token::Div,
        BinaryOperator::Mod => Token::Mod,
        BinaryOperator::Concat => Token::Concat,
        BinaryOperator::Like => Token::Like,
        BinaryOperator::ILike => Token::ILike,
        BinaryOperator::NotLike => unreachable!("NotLike is emitted inline"),
    }
}

fn emit_order_specs(ts: &mut TokenStream, specs: &[OrderSpec], dialect: Dialect) {
    for (i, spec) in specs.iter().enumerate() {
        if i > 0 {
            ts.comma().space();
        }
        ts.append(&spec.expr.to_tokens_for_dialect(dialect));
        if spec.descending {
            ts.space().push(Token::Desc);
        }
    }
}

// =============================================================================
// Expression Constructors
// =============================================================================

/// Create an unqualified column reference.
pub fn col(name: &str) -> Expr {
    Expr::Column {
        table: None,
        column: name.into(),
    }
}

/// Create a qualified column reference (alias.column).
pub fn table_col(table: &str, column: &str) -> Expr {
    Expr::Column {
        table: Some(table.into()),
        column: column.into(),
    }
}

/// Create an integer literal.
pub fn lit_int(n: i64) -> Expr {
    Expr::Literal(Literal::Int(n))
}

/// Create a float literal.
pub fn lit_float(f: f64) -> Expr {
    Expr::Literal(Literal::Float(f))
}

/// Create a string literal.
pub fn lit_str(s: &str) -> Expr {
    Expr::Literal(Literal::String(s.into()))
}

/// Create a boolean literal.
pub fn lit_bool(b: bool) -> Expr {
    Expr::Literal(Literal::Bool(b))
}

/// Create a NULL literal.
pub fn lit_null() -> Expr {
    Expr::Literal(Literal::Null)
}

/// Create a star (*) expression.
pub fn star() -> Expr {
    Expr::Star { table: None }
}

/// COUNT(expr)
pub fn count(expr: Expr) -> Expr {
    func("COUNT", vec![expr])
}

/// COUNT(*)
pub fn count_star() -> Expr {
    func("COUNT", vec![star()])
}

/// COUNT(DISTINCT expr)
pub fn count_distinct(expr: Expr) -> Expr {
    Expr::Function {
        name: "COUNT".into(),
        args: vec![expr],
        distinct: true,
    }
}

/// SUM(expr)
pub fn sum(expr: Expr) -> Expr {
    func("SUM", vec![expr])
}

/// AVG(expr)
pub fn avg(expr: Expr) -> Expr {
    func("AVG", vec![expr])
}

/// MIN(expr)
pub fn min(expr: Expr) -> Expr {
    func("MIN", vec![expr])
}

/// MAX(expr)
pub fn max(expr: Expr) -> Expr {
    func("MAX", vec![expr])
}

/// COALESCE(args...)
pub fn coalesce(args: Vec<Expr>) -> Expr {
    func("COALESCE", args)
}

/// Generic function call.
pub fn func(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Function {
        name: name.into(),
        args,
        distinct: false,
    }
}

/// CAST(expr AS ty) with a pre-resolved type name.
pub fn cast_as(expr: Expr, ty: &str) -> Expr {
    Expr::Cast {
        expr: Box::new(expr),
        ty: ty.into(),
    }
}

/// Raw SQL fragment (pass-through, no escaping). Trusted fragments only.
pub fn raw_sql(sql: &str) -> Expr {
    Expr::Raw(sql.into())
}

// =============================================================================
// Expression Builder Trait
// =============================================================================

/// Extension trait for building expressions fluently.
pub trait ExprExt: Sized {
    fn into_expr(self) -> Expr;

    fn binop(self, op: BinaryOperator, other: Expr) -> Expr {
        Expr::BinaryOp {
            left: Box::new(self.into_expr()),
            op,
            right: Box::new(other),
        }
    }

    // Comparison
    fn eq(self, other: Expr) -> Expr {
        self.binop(BinaryOperator::Eq, other)
    }

    fn ne(self, other: Expr) -> Expr {
        self.binop(BinaryOperator::Ne, other)
    }

    fn gt(self, other: Expr) -> Expr {
        self.binop(BinaryOperator::Gt, other)
    }

    fn gte(self, other: Expr) -> Expr {
        self.binop(BinaryOperator::Gte, other)
    }

    fn lt(self, other: Expr) -> Expr {
        self.binop(BinaryOperator::Lt, other)
    }

    fn lte(self, other: Expr) -> Expr {
        self.binop(BinaryOperator::Lte, other)
    }

    // Logical
    fn and(self, other: Expr) -> Expr {
        self.binop(BinaryOperator::And, other)
    }

    fn or(self, other: Expr) -> Expr {
        self.binop(BinaryOperator::Or, other)
    }

    // Arithmetic
    fn add(self, other: Expr) -> Expr {
        self.binop(BinaryOperator::Plus, other)
    }

    fn sub(self, other: Expr) -> Expr {
        self.binop(BinaryOperator::Minus, other)
    }

    fn mul(self, other: Expr) -> Expr {
        self.binop(BinaryOperator::Mul, other)
    }

    fn div(self, other: Expr) -> Expr {
        self.binop(BinaryOperator::Div, other)
    }

    // String matching
    fn like(self, pattern: Expr) -> Expr {
        self.binop(BinaryOperator::Like, pattern)
    }

    fn ilike(self, pattern: Expr) -> Expr {
        self.binop(BinaryOperator::ILike, pattern)
    }

    fn not_like(self, pattern: Expr) -> Expr {
        self.binop(BinaryOperator::NotLike, pattern)
    }

    fn concat(self, other: Expr) -> Expr {
        self.binop(BinaryOperator::Concat, other)
    }

    // Predicates
    fn is_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self.into_expr()),
            negated: false,
        }
    }

    fn is_not_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self.into_expr()),
            negated: true,
        }
    }

    fn in_list(self, values: Vec<Expr>) -> Expr {
        Expr::InList {
            expr: Box::new(self.into_expr()),
            values,
            negated: false,
        }
    }

    fn not_in_list(self, values: Vec<Expr>) -> Expr {
        Expr::InList {
            expr: Box::new(self.into_expr()),
            values,
            negated: true,
        }
    }

    fn between(self, low: Expr, high: Expr) -> Expr {
        Expr::Between {
            expr: Box::new(self.into_expr()),
            low: Box::new(low),
            high: Box::new(high),
            negated: false,
        }
    }

    fn not_between(self, low: Expr, high: Expr) -> Expr {
        Expr::Between {
            expr: Box::new(self.into_expr()),
            low: Box::new(low),
            high: Box::new(high),
            negated: true,
        }
    }

    /// Attach a projection alias, producing a SELECT-list item.
    fn alias(self, alias: &str) -> SelectExpr {
        SelectExpr::new(self.into_expr()).with_alias(alias)
    }
}

impl ExprExt for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_qualified() {
        let e = table_col("Orders", "PRICE");
        assert_eq!(e.to_sql(Dialect::Postgres), "\"Orders\".\"PRICE\"");
        assert_eq!(e.to_sql(Dialect::Databricks), "`Orders`.`PRICE`");
    }

    #[test]
    fn test_arithmetic_chain() {
        let e = table_col("Orders", "PRICE").mul(table_col("Orders", "QUANTITY"));
        assert_eq!(
            sum(e).to_sql(Dialect::Postgres),
            "SUM(\"Orders\".\"PRICE\" * \"Orders\".\"QUANTITY\")"
        );
    }

    #[test]
    fn test_count_distinct() {
        let e = count_distinct(table_col("Orders", "CUSTOMER_ID"));
        assert_eq!(
            e.to_sql(Dialect::Postgres),
            "COUNT(DISTINCT \"Orders\".\"CUSTOMER_ID\")"
        );
    }

    #[test]
    fn test_case_when() {
        let e = Expr::Case {
            operand: None,
            when_clauses: vec![(col("STATUS").eq(lit_str("complete")), col("AMOUNT"))],
            else_clause: None,
        };
        assert_eq!(
            e.to_sql(Dialect::Postgres),
            "CASE WHEN \"STATUS\" = 'complete' THEN \"AMOUNT\" END"
        );
    }

    #[test]
    fn test_cast() {
        let e = cast_as(lit_null(), "DOUBLE PRECISION");
        assert_eq!(e.to_sql(Dialect::Postgres), "CAST(NULL AS DOUBLE PRECISION)");
    }

    #[test]
    fn test_ilike_concat() {
        let e = table_col("Customers", "COUNTRY")
            .ilike(lit_str("%").concat(lit_str("United")).concat(lit_str("%")));
        assert_eq!(
            e.to_sql(Dialect::Postgres),
            "\"Customers\".\"COUNTRY\" ILIKE '%' || 'United' || '%'"
        );
    }

    #[test]
    fn test_between() {
        let e = col("AMOUNT").between(lit_int(1), lit_int(10));
        assert_eq!(e.to_sql(Dialect::Postgres), "\"AMOUNT\" BETWEEN 1 AND 10");
    }

    #[test]
    fn test_empty_in_list_folds() {
        assert_eq!(col("X").in_list(vec![]).to_sql(Dialect::Postgres), "FALSE");
        assert_eq!(
            col("X").not_in_list(vec![]).to_sql(Dialect::Postgres),
            "TRUE"
        );
    }

    #[test]
    fn test_window_over_empty() {
        let e = Expr::WindowFunction {
            function: Box::new(sum(sum(table_col("Orders", "PRICE")))),
            partition_by: vec![],
            order_by: vec![],
        };
        assert_eq!(
            e.to_sql(Dialect::Postgres),
            "SUM(SUM(\"Orders\".\"PRICE\")) OVER ()"
        );
    }

    #[test]
    fn test_within_group() {
        let e = Expr::WithinGroup {
            function: Box::new(func(
                "LISTAGG",
                vec![table_col("Orders", "SKU"), lit_str(",")],
            )),
            order_by: vec![OrderSpec::asc(table_col("Orders", "SKU"))],
        };
        assert_eq!(
            e.to_sql(Dialect::Snowflake),
            "LISTAGG(\"Orders\".\"SKU\", ',') WITHIN GROUP (ORDER BY \"Orders\".\"SKU\")"
        );
    }

    #[test]
    fn test_not_like() {
        let e = col("NAME").not_like(lit_str("%x%"));
        assert_eq!(e.to_sql(Dialect::Postgres), "\"NAME\" NOT LIKE '%x%'");
    }
}
