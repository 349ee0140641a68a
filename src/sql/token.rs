//! SQL tokens - the atomic units of SQL output.
//!
//! Tokens are dialect-agnostic representations that serialize
//! to dialect-specific strings.

use super::dialect::{Dialect, SqlDialect};

/// SQL token - every element a generated statement is assembled from.
///
/// Adding a new variant here causes compile errors everywhere it needs
/// to be handled (exhaustive matching).
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // === Keywords ===
    Select,
    From,
    Where,
    And,
    Or,
    Not,
    As,
    On,
    Join,
    Left,
    GroupBy,
    Having,
    OrderBy,
    Asc,
    Desc,
    Limit,
    Case,
    When,
    Then,
    Else,
    End,
    In,
    Between,
    Like,
    ILike,
    IsNull,
    IsNotNull,
    Distinct,
    All,
    Union,
    ByName,
    With,
    Cast,
    Over,
    PartitionBy,
    WithinGroup,
    Null,
    True,
    False,

    // === Punctuation ===
    Comma,
    Dot,
    Star,
    LParen,
    RParen,

    // === Operators ===
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    Concat,

    // === Whitespace / Formatting ===
    Space,
    Newline,
    Indent(usize),

    // === Dynamic Content ===
    /// Simple identifier (column, alias, CTE column) - quoted per dialect.
    Ident(String),
    /// Physical table reference: database.schema.table, emitted verbatim.
    ///
    /// Physical codes come from the model and are already spelled the way
    /// the warehouse expects them, so they are never re-quoted.
    TableName {
        database: Option<String>,
        schema: Option<String>,
        name: String,
    },
    /// CTE name - generated by the planner, emitted verbatim.
    CteName(String),
    /// Integer literal
    LitInt(i64),
    /// Float literal
    LitFloat(f64),
    /// String literal
    LitString(String),
    /// Boolean literal
    LitBool(bool),
    /// NULL literal
    LitNull,

    /// Function name, rendered exactly as spelled. Aggregates arrive
    /// uppercase; dialect hooks may produce case-sensitive names
    /// (ClickHouse `toStartOfMonth`, Databricks `lower`).
    FunctionName(String),

    // === Escape Hatch ===
    /// Raw SQL passed directly to output without escaping.
    ///
    /// Only used for a handful of pre-rendered dialect fragments
    /// (interval arithmetic, current-date forms). Never route user
    /// values through this variant; literals go through the `Lit*`
    /// tokens which escape per dialect.
    Raw(String),
}

impl Token {
    /// Serialize this token to a string for the given dialect.
    pub fn serialize(&self, dialect: Dialect) -> String {
        match self {
            // Keywords
            Token::Select => "SELECT".into(),
            Token::From => "FROM".into(),
            Token::Where => "WHERE".into(),
            Token::And => "AND".into(),
            Token::Or => "OR".into(),
            Token::Not => "NOT".into(),
            Token::As => "AS".into(),
            Token::On => "ON".into(),
            Token::Join => "JOIN".into(),
            Token::Left => "LEFT".into(),
            Token::GroupBy => "GROUP BY".into(),
            Token::Having => "HAVING".into(),
            Token::OrderBy => "ORDER BY".into(),
            Token::Asc => "ASC".into(),
            Token::Desc => "DESC".into(),
            Token::Limit => "LIMIT".into(),
            Token::Case => "CASE".into(),
            Token::When => "WHEN".into(),
            Token::Then => "THEN".into(),
            Token::Else => "ELSE".into(),
            Token::End => "END".into(),
            Token::In => "IN".into(),
            Token::Between => "BETWEEN".into(),
            Token::Like => "LIKE".into(),
            Token::ILike => "ILIKE".into(),
            Token::IsNull => "IS NULL".into(),
            Token::IsNotNull => "IS NOT NULL".into(),
            Token::Distinct => "DISTINCT".into(),
            Token::All => "ALL".into(),
            Token::Union => "UNION".into(),
            Token::ByName => "BY NAME".into(),
            Token::With => "WITH".into(),
            Token::Cast => "CAST".into(),
            Token::Over => "OVER".into(),
            Token::PartitionBy => "PARTITION BY".into(),
            Token::WithinGroup => "WITHIN GROUP".into(),
            Token::Null => "NULL".into(),
            Token::True => "TRUE".into(),
            Token::False => "FALSE".into(),

            // Punctuation
            Token::Comma => ",".into(),
            Token::Dot => ".".into(),
            Token::Star => "*".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),

            // Operators
            Token::Eq => "=".into(),
            Token::Ne => "<>".into(),
            Token::Lt => "<".into(),
            Token::Gt => ">".into(),
            Token::Lte => "<=".into(),
            Token::Gte => ">=".into(),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Mul => "*".into(),
            Token::Div => "/".into(),
            Token::Mod => "%".into(),
            Token::Concat => "||".into(),

            // Whitespace
            Token::Space => " ".into(),
            Token::Newline => "\n".into(),
            Token::Indent(n) => "  ".repeat(*n),

            // Dynamic - dialect-specific formatting
            Token::Ident(name) => dialect.quote_identifier(name),
            Token::TableName {
                database,
                schema,
                name,
            } => {
                let mut out = String::new();
                if let Some(db) = database {
                    out.push_str(db);
                    out.push('.');
                }
                if let Some(sc) = schema {
                    out.push_str(sc);
                    out.push('.');
                }
                out.push_str(name);
                out
            }
            Token::CteName(name) => name.clone(),
            Token::LitInt(n) => n.to_string(),
            Token::LitFloat(f) => {
                if f.is_nan() {
                    panic!("Cannot serialize NaN to SQL")
                }
                if f.is_infinite() {
                    panic!("Cannot serialize Infinity to SQL")
                }
                // ryu for fast, accurate float formatting
                let mut buffer = ryu::Buffer::new();
                buffer.format(*f).to_string()
            }
            Token::LitString(s) => dialect.quote_string(s),
            Token::LitBool(b) => dialect.format_bool(*b).into(),
            Token::LitNull => "NULL".into(),

            Token::FunctionName(name) => name.clone(),

            // Escape hatch
            Token::Raw(s) => s.clone(),
        }
    }
}

/// A stream of tokens that can be serialized to SQL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    /// Create an empty token stream.
    pub fn new() -> Self {
        Self { tokens: vec![] }
    }

    /// Push a single token.
    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    /// Append another token stream.
    pub fn append(&mut self, other: &TokenStream) -> &mut Self {
        self.tokens.extend(other.tokens.iter().cloned());
        self
    }

    /// Serialize all tokens to a SQL string.
    pub fn serialize(&self, dialect: Dialect) -> String {
        self.tokens.iter().map(|t| t.serialize(dialect)).collect()
    }

    // Convenience methods for common tokens
    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }
    pub fn newline(&mut self) -> &mut Self {
        self.push(Token::Newline)
    }
    pub fn indent(&mut self, n: usize) -> &mut Self {
        self.push(Token::Indent(n))
    }
    pub fn comma(&mut self) -> &mut Self {
        self.push(Token::Comma)
    }
    pub fn lparen(&mut self) -> &mut Self {
        self.push(Token::LParen)
    }
    pub fn rparen(&mut self) -> &mut Self {
        self.push(Token::RParen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_serialize() {
        assert_eq!(Token::Select.serialize(Dialect::Postgres), "SELECT");
        assert_eq!(Token::GroupBy.serialize(Dialect::Snowflake), "GROUP BY");
        assert_eq!(Token::ByName.serialize(Dialect::Snowflake), "BY NAME");
    }

    #[test]
    fn test_ident_serialize() {
        let tok = Token::Ident("Orders".into());
        assert_eq!(tok.serialize(Dialect::Postgres), "\"Orders\"");
        assert_eq!(tok.serialize(Dialect::ClickHouse), "\"Orders\"");
        assert_eq!(tok.serialize(Dialect::Databricks), "`Orders`");
    }

    #[test]
    fn test_table_name_unquoted() {
        let tok = Token::TableName {
            database: Some("WAREHOUSE".into()),
            schema: Some("PUBLIC".into()),
            name: "ORDERS".into(),
        };
        assert_eq!(tok.serialize(Dialect::Postgres), "WAREHOUSE.PUBLIC.ORDERS");
        assert_eq!(
            tok.serialize(Dialect::Databricks),
            "WAREHOUSE.PUBLIC.ORDERS"
        );
    }

    #[test]
    fn test_string_escaping() {
        let tok = Token::LitString("O'Brien".into());
        assert_eq!(tok.serialize(Dialect::Postgres), "'O''Brien'");
    }

    #[test]
    fn test_function_name_verbatim() {
        let tok = Token::FunctionName("toStartOfQuarter".into());
        assert_eq!(tok.serialize(Dialect::ClickHouse), "toStartOfQuarter");
    }

    #[test]
    fn test_token_stream() {
        let mut ts = TokenStream::new();
        ts.push(Token::Select)
            .space()
            .push(Token::Ident("name".into()))
            .space()
            .push(Token::From)
            .space()
            .push(Token::TableName {
                database: None,
                schema: None,
                name: "users".into(),
            });

        assert_eq!(ts.serialize(Dialect::Postgres), "SELECT \"name\" FROM users");
    }

    #[test]
    fn test_float_serialize() {
        assert_eq!(Token::LitFloat(3.14).serialize(Dialect::Postgres), "3.14");
        assert_eq!(Token::LitFloat(1.0).serialize(Dialect::Postgres), "1.0");
    }

    #[test]
    #[should_panic(expected = "Cannot serialize NaN")]
    fn test_float_nan_panics() {
        Token::LitFloat(f64::NAN).serialize(Dialect::Postgres);
    }
}
