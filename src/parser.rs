use std::cell::RefCell;

use sqlparser::{
    ast::{Expr, ObjectName, Statement, Value},
    dialect::{Dialect, PostgreSqlDialect},
    keywords::Keyword,
    parser::{Parser, ParserError},
    tokenizer::Token,
};

/// A `CREATE TYPE .. AS ENUM` or `DROP TYPE` seen while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumStatement {
    Create { name: ObjectName, labels: Vec<String> },
    Drop { names: Vec<ObjectName>, if_exists: bool },
}

/// PostgreSQL dialect that also understands enum type DDL.
///
/// sqlparser has no statement for enum types, so they are parsed here,
/// recorded in order, and replaced by a placeholder statement in the AST.
#[derive(Debug)]
pub struct PostgresDdlDialect {
    inner_dialect: PostgreSqlDialect,
    enum_statements: RefCell<Vec<EnumStatement>>,
}

impl Dialect for PostgresDdlDialect {
    fn is_identifier_start(&self, ch: char) -> bool {
        self.inner_dialect.is_identifier_start(ch)
    }

    fn is_identifier_part(&self, ch: char) -> bool {
        self.inner_dialect.is_identifier_part(ch)
    }

    fn supports_group_by_expr(&self) -> bool {
        self.inner_dialect.supports_group_by_expr()
    }

    fn supports_filter_during_aggregation(&self) -> bool {
        self.inner_dialect.supports_filter_during_aggregation()
    }

    fn parse_statement(&self, parser: &mut Parser) -> Option<Result<Statement, ParserError>> {
        let next_token = parser.next_token();
        match &next_token.token {
            Token::Word(w) => match w.keyword {
                Keyword::CREATE => {
                    if parser.parse_keyword(Keyword::TYPE) {
                        return Some(self.parse_create_type(parser));
                    }

                    if parse_word(parser, "EXTENSION") || parse_word(parser, "DOMAIN") {
                        return Some(Ok(skip_statement(parser)));
                    }
                }
                Keyword::DROP => {
                    if parser.parse_keyword(Keyword::TYPE) {
                        return Some(self.parse_drop_type(parser));
                    }
                }
                _ => {}
            },
            _ => {}
        }

        parser.prev_token();
        self.inner_dialect.parse_statement(parser)
    }
}

impl PostgresDdlDialect {
    pub fn new() -> Self {
        Self {
            inner_dialect: PostgreSqlDialect {},
            enum_statements: RefCell::new(Vec::new()),
        }
    }

    /// Enum statements in source order. The AST holds an `ASSERT <n>`
    /// placeholder where the n-th one appeared, see [`enum_placeholder`].
    pub fn take_enum_statements(&self) -> Vec<EnumStatement> {
        self.enum_statements.take()
    }

    fn record(&self, statement: EnumStatement) -> Statement {
        let mut statements = self.enum_statements.borrow_mut();
        statements.push(statement);
        Statement::Assert {
            condition: Expr::Value(Value::Number((statements.len() - 1).to_string(), false)),
            message: None,
        }
    }

    fn parse_create_type(&self, parser: &mut Parser) -> Result<Statement, ParserError> {
        let name = parser.parse_object_name()?;

        if !parser.parse_keywords(&[Keyword::AS, Keyword::ENUM]) {
            // composite and range types carry no labels
            return Ok(skip_statement(parser));
        }

        parser.expect_token(&Token::LParen)?;
        let mut labels = Vec::new();
        if !parser.consume_token(&Token::RParen) {
            loop {
                labels.push(parser.parse_literal_string()?);
                if !parser.consume_token(&Token::Comma) {
                    break;
                }
            }
            parser.expect_token(&Token::RParen)?;
        }

        Ok(self.record(EnumStatement::Create { name, labels }))
    }

    fn parse_drop_type(&self, parser: &mut Parser) -> Result<Statement, ParserError> {
        let if_exists = parser.parse_keywords(&[Keyword::IF, Keyword::EXISTS]);
        let mut names = vec![parser.parse_object_name()?];
        while parser.consume_token(&Token::Comma) {
            names.push(parser.parse_object_name()?);
        }

        parser.parse_one_of_keywords(&[Keyword::CASCADE, Keyword::RESTRICT]);

        Ok(self.record(EnumStatement::Drop { names, if_exists }))
    }
}

impl Default for PostgresDdlDialect {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_word(parser: &mut Parser, word: &str) -> bool {
    let token = parser.next_token();
    if let Token::Word(w) = &token.token {
        if w.value.eq_ignore_ascii_case(word) {
            return true;
        }
    }

    parser.prev_token();
    false
}

/// Consumes tokens up to, not including, the statement terminator.
fn skip_statement(parser: &mut Parser) -> Statement {
    loop {
        let token = parser.next_token();
        match &token.token {
            Token::SemiColon | Token::EOF => {
                parser.prev_token();
                return no_op();
            }
            _ => continue,
        }
    }
}

/// Index into [`PostgresDdlDialect::take_enum_statements`] carried by a
/// placeholder statement.
pub fn enum_placeholder(statement: &Statement) -> Option<usize> {
    match statement {
        Statement::Assert {
            condition: Expr::Value(Value::Number(n, _)),
            message: None,
        } => n.parse().ok(),
        _ => None,
    }
}

/// Stands in for statements that only matter to the dialect, like ASSERT true.
fn no_op() -> Statement {
    Statement::Assert {
        condition: Expr::Value(Value::Boolean(true)),
        message: None,
    }
}
