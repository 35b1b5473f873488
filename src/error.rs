use sqlparser::ast::Statement;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeneratorError>;

#[derive(Debug)]
pub struct MultipleGeneratorErrors(pub Vec<GeneratorError>);

impl std::fmt::Display for MultipleGeneratorErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }

            write!(f, "\t{}. {}", i + 1, item)?;
        }

        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("multiple:\n{0}")]
    Multiple(MultipleGeneratorErrors),

    #[error("in statement number {index} `{statement}`: {inner}")]
    Statement {
        index: usize,
        statement: Box<Statement>,
        inner: Box<GeneratorError>,
    },

    #[error("unimplemented {0}")]
    Unimplemented(&'static str),

    #[error("database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("parsing sql: {0}")]
    Parse(#[from] sqlparser::parser::ParserError),

    #[error("invalid connection string: {0}")]
    InvalidConnectionString(String),

    #[error("formatting output: {0}")]
    Format(#[from] std::fmt::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Base(&'static str),

    #[error("table '{0}' doesn't exist")]
    TableNotExist(String),

    #[error("column '{0}' doesn't exist")]
    ColumnNotExist(String),

    #[error("type '{0}' doesn't exist")]
    TypeNotExist(String),
}
