pub mod ast;
pub mod error;
pub mod parser;

pub fn parse(literal: &str) -> Result<ast::Pattern, error::ParseError> {
    parser::Parser::new(literal).parse()
}
