// Adapters
// SQLテキストの解析とSQL文字列の生成を担うアダプター層

pub mod sql_generator;
pub mod sql_parser;
pub mod sql_quote;
pub mod type_mapping;
