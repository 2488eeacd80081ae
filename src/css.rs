pub mod cssom;
pub mod encoding;
pub mod parser;
pub mod rewriter;
pub mod selector;
pub mod serializer;
pub mod tokenizer;
