pub mod llm;
pub mod s3;
