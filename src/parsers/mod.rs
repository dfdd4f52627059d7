// Parsers for generated content: document markdown and collaborator payloads

pub mod markdown;
pub mod structured_output;

pub use markdown::{parse_inline, render, to_plain_text, InlineSpan, RenderNode};
pub use structured_output::{
    parse_analysis_response, parse_generation_response, strip_code_fence, StructuredOutputError,
};
