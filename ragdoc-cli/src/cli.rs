use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "ragdoc")]
#[command(about = "Ask questions about your documents, answered from their own text")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Vector index to use (overrides RAG_INDEX_NAME)")]
    pub index: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Chunk, embed, and store documents (.txt, .md, .pdf, .docx)")]
    Ingest {
        #[arg(required = true, help = "Files to ingest")]
        paths: Vec<PathBuf>,
    },

    #[command(about = "Answer a question from the ingested documents")]
    Ask {
        #[arg(required = true, help = "The question to answer")]
        question: Vec<String>,

        #[arg(long, help = "Number of chunks to retrieve (overrides RAG_TOP_K)")]
        top_k: Option<usize>,

        #[arg(long, help = "Print the retrieved chunks with their scores")]
        show_context: bool,
    },

    #[command(about = "Show how many vectors the index holds")]
    Stats,
}
