use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Summarize PDF documents in English.
///
/// Text is extracted natively or by OCR for scanned pages, translated when the
/// document is not in the target language, then summarized.
#[derive(Parser, Debug)]
#[command(name = "pdfsum", version, about = "Summarize PDF documents in English")]
pub struct CliArgs {
    /// Config profile; `{PROFILE}_{KEY}` env vars override `{KEY}`
    #[arg(long, env = "PDFSUM_PROFILE", global = true)]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Summarize one PDF and print the summary
    Summarize {
        /// Path to the PDF
        pdf: PathBuf,

        /// Also write the summary to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the extracted text and how it was obtained
    Extract {
        /// Path to the PDF
        pdf: PathBuf,
    },
    /// Prompt for PDF paths until `exit` (the default)
    Interactive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_summarize_with_output() {
        let args = CliArgs::parse_from(["pdfsum", "summarize", "report.pdf", "-o", "out.txt"]);
        match args.command {
            Some(Command::Summarize { pdf, output }) => {
                assert_eq!(pdf, PathBuf::from("report.pdf"));
                assert_eq!(output, Some(PathBuf::from("out.txt")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_means_interactive() {
        let args = CliArgs::parse_from(["pdfsum"]);
        assert!(args.command.is_none());
    }
}
